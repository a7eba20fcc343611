use std::path::PathBuf;

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "stamp",
    about = "Render a project from a template directory",
    version
)]
pub struct Cli {
    /// Template root directory
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output directory (must not exist unless --overwrite is given)
    #[arg(short, long)]
    pub output: PathBuf,

    /// Answers file (TOML, or JSON with a .json extension)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Set variable values (can be repeated: -d key=value)
    #[arg(short, long = "data", value_name = "KEY=VALUE")]
    pub data: Vec<String>,

    /// Use defaults and overrides without prompting
    #[arg(long)]
    pub no_input: bool,

    /// Replace the output directory if it exists
    #[arg(long)]
    pub overwrite: bool,

    /// Skip running the post_create hook
    #[arg(long)]
    pub no_hooks: bool,

    /// Show the files that would be generated without writing anything
    #[arg(long)]
    pub dry_run: bool,

    /// With --dry-run, print rendered file contents
    #[arg(short, long)]
    pub verbose: bool,
}
