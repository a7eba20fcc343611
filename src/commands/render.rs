use console::style;
use stamp::answers::parse_data;
use stamp::error::Result;
use stamp::render::RenderResult;
use stamp::template::TemplateNode;
use stamp::GenerateOptions;

use crate::cli::Cli;

/// Run one render and return the process exit code.
pub fn run(cli: Cli) -> Result<u8> {
    let options = GenerateOptions {
        input: cli.input,
        output: cli.output,
        config: cli.config,
        data: parse_data(&cli.data)?,
        no_input: cli.no_input,
        overwrite: cli.overwrite,
        no_hooks: cli.no_hooks,
    };

    if cli.dry_run {
        let plan = stamp::plan_generation(options)?;
        print_diagnostics(&plan.result);
        print_dry_run(&plan.result, &plan.output_dir, cli.verbose);
        return Ok(if plan.result.is_valid() { 0 } else { 1 });
    }

    let outcome = stamp::generate(options)?;
    print_diagnostics(&outcome.result);

    if outcome.committed {
        println!(
            "\n{} Generated {} files in {}",
            style("\u{2714}").green().bold(),
            outcome.files_written.len(),
            style(outcome.output_dir.display()).cyan()
        );
    } else {
        println!(
            "\n{} {} error(s); nothing written to {}",
            style("\u{2718}").red().bold(),
            outcome.result.errors.len(),
            style(outcome.output_dir.display()).cyan()
        );
    }

    Ok(outcome.exit_code())
}

fn print_diagnostics(result: &RenderResult) {
    for warning in &result.warnings {
        eprintln!("{} {}", style("warning:").yellow().bold(), warning);
    }
    for error in &result.errors {
        eprintln!("{} {}", style("error:").red().bold(), error);
    }
}

fn print_dry_run(result: &RenderResult, output_dir: &std::path::Path, verbose: bool) {
    let files = result.tree.files();

    println!(
        "\n{} Dry run: files that would be generated in {}:",
        style("==>").cyan().bold(),
        style(output_dir.display()).cyan()
    );

    let mut copied = 0;
    for (path, node) in &files {
        let TemplateNode::File {
            content, is_binary, ..
        } = node
        else {
            continue;
        };
        if *is_binary {
            copied += 1;
        }
        let action = if *is_binary { "copy  " } else { "create" };
        println!("  {} {}", style(action).green(), path.display());

        if verbose {
            println!("  {}", style("──────").dim());
            if *is_binary {
                println!(
                    "  {}",
                    style(format!("[binary file, {} bytes]", content.len())).dim()
                );
            } else {
                for line in String::from_utf8_lossy(content).lines() {
                    println!("  {line}");
                }
            }
            println!("  {}", style("──────").dim());
            println!();
        }
    }

    println!(
        "\nSummary: {} rendered, {} copied",
        files.len() - copied,
        copied
    );

    if !result.is_valid() {
        println!(
            "{} {} error(s); a real run would write nothing.",
            style("\u{2718}").red().bold(),
            result.errors.len()
        );
    }
    println!(
        "\n{} Dry run: no files written.",
        style("\u{2139}").blue().bold()
    );
}
