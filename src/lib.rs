pub mod adapter;
pub mod answers;
pub mod config;
pub mod error;
pub mod hooks;
pub mod output;
pub mod prompt;
pub mod render;
pub mod template;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use console::style;

use crate::adapter::{resolve_template, TemplateFormat};
use crate::error::{Result, StampError};
use crate::prompt::{collect_answers, PromptOptions};
use crate::render::{resolve_bindings, Location, RenderResult, Renderer, VariableBindings};
use crate::template::load_tree;

pub struct GenerateOptions {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Answers file (`.toml` or `.json`).
    pub config: Option<PathBuf>,
    /// `-d key=value` overrides; these win over the answers file.
    pub data: Vec<(String, String)>,
    pub no_input: bool,
    pub overwrite: bool,
    pub no_hooks: bool,
}

/// A fully rendered project that has not been written yet.
pub struct GenerationPlan {
    pub result: RenderResult,
    pub output_dir: PathBuf,
    pub bindings: VariableBindings,
    pub format: TemplateFormat,
    pub template_name: String,
    /// Rendered post-create command, if the template has one.
    pub post_create: Option<String>,
    pub overwrite: bool,
    pub no_hooks: bool,
}

pub struct GenerationOutcome {
    /// Render diagnostics plus any write failures.
    pub result: RenderResult,
    pub output_dir: PathBuf,
    pub committed: bool,
    pub files_written: Vec<PathBuf>,
}

impl GenerationOutcome {
    /// `0` when the project was generated without fatal errors, `1`
    /// otherwise. Warnings never count.
    pub fn exit_code(&self) -> u8 {
        if self.result.is_valid() && self.committed {
            0
        } else {
            1
        }
    }
}

/// Plan a project generation: resolve the template, collect answers, derive
/// bindings and render in memory.
///
/// Nothing is written to disk. Render problems are collected into the plan's
/// result; only run-level failures (missing input, bad manifest, output in
/// the way, cancelled prompt) are returned as errors.
pub fn plan_generation(options: GenerateOptions) -> Result<GenerationPlan> {
    if !options.input.is_dir() {
        return Err(StampError::InputNotFound {
            path: options.input.clone(),
        });
    }
    output::ensure_output_available(&options.output, options.overwrite)?;

    let resolved = resolve_template(&options.input)?;
    for warning in &resolved.warnings {
        eprintln!(
            "{} {}",
            style("warning:").yellow().bold(),
            style(warning).yellow()
        );
    }

    let mut overrides = BTreeMap::new();
    if let Some(path) = &options.config {
        overrides.extend(answers::load_answers_file(path)?);
    }
    overrides.extend(options.data);

    let prompt_options = PromptOptions {
        overrides,
        interactive: !options.no_input,
    };
    let config = &resolved.config;
    let answers = collect_answers(config, &prompt_options)?;
    let (bindings, mut diagnostics) = resolve_bindings(answers, &config.derive);

    let loaded = load_tree(&options.input, &resolved.load_options())?;
    diagnostics.extend(loaded.diagnostics);

    let renderer = Renderer::new(config.delimiters()?, config.template.namespace.clone());
    let mut result = renderer.render(&loaded.tree, &bindings);

    let post_create = config.hooks.post_create.as_ref().map(|command| {
        renderer.render_str(
            command,
            &bindings,
            &Location::name("[hooks] post_create"),
            &mut diagnostics,
        )
    });

    result.absorb(diagnostics);

    Ok(GenerationPlan {
        result,
        output_dir: options.output,
        bindings,
        format: resolved.format,
        template_name: config.template.name.clone(),
        post_create,
        overwrite: options.overwrite,
        no_hooks: options.no_hooks,
    })
}

/// Execute a previously planned generation: commit the rendered tree and
/// run the post-create hook.
///
/// The tree is committed only when the plan has no fatal errors; the hook
/// runs only after a successful commit.
pub fn execute_generation(plan: GenerationPlan) -> Result<GenerationOutcome> {
    let report = output::commit(&plan.result, &plan.output_dir, plan.overwrite)?;

    let mut result = plan.result;
    result.absorb(report.diagnostics);

    if report.committed && !plan.no_hooks {
        if let Some(command) = &plan.post_create {
            run_hook(command, &plan.output_dir, &plan.bindings)?;
        }
    }

    Ok(GenerationOutcome {
        result,
        output_dir: plan.output_dir,
        committed: report.committed,
        files_written: report.files_written,
    })
}

fn run_hook(command: &str, output_dir: &Path, bindings: &VariableBindings) -> Result<()> {
    eprintln!(
        "{} running post_create hook in {}",
        style("==>").cyan().bold(),
        style(output_dir.display()).cyan()
    );
    hooks::run_post_create(command, output_dir, bindings)
}

/// Generate a project from a template.
pub fn generate(options: GenerateOptions) -> Result<GenerationOutcome> {
    let plan = plan_generation(options)?;
    execute_generation(plan)
}
