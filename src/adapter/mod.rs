pub mod cookiecutter;
pub mod detect;
pub mod native;

use std::path::Path;

use crate::config::schema::TemplateConfig;
use crate::error::Result;
use crate::template::LoadOptions;

pub use detect::detect_format;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateFormat {
    Native,
    Cookiecutter,
    /// No manifest; every file under the root is rendered.
    Plain,
}

pub struct ResolvedTemplate {
    pub config: TemplateConfig,
    pub format: TemplateFormat,
    /// Only root entries starting with this are part of the template.
    pub root_prefix: Option<String>,
    pub warnings: Vec<String>,
}

impl ResolvedTemplate {
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            exclude: self.config.files.exclude.clone(),
            copy_without_render: self.config.files.copy_without_render.clone(),
            root_prefix: self.root_prefix.clone(),
        }
    }
}

pub fn resolve_template(template_dir: &Path) -> Result<ResolvedTemplate> {
    match detect_format(template_dir) {
        TemplateFormat::Native => native::resolve(template_dir),
        TemplateFormat::Cookiecutter => cookiecutter::resolve(template_dir),
        TemplateFormat::Plain => Ok(ResolvedTemplate {
            config: TemplateConfig::default(),
            format: TemplateFormat::Plain,
            root_prefix: None,
            warnings: Vec::new(),
        }),
    }
}
