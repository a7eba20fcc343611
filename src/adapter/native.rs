use std::path::Path;

use crate::adapter::{ResolvedTemplate, TemplateFormat};
use crate::config::{load_config, MANIFEST_FILE};
use crate::error::Result;

/// Resolve a template described by stamp.toml.
pub fn resolve(template_dir: &Path) -> Result<ResolvedTemplate> {
    let mut config = load_config(template_dir)?;
    config.files.exclude.push(MANIFEST_FILE.to_string());

    Ok(ResolvedTemplate {
        config,
        format: TemplateFormat::Native,
        root_prefix: None,
        warnings: Vec::new(),
    })
}
