use std::path::Path;

use crate::adapter::TemplateFormat;
use crate::config::MANIFEST_FILE;

pub const COOKIECUTTER_FILE: &str = "cookiecutter.json";

/// Priority: stamp.toml > cookiecutter.json > plain directory.
pub fn detect_format(template_dir: &Path) -> TemplateFormat {
    if template_dir.join(MANIFEST_FILE).is_file() {
        return TemplateFormat::Native;
    }

    if template_dir.join(COOKIECUTTER_FILE).is_file() {
        return TemplateFormat::Cookiecutter;
    }

    TemplateFormat::Plain
}
