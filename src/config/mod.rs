pub mod schema;
pub mod variable;

use std::path::Path;

use crate::error::{Result, StampError};

pub use schema::TemplateConfig;
pub use variable::VariableConfig;

pub const MANIFEST_FILE: &str = "stamp.toml";

/// Load and validate a TemplateConfig from a stamp.toml file.
pub fn load_config(path: &Path) -> Result<TemplateConfig> {
    let config_path = if path.ends_with(MANIFEST_FILE) {
        path.to_path_buf()
    } else {
        path.join(MANIFEST_FILE)
    };

    let content = std::fs::read_to_string(&config_path).map_err(|e| StampError::Io {
        context: format!("reading {}", config_path.display()),
        source: e,
    })?;

    let config: TemplateConfig =
        toml::from_str(&content).map_err(|e| StampError::ManifestParse {
            path: config_path.clone(),
            source: e,
        })?;

    config.validate()?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_manifest() {
        let toml_str = r#"
[template]
name = "kmp-mobile"
namespace = "cookiecutter"

[variables.project_name]
prompt = "Project name"
default = "MyApp"
validation = '^[a-zA-Z][a-zA-Z0-9_-]*$'

[variables.bundle_id_prefix]
default = "com.example.app"

[variables.license]
choices = ["MIT", "Apache-2.0"]
default = "MIT"

[[derive]]
source = "bundle_id_prefix"
transform = "replace('.', '/')"
target = "package_path"

[[derive]]
source = "project_name"
target = "project_dir"

[files]
exclude = ["hooks/**"]
copy_without_render = ["**/*.png"]

[hooks]
post_create = "echo {{ project_name }}"
"#;
        let config: TemplateConfig = toml::from_str(toml_str).unwrap();
        config.validate().unwrap();

        let names: Vec<_> = config.variables.keys().cloned().collect();
        assert_eq!(names, vec!["project_name", "bundle_id_prefix", "license"]);
        assert_eq!(config.template.open, "{{");
        assert_eq!(config.template.namespace.as_deref(), Some("cookiecutter"));
        assert_eq!(config.derive.len(), 2);
        assert_eq!(config.derive[1].transform, "");
        assert!(config.hooks.has_hooks());
    }

    #[test]
    fn test_validation_choices_default_mismatch() {
        let toml_str = r#"
[variables.license]
choices = ["MIT"]
default = "GPL"
"#;
        let config: TemplateConfig = toml::from_str(toml_str).unwrap();
        assert!(matches!(
            config.validate(),
            Err(StampError::InvalidVariable { .. })
        ));
    }

    #[test]
    fn test_validation_empty_delimiter() {
        let toml_str = r#"
[template]
open = ""
"#;
        let config: TemplateConfig = toml::from_str(toml_str).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_config_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(MANIFEST_FILE), "[template\nname=").unwrap();
        assert!(matches!(
            load_config(dir.path()),
            Err(StampError::ManifestParse { .. })
        ));
    }
}
