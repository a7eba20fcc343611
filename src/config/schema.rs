use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::variable::VariableConfig;
use crate::error::{Result, StampError};
use crate::render::scanner::{Delimiters, DEFAULT_CLOSE, DEFAULT_OPEN};
use crate::render::DerivationRule;

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct TemplateConfig {
    #[serde(default)]
    pub template: TemplateMetadata,

    /// Prompted in declaration order.
    #[serde(default)]
    pub variables: IndexMap<String, VariableConfig>,

    /// Applied in declaration order after all answers are collected.
    #[serde(default)]
    pub derive: Vec<DerivationRule>,

    #[serde(default)]
    pub files: FilesConfig,

    #[serde(default)]
    pub hooks: HooksConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TemplateMetadata {
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,

    #[serde(default = "default_open")]
    pub open: String,

    #[serde(default = "default_close")]
    pub close: String,

    /// Prefix accepted in front of variable names, e.g. `cookiecutter`.
    pub namespace: Option<String>,
}

fn default_open() -> String {
    DEFAULT_OPEN.to_string()
}

fn default_close() -> String {
    DEFAULT_CLOSE.to_string()
}

impl Default for TemplateMetadata {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: None,
            open: default_open(),
            close: default_close(),
            namespace: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct FilesConfig {
    #[serde(default)]
    pub exclude: Vec<String>,

    #[serde(default)]
    pub copy_without_render: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct HooksConfig {
    /// Shell command run in the output directory after a successful commit.
    /// Placeholders in it are rendered first.
    #[serde(default)]
    pub post_create: Option<String>,
}

impl HooksConfig {
    pub fn has_hooks(&self) -> bool {
        self.post_create.is_some()
    }
}

impl TemplateConfig {
    pub fn delimiters(&self) -> Result<Delimiters> {
        Delimiters::new(&self.template.open, &self.template.close)
    }

    pub fn validate(&self) -> Result<()> {
        self.delimiters()?;

        for (name, var) in &self.variables {
            if let Some(choices) = &var.choices {
                if choices.is_empty() {
                    return Err(StampError::InvalidVariable {
                        name: name.clone(),
                        reason: "'choices' must not be empty".into(),
                    });
                }
                if let Some(default) = var.default_value() {
                    if !choices.contains(&default) {
                        return Err(StampError::InvalidVariable {
                            name: name.clone(),
                            reason: format!("default '{default}' is not one of the choices"),
                        });
                    }
                }
            }

            if let Some(pattern) = &var.validation {
                if let Err(e) = regex_lite::Regex::new(pattern) {
                    return Err(StampError::InvalidVariable {
                        name: name.clone(),
                        reason: format!("invalid validation regex: {e}"),
                    });
                }
            }
        }

        for rule in &self.derive {
            if rule.source.is_empty() || rule.target.is_empty() {
                return Err(StampError::InvalidManifest {
                    reason: "derive rules need both 'source' and 'target'".into(),
                });
            }
        }

        Ok(())
    }
}
