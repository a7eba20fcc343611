use serde::{Deserialize, Serialize};

use crate::error::{Result, StampError};

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
pub struct VariableConfig {
    pub prompt: Option<String>,
    pub default: Option<toml::Value>,
    /// Restrict answers to this list; the prompt becomes a selection.
    pub choices: Option<Vec<String>>,
    /// Regex every answer must match.
    pub validation: Option<String>,
    pub validation_message: Option<String>,
}

impl VariableConfig {
    /// The default rendered as a binding value. Tables and arrays have no
    /// string form.
    pub fn default_value(&self) -> Option<String> {
        match self.default.as_ref()? {
            toml::Value::String(s) => Some(s.clone()),
            toml::Value::Integer(n) => Some(n.to_string()),
            toml::Value::Float(f) => Some(f.to_string()),
            toml::Value::Boolean(b) => Some(b.to_string()),
            toml::Value::Datetime(d) => Some(d.to_string()),
            toml::Value::Array(_) | toml::Value::Table(_) => None,
        }
    }

    /// Check an answer against `choices` and `validation`.
    pub fn check_value(&self, name: &str, value: &str) -> Result<()> {
        if let Some(choices) = &self.choices {
            if !choices.iter().any(|c| c == value) {
                return Err(StampError::ValidationFailed {
                    name: name.to_string(),
                    message: format!("'{value}' is not one of: {}", choices.join(", ")),
                });
            }
        }

        if let Some(pattern) = &self.validation {
            let re = regex_lite::Regex::new(pattern).map_err(|e| StampError::InvalidVariable {
                name: name.to_string(),
                reason: format!("invalid validation regex: {e}"),
            })?;
            if !re.is_match(value) {
                let message = self
                    .validation_message
                    .clone()
                    .unwrap_or_else(|| format!("'{value}' must match pattern: {pattern}"));
                return Err(StampError::ValidationFailed {
                    name: name.to_string(),
                    message,
                });
            }
        }

        Ok(())
    }
}
