use std::collections::BTreeMap;

use crate::config::schema::TemplateConfig;
use crate::config::variable::VariableConfig;
use crate::error::{Result, StampError};
use crate::render::VariableBindings;

#[derive(Default)]
pub struct PromptOptions {
    /// Values from the answers file and `-d` flags, `-d` winning.
    pub overrides: BTreeMap<String, String>,
    /// Ask on the terminal for variables without an override.
    pub interactive: bool,
}

/// Collect the user's answers in declaration order.
///
/// Overrides always win. Without a terminal, defaults are used and variables
/// with no default stay unset so that every reference to them is reported by
/// the render pass. Override keys that the manifest does not declare are kept
/// as plain bindings.
pub fn collect_answers(config: &TemplateConfig, options: &PromptOptions) -> Result<VariableBindings> {
    let mut answers = VariableBindings::new();

    for (name, var) in &config.variables {
        let value = if let Some(value) = options.overrides.get(name) {
            Some(value.clone())
        } else if options.interactive {
            Some(prompt_variable(name, var)?)
        } else {
            var.default_value()
        };

        if let Some(value) = value {
            var.check_value(name, &value)?;
            answers.insert(name.clone(), value);
        }
    }

    for (name, value) in &options.overrides {
        if !config.variables.contains_key(name) {
            answers.insert(name.clone(), value.clone());
        }
    }

    Ok(answers)
}

fn prompt_variable(name: &str, var: &VariableConfig) -> Result<String> {
    let prompt_text = var.prompt.as_deref().unwrap_or(name);
    let default = var.default_value();

    if let Some(choices) = &var.choices {
        let mut prompt = inquire::Select::new(prompt_text, choices.clone());
        if let Some(default) = &default {
            if let Some(idx) = choices.iter().position(|c| c == default) {
                prompt = prompt.with_starting_cursor(idx);
            }
        }
        return prompt.prompt().map_err(|_| StampError::PromptCancelled);
    }

    let mut prompt = inquire::Text::new(prompt_text);
    if let Some(default) = &default {
        prompt = prompt.with_default(default);
    }
    if let Some(pattern) = &var.validation {
        let pattern = pattern.clone();
        let msg = var
            .validation_message
            .clone()
            .unwrap_or_else(|| format!("Must match pattern: {pattern}"));
        prompt = prompt.with_validator(move |input: &str| {
            let re = regex_lite::Regex::new(&pattern)
                .map_err(|e| inquire::CustomUserError::from(e.to_string()))?;
            if re.is_match(input) {
                Ok(inquire::validator::Validation::Valid)
            } else {
                Ok(inquire::validator::Validation::Invalid(
                    inquire::validator::ErrorMessage::Custom(msg.clone()),
                ))
            }
        });
    }
    prompt.prompt().map_err(|_| StampError::PromptCancelled)
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;

    use super::*;
    use rstest::rstest;

    fn config(variables: IndexMap<String, VariableConfig>) -> TemplateConfig {
        TemplateConfig {
            variables,
            ..Default::default()
        }
    }

    fn string_var(default: Option<&str>) -> VariableConfig {
        VariableConfig {
            default: default.map(|d| toml::Value::String(d.to_string())),
            ..Default::default()
        }
    }

    fn non_interactive(overrides: &[(&str, &str)]) -> PromptOptions {
        PromptOptions {
            overrides: overrides
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            interactive: false,
        }
    }

    #[test]
    fn test_defaults_and_overrides() {
        let mut variables = IndexMap::new();
        variables.insert("project_name".to_string(), string_var(Some("MyApp")));
        variables.insert("bundle_id_prefix".to_string(), string_var(Some("com.example")));
        variables.insert("no_default".to_string(), string_var(None));

        let answers = collect_answers(
            &config(variables),
            &non_interactive(&[("bundle_id_prefix", "jp.kk"), ("extra", "kept")]),
        )
        .unwrap();

        assert_eq!(answers.get("project_name"), Some("MyApp"));
        assert_eq!(answers.get("bundle_id_prefix"), Some("jp.kk"));
        assert_eq!(answers.get("extra"), Some("kept"));
        assert!(!answers.contains("no_default"));
    }

    #[rstest]
    #[case("MyApp", true)]
    #[case("my-app", true)]
    #[case("-bad", false)]
    #[case("1app", false)]
    fn test_override_validated(#[case] value: &str, #[case] ok: bool) {
        let mut variables = IndexMap::new();
        variables.insert(
            "project_name".to_string(),
            VariableConfig {
                validation: Some(r"^[a-zA-Z][a-zA-Z0-9_-]*[a-zA-Z0-9]$|^[a-zA-Z]$".into()),
                ..Default::default()
            },
        );

        let result = collect_answers(
            &config(variables),
            &non_interactive(&[("project_name", value)]),
        );
        assert_eq!(result.is_ok(), ok);
    }

    #[test]
    fn test_default_outside_choices_rejected_for_override() {
        let mut variables = IndexMap::new();
        variables.insert(
            "license".to_string(),
            VariableConfig {
                choices: Some(vec!["MIT".into()]),
                default: Some(toml::Value::String("MIT".into())),
                ..Default::default()
            },
        );

        let result = collect_answers(&config(variables), &non_interactive(&[("license", "BSD")]));
        assert!(matches!(result, Err(StampError::ValidationFailed { .. })));
    }
}
