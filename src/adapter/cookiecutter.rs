use std::path::Path;

use indexmap::IndexMap;

use crate::adapter::detect::COOKIECUTTER_FILE;
use crate::adapter::{ResolvedTemplate, TemplateFormat};
use crate::config::schema::{FilesConfig, TemplateConfig, TemplateMetadata};
use crate::config::variable::VariableConfig;
use crate::error::{Result, StampError};
use crate::render::scanner::{Delimiters, Token};
use crate::render::{DerivationRule, Expression};

const NAMESPACE: &str = "cookiecutter";

/// Resolve a cookiecutter template into a `ResolvedTemplate`.
pub fn resolve(template_dir: &Path) -> Result<ResolvedTemplate> {
    let json_path = template_dir.join(COOKIECUTTER_FILE);
    let content = std::fs::read_to_string(&json_path).map_err(|e| StampError::Io {
        context: format!("reading {}", json_path.display()),
        source: e,
    })?;

    let raw: serde_json::Value = serde_json::from_str(&content)
        .map_err(|e| StampError::ManifestParseCookiecutter { source: e })?;
    let obj = raw.as_object().ok_or(StampError::CookiecutterNotObject)?;

    let (mut config, mut warnings) = convert(obj);

    if template_dir.join("hooks").exists() {
        warnings.push(
            "hooks directory detected: Python hooks are not supported and will be skipped"
                .to_string(),
        );
    }

    config.template.name = template_dir
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("cookiecutter-template")
        .to_string();
    config.validate()?;

    // Only `{{cookiecutter.*}}` directories at the root are template content.
    let root_prefix = Some(config.template.open.clone());

    Ok(ResolvedTemplate {
        config,
        format: TemplateFormat::Cookiecutter,
        root_prefix,
        warnings,
    })
}

/// Map cookiecutter.json entries onto a template config. Keys keep file
/// order, which is also prompt and derivation order.
fn convert(obj: &serde_json::Map<String, serde_json::Value>) -> (TemplateConfig, Vec<String>) {
    let mut variables: IndexMap<String, VariableConfig> = IndexMap::new();
    let mut derive = Vec::new();
    let mut copy_without_render = Vec::new();
    let mut warnings = Vec::new();

    for (key, value) in obj {
        match key.as_str() {
            "_copy_without_render" => {
                if let Some(arr) = value.as_array() {
                    copy_without_render
                        .extend(arr.iter().filter_map(|v| v.as_str()).map(String::from));
                }
            }
            "_extensions" => {
                warnings.push(
                    "Jinja2 extensions detected (_extensions): not supported, ignoring"
                        .to_string(),
                );
            }
            "__prompts__" => {}
            _ => {
                if let Some(rule) = value.as_str().and_then(|s| derived_rule(key, s)) {
                    derive.push(rule);
                } else if key.starts_with('_') {
                    // Private keys are never prompted.
                } else if let Some(var) = json_value_to_variable(key, value, &mut warnings) {
                    variables.insert(key.clone(), var);
                }
            }
        }
    }

    if let Some(prompts) = obj.get("__prompts__").and_then(|p| p.as_object()) {
        for (name, text) in prompts {
            if let (Some(var), Some(text)) = (variables.get_mut(name), text.as_str()) {
                var.prompt = Some(text.to_string());
            }
        }
    }

    let config = TemplateConfig {
        template: TemplateMetadata {
            namespace: Some(NAMESPACE.to_string()),
            ..TemplateMetadata::default()
        },
        variables,
        derive,
        files: FilesConfig {
            exclude: vec![COOKIECUTTER_FILE.to_string()],
            copy_without_render,
        },
        hooks: Default::default(),
    };

    (config, warnings)
}

/// `{{ cookiecutter.x | filters }}` as the whole value becomes `x | filters`.
///
/// A whole placeholder whose body does not parse is still turned into a rule,
/// with the raw body as its source, so resolving it reports an
/// `InvalidExpression` instead of the text reaching the output.
fn derived_rule(key: &str, value: &str) -> Option<DerivationRule> {
    let value = value.trim();
    let delimiters = Delimiters::default();
    let mut tokens = delimiters.scan(value);

    let Some(Token::Placeholder(p)) = tokens.next() else {
        return None;
    };
    if p.start != 0 || p.end != value.len() || tokens.next().is_some() {
        return None;
    }

    let body = p.expr.trim();
    let Ok(expr) = Expression::parse(body) else {
        return Some(DerivationRule {
            source: body.to_string(),
            transform: String::new(),
            target: key.to_string(),
        });
    };
    let source = expr
        .variable
        .strip_prefix(NAMESPACE)
        .and_then(|rest| rest.strip_prefix('.'))
        .unwrap_or(&expr.variable);

    Some(DerivationRule {
        source: source.to_string(),
        transform: expr.filters_text(),
        target: key.to_string(),
    })
}

fn json_value_to_variable(
    key: &str,
    value: &serde_json::Value,
    warnings: &mut Vec<String>,
) -> Option<VariableConfig> {
    let default = match value {
        serde_json::Value::String(s) => {
            if s.contains(crate::render::scanner::DEFAULT_OPEN) {
                warnings.push(format!(
                    "Variable '{key}': default mixes text and placeholders, used literally"
                ));
            }
            toml::Value::String(s.clone())
        }
        serde_json::Value::Bool(b) => toml::Value::Boolean(*b),
        // Keep the JSON spelling: `1.0` stays `1.0`, big integers stay exact.
        serde_json::Value::Number(n) => toml::Value::String(n.to_string()),
        serde_json::Value::Array(arr) => {
            // Array of strings: a choice, first item is the default.
            let choices: Vec<String> = arr
                .iter()
                .map(|v| match v {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect();
            let Some(first) = choices.first().cloned() else {
                warnings.push(format!("Variable '{key}': empty choice list, skipping"));
                return None;
            };
            return Some(VariableConfig {
                prompt: Some(key.to_string()),
                default: Some(toml::Value::String(first)),
                choices: Some(choices),
                ..Default::default()
            });
        }
        serde_json::Value::Object(_) | serde_json::Value::Null => {
            warnings.push(format!("Variable '{key}': unsupported type, skipping"));
            return None;
        }
    };

    Some(VariableConfig {
        prompt: Some(key.to_string()),
        default: Some(default),
        ..Default::default()
    })
}
