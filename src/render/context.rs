use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::render::diagnostic::{Diagnostics, ErrorKind, Location};
use crate::render::expr::{Evaluator, Expression};
use crate::render::scanner::Delimiters;

/// Resolved variable values. Built once before rendering and only read
/// afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableBindings {
    values: BTreeMap<String, String>,
}

impl VariableBindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl FromIterator<(String, String)> for VariableBindings {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// `target = source | transform`, evaluated once while building bindings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DerivationRule {
    pub source: String,
    /// Filter chain, e.g. `lower | replace('-', '_')`. Empty copies the value.
    #[serde(default)]
    pub transform: String,
    pub target: String,
}

/// Apply derivation rules in list order on top of the user's answers.
///
/// A rule whose source is unset records `UndefinedVariable` and leaves its
/// target unset. Filter problems follow the placeholder rules: recorded, then
/// the unfiltered value is used. A transform that does not parse at all is an
/// `InvalidExpression`; the target then gets the source value as-is.
pub fn resolve_bindings(
    answers: VariableBindings,
    rules: &[DerivationRule],
) -> (VariableBindings, Diagnostics) {
    let mut bindings = answers;
    let mut diags = Diagnostics::default();
    let delimiters = Delimiters::default();

    for (index, rule) in rules.iter().enumerate() {
        let location = Location::Derivation {
            rule: index,
            target: rule.target.clone(),
        };

        let text = if rule.transform.trim().is_empty() {
            rule.source.clone()
        } else {
            format!("{} | {}", rule.source, rule.transform)
        };

        let expr = match Expression::parse(&text) {
            Ok(expr) => expr,
            Err(_) => {
                diags.error(
                    ErrorKind::InvalidExpression {
                        expr: text.trim().to_string(),
                    },
                    location,
                );
                if let Some(value) = bindings.get(&rule.source).map(str::to_string) {
                    bindings.insert(rule.target.clone(), value);
                }
                continue;
            }
        };

        if !bindings.contains(&rule.source) {
            diags.error(
                ErrorKind::UndefinedVariable {
                    name: rule.source.clone(),
                },
                location,
            );
            continue;
        }

        let value =
            Evaluator::new(&bindings, &delimiters, None).evaluate_expr(&expr, &location, &mut diags);
        bindings.insert(rule.target.clone(), value);
    }

    (bindings, diags)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(source: &str, transform: &str, target: &str) -> DerivationRule {
        DerivationRule {
            source: source.into(),
            transform: transform.into(),
            target: target.into(),
        }
    }

    fn answers(pairs: &[(&str, &str)]) -> VariableBindings {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_rules_apply_in_order() {
        let rules = vec![
            rule("project_name", "snake_case", "project_slug"),
            rule("project_slug", "upper", "const_name"),
            rule("bundle_id_prefix", "replace('.', '/')", "package_path"),
        ];
        let (bindings, diags) = resolve_bindings(
            answers(&[
                ("project_name", "My App"),
                ("bundle_id_prefix", "com.example"),
            ]),
            &rules,
        );

        assert!(diags.errors.is_empty());
        assert_eq!(bindings.get("project_slug"), Some("my_app"));
        assert_eq!(bindings.get("const_name"), Some("MY_APP"));
        assert_eq!(bindings.get("package_path"), Some("com/example"));
    }

    #[test]
    fn test_rule_order_matters() {
        // The second rule reads `slug` before the third one defines it.
        let rules = vec![
            rule("name", "", "copy"),
            rule("slug", "upper", "loud"),
            rule("name", "slugify", "slug"),
        ];
        let (bindings, diags) = resolve_bindings(answers(&[("name", "Hello World")]), &rules);

        assert_eq!(bindings.get("copy"), Some("Hello World"));
        assert_eq!(bindings.get("slug"), Some("hello-world"));
        assert!(!bindings.contains("loud"));
        assert_eq!(diags.errors.len(), 1);
        assert_eq!(
            diags.errors[0].kind,
            ErrorKind::UndefinedVariable {
                name: "slug".into()
            }
        );
        assert_eq!(
            diags.errors[0].location,
            Location::Derivation {
                rule: 1,
                target: "loud".into()
            }
        );
    }

    #[test]
    fn test_unknown_filter_in_rule_uses_source_value() {
        let rules = vec![rule("name", "frobnicate", "out")];
        let (bindings, diags) = resolve_bindings(answers(&[("name", "Value")]), &rules);

        assert_eq!(bindings.get("out"), Some("Value"));
        assert!(matches!(
            diags.errors[0].kind,
            ErrorKind::UnknownFilter { ref name } if name == "frobnicate"
        ));
    }

    #[test]
    fn test_unparseable_transform_keeps_source_value() {
        let rules = vec![
            rule("name", "replace('a'", "broken"),
            rule("name.lower().", "", "garbled"),
        ];
        let (bindings, diags) = resolve_bindings(answers(&[("name", "Value")]), &rules);

        assert_eq!(bindings.get("broken"), Some("Value"));
        assert!(!bindings.contains("garbled"));
        assert_eq!(diags.errors.len(), 2);
        assert_eq!(
            diags.errors[0].kind,
            ErrorKind::InvalidExpression {
                expr: "name | replace('a'".into()
            }
        );
        assert!(matches!(
            diags.errors[1].kind,
            ErrorKind::InvalidExpression { .. }
        ));
    }
}
