use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{Result, StampError};

/// Load a non-interactive answers file: a flat table of `key = value`.
///
/// `.json` files are read as JSON objects, everything else as TOML. A
/// cookiecutter-style `default_context` table, when present, is used instead
/// of the top level.
pub fn load_answers_file(path: &Path) -> Result<BTreeMap<String, String>> {
    let content = std::fs::read_to_string(path).map_err(|e| StampError::Io {
        context: format!("reading answers file {}", path.display()),
        source: e,
    })?;

    let parse_error = |message: String| StampError::AnswersParse {
        path: path.to_path_buf(),
        message,
    };

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let table: serde_json::Map<String, serde_json::Value> = if is_json {
        let value: serde_json::Value =
            serde_json::from_str(&content).map_err(|e| parse_error(e.to_string()))?;
        match value {
            serde_json::Value::Object(map) => map,
            _ => return Err(parse_error("expected a JSON object".into())),
        }
    } else {
        let value: toml::Table = toml::from_str(&content).map_err(|e| parse_error(e.to_string()))?;
        value
            .into_iter()
            .map(|(k, v)| (k, toml_to_json(v)))
            .collect()
    };

    let table = match table.get("default_context") {
        Some(serde_json::Value::Object(ctx)) => ctx.clone(),
        _ => table,
    };

    table
        .into_iter()
        .map(|(key, value)| {
            let value = scalar_to_string(&value)
                .ok_or_else(|| parse_error(format!("value for '{key}' must be a scalar")))?;
            Ok((key, value))
        })
        .collect()
}

/// Parse repeated `-d key=value` arguments.
pub fn parse_data(pairs: &[String]) -> Result<Vec<(String, String)>> {
    pairs
        .iter()
        .map(|kv| match kv.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => {
                Ok((key.trim().to_string(), value.to_string()))
            }
            _ => Err(StampError::InvalidData { input: kv.clone() }),
        })
        .collect()
}

fn scalar_to_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn toml_to_json(val: toml::Value) -> serde_json::Value {
    match val {
        toml::Value::String(s) => serde_json::Value::String(s),
        toml::Value::Integer(n) => serde_json::Value::Number(n.into()),
        toml::Value::Float(f) => serde_json::Number::from_f64(f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        toml::Value::Boolean(b) => serde_json::Value::Bool(b),
        toml::Value::Datetime(d) => serde_json::Value::String(d.to_string()),
        toml::Value::Array(arr) => {
            serde_json::Value::Array(arr.into_iter().map(toml_to_json).collect())
        }
        toml::Value::Table(t) => {
            serde_json::Value::Object(t.into_iter().map(|(k, v)| (k, toml_to_json(v))).collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn write(name: &str, content: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn test_load_toml_answers() {
        let (_dir, path) = write(
            "answers.toml",
            "project_name = \"My App\"\nmin_sdk = 24\nuse_compose = true\n",
        );
        let answers = load_answers_file(&path).unwrap();
        assert_eq!(answers["project_name"], "My App");
        assert_eq!(answers["min_sdk"], "24");
        assert_eq!(answers["use_compose"], "true");
    }

    #[test]
    fn test_load_json_default_context() {
        let (_dir, path) = write(
            "answers.json",
            r#"{"default_context": {"bundle_id_prefix": "jp.example"}}"#,
        );
        let answers = load_answers_file(&path).unwrap();
        assert_eq!(answers.len(), 1);
        assert_eq!(answers["bundle_id_prefix"], "jp.example");
    }

    #[rstest]
    #[case("answers.toml", "nested = { a = 1 }")]
    #[case("answers.toml", "not toml at all = =")]
    #[case("answers.json", "[1, 2]")]
    fn test_load_answers_rejects(#[case] name: &str, #[case] content: &str) {
        let (_dir, path) = write(name, content);
        assert!(matches!(
            load_answers_file(&path),
            Err(StampError::AnswersParse { .. })
        ));
    }

    #[test]
    fn test_parse_data() {
        let pairs = parse_data(&["a=1".into(), "b=x=y".into(), "c=".into()]).unwrap();
        assert_eq!(
            pairs,
            vec![
                ("a".to_string(), "1".to_string()),
                ("b".to_string(), "x=y".to_string()),
                ("c".to_string(), String::new()),
            ]
        );
    }

    #[rstest]
    #[case("novalue")]
    #[case("=value")]
    fn test_parse_data_rejects(#[case] input: &str) {
        assert!(matches!(
            parse_data(&[input.to_string()]),
            Err(StampError::InvalidData { .. })
        ));
    }
}
