use crate::error::{EmbedError, Result};
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

pub const KEY_PATH: &str = "PATH";
pub const KEY_TITLE: &str = "TITLE";
pub const KEY_LINES: &str = "LINES";
pub const KEY_FUNCTION: &str = "FUNCTION";

/// Key-value configuration written inside an embed block:
///
/// ```yaml
/// PATH: "vault://src/app.py"
/// TITLE: "entry point"
/// LINES: "1-3, 10"
/// FUNCTION: "main, helper"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedConfig {
    /// `vault://...` or `http[s]://...`
    pub path: Option<String>,

    /// Display title; defaults to the source file name
    pub title: Option<String>,

    /// Range expression; takes precedence over `functions`
    pub lines: Option<String>,

    /// Function names to show, in the order written
    #[serde(default)]
    pub functions: Vec<String>,
}

impl EmbedConfig {
    /// Parse the block body. Malformed YAML is a configuration error; anything that
    /// is valid YAML but not a mapping simply carries no keys.
    pub fn parse(source: &str) -> Result<Self> {
        let value: Value =
            serde_yaml::from_str(source).map_err(|e| EmbedError::config(e.to_string()))?;

        let Value::Mapping(mapping) = value else {
            return Ok(Self::default());
        };

        Ok(Self {
            path: scalar(&mapping, KEY_PATH),
            title: scalar(&mapping, KEY_TITLE),
            lines: scalar(&mapping, KEY_LINES),
            functions: function_names(mapping.get(KEY_FUNCTION)),
        })
    }

    /// Range expression, if one was given and is not blank
    #[must_use]
    pub fn line_expression(&self) -> Option<&str> {
        self.lines
            .as_deref()
            .map(str::trim)
            .filter(|expr| !expr.is_empty())
    }

    #[must_use]
    pub fn has_functions(&self) -> bool {
        !self.functions.is_empty()
    }
}

fn scalar(mapping: &Mapping, key: &str) -> Option<String> {
    match mapping.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Sequence(items) => {
            let joined: Vec<String> = items.iter().filter_map(scalar_value).collect();
            (!joined.is_empty()).then(|| joined.join(","))
        }
        _ => None,
    }
}

fn scalar_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn function_names(value: Option<&Value>) -> Vec<String> {
    let raw: Vec<String> = match value {
        Some(Value::String(s)) => s.split(',').map(str::to_string).collect(),
        Some(Value::Sequence(items)) => items.iter().filter_map(scalar_value).collect(),
        _ => Vec::new(),
    };

    raw.into_iter()
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_all_keys() {
        let config = EmbedConfig::parse(
            "PATH: \"vault://src/app.py\"\nTITLE: \"App\"\nLINES: \"1-3, 9\"\nFUNCTION: \"main, helper\"\n",
        )
        .unwrap();

        assert_eq!(config.path.as_deref(), Some("vault://src/app.py"));
        assert_eq!(config.title.as_deref(), Some("App"));
        assert_eq!(config.line_expression(), Some("1-3, 9"));
        assert_eq!(config.functions, vec!["main", "helper"]);
    }

    #[test]
    fn test_numeric_lines_and_list_of_functions() {
        let config =
            EmbedConfig::parse("PATH: vault://a.c\nLINES: 7\nFUNCTION: [foo, bar]\n").unwrap();
        assert_eq!(config.line_expression(), Some("7"));
        assert_eq!(config.functions, vec!["foo", "bar"]);
    }

    #[test]
    fn test_blank_lines_mean_no_selection() {
        let config = EmbedConfig::parse("PATH: vault://a.c\nLINES: \"  \"\n").unwrap();
        assert_eq!(config.line_expression(), None);
        assert!(!config.has_functions());
    }

    #[test]
    fn test_invalid_yaml_is_config_error() {
        let err = EmbedConfig::parse("PATH: [unclosed\n").unwrap_err();
        assert!(matches!(err, EmbedError::Config(_)));
    }

    #[test]
    fn test_empty_and_scalar_bodies_have_no_path() {
        assert_eq!(EmbedConfig::parse("").unwrap().path, None);
        assert_eq!(EmbedConfig::parse("just text").unwrap().path, None);
    }
}
