//! Front-matter splitting and YAML parsing.

use serde_json::{Map, Value};
use thiserror::Error;

const DELIMITER: &str = "---";

/// Parsed front matter plus the remaining body.
#[derive(Debug, Clone, PartialEq)]
pub struct FrontMatter {
    pub data: Map<String, Value>,
    pub content: String,
}

#[derive(Debug, Error, PartialEq)]
pub enum FrontMatterError {
    #[error("front matter is not terminated by a closing '---'")]
    Unterminated,
    #[error("invalid YAML in front matter: {0}")]
    Yaml(String),
    #[error("front matter must be a YAML mapping")]
    NotAMapping,
}

/// Returns true when `text` opens with a `---` delimiter line.
pub fn has_front_matter(text: &str) -> bool {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    text.lines()
        .next()
        .is_some_and(|line| line.trim_end() == DELIMITER)
}

/// Splits a leading `---` block from `text` and parses it as YAML.
///
/// Text without front matter yields empty data and the full text as content.
pub fn parse(text: &str) -> Result<FrontMatter, FrontMatterError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    if !has_front_matter(text) {
        return Ok(FrontMatter {
            data: Map::new(),
            content: text.to_string(),
        });
    }

    let mut lines = text.split_inclusive('\n');
    let opening = lines.next().unwrap_or_default();
    let mut yaml = String::new();
    let mut consumed = opening.len();
    let mut closed = false;

    for line in lines.by_ref() {
        consumed += line.len();
        if line.trim_end() == DELIMITER {
            closed = true;
            break;
        }
        yaml.push_str(line);
    }

    if !closed {
        return Err(FrontMatterError::Unterminated);
    }

    let content = text[consumed..].to_string();
    let data = parse_yaml_mapping(&yaml)?;
    Ok(FrontMatter { data, content })
}

fn parse_yaml_mapping(yaml: &str) -> Result<Map<String, Value>, FrontMatterError> {
    if yaml.trim().is_empty() {
        return Ok(Map::new());
    }

    let parsed: serde_yaml::Value =
        serde_yaml::from_str(yaml).map_err(|e| FrontMatterError::Yaml(e.to_string()))?;
    let json = serde_json::to_value(parsed).map_err(|e| FrontMatterError::Yaml(e.to_string()))?;

    match json {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        _ => Err(FrontMatterError::NotAMapping),
    }
}
