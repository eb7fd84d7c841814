//! Spec document ingestion.
//! A spec is a markdown file whose YAML frontmatter (or, failing that, leading
//! `key: value` lines) describes the repository to build.

use log::debug;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::constants::DEFAULT_TEMPLATE;
use crate::error::{Error, Result};

const FRONTMATTER_OPEN: &str = "---\n";
const FRONTMATTER_CLOSE: &str = "\n---\n";

/// GitHub-related settings of a spec.
#[derive(Debug, Clone, PartialEq)]
pub struct GitHubSpec {
    pub owner: Option<String>,
    pub private: bool,
}

impl Default for GitHubSpec {
    fn default() -> Self {
        Self { owner: None, private: true }
    }
}

/// Parsed spec contents used to render a template and create the remote repository.
#[derive(Debug, Clone, PartialEq)]
pub struct Spec {
    pub repo_name: String,
    pub description: String,
    pub template: String,
    pub github: GitHubSpec,
    /// Extra template variables, ordered by key.
    pub variables: BTreeMap<String, Value>,
}

/// Reads and parses the spec file at `spec_path`.
///
/// # Errors
/// * `Error::SpecError` if the file is missing or its content is invalid
pub fn parse_spec<P: AsRef<Path>>(spec_path: P) -> Result<Spec> {
    let spec_path = spec_path.as_ref();
    if !spec_path.exists() {
        return Err(Error::SpecError(format!(
            "Spec file does not exist: {}",
            spec_path.display()
        )));
    }
    debug!("Loading spec from {}", spec_path.display());
    let text = fs::read_to_string(spec_path)?;
    parse_spec_str(&text)
}

/// Parses spec text: YAML frontmatter when present, otherwise leading `key: value` lines.
pub fn parse_spec_str(text: &str) -> Result<Spec> {
    let text = text.replace("\r\n", "\n");
    let data = match parse_frontmatter(&text)? {
        Some(frontmatter) => frontmatter,
        None => {
            debug!("No YAML frontmatter, falling back to key/value lines");
            parse_key_values(&text)
        }
    };
    spec_from_map(&data)
}

/// Extracts and parses the YAML frontmatter block delimited by `---` lines.
///
/// Returns `Ok(None)` when the text does not start with a frontmatter delimiter.
fn parse_frontmatter(text: &str) -> Result<Option<Map<String, Value>>> {
    if !text.starts_with(FRONTMATTER_OPEN) {
        return Ok(None);
    }

    let start = FRONTMATTER_OPEN.len();
    if text[start..].starts_with(FRONTMATTER_OPEN) {
        return Ok(Some(Map::new()));
    }
    let end = text[start..].find(FRONTMATTER_CLOSE).map(|i| i + start).ok_or_else(|| {
        Error::SpecError(
            "YAML frontmatter starts with '---' but no closing '---' was found".to_string(),
        )
    })?;

    let yaml: serde_yaml::Value = serde_yaml::from_str(&text[start..end])?;
    match yaml {
        serde_yaml::Value::Null => Ok(Some(Map::new())),
        serde_yaml::Value::Mapping(_) => match serde_json::to_value(yaml)? {
            Value::Object(map) => Ok(Some(map)),
            _ => Err(frontmatter_not_mapping()),
        },
        _ => Err(frontmatter_not_mapping()),
    }
}

fn frontmatter_not_mapping() -> Error {
    Error::SpecError("YAML frontmatter must be a mapping/object at the top level".to_string())
}

/// Fallback parser for specs without frontmatter.
///
/// Reads `key: value` lines, skipping blank lines and markdown headings, and stops
/// at the first blank line after at least one pair was found.
fn parse_key_values(text: &str) -> Map<String, Value> {
    let mut out = Map::new();
    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() {
            if !out.is_empty() {
                break;
            }
            continue;
        }
        if line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        out.insert(key.to_string(), Value::String(value.trim().to_string()));
    }
    out
}

fn spec_from_map(data: &Map<String, Value>) -> Result<Spec> {
    let repo_name = string_field(data, "repo_name")
        .or_else(|| string_field(data, "name"))
        .filter(|name| !name.is_empty())
        .ok_or_else(|| {
            Error::SpecError(
                "Spec must define `repo_name` (YAML frontmatter recommended)".to_string(),
            )
        })?;
    let description = string_field(data, "description").unwrap_or_default();
    let template = string_field(data, "template").unwrap_or_else(|| DEFAULT_TEMPLATE.to_string());

    let github = match data.get("github") {
        None | Some(Value::Null) => GitHubSpec::default(),
        Some(Value::Object(github)) => GitHubSpec {
            owner: github
                .get("owner")
                .filter(|owner| !owner.is_null())
                .map(to_text)
                .filter(|owner| !owner.is_empty()),
            private: github.get("private").map(is_truthy).unwrap_or(true),
        },
        Some(_) => {
            return Err(Error::SpecError(
                "`github` must be an object/mapping when provided".to_string(),
            ))
        }
    };

    let variables = match data.get("variables") {
        None | Some(Value::Null) => BTreeMap::new(),
        Some(Value::Object(variables)) => {
            variables.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
        }
        Some(_) => {
            return Err(Error::SpecError(
                "`variables` must be an object/mapping when provided".to_string(),
            ))
        }
    };

    Ok(Spec { repo_name, description, template, github, variables })
}

/// Reads `key` as a trimmed string when it is set.
///
/// Null, `false`, `0` and empty values count as unset; any other value is kept, so a
/// blank string yields `Some("")`.
fn string_field(data: &Map<String, Value>, key: &str) -> Option<String> {
    data.get(key).filter(|value| is_set(value)).map(to_text)
}

fn to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

/// Plain value truthiness: strings are only unset when empty.
fn is_set(value: &Value) -> bool {
    match value {
        Value::String(s) => !s.is_empty(),
        other => is_truthy(other),
    }
}

/// Truthiness of a flag such as `github.private`. Strings such as `false` or `no` are false.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "" | "false" | "no" | "off" | "0"
        ),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}
