//! The variables templates are rendered with.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::spec::Spec;

/// Read-only mapping from variable name to value, shared by every file of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RenderContext(Map<String, Value>);

impl RenderContext {
    pub fn new(values: Map<String, Value>) -> Self {
        Self(values)
    }

    /// Builds a context from a JSON object; any other value yields an empty context.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            _ => Self::default(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Resolves a dotted path (`github.owner`) through nested mappings and sequences.
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('.');
        let mut current = self.0.get(parts.next()?)?;
        for part in parts {
            current = match current {
                Value::Object(map) => map.get(part)?,
                Value::Array(items) => items.get(part.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }
}

/// Assembles the render context for a parsed spec.
///
/// Base keys are `repo_name`, `description`, `github_owner`, `private` and
/// `variables`; every spec variable is also exposed at top level and wins over a
/// base key of the same name.
pub fn build_context(spec: &Spec) -> RenderContext {
    let mut values = Map::new();
    values.insert("repo_name".into(), Value::String(spec.repo_name.clone()));
    values.insert("description".into(), Value::String(spec.description.clone()));
    values.insert(
        "github_owner".into(),
        Value::String(spec.github.owner.clone().unwrap_or_default()),
    );
    values.insert("private".into(), Value::Bool(spec.github.private));

    let variables: Map<String, Value> =
        spec.variables.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
    values.insert("variables".into(), Value::Object(variables));

    for (key, value) in &spec.variables {
        values.insert(key.clone(), value.clone());
    }

    RenderContext(values)
}
