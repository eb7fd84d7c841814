//! Variable substitution for text templates.
//! Wraps MiniJinja configured for strict lookups: a template that references a
//! variable missing from the context fails instead of rendering blanks.
use std::borrow::Cow;

use log::debug;
use minijinja::{AutoEscape, Environment, ErrorKind, UndefinedBehavior};

use crate::constants::MARKERS;
use crate::context::RenderContext;
use crate::error::{Error, Result};

/// Names MiniJinja resolves itself and therefore never reports as missing.
const BUILTIN_GLOBALS: [&str; 5] = ["debug", "dict", "loop", "namespace", "range"];

/// Trait for template rendering engines.
pub trait TemplateRenderer {
    /// Renders a template string with the given context.
    ///
    /// # Arguments
    /// * `name` - Template-relative path, used in error reports
    /// * `template` - Template source
    /// * `context` - Variables available to the template
    ///
    /// # Returns
    /// * `Result<String>` - Rendered text
    fn render(&self, name: &str, template: &str, context: &RenderContext) -> Result<String>;
}

/// Returns true when `text` contains at least one interpolation, control or comment marker.
pub fn has_markers(text: &str) -> bool {
    MARKERS.iter().any(|marker| text.contains(marker))
}

/// Converts `\r\n` and lone `\r` line endings to `\n`.
pub fn normalize_line_endings(text: &str) -> Cow<'_, str> {
    if !text.contains('\r') {
        return Cow::Borrowed(text);
    }
    Cow::Owned(text.replace("\r\n", "\n").replace('\r', "\n"))
}

/// MiniJinja-based template rendering engine.
pub struct MiniJinjaRenderer {
    /// MiniJinja environment instance
    env: Environment<'static>,
}

impl MiniJinjaRenderer {
    /// Creates a renderer with strict undefined handling, no auto-escaping and
    /// trailing newlines preserved.
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_keep_trailing_newline(true);
        env.set_auto_escape_callback(|_| AutoEscape::None);
        Self { env }
    }
}

impl Default for MiniJinjaRenderer {
    fn default() -> Self {
        MiniJinjaRenderer::new()
    }
}

impl TemplateRenderer for MiniJinjaRenderer {
    /// Renders a template string using MiniJinja.
    ///
    /// The source is normalized to `\n` line endings first, so the output never
    /// carries `\r\n` from the template.
    ///
    /// # Errors
    /// * `Error::SubstitutionFailure` on syntax errors and undefined variables
    fn render(&self, name: &str, template: &str, context: &RenderContext) -> Result<String> {
        let source = normalize_line_endings(template);

        self.env.render_named_str(name, &source, context).map_err(|e| {
            let variable = match e.kind() {
                ErrorKind::UndefinedError => find_missing_variable(name, &source, context),
                _ => None,
            };
            let reason = match &variable {
                Some(variable) => format!("undefined variable '{variable}' ({e})"),
                None => e.to_string(),
            };
            debug!("Rendering '{name}' failed: {e:#}");
            Error::SubstitutionFailure { path: name.to_string(), variable, reason }
        })
    }
}

/// Best-effort search for the variable behind an undefined-value error.
///
/// Looks at every variable path the template reads without assigning and returns
/// the first (in sorted order) whose shortest unresolvable prefix is missing
/// from the context, e.g. `owner` or `github.owner`.
fn find_missing_variable(name: &str, source: &str, context: &RenderContext) -> Option<String> {
    let env = Environment::new();
    let template = env.template_from_named_str(name, source).ok()?;

    let mut missing: Vec<String> = template
        .undeclared_variables(true)
        .into_iter()
        .filter(|path| {
            let root = path.split('.').next().unwrap_or_default();
            !BUILTIN_GLOBALS.contains(&root)
        })
        .filter_map(|path| first_unresolved_prefix(&path, context))
        .collect();
    missing.sort();
    missing.dedup();
    missing.into_iter().next()
}

fn first_unresolved_prefix(path: &str, context: &RenderContext) -> Option<String> {
    let mut end = 0;
    for part in path.split('.') {
        end += if end == 0 { part.len() } else { part.len() + 1 };
        let prefix = &path[..end];
        if context.lookup(prefix).is_none() {
            return Some(prefix.to_string());
        }
    }
    None
}
