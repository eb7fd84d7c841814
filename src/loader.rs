//! Template lookup.
//! Resolves a template name to its root directory inside the templates directory.
use crate::error::{Error, Result};
use log::debug;
use std::path::{Component, Path, PathBuf};

/// Trait for loading templates from different sources.
pub trait TemplateLoader {
    /// Returns the template root directory.
    fn load(&self) -> Result<PathBuf>;
}

/// Loader for templates from the local filesystem.
pub struct LocalLoader<P: AsRef<Path>> {
    path: P,
}

impl<P: AsRef<Path>> LocalLoader<P> {
    /// Creates a new LocalLoader instance.
    pub fn new(path: P) -> Self {
        Self { path }
    }
}

impl<P: AsRef<Path>> TemplateLoader for LocalLoader<P> {
    /// Loads a template from the local filesystem.
    ///
    /// # Errors
    /// * `Error::InvalidTemplateRoot` if the path does not exist or is not a directory
    fn load(&self) -> Result<PathBuf> {
        let path = self.path.as_ref();
        if !path.is_dir() {
            return Err(Error::InvalidTemplateRoot { template_dir: path.display().to_string() });
        }

        Ok(path.to_path_buf())
    }
}

/// Returns the root of template `name` inside `templates_dir`.
///
/// # Errors
/// * `Error::ConfigError` if `name` is not a plain directory name
/// * `Error::InvalidTemplateRoot` if the template directory does not exist
pub fn load_template<P: AsRef<Path>>(templates_dir: P, name: &str) -> Result<PathBuf> {
    let mut components = Path::new(name).components();
    let is_plain_name =
        matches!(components.next(), Some(Component::Normal(_))) && components.next().is_none();
    if !is_plain_name {
        return Err(Error::ConfigError(format!("invalid template name: '{name}'")));
    }

    let template_dir = templates_dir.as_ref().join(name);
    debug!("Using template from '{}'", template_dir.display());
    LocalLoader::new(template_dir).load()
}
