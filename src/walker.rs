//! Deterministic enumeration of the files under a template root.

use log::debug;
use std::fmt;
use std::io;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{Error, Result};

/// A file location relative to the template root, always `/`-separated.
///
/// Ordering and equality use the canonical string, so two identical trees
/// enumerate identically on every platform.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RelativeFilePath(String);

impl RelativeFilePath {
    /// Builds the canonical form of `path` relative to `root`.
    ///
    /// Fails when `path` is outside `root` or has a component that is not valid Unicode.
    pub fn from_root(root: &Path, path: &Path) -> Result<Self> {
        let relative = path.strip_prefix(root).map_err(|e| Error::UnreadableSourceFile {
            path: path.display().to_string(),
            source: io::Error::other(e),
        })?;

        let mut parts = Vec::new();
        for component in relative.components() {
            if let Component::Normal(part) = component {
                let part = part.to_str().ok_or_else(|| Error::UnreadableSourceFile {
                    path: relative.to_string_lossy().into_owned(),
                    source: io::Error::new(
                        io::ErrorKind::InvalidData,
                        "file name is not valid Unicode",
                    ),
                })?;
                parts.push(part);
            }
        }
        Ok(Self(parts.join("/")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Joins the relative path onto `base` using the host's separators.
    pub fn to_path(&self, base: &Path) -> PathBuf {
        self.0.split('/').fold(base.to_path_buf(), |path, part| path.join(part))
    }
}

impl fmt::Display for RelativeFilePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RelativeFilePath {
    fn from(value: &str) -> Self {
        Self(value.trim_matches('/').to_string())
    }
}

/// One enumerated template file, possibly carrying the error met while walking to it.
///
/// Walk errors stay attached to their entry so they surface at that entry's turn in
/// canonical order rather than in native directory order.
#[derive(Debug)]
pub struct TemplateEntry {
    pub path: RelativeFilePath,
    error: Option<io::Error>,
}

impl TemplateEntry {
    /// Returns the path, or the deferred walk error as `Error::UnreadableSourceFile`.
    pub fn into_path(self) -> Result<RelativeFilePath> {
        match self.error {
            None => Ok(self.path),
            Some(source) => {
                Err(Error::UnreadableSourceFile { path: self.path.to_string(), source })
            }
        }
    }
}

/// Walks `template_root` and returns every file entry, sorted by canonical relative path.
///
/// Directories are not listed. Symbolic links are followed. A dangling link, a link
/// loop or an unreadable directory becomes an entry holding its error.
pub fn walk_template_root<P: AsRef<Path>>(template_root: P) -> Result<Vec<TemplateEntry>> {
    let template_root = template_root.as_ref();
    let mut entries = Vec::new();

    for entry in WalkDir::new(template_root).min_depth(1).follow_links(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let relative = e
                    .path()
                    .filter(|p| p.starts_with(template_root))
                    .map(|p| RelativeFilePath::from_root(template_root, p));
                let Some(path) = relative.transpose()? else {
                    return Err(Error::UnreadableSourceFile {
                        path: template_root.display().to_string(),
                        source: e.into(),
                    });
                };
                debug!("Deferring walk error for '{path}': {e}");
                entries.push(TemplateEntry { path, error: Some(e.into()) });
                continue;
            }
        };

        if entry.file_type().is_dir() {
            continue;
        }
        let path = RelativeFilePath::from_root(template_root, entry.path())?;
        entries.push(TemplateEntry { path, error: None });
    }

    entries.sort_by(|a, b| a.path.cmp(&b.path));
    debug!("Found {} template files under {}", entries.len(), template_root.display());
    Ok(entries)
}

/// Lists every file under `template_root`, sorted by canonical relative path.
///
/// Fails with the first unreadable entry in that order.
pub fn list_template_files<P: AsRef<Path>>(template_root: P) -> Result<Vec<RelativeFilePath>> {
    walk_template_root(template_root)?
        .into_iter()
        .map(TemplateEntry::into_path)
        .collect()
}
