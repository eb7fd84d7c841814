//! Writes rendered or copied payloads into the destination tree.

use std::fs::{self, Permissions};
use std::io::{self, Write};
use std::path::Path;

use log::debug;
use tempfile::NamedTempFile;

use crate::error::{Error, Result};
use crate::walker::RelativeFilePath;

/// Writes `content` to `destination_root/relative` with the given permissions.
///
/// Missing parent directories are created. The bytes go to a temporary file in
/// the target directory which receives `permissions` and is then renamed over the
/// final path, so readers never observe a partially written file.
pub fn write_file(
    destination_root: &Path,
    relative: &RelativeFilePath,
    content: &[u8],
    permissions: Permissions,
) -> Result<()> {
    let target = relative.to_path(destination_root);
    let write_error = |source: io::Error| Error::DestinationWriteFailure {
        path: relative.to_string(),
        source,
    };

    let parent = target.parent().ok_or_else(|| {
        write_error(io::Error::new(io::ErrorKind::InvalidInput, "no parent directory"))
    })?;
    fs::create_dir_all(parent).map_err(write_error)?;

    let mut temp = NamedTempFile::new_in(parent).map_err(write_error)?;
    temp.write_all(content).map_err(write_error)?;
    temp.as_file().sync_all().map_err(write_error)?;
    fs::set_permissions(temp.path(), permissions).map_err(write_error)?;

    temp.persist(&target).map_err(|e| write_error(e.error))?;
    debug!("Wrote {} ({} bytes)", target.display(), content.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_creates_parent_directories() {
        let dest = TempDir::new().unwrap();
        let relative = RelativeFilePath::from("a/b/c.txt");
        let source = tempfile::NamedTempFile::new().unwrap();
        let permissions = source.as_file().metadata().unwrap().permissions();

        write_file(dest.path(), &relative, b"hello", permissions).unwrap();

        let written = fs::read(dest.path().join("a").join("b").join("c.txt")).unwrap();
        assert_eq!(written, b"hello");
    }

    #[test]
    fn test_write_replaces_existing_file_and_leaves_no_temporaries() {
        let dest = TempDir::new().unwrap();
        fs::write(dest.path().join("c.txt"), b"old content").unwrap();
        let permissions = fs::metadata(dest.path().join("c.txt")).unwrap().permissions();

        write_file(dest.path(), &RelativeFilePath::from("c.txt"), b"new", permissions).unwrap();

        assert_eq!(fs::read(dest.path().join("c.txt")).unwrap(), b"new");
        let entries = fs::read_dir(dest.path()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_write_applies_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dest = TempDir::new().unwrap();
        let relative = RelativeFilePath::from("run.sh");

        write_file(dest.path(), &relative, b"#!/bin/sh\n", Permissions::from_mode(0o755))
            .unwrap();

        let mode = fs::metadata(dest.path().join("run.sh")).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }

    #[test]
    fn test_parent_that_is_a_file_fails() {
        let dest = TempDir::new().unwrap();
        fs::write(dest.path().join("a"), b"file").unwrap();
        let permissions = fs::metadata(dest.path().join("a")).unwrap().permissions();

        let result = write_file(dest.path(), &RelativeFilePath::from("a/b.txt"), b"x", permissions);
        match result {
            Err(Error::DestinationWriteFailure { path, .. }) => assert_eq!(path, "a/b.txt"),
            other => panic!("Expected DestinationWriteFailure, got {other:?}"),
        }
    }
}
