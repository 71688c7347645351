use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::class_name::{CLASS_EXTENSION, SOURCE_EXTENSION};

#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("'{}' is not inside the staging directory '{}'", .file.display(), .staging.display())]
    OutsideStaging { file: PathBuf, staging: PathBuf },

    #[error("unable to create output directory '{}': {source}", .path.display())]
    MkdirFailed { path: PathBuf, source: io::Error },
}

/// Computes where a staged file ends up: the staging prefix is swapped for `output_root`
/// and a `.class` file becomes a `.java` file. Touches nothing on disk.
pub fn output_path(file: &Path, staging_root: &Path, output_root: &Path) -> Result<PathBuf, MapError> {
    let relative = file
        .strip_prefix(staging_root)
        .map_err(|_| MapError::OutsideStaging {
            file: file.to_owned(),
            staging: staging_root.to_owned(),
        })?;

    let mut out = output_root.join(relative);
    if out.extension().is_some_and(|ext| ext == CLASS_EXTENSION) {
        out.set_extension(SOURCE_EXTENSION);
    }

    Ok(out)
}

/// Like [`output_path`], and also creates the directory that will contain the output.
pub fn map_output_path(
    file: &Path,
    staging_root: &Path,
    output_root: &Path,
) -> Result<PathBuf, MapError> {
    let out = output_path(file, staging_root, output_root)?;

    if let Some(dir) = out.parent().filter(|dir| !dir.is_dir()) {
        debug!(dir = %dir.display(), "creating output directory");
        fs::create_dir_all(dir).map_err(|source| MapError::MkdirFailed {
            path: dir.to_owned(),
            source,
        })?;
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_files_become_java_sources() {
        let out = output_path(
            Path::new("/tmp/x/com/acme/Foo.class"),
            Path::new("/tmp/x"),
            Path::new("./src"),
        )
        .unwrap();
        assert_eq!(out, Path::new("./src/com/acme/Foo.java"));
    }

    #[test]
    fn resources_keep_their_name() {
        let out = output_path(
            Path::new("/tmp/x/META-INF/MANIFEST.MF"),
            Path::new("/tmp/x"),
            Path::new("./src"),
        )
        .unwrap();
        assert_eq!(out, Path::new("./src/META-INF/MANIFEST.MF"));
    }

    #[test]
    fn only_trailing_extension_is_rewritten() {
        let out = output_path(
            Path::new("/tmp/x/docs/notes.class.txt"),
            Path::new("/tmp/x"),
            Path::new("src"),
        )
        .unwrap();
        assert_eq!(out, Path::new("src/docs/notes.class.txt"));
    }

    #[test]
    fn files_outside_staging_are_rejected() {
        let err = output_path(
            Path::new("/tmp/y/Foo.class"),
            Path::new("/tmp/x"),
            Path::new("src"),
        )
        .unwrap_err();
        assert!(matches!(err, MapError::OutsideStaging { .. }));
    }

    #[test]
    fn creates_missing_parent_directories() {
        let staging = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        let file = staging.path().join("com/acme/Foo.class");

        let out = map_output_path(&file, staging.path(), output.path()).unwrap();

        assert_eq!(out, output.path().join("com/acme/Foo.java"));
        assert!(output.path().join("com/acme").is_dir());
        assert!(!out.exists());
    }

    #[test]
    fn mkdir_failure_is_reported() {
        let staging = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        fs::write(output.path().join("com"), "not a directory").unwrap();

        let file = staging.path().join("com/acme/Foo.class");
        let err = map_output_path(&file, staging.path(), output.path()).unwrap_err();
        assert!(matches!(err, MapError::MkdirFailed { .. }));
    }
}
