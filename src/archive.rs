use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Component, Path, PathBuf};

use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("failed to open archive '{}': {source}", .path.display())]
    OpenFailed {
        path: PathBuf,
        source: zip::result::ZipError,
    },

    #[error("failed to read archive entry #{index}: {source}")]
    ReadEntry {
        index: usize,
        source: zip::result::ZipError,
    },

    #[error("illegal file path: entry '{entry}' resolves to '{}'", .resolved.display())]
    PathEscape { entry: String, resolved: PathBuf },

    #[error("failed to extract '{}': {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },
}

/// Unpacks every entry of the zip archive at `archive` into `dest`, creating `dest` if
/// needed. Stops at the first failing entry; whatever was written so far stays on disk.
///
/// Returns the number of entries extracted.
pub fn extract(archive: &Path, dest: &Path) -> Result<usize, ExtractError> {
    let open_failed = |source| ExtractError::OpenFailed {
        path: archive.to_owned(),
        source,
    };

    let file = File::open(archive).map_err(|e| open_failed(e.into()))?;
    let mut zip = zip::ZipArchive::new(file).map_err(open_failed)?;

    create_dir(dest, None)?;

    for index in 0..zip.len() {
        let mut entry = zip
            .by_index(index)
            .map_err(|source| ExtractError::ReadEntry { index, source })?;

        let path = resolve_entry_path(dest, entry.name())?;
        let mode = entry.unix_mode();

        if entry.is_dir() {
            create_dir(&path, mode)?;
            continue;
        }

        if let Some(parent) = path.parent() {
            create_dir(parent, None)?;
        }

        let mut out = create_file(&path, mode).map_err(|source| ExtractError::Io {
            path: path.clone(),
            source,
        })?;

        io::copy(&mut entry, &mut out).map_err(|source| ExtractError::Io {
            path: path.clone(),
            source,
        })?;

        debug!(path = %path.display(), "extracted");
    }

    Ok(zip.len())
}

/// Joins an archive entry name onto `dest`, rejecting names that land outside of it.
///
/// Both `/` and `\` separate components, so the result does not depend on the host.
pub fn resolve_entry_path(dest: &Path, name: &str) -> Result<PathBuf, ExtractError> {
    let root = clean(dest);
    let resolved = clean(&root.join(name.replace('\\', "/")));

    if resolved == root || !resolved.starts_with(&root) {
        return Err(ExtractError::PathEscape {
            entry: name.to_owned(),
            resolved,
        });
    }

    Ok(resolved)
}

/// Lexically normalizes a path: `.` is dropped and `..` removes the previous component.
/// Leading `..` of a relative path is kept, `..` directly below the root is dropped.
fn clean(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();

    for component in path.components() {
        match component {
            Component::ParentDir => match result.components().next_back() {
                Some(Component::Normal(_)) => {
                    result.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => result.push(".."),
            },
            Component::CurDir => {}
            other => result.push(other.as_os_str()),
        }
    }

    result
}

fn create_dir(path: &Path, mode: Option<u32>) -> Result<(), ExtractError> {
    fs::create_dir_all(path)
        .and_then(|()| apply_mode(path, mode, 0o700))
        .map_err(|source| ExtractError::Io {
            path: path.to_owned(),
            source,
        })
}

fn create_file(path: &Path, mode: Option<u32>) -> io::Result<File> {
    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)?;
    apply_mode(path, mode, 0o600)?;
    Ok(file)
}

/// Sets the stored permission bits, ignoring the umask. `owner` bits are always kept so
/// the staging tree can be populated and removed again.
#[cfg(unix)]
fn apply_mode(path: &Path, mode: Option<u32>, owner: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    match mode {
        Some(mode) => fs::set_permissions(path, fs::Permissions::from_mode(mode & 0o7777 | owner)),
        None => Ok(()),
    }
}

#[cfg(not(unix))]
fn apply_mode(_path: &Path, _mode: Option<u32>, _owner: u32) -> io::Result<()> {
    Ok(())
}
