use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Compiled nested, inner and anonymous classes carry this between the outer and inner name.
pub const SYNTHETIC_MARKER: char = '$';

#[derive(Debug, thiserror::Error)]
pub enum WalkError {
    #[error("failed to read directory '{}'", .path.display())]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

/// Depth-first iterator over the files below a staging root.
///
/// A directory is yielded before its contents, siblings in file name order. Directories
/// themselves are not yielded, and neither are files whose name contains
/// [`SYNTHETIC_MARKER`]. The decompiler reconstructs those from the outer class file.
pub struct SourceFiles {
    inner: walkdir::IntoIter,
}

pub fn walk(root: &Path) -> SourceFiles {
    SourceFiles {
        inner: WalkDir::new(root)
            .min_depth(1)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter(),
    }
}

pub fn is_synthetic(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|name| name.to_string_lossy().contains(SYNTHETIC_MARKER))
}

impl Iterator for SourceFiles {
    type Item = Result<PathBuf, WalkError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.inner.next()? {
                Ok(entry) => entry,
                Err(source) => {
                    let path = source.path().map(Path::to_owned).unwrap_or_default();
                    return Some(Err(WalkError::ReadFailed { path, source }));
                }
            };

            if entry.file_type().is_dir() || is_synthetic(entry.path()) {
                continue;
            }

            return Some(Ok(entry.into_path()));
        }
    }
}
