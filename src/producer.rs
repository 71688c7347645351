use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use jdk_tools::{Cfr, ToolError};
use tracing::debug;

use crate::class_name::SOURCE_EXTENSION;

/// The external tool turning one compiled class into source text.
pub trait Decompile {
    fn decompile(&self, class_file: &Path, class_name: &str) -> Result<Vec<u8>, ToolError>;
}

impl Decompile for Cfr {
    fn decompile(&self, class_file: &Path, class_name: &str) -> Result<Vec<u8>, ToolError> {
        Cfr::decompile(self, class_file, class_name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProduceError {
    #[error("unable to decompile '{}'", .class_file.display())]
    DecompileFailed {
        class_file: PathBuf,
        #[source]
        source: ToolError,
    },

    #[error("unable to write output to '{}': {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("unable to copy '{}' to '{}': {source}", .from.display(), .to.display())]
    Copy {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Produced {
    /// The output already existed and was left alone.
    Skipped,
    Decompiled,
    Copied,
}

/// Writes the artifact for one staged file. `.java` outputs are produced by the
/// decompiler, everything else is a byte-for-byte copy. Existing outputs are never
/// overwritten, so a rerun only fills in what is missing.
pub fn produce<D: Decompile>(
    decompiler: &D,
    file: &Path,
    class_name: &str,
    out: &Path,
) -> Result<Produced, ProduceError> {
    if out.exists() {
        debug!(out = %out.display(), "output exists, skipping");
        return Ok(Produced::Skipped);
    }

    if out.extension().is_some_and(|ext| ext == SOURCE_EXTENSION) {
        let source = decompiler
            .decompile(file, class_name)
            .map_err(|source| ProduceError::DecompileFailed {
                class_file: file.to_owned(),
                source,
            })?;

        fs::write(out, source).map_err(|source| ProduceError::Write {
            path: out.to_owned(),
            source,
        })?;

        debug!(class_name, out = %out.display(), "decompiled");
        Ok(Produced::Decompiled)
    } else {
        copy_file(file, out).map_err(|source| ProduceError::Copy {
            from: file.to_owned(),
            to: out.to_owned(),
            source,
        })?;

        debug!(out = %out.display(), "copied");
        Ok(Produced::Copied)
    }
}

fn copy_file(from: &Path, to: &Path) -> io::Result<u64> {
    let mut input = File::open(from)?;
    let mut output = File::create(to)?;
    io::copy(&mut input, &mut output)
}
