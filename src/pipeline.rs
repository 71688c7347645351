use std::fs;
use std::path::Path;

use tempfile::TempDir;
use tracing::{debug, info, warn};

use crate::class_name::SOURCE_EXTENSION;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::mapper::{self, MapError};
use crate::producer::{self, Decompile, Produced};
use crate::{archive, walker};

/// What a run did with the files it visited.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Summary {
    pub decompiled: usize,
    pub copied: usize,
    pub skipped: usize,
}

impl Summary {
    fn record(&mut self, produced: Produced) {
        match produced {
            Produced::Decompiled => self.decompiled += 1,
            Produced::Copied => self.copied += 1,
            Produced::Skipped => self.skipped += 1,
        }
    }
}

/// Creates the staging directory for a run. It is removed when the guard is dropped.
pub fn staging_dir() -> Result<TempDir> {
    tempfile::Builder::new()
        .prefix("cfr")
        .tempdir()
        .map_err(Error::Staging)
}

/// Extracts the jar into a fresh staging directory and produces the source tree from it.
pub fn run<D: Decompile>(config: &Config, decompiler: &D) -> Result<Summary> {
    let staging = staging_dir()?;
    let summary = run_in(config, decompiler, staging.path())?;

    if let Err(e) = staging.close() {
        debug!("unable to remove staging directory: {e}");
    }

    Ok(summary)
}

/// Same as [`run`], with the caller owning the staging directory.
///
/// Stops at the first error. Outputs written up to that point are kept.
pub fn run_in<D: Decompile>(config: &Config, decompiler: &D, staging: &Path) -> Result<Summary> {
    let entries = archive::extract(&config.jar, staging)?;
    info!("unzipped {} entries to {}", entries, staging.display());

    if !config.out.is_dir() {
        fs::create_dir_all(&config.out).map_err(|source| MapError::MkdirFailed {
            path: config.out.clone(),
            source,
        })?;
    }
    info!("output directory: {}", config.out.display());
    info!("extracting classes...");

    let mut summary = Summary::default();

    for file in walker::walk(staging) {
        let file = file?;
        let out = mapper::map_output_path(&file, staging, &config.out)?;

        let relative = file.strip_prefix(staging).unwrap_or(&file);
        let class_name = match config.class_naming.class_name(relative) {
            Some(name) => name,
            None => fallback_class_name(&file, &out),
        };

        summary.record(producer::produce(decompiler, &file, &class_name, &out)?);
    }

    info!(
        decompiled = summary.decompiled,
        copied = summary.copied,
        skipped = summary.skipped,
        "done"
    );

    Ok(summary)
}

/// Name for a file that has no class name of its own. Only matters when its output is a
/// source file, e.g. a `.java` file shipped inside a sources jar.
fn fallback_class_name(file: &Path, out: &Path) -> String {
    let stem = file
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();

    if out.extension().is_some_and(|ext| ext == SOURCE_EXTENSION) {
        warn!(
            "'{}' is not a class file, decompiling it as '{stem}'",
            file.display()
        );
    }

    stem
}
