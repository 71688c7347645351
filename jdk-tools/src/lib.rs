use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("no java executable found on PATH, please install java")]
    JavaNotFound(#[source] which::Error),

    #[error("decompiler jar '{}' not found", .0.display())]
    DecompilerMissing(PathBuf),

    #[error("failed to start '{}': {source}", .java.display())]
    Spawn { java: PathBuf, source: io::Error },

    #[error("decompiler exited with {status} for '{}': {stderr}", .class_file.display())]
    Exit {
        class_file: PathBuf,
        status: ExitStatus,
        stderr: String,
    },
}

/// A CFR decompiler jar paired with the `java` executable used to run it.
#[derive(Clone, Debug)]
pub struct Cfr {
    java: PathBuf,
    jar: PathBuf,
}

impl Cfr {
    /// Checks that `jar` exists and resolves `java` from the search path.
    pub fn locate(jar: impl Into<PathBuf>) -> Result<Cfr, ToolError> {
        let jar = jar.into();
        if !jar.is_file() {
            return Err(ToolError::DecompilerMissing(jar));
        }

        let java = which::which("java").map_err(ToolError::JavaNotFound)?;

        Ok(Cfr { java, jar })
    }

    pub fn new(java: impl Into<PathBuf>, jar: impl Into<PathBuf>) -> Cfr {
        Cfr {
            java: java.into(),
            jar: jar.into(),
        }
    }

    pub fn java(&self) -> &Path {
        &self.java
    }

    pub fn jar(&self) -> &Path {
        &self.jar
    }

    /// Runs `java -jar <cfr> <class_file> <class_name>` and returns everything the
    /// decompiler wrote to stdout. Blocks until the process exits.
    pub fn decompile(&self, class_file: &Path, class_name: &str) -> Result<Vec<u8>, ToolError> {
        debug!(class_file = %class_file.display(), class_name, "invoking decompiler");

        let output = Command::new(&self.java)
            .arg("-jar")
            .arg(&self.jar)
            .arg(class_file)
            .arg(class_name)
            .output()
            .map_err(|source| ToolError::Spawn {
                java: self.java.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(ToolError::Exit {
                class_file: class_file.to_owned(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            });
        }

        Ok(output.stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locate_requires_decompiler_jar() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("cfr.jar");

        let err = Cfr::locate(&missing).unwrap_err();
        assert!(matches!(err, ToolError::DecompilerMissing(path) if path == missing));
    }

    #[test]
    fn spawn_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let cfr = Cfr::new(dir.path().join("no-such-java"), dir.path().join("cfr.jar"));

        let err = cfr
            .decompile(&dir.path().join("Foo.class"), "Foo")
            .unwrap_err();
        assert!(matches!(err, ToolError::Spawn { .. }));
    }

    // A single test spawns the stub so no other thread forks while it is open for writing.
    #[cfg(unix)]
    #[test]
    fn decompile_runs_stub_java() {
        use std::fs;
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let java = dir.path().join("java");
        fs::write(
            &java,
            "#!/bin/sh\n\
             if [ \"$4\" = \"com.acme.Broken\" ]; then echo 'bad class' >&2; exit 3; fi\n\
             printf '%s|%s|%s' \"$1\" \"$3\" \"$4\"\n",
        )
        .unwrap();
        fs::set_permissions(&java, fs::Permissions::from_mode(0o755)).unwrap();

        let jar = dir.path().join("cfr.jar");
        let class_file = dir.path().join("Foo.class");
        let cfr = Cfr::new(&java, &jar);

        let stdout = cfr.decompile(&class_file, "com.acme.Foo").unwrap();
        assert_eq!(
            String::from_utf8(stdout).unwrap(),
            format!("-jar|{}|com.acme.Foo", class_file.display())
        );

        let err = cfr.decompile(&class_file, "com.acme.Broken").unwrap_err();
        match err {
            ToolError::Exit { status, stderr, .. } => {
                assert_eq!(status.code(), Some(3));
                assert_eq!(stderr, "bad class");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
