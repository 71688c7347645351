use std::path::{Path, PathBuf};

use tracing::warn;

use crate::cli::Args;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("jar file '{}' does not exist", .0.display())]
    ArchiveMissing(PathBuf),

    #[error("jar file '{}' is not a regular file", .0.display())]
    ArchiveNotFile(PathBuf),

    #[error("--reuse-class-name needs a CLASS argument")]
    ReuseWithoutClass,
}

/// Which class name the decompiler is told about for each class file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClassNaming {
    /// Named after the class file's own path, `com/acme/Foo.class` is `com.acme.Foo`.
    PerFile,
    /// The same name for every class file.
    Fixed(String),
}

impl ClassNaming {
    pub fn class_name(&self, relative: &Path) -> Option<String> {
        match self {
            ClassNaming::PerFile => crate::class_name::derive(relative),
            ClassNaming::Fixed(name) => Some(name.clone()),
        }
    }
}

/// Settings for one run, fixed once the command line has been read.
#[derive(Clone, Debug)]
pub struct Config {
    pub jar: PathBuf,
    pub out: PathBuf,
    pub class_naming: ClassNaming,
}

impl Config {
    pub fn new(jar: impl Into<PathBuf>, out: impl Into<PathBuf>) -> Result<Config, ConfigError> {
        let jar = jar.into();

        if !jar.exists() {
            return Err(ConfigError::ArchiveMissing(jar));
        }
        if !jar.is_file() {
            return Err(ConfigError::ArchiveNotFile(jar));
        }

        Ok(Config {
            jar,
            out: out.into(),
            class_naming: ClassNaming::PerFile,
        })
    }

    pub fn from_args(args: &Args) -> Result<Config, ConfigError> {
        let class_naming = match (&args.class, args.reuse_class_name) {
            (Some(class), true) => ClassNaming::Fixed(class.clone()),
            (None, true) => return Err(ConfigError::ReuseWithoutClass),
            (Some(class), false) => {
                warn!("ignoring class name '{class}', each class file is decompiled under its own name (see --reuse-class-name)");
                ClassNaming::PerFile
            }
            (None, false) => ClassNaming::PerFile,
        };

        Ok(Config {
            class_naming,
            ..Config::new(&args.jar, &args.out)?
        })
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    fn args(extra: &[&str], jar: &Path) -> Args {
        let mut argv = vec!["jarsrc".to_owned(), "--jar".to_owned(), jar.display().to_string()];
        argv.extend(extra.iter().map(|s| s.to_string()));
        Args::parse_from(argv)
    }

    #[test]
    fn class_names_are_per_file_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let jar = dir.path().join("app.jar");
        std::fs::write(&jar, "").unwrap();

        let config = Config::from_args(&args(&["com.acme.Foo"], &jar)).unwrap();
        assert_eq!(config.class_naming, ClassNaming::PerFile);
        assert_eq!(
            config.class_naming.class_name(Path::new("com/acme/Bar.class")).as_deref(),
            Some("com.acme.Bar")
        );
    }

    #[test]
    fn reuse_class_name_fixes_the_name() {
        let dir = tempfile::tempdir().unwrap();
        let jar = dir.path().join("app.jar");
        std::fs::write(&jar, "").unwrap();

        let config =
            Config::from_args(&args(&["com.acme.Foo", "--reuse-class-name"], &jar)).unwrap();
        assert_eq!(
            config.class_naming.class_name(Path::new("com/acme/Bar.class")).as_deref(),
            Some("com.acme.Foo")
        );
    }
}
