use std::ffi::OsString;
use std::path::PathBuf;

/// Decompile every class of a jar into a source tree.
#[derive(clap::Parser, Debug)]
#[command(version)]
pub struct Args {
    /// Class name handed to the decompiler when --reuse-class-name is set.
    pub class: Option<String>,
    /// Path to the jar file to pull classes from.
    #[arg(long)]
    pub jar: PathBuf,
    /// Path to the output directory.
    #[arg(long, default_value = "src")]
    pub out: PathBuf,
    /// Path to the CFR decompiler jar.
    #[arg(long, default_value = "cfr.jar")]
    pub cfr: PathBuf,
    /// Pass CLASS to the decompiler for every class file instead of each file's own name.
    #[arg(long, requires = "class")]
    pub reuse_class_name: bool,
    #[arg(short, long)]
    pub verbose: bool,
}

const LEGACY_FLAGS: [&str; 3] = ["jar", "out", "cfr"];

/// Rewrites the single-dash long flags the tool has always accepted (`-jar x.jar`,
/// `-out=dir`) into the `--` form clap understands. Everything after `--` is left alone.
pub fn normalize_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut seen_terminator = false;

    args.into_iter()
        .map(Into::into)
        .map(|arg| {
            if seen_terminator {
                return arg;
            }
            if arg == "--" {
                seen_terminator = true;
                return arg;
            }

            let Some(flag) = arg.to_str().and_then(|s| s.strip_prefix('-')) else {
                return arg;
            };
            let name = flag.split_once('=').map_or(flag, |(name, _)| name);

            if LEGACY_FLAGS.contains(&name) {
                OsString::from(format!("--{flag}"))
            } else {
                arg
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    fn parse(args: &[&str]) -> Result<Args, clap::Error> {
        Args::try_parse_from(normalize_args(args.iter().copied()))
    }

    #[test]
    fn single_dash_flags_are_rewritten() {
        let args = normalize_args(["jarsrc", "-jar", "app.jar", "-out=build/src", "-v"]);
        assert_eq!(args, ["jarsrc", "--jar", "app.jar", "--out=build/src", "-v"]);
    }

    #[test]
    fn arguments_after_terminator_are_untouched() {
        let args = normalize_args(["jarsrc", "--jar", "a.jar", "--", "-out"]);
        assert_eq!(args, ["jarsrc", "--jar", "a.jar", "--", "-out"]);
    }

    #[test]
    fn legacy_command_line() {
        let args = parse(&["jarsrc", "com.acme.Foo", "-jar", "app.jar"]).unwrap();
        assert_eq!(args.class.as_deref(), Some("com.acme.Foo"));
        assert_eq!(args.jar, PathBuf::from("app.jar"));
        assert_eq!(args.out, PathBuf::from("src"));
        assert_eq!(args.cfr, PathBuf::from("cfr.jar"));
        assert!(!args.reuse_class_name);
    }

    #[test]
    fn legacy_flags_with_values() {
        let args = parse(&["jarsrc", "-jar=app.jar", "-out", "build/src", "-cfr", "tools/cfr.jar"]).unwrap();
        assert_eq!(args.jar, PathBuf::from("app.jar"));
        assert_eq!(args.out, PathBuf::from("build/src"));
        assert_eq!(args.cfr, PathBuf::from("tools/cfr.jar"));
    }

    #[test]
    fn jar_is_required() {
        assert!(parse(&["jarsrc", "-out", "dir"]).is_err());
    }

    #[test]
    fn reuse_class_name_requires_class() {
        assert!(parse(&["jarsrc", "--jar", "a.jar", "--reuse-class-name"]).is_err());
        assert!(parse(&["jarsrc", "Foo", "--jar", "a.jar", "--reuse-class-name"]).is_ok());
    }
}
