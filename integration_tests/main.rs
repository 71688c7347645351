use std::cell::RefCell;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use color_eyre::eyre::{self, bail, ensure};
use jarsrc::archive::{self, ExtractError};
use jarsrc::config::{ClassNaming, Config, ConfigError};
use jarsrc::pipeline::{self, Summary};
use jarsrc::producer::{Decompile, ProduceError};
use jarsrc::Error;
use jdk_tools::ToolError;
use libtest_mimic::{Arguments, Trial};
use tempfile::TempDir;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

fn main() {
    let args = Arguments::from_args();

    let tests = vec![
        trial("path_escape_is_rejected", path_escape_is_rejected),
        trial("corrupt_archive_fails_to_open", corrupt_archive_fails_to_open),
        trial("missing_archive_is_a_config_error", missing_archive_is_a_config_error),
        trial("source_tree_mirrors_archive", source_tree_mirrors_archive),
        trial("inner_classes_are_not_decompiled", inner_classes_are_not_decompiled),
        trial("resources_are_copied_verbatim", resources_are_copied_verbatim),
        trial("rerun_skips_existing_outputs", rerun_skips_existing_outputs),
        trial("decompiler_failure_stops_the_run", decompiler_failure_stops_the_run),
        trial("fixed_class_name_is_reused", fixed_class_name_is_reused),
        trial("source_entries_use_their_file_stem", source_entries_use_their_file_stem),
        trial("run_removes_staging_directory", run_removes_staging_directory),
    ];

    libtest_mimic::run(&args, tests).exit();
}

fn trial(name: &str, test: fn() -> eyre::Result<()>) -> Trial {
    Trial::test(name, move || test().map_err(|e| format!("{e:?}").into()))
}

/// Stands in for CFR: records every invocation and answers with a one-line "source".
#[derive(Default)]
struct FakeDecompiler {
    calls: RefCell<Vec<(PathBuf, String)>>,
    fail_on: Option<&'static str>,
}

impl FakeDecompiler {
    fn failing_on(class_name: &'static str) -> FakeDecompiler {
        FakeDecompiler {
            fail_on: Some(class_name),
            ..Default::default()
        }
    }

    fn class_names(&self) -> Vec<String> {
        self.calls.borrow().iter().map(|(_, name)| name.clone()).collect()
    }
}

impl Decompile for FakeDecompiler {
    fn decompile(&self, class_file: &Path, class_name: &str) -> Result<Vec<u8>, ToolError> {
        self.calls
            .borrow_mut()
            .push((class_file.to_owned(), class_name.to_owned()));

        if self.fail_on == Some(class_name) {
            return Err(ToolError::Spawn {
                java: PathBuf::from("java"),
                source: io::Error::other("decompiler crashed"),
            });
        }

        let stem = class_file.file_stem().unwrap_or_default().to_string_lossy();
        Ok(format!("// {class_name} from {stem}.class").into_bytes())
    }
}

/// Writes a jar at `path`. Entries ending in `/` become directory markers.
fn write_jar(path: &Path, entries: &[(&str, &str)]) -> eyre::Result<()> {
    let mut zip = ZipWriter::new(File::create(path)?);
    let options = SimpleFileOptions::default();

    for (name, contents) in entries {
        if name.ends_with('/') {
            zip.add_directory(*name, options)?;
        } else {
            zip.start_file(*name, options)?;
            zip.write_all(contents.as_bytes())?;
        }
    }

    zip.finish()?;
    Ok(())
}

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new(entries: &[(&str, &str)]) -> eyre::Result<Workspace> {
        let dir = tempfile::Builder::new().prefix("jarsrc-test-").tempdir()?;
        write_jar(&dir.path().join("app.jar"), entries)?;
        Ok(Workspace { dir })
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn out(&self) -> PathBuf {
        self.path().join("src")
    }

    fn config(&self) -> eyre::Result<Config> {
        Ok(Config::new(self.path().join("app.jar"), self.out())?)
    }

    fn run(&self, config: &Config, decompiler: &FakeDecompiler) -> Result<Summary, Error> {
        let staging = tempfile::Builder::new()
            .prefix("cfr")
            .tempdir_in(self.path())
            .map_err(Error::Staging)?;
        pipeline::run_in(config, decompiler, staging.path())
    }
}

/// Renders every file below `root` as `relative/path: contents`, one per line.
fn render_tree(root: &Path) -> eyre::Result<String> {
    let mut lines = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry.path().strip_prefix(root)?;
        let contents = fs::read_to_string(entry.path())?;
        lines.push(format!(
            "{}: {}",
            relative.to_string_lossy().replace('\\', "/"),
            contents.trim_end()
        ));
    }

    Ok(lines.join("\n"))
}

const MANIFEST: &str = "Manifest-Version: 1.0\nMain-Class: com.acme.App\n";

fn sample_jar() -> Vec<(&'static str, &'static str)> {
    vec![
        ("META-INF/", ""),
        ("META-INF/MANIFEST.MF", MANIFEST),
        ("com/", ""),
        ("com/acme/", ""),
        ("com/acme/App.class", "app bytecode"),
        ("com/acme/App$1.class", "anon bytecode"),
        ("com/acme/util/Strings.class", "strings bytecode"),
        ("com/acme/util/Strings$Builder.class", "builder bytecode"),
        ("com/acme/messages.properties", "greeting=hello"),
        ("Main.class", "main bytecode"),
    ]
}

fn path_escape_is_rejected() -> eyre::Result<()> {
    let workspace = Workspace::new(&[("ok.txt", "fine"), ("../../evil", "pwned")])?;
    let staging = workspace.path().join("a/b/stage");

    let result = archive::extract(&workspace.path().join("app.jar"), &staging);

    match result {
        Err(ExtractError::PathEscape { entry, .. }) => assert_eq!(entry, "../../evil"),
        other => bail!("expected a path escape error, got {other:?}"),
    }
    ensure!(!workspace.path().join("evil").exists(), "escaping entry was written");
    ensure!(!workspace.path().join("a/evil").exists(), "escaping entry was written");
    ensure!(staging.join("ok.txt").is_file(), "entries before the bad one are kept");

    Ok(())
}

fn corrupt_archive_fails_to_open() -> eyre::Result<()> {
    let dir = tempfile::tempdir()?;
    let jar = dir.path().join("broken.jar");
    fs::write(&jar, b"this is not a zip archive")?;

    let result = archive::extract(&jar, &dir.path().join("stage"));

    ensure!(
        matches!(result, Err(ExtractError::OpenFailed { .. })),
        "expected OpenFailed, got {result:?}"
    );
    Ok(())
}

fn missing_archive_is_a_config_error() -> eyre::Result<()> {
    let dir = tempfile::tempdir()?;
    let result = Config::new(dir.path().join("missing.jar"), dir.path().join("src"));
    ensure!(
        matches!(result, Err(ConfigError::ArchiveMissing(_))),
        "expected ArchiveMissing, got {result:?}"
    );

    let result = Config::new(dir.path(), dir.path().join("src"));
    ensure!(
        matches!(result, Err(ConfigError::ArchiveNotFile(_))),
        "expected ArchiveNotFile, got {result:?}"
    );
    Ok(())
}

fn source_tree_mirrors_archive() -> eyre::Result<()> {
    let workspace = Workspace::new(&sample_jar())?;
    let decompiler = FakeDecompiler::default();

    let summary = workspace.run(&workspace.config()?, &decompiler)?;

    assert_eq!(
        summary,
        Summary {
            decompiled: 3,
            copied: 2,
            skipped: 0
        }
    );
    insta::assert_snapshot!(render_tree(&workspace.out())?, @r"
    META-INF/MANIFEST.MF: Manifest-Version: 1.0
    Main-Class: com.acme.App
    Main.java: // Main from Main.class
    com/acme/App.java: // com.acme.App from App.class
    com/acme/messages.properties: greeting=hello
    com/acme/util/Strings.java: // com.acme.util.Strings from Strings.class
    ");

    Ok(())
}

fn inner_classes_are_not_decompiled() -> eyre::Result<()> {
    let workspace = Workspace::new(&[
        ("Outer.class", "outer"),
        ("Outer$Inner.class", "inner"),
    ])?;
    let decompiler = FakeDecompiler::default();

    workspace.run(&workspace.config()?, &decompiler)?;

    assert_eq!(decompiler.class_names(), ["Outer"]);
    ensure!(!workspace.out().join("Outer$Inner.java").exists());
    ensure!(!workspace.out().join("Outer$Inner.class").exists());

    Ok(())
}

fn resources_are_copied_verbatim() -> eyre::Result<()> {
    let workspace = Workspace::new(&[("META-INF/MANIFEST.MF", MANIFEST)])?;
    let decompiler = FakeDecompiler::default();

    workspace.run(&workspace.config()?, &decompiler)?;

    assert_eq!(fs::read(workspace.out().join("META-INF/MANIFEST.MF"))?, MANIFEST.as_bytes());
    ensure!(decompiler.calls.borrow().is_empty(), "resource went through the decompiler");

    Ok(())
}

fn rerun_skips_existing_outputs() -> eyre::Result<()> {
    let workspace = Workspace::new(&sample_jar())?;
    let config = workspace.config()?;

    workspace.run(&config, &FakeDecompiler::default())?;
    let first = render_tree(&workspace.out())?;

    let decompiler = FakeDecompiler::default();
    let summary = workspace.run(&config, &decompiler)?;

    ensure!(decompiler.calls.borrow().is_empty(), "second run invoked the decompiler");
    assert_eq!(summary.skipped, 5);
    assert_eq!(render_tree(&workspace.out())?, first);

    // a deleted output is the only thing the next run redoes
    fs::remove_file(workspace.out().join("com/acme/App.java"))?;
    let decompiler = FakeDecompiler::default();
    let summary = workspace.run(&config, &decompiler)?;

    assert_eq!(decompiler.class_names(), ["com.acme.App"]);
    assert_eq!(summary.decompiled, 1);
    assert_eq!(render_tree(&workspace.out())?, first);

    Ok(())
}

fn decompiler_failure_stops_the_run() -> eyre::Result<()> {
    let workspace = Workspace::new(&[
        ("a/A.class", "a"),
        ("b/B.class", "b"),
        ("c/C.class", "c"),
    ])?;
    let decompiler = FakeDecompiler::failing_on("b.B");

    let result = workspace.run(&workspace.config()?, &decompiler);

    ensure!(
        matches!(
            result,
            Err(Error::Produce(ProduceError::DecompileFailed { .. }))
        ),
        "expected a decompile failure, got {result:?}"
    );
    assert_eq!(decompiler.class_names(), ["a.A", "b.B"]);
    ensure!(workspace.out().join("a/A.java").is_file());
    ensure!(!workspace.out().join("b/B.java").exists());
    ensure!(!workspace.out().join("c").exists());

    Ok(())
}

fn fixed_class_name_is_reused() -> eyre::Result<()> {
    let workspace = Workspace::new(&[("a/A.class", "a"), ("b/B.class", "b")])?;
    let decompiler = FakeDecompiler::default();
    let config = Config {
        class_naming: ClassNaming::Fixed("com.acme.Foo".to_owned()),
        ..workspace.config()?
    };

    workspace.run(&config, &decompiler)?;

    assert_eq!(decompiler.class_names(), ["com.acme.Foo", "com.acme.Foo"]);
    Ok(())
}

fn source_entries_use_their_file_stem() -> eyre::Result<()> {
    let workspace = Workspace::new(&[
        ("com/acme/Foo.class", "foo bytecode"),
        ("com/acme/Bar.java", "class Bar {}"),
    ])?;
    let decompiler = FakeDecompiler::default();

    workspace.run(&workspace.config()?, &decompiler)?;

    assert_eq!(decompiler.class_names(), ["Bar", "com.acme.Foo"]);
    ensure!(
        decompiler.class_names().iter().all(|name| !name.is_empty()),
        "decompiler was handed an empty class name"
    );
    Ok(())
}

fn run_removes_staging_directory() -> eyre::Result<()> {
    let workspace = Workspace::new(&sample_jar())?;
    let decompiler = FakeDecompiler::default();

    pipeline::run(&workspace.config()?, &decompiler)?;

    let calls = decompiler.calls.borrow();
    let Some((class_file, _)) = calls.first() else {
        bail!("decompiler was never invoked");
    };
    ensure!(
        !class_file.exists(),
        "staged class file {} outlived the run",
        class_file.display()
    );
    ensure!(workspace.out().join("Main.java").is_file());

    Ok(())
}
