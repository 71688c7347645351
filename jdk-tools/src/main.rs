use std::io::Write;
use std::path::Path;

use clap::Parser;
use color_eyre::eyre::{self, eyre, Context, ContextCompat};
use jdk_tools::Cfr;

/// Decompile a single class file with CFR.
#[derive(Parser)]
struct Args {
    class_file: String,
    /// Fully-qualified name passed to the decompiler, defaults to the file stem.
    class: Option<String>,
    #[clap(short, long)]
    out: Option<String>,
    #[clap(long, default_value = "cfr.jar")]
    cfr: String,
}

fn main() -> eyre::Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    let class_file = Path::new(&args.class_file);

    let stem = class_file
        .file_stem()
        .and_then(|stem| stem.to_str())
        .wrap_err("could not determine a class name, please specify one")?;

    let class_name = args.class.as_deref().unwrap_or(stem);
    let out_path = args.out.unwrap_or_else(|| format!("{stem}.java"));

    let cfr = Cfr::locate(&args.cfr)?;
    let source = cfr
        .decompile(class_file, class_name)
        .wrap_err_with(|| eyre!("failed to decompile '{}'", args.class_file))?;

    if out_path == "-" {
        std::io::stdout().write_all(&source)?;
    } else {
        std::fs::write(out_path, &source)?;
    }

    Ok(())
}
