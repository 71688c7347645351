use std::fs;

use clap::Parser;
use color_eyre::eyre::{self, Context};
use jarsrc::cli::{self, Args};
use jarsrc::config::Config;
use jarsrc::pipeline;
use jdk_tools::Cfr;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> eyre::Result<()> {
    color_eyre::install()?;

    let args = Args::parse_from(cli::normalize_args(std::env::args_os()));

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let cfr = Cfr::locate(&args.cfr)?;
    info!("java found in path: {}", cfr.java().display());

    let config = Config::from_args(&args)?;

    let staging = pipeline::staging_dir()?;
    let staging_path = staging.path().to_owned();
    ctrlc::set_handler(move || {
        let _ = fs::remove_dir_all(&staging_path);
        std::process::exit(130);
    })
    .wrap_err("failed to install interrupt handler")?;

    let result = pipeline::run_in(&config, &cfr, staging.path());
    // remove the staging directory before any error is reported
    drop(staging);

    result.wrap_err_with(|| format!("failed to decompile '{}'", config.jar.display()))?;

    Ok(())
}
