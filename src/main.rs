use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::{ArgAction, Parser};
use log::LevelFilter;
use versync::config::SyncConfig;
use versync::error::exit_code;
use versync::runner::{DryRunRunner, ProcessRunner};
use versync::styling::{
    ERROR, ERROR_EMOJI, SUCCESS, SUCCESS_BOLD, SUCCESS_EMOJI, eprintln, println,
};
use versync::sync::{Synchronizer, parse_update_flag};
use versync::{SyncError, VersionString};

#[derive(Parser, Debug)]
#[command(name = "versync", version, about, long_about = None)]
struct Cli {
    /// "1" to update every package manifest before the full bump; any other value skips them
    #[arg(value_name = "UPDATE_MANIFESTS")]
    update_manifests: Option<String>,

    /// Version to set, passed verbatim to every tool
    #[arg(value_name = "VERSION")]
    new_version: Option<String>,

    /// Project root (like `git -C`); manifest locations resolve against it
    #[arg(short = 'C', value_name = "PATH", default_value = ".")]
    root: PathBuf,

    /// Config file to use instead of <PATH>/.config/versync.toml
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Manifest directory to update, replacing the configured list (repeatable)
    #[arg(long = "manifest", value_name = "DIR")]
    manifests: Vec<PathBuf>,

    /// Print the commands that would run, without running them
    #[arg(long)]
    dry_run: bool,

    /// Require VERSION to be a valid semantic version
    #[arg(long)]
    strict: bool,

    /// Show more output (-v for info, -vv for debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    // RUST_LOG wins over -v
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(err) = run(cli) {
        match err.downcast_ref::<SyncError>() {
            Some(sync_err) => eprintln!("{sync_err}"),
            None => eprintln!("{ERROR_EMOJI} {ERROR}{err:#}{ERROR:#}"),
        }
        std::process::exit(exit_code(&err).unwrap_or(1));
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let update_manifests = parse_update_flag(cli.update_manifests.as_deref())?;
    let version = match cli.new_version {
        Some(raw) => VersionString::parse(raw)?,
        None => return Err(SyncError::invalid_argument("missing VERSION argument").into()),
    };

    let root = dunce::canonicalize(&cli.root).map_err(|e| {
        SyncError::invalid_argument(format!("project root {}: {e}", cli.root.display()))
    })?;

    let mut config = SyncConfig::load(&root, cli.config.as_deref())
        .context("Failed to load configuration")?;
    if !cli.manifests.is_empty() {
        config.manifests = cli.manifests;
    }
    if cli.strict {
        config.strict_semver = true;
    }

    if cli.dry_run {
        let runner = DryRunRunner::new(std::io::stdout().lock());
        Synchronizer::new(root, config, runner).synchronize(update_manifests, &version)?;
        return Ok(());
    }

    let manifest_count = if update_manifests {
        config.manifests.len()
    } else {
        0
    };
    Synchronizer::new(root, config, ProcessRunner).synchronize(update_manifests, &version)?;

    println!(
        "{SUCCESS_EMOJI} {SUCCESS}Synchronized version {SUCCESS_BOLD}{version}{SUCCESS_BOLD:#}{SUCCESS} ({manifest_count} manifest{} + full bump){SUCCESS:#}",
        if manifest_count == 1 { "" } else { "s" }
    );
    Ok(())
}
