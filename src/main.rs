mod config;
mod error;
mod install;
mod output;
mod perfgroup;
mod which;

use clap::Parser;
use config::{Config, LogConfig};
use error::{Error, Result};
use install::Install;
use std::ffi::OsStr;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Convert a LIKWID performance group into the event and metric JSON
/// used by the LIKWID collector configuration.
#[derive(Parser, Debug)]
#[command(
    name = "perfgroup2cc",
    about,
    disable_help_flag = true,
    disable_version_flag = true
)]
pub struct Cli {
    /// LIKWID architecture name (e.g. skylake, zen3)
    #[arg(value_name = "LIKWID_ARCH", allow_hyphen_values = true)]
    arch: String,

    /// Performance group name without extension (e.g. FLOPS_DP)
    #[arg(value_name = "GROUP_NAME", allow_hyphen_values = true)]
    group: String,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(_) => {
            println!("{}", Error::Usage);
            return ExitCode::FAILURE;
        }
    };

    let cwd = std::env::current_dir().unwrap_or_default();
    let (cfg, cfg_warning) = config::load_config(&cwd);
    init_logging(&cfg.log);
    if let Some(warning) = cfg_warning {
        tracing::warn!("{warning}");
    }
    tracing::debug!(?cli, "parsed CLI arguments");

    match convert(&cli, &which::search_path(), &cfg) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            println!("{e}");
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr; stdout carries only the JSON document or the fatal message.
fn init_logging(log: &LogConfig) {
    let (filter, invalid) = match EnvFilter::try_new(&log.level) {
        Ok(filter) => (filter, false),
        Err(_) => (EnvFilter::new("warn"), true),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .init();
    if invalid {
        tracing::warn!(level = %log.level, "invalid log level, using warn");
    }
}

/// Locate the group file for `cli` and render it as JSON.
fn convert<S: AsRef<OsStr> + ?Sized>(cli: &Cli, search_path: &S, cfg: &Config) -> Result<String> {
    let install = Install::locate(search_path, &cfg.toolkit)?;
    tracing::debug!(root = %install.groups_root().display(), "using performance group root");
    let path = install.resolve_group(&cli.arch, &cli.group)?;
    let doc = perfgroup::parse_file(&path)?;
    tracing::debug!(
        events = doc.events.len(),
        metrics = doc.metrics.len(),
        "parsed performance group"
    );
    Ok(doc.to_json()?)
}
