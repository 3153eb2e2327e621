use serde::Deserialize;
use std::path::{Path, PathBuf};

/// File looked up in the working directory.
pub const CONFIG_FILE: &str = "perfgroup2cc.toml";

/// Top-level configuration loaded from perfgroup2cc.toml.
#[derive(Debug, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub toolkit: ToolkitConfig,
    pub log: LogConfig,
}

/// Where the LIKWID installation and its group files are found.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ToolkitConfig {
    /// Binary searched on PATH to locate the installation.
    pub topology_command: String,
    /// Group root, relative to the directory holding `topology_command`.
    pub groups_subdir: PathBuf,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct LogConfig {
    /// `tracing` filter directive, e.g. `warn` or `perfgroup2cc=debug`.
    pub level: String,
}

impl Default for ToolkitConfig {
    fn default() -> Self {
        Self {
            topology_command: "likwid-topology".to_string(),
            groups_subdir: PathBuf::from("../share/likwid/perfgroups"),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

/// Load config from perfgroup2cc.toml in the given directory, or default.
///
/// Runs before logging is set up, so parse failures are returned alongside
/// the defaults for the caller to report.
pub fn load_config(dir: &Path) -> (Config, Option<String>) {
    let path = dir.join(CONFIG_FILE);
    match std::fs::read_to_string(&path) {
        Ok(contents) => match toml::from_str(&contents) {
            Ok(cfg) => (cfg, None),
            Err(e) => (
                Config::default(),
                Some(format!("failed to parse {}: {e}", path.display())),
            ),
        },
        Err(_) => (Config::default(), None),
    }
}
