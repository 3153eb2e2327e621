use std::path::PathBuf;

/// Fatal conditions. `main` prints the message to stdout and exits with status 1.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Usage: perfgroup2cc <likwid-arch> <group-name>")]
    Usage,
    #[error("Cannot find LIKWID installation. Please add LIKWID bin folder to your PATH.")]
    InstallationNotFound,
    #[error("Cannot find LIKWID performance groups in default install location")]
    GroupsNotFound,
    #[error("Cannot find LIKWID performance groups for architecture {arch}")]
    ArchNotFound { arch: String },
    #[error("Cannot find LIKWID performance group {group} for architecture {arch}")]
    GroupNotFound { arch: String, group: String },
    #[error("Cannot read LIKWID performance group file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Cannot serialize performance group: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
