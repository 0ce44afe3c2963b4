use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to read configuration file at {path}: {source}")]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Configuration at {path} could not be parsed: {source}")]
    ParseConfig {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Configuration validation failed for {path}:\n{message}")]
    InvalidConfig { path: PathBuf, message: String },
    #[error("The configuration path {path} does not exist or is not readable.")]
    ExplicitConfigMissing { path: PathBuf },
    #[error(
        "No stevedore configuration found while searching upward from {search_root}, \
         and the built-in registry was disabled. Provide a path with --config."
    )]
    ConfigDiscoveryFailed { search_root: PathBuf },
    #[error("Failed to determine the current working directory: {source}")]
    WorkingDirectoryUnavailable {
        #[source]
        source: std::io::Error,
    },
    #[error("`{command} --skip-discovery` requires an explicit --config <PATH>.")]
    SkipDiscoveryRequiresConfig { command: &'static str },
    #[error(
        "The container runtime is unreachable: {detail}\n\
         Start the container runtime (Docker Desktop or the docker daemon) and retry."
    )]
    RuntimeUnreachable { detail: String },
    #[error(
        "Failed to provision the shared network `{network}`: {detail}\n\
         Services depend on this network to reach each other; aborting the run."
    )]
    NetworkProvisionFailed { network: String, detail: String },
    #[error(
        "{} of {total} service(s) did not reach ready: {}.\n\
         Check `stevedore status`, inspect container logs, or run `stevedore fix`.",
        .failed.len(),
        .failed.join(", ")
    )]
    StartIncomplete { failed: Vec<String>, total: usize },
    #[error("Failed to read interactive input: {source}")]
    PromptFailed {
        #[source]
        source: std::io::Error,
    },
}
