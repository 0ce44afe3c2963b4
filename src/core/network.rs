use crate::error::{Error, Result};

use super::runtime::ContainerRuntime;

/// Whether `ensure_network` had to create the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkProvision {
    Created,
    AlreadyExists,
}

impl NetworkProvision {
    /// Human-friendly label for rendering.
    pub fn describe(self) -> &'static str {
        match self {
            NetworkProvision::Created => "created",
            NetworkProvision::AlreadyExists => "already exists",
        }
    }
}

/// Ensure the shared service network exists, creating it if absent.
///
/// Idempotent: pre-existence is a success, not an error. Any other failure is
/// fatal for the whole run; services that expect to reach each other over
/// this network would silently fail to communicate.
pub fn ensure_network(runtime: &dyn ContainerRuntime, name: &str) -> Result<NetworkProvision> {
    let exists = runtime
        .network_exists(name)
        .map_err(|failure| Error::NetworkProvisionFailed {
            network: name.to_string(),
            detail: failure.to_string(),
        })?;

    if exists {
        return Ok(NetworkProvision::AlreadyExists);
    }

    runtime
        .create_network(name)
        .map_err(|failure| Error::NetworkProvisionFailed {
            network: name.to_string(),
            detail: failure.to_string(),
        })?;

    Ok(NetworkProvision::Created)
}
