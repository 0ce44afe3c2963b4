use std::path::PathBuf;

use crate::config::Tier;

/// Source used when resolving a stevedore configuration.
#[derive(Debug, Clone)]
pub enum ConfigSource {
    /// Search for `stevedore.toml` by walking up from the current working directory.
    Discover,
    /// Use an explicit path to the configuration file.
    Explicit(PathBuf),
}

/// Parameters for configuration loading and optional built-in registry fallback.
#[derive(Debug, Clone)]
pub struct ConfigLoadOptions {
    /// Where to source the configuration from.
    pub source: ConfigSource,
    /// Whether the loader may fall back to the built-in service registry when
    /// no configuration file is found.
    pub allow_builtin: bool,
    /// Optional override for the discovery root (defaults to the process CWD).
    pub search_root: Option<PathBuf>,
}

impl ConfigLoadOptions {
    /// Convenience constructor for explicit config usage.
    pub fn explicit(path: PathBuf) -> Self {
        Self {
            source: ConfigSource::Explicit(path),
            allow_builtin: false,
            search_root: None,
        }
    }

    /// Convenience constructor for discovery with optional built-in fallback.
    pub fn discover(allow_builtin: bool) -> Self {
        Self {
            source: ConfigSource::Discover,
            allow_builtin,
            search_root: None,
        }
    }
}

/// Policy applied when an operation wants to take a destructive action
/// (killing a port's occupant, pruning volumes).
///
/// Interactive prompts become data so the orchestrator core stays
/// deterministic and testable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfirmPolicy {
    /// Ask the operator through the injected [`super::prompt::Confirm`] handle.
    #[default]
    AlwaysAsk,
    /// Proceed without asking.
    AutoApprove,
    /// Decline without asking (non-interactive runs).
    AutoDeny,
}

/// Options for the `start` operation.
#[derive(Debug, Clone)]
pub struct StartOptions {
    /// Configuration lookup parameters.
    pub config: ConfigLoadOptions,
    /// Restrict the run to services in this tier.
    pub tier: Option<Tier>,
    /// Policy for port-conflict remediation.
    pub confirm: ConfirmPolicy,
}

impl Default for StartOptions {
    fn default() -> Self {
        Self {
            config: ConfigLoadOptions::discover(true),
            tier: None,
            confirm: ConfirmPolicy::default(),
        }
    }
}

/// Options for the `status` operation.
#[derive(Debug, Clone)]
pub struct StatusOptions {
    /// Configuration lookup parameters.
    pub config: ConfigLoadOptions,
}

impl Default for StatusOptions {
    fn default() -> Self {
        Self {
            config: ConfigLoadOptions::discover(true),
        }
    }
}

/// Options for the `stop` operation. Teardown always covers the full registry;
/// a tier filter would leave shared containers running.
#[derive(Debug, Clone)]
pub struct StopOptions {
    /// Configuration lookup parameters.
    pub config: ConfigLoadOptions,
}

impl Default for StopOptions {
    fn default() -> Self {
        Self {
            config: ConfigLoadOptions::discover(true),
        }
    }
}

/// Options for the `restart` operation: a full teardown followed by a fresh
/// (optionally tier-filtered) start.
#[derive(Debug, Clone)]
pub struct RestartOptions {
    /// Configuration lookup parameters.
    pub config: ConfigLoadOptions,
    /// Restrict the start phase to services in this tier.
    pub tier: Option<Tier>,
    /// Policy for port-conflict remediation during the start phase.
    pub confirm: ConfirmPolicy,
}

impl Default for RestartOptions {
    fn default() -> Self {
        Self {
            config: ConfigLoadOptions::discover(true),
            tier: None,
            confirm: ConfirmPolicy::default(),
        }
    }
}

/// Options for a single troubleshooting action.
#[derive(Debug, Clone)]
pub struct FixOptions {
    /// Configuration lookup parameters.
    pub config: ConfigLoadOptions,
    /// Policy for destructive steps within the action.
    pub confirm: ConfirmPolicy,
}

impl Default for FixOptions {
    fn default() -> Self {
        Self {
            config: ConfigLoadOptions::discover(true),
            confirm: ConfirmPolicy::default(),
        }
    }
}
