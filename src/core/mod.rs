//! Core stevedore library API surface.

pub mod diagnostics;
pub mod events;
pub mod options;
pub mod outcome;
pub mod reporter;

pub mod network;
pub mod operations;
pub mod ports;
pub mod project;
pub mod prompt;
pub mod readiness;
pub mod registry;
pub mod runtime;
pub mod status;

pub use diagnostics::{Diagnostic, Severity};
pub use events::Event;
pub use network::NetworkProvision;
pub use operations::advisor::{FixAction, fix};
pub use operations::{Environment, restart, start, status, stop};
pub use options::{
    ConfigLoadOptions, ConfigSource, ConfirmPolicy, FixOptions, RestartOptions, StartOptions,
    StatusOptions, StopOptions,
};
pub use outcome::{
    FixOutcome, FixStepReport, OperationOutput, OperationResult, RestartOutcome,
    ServiceErrorKind, ServiceHealthRow, ServiceRunResult, ServiceStopResult, StartOutcome,
    StatusOutcome, StopOutcome,
};
pub use prompt::{Confirm, TerminalConfirm};
pub use reporter::Reporter;
