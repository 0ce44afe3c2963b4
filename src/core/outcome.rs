use std::time::{Duration, SystemTime};

use crate::config::Tier;

use super::diagnostics::Diagnostic;
use super::events::Event;
use super::network::NetworkProvision;

/// Result wrapper returned by high-level operations.
pub type OperationResult<T> = crate::error::Result<OperationOutput<T>>;

/// Envelope for successful operation outcomes.
#[derive(Debug)]
pub struct OperationOutput<T> {
    /// Primary value produced by the operation.
    pub value: T,
    /// Diagnostics collected while performing the operation.
    pub diagnostics: Vec<Diagnostic>,
    /// Structured events captured during the run.
    pub events: Vec<Event>,
}

impl<T> OperationOutput<T> {
    /// Create a new operation output.
    pub fn new(value: T) -> Self {
        Self {
            value,
            diagnostics: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Attach diagnostics to the output.
    pub fn with_diagnostics(mut self, diagnostics: Vec<Diagnostic>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Attach events to the output.
    pub fn with_events(mut self, events: Vec<Event>) -> Self {
        self.events = events;
        self
    }
}

/// Per-service fault classification. Faults in this family never abort the
/// run; they are recorded here and surfaced in the summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceErrorKind {
    /// A foreign process holds the readiness port and remediation was
    /// declined or unsuccessful.
    PortConflict,
    /// The launch unit invocation failed.
    LaunchFailure,
    /// The readiness window elapsed without an accepted response.
    ReadinessTimeout,
    /// Teardown of the launch unit or an extra container failed.
    TeardownFailure,
}

impl ServiceErrorKind {
    /// Human-friendly label for rendering.
    pub fn describe(self) -> &'static str {
        match self {
            ServiceErrorKind::PortConflict => "port conflict",
            ServiceErrorKind::LaunchFailure => "launch failure",
            ServiceErrorKind::ReadinessTimeout => "readiness timeout",
            ServiceErrorKind::TeardownFailure => "teardown failure",
        }
    }
}

/// Per-service record produced by one `start` invocation. Transient: folded
/// into the summary and discarded when the run ends.
#[derive(Debug, Clone)]
pub struct ServiceRunResult {
    pub name: String,
    pub url: String,
    /// Whether a launch call was issued this run (`false` for already-ready
    /// services and for failures before launch).
    pub started: bool,
    pub ready: bool,
    /// Time from the first readiness poll to the accepted response (zero for
    /// services that were already ready).
    pub elapsed: Duration,
    pub error: Option<ServiceErrorKind>,
}

/// Outcome of `start`.
#[derive(Debug)]
pub struct StartOutcome {
    pub network: String,
    pub network_provision: NetworkProvision,
    pub results: Vec<ServiceRunResult>,
}

impl StartOutcome {
    /// Names of services that are ready after this run.
    pub fn started_services(&self) -> Vec<String> {
        self.results
            .iter()
            .filter(|result| result.ready)
            .map(|result| result.name.clone())
            .collect()
    }

    /// Names of services that failed this run.
    pub fn failed_services(&self) -> Vec<String> {
        self.results
            .iter()
            .filter(|result| !result.ready)
            .map(|result| result.name.clone())
            .collect()
    }
}

/// One row of the health table produced by `status`.
#[derive(Debug, Clone)]
pub struct ServiceHealthRow {
    pub name: String,
    pub tier: Tier,
    pub port: u16,
    pub url: String,
    pub reachable: bool,
    /// Short probe detail, e.g. `http 200` or `no response`.
    pub detail: String,
}

/// Outcome of `status`.
#[derive(Debug)]
pub struct StatusOutcome {
    pub project_name: String,
    pub checked_at: SystemTime,
    pub rows: Vec<ServiceHealthRow>,
}

/// Per-service record produced by `stop`.
#[derive(Debug, Clone)]
pub struct ServiceStopResult {
    pub name: String,
    pub stopped: bool,
    /// Whether any state changed (`false` when everything was already down).
    pub changed: bool,
    pub detail: Option<String>,
}

/// Outcome of `stop`.
#[derive(Debug)]
pub struct StopOutcome {
    pub results: Vec<ServiceStopResult>,
}

impl StopOutcome {
    pub fn failed_services(&self) -> Vec<String> {
        self.results
            .iter()
            .filter(|result| !result.stopped)
            .map(|result| result.name.clone())
            .collect()
    }
}

/// Outcome of `restart`.
#[derive(Debug)]
pub struct RestartOutcome {
    pub stop: StopOutcome,
    pub start: StartOutcome,
}

/// Outcome of one troubleshooting action.
#[derive(Debug)]
pub struct FixOutcome {
    pub steps: Vec<FixStepReport>,
}

/// Result of one idempotent troubleshooting step.
#[derive(Debug, Clone)]
pub struct FixStepReport {
    pub label: String,
    pub applied: bool,
    pub detail: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(name: &str, ready: bool, error: Option<ServiceErrorKind>) -> ServiceRunResult {
        ServiceRunResult {
            name: name.to_string(),
            url: format!("http://localhost:{}", 5678),
            started: ready,
            ready,
            elapsed: Duration::from_secs(1),
            error,
        }
    }

    #[test]
    fn summary_partitions_ready_and_failed() {
        let outcome = StartOutcome {
            network: "aipm-network".into(),
            network_provision: NetworkProvision::AlreadyExists,
            results: vec![
                result("n8n", true, None),
                result("typebot", false, Some(ServiceErrorKind::ReadinessTimeout)),
                result("langflow", true, None),
            ],
        };

        assert_eq!(outcome.started_services(), vec!["n8n", "langflow"]);
        assert_eq!(outcome.failed_services(), vec!["typebot"]);
    }
}
