use super::diagnostics::Severity;
use super::network::NetworkProvision;

/// Structured event emitted during long-running operations.
#[derive(Debug, Clone)]
pub enum Event {
    /// A textual progress update with a severity level.
    Message {
        /// Severity of the message.
        severity: Severity,
        /// Human-readable text.
        text: String,
    },
    /// The container runtime answered the preflight probe.
    RuntimeProbed {
        /// Server version string reported by the runtime, when available.
        version: Option<String>,
    },
    /// The shared network was checked and is in place.
    NetworkEnsured {
        /// Network name.
        network: String,
        /// Whether the network was created or already existed.
        provision: NetworkProvision,
    },
    /// A service answered its readiness check before launch; launch skipped.
    AlreadyReady {
        /// Service name.
        service: String,
    },
    /// A service's launch unit was invoked on the runtime.
    Launched {
        /// Service name.
        service: String,
        /// Human-readable launch unit description.
        unit: String,
    },
    /// A service's launch invocation failed.
    LaunchFailed {
        /// Service name.
        service: String,
        /// Failure detail from the runtime.
        detail: String,
    },
    /// A foreign process occupies a service's readiness port.
    PortConflictDetected {
        /// Service name.
        service: String,
        /// Conflicting TCP port.
        port: u16,
        /// Description of the occupying process, when identifiable.
        occupant: Option<String>,
    },
    /// The operator (or policy) approved remediation and the port was released.
    PortReleased {
        /// Released TCP port.
        port: u16,
        /// Process id that was terminated.
        pid: i32,
    },
    /// The operator (or policy) declined remediation; the service is failed.
    PortConflictDeclined {
        /// Service name.
        service: String,
        /// Conflicting TCP port.
        port: u16,
    },
    /// A service's endpoint answered within its readiness window.
    Ready {
        /// Service name.
        service: String,
        /// Milliseconds waited until the first accepted response.
        elapsed_ms: u64,
    },
    /// A service's readiness window elapsed without an accepted response.
    TimedOut {
        /// Service name.
        service: String,
        /// Milliseconds waited before giving up.
        waited_ms: u64,
    },
    /// A service's launch unit was torn down. `changed` is `false` when the
    /// unit was already stopped.
    Stopped {
        /// Service name.
        service: String,
        /// Whether any state changed.
        changed: bool,
    },
    /// A detached container outside the launch unit was removed.
    ExtraContainerRemoved {
        /// Service name the container belongs to.
        service: String,
        /// Container name.
        container: String,
        /// Whether the container existed.
        changed: bool,
    },
    /// A service's teardown failed; remaining teardowns continue.
    TeardownFailed {
        /// Service name.
        service: String,
        /// Failure detail from the runtime.
        detail: String,
    },
    /// Unused runtime objects were pruned.
    PruneCompleted {
        /// Whether volumes were included.
        volumes: bool,
        /// Summary text reported by the runtime.
        summary: String,
    },
    /// The shared network was dropped and re-created.
    NetworkRecreated {
        /// Network name.
        network: String,
    },
}
