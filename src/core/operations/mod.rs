use std::sync::mpsc;
use std::thread;
use std::time::{Duration, SystemTime};

pub mod advisor;

use crate::config::ServiceDescriptor;
use crate::error::Error;

use super::diagnostics::Severity;
use super::events::Event;
use super::network::ensure_network;
use super::options::{
    ConfirmPolicy, RestartOptions, StartOptions, StatusOptions, StopOptions,
};
use super::outcome::{
    OperationOutput, OperationResult, RestartOutcome, ServiceErrorKind, ServiceRunResult,
    StartOutcome, StatusOutcome, StopOutcome, ServiceStopResult,
};
use super::ports::{HostPortInspector, PortInspector, PortState, ProcessInfo};
use super::project::load_project;
use super::prompt::{Confirm, decide};
use super::readiness::{
    Clock, HttpProbe, ReadinessOutcome, ReadinessProbe, SystemClock, check_service, wait_ready,
};
use super::registry::select;
use super::reporter::Reporter;
use super::runtime::{ContainerRuntime, DockerCli};
use super::status as status_core;

/// Capability bundle the operations run against. Production code uses
/// [`Environment::host`]; tests inject fakes for every seam.
pub struct Environment {
    pub runtime: Box<dyn ContainerRuntime>,
    pub probe: Box<dyn ReadinessProbe>,
    pub ports: Box<dyn PortInspector>,
    pub clock: Box<dyn Clock>,
}

impl Environment {
    /// Environment backed by the host's docker CLI and real HTTP probing.
    pub fn host() -> Self {
        Self {
            runtime: Box::new(DockerCli::discover()),
            probe: Box::new(HttpProbe::new()),
            ports: Box::new(HostPortInspector),
            clock: Box::new(SystemClock),
        }
    }
}

/// Proxy that both records events into the operation output and forwards them
/// to an optional streaming reporter.
struct ReporterProxy<'a, 'b, 'c> {
    reporter: Option<&'a mut (dyn Reporter + 'c)>,
    events: &'b mut Vec<Event>,
}

impl<'a, 'b, 'c> ReporterProxy<'a, 'b, 'c> {
    fn new(reporter: Option<&'a mut (dyn Reporter + 'c)>, events: &'b mut Vec<Event>) -> Self {
        Self { reporter, events }
    }

    fn emit(&mut self, event: Event) {
        if let Some(reporter) = self.reporter.as_deref_mut() {
            reporter.report(event.clone());
        }
        self.events.push(event);
    }
}

/// Per-service result of the sequential launch phase.
enum LaunchDisposition {
    /// The readiness endpoint already answers; launch skipped entirely.
    AlreadyReady,
    /// The service should be polled. `invoked` is `false` when the port was
    /// held by the container runtime itself (a launch already in flight).
    Polling { invoked: bool },
    /// Terminal failure before polling.
    Failed(ServiceErrorKind),
}

/// Bring the selected services to a verified-ready state.
///
/// Per-service lifecycle: not-started → launching → (port conflict →
/// resolving → launching, once) → polling → ready | failed. Services are
/// independent: a failure is recorded and the run moves on. Launches are
/// sequential so port check-then-act never races between services; readiness
/// polling of the launched set runs one thread per service.
pub fn start<'a>(
    env: &Environment,
    options: StartOptions,
    prompt: &mut dyn Confirm,
    reporter: Option<&mut (dyn Reporter + 'a)>,
) -> OperationResult<StartOutcome> {
    let mut diagnostics = Vec::new();
    let mut events = Vec::new();
    let mut reporter = ReporterProxy::new(reporter, &mut events);

    let load = load_project(&options.config)?;
    diagnostics.extend(load.diagnostics);
    let project = load.config;

    let selected: Vec<ServiceDescriptor> = select(&project.services, options.tier)
        .into_iter()
        .cloned()
        .collect();
    if selected.is_empty() {
        reporter.emit(Event::Message {
            severity: Severity::Info,
            text: "No services matched the requested tier.".to_string(),
        });
    }

    let version = env
        .runtime
        .probe()
        .map_err(|failure| Error::RuntimeUnreachable {
            detail: failure.to_string(),
        })?;
    reporter.emit(Event::RuntimeProbed { version });

    let provision = ensure_network(env.runtime.as_ref(), &project.network)?;
    reporter.emit(Event::NetworkEnsured {
        network: project.network.clone(),
        provision,
    });

    let mut dispositions = Vec::with_capacity(selected.len());
    for service in &selected {
        let disposition = launch_service(
            env,
            service,
            &project.network,
            options.confirm,
            prompt,
            &mut reporter,
        );
        dispositions.push(disposition);
    }

    let mut poll_slots: Vec<Option<ReadinessOutcome>> = Vec::new();
    poll_slots.resize_with(selected.len(), || None);

    thread::scope(|scope| {
        let (event_tx, event_rx) = mpsc::channel::<(usize, ReadinessOutcome, Event)>();

        for (index, (service, disposition)) in
            selected.iter().zip(dispositions.iter()).enumerate()
        {
            if !matches!(disposition, LaunchDisposition::Polling { .. }) {
                continue;
            }
            let tx = event_tx.clone();
            let probe = env.probe.as_ref();
            let clock = env.clock.as_ref();
            scope.spawn(move || {
                let outcome = wait_ready(service, probe, clock);
                let event = match outcome {
                    ReadinessOutcome::Ready { elapsed } => Event::Ready {
                        service: service.name.clone(),
                        elapsed_ms: elapsed.as_millis() as u64,
                    },
                    ReadinessOutcome::TimedOut { waited } => Event::TimedOut {
                        service: service.name.clone(),
                        waited_ms: waited.as_millis() as u64,
                    },
                };
                let _ = tx.send((index, outcome, event));
            });
        }
        drop(event_tx);

        for (index, outcome, event) in event_rx {
            reporter.emit(event);
            poll_slots[index] = Some(outcome);
        }
    });

    let mut results = Vec::with_capacity(selected.len());
    for (index, (service, disposition)) in selected.into_iter().zip(dispositions).enumerate() {
        let url = service.url();
        let result = match disposition {
            LaunchDisposition::AlreadyReady => ServiceRunResult {
                name: service.name,
                url,
                started: false,
                ready: true,
                elapsed: Duration::ZERO,
                error: None,
            },
            LaunchDisposition::Failed(kind) => ServiceRunResult {
                name: service.name,
                url,
                started: false,
                ready: false,
                elapsed: Duration::ZERO,
                error: Some(kind),
            },
            LaunchDisposition::Polling { invoked } => match poll_slots[index] {
                Some(ReadinessOutcome::Ready { elapsed }) => ServiceRunResult {
                    name: service.name,
                    url,
                    started: invoked,
                    ready: true,
                    elapsed,
                    error: None,
                },
                Some(ReadinessOutcome::TimedOut { waited }) => ServiceRunResult {
                    name: service.name,
                    url,
                    started: invoked,
                    ready: false,
                    elapsed: waited,
                    error: Some(ServiceErrorKind::ReadinessTimeout),
                },
                // A poll thread can only vanish without reporting if it
                // panicked; surface that as a timeout-shaped failure.
                None => ServiceRunResult {
                    name: service.name,
                    url,
                    started: invoked,
                    ready: false,
                    elapsed: Duration::ZERO,
                    error: Some(ServiceErrorKind::ReadinessTimeout),
                },
            },
        };
        results.push(result);
    }

    let outcome = StartOutcome {
        network: project.network,
        network_provision: provision,
        results,
    };

    Ok(OperationOutput::new(outcome)
        .with_diagnostics(diagnostics)
        .with_events(events))
}

fn launch_service(
    env: &Environment,
    service: &ServiceDescriptor,
    network: &str,
    policy: ConfirmPolicy,
    prompt: &mut dyn Confirm,
    reporter: &mut ReporterProxy<'_, '_, '_>,
) -> LaunchDisposition {
    // Idempotence short-circuit: launching an already-running unit is not
    // safe for every wrapped service, so an endpoint that already answers
    // must skip the launch entirely.
    if check_service(env.probe.as_ref(), service) {
        reporter.emit(Event::AlreadyReady {
            service: service.name.clone(),
        });
        return LaunchDisposition::AlreadyReady;
    }

    let mut resolved = false;
    match env.ports.check_port(service.readiness_port) {
        PortState::Free => {}
        PortState::Occupied(occupant) => {
            if occupant
                .as_ref()
                .is_some_and(ProcessInfo::is_container_runtime)
            {
                // Our own unit holds the port but is not answering HTTP yet:
                // a cold start already in flight. Poll it instead of
                // launching a colliding unit.
                return LaunchDisposition::Polling { invoked: false };
            }
            if !resolve_conflict(env, service, occupant, policy, prompt, reporter) {
                return LaunchDisposition::Failed(ServiceErrorKind::PortConflict);
            }
            resolved = true;
        }
    }

    match env.runtime.launch(service, network) {
        Ok(()) => {
            reporter.emit(Event::Launched {
                service: service.name.clone(),
                unit: service.launch.describe(),
            });
            LaunchDisposition::Polling { invoked: true }
        }
        // One remediation round per service: a binding error after a resolved
        // conflict is reported as-is instead of looping.
        Err(failure) if is_port_binding_error(&failure.detail) && !resolved => {
            // The pre-check raced a late binder. Resolve and retry the
            // launch exactly once.
            let occupant = match env.ports.check_port(service.readiness_port) {
                PortState::Occupied(occupant) => occupant,
                PortState::Free => None,
            };
            if !resolve_conflict(env, service, occupant, policy, prompt, reporter) {
                return LaunchDisposition::Failed(ServiceErrorKind::PortConflict);
            }
            match env.runtime.launch(service, network) {
                Ok(()) => {
                    reporter.emit(Event::Launched {
                        service: service.name.clone(),
                        unit: service.launch.describe(),
                    });
                    LaunchDisposition::Polling { invoked: true }
                }
                Err(failure) => {
                    reporter.emit(Event::LaunchFailed {
                        service: service.name.clone(),
                        detail: failure.to_string(),
                    });
                    LaunchDisposition::Failed(ServiceErrorKind::LaunchFailure)
                }
            }
        }
        Err(failure) => {
            reporter.emit(Event::LaunchFailed {
                service: service.name.clone(),
                detail: failure.to_string(),
            });
            LaunchDisposition::Failed(ServiceErrorKind::LaunchFailure)
        }
    }
}

/// Surface a conflict to the operator (or the configured policy) and release
/// the port only on explicit approval. Returns whether the port was freed.
fn resolve_conflict(
    env: &Environment,
    service: &ServiceDescriptor,
    occupant: Option<ProcessInfo>,
    policy: ConfirmPolicy,
    prompt: &mut dyn Confirm,
    reporter: &mut ReporterProxy<'_, '_, '_>,
) -> bool {
    let port = service.readiness_port;
    reporter.emit(Event::PortConflictDetected {
        service: service.name.clone(),
        port,
        occupant: occupant.as_ref().map(ProcessInfo::describe),
    });

    let Some(occupant) = occupant else {
        reporter.emit(Event::PortConflictDeclined {
            service: service.name.clone(),
            port,
        });
        return false;
    };

    let question = format!(
        "Port {port} (needed by `{}`) is held by {}. Terminate it?",
        service.name,
        occupant.describe()
    );
    if !decide(policy, prompt, &question) {
        reporter.emit(Event::PortConflictDeclined {
            service: service.name.clone(),
            port,
        });
        return false;
    }

    match env.ports.release(&occupant) {
        Ok(()) => {
            reporter.emit(Event::PortReleased {
                port,
                pid: occupant.pid,
            });
            true
        }
        Err(detail) => {
            reporter.emit(Event::Message {
                severity: Severity::Warning,
                text: format!("Failed to release port {port}: {detail}"),
            });
            false
        }
    }
}

fn is_port_binding_error(detail: &str) -> bool {
    let detail = detail.to_ascii_lowercase();
    detail.contains("port is already allocated") || detail.contains("address already in use")
}

/// Re-check every service's liveness without mutating anything.
pub fn status(
    env: &Environment,
    options: StatusOptions,
    _reporter: Option<&mut dyn Reporter>,
) -> OperationResult<StatusOutcome> {
    let mut diagnostics = Vec::new();
    let events = Vec::new();

    let load = load_project(&options.config)?;
    diagnostics.extend(load.diagnostics);
    let project = load.config;

    let rows = status_core::collect_health(&project.services, env.probe.as_ref());

    Ok(OperationOutput::new(StatusOutcome {
        project_name: project.project_name,
        checked_at: SystemTime::now(),
        rows,
    })
    .with_diagnostics(diagnostics)
    .with_events(events))
}

/// Tear down every service in the registry, best-effort.
///
/// No short-circuit: a failed teardown is recorded and the remaining services
/// are still attempted. Detached containers outside the launch unit are
/// removed explicitly, since `compose down` cannot reach them.
pub fn stop<'a>(
    env: &Environment,
    options: StopOptions,
    reporter: Option<&mut (dyn Reporter + 'a)>,
) -> OperationResult<StopOutcome> {
    let mut diagnostics = Vec::new();
    let mut events = Vec::new();
    let mut reporter = ReporterProxy::new(reporter, &mut events);

    let load = load_project(&options.config)?;
    diagnostics.extend(load.diagnostics);
    let project = load.config;

    let version = env
        .runtime
        .probe()
        .map_err(|failure| Error::RuntimeUnreachable {
            detail: failure.to_string(),
        })?;
    reporter.emit(Event::RuntimeProbed { version });

    let mut results = Vec::with_capacity(project.services.len());
    for service in &project.services {
        let mut stopped = true;
        let mut changed = false;
        let mut detail = None;

        match env.runtime.stop_unit(service) {
            Ok(disposition) => {
                changed |= disposition.changed();
                reporter.emit(Event::Stopped {
                    service: service.name.clone(),
                    changed: disposition.changed(),
                });
            }
            Err(failure) => {
                stopped = false;
                detail = Some(failure.to_string());
                reporter.emit(Event::TeardownFailed {
                    service: service.name.clone(),
                    detail: failure.to_string(),
                });
            }
        }

        for container in &service.extra_containers {
            match env.runtime.remove_container(container) {
                Ok(disposition) => {
                    changed |= disposition.changed();
                    reporter.emit(Event::ExtraContainerRemoved {
                        service: service.name.clone(),
                        container: container.clone(),
                        changed: disposition.changed(),
                    });
                }
                Err(failure) => {
                    stopped = false;
                    let text = failure.to_string();
                    detail.get_or_insert_with(|| text.clone());
                    reporter.emit(Event::TeardownFailed {
                        service: service.name.clone(),
                        detail: text,
                    });
                }
            }
        }

        results.push(ServiceStopResult {
            name: service.name.clone(),
            stopped,
            changed,
            detail,
        });
    }

    Ok(OperationOutput::new(StopOutcome { results })
        .with_diagnostics(diagnostics)
        .with_events(events))
}

/// Full teardown followed by a fresh (optionally tier-filtered) start.
pub fn restart<'r>(
    env: &Environment,
    options: RestartOptions,
    prompt: &mut dyn Confirm,
    mut reporter: Option<&mut (dyn Reporter + 'r)>,
) -> OperationResult<RestartOutcome> {
    let stop_output = stop(
        env,
        StopOptions {
            config: options.config.clone(),
        },
        reporter.as_deref_mut(),
    )?;

    let start_output = start(
        env,
        StartOptions {
            config: options.config,
            tier: options.tier,
            confirm: options.confirm,
        },
        prompt,
        reporter,
    )?;

    let mut diagnostics = stop_output.diagnostics;
    diagnostics.extend(start_output.diagnostics);
    let mut events = stop_output.events;
    events.extend(start_output.events);

    Ok(OperationOutput::new(RestartOutcome {
        stop: stop_output.value,
        start: start_output.value,
    })
    .with_diagnostics(diagnostics)
    .with_events(events))
}
