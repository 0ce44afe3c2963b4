use crate::error::{Error, Result};

use super::Environment;
use super::super::events::Event;
use super::super::options::{ConfirmPolicy, FixOptions};
use super::super::outcome::{FixOutcome, FixStepReport, OperationOutput, OperationResult};
use super::super::ports::PortState;
use super::super::project::load_project;
use super::super::prompt::{Confirm, decide};
use super::super::reporter::Reporter;

/// One remediation from the troubleshooting menu. Every action is idempotent
/// and independently invocable; `NuclearReset` chains them all before the
/// operator attempts `start` again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixAction {
    /// Terminate whatever foreign process holds the given port.
    ReleasePort(u16),
    /// Prune stopped containers, dangling images, and unused networks.
    /// Volume pruning deletes user data and gets its own confirmation.
    Prune { volumes: bool },
    /// Drop and re-create the shared service network.
    RecreateNetwork,
    /// Print the runtime's disk usage summary.
    ShowUsage,
    /// Release every registry port, prune (volumes on confirmation), and
    /// re-create the network, in that order.
    NuclearReset,
}

impl FixAction {
    pub fn describe(self) -> &'static str {
        match self {
            FixAction::ReleasePort(_) => "release port",
            FixAction::Prune { .. } => "prune runtime objects",
            FixAction::RecreateNetwork => "recreate network",
            FixAction::ShowUsage => "show resource usage",
            FixAction::NuclearReset => "nuclear reset",
        }
    }
}

/// Apply one troubleshooting action.
pub fn fix(
    env: &Environment,
    options: FixOptions,
    action: FixAction,
    prompt: &mut dyn Confirm,
    reporter: Option<&mut dyn Reporter>,
) -> OperationResult<FixOutcome> {
    let mut diagnostics = Vec::new();
    let mut events = Vec::new();
    let mut proxy = super::ReporterProxy::new(reporter, &mut events);

    let load = load_project(&options.config)?;
    diagnostics.extend(load.diagnostics);
    let project = load.config;

    let mut steps = Vec::new();
    apply(
        env,
        action,
        options.confirm,
        &project.network,
        &project
            .services
            .iter()
            .map(|service| service.readiness_port)
            .collect::<Vec<_>>(),
        prompt,
        &mut proxy,
        &mut steps,
    )?;

    Ok(OperationOutput::new(FixOutcome { steps })
        .with_diagnostics(diagnostics)
        .with_events(events))
}

#[allow(clippy::too_many_arguments)]
fn apply(
    env: &Environment,
    action: FixAction,
    policy: ConfirmPolicy,
    network: &str,
    registry_ports: &[u16],
    prompt: &mut dyn Confirm,
    proxy: &mut super::ReporterProxy<'_, '_, '_>,
    steps: &mut Vec<FixStepReport>,
) -> Result<()> {
    match action {
        FixAction::ReleasePort(port) => {
            steps.push(release_port(env, port, policy, prompt, proxy));
        }
        FixAction::Prune { volumes } => {
            steps.push(prune(env, volumes, policy, prompt, proxy)?);
        }
        FixAction::RecreateNetwork => {
            steps.push(recreate_network(env, network, proxy)?);
        }
        FixAction::ShowUsage => {
            steps.push(show_usage(env)?);
        }
        FixAction::NuclearReset => {
            for &port in registry_ports {
                steps.push(release_port(env, port, policy, prompt, proxy));
            }
            steps.push(prune(env, true, policy, prompt, proxy)?);
            steps.push(recreate_network(env, network, proxy)?);
        }
    }
    Ok(())
}

fn release_port(
    env: &Environment,
    port: u16,
    policy: ConfirmPolicy,
    prompt: &mut dyn Confirm,
    proxy: &mut super::ReporterProxy<'_, '_, '_>,
) -> FixStepReport {
    let label = format!("release port {port}");
    match env.ports.check_port(port) {
        PortState::Free => FixStepReport {
            label,
            applied: false,
            detail: "already free".to_string(),
        },
        PortState::Occupied(None) => FixStepReport {
            label,
            applied: false,
            detail: "occupied, but the owning process could not be identified".to_string(),
        },
        PortState::Occupied(Some(occupant)) => {
            if occupant.is_container_runtime() {
                return FixStepReport {
                    label,
                    applied: false,
                    detail: format!(
                        "held by the container runtime ({}); stop the service instead",
                        occupant.describe()
                    ),
                };
            }
            let question = format!(
                "Port {port} is held by {}. Terminate it?",
                occupant.describe()
            );
            if !decide(policy, prompt, &question) {
                return FixStepReport {
                    label,
                    applied: false,
                    detail: "declined".to_string(),
                };
            }
            match env.ports.release(&occupant) {
                Ok(()) => {
                    proxy.emit(Event::PortReleased {
                        port,
                        pid: occupant.pid,
                    });
                    FixStepReport {
                        label,
                        applied: true,
                        detail: format!("terminated {}", occupant.describe()),
                    }
                }
                Err(detail) => FixStepReport {
                    label,
                    applied: false,
                    detail,
                },
            }
        }
    }
}

fn prune(
    env: &Environment,
    volumes: bool,
    policy: ConfirmPolicy,
    prompt: &mut dyn Confirm,
    proxy: &mut super::ReporterProxy<'_, '_, '_>,
) -> Result<FixStepReport> {
    probe_runtime(env)?;

    let include_volumes = volumes
        && decide(
            policy,
            prompt,
            "Also prune unused volumes? This permanently deletes their data.",
        );

    let summary = env
        .runtime
        .prune(include_volumes)
        .map_err(|failure| Error::RuntimeUnreachable {
            detail: failure.to_string(),
        })?;
    let summary = summary.trim().to_string();

    proxy.emit(Event::PruneCompleted {
        volumes: include_volumes,
        summary: summary.clone(),
    });

    Ok(FixStepReport {
        label: if include_volumes {
            "prune runtime objects (including volumes)".to_string()
        } else {
            "prune runtime objects".to_string()
        },
        applied: true,
        detail: summary,
    })
}

fn recreate_network(
    env: &Environment,
    network: &str,
    proxy: &mut super::ReporterProxy<'_, '_, '_>,
) -> Result<FixStepReport> {
    probe_runtime(env)?;

    env.runtime
        .remove_network(network)
        .map_err(|failure| Error::NetworkProvisionFailed {
            network: network.to_string(),
            detail: failure.to_string(),
        })?;
    env.runtime
        .create_network(network)
        .map_err(|failure| Error::NetworkProvisionFailed {
            network: network.to_string(),
            detail: failure.to_string(),
        })?;

    proxy.emit(Event::NetworkRecreated {
        network: network.to_string(),
    });

    Ok(FixStepReport {
        label: format!("recreate network {network}"),
        applied: true,
        detail: "dropped and re-created".to_string(),
    })
}

fn show_usage(env: &Environment) -> Result<FixStepReport> {
    probe_runtime(env)?;

    let usage = env
        .runtime
        .resource_usage()
        .map_err(|failure| Error::RuntimeUnreachable {
            detail: failure.to_string(),
        })?;

    Ok(FixStepReport {
        label: "resource usage".to_string(),
        applied: true,
        detail: usage.trim().to_string(),
    })
}

fn probe_runtime(env: &Environment) -> Result<()> {
    env.runtime
        .probe()
        .map(|_| ())
        .map_err(|failure| Error::RuntimeUnreachable {
            detail: failure.to_string(),
        })
}
