use crate::core::diagnostics::Severity;
use crate::core::events::Event;

pub fn colorize(value: &str, code: &str, enabled: bool) -> String {
    if enabled {
        format!("\u{1b}[{code}m{value}\u{1b}[0m")
    } else {
        value.to_string()
    }
}

pub fn format_duration_ms(ms: u64) -> String {
    if ms == 0 {
        return "0s".to_string();
    }

    if ms % 1000 == 0 {
        return format!("{}s", ms / 1000);
    }

    let seconds = ms as f64 / 1000.0;
    if seconds >= 1.0 {
        format!("{seconds:.1}s")
    } else {
        format!("{ms}ms")
    }
}

/// Render the event stream of any operation. Lifecycle events print as
/// arrow-prefixed progress lines; failures go to stderr.
pub fn render_events(events: &[Event]) {
    for event in events {
        render_event(event);
    }
}

fn render_event(event: &Event) {
    match event {
        Event::Message { severity, text } => match severity {
            Severity::Info => println!("{text}"),
            Severity::Warning => eprintln!("Warning: {text}"),
            Severity::Error => eprintln!("Error: {text}"),
        },
        Event::RuntimeProbed { version } => match version {
            Some(version) => println!("→ runtime: reachable (server {version})."),
            None => println!("→ runtime: reachable."),
        },
        Event::NetworkEnsured { network, provision } => {
            println!("→ network {network}: {}.", provision.describe());
        }
        Event::AlreadyReady { service } => {
            println!("→ {service}: already ready; launch skipped.");
        }
        Event::Launched { service, unit } => {
            println!("→ {service}: launched ({unit}).");
        }
        Event::LaunchFailed { service, detail } => {
            eprintln!("→ {service}: launch failed: {detail}");
        }
        Event::PortConflictDetected {
            service,
            port,
            occupant,
        } => match occupant {
            Some(occupant) => {
                println!("→ {service}: port {port} is held by {occupant}.");
            }
            None => {
                println!("→ {service}: port {port} is held by an unidentified process.");
            }
        },
        Event::PortReleased { port, pid } => {
            println!("→ port {port}: released (terminated pid {pid}).");
        }
        Event::PortConflictDeclined { service, port } => {
            println!("→ {service}: leaving port {port} untouched; service marked failed.");
        }
        Event::Ready {
            service,
            elapsed_ms,
        } => {
            println!("→ {service}: ready in {}.", format_duration_ms(*elapsed_ms));
        }
        Event::TimedOut { service, waited_ms } => {
            println!(
                "→ {service}: no accepted response after {}; marked failed.",
                format_duration_ms(*waited_ms)
            );
        }
        Event::Stopped { service, changed } => {
            if *changed {
                println!("→ {service}: stopped.");
            } else {
                println!("→ {service}: already stopped.");
            }
        }
        Event::ExtraContainerRemoved {
            service,
            container,
            changed,
        } => {
            if *changed {
                println!("→ {service}: removed detached container `{container}`.");
            } else {
                println!("→ {service}: detached container `{container}` already gone.");
            }
        }
        Event::TeardownFailed { service, detail } => {
            eprintln!("→ {service}: teardown failed: {detail}");
        }
        Event::PruneCompleted { volumes, summary } => {
            if *volumes {
                println!("→ prune (including volumes): {summary}");
            } else {
                println!("→ prune: {summary}");
            }
        }
        Event::NetworkRecreated { network } => {
            println!("→ network {network}: dropped and re-created.");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colorize_wraps_value_when_enabled() {
        let colored = colorize("ok", "32", true);
        assert_eq!(colored, "\u{1b}[32mok\u{1b}[0m");
    }

    #[test]
    fn colorize_returns_plain_when_disabled() {
        let plain = colorize("ok", "32", false);
        assert_eq!(plain, "ok");
    }

    #[test]
    fn durations_render_in_the_largest_natural_unit() {
        assert_eq!(format_duration_ms(0), "0s");
        assert_eq!(format_duration_ms(8000), "8s");
        assert_eq!(format_duration_ms(8200), "8.2s");
        assert_eq!(format_duration_ms(950), "950ms");
    }
}
