use std::io;
use std::net::TcpListener;
use std::process::Command;
use std::time::{Duration, Instant};

use libc::pid_t;
use sysinfo::{Pid, ProcessRefreshKind, RefreshKind, System};

/// What `check_port` observed for a TCP port on the loopback interface.
#[derive(Debug, Clone)]
pub enum PortState {
    Free,
    /// Something is bound. The occupant is best-effort: identifying it needs
    /// `lsof`, which may be missing or lack permission.
    Occupied(Option<ProcessInfo>),
}

/// Identity of the process bound to a conflicting port.
#[derive(Debug, Clone)]
pub struct ProcessInfo {
    pub pid: i32,
    pub name: Option<String>,
}

impl ProcessInfo {
    pub fn describe(&self) -> String {
        match &self.name {
            Some(name) => format!("{name} (pid {})", self.pid),
            None => format!("pid {}", self.pid),
        }
    }

    /// Whether the occupant looks like the container runtime's own port
    /// forwarder. When it does, the port is held by a launch of ours already
    /// in flight, not by a foreign process.
    pub fn is_container_runtime(&self) -> bool {
        self.name
            .as_deref()
            .map(|name| {
                let name = name.to_ascii_lowercase();
                name.contains("docker") || name.contains("containerd") || name.contains("vpnkit")
            })
            .unwrap_or(false)
    }
}

/// Host port inspection and remediation, injectable for tests.
pub trait PortInspector {
    fn check_port(&self, port: u16) -> PortState;

    /// Terminate the occupying process. Only ever called after the operator
    /// (or a configured policy) confirmed; killing an arbitrary process on a
    /// well-known port is not this tool's call to make on its own.
    fn release(&self, occupant: &ProcessInfo) -> Result<(), String>;
}

/// Production inspector: bind-test with a throwaway listener, identify the
/// occupant via `lsof`, terminate with SIGTERM and escalate to SIGKILL.
#[derive(Debug, Default)]
pub struct HostPortInspector;

impl PortInspector for HostPortInspector {
    fn check_port(&self, port: u16) -> PortState {
        let bind_addr = format!("127.0.0.1:{port}");
        match TcpListener::bind(&bind_addr) {
            Ok(listener) => {
                drop(listener);
                PortState::Free
            }
            Err(err) if err.kind() == io::ErrorKind::AddrInUse => {
                PortState::Occupied(identify_occupant(port))
            }
            // Permission errors and the like: treat as occupied but anonymous
            // rather than failing the whole preflight.
            Err(_) => PortState::Occupied(None),
        }
    }

    fn release(&self, occupant: &ProcessInfo) -> Result<(), String> {
        let pid = occupant.pid as pid_t;

        if unsafe { libc::kill(pid, libc::SIGTERM) } != 0 {
            let err = io::Error::last_os_error();
            if err.raw_os_error() == Some(libc::ESRCH) {
                return Ok(());
            }
            return Err(format!("failed to signal pid {pid}: {err}"));
        }

        if wait_for_exit(pid, Duration::from_secs(3)) {
            return Ok(());
        }

        if unsafe { libc::kill(pid, libc::SIGKILL) } != 0 {
            let err = io::Error::last_os_error();
            if err.raw_os_error() == Some(libc::ESRCH) {
                return Ok(());
            }
            return Err(format!("failed to SIGKILL pid {pid}: {err}"));
        }

        if wait_for_exit(pid, Duration::from_secs(2)) {
            Ok(())
        } else {
            Err(format!("pid {pid} survived SIGKILL"))
        }
    }
}

fn wait_for_exit(pid: pid_t, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        let alive = unsafe { libc::kill(pid, 0) };
        if alive != 0 {
            let errno = io::Error::last_os_error().raw_os_error().unwrap_or_default();
            if errno == libc::ESRCH {
                return true;
            }
        }
        if Instant::now() >= deadline {
            return false;
        }
        std::thread::sleep(Duration::from_millis(100));
    }
}

fn identify_occupant(port: u16) -> Option<ProcessInfo> {
    let output = Command::new("lsof")
        .args(["-ti", &format!("tcp:{port}"), "-sTCP:LISTEN"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let pid: i32 = stdout.lines().next()?.trim().parse().ok()?;

    Some(ProcessInfo {
        pid,
        name: process_name(pid),
    })
}

fn process_name(pid: i32) -> Option<String> {
    let refresh =
        RefreshKind::new().with_processes(ProcessRefreshKind::new());
    let system = System::new_with_specifics(refresh);
    system
        .process(Pid::from(pid as usize))
        .map(|process| process.name().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    #[test]
    fn unbound_port_reports_free() {
        // Bind to an ephemeral port to learn a number, then release it.
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        assert!(matches!(HostPortInspector.check_port(port), PortState::Free));
    }

    #[test]
    fn bound_port_reports_occupied() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        // Occupant identification is best-effort; only the state matters here.
        assert!(matches!(
            HostPortInspector.check_port(port),
            PortState::Occupied(_)
        ));
    }

    #[test]
    fn container_runtime_occupants_are_recognized() {
        let docker = ProcessInfo {
            pid: 42,
            name: Some("com.docker.backend".to_string()),
        };
        let node = ProcessInfo {
            pid: 43,
            name: Some("node".to_string()),
        };
        let anonymous = ProcessInfo { pid: 44, name: None };

        assert!(docker.is_container_runtime());
        assert!(!node.is_container_runtime());
        assert!(!anonymous.is_container_runtime());
    }

    #[test]
    fn describe_includes_pid_and_name_when_known() {
        let info = ProcessInfo {
            pid: 4242,
            name: Some("node".to_string()),
        };
        assert_eq!(info.describe(), "node (pid 4242)");

        let bare = ProcessInfo { pid: 4242, name: None };
        assert_eq!(bare.describe(), "pid 4242");
    }
}
