use std::env;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use crate::config::{LaunchSpec, ServiceDescriptor};

/// Failure of a single runtime CLI invocation. Carried per-service instead of
/// escalating, so one broken image cannot abort the rest of a run.
#[derive(Debug, Clone)]
pub struct CommandFailure {
    pub command: String,
    pub detail: String,
}

impl std::fmt::Display for CommandFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "`{}` failed: {}", self.command, self.detail)
    }
}

/// Whether a teardown invocation changed anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeardownDisposition {
    Stopped,
    AlreadyStopped,
}

impl TeardownDisposition {
    pub fn changed(self) -> bool {
        matches!(self, TeardownDisposition::Stopped)
    }
}

/// Narrow capability interface over the container runtime.
///
/// Everything the orchestrator does to containers routes through this trait
/// so the control flow is testable against a fake without a daemon.
pub trait ContainerRuntime {
    /// Check that the runtime daemon is reachable. Returns the server version
    /// string when the daemon reports one.
    fn probe(&self) -> Result<Option<String>, CommandFailure>;

    /// Bring up a service's launch unit, detached.
    fn launch(&self, service: &ServiceDescriptor, network: &str) -> Result<(), CommandFailure>;

    /// Tear down a service's launch unit.
    fn stop_unit(&self, service: &ServiceDescriptor)
    -> Result<TeardownDisposition, CommandFailure>;

    /// Force-remove a single container by name. Removing a container that does
    /// not exist is not an error.
    fn remove_container(&self, name: &str) -> Result<TeardownDisposition, CommandFailure>;

    /// Whether the named network exists.
    fn network_exists(&self, name: &str) -> Result<bool, CommandFailure>;

    /// Create the named network.
    fn create_network(&self, name: &str) -> Result<(), CommandFailure>;

    /// Remove the named network. Removing a missing network is not an error.
    fn remove_network(&self, name: &str) -> Result<TeardownDisposition, CommandFailure>;

    /// Prune stopped containers, dangling images, and unused networks.
    /// Includes volumes only when `volumes` is set. Returns the runtime's
    /// summary text.
    fn prune(&self, volumes: bool) -> Result<String, CommandFailure>;

    /// Disk usage summary for runtime objects.
    fn resource_usage(&self) -> Result<String, CommandFailure>;
}

/// How `compose` is invoked on this host: the `docker compose` plugin or the
/// standalone `docker-compose` binary.
#[derive(Debug, Clone)]
enum ComposeInvocation {
    Plugin,
    Standalone(PathBuf),
}

/// Production [`ContainerRuntime`] backed by the `docker` CLI.
#[derive(Debug)]
pub struct DockerCli {
    binary: PathBuf,
    compose: ComposeInvocation,
}

impl DockerCli {
    /// Locate `docker` (and a compose flavor) on the PATH. The returned value
    /// is usable even when nothing was found; the failure then surfaces from
    /// `probe` with an actionable message.
    pub fn discover() -> Self {
        let binary = find_executable(&["docker"]).unwrap_or_else(|| PathBuf::from("docker"));
        let compose = if compose_plugin_available(&binary) {
            ComposeInvocation::Plugin
        } else {
            match find_executable(&["docker-compose"]) {
                Some(path) => ComposeInvocation::Standalone(path),
                None => ComposeInvocation::Plugin,
            }
        };
        Self { binary, compose }
    }

    fn compose_command(&self, compose_file: &Path) -> Command {
        let mut command = match &self.compose {
            ComposeInvocation::Plugin => {
                let mut command = Command::new(&self.binary);
                command.arg("compose");
                command
            }
            ComposeInvocation::Standalone(path) => Command::new(path),
        };
        command.arg("-f").arg(compose_file);
        if let Some(parent) = compose_file.parent().filter(|p| !p.as_os_str().is_empty()) {
            command.current_dir(parent);
        }
        command
    }

    fn docker(&self, args: &[&str]) -> Command {
        let mut command = Command::new(&self.binary);
        command.args(args);
        command
    }
}

impl ContainerRuntime for DockerCli {
    fn probe(&self) -> Result<Option<String>, CommandFailure> {
        let output = run_capture(self.docker(&["info", "--format", "{{json .ServerVersion}}"]))?;
        let version: Option<String> = serde_json::from_str(output.trim()).ok();
        match version {
            Some(v) if !v.is_empty() => Ok(Some(v)),
            _ => Ok(None),
        }
    }

    fn launch(&self, service: &ServiceDescriptor, network: &str) -> Result<(), CommandFailure> {
        match &service.launch {
            LaunchSpec::Compose { file } => {
                let mut command = self.compose_command(file);
                command.args(["up", "-d"]);
                run_capture(command).map(|_| ())
            }
            LaunchSpec::Container {
                image,
                container_name,
                run_args,
            } => {
                let port = service.readiness_port.to_string();
                let mut command = self.docker(&["run", "-d", "--name"]);
                command
                    .arg(container_name)
                    .arg("--network")
                    .arg(network)
                    .arg("-p")
                    .arg(format!("{port}:{port}"))
                    .args(run_args)
                    .arg(image);
                run_capture(command).map(|_| ())
            }
        }
    }

    fn stop_unit(
        &self,
        service: &ServiceDescriptor,
    ) -> Result<TeardownDisposition, CommandFailure> {
        match &service.launch {
            LaunchSpec::Compose { file } => {
                let mut command = self.compose_command(file);
                command.args(["down", "--remove-orphans"]);
                run_capture(command).map(|_| TeardownDisposition::Stopped)
            }
            LaunchSpec::Container { container_name, .. } => {
                self.remove_container(container_name)
            }
        }
    }

    fn remove_container(&self, name: &str) -> Result<TeardownDisposition, CommandFailure> {
        let mut command = self.docker(&["rm", "-f"]);
        command.arg(name);
        match run_capture(command) {
            Ok(_) => Ok(TeardownDisposition::Stopped),
            Err(failure) if failure.detail.contains("No such container") => {
                Ok(TeardownDisposition::AlreadyStopped)
            }
            Err(failure) => Err(failure),
        }
    }

    fn network_exists(&self, name: &str) -> Result<bool, CommandFailure> {
        let mut command = self.docker(&["network", "inspect", "--format", "{{json .Name}}"]);
        command.arg(name);
        match run_capture(command) {
            Ok(output) => {
                let found: Option<String> = serde_json::from_str(output.trim()).ok();
                Ok(found.as_deref() == Some(name))
            }
            Err(failure)
                if failure.detail.contains("No such network")
                    || failure.detail.contains("not found") =>
            {
                Ok(false)
            }
            Err(failure) => Err(failure),
        }
    }

    fn create_network(&self, name: &str) -> Result<(), CommandFailure> {
        let mut command = self.docker(&["network", "create"]);
        command.arg(name);
        run_capture(command).map(|_| ())
    }

    fn remove_network(&self, name: &str) -> Result<TeardownDisposition, CommandFailure> {
        let mut command = self.docker(&["network", "rm"]);
        command.arg(name);
        match run_capture(command) {
            Ok(_) => Ok(TeardownDisposition::Stopped),
            Err(failure)
                if failure.detail.contains("No such network")
                    || failure.detail.contains("not found") =>
            {
                Ok(TeardownDisposition::AlreadyStopped)
            }
            Err(failure) => Err(failure),
        }
    }

    fn prune(&self, volumes: bool) -> Result<String, CommandFailure> {
        let mut command = self.docker(&["system", "prune", "-f"]);
        if volumes {
            command.arg("--volumes");
        }
        run_capture(command)
    }

    fn resource_usage(&self) -> Result<String, CommandFailure> {
        run_capture(self.docker(&["system", "df"]))
    }
}

/// Run a command, capture stdout, and fold a failure into [`CommandFailure`]
/// with the tail of stderr as the detail.
fn run_capture(mut command: Command) -> Result<String, CommandFailure> {
    let rendered = render_command(&command);
    command.stdin(Stdio::null());
    let output = command.output().map_err(|err| CommandFailure {
        command: rendered.clone(),
        detail: err.to_string(),
    })?;
    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    } else {
        Err(CommandFailure {
            command: rendered,
            detail: failure_detail(&output),
        })
    }
}

fn render_command(command: &Command) -> String {
    let mut parts = vec![command.get_program().to_string_lossy().into_owned()];
    parts.extend(
        command
            .get_args()
            .map(|arg| arg.to_string_lossy().into_owned()),
    );
    parts.join(" ")
}

fn failure_detail(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let tail: Vec<&str> = stderr.lines().rev().take(3).collect();
    let mut lines: Vec<&str> = tail.into_iter().rev().collect();
    if lines.is_empty() {
        lines.push("(no stderr output)");
    }
    format!("exit {}: {}", describe_status(output), lines.join(" / "))
}

fn describe_status(output: &Output) -> String {
    output
        .status
        .code()
        .map(|code| code.to_string())
        .unwrap_or_else(|| "signal".to_string())
}

fn compose_plugin_available(binary: &Path) -> bool {
    Command::new(binary)
        .args(["compose", "version"])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

fn find_executable(candidates: &[&str]) -> Option<PathBuf> {
    let path_var = env::var_os("PATH")?;
    for candidate in candidates {
        for dir in env::split_paths(&path_var) {
            let full = dir.join(candidate);
            if full.is_file() {
                return Some(full);
            }
        }
    }
    None
}
