use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::Error;

pub const DEFAULT_NETWORK: &str = "aipm-network";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// How a service is brought up on the container runtime.
///
/// Compose units are multi-container groups managed by `docker compose`;
/// container units are single detached containers started with `docker run`.
/// Teardown must honor the distinction: `compose down` only reaps
/// compose-managed containers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchSpec {
    Compose { file: PathBuf },
    Container {
        image: String,
        container_name: String,
        run_args: Vec<String>,
    },
}

impl LaunchSpec {
    pub fn describe(&self) -> String {
        match self {
            LaunchSpec::Compose { file } => format!("compose {}", file.display()),
            LaunchSpec::Container { image, .. } => format!("container {image}"),
        }
    }
}

/// Selection grouping for services. Filtering only; never affects correctness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Essential,
    Advanced,
}

impl Tier {
    pub fn parse(input: &str) -> Option<Self> {
        match input.to_ascii_lowercase().as_str() {
            "essential" => Some(Self::Essential),
            "advanced" => Some(Self::Advanced),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Essential => "essential",
            Tier::Advanced => "advanced",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What counts as a ready response from a service's readiness endpoint.
///
/// Several of the wrapped images answer their root path with 404 or a
/// redirect while perfectly healthy, so the default only requires that an
/// HTTP response arrived at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadinessStrictness {
    #[default]
    AnyHttpResponse,
    RequireSuccess,
}

/// One orchestrated service. Immutable for the process lifetime once loaded.
#[derive(Debug, Clone)]
pub struct ServiceDescriptor {
    pub name: String,
    pub launch: LaunchSpec,
    pub readiness_port: u16,
    pub readiness_path: String,
    pub strictness: ReadinessStrictness,
    pub timeout: Duration,
    pub tier: Tier,
    /// Detached containers the service relies on that live outside its launch
    /// unit. `compose down` does not reap these; teardown removes them by name.
    pub extra_containers: Vec<String>,
}

impl ServiceDescriptor {
    pub fn url(&self) -> String {
        if self.readiness_path == "/" {
            format!("http://localhost:{}", self.readiness_port)
        } else {
            format!("http://localhost:{}{}", self.readiness_port, self.readiness_path)
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProjectConfig {
    pub file_path: PathBuf,
    pub version: String,
    pub project_name: String,
    pub network: String,
    pub services: Vec<ServiceDescriptor>,
    pub warnings: Vec<String>,
}

pub fn load_project_config(path: &Path) -> Result<ProjectConfig, Error> {
    let contents = fs::read_to_string(path).map_err(|source| Error::ReadConfig {
        path: path.to_path_buf(),
        source,
    })?;

    let value: toml::Value = toml::from_str(&contents).map_err(|source| Error::ParseConfig {
        path: path.to_path_buf(),
        source,
    })?;

    let mut warnings = detect_unknown_fields(&value);

    let raw = RawConfig::deserialize(value).map_err(|source| Error::ParseConfig {
        path: path.to_path_buf(),
        source,
    })?;

    raw.into_validated(path, &mut warnings)
}

fn invalid_config(path: &Path, message: impl Into<String>) -> Error {
    Error::InvalidConfig {
        path: path.to_path_buf(),
        message: message.into(),
    }
}

fn detect_unknown_fields(value: &toml::Value) -> Vec<String> {
    let mut warnings = Vec::new();
    let allowed_root = ["version", "project", "services"];

    if let toml::Value::Table(table) = value {
        warn_table(table, &allowed_root, "root", &mut warnings);

        if let Some(project) = table.get("project") {
            if let toml::Value::Table(project_table) = project {
                warn_table(project_table, &["name", "network"], "[project]", &mut warnings);
            } else {
                warnings.push("Expected [project] to be a table.".to_string());
            }
        }

        if let Some(services) = table.get("services") {
            if let toml::Value::Array(entries) = services {
                for (idx, entry) in entries.iter().enumerate() {
                    if let toml::Value::Table(service_table) = entry {
                        warn_table(
                            service_table,
                            &[
                                "name",
                                "tier",
                                "compose_file",
                                "image",
                                "container_name",
                                "run_args",
                                "readiness_port",
                                "readiness_path",
                                "readiness",
                                "timeout_secs",
                                "extra_containers",
                            ],
                            &format!("[[services]] #{idx}"),
                            &mut warnings,
                        );
                    } else {
                        warnings.push(format!("[[services]] entry #{idx} must be a table."));
                    }
                }
            } else {
                warnings.push("`services` must be an array of tables.".to_string());
            }
        }
    }

    warnings
}

fn warn_table(
    table: &toml::map::Map<String, toml::Value>,
    allowed: &[&str],
    context: &str,
    warnings: &mut Vec<String>,
) {
    for key in table.keys() {
        if !allowed.contains(&key.as_str()) {
            warnings.push(format!(
                "Unknown field `{key}` at {context}; this value will be ignored."
            ));
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    version: Option<String>,
    project: Option<RawProject>,
    #[serde(default)]
    services: Vec<RawService>,
}

#[derive(Debug, Deserialize)]
struct RawProject {
    name: Option<String>,
    #[serde(default)]
    network: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawService {
    name: Option<String>,
    #[serde(default)]
    tier: Option<String>,
    #[serde(default)]
    compose_file: Option<PathBuf>,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    container_name: Option<String>,
    #[serde(default)]
    run_args: Vec<String>,
    readiness_port: Option<u16>,
    #[serde(default)]
    readiness_path: Option<String>,
    #[serde(default)]
    readiness: Option<String>,
    #[serde(default)]
    timeout_secs: Option<u64>,
    #[serde(default)]
    extra_containers: Vec<String>,
}

impl RawConfig {
    fn into_validated(
        self,
        path: &Path,
        warnings: &mut Vec<String>,
    ) -> Result<ProjectConfig, Error> {
        let version = self.version.ok_or_else(|| {
            invalid_config(
                path,
                "Missing required top-level field `version`. Example: `version = \"0.1.0\"`.",
            )
        })?;

        if version != "0.1.0" {
            warnings.push(format!(
                "Configuration version `{version}` is not fully supported yet; proceeding anyway."
            ));
        }

        let project = self.project.ok_or_else(|| {
            invalid_config(
                path,
                "Missing required table `[project]`. Example:\n\
                 [project]\n\
                 name = \"aipm-toolkit\"",
            )
        })?;

        let project_name = project.name.ok_or_else(|| {
            invalid_config(
                path,
                "Missing required field `project.name`. Example: `name = \"aipm-toolkit\"`.",
            )
        })?;

        let network = project
            .network
            .unwrap_or_else(|| DEFAULT_NETWORK.to_string());

        if self.services.is_empty() {
            return Err(invalid_config(
                path,
                "At least one `[[services]]` entry is required. Example:\n\
                 [[services]]\n\
                 name = \"n8n\"\n\
                 compose_file = \"workflows/docker-compose.n8n.yml\"\n\
                 readiness_port = 5678",
            ));
        }

        let root_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        let mut problems = Vec::new();
        let mut seen_names = HashSet::new();
        let mut services = Vec::with_capacity(self.services.len());

        for (idx, raw) in self.services.into_iter().enumerate() {
            let Some(name) = raw.name else {
                problems.push(format!("[[services]] #{idx}: missing required field `name`."));
                continue;
            };

            if !seen_names.insert(name.clone()) {
                problems.push(format!(
                    "Service name `{name}` is declared more than once; names must be unique."
                ));
                continue;
            }

            let tier = match raw.tier.as_deref() {
                None => Tier::Essential,
                Some(value) => match Tier::parse(value) {
                    Some(tier) => tier,
                    None => {
                        problems.push(format!(
                            "Service `{name}`: unknown tier `{value}`. Supported values: essential, advanced."
                        ));
                        continue;
                    }
                },
            };

            let launch = match (raw.compose_file, raw.image) {
                (Some(file), None) => {
                    let file = if file.is_relative() {
                        root_dir.join(file)
                    } else {
                        file
                    };
                    if raw.container_name.is_some() || !raw.run_args.is_empty() {
                        warnings.push(format!(
                            "Service `{name}`: `container_name`/`run_args` are ignored for compose units."
                        ));
                    }
                    LaunchSpec::Compose { file }
                }
                (None, Some(image)) => LaunchSpec::Container {
                    container_name: raw.container_name.unwrap_or_else(|| name.clone()),
                    run_args: raw.run_args,
                    image,
                },
                (Some(_), Some(_)) => {
                    problems.push(format!(
                        "Service `{name}`: declare either `compose_file` or `image`, not both."
                    ));
                    continue;
                }
                (None, None) => {
                    problems.push(format!(
                        "Service `{name}`: missing launch unit. Declare `compose_file` or `image`."
                    ));
                    continue;
                }
            };

            let Some(readiness_port) = raw.readiness_port else {
                problems.push(format!(
                    "Service `{name}`: missing required field `readiness_port`."
                ));
                continue;
            };

            let readiness_path = match raw.readiness_path {
                None => "/".to_string(),
                Some(p) if p.starts_with('/') => p,
                Some(p) => format!("/{p}"),
            };

            let strictness = match raw.readiness.as_deref() {
                None | Some("any-response") => ReadinessStrictness::AnyHttpResponse,
                Some("require-success") => ReadinessStrictness::RequireSuccess,
                Some(other) => {
                    problems.push(format!(
                        "Service `{name}`: unknown readiness mode `{other}`. \
                         Supported values: any-response, require-success."
                    ));
                    continue;
                }
            };

            let timeout = Duration::from_secs(raw.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS));
            if timeout.is_zero() {
                problems.push(format!(
                    "Service `{name}`: `timeout_secs` must be at least 1."
                ));
                continue;
            }

            services.push(ServiceDescriptor {
                name,
                launch,
                readiness_port,
                readiness_path,
                strictness,
                timeout,
                tier,
                extra_containers: raw.extra_containers,
            });
        }

        if !problems.is_empty() {
            return Err(invalid_config(path, problems.join("\n")));
        }

        Ok(ProjectConfig {
            file_path: path.to_path_buf(),
            version,
            project_name,
            network,
            services,
            warnings: std::mem::take(warnings),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_config(dir: &Path, contents: &str) -> PathBuf {
        let path = dir.join("stevedore.toml");
        fs::write(&path, contents).expect("write config");
        path
    }

    const MINIMAL: &str = r#"
version = "0.1.0"

[project]
name = "aipm-toolkit"

[[services]]
name = "n8n"
compose_file = "workflows/docker-compose.n8n.yml"
readiness_port = 5678
readiness_path = "healthz"
"#;

    #[test]
    fn parses_minimal_config_with_defaults() {
        let temp = tempdir().expect("temp dir");
        let path = write_config(temp.path(), MINIMAL);

        let config = load_project_config(&path).expect("load config");
        assert_eq!(config.project_name, "aipm-toolkit");
        assert_eq!(config.network, DEFAULT_NETWORK);
        assert_eq!(config.services.len(), 1);

        let svc = &config.services[0];
        assert_eq!(svc.name, "n8n");
        assert_eq!(svc.readiness_port, 5678);
        assert_eq!(svc.readiness_path, "/healthz");
        assert_eq!(svc.strictness, ReadinessStrictness::AnyHttpResponse);
        assert_eq!(svc.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert_eq!(svc.tier, Tier::Essential);
        assert!(matches!(svc.launch, LaunchSpec::Compose { .. }));
    }

    #[test]
    fn compose_paths_resolve_relative_to_config_dir() {
        let temp = tempdir().expect("temp dir");
        let path = write_config(temp.path(), MINIMAL);

        let config = load_project_config(&path).expect("load config");
        let LaunchSpec::Compose { file } = &config.services[0].launch else {
            panic!("expected compose launch");
        };
        assert_eq!(
            file,
            &temp.path().join("workflows/docker-compose.n8n.yml")
        );
    }

    #[test]
    fn rejects_duplicate_service_names() {
        let temp = tempdir().expect("temp dir");
        let path = write_config(
            temp.path(),
            r#"
version = "0.1.0"

[project]
name = "demo"

[[services]]
name = "n8n"
compose_file = "a.yml"
readiness_port = 5678

[[services]]
name = "n8n"
compose_file = "b.yml"
readiness_port = 5679
"#,
        );

        let err = load_project_config(&path).unwrap_err();
        let Error::InvalidConfig { message, .. } = err else {
            panic!("expected InvalidConfig, got {err:?}");
        };
        assert!(message.contains("declared more than once"));
    }

    #[test]
    fn rejects_service_with_both_launch_forms() {
        let temp = tempdir().expect("temp dir");
        let path = write_config(
            temp.path(),
            r#"
version = "0.1.0"

[project]
name = "demo"

[[services]]
name = "typebot"
compose_file = "a.yml"
image = "typebot:latest"
readiness_port = 3001
"#,
        );

        let err = load_project_config(&path).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { .. }));
    }

    #[test]
    fn container_unit_defaults_container_name_to_service_name() {
        let temp = tempdir().expect("temp dir");
        let path = write_config(
            temp.path(),
            r#"
version = "0.1.0"

[project]
name = "demo"

[[services]]
name = "typebot"
tier = "advanced"
image = "baptistearno/typebot-builder:latest"
readiness_port = 3001
extra_containers = ["typebot-db"]
"#,
        );

        let config = load_project_config(&path).expect("load config");
        let svc = &config.services[0];
        assert_eq!(svc.tier, Tier::Advanced);
        assert_eq!(svc.extra_containers, vec!["typebot-db".to_string()]);
        let LaunchSpec::Container { container_name, .. } = &svc.launch else {
            panic!("expected container launch");
        };
        assert_eq!(container_name, "typebot");
    }

    #[test]
    fn unknown_fields_surface_as_warnings() {
        let temp = tempdir().expect("temp dir");
        let path = write_config(
            temp.path(),
            r#"
version = "0.1.0"
mystery = true

[project]
name = "demo"

[[services]]
name = "n8n"
compose_file = "a.yml"
readiness_port = 5678
"#,
        );

        let config = load_project_config(&path).expect("load config");
        assert!(
            config
                .warnings
                .iter()
                .any(|warning| warning.contains("mystery"))
        );
    }

    #[test]
    fn service_url_joins_port_and_path() {
        let svc = ServiceDescriptor {
            name: "n8n".into(),
            launch: LaunchSpec::Compose { file: "a.yml".into() },
            readiness_port: 5678,
            readiness_path: "/healthz".into(),
            strictness: ReadinessStrictness::AnyHttpResponse,
            timeout: Duration::from_secs(5),
            tier: Tier::Essential,
            extra_containers: Vec::new(),
        };
        assert_eq!(svc.url(), "http://localhost:5678/healthz");
    }
}
