use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::config::{DEFAULT_NETWORK, ProjectConfig, load_project_config};
use crate::error::{Error, Result};

use super::diagnostics::{Diagnostic, Severity};
use super::options::{ConfigLoadOptions, ConfigSource};
use super::registry::builtin_services;

/// Result of loading a project configuration.
#[derive(Debug)]
pub struct ProjectLoad {
    pub config: ProjectConfig,
    pub diagnostics: Vec<Diagnostic>,
    /// Whether the built-in registry was used instead of a file on disk.
    pub builtin: bool,
}

pub fn load_project(options: &ConfigLoadOptions) -> Result<ProjectLoad> {
    match resolve_config_path(&options.source, options.search_root.as_ref()) {
        Ok(path) => {
            let config = load_project_config(&path)?;
            let diagnostics = config
                .warnings
                .iter()
                .map(|warning| Diagnostic::new(Severity::Warning, warning).with_path(path.clone()))
                .collect();
            Ok(ProjectLoad {
                config,
                diagnostics,
                builtin: false,
            })
        }
        Err(Error::ConfigDiscoveryFailed { search_root }) if options.allow_builtin => {
            let config = builtin_project(search_root);
            Ok(ProjectLoad {
                diagnostics: vec![Diagnostic::new(
                    Severity::Info,
                    "Using the built-in service registry – write a stevedore.toml to customize it.",
                )],
                config,
                builtin: true,
            })
        }
        Err(err) => Err(err),
    }
}

pub fn resolve_config_path(
    source: &ConfigSource,
    search_root: Option<&PathBuf>,
) -> Result<PathBuf> {
    match source {
        ConfigSource::Explicit(path) => {
            if path.is_file() {
                Ok(path.clone())
            } else {
                Err(Error::ExplicitConfigMissing { path: path.clone() })
            }
        }
        ConfigSource::Discover => {
            let cwd = match search_root {
                Some(root) => root.clone(),
                None => current_dir()?,
            };
            discover_config(&cwd).ok_or(Error::ConfigDiscoveryFailed { search_root: cwd })
        }
    }
}

fn builtin_project(search_root: PathBuf) -> ProjectConfig {
    let file_path = search_root.join("stevedore.toml");
    ProjectConfig {
        services: builtin_services(&search_root),
        file_path,
        version: "0.1.0".to_string(),
        project_name: "aipm-toolkit".to_string(),
        network: DEFAULT_NETWORK.to_string(),
        warnings: Vec::new(),
    }
}

fn current_dir() -> Result<PathBuf> {
    std::env::current_dir().map_err(|source| Error::WorkingDirectoryUnavailable { source })
}

fn discover_config(start: &Path) -> Option<PathBuf> {
    let mut cursor = Some(start.to_path_buf());
    while let Some(dir) = cursor {
        let candidate = dir.join("stevedore.toml");
        if candidate.is_file() {
            return Some(candidate);
        }
        cursor = dir.parent().map(Path::to_path_buf);
    }
    None
}

pub fn format_config_warnings(warnings: &[Diagnostic]) -> Option<String> {
    let relevant: Vec<&Diagnostic> = warnings
        .iter()
        .filter(|diag| matches!(diag.severity, Severity::Warning))
        .collect();
    if relevant.is_empty() {
        return None;
    }

    let count = relevant.len();
    let suffix = if count == 1 { "" } else { "s" };
    let mut buf = String::new();
    writeln!(
        buf,
        "Found {count} warning{suffix} while parsing configuration:"
    )
    .unwrap();
    for warning in &relevant {
        writeln!(buf, "  • {}", warning.message).unwrap();
    }
    writeln!(buf, "Next checks:").unwrap();
    writeln!(buf, "  • Inspect service health with `stevedore status`.").unwrap();
    writeln!(buf, "  • Re-run `stevedore start` once the config is fixed.").unwrap();
    buf.push('\n');
    Some(buf)
}
