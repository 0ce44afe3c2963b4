use std::path::PathBuf;

use crate::core::diagnostics::{Diagnostic, Severity};
use crate::core::options::{ConfigLoadOptions, ConfigSource, ConfirmPolicy};
use crate::error::{Error, Result};

pub fn config_load_options(
    config_override: Option<&PathBuf>,
    skip_discovery: bool,
    command: &'static str,
) -> Result<ConfigLoadOptions> {
    match config_override {
        Some(path) => Ok(ConfigLoadOptions {
            source: ConfigSource::Explicit(path.clone()),
            allow_builtin: false,
            search_root: None,
        }),
        None if skip_discovery => Err(Error::SkipDiscoveryRequiresConfig { command }),
        None => Ok(ConfigLoadOptions::discover(true)),
    }
}

pub fn confirm_policy(yes: bool, non_interactive: bool) -> ConfirmPolicy {
    if yes {
        ConfirmPolicy::AutoApprove
    } else if non_interactive {
        ConfirmPolicy::AutoDeny
    } else {
        ConfirmPolicy::AlwaysAsk
    }
}

pub fn split_config_warnings(diagnostics: &[Diagnostic]) -> (Vec<Diagnostic>, Vec<Diagnostic>) {
    let mut config = Vec::new();
    let mut rest = Vec::new();
    for diagnostic in diagnostics {
        if matches!(diagnostic.severity, Severity::Warning) && diagnostic.path.is_some() {
            config.push(diagnostic.clone());
        } else {
            rest.push(diagnostic.clone());
        }
    }
    (config, rest)
}

pub fn emit_diagnostics(diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        match diagnostic.severity {
            Severity::Warning => {
                eprintln!("Warning: {}", diagnostic.message);
                if let Some(help) = &diagnostic.help {
                    eprintln!("         {help}");
                }
            }
            Severity::Info => {
                println!("{}", diagnostic.message);
                if let Some(help) = &diagnostic.help {
                    println!("{help}");
                }
            }
            Severity::Error => {
                eprintln!("Error: {}", diagnostic.message);
                if let Some(help) = &diagnostic.help {
                    eprintln!("       {help}");
                }
            }
        }
    }
}
