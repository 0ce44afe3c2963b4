use std::path::PathBuf;

use crate::Result;
use crate::cli::StartArgs;
use crate::core::operations::{self, Environment};
use crate::core::options::StartOptions;
use crate::core::outcome::StartOutcome;
use crate::core::project::format_config_warnings;
use crate::core::prompt::TerminalConfirm;
use crate::error::Error;

use super::common::{
    config_load_options, confirm_policy, emit_diagnostics, split_config_warnings,
};
use super::display::render_events;

pub fn handle_start(args: StartArgs, config_override: Option<&PathBuf>) -> Result<()> {
    let options = StartOptions {
        config: config_load_options(config_override, args.skip_discovery, "start")?,
        tier: args.tier,
        confirm: confirm_policy(args.yes, args.non_interactive),
    };

    let env = Environment::host();
    let mut prompt = TerminalConfirm;
    let output = operations::start(&env, options, &mut prompt, None)?;

    let (config_warnings, other) = split_config_warnings(&output.diagnostics);
    if let Some(message) = format_config_warnings(&config_warnings) {
        eprint!("{message}");
    }
    emit_diagnostics(&other);

    render_events(&output.events);
    render_start_summary(&output.value);

    finish_start(&output.value)
}

/// Non-zero exit when any service failed, after the summary has been printed.
pub fn finish_start(outcome: &StartOutcome) -> Result<()> {
    let failed = outcome.failed_services();
    if failed.is_empty() {
        Ok(())
    } else {
        Err(Error::StartIncomplete {
            failed,
            total: outcome.results.len(),
        })
    }
}

pub fn render_start_summary(outcome: &StartOutcome) {
    let ready = outcome.started_services();
    let failed = outcome.failed_services();

    println!();
    println!("Summary: {} ready, {} failed.", ready.len(), failed.len());

    for result in &outcome.results {
        if result.ready {
            println!("  ready   {:<10} {}", result.name, result.url);
        } else {
            let reason = result
                .error
                .map(|kind| kind.describe())
                .unwrap_or("unknown failure");
            println!("  failed  {:<10} {reason}", result.name);
        }
    }

    if !failed.is_empty() {
        println!();
        println!("Next steps:");
        println!("  • Re-check health with `stevedore status` (slow cold starts often recover).");
        println!("  • Inspect container logs with `docker logs <container>`.");
        println!("  • Run `stevedore fix` for guided remediation.");
    }
}
