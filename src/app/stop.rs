use std::path::PathBuf;

use crate::Result;
use crate::cli::StopArgs;
use crate::core::operations::{self, Environment};
use crate::core::options::StopOptions;
use crate::core::outcome::StopOutcome;
use crate::core::project::format_config_warnings;

use super::common::{config_load_options, emit_diagnostics, split_config_warnings};
use super::display::render_events;

pub fn handle_stop(args: StopArgs, config_override: Option<&PathBuf>) -> Result<()> {
    let options = StopOptions {
        config: config_load_options(config_override, args.skip_discovery, "stop")?,
    };

    let env = Environment::host();
    let output = operations::stop(&env, options, None)?;

    let (config_warnings, other) = split_config_warnings(&output.diagnostics);
    if let Some(message) = format_config_warnings(&config_warnings) {
        eprint!("{message}");
    }
    emit_diagnostics(&other);

    render_events(&output.events);
    render_stop_summary(&output.value);

    // Teardown is best-effort: failures are printed but never change the
    // exit code.
    Ok(())
}

pub fn render_stop_summary(outcome: &StopOutcome) {
    let failed = outcome.failed_services();
    if failed.is_empty() {
        println!("All services torn down.");
    } else {
        eprintln!(
            "Warning: teardown incomplete for {}. Inspect with `docker ps` and retry.",
            failed.join(", ")
        );
    }
}
