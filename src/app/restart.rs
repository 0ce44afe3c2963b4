use std::path::PathBuf;

use crate::Result;
use crate::cli::StartArgs;
use crate::core::operations::{self, Environment};
use crate::core::options::RestartOptions;
use crate::core::project::format_config_warnings;
use crate::core::prompt::TerminalConfirm;

use super::common::{
    config_load_options, confirm_policy, emit_diagnostics, split_config_warnings,
};
use super::display::render_events;
use super::start::{finish_start, render_start_summary};
use super::stop::render_stop_summary;

pub fn handle_restart(args: StartArgs, config_override: Option<&PathBuf>) -> Result<()> {
    let options = RestartOptions {
        config: config_load_options(config_override, args.skip_discovery, "restart")?,
        tier: args.tier,
        confirm: confirm_policy(args.yes, args.non_interactive),
    };

    let env = Environment::host();
    let mut prompt = TerminalConfirm;
    let output = operations::restart(&env, options, &mut prompt, None)?;

    let (config_warnings, other) = split_config_warnings(&output.diagnostics);
    if let Some(message) = format_config_warnings(&config_warnings) {
        eprint!("{message}");
    }
    emit_diagnostics(&other);

    render_events(&output.events);
    render_stop_summary(&output.value.stop);
    render_start_summary(&output.value.start);

    finish_start(&output.value.start)
}
