use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;

use crate::Result;
use crate::cli::FixArgs;
use crate::core::operations::Environment;
use crate::core::operations::advisor::{FixAction, fix};
use crate::core::options::{ConfirmPolicy, FixOptions};
use crate::core::outcome::FixOutcome;
use crate::core::project::format_config_warnings;
use crate::core::prompt::TerminalConfirm;
use crate::error::Error;

use super::common::{config_load_options, emit_diagnostics, split_config_warnings};
use super::display::render_events;

/// Interactive troubleshooting menu. Each option maps to one idempotent
/// library action; the loop re-runs until the operator quits.
pub fn handle_fix(args: FixArgs, config_override: Option<&PathBuf>) -> Result<()> {
    if !io::stdin().is_terminal() {
        return Err(Error::PromptFailed {
            source: io::Error::new(
                io::ErrorKind::Unsupported,
                "`stevedore fix` is interactive and needs a terminal; \
                 use `start --non-interactive` for scripted runs",
            ),
        });
    }

    let env = Environment::host();
    let mut prompt = TerminalConfirm;

    loop {
        print_menu();
        let Some(choice) = read_line()? else {
            return Ok(());
        };

        let action = match choice.as_str() {
            "1" => {
                let Some(port) = read_port()? else {
                    continue;
                };
                FixAction::ReleasePort(port)
            }
            "2" => FixAction::Prune { volumes: false },
            "3" => FixAction::RecreateNetwork,
            "4" => FixAction::ShowUsage,
            "5" => FixAction::NuclearReset,
            "q" | "Q" | "quit" | "exit" => return Ok(()),
            "" => continue,
            other => {
                println!("Unrecognized option `{other}`.");
                continue;
            }
        };

        let options = FixOptions {
            config: config_load_options(config_override, args.skip_discovery, "fix")?,
            confirm: ConfirmPolicy::AlwaysAsk,
        };

        match fix(&env, options, action, &mut prompt, None) {
            Ok(output) => {
                let (config_warnings, other) = split_config_warnings(&output.diagnostics);
                if let Some(message) = format_config_warnings(&config_warnings) {
                    eprint!("{message}");
                }
                emit_diagnostics(&other);
                render_events(&output.events);
                render_fix_steps(&output.value);
            }
            // A dead daemon mid-menu is routine here; report and keep the
            // menu alive so the operator can retry after starting it.
            Err(err) => eprintln!("Error: {err}"),
        }
        println!();
    }
}

fn print_menu() {
    println!("Stevedore troubleshooting:");
    println!("  1) Release an occupied service port");
    println!("  2) Prune unused runtime objects");
    println!("  3) Recreate the shared service network");
    println!("  4) Show runtime resource usage");
    println!("  5) Nuclear reset (ports, prune, network), then try `start` again");
    println!("  q) Quit");
    print!("choose> ");
    let _ = io::stdout().flush();
}

fn read_port() -> Result<Option<u16>> {
    print!("port> ");
    let _ = io::stdout().flush();
    let Some(line) = read_line()? else {
        return Ok(None);
    };
    match line.parse::<u16>() {
        Ok(port) => Ok(Some(port)),
        Err(_) => {
            println!("`{line}` is not a valid TCP port.");
            Ok(None)
        }
    }
}

fn read_line() -> Result<Option<String>> {
    let mut buffer = String::new();
    let bytes = io::stdin()
        .lock()
        .read_line(&mut buffer)
        .map_err(|source| Error::PromptFailed { source })?;
    if bytes == 0 {
        return Ok(None);
    }
    Ok(Some(buffer.trim().to_string()))
}

fn render_fix_steps(outcome: &FixOutcome) {
    for step in &outcome.steps {
        let marker = if step.applied { "✔" } else { "·" };
        if step.detail.contains('\n') {
            println!("{marker} {}:", step.label);
            for line in step.detail.lines() {
                println!("    {line}");
            }
        } else {
            println!("{marker} {}: {}", step.label, step.detail);
        }
    }
}
