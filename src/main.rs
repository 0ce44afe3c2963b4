use std::process::ExitCode;

use clap::{CommandFactory, Parser, error::ErrorKind};

use stevedore::app;
use stevedore::cli::{Cli, Commands};

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::from(64),
            };
        }
    };

    let Cli { config, command } = cli;

    let command = match command {
        Some(cmd) => cmd,
        None => {
            let mut command = Cli::command();
            let _ = command.print_help();
            println!();
            return ExitCode::from(64);
        }
    };

    let exit = match command {
        Commands::Start(args) => app::handle_start(args, config.as_ref()),
        Commands::Status(args) => app::handle_status(args, config.as_ref()),
        Commands::Stop(args) => app::handle_stop(args, config.as_ref()),
        Commands::Restart(args) => app::handle_restart(args, config.as_ref()),
        Commands::Fix(args) => app::handle_fix(args, config.as_ref()),
    };

    match exit {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            app::error::exit_code(&err)
        }
    }
}
