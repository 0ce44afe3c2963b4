use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::Tier;

const VERSION: &str = env!("STEVEDORE_VERSION");

/// Top-level CLI definition for the `stevedore` tool.
#[derive(Debug, Parser)]
#[command(
    name = "stevedore",
    author = "Stevedore Project",
    version = VERSION,
    about = "A local orchestrator for the toolkit's containerized workflow services.",
    long_about = "Stevedore brings the toolkit's docker-based workflow services (n8n, Langflow, \n\
                  ToolJet, Typebot) to a verified-ready state, reports their health, and tears \n\
                  them down cleanly."
)]
pub struct Cli {
    /// Path to an explicit configuration file. Defaults to searching for `stevedore.toml`.
    #[arg(
        global = true,
        short,
        long = "config",
        value_name = "PATH",
        help = "Override auto-discovery and load configuration from PATH. Pair with --skip-discovery to disable filesystem walking."
    )]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Launch the configured services and wait for each to become ready.
    Start(StartArgs),
    /// Re-check each service's health without launching anything.
    Status(StatusArgs),
    /// Stop and remove all launched services, best-effort.
    Stop(StopArgs),
    /// Stop everything, then start fresh.
    Restart(StartArgs),
    /// Interactive troubleshooting menu (port conflicts, pruning, network).
    Fix(FixArgs),
}

#[derive(Debug, Args, Default)]
pub struct StartArgs {
    /// Only use the explicit --config path instead of searching parent directories.
    #[arg(
        long,
        help = "Skip config discovery; requires --config <PATH> (e.g. --config ./stevedore.toml)."
    )]
    pub skip_discovery: bool,

    /// Restrict the run to one service tier.
    #[arg(
        long,
        value_name = "TIER",
        value_parser = parse_tier,
        help = "Only operate on services in TIER (essential or advanced)"
    )]
    pub tier: Option<Tier>,

    /// Approve destructive remediations (e.g. killing a port's occupant) without prompting.
    #[arg(long, conflicts_with = "non_interactive", help = "Assume yes for remediation prompts")]
    pub yes: bool,

    /// Decline destructive remediations without prompting (for scripted runs).
    #[arg(long, help = "Assume no for remediation prompts; never block on stdin")]
    pub non_interactive: bool,
}

#[derive(Debug, Args, Default)]
pub struct StatusArgs {
    /// Only use the explicit --config path instead of searching parent directories.
    #[arg(
        long,
        help = "Skip config discovery; requires --config <PATH> (e.g. --config ./stevedore.toml)."
    )]
    pub skip_discovery: bool,
}

#[derive(Debug, Args, Default)]
pub struct StopArgs {
    /// Only use the explicit --config path instead of searching parent directories.
    #[arg(
        long,
        help = "Skip config discovery; requires --config <PATH> (e.g. --config ./stevedore.toml)."
    )]
    pub skip_discovery: bool,
}

#[derive(Debug, Args, Default)]
pub struct FixArgs {
    /// Only use the explicit --config path instead of searching parent directories.
    #[arg(
        long,
        help = "Skip config discovery; requires --config <PATH> (e.g. --config ./stevedore.toml)."
    )]
    pub skip_discovery: bool,
}

fn parse_tier(input: &str) -> Result<Tier, String> {
    Tier::parse(input)
        .ok_or_else(|| format!("unknown tier `{input}`; expected `essential` or `advanced`"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::{CommandFactory, error::ErrorKind};
    use std::path::Path;

    #[test]
    fn parse_start_defaults() {
        let cli = Cli::try_parse_from(["stevedore", "start"]).expect("parse start");
        let Commands::Start(args) = cli.command.expect("start command present") else {
            panic!("expected start command");
        };
        assert!(!args.skip_discovery);
        assert!(args.tier.is_none());
        assert!(!args.yes);
        assert!(!args.non_interactive);
        assert!(cli.config.is_none());
    }

    #[test]
    fn parse_start_with_tier_and_config() {
        let cli = Cli::try_parse_from([
            "stevedore",
            "--config",
            "/tmp/stevedore.toml",
            "start",
            "--tier",
            "essential",
            "--yes",
        ])
        .expect("parse start with flags");
        assert_eq!(
            cli.config.as_deref(),
            Some(Path::new("/tmp/stevedore.toml"))
        );
        let Commands::Start(args) = cli.command.expect("start command present") else {
            panic!("expected start command");
        };
        assert_eq!(args.tier, Some(Tier::Essential));
        assert!(args.yes);
    }

    #[test]
    fn start_rejects_unknown_tier() {
        let err = Cli::try_parse_from(["stevedore", "start", "--tier", "legendary"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
    }

    #[test]
    fn start_yes_conflicts_with_non_interactive() {
        let err = Cli::try_parse_from(["stevedore", "start", "--yes", "--non-interactive"])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentConflict);
    }

    #[test]
    fn parse_restart_reuses_start_args() {
        let cli = Cli::try_parse_from(["stevedore", "restart", "--tier", "advanced"])
            .expect("parse restart");
        let Commands::Restart(args) = cli.command.expect("restart command present") else {
            panic!("expected restart command");
        };
        assert_eq!(args.tier, Some(Tier::Advanced));
    }

    #[test]
    fn parse_status_skip_discovery_flag() {
        let cli = Cli::try_parse_from([
            "stevedore",
            "--config",
            "/tmp/stevedore.toml",
            "status",
            "--skip-discovery",
        ])
        .expect("parse status flags");
        let Commands::Status(args) = cli.command.expect("status command present") else {
            panic!("expected status command");
        };
        assert!(args.skip_discovery);
    }

    #[test]
    fn parse_stop_and_fix_defaults() {
        let cli = Cli::try_parse_from(["stevedore", "stop"]).expect("parse stop");
        assert!(matches!(cli.command, Some(Commands::Stop(_))));

        let cli = Cli::try_parse_from(["stevedore", "fix"]).expect("parse fix");
        assert!(matches!(cli.command, Some(Commands::Fix(_))));
    }

    #[test]
    fn command_reports_embedded_version_string() {
        let command = Cli::command();
        assert_eq!(command.get_version(), Some(env!("STEVEDORE_VERSION")));
    }
}
