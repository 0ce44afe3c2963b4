use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::time::SystemTime;

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::Result;
use crate::cli::StatusArgs;
use crate::core::operations::{self, Environment};
use crate::core::options::StatusOptions;
use crate::core::outcome::{ServiceHealthRow, StatusOutcome};
use crate::core::project::format_config_warnings;

use super::common::{config_load_options, emit_diagnostics, split_config_warnings};
use super::display::colorize;

pub fn handle_status(args: StatusArgs, config_override: Option<&PathBuf>) -> Result<()> {
    let options = StatusOptions {
        config: config_load_options(config_override, args.skip_discovery, "status")?,
    };

    let env = Environment::host();
    let output = operations::status(&env, options, None)?;

    let (config_warnings, other) = split_config_warnings(&output.diagnostics);
    if let Some(message) = format_config_warnings(&config_warnings) {
        eprint!("{message}");
    }
    emit_diagnostics(&other);

    print_status_table(&output.value);
    Ok(())
}

pub fn print_status_table(outcome: &StatusOutcome) {
    println!(
        "Project: {} (checked at {})",
        outcome.project_name,
        format_checked_at(outcome.checked_at)
    );
    println!();

    if outcome.rows.is_empty() {
        println!("No services defined in configuration.");
        return;
    }

    let use_color = io::stdout().is_terminal();
    let rows = &outcome.rows;

    let name_width = rows
        .iter()
        .map(|row| row.name.len())
        .max()
        .unwrap_or(4)
        .max("SERVICE".len());
    let tier_width = rows
        .iter()
        .map(|row| row.tier.as_str().len())
        .max()
        .unwrap_or(4)
        .max("TIER".len());
    let url_width = rows
        .iter()
        .map(|row| row.url.len())
        .max()
        .unwrap_or(3)
        .max("URL".len());
    let reachable_width = rows
        .iter()
        .map(|row| reachable_label(row).len())
        .max()
        .unwrap_or(2)
        .max("REACHABLE".len());

    println!(
        "{:<name_width$}  {:<tier_width$}  {:<url_width$}  {:<reachable_width$}  {}",
        "SERVICE",
        "TIER",
        "URL",
        "REACHABLE",
        "DETAIL",
        name_width = name_width,
        tier_width = tier_width,
        url_width = url_width,
        reachable_width = reachable_width,
    );

    for row in rows {
        let reachable = style_reachable(row, reachable_width, use_color);
        println!(
            "{:<name_width$}  {:<tier_width$}  {:<url_width$}  {}  {}",
            row.name,
            row.tier.as_str(),
            row.url,
            reachable,
            row.detail,
            name_width = name_width,
            tier_width = tier_width,
            url_width = url_width,
        );
    }

    println!();
    println!(
        "Legend: REACHABLE yes = endpoint answered per the service's readiness rule; no = connection refused or unaccepted status."
    );
    println!("Exit codes: status always exits 0.");
}

fn reachable_label(row: &ServiceHealthRow) -> &'static str {
    if row.reachable { "yes" } else { "no" }
}

fn style_reachable(row: &ServiceHealthRow, width: usize, colored: bool) -> String {
    let padded = format!("{:<width$}", reachable_label(row), width = width);
    let code = if row.reachable { "32" } else { "31" };
    colorize(&padded, code, colored)
}

fn format_checked_at(time: SystemTime) -> String {
    let datetime: OffsetDateTime = time.into();
    match datetime.format(&Rfc3339) {
        Ok(formatted) => formatted,
        Err(_) => "<invalid timestamp>".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Tier;
    use regex::Regex;

    #[test]
    fn reachable_label_tracks_probe_outcome() {
        let row = ServiceHealthRow {
            name: "n8n".to_string(),
            tier: Tier::Essential,
            port: 5678,
            url: "http://localhost:5678".to_string(),
            reachable: true,
            detail: "http 200".to_string(),
        };
        assert_eq!(reachable_label(&row), "yes");
    }

    #[test]
    fn checked_at_renders_as_rfc3339() {
        let formatted = format_checked_at(SystemTime::UNIX_EPOCH);
        let pattern = Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}").unwrap();
        assert!(pattern.is_match(&formatted), "unexpected format: {formatted}");
    }
}
