// src/cli.rs
use chrono::NaiveDate;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Replay and inspect the appointment page's interactive behaviour", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Write tabular output as CSV instead of a table
    #[arg(long, global = true)]
    pub export_csv: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKindCli {
    Name,
    Phone,
}

// Accepts "today" or YYYY-MM-DD
fn parse_date_arg(input: &str) -> Result<NaiveDate, String> {
    if input.trim().eq_ignore_ascii_case("today") {
        return Ok(booking_page_lib::local_today());
    }
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map_err(|_| format!("'{input}' is not a date (expected YYYY-MM-DD or 'today')"))
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List every (element, event) -> handler binding set up at page load
    Bindings {
        /// HTML page to load (defaults to the built-in reference page)
        #[arg(short, long)]
        page: Option<PathBuf>,
        /// Day the page is opened on (YYYY-MM-DD or 'today')
        #[arg(long, value_parser = parse_date_arg)]
        today: Option<NaiveDate>,
    },
    /// Replay an interaction script and show the page state after each step
    Simulate {
        /// TOML script with [[step]] entries
        script: PathBuf,
        /// HTML page to load (defaults to the built-in reference page)
        #[arg(short, long)]
        page: Option<PathBuf>,
        /// Day the page is opened on (YYYY-MM-DD or 'today')
        #[arg(long, value_parser = parse_date_arg)]
        today: Option<NaiveDate>,
        /// Also list the events each step dispatched
        #[arg(short, long)]
        verbose: bool,
    },
    /// Filter text the way typing into a field would
    Sanitize {
        #[arg(value_enum)]
        kind: FieldKindCli,
        text: String,
    },
    /// Check whether pasting text into a field would be accepted
    CheckPaste {
        #[arg(value_enum)]
        kind: FieldKindCli,
        text: String,
    },
    /// Show the bookable date window
    DateRange {
        /// Day the window starts on (YYYY-MM-DD or 'today')
        #[arg(long, value_parser = parse_date_arg)]
        today: Option<NaiveDate>,
        /// Report whether this date can be booked
        #[arg(long, value_parser = parse_date_arg)]
        check: Option<NaiveDate>,
    },
    /// Show the path to the configuration file
    ConfigPath,
    /// Generate shell completion scripts
    GenerateCompletion {
        #[arg(value_enum)]
        shell: Shell,
    },
}

// Function to parse CLI arguments
pub fn parse_args() -> Cli {
    Cli::parse()
}

pub fn build_cli_command() -> clap::Command {
    Cli::command()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_simulate_with_global_csv_flag() {
        let cli = Cli::try_parse_from([
            "booking-page",
            "simulate",
            "flow.toml",
            "--today",
            "2026-10-19",
            "--export-csv",
        ])
        .unwrap();
        assert!(cli.export_csv);
        match cli.command {
            Commands::Simulate { script, today, .. } => {
                assert_eq!(script, PathBuf::from("flow.toml"));
                assert_eq!(today, NaiveDate::from_ymd_opt(2026, 10, 19));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn rejects_bad_dates() {
        assert!(parse_date_arg("19/10/2026").is_err());
        assert!(parse_date_arg("today").is_ok());
    }
}
