//! Command-line interface implementation for mocra.
//! Provides argument parsing and help text formatting using clap.

use clap::{error::ErrorKind, CommandFactory, Parser};
use log::LevelFilter;
use std::path::PathBuf;

/// Command-line arguments structure for mocra.
#[derive(Parser, Debug)]
#[command(author, version, about = "mocra: provision hosting, DNS, GitHub and OAuth for a new Rails app", long_about = None)]
pub struct Args {
    /// Root directory of the generated Rails application
    #[arg(value_name = "APP_DIR")]
    pub app_dir: PathBuf,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Replay answers from a JSON or YAML list instead of prompting.
    /// Answers are consumed in the order the questions are asked: auth
    /// strategy, slice, repository visibility, then Twitter username and
    /// access. Lists that put the Twitter answers before the visibility
    /// answer are rejected.
    #[arg(short, long, value_name = "FILE")]
    pub answers: Option<PathBuf>,

    /// Only run read-only lookups; print what would be executed and written
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Configuration file to use instead of mocra.{json,yml,yaml} in APP_DIR
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl Args {
    /// `Debug` with `--verbose`, otherwise `Warn`: the action log is printed
    /// once at the end, so info-level action records stay quiet.
    pub fn log_level(&self) -> LevelFilter {
        if self.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Warn
        }
    }
}

/// Parses command line arguments and returns the Args structure.
///
/// # Exits
/// * With status code 1 if required arguments are missing
/// * With clap's default error handling for other argument errors
pub fn get_args() -> Args {
    match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            if e.kind() == ErrorKind::MissingRequiredArgument {
                // Exit status is 1 whether or not the help reached stdout.
                let _ = Args::command()
                    .help_template(
                        r#"{about-section}
{usage-heading} {usage}

{all-args}
{after-help}
"#,
                    )
                    .print_help();
                std::process::exit(1);
            } else {
                e.exit();
            }
        }
    }
}
