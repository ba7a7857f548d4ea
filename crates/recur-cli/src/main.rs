use clap::Parser;
use owo_colors::{OwoColorize, Style};
use recur_core::error::CoreError;
use tracing::{debug, warn};
use tracing_subscriber::{filter::LevelFilter, EnvFilter};

mod cli;
mod commands;
mod config;
mod parser;
mod timezone;
mod views;

fn main() {
    let cli = cli::Cli::parse();
    init_tracing(cli.verbose);

    let config = config::Config::new().unwrap_or_else(|e| {
        warn!(error = %e, "could not load configuration, using defaults");
        config::Config::default()
    });
    debug!(?config, "loaded configuration");

    let result = match cli.command {
        cli::Commands::Encode(command) => commands::encode::encode_rule(command),
        cli::Commands::Decode(command) => commands::inspect::decode_rule(command),
        cli::Commands::Validate(command) => commands::inspect::validate_rule(command),
        cli::Commands::Between(command) => {
            commands::project::occurrences_between(command, &config)
        }
        cli::Commands::Last(command) => commands::project::last_occurrence(command, &config),
    };

    if let Err(e) = result {
        handle_error(e);
        std::process::exit(1);
    }
}

/// Logs go to stderr so that stdout stays parseable. `RUST_LOG` refines the
/// default level.
fn init_tracing(verbose: bool) {
    let level = if verbose { LevelFilter::DEBUG } else { LevelFilter::WARN };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn handle_error(err: anyhow::Error) {
    let error_style = Style::new().red().bold();

    if let Some(core_error) = err.downcast_ref::<CoreError>() {
        match core_error {
            CoreError::InvalidRule(violations) => {
                eprintln!("{}", "Error: Invalid recurrence rule.".style(error_style));
                for violation in violations {
                    eprintln!("  - {}", violation.yellow());
                }
            }
            CoreError::InvalidTimezone(name) => {
                eprintln!(
                    "{} Unknown timezone '{}'",
                    "Error:".style(error_style),
                    name.yellow()
                );
                eprintln!("Did you mean one of these?");
                for suggestion in timezone::suggest_timezone(name) {
                    eprintln!("  {}", suggestion);
                }
            }
            CoreError::InvalidWindow { from, to } => {
                eprintln!(
                    "{} Window start {} is after its end {}",
                    "Error:".style(error_style),
                    from.yellow(),
                    to.yellow()
                );
            }
            CoreError::InvalidInput(s) => {
                eprintln!("{} Invalid input: {}", "Error:".style(error_style), s);
            }
            _ => eprintln!("{} {}", "Error:".style(error_style), core_error),
        }
    } else {
        eprintln!("{} {:#}", "Error:".style(error_style), err);
    }
}
