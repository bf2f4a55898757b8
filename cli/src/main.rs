//! hopfx command-line converter
//!
//! Prompts for a base currency, a target currency and an amount, and prints
//! the converted amount until stdin closes or the user types `quit`.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use hopfx_fx::{RateResolver, ResolverConfig};
use tokio::io::BufReader;
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod session;

use session::{parse_amount, Session};

/// hopfx CLI
#[derive(Parser, Debug)]
#[command(name = "hopfx")]
#[command(about = "Convert amounts between currencies")]
struct Args {
    /// Simulated rate fetch delay in milliseconds
    #[arg(long, global = true)]
    delay_ms: Option<u64>,

    /// JSON file with rate entries, instead of the built-in seed
    #[arg(long, global = true)]
    rates_file: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Prompt for conversions until EOF or `quit` (default)
    Interactive,
    /// Convert a single amount and exit
    Convert {
        base: String,
        target: String,
        #[arg(allow_hyphen_values = true)]
        amount: String,
    },
    /// List the loaded rate table
    Rates,
}

fn init_logging(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| fmt::layer().json().with_writer(std::io::stderr)))
        .with((!json).then(|| fmt::layer().with_writer(std::io::stderr)))
        .init();
}

fn load_config(args: &Args) -> anyhow::Result<ResolverConfig> {
    let mut config = ResolverConfig::from_env();

    if let Some(ms) = args.delay_ms {
        config.load_delay = Duration::from_millis(ms);
    }
    if let Some(path) = &args.rates_file {
        config.rates_file = Some(path.clone());
    }

    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;

    init_logging(&config.log_level, args.json_logs);
    info!(?config, "Starting hopfx");

    let resolver = RateResolver::from_config(&config);

    match args.command.unwrap_or(Command::Interactive) {
        Command::Interactive => {
            let stdin = BufReader::new(tokio::io::stdin());
            let summary = Session::new(&resolver, stdin, tokio::io::stdout()).run().await?;
            info!(
                conversions = summary.conversions,
                misses = summary.misses,
                "Session ended"
            );
        }
        Command::Convert {
            base,
            target,
            amount,
        } => {
            let amount = parse_amount(&amount)?;
            let value = resolver.convert(base.as_str(), target.as_str(), amount).await;
            println!("{}", value.normalize());
        }
        Command::Rates => {
            let table = resolver.ensure_loaded().await.map_err(|e| {
                error!(error = %e, "Could not load rates");
                e
            })?;
            for entry in table.entries() {
                println!("{}\t{}", entry.pair(), entry.rate.normalize());
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_accepts_negative_amount() {
        let args = Args::try_parse_from(["hopfx", "convert", "EUR", "USD", "-5"]).unwrap();

        match args.command {
            Some(Command::Convert { amount, .. }) => assert_eq!(amount, "-5"),
            other => panic!("expected convert command, got {other:?}"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args =
            Args::try_parse_from(["hopfx", "rates", "--delay-ms", "0", "--json-logs"]).unwrap();

        assert_eq!(args.delay_ms, Some(0));
        assert!(args.json_logs);
        assert!(matches!(args.command, Some(Command::Rates)));
    }
}
