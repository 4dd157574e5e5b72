//! player-lookup - resolve player ids and names from the command line

use clap::{Parser, Subcommand};
use futures::future::join_all;
use player_identity::{
    metrics, IdentityCache, MojangProfileClient, PlayerId, ResolverConfig, TieredResolver,
};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "player-lookup", version, about = "Resolve player ids and names")]
struct Cli {
    /// Print Prometheus metrics after the lookups
    #[arg(long)]
    metrics: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve ids (dashless or hyphenated) to names
    Name {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Resolve names to ids
    Id {
        #[arg(required = true)]
        names: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "player_identity=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    // Load configuration
    let config = ResolverConfig::from_env()?;
    let profiles = Arc::new(MojangProfileClient::new(&config)?);
    let cache = IdentityCache::new(TieredResolver::profile_only(profiles));

    let outcomes = match cli.command {
        Command::Name { ids } => {
            let lookups = ids.into_iter().map(|raw| {
                let cache = cache.clone();
                async move {
                    let id: PlayerId = match raw.parse() {
                        Ok(id) => id,
                        Err(e) => return (raw, Err(format!("invalid id: {}", e))),
                    };
                    let result = cache.resolve_name(id).await;
                    (raw, result.map(|name| name.to_string()).map_err(|e| e.to_string()))
                }
            });
            join_all(lookups).await
        }
        Command::Id { names } => {
            let lookups = names.into_iter().map(|name| {
                let resolution = cache.resolve_id(&name);
                async move {
                    let result = resolution.await;
                    (name, result.map(|id| id.to_string()).map_err(|e| e.to_string()))
                }
            });
            join_all(lookups).await
        }
    };

    let mut failed = false;
    for (input, outcome) in outcomes {
        match outcome {
            Ok(output) => println!("{} -> {}", input, output),
            Err(e) => {
                failed = true;
                println!("{}: {}", input, e);
            }
        }
    }

    if cli.metrics {
        print!("{}", metrics::render_metrics());
    }

    Ok(if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}
