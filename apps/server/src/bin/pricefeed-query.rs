//! Command-line client for a pricefeed server.
//!
//! ```text
//! pricefeed-query --server <hex key> latest --pairs btc,eth
//! pricefeed-query --server <hex key> historical --pairs btc,xrp --from 0
//! ```

use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use pricefeed_core::utils::now_millis;
use pricefeed_rpc::{HttpTransport, PeerId, QueryClient, QueryError};
use serde::Serialize;

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Public key of the server to query (64 hex characters)
    #[arg(long, env = "PF_SERVER_KEY")]
    server: PeerId,

    /// Address of the server's transport endpoint
    #[arg(long, env = "PF_BOOTSTRAP_URL", default_value = "http://127.0.0.1:40001")]
    bootstrap: String,

    /// Per-call timeout in milliseconds
    #[arg(long, default_value_t = 5000)]
    timeout_ms: u64,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Latest average price per pair
    Latest(PairsArgs),

    /// Price history per pair; defaults to the last 24 hours
    Historical(HistoricalArgs),
}

#[derive(Args)]
struct PairsArgs {
    /// Comma-separated symbols, e.g. btc,eth
    #[arg(long, value_delimiter = ',')]
    pairs: Vec<String>,
}

#[derive(Args)]
struct HistoricalArgs {
    #[command(flatten)]
    pairs: PairsArgs,

    /// Start of the range, epoch milliseconds
    #[arg(long)]
    from: Option<i64>,

    /// End of the range, epoch milliseconds
    #[arg(long)]
    to: Option<i64>,
}

#[derive(Serialize)]
struct ErrorOutput {
    error: String,
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_result<T: Serialize>(result: Result<T, QueryError>) -> anyhow::Result<()> {
    match result {
        Ok(value) => print_json(&value),
        Err(e) => print_json(&ErrorOutput {
            error: e.to_string(),
        }),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let transport = Arc::new(HttpTransport::new(cli.bootstrap));
    let client =
        QueryClient::new(transport, cli.server).with_timeout(Duration::from_millis(cli.timeout_ms));

    match cli.cmd {
        Command::Latest(args) => print_result(client.get_latest_prices(args.pairs).await),
        Command::Historical(args) => {
            let to = args.to.unwrap_or_else(now_millis);
            let from = args.from.unwrap_or(to - DAY_MS);
            print_result(
                client
                    .get_historical_prices(args.pairs.pairs, from, Some(to))
                    .await,
            )
        }
    }
}
