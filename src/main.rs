//! embedding-backfill CLI entry point.

use clap::Parser;

use embedding_backfill::cli::{handle_error, Cli};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(err) = embedding_backfill::cli::execute(&cli).await {
        handle_error(err, cli.json);
    }
}
