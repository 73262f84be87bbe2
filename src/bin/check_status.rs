//! Report how many users and copies the store holds.
//!
//! Usage:
//!   status            # human-readable summary
//!   status --json     # {"usersCount":..,"copysCount":..,"isComplete":..}

use anyhow::{anyhow, Context, Result};
use copydesk::config::Config;
use copydesk::status::check_status;
use copydesk::store::PgStore;

async fn run(store: &PgStore, json: bool) -> Result<()> {
    let status = check_status(store)
        .await
        .context("Failed to read record counts")?;

    if json {
        println!("{}", serde_json::to_string(&status)?);
        return Ok(());
    }

    println!();
    println!("Users:  {}", status.users_count);
    println!("Copies: {}", status.copys_count);
    if status.is_complete {
        println!("✓ Migration complete");
    } else {
        println!("✗ Migration incomplete, run copydesk-migrate");
    }
    println!();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("copydesk=warn".parse()?),
        )
        .init();

    let json = std::env::args().any(|arg| arg == "--json");

    let config = Config::from_env()?;
    let store = PgStore::connect(&config)
        .await
        .context("Failed to connect to the copy store")?;

    let result = tokio::select! {
        result = run(&store, json) => result,
        _ = tokio::signal::ctrl_c() => Err(anyhow!("Interrupted")),
    };

    store.close().await;
    result
}
