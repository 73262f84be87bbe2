//! Delete every user and copy from the store.
//!
//! This is irreversible, so the `--yes` flag is required:
//!   clear --yes

use anyhow::{anyhow, bail, Context, Result};
use copydesk::config::Config;
use copydesk::migration::clear_all;
use copydesk::status::check_status;
use copydesk::store::PgStore;
use tracing::info;

async fn run(store: &PgStore) -> Result<()> {
    let summary = clear_all(store).await.context("Failed to clear the store")?;
    let status = check_status(store)
        .await
        .context("Failed to verify the store is empty")?;

    println!();
    println!(
        "Deleted {} users and {} copies",
        summary.users_deleted, summary.copies_deleted
    );
    println!("Store now holds {}", status);
    println!();

    if status.has_data() {
        bail!("Store still holds records after clearing: {}", status);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("copydesk=info".parse()?),
        )
        .init();

    let confirmed = std::env::args().any(|arg| arg == "--yes" || arg == "-y");
    if !confirmed {
        bail!("Refusing to delete all users and copies without --yes");
    }

    let config = Config::from_env()?;
    info!("Clearing {}", config.redacted_database_url());
    let store = PgStore::connect(&config)
        .await
        .context("Failed to connect to the copy store")?;

    let result = tokio::select! {
        result = run(&store) => result,
        _ = tokio::signal::ctrl_c() => Err(anyhow!("Interrupted")),
    };

    store.close().await;
    result
}
