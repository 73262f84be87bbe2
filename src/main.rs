//! Seed migration: load the initial users and copies into the store.
//!
//! Usage:
//!   copydesk-migrate          # prompt before clearing existing data
//!   copydesk-migrate --yes    # clear existing data without asking
//!   copydesk-migrate --keep   # keep existing data and append the seed
//!
//! Environment:
//! - DATABASE_URL (defaults to postgres://localhost:5432/copydesk)
//! - DATABASE_NAME (optional override)

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use copydesk::config::Config;
use copydesk::migration::{ClearDecision, MigrationRunner};
use copydesk::seed::Seed;
use copydesk::status::StatusReport;
use copydesk::store::PgStore;
use std::future::Future;
use std::io::Write;
use tracing::{info, warn};

/// Asks the operator on the terminal, unless a flag already answered.
struct TerminalPrompt {
    preset: Option<bool>,
}

impl TerminalPrompt {
    fn from_args(args: &[String]) -> Result<Self> {
        let yes = args.iter().any(|arg| arg == "--yes" || arg == "-y");
        let keep = args.iter().any(|arg| arg == "--keep");

        let preset = match (yes, keep) {
            (true, true) => bail!("--yes and --keep cannot be combined"),
            (true, false) => Some(true),
            (false, true) => Some(false),
            (false, false) => None,
        };
        Ok(Self { preset })
    }
}

fn read_answer() -> std::io::Result<String> {
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(line)
}

#[async_trait]
impl ClearDecision for TerminalPrompt {
    async fn should_clear(&self, existing: &StatusReport) -> bool {
        if let Some(answer) = self.preset {
            info!("Clear decided by flag: {}", if answer { "clear" } else { "keep" });
            return answer;
        }

        println!();
        println!(
            "The store already holds {} users and {} copies.",
            existing.users_count, existing.copys_count
        );
        print!("Delete ALL users and copies before migrating? This cannot be undone. [y/N] ");
        let _ = std::io::stdout().flush();

        // Read on a blocking thread so Ctrl+C is still observed while waiting.
        match tokio::task::spawn_blocking(read_answer).await {
            Ok(Ok(line)) => matches!(line.trim().to_lowercase().as_str(), "y" | "yes"),
            Ok(Err(e)) => {
                warn!("Could not read answer ({}), keeping existing data", e);
                false
            }
            Err(e) => {
                warn!("Prompt task failed ({}), keeping existing data", e);
                false
            }
        }
    }
}

async fn run(store: &PgStore, prompt: &TerminalPrompt) -> Result<()> {
    let mut runner = MigrationRunner::new(store, Seed::initial());
    let outcome = runner.migrate(prompt).await.context("Migration aborted")?;

    println!();
    println!("========== MIGRATION SUMMARY ==========");
    println!("Before:   {}", outcome.before);
    println!("Cleared:  {}", if outcome.cleared { "yes" } else { "no" });
    println!("Inserted: {} users, {} copies", outcome.users_inserted, outcome.copies_inserted);
    println!("After:    {}", outcome.after);
    println!("State:    {}", outcome.state);
    println!("========================================");
    println!();

    if !outcome.is_complete() {
        bail!("Migration did not complete: {}", outcome.after);
    }

    info!("✓ Migration complete");
    Ok(())
}

/// Drive `job` to completion, then drop the runtime without waiting on
/// blocking tasks. A prompt still reading stdin after an interrupt would
/// otherwise keep the process alive until the operator pressed Enter.
fn block_on_detached<F>(job: F) -> Result<()>
where
    F: Future<Output = Result<()>>,
{
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start the async runtime")?;
    let result = runtime.block_on(job);
    runtime.shutdown_background();
    result
}

async fn migrate(prompt: TerminalPrompt) -> Result<()> {
    let config = Config::from_env()?;
    let store = PgStore::connect(&config)
        .await
        .context("Failed to connect to the copy store")?;

    let result = tokio::select! {
        result = run(&store, &prompt) => result,
        _ = tokio::signal::ctrl_c() => Err(anyhow!("Interrupted, migration aborted")),
    };

    store.close().await;
    result
}

fn main() -> Result<()> {
    // Load .env file (ignored when absent)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("copydesk=info".parse()?),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let prompt = TerminalPrompt::from_args(&args)?;

    block_on_detached(migrate(prompt))
}
