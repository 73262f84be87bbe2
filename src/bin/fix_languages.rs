//! Rewrite non-canonical copy languages and report duplicate slugs.
//!
//! Usage:
//!   fix-languages                      # report goes to $REPORT_DIR (default: reports/)
//!   fix-languages --report out.json    # explicit report path

use anyhow::{anyhow, bail, Context, Result};
use copydesk::config::Config;
use copydesk::language_fix::{default_report_path, write_report, LanguageFixer, UnresolvedReason};
use copydesk::store::PgStore;
use std::path::{Path, PathBuf};

fn report_path_from_args(args: &[String]) -> Result<Option<PathBuf>> {
    match args.iter().position(|arg| arg == "--report") {
        Some(index) => match args.get(index + 1) {
            Some(path) if !path.starts_with("--") => Ok(Some(PathBuf::from(path))),
            _ => bail!("--report needs a file path"),
        },
        None => Ok(None),
    }
}

async fn run(store: &PgStore, report_dir: &Path, report_path: Option<PathBuf>) -> Result<()> {
    let outcome = LanguageFixer::new(store)
        .run()
        .await
        .context("Language fix aborted")?;
    let report = &outcome.report;

    let path = report_path.unwrap_or_else(|| default_report_path(report_dir, report.timestamp));
    write_report(report, &path)?;

    println!();
    println!("========== LANGUAGE FIX SUMMARY ==========");
    println!("Copies checked:       {}", report.total_copys);
    println!("Invalid languages:    {}", report.invalid_language_copys);
    println!("Corrected:            {}", report.updated_copys);
    println!("Not corrected:        {}", report.not_corrected());
    println!("Duplicate groups:     {}", report.duplicates.len());
    println!("==========================================");
    if !store.has_slug_index() {
        println!("⚠️  The (slug, language) unique index is missing until these duplicates are resolved");
    }

    for item in &outcome.unresolved {
        match &item.reason {
            UnresolvedReason::Unmappable => {
                println!("  copy {}: '{}' has no mapping", item.id, item.language)
            }
            UnresolvedReason::WouldDuplicate { code } => println!(
                "  copy {}: '{}' -> '{}' would duplicate an existing entry",
                item.id, item.language, code
            ),
        }
    }
    for group in &report.duplicates {
        println!(
            "  duplicate ({}, {}) x{}",
            group.slug, group.language, group.count
        );
    }

    println!();
    println!("💾 Report saved to: {}", path.display());
    println!();

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

    let args: Vec<String> = std::env::args().skip(1).collect();
    let report_path = report_path_from_args(&args)?;

    let config = Config::from_env()?;
    let store = PgStore::connect(&config)
        .await
        .context("Failed to connect to the copy store")?;

    let result = tokio::select! {
        result = run(&store, &config.report_dir, report_path) => result,
        _ = tokio::signal::ctrl_c() => Err(anyhow!("Interrupted")),
    };

    store.close().await;
    result
}
