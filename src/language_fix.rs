//! Reconcile stored copy languages to canonical codes and report duplicates.
//!
//! Unmappable labels are logged, counted and skipped; the pass always runs to
//! the end. Only store failures other than a uniqueness clash abort it.

use crate::duplicates::{find_duplicates, DuplicateGroup};
use crate::error::StoreError;
use crate::i18n::{is_canonical, normalize};
use crate::store::Store;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// The report written to disk after every pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageFixReport {
    pub timestamp: DateTime<Utc>,
    pub total_copys: usize,
    pub invalid_language_copys: usize,
    pub updated_copys: usize,
    pub duplicates: Vec<DuplicateGroup>,
}

impl LanguageFixReport {
    /// Invalid entries left as they were.
    pub fn not_corrected(&self) -> usize {
        self.invalid_language_copys - self.updated_copys
    }
}

/// Why an invalid language could not be rewritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnresolvedReason {
    /// No mapping exists for the label.
    Unmappable,
    /// The canonical code would duplicate an existing `(slug, language)`.
    WouldDuplicate { code: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedLanguage {
    pub id: i64,
    pub language: String,
    pub reason: UnresolvedReason,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LanguageFixOutcome {
    pub report: LanguageFixReport,
    pub unresolved: Vec<UnresolvedLanguage>,
}

pub struct LanguageFixer<'a, S: Store + ?Sized> {
    store: &'a S,
}

impl<'a, S: Store + ?Sized> LanguageFixer<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Rewrite every non-canonical language that can be mapped, then look
    /// for duplicate `(slug, language)` groups in the updated data.
    pub async fn run(&self) -> Result<LanguageFixOutcome, StoreError> {
        let copies = self.store.list_copies().await?;
        info!("Checking languages of {} copies", copies.len());

        let mut invalid = 0;
        let mut updated = 0;
        let mut unresolved = Vec::new();

        for copy in copies.iter().filter(|c| !is_canonical(&c.language)) {
            invalid += 1;

            let Some(lang) = normalize(&copy.language) else {
                warn!(
                    "Copy {}: language '{}' cannot be mapped, leaving it unchanged",
                    copy.id, copy.language
                );
                unresolved.push(UnresolvedLanguage {
                    id: copy.id,
                    language: copy.language.clone(),
                    reason: UnresolvedReason::Unmappable,
                });
                continue;
            };

            match self.store.set_copy_language(copy.id, lang.code()).await {
                Ok(true) => {
                    info!(
                        "Copy {}: '{}' -> '{}' ({})",
                        copy.id,
                        copy.language,
                        lang,
                        lang.name()
                    );
                    updated += 1;
                }
                Ok(false) => {
                    warn!("Copy {} disappeared before it could be updated", copy.id);
                }
                Err(StoreError::UniquenessViolation { key, .. }) => {
                    warn!(
                        "Copy {}: rewriting '{}' to '{}' would duplicate {}",
                        copy.id, copy.language, lang, key
                    );
                    unresolved.push(UnresolvedLanguage {
                        id: copy.id,
                        language: copy.language.clone(),
                        reason: UnresolvedReason::WouldDuplicate { code: lang.code() },
                    });
                }
                Err(e) => return Err(e),
            }
        }

        let duplicates = find_duplicates(&self.store.list_copies().await?);
        if !duplicates.is_empty() {
            warn!(
                "Found {} duplicate (slug, language) groups",
                duplicates.len()
            );
        }

        Ok(LanguageFixOutcome {
            report: LanguageFixReport {
                timestamp: Utc::now(),
                total_copys: copies.len(),
                invalid_language_copys: invalid,
                updated_copys: updated,
                duplicates,
            },
            unresolved,
        })
    }
}

/// `<dir>/language-fix-<UTC timestamp>.json`
pub fn default_report_path(dir: &Path, timestamp: DateTime<Utc>) -> PathBuf {
    dir.join(format!(
        "language-fix-{}.json",
        timestamp.format("%Y%m%dT%H%M%SZ")
    ))
}

/// Write the report as pretty-printed JSON, creating parent directories.
pub fn write_report(report: &LanguageFixReport, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .context(format!("Failed to create report directory {}", parent.display()))?;
    }

    let json = serde_json::to_string_pretty(report).context("Failed to serialize report")?;
    fs::write(path, json).context(format!("Failed to write report to {}", path.display()))?;

    info!("Report written to {}", path.display());
    Ok(())
}
