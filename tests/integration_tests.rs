//! End-to-end flows over the in-memory store.
//!
//! The PostgreSQL store shares the `Store` contract, so these cover the
//! migration, status, clear and language fix pipelines without a database.

use copydesk::error::{MigrationError, StoreError};
use copydesk::i18n::{normalize, Language};
use copydesk::language_fix::{write_report, LanguageFixer, UnresolvedReason};
use copydesk::migration::{clear_all, MigrationRunner, MigrationState};
use copydesk::models::{NewCopy, NewUser, UserRole};
use copydesk::seed::Seed;
use copydesk::status::{check_status, StatusReport};
use copydesk::store::{MemoryStore, Store};
use tempfile::TempDir;

// ==================== Test Helpers ====================

fn decline(_: &StatusReport) -> bool {
    false
}

fn confirm(_: &StatusReport) -> bool {
    true
}

async fn seeded_store() -> MemoryStore {
    let store = MemoryStore::new();
    MigrationRunner::new(&store, Seed::initial())
        .migrate(&confirm)
        .await
        .expect("seed migration");
    store
}

// ==================== Migration Tests ====================

#[tokio::test]
async fn test_migrating_into_empty_store_inserts_seed_counts() {
    let store = MemoryStore::new();

    let outcome = MigrationRunner::new(&store, Seed::initial())
        .migrate(&decline)
        .await
        .expect("migrate");

    assert_eq!(outcome.state, MigrationState::Done);
    assert_eq!(
        check_status(&store).await.unwrap(),
        StatusReport {
            users_count: 4,
            copys_count: 5,
            is_complete: true
        }
    );
}

#[tokio::test]
async fn test_clear_all_then_check_status() {
    let store = seeded_store().await;

    clear_all(&store).await.expect("clear");

    let status = check_status(&store).await.unwrap();
    assert_eq!(
        status,
        StatusReport {
            users_count: 0,
            copys_count: 0,
            is_complete: false
        }
    );
}

#[tokio::test]
async fn test_declined_rerun_never_removes_records() {
    let store = MemoryStore::new();
    store
        .insert_users(&[NewUser::new("legacy", "legacy@example.com", UserRole::Reviewer, &["fr"])])
        .await
        .unwrap();
    store
        .insert_copies(&[NewCopy::new(Some("legacy.title"), "Ancien", "fr")])
        .await
        .unwrap();
    let before = check_status(&store).await.unwrap();

    let outcome = MigrationRunner::new(&store, Seed::initial())
        .migrate(&decline)
        .await
        .expect("migrate");

    assert!(!outcome.cleared);
    assert!(outcome.after.users_count >= before.users_count);
    assert!(outcome.after.copys_count >= before.copys_count);
    let users = store.list_users().await.unwrap();
    assert!(users.iter().any(|u| u.username == "legacy"));
}

#[tokio::test]
async fn test_declined_rerun_of_same_seed_is_bulk_insert_error() {
    let store = seeded_store().await;

    let err = MigrationRunner::new(&store, Seed::initial())
        .migrate(&decline)
        .await
        .unwrap_err();

    assert!(matches!(err, MigrationError::BulkInsert { .. }));
    assert_eq!(check_status(&store).await.unwrap(), StatusReport::new(4, 5));
}

#[tokio::test]
async fn test_confirmed_rerun_restores_seed() {
    let store = seeded_store().await;

    let outcome = MigrationRunner::new(&store, Seed::initial())
        .migrate(&confirm)
        .await
        .expect("migrate");

    assert!(outcome.cleared);
    assert_eq!(outcome.before, StatusReport::new(4, 5));
    assert_eq!(outcome.after, StatusReport::new(4, 5));
}

#[tokio::test]
async fn test_unreachable_store_fails_migration() {
    let store = MemoryStore::unreachable();

    let err = MigrationRunner::new(&store, Seed::initial())
        .migrate(&confirm)
        .await
        .unwrap_err();

    assert!(matches!(err, MigrationError::Persistence(StoreError::Connection(_))));
}

// ==================== Uniqueness Tests ====================

#[tokio::test]
async fn test_same_slug_and_language_rejected_by_store() {
    let store = MemoryStore::new();

    let err = store
        .insert_copies(&[
            NewCopy::new(Some("nav.home"), "Home", "en"),
            NewCopy::new(Some("nav.home"), "Start", "en"),
        ])
        .await
        .unwrap_err();

    assert!(matches!(err, StoreError::UniquenessViolation { .. }));
}

#[tokio::test]
async fn test_empty_slug_with_same_language_accepted() {
    let store = MemoryStore::new();

    let inserted = store
        .insert_copies(&[
            NewCopy::new(Some(""), "Home", "en"),
            NewCopy::new(Some(""), "Start", "en"),
        ])
        .await
        .expect("partial index exempts empty slugs");

    assert_eq!(inserted, 2);
}

// ==================== Language Fix Tests ====================

#[test]
fn test_normalizer_examples() {
    assert_eq!(normalize("ES_ES"), Some(Language::SPANISH));
    assert_eq!(normalize("klingon"), None);
}

#[tokio::test]
async fn test_language_fix_end_to_end() {
    let store = seeded_store().await;
    store
        .insert_copies(&[
            NewCopy::new(Some("checkout.pay"), "Pagar", "ES_ES"),
            NewCopy::new(Some("checkout.pay"), "Qapla'", "klingon"),
        ])
        .await
        .unwrap();

    let outcome = LanguageFixer::new(&store).run().await.expect("fix");
    let report = &outcome.report;

    assert_eq!(report.total_copys, 7);
    assert_eq!(report.invalid_language_copys, 2);
    assert_eq!(report.updated_copys, 1);
    assert_eq!(report.not_corrected(), 1);
    assert!(report.duplicates.is_empty());
    assert_eq!(outcome.unresolved.len(), 1);
    assert_eq!(outcome.unresolved[0].reason, UnresolvedReason::Unmappable);

    let copies = store.list_copies().await.unwrap();
    let pay: Vec<_> = copies
        .iter()
        .filter(|c| c.slug.as_deref() == Some("checkout.pay"))
        .map(|c| c.language.as_str())
        .collect();
    assert_eq!(pay, vec!["es", "klingon"]);

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("report.json");
    write_report(report, &path).expect("write report");

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).expect("read")).expect("parse");
    assert_eq!(json["totalCopys"], 7);
    assert_eq!(json["invalidLanguageCopys"], 2);
    assert_eq!(json["updatedCopys"], 1);
    assert!(json["duplicates"].as_array().expect("array").is_empty());
}

#[tokio::test]
async fn test_second_language_fix_pass_finds_nothing() {
    let store = MemoryStore::new();
    store
        .insert_copies(&[
            NewCopy::new(Some("a"), "Hallo", "Deutsch"),
            NewCopy::new(Some("b"), "Ciao", "it-IT"),
        ])
        .await
        .unwrap();

    let first = LanguageFixer::new(&store).run().await.unwrap();
    let second = LanguageFixer::new(&store).run().await.unwrap();

    assert_eq!(first.report.updated_copys, 2);
    assert_eq!(second.report.invalid_language_copys, 0);
    assert_eq!(second.report.updated_copys, 0);
}

#[tokio::test]
async fn test_language_fix_reports_legacy_duplicates() {
    let store = MemoryStore::with_legacy_copies(&[
        NewCopy::new(Some("home.title"), "Welcome", "en"),
        NewCopy::new(Some("home.title"), "Hello", "en"),
        NewCopy::new(Some("home.title"), "Hola", "ES_ES"),
        NewCopy::new(Some("nav.save"), "Save", "en"),
        NewCopy::new(Some("nav.save"), "Keep", "en"),
        NewCopy::new(Some("nav.save"), "Store", "en"),
        NewCopy::new(Some(""), "Draft", "en"),
        NewCopy::new(Some(""), "Draft again", "en"),
        NewCopy::new(Some("home.title"), "Hi", "English"),
    ]);

    let outcome = LanguageFixer::new(&store).run().await.expect("fix");
    let report = &outcome.report;

    assert_eq!(report.total_copys, 9);
    assert_eq!(report.invalid_language_copys, 2);
    assert_eq!(report.updated_copys, 1);
    assert_eq!(
        outcome.unresolved[0].reason,
        UnresolvedReason::WouldDuplicate { code: "en" }
    );

    let summary: Vec<_> = report
        .duplicates
        .iter()
        .map(|g| (g.slug.as_str(), g.language.as_str(), g.count))
        .collect();
    assert_eq!(summary, vec![("nav.save", "en", 3), ("home.title", "en", 2)]);

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("nested").join("report.json");
    write_report(report, &path).expect("write report");

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).expect("read")).expect("parse");
    let duplicates = json["duplicates"].as_array().expect("array");
    assert_eq!(duplicates.len(), 2);
    assert_eq!(duplicates[0]["slug"], "nav.save");
    assert_eq!(duplicates[0]["count"], 3);

    let details = duplicates[0]["details"].as_array().expect("details");
    let ids: Vec<_> = details.iter().map(|d| d["id"].as_i64().expect("id")).collect();
    assert_eq!(ids, vec![4, 5, 6]);
    assert_eq!(details[0]["text"], "Save");
    assert!(details[0]["createdAt"].is_string());

    assert_eq!(duplicates[1]["slug"], "home.title");
    assert_eq!(duplicates[1]["details"][1]["text"], "Hello");
}
