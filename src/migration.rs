//! One-shot seed migration.
//!
//! The runner walks a small state machine:
//!
//! ```text
//! Idle ──(store empty)──────────────────────────────► Inserting
//! Idle ──(store has data)──► AwaitingClearConfirmation
//!     AwaitingClearConfirmation ──(confirm)──► Clearing ──► Inserting
//!     AwaitingClearConfirmation ──(decline)──────────────► Inserting
//! Inserting ──► Verifying ──► Done | Failed
//! any store failure ──► Failed
//! ```
//!
//! Declining the clear appends the seed to existing data. Seed entries whose
//! `(slug, language)` already exists make the copy insert fail as a whole.

use crate::error::{MigrationError, StoreError};
use crate::seed::Seed;
use crate::status::{check_status, StatusReport};
use crate::store::{Store, COPIES, USERS};
use async_trait::async_trait;
use std::fmt;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationState {
    Idle,
    AwaitingClearConfirmation,
    Clearing,
    Inserting,
    Verifying,
    Done,
    Failed,
}

impl fmt::Display for MigrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MigrationState::Idle => "idle",
            MigrationState::AwaitingClearConfirmation => "awaiting clear confirmation",
            MigrationState::Clearing => "clearing",
            MigrationState::Inserting => "inserting",
            MigrationState::Verifying => "verifying",
            MigrationState::Done => "done",
            MigrationState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Decides whether existing data is wiped before seeding.
///
/// Any `Fn(&StatusReport) -> bool` closure works, which keeps the runner
/// testable without a terminal.
#[async_trait]
pub trait ClearDecision: Send + Sync {
    async fn should_clear(&self, existing: &StatusReport) -> bool;
}

#[async_trait]
impl<F> ClearDecision for F
where
    F: Fn(&StatusReport) -> bool + Send + Sync,
{
    async fn should_clear(&self, existing: &StatusReport) -> bool {
        self(existing)
    }
}

/// Number of records removed by a clear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClearSummary {
    pub users_deleted: u64,
    pub copies_deleted: u64,
}

/// Result of a migration run that reached `Done` or `Failed` without error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationOutcome {
    pub state: MigrationState,
    pub before: StatusReport,
    pub after: StatusReport,
    pub cleared: bool,
    pub users_inserted: u64,
    pub copies_inserted: u64,
}

impl MigrationOutcome {
    pub fn is_complete(&self) -> bool {
        self.state == MigrationState::Done
    }
}

/// Delete every copy entry and user. Safe to call on an empty store.
pub async fn clear_all<S: Store + ?Sized>(store: &S) -> Result<ClearSummary, StoreError> {
    let copies_deleted = store.delete_all_copies().await?;
    let users_deleted = store.delete_all_users().await?;
    info!(
        "Cleared {} copies and {} users",
        copies_deleted, users_deleted
    );
    Ok(ClearSummary {
        users_deleted,
        copies_deleted,
    })
}

pub struct MigrationRunner<'a, S: Store + ?Sized> {
    store: &'a S,
    seed: Seed,
    state: MigrationState,
}

impl<'a, S: Store + ?Sized> MigrationRunner<'a, S> {
    pub fn new(store: &'a S, seed: Seed) -> Self {
        Self {
            store,
            seed,
            state: MigrationState::Idle,
        }
    }

    pub fn state(&self) -> MigrationState {
        self.state
    }

    /// Drive the state machine once.
    ///
    /// Returns `Ok` with a `Done` or `Failed` outcome when every store call
    /// succeeded (`Failed` then means the verification counts were zero).
    /// Store failures abort the run: an unreachable store is
    /// [`MigrationError::Persistence`], a rejected bulk insert is
    /// [`MigrationError::BulkInsert`]. Nothing is retried or rolled back.
    pub async fn migrate<D: ClearDecision + ?Sized>(
        &mut self,
        decision: &D,
    ) -> Result<MigrationOutcome, MigrationError> {
        self.state = MigrationState::Idle;

        match self.run(decision).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                self.transition(MigrationState::Failed);
                error!("Migration failed: {}", e);
                Err(e)
            }
        }
    }

    pub async fn check_status(&self) -> Result<StatusReport, StoreError> {
        check_status(self.store).await
    }

    pub async fn clear_all(&self) -> Result<ClearSummary, StoreError> {
        clear_all(self.store).await
    }

    async fn run<D: ClearDecision + ?Sized>(
        &mut self,
        decision: &D,
    ) -> Result<MigrationOutcome, MigrationError> {
        let before = self.check_status().await?;
        info!("Store before migration: {}", before);

        let mut cleared = false;
        if before.has_data() {
            self.transition(MigrationState::AwaitingClearConfirmation);
            if decision.should_clear(&before).await {
                self.transition(MigrationState::Clearing);
                self.clear_all().await?;
                cleared = true;
            } else {
                warn!("Keeping existing data; seed records will be appended");
            }
        }

        self.transition(MigrationState::Inserting);
        let users_inserted = self
            .store
            .insert_users(&self.seed.users)
            .await
            .map_err(|e| insert_error(USERS, e))?;
        info!("Inserted {} users", users_inserted);

        let copies_inserted = self
            .store
            .insert_copies(&self.seed.copies)
            .await
            .map_err(|e| insert_error(COPIES, e))?;
        info!("Inserted {} copies", copies_inserted);

        self.transition(MigrationState::Verifying);
        let after = self.check_status().await?;
        info!("Store after migration: {}", after);

        if after.is_complete {
            self.transition(MigrationState::Done);
        } else {
            self.transition(MigrationState::Failed);
            error!("Verification found an empty collection after inserting the seed");
        }

        Ok(MigrationOutcome {
            state: self.state,
            before,
            after,
            cleared,
            users_inserted,
            copies_inserted,
        })
    }

    fn transition(&mut self, next: MigrationState) {
        info!("Migration state: {} -> {}", self.state, next);
        self.state = next;
    }
}

fn insert_error(collection: &'static str, err: StoreError) -> MigrationError {
    if err.is_connection() {
        MigrationError::Persistence(err)
    } else {
        MigrationError::BulkInsert {
            collection,
            source: err,
        }
    }
}
