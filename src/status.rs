use crate::error::StoreError;
use crate::store::Store;
use serde::Serialize;
use std::fmt;

/// Snapshot of how many records the store holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub users_count: u64,
    pub copys_count: u64,
    pub is_complete: bool,
}

impl StatusReport {
    pub fn new(users_count: u64, copys_count: u64) -> Self {
        Self {
            users_count,
            copys_count,
            is_complete: users_count > 0 && copys_count > 0,
        }
    }

    /// Whether either collection holds any record.
    pub fn has_data(&self) -> bool {
        self.users_count > 0 || self.copys_count > 0
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} users, {} copies ({})",
            self.users_count,
            self.copys_count,
            if self.is_complete {
                "complete"
            } else {
                "incomplete"
            }
        )
    }
}

/// Count both collections. Always a fresh read.
pub async fn check_status<S: Store + ?Sized>(store: &S) -> Result<StatusReport, StoreError> {
    let users_count = store.count_users().await?;
    let copys_count = store.count_copies().await?;
    Ok(StatusReport::new(users_count, copys_count))
}
