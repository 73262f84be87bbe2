//! Persistence seam for users and copy entries.
//!
//! The tools only need a small slice of a document store: counting, bulk
//! inserts, bulk deletes, listing copies and rewriting a copy's language.
//! [`PgStore`] backs this with PostgreSQL; [`MemoryStore`] keeps everything in
//! process and is what the tests run against.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use crate::error::StoreError;
use crate::models::{CopyEntry, NewCopy, NewUser, User};
use async_trait::async_trait;

/// Table holding copy entries.
pub const COPIES: &str = "copies";

/// Table holding users.
pub const USERS: &str = "users";

#[async_trait]
pub trait Store: Send + Sync {
    async fn count_users(&self) -> Result<u64, StoreError>;

    async fn count_copies(&self) -> Result<u64, StoreError>;

    /// Insert all users or none of them. Returns the number inserted.
    async fn insert_users(&self, users: &[NewUser]) -> Result<u64, StoreError>;

    /// Insert all copies or none of them. Returns the number inserted.
    ///
    /// Two entries with the same non-empty slug and the same language are a
    /// [`StoreError::UniquenessViolation`], whether they collide with stored
    /// rows or with each other. Empty or absent slugs never collide.
    async fn insert_copies(&self, copies: &[NewCopy]) -> Result<u64, StoreError>;

    /// Delete every user. Returns the number deleted.
    async fn delete_all_users(&self) -> Result<u64, StoreError>;

    /// Delete every copy entry. Returns the number deleted.
    async fn delete_all_copies(&self) -> Result<u64, StoreError>;

    async fn list_users(&self) -> Result<Vec<User>, StoreError>;

    /// All copy entries in insertion order.
    async fn list_copies(&self) -> Result<Vec<CopyEntry>, StoreError>;

    /// Overwrite the language of one copy entry and bump its `updated_at`.
    ///
    /// Returns `false` when no entry has that id.
    async fn set_copy_language(&self, id: i64, language: &str) -> Result<bool, StoreError>;
}
