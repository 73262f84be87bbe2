use super::{Store, COPIES, USERS};
use crate::error::StoreError;
use crate::models::{CopyEntry, NewCopy, NewUser, User};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct MemoryState {
    next_id: i64,
    users: Vec<User>,
    copies: Vec<CopyEntry>,
}

impl MemoryState {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn push_copies(&mut self, copies: &[NewCopy]) {
        let now = Utc::now();
        for copy in copies {
            let id = self.next_id();
            self.copies.push(CopyEntry {
                id,
                slug: copy.slug.clone(),
                text: copy.text.clone(),
                language: copy.language.clone(),
                status: copy.status,
                tags: copy.tags.clone(),
                created_at: now,
                updated_at: now,
            });
        }
    }
}

/// In-process store with the same uniqueness rules as the PostgreSQL schema.
pub struct MemoryStore {
    state: Mutex<MemoryState>,
    reachable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MemoryState::default()),
            reachable: AtomicBool::new(true),
        }
    }

    /// A store whose every operation fails with [`StoreError::Connection`].
    pub fn unreachable() -> Self {
        let store = Self::new();
        store.set_reachable(false);
        store
    }

    /// A store preloaded with copies written before the `(slug, language)`
    /// rule existed. Nothing is checked, so the rows may already collide.
    pub fn with_legacy_copies(copies: &[NewCopy]) -> Self {
        let mut state = MemoryState::default();
        state.push_copies(copies);
        Self {
            state: Mutex::new(state),
            reachable: AtomicBool::new(true),
        }
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    fn state(&self) -> Result<MutexGuard<'_, MemoryState>, StoreError> {
        if !self.reachable.load(Ordering::SeqCst) {
            return Err(StoreError::Connection(
                "memory store is marked unreachable".to_string(),
            ));
        }
        self.state
            .lock()
            .map_err(|_| StoreError::Connection("memory store lock poisoned".to_string()))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn copy_key(slug: &str, language: &str) -> String {
    format!("(slug, language)=({}, {})", slug, language)
}

#[async_trait]
impl Store for MemoryStore {
    async fn count_users(&self) -> Result<u64, StoreError> {
        Ok(self.state()?.users.len() as u64)
    }

    async fn count_copies(&self) -> Result<u64, StoreError> {
        Ok(self.state()?.copies.len() as u64)
    }

    async fn insert_users(&self, users: &[NewUser]) -> Result<u64, StoreError> {
        let mut state = self.state()?;

        let mut usernames: HashSet<&str> =
            state.users.iter().map(|u| u.username.as_str()).collect();
        let mut emails: HashSet<&str> = state.users.iter().map(|u| u.email.as_str()).collect();

        for user in users {
            if !usernames.insert(&user.username) {
                return Err(StoreError::UniquenessViolation {
                    collection: USERS,
                    key: format!("username={}", user.username),
                });
            }
            if !emails.insert(&user.email) {
                return Err(StoreError::UniquenessViolation {
                    collection: USERS,
                    key: format!("email={}", user.email),
                });
            }
        }
        drop(usernames);
        drop(emails);

        let now = Utc::now();
        for user in users {
            let id = state.next_id();
            state.users.push(User {
                id,
                username: user.username.clone(),
                email: user.email.clone(),
                role: user.role,
                languages: user.languages.clone(),
                created_at: now,
                updated_at: now,
            });
        }

        Ok(users.len() as u64)
    }

    async fn insert_copies(&self, copies: &[NewCopy]) -> Result<u64, StoreError> {
        let mut state = self.state()?;

        let mut keys: HashSet<(&str, &str)> = state
            .copies
            .iter()
            .filter_map(|c| c.unique_slug().map(|slug| (slug, c.language.as_str())))
            .collect();

        for copy in copies {
            if let Some(slug) = copy.unique_slug() {
                if !keys.insert((slug, copy.language.as_str())) {
                    return Err(StoreError::UniquenessViolation {
                        collection: COPIES,
                        key: copy_key(slug, &copy.language),
                    });
                }
            }
        }
        drop(keys);

        state.push_copies(copies);
        Ok(copies.len() as u64)
    }

    async fn delete_all_users(&self) -> Result<u64, StoreError> {
        let mut state = self.state()?;
        let deleted = state.users.len() as u64;
        state.users.clear();
        Ok(deleted)
    }

    async fn delete_all_copies(&self) -> Result<u64, StoreError> {
        let mut state = self.state()?;
        let deleted = state.copies.len() as u64;
        state.copies.clear();
        Ok(deleted)
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        Ok(self.state()?.users.clone())
    }

    async fn list_copies(&self) -> Result<Vec<CopyEntry>, StoreError> {
        Ok(self.state()?.copies.clone())
    }

    async fn set_copy_language(&self, id: i64, language: &str) -> Result<bool, StoreError> {
        let mut state = self.state()?;

        let Some(index) = state.copies.iter().position(|c| c.id == id) else {
            return Ok(false);
        };

        if let Some(slug) = state.copies[index].unique_slug() {
            let collides = state.copies.iter().any(|other| {
                other.id != id
                    && other.language == language
                    && other.unique_slug() == Some(slug)
            });
            if collides {
                return Err(StoreError::UniquenessViolation {
                    collection: COPIES,
                    key: copy_key(slug, language),
                });
            }
        }

        let copy = &mut state.copies[index];
        copy.language = language.to_string();
        copy.updated_at = Utc::now();
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserRole;

    fn user(name: &str) -> NewUser {
        NewUser::new(name, &format!("{}@example.com", name), UserRole::Translator, &["en"])
    }

    #[tokio::test]
    async fn test_legacy_copies_may_collide() {
        let store = MemoryStore::with_legacy_copies(&[
            NewCopy::new(Some("home.title"), "Welcome", "en"),
            NewCopy::new(Some("home.title"), "Hello", "en"),
        ]);

        let copies = store.list_copies().await.unwrap();
        assert_eq!(copies.len(), 2);
        assert_eq!((copies[0].id, copies[1].id), (1, 2));

        let err = store
            .insert_copies(&[NewCopy::new(Some("home.title"), "Hi", "en")])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UniquenessViolation { .. }));
    }

    #[tokio::test]
    async fn test_new_store_is_empty() {
        let store = MemoryStore::new();
        assert_eq!(store.count_users().await.unwrap(), 0);
        assert_eq!(store.count_copies().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_insert_users_assigns_ids_and_timestamps() {
        let store = MemoryStore::new();
        let inserted = store.insert_users(&[user("ana"), user("ben")]).await.unwrap();
        assert_eq!(inserted, 2);

        let users = store.list_users().await.unwrap();
        assert_ne!(users[0].id, users[1].id);
        assert_eq!(users[0].created_at, users[0].updated_at);
    }

    #[tokio::test]
    async fn test_duplicate_username_rejects_whole_batch() {
        let store = MemoryStore::new();
        store.insert_users(&[user("ana")]).await.unwrap();

        let err = store
            .insert_users(&[user("ben"), user("ana")])
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::UniquenessViolation { collection: "users", .. }));
        assert_eq!(store.count_users().await.unwrap(), 1, "ben must not be inserted");
    }

    #[tokio::test]
    async fn test_duplicate_email_is_rejected() {
        let store = MemoryStore::new();
        let first = NewUser::new("ana", "shared@example.com", UserRole::Admin, &[]);
        let second = NewUser::new("ben", "shared@example.com", UserRole::Admin, &[]);

        let err = store.insert_users(&[first, second]).await.unwrap_err();
        match err {
            StoreError::UniquenessViolation { key, .. } => assert!(key.starts_with("email=")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_same_slug_and_language_is_rejected() {
        let store = MemoryStore::new();
        let result = store
            .insert_copies(&[
                NewCopy::new(Some("home.title"), "Welcome", "en"),
                NewCopy::new(Some("home.title"), "Welcome!", "en"),
            ])
            .await;

        assert!(matches!(result, Err(StoreError::UniquenessViolation { .. })));
        assert_eq!(store.count_copies().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_empty_slugs_are_exempt_from_uniqueness() {
        let store = MemoryStore::new();
        let inserted = store
            .insert_copies(&[
                NewCopy::new(Some(""), "Draft one", "en"),
                NewCopy::new(Some(""), "Draft two", "en"),
                NewCopy::new(None, "Draft three", "en"),
                NewCopy::new(None, "Draft four", "en"),
            ])
            .await
            .unwrap();

        assert_eq!(inserted, 4);
    }

    #[tokio::test]
    async fn test_same_slug_different_language_is_allowed() {
        let store = MemoryStore::new();
        store
            .insert_copies(&[
                NewCopy::new(Some("home.title"), "Welcome", "en"),
                NewCopy::new(Some("home.title"), "Bienvenido", "es"),
            ])
            .await
            .unwrap();

        assert_eq!(store.count_copies().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_delete_all_is_idempotent() {
        let store = MemoryStore::new();
        store.insert_users(&[user("ana")]).await.unwrap();

        assert_eq!(store.delete_all_users().await.unwrap(), 1);
        assert_eq!(store.delete_all_users().await.unwrap(), 0);
        assert_eq!(store.delete_all_copies().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_set_copy_language_updates_record() {
        let store = MemoryStore::new();
        store
            .insert_copies(&[NewCopy::new(Some("a"), "Hola", "ES_ES")])
            .await
            .unwrap();
        let id = store.list_copies().await.unwrap()[0].id;

        assert!(store.set_copy_language(id, "es").await.unwrap());

        let copy = &store.list_copies().await.unwrap()[0];
        assert_eq!(copy.language, "es");
        assert!(copy.updated_at >= copy.created_at);
    }

    #[tokio::test]
    async fn test_set_copy_language_unknown_id() {
        let store = MemoryStore::new();
        assert!(!store.set_copy_language(42, "en").await.unwrap());
    }

    #[tokio::test]
    async fn test_set_copy_language_respects_unique_key() {
        let store = MemoryStore::new();
        store
            .insert_copies(&[
                NewCopy::new(Some("a"), "Hi", "en"),
                NewCopy::new(Some("a"), "Hi", "English"),
            ])
            .await
            .unwrap();
        let id = store.list_copies().await.unwrap()[1].id;

        let err = store.set_copy_language(id, "en").await.unwrap_err();
        assert!(matches!(err, StoreError::UniquenessViolation { .. }));
        assert_eq!(store.list_copies().await.unwrap()[1].language, "English");
    }

    #[tokio::test]
    async fn test_unreachable_store_fails_every_call() {
        let store = MemoryStore::unreachable();
        assert!(store.count_users().await.unwrap_err().is_connection());
        assert!(store.delete_all_copies().await.unwrap_err().is_connection());

        store.set_reachable(true);
        assert_eq!(store.count_users().await.unwrap(), 0);
    }
}
