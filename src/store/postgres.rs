use super::{Store, COPIES, USERS};
use crate::config::Config;
use crate::error::StoreError;
use crate::models::{CopyEntry, NewCopy, NewUser, User};
use crate::retry::{with_retry_if, RetryConfig};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgConnectOptions, PgDatabaseError, PgPool, PgPoolOptions};
use sqlx::{Postgres, QueryBuilder};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, warn};

const TABLES: [&str; 2] = [
    "CREATE TABLE IF NOT EXISTS users (
        id BIGSERIAL PRIMARY KEY,
        username TEXT NOT NULL UNIQUE,
        email TEXT NOT NULL UNIQUE,
        role TEXT NOT NULL CHECK (role IN ('admin', 'translator', 'reviewer', 'developer')),
        languages TEXT[] NOT NULL DEFAULT '{}',
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
    "CREATE TABLE IF NOT EXISTS copies (
        id BIGSERIAL PRIMARY KEY,
        slug TEXT,
        text TEXT NOT NULL,
        language TEXT NOT NULL,
        status TEXT NOT NULL DEFAULT 'not_assigned' CHECK (status IN
            ('not_assigned', 'assigned', 'translated', 'reviewed', 'approved', 'rejected')),
        tags TEXT[] NOT NULL DEFAULT '{}',
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
];

// Entries still waiting for a slug may share a language freely.
const SLUG_LANGUAGE_INDEX: &str = "CREATE UNIQUE INDEX IF NOT EXISTS copies_slug_language_key
    ON copies (slug, language)
    WHERE slug IS NOT NULL AND slug <> ''";

/// PostgreSQL-backed store holding a single pooled connection.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
    slug_index: bool,
}

impl PgStore {
    /// Open the connection (retrying transient failures) and create the schema
    /// if it does not exist yet.
    pub async fn connect(config: &Config) -> Result<Self, StoreError> {
        let mut options = PgConnectOptions::from_str(&config.database_url)
            .map_err(|e| StoreError::Connection(format!("invalid DATABASE_URL: {}", e)))?;
        if let Some(name) = &config.database_name {
            options = options.database(name);
        }

        info!("Connecting to {}", config.redacted_database_url());

        let pool = with_retry_if(
            &RetryConfig::connect(config.connect_attempts),
            "Database connection",
            || {
                PgPoolOptions::new()
                    .max_connections(1)
                    .acquire_timeout(Duration::from_secs(10))
                    .connect_with(options.clone())
            },
            is_transient,
        )
        .await
        .map_err(|e| StoreError::Connection(e.to_string()))?;

        Self::open(pool).await
    }

    /// Create the schema on an open pool. The pool is closed if that fails.
    async fn open(pool: PgPool) -> Result<Self, StoreError> {
        match ensure_schema(&pool).await {
            Ok(slug_index) => Ok(Self { pool, slug_index }),
            Err(e) => {
                pool.close().await;
                Err(e)
            }
        }
    }

    /// Whether the `(slug, language)` unique index is in place.
    ///
    /// It is missing when existing rows already break the rule; until those
    /// duplicates are resolved the database will not reject new ones.
    pub fn has_slug_index(&self) -> bool {
        self.slug_index
    }

    /// Close the pool, waiting for the connection to be released.
    pub async fn close(&self) {
        self.pool.close().await;
        debug!("Database connection closed");
    }
}

async fn ensure_schema(pool: &PgPool) -> Result<bool, StoreError> {
    for statement in TABLES {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| classify(e, "schema", "createTable"))?;
    }

    let index = sqlx::query(SLUG_LANGUAGE_INDEX)
        .execute(pool)
        .await
        .map(|_| ())
        .map_err(|e| classify(e, COPIES, "createIndex"));
    let slug_index = index_created(index)?;

    debug!("Schema ready");
    Ok(slug_index)
}

/// Rows that already share a slug and language keep the index from being
/// built. The store stays usable so those rows can be reported and fixed.
fn index_created(result: Result<(), StoreError>) -> Result<bool, StoreError> {
    match result {
        Ok(()) => Ok(true),
        Err(StoreError::UniquenessViolation { key, .. }) => {
            warn!(
                "Unique (slug, language) index not created, existing copies are duplicated: {}",
                key
            );
            Ok(false)
        }
        Err(e) => Err(e),
    }
}

fn is_transient(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::Tls(_)
    )
}

/// Map a sqlx failure onto the store's error kinds.
fn classify(err: sqlx::Error, collection: &'static str, operation: &'static str) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            let key = db
                .try_downcast_ref::<PgDatabaseError>()
                .and_then(|pg| pg.detail())
                .or_else(|| db.constraint())
                .unwrap_or("unique key")
                .to_string();
            StoreError::UniquenessViolation { collection, key }
        }
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => StoreError::Connection(err.to_string()),
        _ if operation.ends_with("Many") => StoreError::BulkOperation {
            collection,
            operation,
            message: err.to_string(),
        },
        _ => StoreError::Query {
            collection,
            operation,
            message: err.to_string(),
        },
    }
}

fn decode_error(collection: &'static str, message: String) -> StoreError {
    StoreError::Query {
        collection,
        operation: "find",
        message,
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
    email: String,
    role: String,
    languages: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: row.id,
            username: row.username,
            email: row.email,
            role: row
                .role
                .parse()
                .map_err(|e: crate::models::UnknownVariant| decode_error(USERS, e.to_string()))?,
            languages: row.languages,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct CopyRow {
    id: i64,
    slug: Option<String>,
    text: String,
    language: String,
    status: String,
    tags: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CopyRow> for CopyEntry {
    type Error = StoreError;

    fn try_from(row: CopyRow) -> Result<Self, Self::Error> {
        Ok(CopyEntry {
            id: row.id,
            slug: row.slug,
            text: row.text,
            language: row.language,
            status: row
                .status
                .parse()
                .map_err(|e: crate::models::UnknownVariant| decode_error(COPIES, e.to_string()))?,
            tags: row.tags,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

async fn count(pool: &PgPool, collection: &'static str) -> Result<u64, StoreError> {
    let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", collection))
        .fetch_one(pool)
        .await
        .map_err(|e| classify(e, collection, "countDocuments"))?;
    Ok(u64::try_from(count).unwrap_or(0))
}

async fn delete_all(pool: &PgPool, collection: &'static str) -> Result<u64, StoreError> {
    let result = sqlx::query(&format!("DELETE FROM {}", collection))
        .execute(pool)
        .await
        .map_err(|e| classify(e, collection, "deleteMany"))?;
    Ok(result.rows_affected())
}

#[async_trait]
impl Store for PgStore {
    async fn count_users(&self) -> Result<u64, StoreError> {
        count(&self.pool, USERS).await
    }

    async fn count_copies(&self) -> Result<u64, StoreError> {
        count(&self.pool, COPIES).await
    }

    async fn insert_users(&self, users: &[NewUser]) -> Result<u64, StoreError> {
        if users.is_empty() {
            return Ok(0);
        }

        let now = Utc::now();
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO users (username, email, role, languages, created_at, updated_at) ",
        );
        builder.push_values(users, |mut row, user| {
            row.push_bind(&user.username)
                .push_bind(&user.email)
                .push_bind(user.role.as_str())
                .push_bind(&user.languages)
                .push_bind(now)
                .push_bind(now);
        });

        // One statement, so the whole batch commits or none of it does.
        let result = builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(|e| classify(e, USERS, "insertMany"))?;
        Ok(result.rows_affected())
    }

    async fn insert_copies(&self, copies: &[NewCopy]) -> Result<u64, StoreError> {
        if copies.is_empty() {
            return Ok(0);
        }

        let now = Utc::now();
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO copies (slug, text, language, status, tags, created_at, updated_at) ",
        );
        builder.push_values(copies, |mut row, copy| {
            row.push_bind(&copy.slug)
                .push_bind(&copy.text)
                .push_bind(&copy.language)
                .push_bind(copy.status.as_str())
                .push_bind(&copy.tags)
                .push_bind(now)
                .push_bind(now);
        });

        let result = builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(|e| classify(e, COPIES, "insertMany"))?;
        Ok(result.rows_affected())
    }

    async fn delete_all_users(&self) -> Result<u64, StoreError> {
        delete_all(&self.pool, USERS).await
    }

    async fn delete_all_copies(&self) -> Result<u64, StoreError> {
        delete_all(&self.pool, COPIES).await
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let rows: Vec<UserRow> = sqlx::query_as(
            "SELECT id, username, email, role, languages, created_at, updated_at
             FROM users
             ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| classify(e, USERS, "find"))?;

        rows.into_iter().map(User::try_from).collect()
    }

    async fn list_copies(&self) -> Result<Vec<CopyEntry>, StoreError> {
        let rows: Vec<CopyRow> = sqlx::query_as(
            "SELECT id, slug, text, language, status, tags, created_at, updated_at
             FROM copies
             ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| classify(e, COPIES, "find"))?;

        rows.into_iter().map(CopyEntry::try_from).collect()
    }

    async fn set_copy_language(&self, id: i64, language: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE copies SET language = $1, updated_at = now() WHERE id = $2")
            .bind(language)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| classify(e, COPIES, "updateOne"))?;
        Ok(result.rows_affected() > 0)
    }
}
