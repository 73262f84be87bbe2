use thiserror::Error;

/// Failures reported by a [`crate::store::Store`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached or the connection dropped.
    #[error("store unreachable: {0}")]
    Connection(String),

    /// A write would break a unique constraint.
    #[error("duplicate {key} in {collection}")]
    UniquenessViolation {
        collection: &'static str,
        key: String,
    },

    /// The store rejected the operation outright.
    #[error("{operation} on {collection} rejected: {message}")]
    BulkOperation {
        collection: &'static str,
        operation: &'static str,
        message: String,
    },

    /// A read or single-record update failed, or returned data the model
    /// cannot represent.
    #[error("{operation} on {collection} failed: {message}")]
    Query {
        collection: &'static str,
        operation: &'static str,
        message: String,
    },
}

impl StoreError {
    pub fn is_connection(&self) -> bool {
        matches!(self, StoreError::Connection(_))
    }
}

/// Failures that abort a migration run.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("persistence error")]
    Persistence(#[source] StoreError),

    #[error("bulk insert into {collection} failed")]
    BulkInsert {
        collection: &'static str,
        #[source]
        source: StoreError,
    },
}

impl From<StoreError> for MigrationError {
    fn from(err: StoreError) -> Self {
        MigrationError::Persistence(err)
    }
}
