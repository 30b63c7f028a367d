//! Error types for the posts API.

use std::fmt;

/// Result type for store, cache and service operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the posts API.
///
/// Every layer below HTTP returns `Result<T>`. The variants fall into three
/// families that the HTTP boundary maps to status codes:
///
/// - not found: [`Error::NotFound`], [`Error::EmailInUse`]
/// - validation: [`Error::ValidationError`]
/// - internal: everything else
#[derive(Debug, Clone)]
pub enum Error {
    /// A post or user referenced by id does not exist.
    NotFound(String),

    /// Registration or update would duplicate an existing email.
    EmailInUse(String),

    /// Malformed or missing input fields, length constraints.
    ValidationError(String),

    /// Serialization failed when converting a post to cache bytes.
    SerializationError(String),

    /// Cache bytes could not be decoded.
    ///
    /// Corrupted payload, truncated value or a value written by
    /// something other than this service.
    DeserializationError(String),

    /// Invalid cache entry: bad magic header.
    InvalidCacheEntry(String),

    /// Cache entry was written with a different schema version.
    VersionMismatch {
        /// Expected schema version (from compiled code)
        expected: u32,
        /// Found schema version (from cached entry)
        found: u32,
    },

    /// Cache backend error (Redis connection lost, pool exhausted, etc).
    BackendError(String),

    /// Relational store error (connection lost, query failure).
    RepositoryError(String),

    /// Invalid or missing configuration at startup.
    ConfigError(String),

    /// Feature not compiled in (e.g. `redis` Cargo feature disabled).
    NotImplemented(String),

    /// Generic error with custom message.
    Other(String),
}

impl Error {
    /// Whether the error describes a bad client request rather than a
    /// server-side failure.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::NotFound(_) | Error::EmailInUse(_) | Error::ValidationError(_)
        )
    }

    /// Whether the error came from reading a cache entry that cannot be used.
    ///
    /// Such entries are evicted and treated as misses.
    pub fn is_unreadable_entry(&self) -> bool {
        matches!(
            self,
            Error::DeserializationError(_)
                | Error::InvalidCacheEntry(_)
                | Error::VersionMismatch { .. }
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NotFound(msg) => write!(f, "{}", msg),
            Error::EmailInUse(msg) => write!(f, "{}", msg),
            Error::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            Error::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            Error::DeserializationError(msg) => write!(f, "Deserialization error: {}", msg),
            Error::InvalidCacheEntry(msg) => write!(f, "Invalid cache entry: {}", msg),
            Error::VersionMismatch { expected, found } => {
                write!(
                    f,
                    "Cache version mismatch: expected {}, found {}",
                    expected, found
                )
            }
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::RepositoryError(msg) => write!(f, "Repository error: {}", msg),
            Error::ConfigError(msg) => write!(f, "Config error: {}", msg),
            Error::NotImplemented(msg) => write!(f, "Not implemented: {}", msg),
            Error::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

// ============================================================================
// Conversions from other error types
// ============================================================================

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        if e.is_io() {
            Error::BackendError(e.to_string())
        } else if e.is_syntax() || e.is_data() || e.is_eof() {
            Error::ValidationError(e.to_string())
        } else {
            Error::SerializationError(e.to_string())
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Other(e.to_string())
    }
}

/// Postgres SQLSTATE for unique_violation.
const UNIQUE_VIOLATION: &str = "23505";
/// Postgres SQLSTATE for foreign_key_violation.
const FOREIGN_KEY_VIOLATION: &str = "23503";

impl From<sqlx::Error> for Error {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &e {
            match db.code().as_deref() {
                Some(UNIQUE_VIOLATION) => {
                    return Error::EmailInUse("Email already in use".to_string())
                }
                Some(FOREIGN_KEY_VIOLATION) => {
                    return Error::NotFound("User not found".to_string())
                }
                _ => {}
            }
        }
        Error::RepositoryError(e.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for Error {
    fn from(e: sqlx::migrate::MigrateError) -> Self {
        Error::RepositoryError(format!("Migration failed: {}", e))
    }
}

impl From<String> for Error {
    fn from(e: String) -> Self {
        Error::Other(e)
    }
}

impl From<&str> for Error {
    fn from(e: &str) -> Self {
        Error::Other(e.to_string())
    }
}

#[cfg(feature = "redis")]
impl From<redis::RedisError> for Error {
    fn from(e: redis::RedisError) -> Self {
        Error::BackendError(format!("Redis error: {}", e))
    }
}
