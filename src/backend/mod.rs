//! Listing backends.
//!
//! # Data Flow
//! ```text
//! ServiceFacade
//!     → remote.rs (replacement listings service over HTTP/JSON, may fail)
//!     → local.rs  (legacy store, system of record, indexes into search)
//! ```
//!
//! # Design Decisions
//! - Both backends sit behind object-safe async traits so the facade can be
//!   wired with real clients in production and programmable mocks in tests
//! - Remote errors carry a closed classification; local errors are terminal

use async_trait::async_trait;
use thiserror::Error;

pub mod local;
pub mod model;
pub mod remote;

pub use local::MemoryListingStore;
pub use model::{InvalidSourceType, Listing, SourceType};
pub use remote::HttpRemoteBackend;

/// Classification of a remote failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteErrorKind {
    /// Deadline exceeded, either ours or the service's.
    Timeout,
    /// Service unreachable (refused, reset, DNS, unavailable).
    Connection,
    /// The service answered that the entity does not exist.
    NotFound,
    /// The service answered with an error.
    Application,
    Unknown,
}

impl RemoteErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RemoteErrorKind::Timeout => "timeout",
            RemoteErrorKind::Connection => "connection",
            RemoteErrorKind::NotFound => "not_found",
            RemoteErrorKind::Application => "application",
            RemoteErrorKind::Unknown => "unknown",
        }
    }
}

/// Error returned by a [`RemoteBackend`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("remote {}: {message}", .kind.as_str())]
pub struct RemoteError {
    pub kind: RemoteErrorKind,
    pub message: String,
}

impl RemoteError {
    pub fn new(kind: RemoteErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Timeout, message)
    }

    pub fn connection(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Connection, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::NotFound, message)
    }

    pub fn application(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Application, message)
    }
}

/// Error returned by a [`LocalBackend`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocalError {
    #[error("listing {0} not found")]
    NotFound(i64),

    #[error("invalid listing: {0}")]
    Validation(String),

    #[error("storage error: {0}")]
    Storage(String),
}

/// Legacy, persistence-backed listings implementation. System of record.
#[async_trait]
pub trait LocalBackend: Send + Sync {
    async fn create(&self, listing: &Listing) -> Result<i64, LocalError>;
    async fn get(&self, id: i64) -> Result<Listing, LocalError>;
    async fn update(&self, listing: &Listing) -> Result<(), LocalError>;
    async fn delete(&self, id: i64) -> Result<(), LocalError>;
}

/// Client for the replacement listings service.
#[async_trait]
pub trait RemoteBackend: Send + Sync {
    async fn create(&self, listing: &Listing) -> Result<Listing, RemoteError>;
    async fn get(&self, id: i64) -> Result<Listing, RemoteError>;
    async fn update(&self, listing: &Listing) -> Result<Listing, RemoteError>;
    /// The service authorises deletes against the listing owner.
    async fn delete(&self, id: i64, owner_id: i64) -> Result<(), RemoteError>;
}
