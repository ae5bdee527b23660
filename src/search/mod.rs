//! Search index collaborator.
//!
//! Search is read-only and never takes the dual path: the facade sends it
//! straight to the index. Writes reach the index as side-effects of the
//! local backend.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backend::{Listing, SourceType};

pub mod memory;

pub use memory::MemorySearchIndex;

/// Default page size when the caller does not give one.
pub const DEFAULT_LIMIT: usize = 20;
/// Hard cap on page size.
pub const MAX_LIMIT: usize = 100;

/// Search query parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchParams {
    /// Free-text query matched against title and description.
    pub query: String,
    pub category_id: Option<i64>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub condition: Option<String>,
    pub source_type: Option<SourceType>,
    pub user_id: Option<i64>,
    pub limit: usize,
    pub offset: usize,
}

impl SearchParams {
    pub fn query(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    /// Page size after defaults and capping.
    pub fn effective_limit(&self) -> usize {
        match self.limit {
            0 => DEFAULT_LIMIT,
            n => n.min(MAX_LIMIT),
        }
    }
}

/// One page of search results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    pub items: Vec<Listing>,
    /// Total matches before paging.
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    #[error("invalid search parameters: {0}")]
    InvalidParams(String),

    #[error("search index unavailable: {0}")]
    Unavailable(String),
}

/// Full-text listings index.
#[async_trait]
pub trait SearchIndex: Send + Sync {
    async fn index(&self, listing: &Listing) -> Result<(), SearchError>;
    async fn remove(&self, id: i64) -> Result<(), SearchError>;
    async fn search(&self, params: &SearchParams) -> Result<SearchResults, SearchError>;
}
