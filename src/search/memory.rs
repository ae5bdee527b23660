//! In-process search index.

use async_trait::async_trait;
use dashmap::DashMap;

use crate::backend::Listing;
use crate::search::{SearchError, SearchIndex, SearchParams, SearchResults};

/// A concurrent in-memory index with substring matching.
#[derive(Debug, Default)]
pub struct MemorySearchIndex {
    docs: DashMap<i64, Listing>,
}

impl MemorySearchIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of indexed documents.
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    fn matches(listing: &Listing, params: &SearchParams, needle: &str) -> bool {
        if !needle.is_empty()
            && !listing.title.to_lowercase().contains(needle)
            && !listing.description.to_lowercase().contains(needle)
        {
            return false;
        }
        if params.category_id.is_some_and(|c| c != listing.category_id) {
            return false;
        }
        if params.min_price.is_some_and(|min| listing.price < min) {
            return false;
        }
        if params.max_price.is_some_and(|max| listing.price > max) {
            return false;
        }
        if let Some(condition) = &params.condition {
            if listing.condition.as_deref() != Some(condition.as_str()) {
                return false;
            }
        }
        if params.source_type.is_some_and(|s| s != listing.source_type) {
            return false;
        }
        if params.user_id.is_some_and(|u| u != listing.user_id) {
            return false;
        }
        true
    }
}

#[async_trait]
impl SearchIndex for MemorySearchIndex {
    async fn index(&self, listing: &Listing) -> Result<(), SearchError> {
        self.docs.insert(listing.id, listing.clone());
        Ok(())
    }

    async fn remove(&self, id: i64) -> Result<(), SearchError> {
        self.docs.remove(&id);
        Ok(())
    }

    async fn search(&self, params: &SearchParams) -> Result<SearchResults, SearchError> {
        if let (Some(min), Some(max)) = (params.min_price, params.max_price) {
            if min > max {
                return Err(SearchError::InvalidParams(format!(
                    "min_price {} exceeds max_price {}",
                    min, max
                )));
            }
        }

        let needle = params.query.trim().to_lowercase();
        let mut hits: Vec<Listing> = self
            .docs
            .iter()
            .filter(|entry| Self::matches(entry.value(), params, &needle))
            .map(|entry| entry.value().clone())
            .collect();

        // Newest first
        hits.sort_by(|a, b| b.id.cmp(&a.id));

        let total = hits.len() as u64;
        let items = hits
            .into_iter()
            .skip(params.offset)
            .take(params.effective_limit())
            .collect();

        Ok(SearchResults { items, total })
    }
}
