//! In-process legacy listings store.
//!
//! # Responsibilities
//! - Act as the system of record for listings
//! - Assign ids for new listings
//! - Keep the search index in step with writes
//!
//! # Design Decisions
//! - Index failures are logged, never surfaced: the stored listing is the
//!   source of truth and the index can be rebuilt from it

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::backend::{Listing, LocalBackend, LocalError};
use crate::search::SearchIndex;

pub struct MemoryListingStore {
    listings: DashMap<i64, Listing>,
    next_id: AtomicI64,
    search: Arc<dyn SearchIndex>,
}

impl MemoryListingStore {
    pub fn new(search: Arc<dyn SearchIndex>) -> Self {
        Self {
            listings: DashMap::new(),
            next_id: AtomicI64::new(1),
            search,
        }
    }

    pub fn len(&self) -> usize {
        self.listings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }

    fn validate(listing: &Listing) -> Result<(), LocalError> {
        if listing.title.trim().is_empty() {
            return Err(LocalError::Validation("title must not be empty".into()));
        }
        if !listing.price.is_finite() || listing.price < 0.0 {
            return Err(LocalError::Validation(format!(
                "price must be a non-negative number, got {}",
                listing.price
            )));
        }
        Ok(())
    }

    async fn reindex(&self, listing: &Listing) {
        if let Err(e) = self.search.index(listing).await {
            tracing::warn!(listing_id = listing.id, error = %e, "Failed to index listing");
        }
    }
}

#[async_trait]
impl LocalBackend for MemoryListingStore {
    async fn create(&self, listing: &Listing) -> Result<i64, LocalError> {
        Self::validate(listing)?;

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut stored = listing.clone();
        stored.id = id;
        self.listings.insert(id, stored.clone());

        tracing::debug!(listing_id = id, source_type = %stored.source_type, "Listing stored");
        self.reindex(&stored).await;
        Ok(id)
    }

    async fn get(&self, id: i64) -> Result<Listing, LocalError> {
        self.listings
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or(LocalError::NotFound(id))
    }

    async fn update(&self, listing: &Listing) -> Result<(), LocalError> {
        Self::validate(listing)?;

        // The map guard is released before the index call awaits.
        {
            let mut entry = self
                .listings
                .get_mut(&listing.id)
                .ok_or(LocalError::NotFound(listing.id))?;
            *entry = listing.clone();
        }

        self.reindex(listing).await;
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<(), LocalError> {
        self.listings.remove(&id).ok_or(LocalError::NotFound(id))?;

        if let Err(e) = self.search.remove(id).await {
            tracing::warn!(listing_id = id, error = %e, "Failed to remove listing from index");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::SourceType;
    use crate::search::{MemorySearchIndex, SearchParams};

    fn store() -> (MemoryListingStore, Arc<MemorySearchIndex>) {
        let index = Arc::new(MemorySearchIndex::new());
        (MemoryListingStore::new(index.clone()), index)
    }

    #[tokio::test]
    async fn test_create_assigns_ids_and_indexes() {
        let (store, index) = store();
        let a = store
            .create(&Listing::new(SourceType::C2c, 1, "Desk", 50.0))
            .await
            .unwrap();
        let b = store
            .create(&Listing::new(SourceType::C2c, 1, "Chair", 20.0))
            .await
            .unwrap();

        assert_eq!((a, b), (1, 2));
        assert_eq!(store.get(b).await.unwrap().title, "Chair");
        assert_eq!(index.search(&SearchParams::query("desk")).await.unwrap().total, 1);
    }

    #[tokio::test]
    async fn test_validation() {
        let (store, _) = store();
        let err = store
            .create(&Listing::new(SourceType::C2c, 1, "  ", 1.0))
            .await
            .unwrap_err();
        assert!(matches!(err, LocalError::Validation(_)));

        let err = store
            .create(&Listing::new(SourceType::C2c, 1, "Thing", -1.0))
            .await
            .unwrap_err();
        assert!(matches!(err, LocalError::Validation(_)));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let (store, index) = store();
        let id = store
            .create(&Listing::new(SourceType::C2c, 1, "Lamp", 15.0))
            .await
            .unwrap();

        let mut changed = store.get(id).await.unwrap();
        changed.title = "Floor lamp".into();
        store.update(&changed).await.unwrap();
        assert_eq!(store.get(id).await.unwrap().title, "Floor lamp");
        assert_eq!(index.search(&SearchParams::query("floor")).await.unwrap().total, 1);

        store.delete(id).await.unwrap();
        assert_eq!(store.get(id).await.unwrap_err(), LocalError::NotFound(id));
        assert_eq!(store.delete(id).await.unwrap_err(), LocalError::NotFound(id));
        assert!(index.is_empty());

        changed.id = 99;
        assert_eq!(store.update(&changed).await.unwrap_err(), LocalError::NotFound(99));
    }
}
