//! Shared utilities for integration and load testing.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use listing_router::backend::{
    Listing, LocalBackend, LocalError, MemoryListingStore, RemoteBackend, RemoteError, SourceType,
};
use listing_router::config::{CircuitBreakerConfig, RouterConfig, RoutingConfig};
use listing_router::observability::RouteMetrics;
use listing_router::search::MemorySearchIndex;
use listing_router::ServiceFacade;

/// Ids handed out by the mock remote start here, so they never collide
/// with local ids.
pub const REMOTE_ID_BASE: i64 = 1_000_000;

/// Failure schedule for [`MockRemote`]. Call numbers are zero-based.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Mode {
    Healthy,
    /// Every call fails as connection refused.
    Down,
    /// Every call succeeds after the delay.
    Slow(Duration),
    /// Calls 0, n, 2n, ... fail.
    FailEvery(usize),
    /// Every second call fails.
    Alternate,
    /// Seeded coin flip per call.
    Random { failure_rate: f64 },
}

/// Programmable stand-in for the remote listings service.
pub struct MockRemote {
    mode: Mutex<Mode>,
    rng: Mutex<fastrand::Rng>,
    calls: AtomicUsize,
    failures: AtomicUsize,
    listings: Mutex<HashMap<i64, Listing>>,
    next_id: AtomicI64,
}

impl MockRemote {
    pub fn new(mode: Mode) -> Arc<Self> {
        Arc::new(Self {
            mode: Mutex::new(mode),
            rng: Mutex::new(fastrand::Rng::with_seed(42)),
            calls: AtomicUsize::new(0),
            failures: AtomicUsize::new(0),
            listings: Mutex::new(HashMap::new()),
            next_id: AtomicI64::new(REMOTE_ID_BASE),
        })
    }

    pub fn set_mode(&self, mode: Mode) {
        *self.mode.lock().unwrap() = mode;
    }

    /// Calls that reached the mock, failed or not.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Calls that were failed on purpose.
    pub fn failures(&self) -> usize {
        self.failures.load(Ordering::SeqCst)
    }

    async fn gate(&self) -> Result<(), RemoteError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        let mode = *self.mode.lock().unwrap();

        if let Mode::Slow(delay) = mode {
            tokio::time::sleep(delay).await;
        }

        let fail = match mode {
            Mode::Healthy | Mode::Slow(_) => false,
            Mode::Down => true,
            Mode::FailEvery(k) => n % k == 0,
            Mode::Alternate => n % 2 == 1,
            Mode::Random { failure_rate } => {
                let roll = self.rng.lock().unwrap().f64();
                roll < failure_rate
            }
        };

        if fail {
            self.failures.fetch_add(1, Ordering::SeqCst);
            return Err(RemoteError::connection("injected failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteBackend for MockRemote {
    async fn create(&self, listing: &Listing) -> Result<Listing, RemoteError> {
        self.gate().await?;
        let mut created = listing.clone();
        created.id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.listings.lock().unwrap().insert(created.id, created.clone());
        Ok(created)
    }

    async fn get(&self, id: i64) -> Result<Listing, RemoteError> {
        self.gate().await?;
        self.listings
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| RemoteError::not_found(format!("listing {} not found", id)))
    }

    async fn update(&self, listing: &Listing) -> Result<Listing, RemoteError> {
        self.gate().await?;
        let mut listings = self.listings.lock().unwrap();
        match listings.get_mut(&listing.id) {
            Some(existing) => {
                *existing = listing.clone();
                Ok(listing.clone())
            }
            None => Err(RemoteError::not_found(format!("listing {} not found", listing.id))),
        }
    }

    async fn delete(&self, id: i64, owner_id: i64) -> Result<(), RemoteError> {
        self.gate().await?;
        let mut listings = self.listings.lock().unwrap();
        match listings.get(&id) {
            Some(existing) if existing.user_id != owner_id => {
                Err(RemoteError::application("not the owner"))
            }
            Some(_) => {
                listings.remove(&id);
                Ok(())
            }
            None => Err(RemoteError::not_found(format!("listing {} not found", id))),
        }
    }
}

/// Local backend whose storage is broken.
#[derive(Default)]
pub struct FailingLocal {
    pub calls: AtomicUsize,
}

impl FailingLocal {
    fn fail(&self) -> LocalError {
        self.calls.fetch_add(1, Ordering::SeqCst);
        LocalError::Storage("database unreachable".into())
    }
}

#[async_trait]
impl LocalBackend for FailingLocal {
    async fn create(&self, _listing: &Listing) -> Result<i64, LocalError> {
        Err(self.fail())
    }
    async fn get(&self, _id: i64) -> Result<Listing, LocalError> {
        Err(self.fail())
    }
    async fn update(&self, _listing: &Listing) -> Result<(), LocalError> {
        Err(self.fail())
    }
    async fn delete(&self, _id: i64) -> Result<(), LocalError> {
        Err(self.fail())
    }
}

/// A facade wired to a mock remote and a fresh in-memory local store.
pub struct Harness {
    pub facade: Arc<ServiceFacade>,
    pub remote: Arc<MockRemote>,
    pub local: Arc<MemoryListingStore>,
    pub index: Arc<MemorySearchIndex>,
    pub metrics: Arc<RouteMetrics>,
}

pub fn harness(remote: Arc<MockRemote>, config: &RouterConfig) -> Harness {
    let index = Arc::new(MemorySearchIndex::new());
    let local = Arc::new(MemoryListingStore::new(index.clone()));
    let metrics = Arc::new(RouteMetrics::new());
    let facade = Arc::new(ServiceFacade::new(
        local.clone(),
        remote.clone(),
        index.clone(),
        metrics.clone(),
        config,
    ));
    Harness {
        facade,
        remote,
        local,
        index,
        metrics,
    }
}

/// Every caller routed remote, default breaker.
pub fn all_remote() -> RouterConfig {
    RouterConfig {
        routing: RoutingConfig {
            remote_enabled: true,
            canary_percentage: 100,
            ..RoutingConfig::default()
        },
        ..RouterConfig::default()
    }
}

/// Every caller routed remote with the breaker switched off, so every
/// operation reaches the mock.
pub fn all_remote_unguarded() -> RouterConfig {
    let mut config = all_remote();
    config.circuit_breaker = CircuitBreakerConfig {
        enabled: false,
        ..CircuitBreakerConfig::default()
    };
    config
}

pub fn listing(user_id: i64, title: &str) -> Listing {
    Listing::new(SourceType::C2c, user_id, title, 25.0).with_category(1)
}
