//! Read-through profile cache.
//!
//! Entries live for `profile_ttl_secs`. Concurrent misses for the same id
//! share a single store lookup; failed lookups are not cached.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use shared_types::{AppError, CacheSettings, UserProfile};
use tracing::debug;
use uuid::Uuid;

use crate::repo::ProfileStore;

#[derive(Clone)]
pub struct ProfileCache {
    store: Arc<dyn ProfileStore>,
    cache: Cache<Uuid, UserProfile>,
}

impl ProfileCache {
    pub fn new(store: Arc<dyn ProfileStore>, settings: &CacheSettings) -> Self {
        let cache = Cache::builder()
            .max_capacity(settings.profile_capacity)
            .time_to_live(Duration::from_secs(settings.profile_ttl_secs))
            .build();
        Self { store, cache }
    }

    /// Profile for `id`, loading it on a miss. A missing profile is a
    /// `NotFound` error and is looked up again on the next call.
    pub async fn get(&self, id: Uuid) -> Result<UserProfile, AppError> {
        let store = self.store.clone();
        self.cache
            .try_get_with(id, async move {
                debug!(user_id = %id, "profile cache miss");
                store
                    .find(id)
                    .await?
                    .ok_or_else(|| AppError::not_found(format!("Profile {id} not found")))
            })
            .await
            .map_err(|e: Arc<AppError>| (*e).clone())
    }

    /// Seed the cache with a freshly written profile.
    pub async fn put(&self, profile: UserProfile) {
        self.cache.insert(profile.id, profile).await;
    }

    pub async fn invalidate(&self, id: Uuid) {
        self.cache.invalidate(&id).await;
        debug!(user_id = %id, "profile cache invalidated");
    }
}
