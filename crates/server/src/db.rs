use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use shared_types::{AppConfig, AppError};

use crate::auth::jwt::JwtKeys;
use crate::chat::{ChatModel, GeminiClient};
use crate::config::gemini_api_key;
use crate::geocode::{Geocoder, NominatimClient};
use crate::profile_cache::ProfileCache;
use crate::rate_limit::RateLimitState;
use crate::repo::complaint::PgComplaintStore;
use crate::repo::help_request::PgHelpRequestStore;
use crate::repo::memory::{MemoryComplaintStore, MemoryHelpRequestStore, MemoryProfileStore};
use crate::repo::profile::PgProfileStore;
use crate::repo::{ComplaintStore, HelpRequestStore, ProfileStore};
use crate::storage::{MemoryObjectStore, ObjectStore, S3ObjectStore};

/// Shared application state passed to Axum handlers via `State`.
///
/// Every collaborator sits behind a trait object so tests can swap in
/// in-memory stores and fake upstreams.
#[derive(Clone)]
pub struct AppState {
    /// `None` when running on in-memory stores.
    pub pool: Option<Pool<Postgres>>,
    pub complaints: Arc<dyn ComplaintStore>,
    pub help_requests: Arc<dyn HelpRequestStore>,
    pub profiles: Arc<dyn ProfileStore>,
    pub profile_cache: ProfileCache,
    pub geocoder: Arc<dyn Geocoder>,
    /// Avatars and help-request files.
    pub media: Arc<dyn ObjectStore>,
    /// Complaint evidence.
    pub evidence: Arc<dyn ObjectStore>,
    /// `None` when the assistant is disabled.
    pub chat: Option<Arc<dyn ChatModel>>,
    pub jwt: JwtKeys,
    pub config: Arc<AppConfig>,
    pub chat_limiter: RateLimitState,
    pub geocode_limiter: RateLimitState,
}

impl AppState {
    /// State backed entirely by process memory. External HTTP services are
    /// still configured from `config`.
    pub fn in_memory(config: AppConfig, jwt: JwtKeys) -> Result<Self, AppError> {
        let profiles: Arc<dyn ProfileStore> = Arc::new(MemoryProfileStore::new());
        Self::assemble(
            config,
            jwt,
            None,
            Arc::new(MemoryComplaintStore::new()),
            Arc::new(MemoryHelpRequestStore::new()),
            profiles,
        )
    }

    /// State backed by Postgres.
    pub fn postgres(config: AppConfig, jwt: JwtKeys, pool: Pool<Postgres>) -> Result<Self, AppError> {
        Self::assemble(
            config,
            jwt,
            Some(pool.clone()),
            Arc::new(PgComplaintStore::new(pool.clone())),
            Arc::new(PgHelpRequestStore::new(pool.clone())),
            Arc::new(PgProfileStore::new(pool)),
        )
    }

    fn assemble(
        config: AppConfig,
        jwt: JwtKeys,
        pool: Option<Pool<Postgres>>,
        complaints: Arc<dyn ComplaintStore>,
        help_requests: Arc<dyn HelpRequestStore>,
        profiles: Arc<dyn ProfileStore>,
    ) -> Result<Self, AppError> {
        let geocoder: Arc<dyn Geocoder> = Arc::new(NominatimClient::new(&config.geocoding)?);

        let chat: Option<Arc<dyn ChatModel>> = match (config.features.chat, gemini_api_key()) {
            (true, Some(key)) => Some(Arc::new(GeminiClient::new(&config.chat, key)?)),
            (true, None) => {
                tracing::warn!("chat enabled but GEMINI_API_KEY is not set; assistant disabled");
                None
            }
            (false, _) => None,
        };

        Ok(Self {
            pool,
            complaints,
            help_requests,
            profile_cache: ProfileCache::new(profiles.clone(), &config.cache),
            profiles,
            geocoder,
            media: Arc::new(MemoryObjectStore::new(&config.storage.media_bucket)),
            evidence: Arc::new(MemoryObjectStore::new(&config.storage.evidence_bucket)),
            chat,
            jwt,
            chat_limiter: RateLimitState::per_minute(config.rate_limit.chat_per_minute)
                .trusting(config.rate_limit.trusted_proxies.clone()),
            geocode_limiter: RateLimitState::per_minute(config.rate_limit.geocode_per_minute)
                .trusting(config.rate_limit.trusted_proxies.clone()),
            config: Arc::new(config),
        })
    }

    /// Replace the in-memory buckets with S3 buckets, creating them if needed.
    pub async fn with_s3(mut self) -> Result<Self, AppError> {
        let storage = &self.config.storage;
        let media = S3ObjectStore::from_env(&storage.media_bucket, storage.public_base_url.clone())?;
        let evidence =
            S3ObjectStore::from_env(&storage.evidence_bucket, storage.public_base_url.clone())?;
        media.ensure_bucket().await;
        evidence.ensure_bucket().await;
        self.media = Arc::new(media);
        self.evidence = Arc::new(evidence);
        Ok(self)
    }
}

/// Create a connection pool from `DATABASE_URL`, or `None` when it is unset.
/// Uses `connect_lazy` so no connections open until the first query.
pub fn create_pool() -> Result<Option<Pool<Postgres>>, AppError> {
    let Some(database_url) = std::env::var("DATABASE_URL").ok().filter(|u| !u.is_empty()) else {
        return Ok(None);
    };

    let max_connections: u32 = std::env::var("DATABASE_MAX_CONNECTIONS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(10);

    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect_lazy(&database_url)
        .map(Some)
        .map_err(|e| AppError::database(format!("Failed to create database pool: {e}")))
}

/// Run database migrations against the given pool.
pub async fn run_migrations(pool: &Pool<Postgres>) -> Result<(), AppError> {
    sqlx::migrate!("../../migrations")
        .run(pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to run database migrations: {e}")))
}
