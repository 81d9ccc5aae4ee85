pub mod s3;

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use shared_types::AppError;

pub use s3::S3ObjectStore;

// ── Trait ────────────────────────────────────────────────────────────

/// Public-read object storage. One instance per bucket.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload bytes under `key` and return the object's public URL. Storage
    /// failures are `UpstreamFailed`.
    async fn put(&self, key: &str, content_type: &str, body: Vec<u8>)
        -> Result<String, AppError>;

    /// Public URL of an object, whether or not it exists.
    fn public_url(&self, key: &str) -> String;
}

/// Object key for an upload: `{owner}/{timestamp}_{random}.{ext}`.
///
/// `owner` is the user or entity the file belongs to; the extension is taken
/// from the original file name and falls back to `bin`.
pub fn object_key(owner: &str, file_name: &str) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect();
    format!(
        "{}/{}_{}.{}",
        owner,
        Utc::now().timestamp_millis(),
        suffix.to_lowercase(),
        extension(file_name)
    )
}

fn extension(file_name: &str) -> String {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| {
            !ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric())
        })
        .map(str::to_ascii_lowercase)
        .unwrap_or_else(|| "bin".to_string())
}

// ── In-memory implementation ────────────────────────────────────────

/// Keeps objects in a map. Used by tests and when S3 is disabled.
pub struct MemoryObjectStore {
    base_url: String,
    objects: Mutex<HashMap<String, (String, Vec<u8>)>>,
    /// Uploads with this content type are rejected.
    reject_type: Option<String>,
}

impl MemoryObjectStore {
    pub fn new(bucket: &str) -> Self {
        Self {
            base_url: format!("memory://{bucket}"),
            objects: Mutex::new(HashMap::new()),
            reject_type: None,
        }
    }

    pub fn rejecting(mut self, content_type: impl Into<String>) -> Self {
        self.reject_type = Some(content_type.into());
        self
    }

    /// Content type and bytes stored under `key`.
    pub fn get(&self, key: &str) -> Option<(String, Vec<u8>)> {
        self.objects.lock().ok()?.get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.objects.lock().map(|o| o.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(
        &self,
        key: &str,
        content_type: &str,
        body: Vec<u8>,
    ) -> Result<String, AppError> {
        if self.reject_type.as_deref() == Some(content_type) {
            return Err(AppError::upstream(format!(
                "Upload of '{key}' rejected ({content_type})"
            )));
        }
        self.objects
            .lock()
            .map_err(|_| AppError::internal("Object map lock poisoned"))?
            .insert(key.to_string(), (content_type.to_string(), body));
        Ok(self.public_url(key))
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, key)
    }
}
