use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// Feature flags controlling which optional integrations are active.
///
/// Every field defaults to `false` so that a missing or incomplete config
/// file disables all optional features.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct FeatureFlags {
    /// Store uploads in S3 instead of process memory.
    #[serde(default)]
    pub s3: bool,
    /// Export traces and logs over OTLP.
    #[serde(default)]
    pub telemetry: bool,
    /// Serve the Gemini-backed assistant.
    #[serde(default)]
    pub chat: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerSettings {
    pub bind_addr: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Nominatim search endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GeocodingSettings {
    pub base_url: String,
    /// Sent as `accept-language`.
    pub language: String,
    /// Nominatim's usage policy requires an identifying agent.
    pub user_agent: String,
    pub suggestion_limit: u32,
    pub timeout_secs: u64,
}

impl Default for GeocodingSettings {
    fn default() -> Self {
        Self {
            base_url: "https://nominatim.openstreetmap.org".to_string(),
            language: "en".to_string(),
            user_agent: "rights-platform/0.1".to_string(),
            suggestion_limit: 5,
            timeout_secs: 10,
        }
    }
}

/// Gemini chat completion settings. The API key comes from `GEMINI_API_KEY`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChatSettings {
    pub base_url: String,
    pub model: String,
    pub max_output_tokens: u32,
    pub system_prompt: String,
    pub timeout_secs: u64,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-1.5-flash".to_string(),
            max_output_tokens: 1024,
            system_prompt: "You are a human-rights assistant. Explain rights, reporting \
                            procedures and safety measures clearly and briefly. Never ask \
                            for information that could identify a victim."
                .to_string(),
            timeout_secs: 30,
        }
    }
}

/// Object storage buckets.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageSettings {
    /// Avatars and help-request attachments.
    pub media_bucket: String,
    /// Complaint evidence.
    pub evidence_bucket: String,
    /// Prefix of public object URLs, e.g. a CDN in front of the buckets.
    pub public_base_url: Option<String>,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            media_bucket: "media".to_string(),
            evidence_bucket: "evidence".to_string(),
            public_base_url: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CacheSettings {
    pub profile_ttl_secs: u64,
    pub profile_capacity: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            profile_ttl_secs: 300,
            profile_capacity: 10_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RateLimitSettings {
    pub chat_per_minute: u32,
    pub geocode_per_minute: u32,
    /// Reverse proxies whose `X-Forwarded-For` header is believed. Requests
    /// from any other peer are keyed on the socket address.
    pub trusted_proxies: Vec<IpAddr>,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            chat_per_minute: 20,
            geocode_per_minute: 60,
            trusted_proxies: Vec::new(),
        }
    }
}

/// Top-level config file structure matching `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub features: FeatureFlags,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub geocoding: GeocodingSettings,
    #[serde(default)]
    pub chat: ChatSettings,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub rate_limit: RateLimitSettings,
}
