use shared_types::AppConfig;
use std::path::Path;

/// Default path of the config file, relative to the working directory.
/// Overridable with `APP_CONFIG`.
const CONFIG_PATH: &str = "config.toml";

/// Parse config file contents. Invalid TOML falls back to defaults.
pub fn parse_config(contents: &str) -> AppConfig {
    toml::from_str(contents).unwrap_or_else(|e| {
        eprintln!("[config] Failed to parse config: {e}; using defaults");
        AppConfig::default()
    })
}

/// Read the config file. If it is missing or unparseable every section
/// takes its defaults (all optional features off).
///
/// Runs before the tracing subscriber is installed, hence `eprintln!`.
pub fn load_config() -> AppConfig {
    let _ = dotenvy::dotenv();
    let path = std::env::var("APP_CONFIG").unwrap_or_else(|_| CONFIG_PATH.to_string());
    load_config_from(Path::new(&path))
}

pub fn load_config_from(path: &Path) -> AppConfig {
    let mut config = match std::fs::read_to_string(path) {
        Ok(contents) => parse_config(&contents),
        Err(e) => {
            eprintln!(
                "[config] {} not found ({e}), using defaults",
                path.display()
            );
            AppConfig::default()
        }
    };
    apply_env_overrides(&mut config);
    eprintln!("[config] Feature flags: {:?}", config.features);
    config
}

/// Environment variables win over the file for deployment-specific values.
fn apply_env_overrides(config: &mut AppConfig) {
    if let Ok(addr) = std::env::var("BIND_ADDR") {
        config.server.bind_addr = addr;
    }
    if let Ok(url) = std::env::var("NOMINATIM_URL") {
        config.geocoding.base_url = url;
    }
    if let Ok(url) = std::env::var("PUBLIC_STORAGE_URL") {
        config.storage.public_base_url = Some(url);
    }
}

/// Gemini API key, if configured.
pub fn gemini_api_key() -> Option<String> {
    std::env::var("GEMINI_API_KEY").ok().filter(|k| !k.is_empty())
}
