use std::{collections::HashMap, fs, path::Path};

use serde::Deserialize;
use tracing::warn;

pub const DEFAULT_CONFIG_FILE: &str = "moodzoo.toml";
pub const DEFAULT_LIGHTHOUSE_ENDPOINT: &str = "https://node.lighthouse.storage";
pub const DEFAULT_GATEWAY_URL: &str = "https://gateway.lighthouse.storage/ipfs/";

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Settings {
    pub database_url: String,
    pub lighthouse_endpoint: String,
    pub lighthouse_api_key: Option<String>,
    pub gateway_url: String,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: "sqlite://./data/moodzoo.db".into(),
            lighthouse_endpoint: DEFAULT_LIGHTHOUSE_ENDPOINT.into(),
            lighthouse_api_key: None,
            gateway_url: DEFAULT_GATEWAY_URL.into(),
            log_filter: "info".into(),
        }
    }
}

/// Defaults, then `moodzoo.toml` (or `config_path`), then environment variables.
pub fn load_settings(config_path: Option<&Path>) -> Settings {
    let mut settings = Settings::default();

    let path = config_path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
    if let Ok(raw) = fs::read_to_string(path) {
        apply_file(&mut settings, &raw);
    } else if config_path.is_some() {
        warn!(path = %path.display(), "config file not readable; using defaults");
    }

    apply_env(&mut settings, |name| std::env::var(name).ok());
    settings.database_url = normalize_database_url(&settings.database_url);
    settings
}

fn apply_file(settings: &mut Settings, raw: &str) {
    let file_cfg = match toml::from_str::<HashMap<String, String>>(raw) {
        Ok(file_cfg) => file_cfg,
        Err(error) => {
            warn!(%error, "ignoring malformed config file");
            return;
        }
    };

    if let Some(v) = file_cfg.get("database_url") {
        settings.database_url = v.clone();
    }
    if let Some(v) = file_cfg.get("lighthouse_endpoint") {
        settings.lighthouse_endpoint = v.clone();
    }
    if let Some(v) = file_cfg.get("lighthouse_api_key") {
        settings.lighthouse_api_key = Some(v.clone());
    }
    if let Some(v) = file_cfg.get("gateway_url") {
        settings.gateway_url = v.clone();
    }
    if let Some(v) = file_cfg.get("log_filter") {
        settings.log_filter = v.clone();
    }
}

fn apply_env(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("DATABASE_URL") {
        settings.database_url = v;
    }
    if let Some(v) = lookup("APP__DATABASE_URL") {
        settings.database_url = v;
    }

    if let Some(v) = lookup("LIGHTHOUSE_API_KEY") {
        settings.lighthouse_api_key = Some(v);
    }
    if let Some(v) = lookup("APP__LIGHTHOUSE_API_KEY") {
        settings.lighthouse_api_key = Some(v);
    }

    if let Some(v) = lookup("APP__LIGHTHOUSE_ENDPOINT") {
        settings.lighthouse_endpoint = v;
    }
    if let Some(v) = lookup("APP__GATEWAY_URL") {
        settings.gateway_url = v;
    }
    if let Some(v) = lookup("RUST_LOG") {
        settings.log_filter = v;
    }

    if settings
        .lighthouse_api_key
        .as_deref()
        .is_some_and(|key| key.trim().is_empty())
    {
        settings.lighthouse_api_key = None;
    }
}

pub fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return Settings::default().database_url;
    }

    if raw_database_url.starts_with("sqlite::memory:")
        || raw_database_url.starts_with("sqlite://")
        || raw_database_url.contains("://")
    {
        return raw_database_url.to_string();
    }

    if let Some(path) = raw_database_url.strip_prefix("sqlite:") {
        let path = path.replace('\\', "/");
        return format!("sqlite://{path}");
    }

    format!("sqlite://{}", raw_database_url.replace('\\', "/"))
}
