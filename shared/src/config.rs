use crate::TtlMs;
use tracing::warn;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreKind {
    Memory,
    Sled,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub api_base_url: String,
    pub data_dir: String,
    pub store: StoreKind,
    pub memory_max_entries: Option<u64>,
    pub default_ttl: TtlMs,
    pub request_timeout_ms: u64,
    pub key_prefix: String,
}

impl Config {
    const DEFAULT_API_URL: &'static str = "http://localhost:5000";
    const DEFAULT_DATA_DIR: &'static str = "./data";
    const DEFAULT_KEY_PREFIX: &'static str = "calendar_events_";
    const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let store = match lookup("GROUPCAL_STORE").as_deref().map(str::trim) {
            None | Some("sled") => StoreKind::Sled,
            Some("memory") => StoreKind::Memory,
            Some(other) => {
                warn!("Unknown GROUPCAL_STORE '{}', falling back to sled", other);
                StoreKind::Sled
            }
        };

        Self {
            api_base_url: lookup("GROUPCAL_API_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| Self::DEFAULT_API_URL.to_string()),
            data_dir: lookup("GROUPCAL_DATA_DIR")
                .unwrap_or_else(|| Self::DEFAULT_DATA_DIR.to_string()),
            store,
            memory_max_entries: lookup("GROUPCAL_MEMORY_MAX_ENTRIES")
                .and_then(|raw| parse_or_warn("GROUPCAL_MEMORY_MAX_ENTRIES", &raw)),
            default_ttl: lookup("GROUPCAL_DEFAULT_TTL_MS")
                .and_then(|raw| parse_or_warn("GROUPCAL_DEFAULT_TTL_MS", &raw))
                .map(TtlMs)
                .unwrap_or_default(),
            request_timeout_ms: lookup("GROUPCAL_REQUEST_TIMEOUT_MS")
                .and_then(|raw| parse_or_warn("GROUPCAL_REQUEST_TIMEOUT_MS", &raw))
                .unwrap_or(Self::DEFAULT_REQUEST_TIMEOUT_MS),
            key_prefix: lookup("GROUPCAL_KEY_PREFIX")
                .unwrap_or_else(|| Self::DEFAULT_KEY_PREFIX.to_string()),
        }
    }

    /// Location of the sled database inside the data directory
    pub fn sled_path(&self) -> std::path::PathBuf {
        std::path::Path::new(&self.data_dir).join("event_cache.sled")
    }
}

fn parse_or_warn(name: &str, raw: &str) -> Option<u64> {
    match raw.trim().parse::<u64>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("{} is not a number ('{}'), using default", name, raw);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_nothing_is_set() {
        let config = Config::from_lookup(|_| None);

        assert_eq!(config.api_base_url, "http://localhost:5000");
        assert_eq!(config.store, StoreKind::Sled);
        assert_eq!(config.default_ttl, TtlMs(3_600_000));
        assert_eq!(config.request_timeout_ms, 30_000);
        assert_eq!(config.key_prefix, "calendar_events_");
        assert!(config.memory_max_entries.is_none());
    }

    #[test]
    fn test_overrides_are_applied() {
        let config = Config::from_lookup(lookup_from(&[
            ("GROUPCAL_API_URL", "https://cal.example.org/"),
            ("GROUPCAL_STORE", "memory"),
            ("GROUPCAL_MEMORY_MAX_ENTRIES", "64"),
            ("GROUPCAL_DEFAULT_TTL_MS", "1000"),
        ]));

        assert_eq!(config.api_base_url, "https://cal.example.org");
        assert_eq!(config.store, StoreKind::Memory);
        assert_eq!(config.memory_max_entries, Some(64));
        assert_eq!(config.default_ttl, TtlMs(1000));
    }

    #[test]
    fn test_bad_numbers_fall_back_to_defaults() {
        let config = Config::from_lookup(lookup_from(&[
            ("GROUPCAL_DEFAULT_TTL_MS", "an hour"),
            ("GROUPCAL_REQUEST_TIMEOUT_MS", "-5"),
        ]));

        assert_eq!(config.default_ttl, TtlMs::DEFAULT);
        assert_eq!(config.request_timeout_ms, 30_000);
    }

    #[test]
    fn test_sled_path_lives_under_data_dir() {
        let config = Config::from_lookup(lookup_from(&[("GROUPCAL_DATA_DIR", "/tmp/groupcal")]));
        assert_eq!(
            config.sled_path(),
            std::path::PathBuf::from("/tmp/groupcal/event_cache.sled")
        );
    }
}
