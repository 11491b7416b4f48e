// src/config.rs
use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub listen_addr: String,
    pub log_level: String,
    pub predictor_url: Option<String>,
    pub predictor_timeout_secs: u64,
    pub image_fetch_timeout_secs: u64,
    pub max_upload_bytes: usize,
    pub max_analysis_side: u32,
    pub content_catalog_path: Option<String>,
    pub content_seed: Option<u64>,
    pub static_dir: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8000".to_string(),
            log_level: "info".to_string(),
            predictor_url: None,
            predictor_timeout_secs: 30,
            image_fetch_timeout_secs: 15,
            max_upload_bytes: 20_971_520,
            max_analysis_side: 1024,
            content_catalog_path: None,
            content_seed: None,
            static_dir: "./static".to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup, falling back to defaults for
    /// missing or unparsable values.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            listen_addr: non_empty("LISTEN_ADDR").unwrap_or(defaults.listen_addr),
            log_level: non_empty("LOG_LEVEL").unwrap_or(defaults.log_level),
            predictor_url: non_empty("PREDICTOR_URL")
                .map(|url| url.trim_end_matches('/').to_string()),
            predictor_timeout_secs: non_empty("PREDICTOR_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.predictor_timeout_secs),
            image_fetch_timeout_secs: non_empty("IMAGE_FETCH_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.image_fetch_timeout_secs),
            max_upload_bytes: non_empty("MAX_UPLOAD_BYTES")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_upload_bytes),
            max_analysis_side: non_empty("MAX_ANALYSIS_SIDE")
                .and_then(|v| v.parse().ok())
                .filter(|side: &u32| *side >= 64)
                .unwrap_or(defaults.max_analysis_side),
            content_catalog_path: non_empty("CONTENT_CATALOG_PATH"),
            content_seed: non_empty("CONTENT_SEED").and_then(|v| v.parse().ok()),
            static_dir: non_empty("STATIC_DIR").unwrap_or(defaults.static_dir),
        }
    }

    pub fn predictor_timeout(&self) -> Duration {
        Duration::from_secs(self.predictor_timeout_secs)
    }

    pub fn image_fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.image_fetch_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_nothing_set() {
        let config = AppConfig::from_lookup(|_| None);
        assert_eq!(config.listen_addr, "0.0.0.0:8000");
        assert_eq!(config.max_analysis_side, 1024);
        assert!(config.predictor_url.is_none());
        assert!(config.content_seed.is_none());
    }

    #[test]
    fn test_overrides_and_bad_values() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("PREDICTOR_URL", "http://inference:9000/"),
            ("PREDICTOR_TIMEOUT_SECS", "5"),
            ("MAX_ANALYSIS_SIDE", "12"),
            ("CONTENT_SEED", "42"),
            ("MAX_UPLOAD_BYTES", "lots"),
        ]));
        assert_eq!(config.predictor_url.as_deref(), Some("http://inference:9000"));
        assert_eq!(config.predictor_timeout(), Duration::from_secs(5));
        // Below the floor, so the default wins.
        assert_eq!(config.max_analysis_side, 1024);
        assert_eq!(config.content_seed, Some(42));
        assert_eq!(config.max_upload_bytes, 20_971_520);
    }
}
