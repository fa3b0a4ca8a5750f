use anyhow::{anyhow, Context, Result};
use std::env;
use std::time::Duration;

pub const DEFAULT_ANIME_GENRE_IDS: &[&str] = &["16"];
pub const DEFAULT_FANART_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_FANART_CACHE_SIZE: usize = 256;

#[derive(Debug, Clone)]
pub struct Settings {
    pub fanart_api_key: String,
    pub tmdb_api_key: Option<String>,
    pub proxy: Option<String>,
    pub fanart_timeout: Duration,
    pub anime_genre_ids: Vec<String>,
    pub fanart_cache_size: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            fanart_api_key: String::new(),
            tmdb_api_key: None,
            proxy: None,
            fanart_timeout: Duration::from_secs(DEFAULT_FANART_TIMEOUT_SECS),
            anime_genre_ids: DEFAULT_ANIME_GENRE_IDS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            fanart_cache_size: DEFAULT_FANART_CACHE_SIZE,
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Reads settings through `get`, which returns `None` for missing keys.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let read = |key: &str| get(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut settings = Settings::default();

        if let Some(key) = read("FANART_API_KEY") {
            settings.fanart_api_key = key;
        }
        settings.tmdb_api_key = read("TMDB_API_KEY");
        settings.proxy = read("MEDIALINK_PROXY");

        if let Some(secs) = read("FANART_TIMEOUT_SECS") {
            let secs: u64 = secs
                .parse()
                .with_context(|| format!("FANART_TIMEOUT_SECS must be a whole number, got '{}'", secs))?;
            if secs == 0 {
                return Err(anyhow!("FANART_TIMEOUT_SECS must be at least 1"));
            }
            settings.fanart_timeout = Duration::from_secs(secs);
        }
        if let Some(size) = read("FANART_CACHE_SIZE") {
            let size: usize = size
                .parse()
                .with_context(|| format!("FANART_CACHE_SIZE must be a whole number, got '{}'", size))?;
            if size == 0 {
                return Err(anyhow!("FANART_CACHE_SIZE must be at least 1"));
            }
            settings.fanart_cache_size = size;
        }
        if let Some(ids) = read("ANIME_GENRE_IDS") {
            settings.anime_genre_ids = ids
                .split(',')
                .map(|id| id.trim().to_string())
                .filter(|id| !id.is_empty())
                .collect();
        }
        Ok(settings)
    }

    pub fn require_fanart_key(&self) -> Result<&str> {
        if self.fanart_api_key.is_empty() {
            return Err(anyhow!("Missing required environment variable: FANART_API_KEY"));
        }
        Ok(&self.fanart_api_key)
    }

    pub fn require_tmdb_key(&self) -> Result<&str> {
        self.tmdb_api_key
            .as_deref()
            .ok_or_else(|| anyhow!("Missing required environment variable: TMDB_API_KEY"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let settings = Settings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(settings.fanart_timeout, Duration::from_secs(10));
        assert_eq!(settings.fanart_cache_size, 256);
        assert_eq!(settings.anime_genre_ids, vec!["16".to_string()]);
        assert!(settings.proxy.is_none());
        assert!(settings.require_fanart_key().is_err());
        assert!(settings.require_tmdb_key().is_err());
    }

    #[test]
    fn reads_overrides() {
        let settings = Settings::from_lookup(lookup(&[
            ("FANART_API_KEY", "abc"),
            ("MEDIALINK_PROXY", "http://127.0.0.1:7890"),
            ("FANART_TIMEOUT_SECS", "3"),
            ("FANART_CACHE_SIZE", "32"),
            ("ANIME_GENRE_IDS", "16, anime ,"),
        ]))
        .unwrap();
        assert_eq!(settings.require_fanart_key().unwrap(), "abc");
        assert_eq!(settings.proxy.as_deref(), Some("http://127.0.0.1:7890"));
        assert_eq!(settings.fanart_timeout, Duration::from_secs(3));
        assert_eq!(settings.fanart_cache_size, 32);
        assert_eq!(settings.anime_genre_ids, vec!["16", "anime"]);
    }

    #[test]
    fn rejects_bad_numbers() {
        assert!(Settings::from_lookup(lookup(&[("FANART_TIMEOUT_SECS", "soon")])).is_err());
        assert!(Settings::from_lookup(lookup(&[("FANART_TIMEOUT_SECS", "0")])).is_err());
        assert!(Settings::from_lookup(lookup(&[("FANART_CACHE_SIZE", "0")])).is_err());
    }
}
