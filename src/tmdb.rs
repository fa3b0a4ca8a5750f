use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::time::Duration;

use crate::config::Settings;
use crate::media::MediaKind;

const TMDB_BASE: &str = "https://api.themoviedb.org/3";

/// Source of raw provider records in the shape [`crate::reconcile::MetadataReconciler`] consumes.
#[async_trait]
pub trait TmdbApi: Send + Sync {
    async fn fetch_record(&self, kind: MediaKind, id: u64) -> Result<Map<String, Value>>;
    async fn search_multi(&self, query: &str) -> Result<Vec<Map<String, Value>>>;
}

#[derive(Debug, Clone)]
pub struct TmdbClient {
    client: Client,
    api_key: String,
    base: String,
}

impl TmdbClient {
    pub fn new(api_key: &str, settings: &Settings) -> Result<Self> {
        Self::with_base(TMDB_BASE, api_key, settings)
    }

    pub fn with_base(base: &str, api_key: &str, settings: &Settings) -> Result<Self> {
        let mut builder = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(30));
        if let Some(proxy) = settings.proxy.as_deref() {
            builder = builder.proxy(reqwest::Proxy::all(proxy).context("Invalid proxy URL")?);
        }
        Ok(Self {
            client: builder.build().context("Failed to build TMDB HTTP client")?,
            api_key: api_key.to_string(),
            base: base.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(settings.require_tmdb_key()?, settings)
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: &str) -> Result<T> {
        let res = self
            .client
            .get(url)
            .send()
            .await
            .context("request failed")?;
        let status = res.status();
        let text = res.text().await.context("reading body failed")?;
        if !status.is_success() {
            return Err(anyhow!("TMDB HTTP error (status {}): {}", status, text));
        }
        let parsed: T = serde_json::from_str(&text).context("JSON parse failed")?;
        Ok(parsed)
    }
}

#[async_trait]
impl TmdbApi for TmdbClient {
    async fn fetch_record(&self, kind: MediaKind, id: u64) -> Result<Map<String, Value>> {
        let (segment, marker) = match kind {
            MediaKind::Movie => ("movie", "movie"),
            MediaKind::Tv | MediaKind::Anime => ("tv", "tv"),
            MediaKind::Unknown => return Err(anyhow!("cannot fetch a record of unknown kind")),
        };
        let url = format!(
            "{}/{segment}/{id}?language=en-US&api_key={}",
            self.base, self.api_key
        );
        let value: Value = self.get_json(&url).await?;
        let Value::Object(mut record) = value else {
            return Err(anyhow!("TMDB {} {} did not return an object", segment, id));
        };
        record.insert("media_type".to_string(), Value::from(marker));
        flatten_genres(&mut record);
        Ok(record)
    }

    async fn search_multi(&self, query: &str) -> Result<Vec<Map<String, Value>>> {
        #[derive(Deserialize)]
        struct SearchResponse {
            #[serde(default)]
            results: Vec<Value>,
        }

        let url = format!(
            "{}/search/multi?api_key={}&query={}&language=en-US",
            self.base,
            self.api_key,
            urlencoding::encode(query)
        );
        let data: SearchResponse = self.get_json(&url).await?;
        Ok(data
            .results
            .into_iter()
            .filter_map(|v| match v {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .filter(|r| r.get("media_type").and_then(Value::as_str) != Some("person"))
            .collect())
    }
}

/// Detail responses carry `genres: [{id, name}]`; search results carry
/// `genre_ids`. Fill `genre_ids` from `genres` when it is missing.
fn flatten_genres(record: &mut Map<String, Value>) {
    if record.contains_key("genre_ids") {
        return;
    }
    let ids: Vec<Value> = record
        .get("genres")
        .and_then(Value::as_array)
        .map(|genres| {
            genres
                .iter()
                .filter_map(|g| g.get("id").cloned())
                .collect()
        })
        .unwrap_or_default();
    record.insert("genre_ids".to_string(), Value::Array(ids));
}

pub fn parse_tmdb_id(input: &str) -> Option<u64> {
    let input = input.trim();
    if !input.is_empty() && input.chars().all(|c| c.is_ascii_digit()) {
        return input.parse().ok();
    }
    None
}
