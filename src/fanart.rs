use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use lru::LruCache;
use reqwest::{Client, Proxy};
use serde::Deserialize;
use serde_json::Value;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::Settings;
use crate::media::MediaKind;

const FANART_BASE: &str = "https://webservice.fanart.tv/v3";

/// Issues the GET behind a fanart lookup and hands back the decoded body.
#[async_trait]
pub trait FanartTransport: Send + Sync {
    async fn get_json(&self, url: &str) -> Result<Value>;
}

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration, proxy: Option<&str>) -> Result<Self> {
        let user_agent = format!("medialink/{}", env!("CARGO_PKG_VERSION"));
        let mut builder = Client::builder().timeout(timeout).user_agent(user_agent);
        if let Some(proxy) = proxy {
            builder = builder.proxy(Proxy::all(proxy).context("Invalid proxy URL")?);
        }
        let client = builder
            .build()
            .context("Failed to build fanart HTTP client")?;
        Ok(Self { client })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(settings.fanart_timeout, settings.proxy.as_deref())
    }
}

#[async_trait]
impl FanartTransport for ReqwestTransport {
    async fn get_json(&self, url: &str) -> Result<Value> {
        let res = self
            .client
            .get(url)
            .send()
            .await
            .context("fanart request failed")?;
        let status = res.status();
        let text = res.text().await.context("reading fanart body failed")?;
        if !status.is_success() {
            // The URL carries the API key, keep it out of the error.
            return Err(anyhow!("fanart HTTP error (status {}): {}", status, text));
        }
        serde_json::from_str(&text).context("fanart JSON parse failed")
    }
}

/// Movie and TV endpoint roots plus the project key appended to each request.
#[derive(Debug, Clone)]
pub struct FanartEndpoints {
    movie_base: String,
    tv_base: String,
    api_key: String,
}

impl FanartEndpoints {
    pub fn new(api_key: &str) -> Self {
        Self::with_base(FANART_BASE, api_key)
    }

    pub fn with_base(base: &str, api_key: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            movie_base: format!("{base}/movies"),
            tv_base: format!("{base}/tv"),
            api_key: api_key.to_string(),
        }
    }

    pub fn url(&self, kind: MediaKind, tmdb_id: u64) -> Option<String> {
        let base = match kind {
            MediaKind::Movie => &self.movie_base,
            MediaKind::Tv | MediaKind::Anime => &self.tv_base,
            MediaKind::Unknown => return None,
        };
        Some(format!(
            "{base}/{tmdb_id}?api_key={}",
            urlencoding::encode(&self.api_key)
        ))
    }
}

#[derive(Debug, Deserialize)]
struct FanartResponse {
    #[serde(default)]
    moviethumb: Vec<Thumb>,
    #[serde(default)]
    tvthumb: Vec<Thumb>,
}

#[derive(Debug, Deserialize)]
struct Thumb {
    url: Option<String>,
}

impl FanartResponse {
    fn first_thumb(&self, kind: MediaKind) -> Option<String> {
        match kind {
            MediaKind::Movie => first_url(&self.moviethumb),
            MediaKind::Tv | MediaKind::Anime => {
                first_url(&self.tvthumb).or_else(|| first_url(&self.moviethumb))
            }
            MediaKind::Unknown => None,
        }
    }
}

fn first_url(thumbs: &[Thumb]) -> Option<String> {
    thumbs
        .first()
        .and_then(|t| t.url.clone())
        .filter(|u| !u.is_empty())
}

/// Bounded, memoizing thumbnail lookup against fanart.tv.
///
/// Answers from well-formed responses are cached per `(kind, tmdb_id)`, including
/// "no thumbnail". Transport errors and malformed bodies are logged and not cached,
/// so a later lookup for the same key asks again.
pub struct ImageLookupCache {
    transport: Arc<dyn FanartTransport>,
    endpoints: FanartEndpoints,
    entries: Mutex<LruCache<(MediaKind, u64), Option<String>>>,
}

impl ImageLookupCache {
    pub fn new(
        transport: Arc<dyn FanartTransport>,
        endpoints: FanartEndpoints,
        capacity: usize,
    ) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            transport,
            endpoints,
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let transport = ReqwestTransport::from_settings(settings)?;
        Ok(Self::new(
            Arc::new(transport),
            FanartEndpoints::new(&settings.fanart_api_key),
            settings.fanart_cache_size,
        ))
    }

    /// Thumbnail URL for the item, else `default`, else empty.
    ///
    /// Returns empty straight away for an unknown kind. Never fails.
    pub async fn lookup(&self, kind: MediaKind, tmdb_id: Option<u64>, default: &str) -> String {
        if !kind.is_known() {
            return String::new();
        }
        let found = match tmdb_id.filter(|id| *id != 0) {
            Some(id) => self.thumbnail(kind, id).await,
            None => None,
        };
        found.unwrap_or_else(|| default.to_string())
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    pub fn clear(&self) {
        self.entries().clear();
    }

    async fn thumbnail(&self, kind: MediaKind, tmdb_id: u64) -> Option<String> {
        let key = (kind, tmdb_id);
        let cached = self.entries().get(&key).cloned();
        if let Some(hit) = cached {
            debug!("Fanart cache hit for {} {}", kind, tmdb_id);
            return hit;
        }

        let url = self.endpoints.url(kind, tmdb_id)?;
        match self.fetch(kind, &url).await {
            Ok(thumb) => {
                self.entries().put(key, thumb.clone());
                thumb
            }
            Err(e) => {
                warn!("Fanart lookup for {} {} failed: {:#}", kind, tmdb_id, e);
                None
            }
        }
    }

    async fn fetch(&self, kind: MediaKind, url: &str) -> Result<Option<String>> {
        let body = self.transport.get_json(url).await?;
        let response: FanartResponse =
            serde_json::from_value(body).context("unexpected fanart response shape")?;
        Ok(response.first_thumb(kind))
    }

    fn entries(&self) -> MutexGuard<'_, LruCache<(MediaKind, u64), Option<String>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn endpoints_route_by_kind() {
        let endpoints = FanartEndpoints::with_base("http://fanart.local/v3/", "k e y");
        assert_eq!(
            endpoints.url(MediaKind::Movie, 603).as_deref(),
            Some("http://fanart.local/v3/movies/603?api_key=k%20e%20y")
        );
        assert_eq!(
            endpoints.url(MediaKind::Anime, 37854).as_deref(),
            Some("http://fanart.local/v3/tv/37854?api_key=k%20e%20y")
        );
        assert_eq!(endpoints.url(MediaKind::Unknown, 1), None);
    }

    #[test]
    fn picks_kind_specific_thumb() {
        let response: FanartResponse = serde_json::from_value(json!({
            "moviethumb": [{ "url": "movie.jpg" }],
            "tvthumb": [{ "url": "" }, { "url": "tv2.jpg" }]
        }))
        .unwrap();
        assert_eq!(response.first_thumb(MediaKind::Movie).as_deref(), Some("movie.jpg"));
        // The first TV entry is empty, so fall back to the movie list.
        assert_eq!(response.first_thumb(MediaKind::Tv).as_deref(), Some("movie.jpg"));
        assert_eq!(response.first_thumb(MediaKind::Unknown), None);
    }

    #[tokio::test]
    async fn reqwest_transport_fetches_and_caches() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/movies/603"))
            .and(query_param("api_key", "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "The Matrix",
                "moviethumb": [{ "id": "1", "url": "https://assets.fanart.tv/matrix.jpg" }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let transport = ReqwestTransport::new(Duration::from_secs(5), None).unwrap();
        let cache = ImageLookupCache::new(
            Arc::new(transport),
            FanartEndpoints::with_base(&server.uri(), "secret"),
            8,
        );
        for _ in 0..2 {
            assert_eq!(
                cache.lookup(MediaKind::Movie, Some(603), "").await,
                "https://assets.fanart.tv/matrix.jpg"
            );
        }
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn http_error_degrades_to_default() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tv/1399"))
            .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
            .mount(&server)
            .await;

        let transport = ReqwestTransport::new(Duration::from_secs(5), None).unwrap();
        let cache = ImageLookupCache::new(
            Arc::new(transport),
            FanartEndpoints::with_base(&server.uri(), "secret"),
            8,
        );
        assert_eq!(cache.lookup(MediaKind::Tv, Some(1399), "fallback.jpg").await, "fallback.jpg");
        assert_eq!(cache.lookup(MediaKind::Tv, Some(1399), "").await, "");
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn timeout_degrades_to_default() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/movies/603"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "moviethumb": [{ "url": "late.jpg" }] }))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let transport = ReqwestTransport::new(Duration::from_millis(200), None).unwrap();
        let cache = ImageLookupCache::new(
            Arc::new(transport),
            FanartEndpoints::with_base(&server.uri(), "secret"),
            8,
        );
        assert_eq!(cache.lookup(MediaKind::Movie, Some(603), "fallback.jpg").await, "fallback.jpg");
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn malformed_body_degrades_to_default() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/movies/603"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
            .expect(2)
            .mount(&server)
            .await;

        let transport = ReqwestTransport::new(Duration::from_secs(5), None).unwrap();
        let cache = ImageLookupCache::new(
            Arc::new(transport),
            FanartEndpoints::with_base(&server.uri(), "secret"),
            8,
        );
        assert_eq!(cache.lookup(MediaKind::Movie, Some(603), "fallback.jpg").await, "fallback.jpg");
        assert_eq!(cache.lookup(MediaKind::Movie, Some(603), "").await, "");
        assert!(cache.is_empty());
    }
}
