use serde_json::{Map, Value};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

use crate::category::{category_for, CategoryClassifier};
use crate::config::Settings;
use crate::fanart::ImageLookupCache;
use crate::media::{MediaEntity, MediaKind};

pub const IMAGE_BASE: &str = "https://image.tmdb.org/t/p/w500";

/// Record keys holding the title, original title and date for a kind.
struct TitleFields {
    title: &'static str,
    original_title: &'static str,
    date: &'static str,
}

const MOVIE_FIELDS: TitleFields = TitleFields {
    title: "title",
    original_title: "original_title",
    date: "release_date",
};

const TV_FIELDS: TitleFields = TitleFields {
    title: "name",
    original_title: "original_name",
    date: "first_air_date",
};

/// Folds a metadata-provider record into a [`MediaEntity`].
pub struct MetadataReconciler {
    images: Arc<ImageLookupCache>,
    classifier: Arc<dyn CategoryClassifier>,
    anime_genre_ids: HashSet<String>,
}

impl MetadataReconciler {
    pub fn new<I, S>(
        images: Arc<ImageLookupCache>,
        classifier: Arc<dyn CategoryClassifier>,
        anime_genre_ids: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            images,
            classifier,
            anime_genre_ids: anime_genre_ids
                .into_iter()
                .map(|id| id.as_ref().trim().to_uppercase())
                .collect(),
        }
    }

    pub fn from_settings(
        settings: &Settings,
        images: Arc<ImageLookupCache>,
        classifier: Arc<dyn CategoryClassifier>,
    ) -> Self {
        Self::new(images, classifier, &settings.anime_genre_ids)
    }

    /// Kind named by the record's `media_type` marker, with TV promoted to
    /// anime when a genre id is on the allow-list.
    pub fn classify(&self, record: &Map<String, Value>) -> Option<MediaKind> {
        let marker = record.get("media_type").and_then(Value::as_str)?;
        match MediaKind::from_marker(marker)? {
            MediaKind::Tv if self.has_anime_genre(record) => Some(MediaKind::Anime),
            kind => Some(kind),
        }
    }

    /// Applies `record` to `entity` and reports whether anything changed.
    ///
    /// All or nothing: an empty record, a missing or unknown `media_type`, or a
    /// missing/zero `id` leaves the entity exactly as it was.
    pub async fn reconcile(&self, entity: &mut MediaEntity, record: &Map<String, Value>) -> bool {
        if record.is_empty() {
            return false;
        }
        let Some(kind) = self.classify(record) else {
            debug!("Provider record has no usable media_type, skipping");
            return false;
        };
        let Some(tmdb_id) = provider_id(record) else {
            debug!("Provider record for {} has no id, skipping", kind);
            return false;
        };
        let fields = match kind {
            MediaKind::Movie => &MOVIE_FIELDS,
            MediaKind::Tv | MediaKind::Anime => &TV_FIELDS,
            MediaKind::Unknown => return false,
        };

        let category = category_for(self.classifier.as_ref(), kind, record);
        let fanart = self.images.lookup(kind, Some(tmdb_id), "").await;

        entity.kind = kind;
        entity.tmdb_id = Some(tmdb_id);
        entity.tmdb_info = record.clone();
        entity.vote_average = record.get("vote_average").and_then(Value::as_f64);
        entity.overview = text(record, "overview");
        entity.title = text(record, fields.title);
        entity.original_title = text(record, fields.original_title);
        entity.year = text(record, fields.date).map(|date| date.chars().take(4).collect());
        entity.category = category;
        entity.poster_url = image_url(record, "poster_path");
        entity.backdrop_url = image_url(record, "backdrop_path");
        entity.fanart_url = Some(fanart).filter(|url| !url.is_empty());

        debug!(
            "Reconciled {} {} as '{}'",
            kind,
            tmdb_id,
            entity.title.as_deref().unwrap_or("")
        );
        true
    }

    fn has_anime_genre(&self, record: &Map<String, Value>) -> bool {
        let genres = match record.get("genre_ids") {
            None | Some(Value::Null) => return false,
            Some(Value::Array(ids)) => ids.iter().map(genre_key).collect::<Vec<_>>(),
            Some(id) => vec![genre_key(id)],
        };
        genres.iter().any(|g| self.anime_genre_ids.contains(g))
    }
}

fn genre_key(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_uppercase(),
        other => other.to_string().to_uppercase(),
    }
}

/// Provider id from `id`; zero counts as absent.
fn provider_id(record: &Map<String, Value>) -> Option<u64> {
    let id = match record.get("id")? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    id.filter(|id| *id != 0)
}

fn text(record: &Map<String, Value>, key: &str) -> Option<String> {
    record
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn image_url(record: &Map<String, Value>, key: &str) -> Option<String> {
    text(record, key).map(|path| format!("{IMAGE_BASE}{path}"))
}
