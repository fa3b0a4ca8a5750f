use serde_json::{Map, Value};

use crate::media::MediaKind;

/// Maps a provider record to an internal category label, one entry point per kind.
pub trait CategoryClassifier: Send + Sync {
    fn movie_category(&self, record: &Map<String, Value>) -> String;
    fn tv_category(&self, record: &Map<String, Value>) -> String;
    fn anime_category(&self, record: &Map<String, Value>) -> String;
}

/// Dispatches to the classifier entry point for `kind`. Unknown kinds have no category.
pub fn category_for(
    classifier: &dyn CategoryClassifier,
    kind: MediaKind,
    record: &Map<String, Value>,
) -> Option<String> {
    let label = match kind {
        MediaKind::Movie => classifier.movie_category(record),
        MediaKind::Tv => classifier.tv_category(record),
        MediaKind::Anime => classifier.anime_category(record),
        MediaKind::Unknown => return None,
    };
    Some(label).filter(|l| !l.is_empty())
}

/// One fixed label per kind, for setups without a rules engine.
#[derive(Debug, Clone)]
pub struct FixedCategories {
    pub movie: String,
    pub tv: String,
    pub anime: String,
}

impl Default for FixedCategories {
    fn default() -> Self {
        Self {
            movie: "Movies".to_string(),
            tv: "TV Shows".to_string(),
            anime: "Anime".to_string(),
        }
    }
}

impl CategoryClassifier for FixedCategories {
    fn movie_category(&self, _record: &Map<String, Value>) -> String {
        self.movie.clone()
    }

    fn tv_category(&self, _record: &Map<String, Value>) -> String {
        self.tv.clone()
    }

    fn anime_category(&self, _record: &Map<String, Value>) -> String {
        self.anime.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatches_by_kind() {
        let classifier = FixedCategories::default();
        let record = Map::new();
        assert_eq!(
            category_for(&classifier, MediaKind::Movie, &record).as_deref(),
            Some("Movies")
        );
        assert_eq!(
            category_for(&classifier, MediaKind::Tv, &record).as_deref(),
            Some("TV Shows")
        );
        assert_eq!(
            category_for(&classifier, MediaKind::Anime, &record).as_deref(),
            Some("Anime")
        );
        assert_eq!(category_for(&classifier, MediaKind::Unknown, &record), None);
    }

    #[test]
    fn empty_label_means_no_category() {
        let classifier = FixedCategories {
            movie: String::new(),
            ..FixedCategories::default()
        };
        assert_eq!(category_for(&classifier, MediaKind::Movie, &Map::new()), None);
    }
}
