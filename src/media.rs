use anyhow::Result;
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::range::Span;

/// Placeholder shown when no artwork could be resolved.
pub const DEFAULT_IMAGE: &str = "../static/img/tmdb.webp";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Movie,
    Tv,
    Anime,
    #[default]
    Unknown,
}

impl MediaKind {
    /// Maps a provider `media_type` marker. Unrecognised markers yield `None`.
    pub fn from_marker(marker: &str) -> Option<Self> {
        match marker.trim().to_ascii_lowercase().as_str() {
            "movie" => Some(MediaKind::Movie),
            "tv" => Some(MediaKind::Tv),
            "anime" => Some(MediaKind::Anime),
            _ => None,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, MediaKind::Unknown)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Movie => "Movie",
            MediaKind::Tv => "TV",
            MediaKind::Anime => "Anime",
            MediaKind::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaKind {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self> {
        MediaKind::from_marker(s)
            .ok_or_else(|| anyhow::anyhow!("media kind must be 'movie', 'tv' or 'anime'"))
    }
}

/// Attributes of the torrent/source a media item was found in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TorrentInfo {
    pub site: Option<String>,
    pub site_order: i32,
    pub enclosure: Option<String>,
    pub res_order: i32,
    pub size: u64,
    pub seeders: u32,
    pub peers: u32,
    pub description: Option<String>,
}

/// Canonical record for one identified media item.
///
/// Built from the raw title a tokenizer saw, then enriched in place by
/// [`crate::reconcile::MetadataReconciler`] and [`MediaEntity::set_torrent_info`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaEntity {
    pub org_string: Option<String>,
    pub subtitle: Option<String>,
    pub kind: MediaKind,
    pub cn_name: Option<String>,
    pub en_name: Option<String>,
    pub total_seasons: u32,
    pub seasons: Span,
    pub total_episodes: u32,
    pub episodes: Span,
    /// Part/CD/Disc marker.
    pub part: Option<String>,
    pub resource_type: Option<String>,
    pub resource_pix: Option<String>,
    pub category: Option<String>,
    pub tmdb_id: Option<u64>,
    pub tmdb_info: Map<String, Value>,
    pub title: Option<String>,
    pub original_title: Option<String>,
    pub year: Option<String>,
    pub poster_url: Option<String>,
    pub backdrop_url: Option<String>,
    pub fanart_url: Option<String>,
    pub vote_average: Option<f64>,
    pub overview: Option<String>,
    pub torrent: TorrentInfo,
}

impl MediaEntity {
    /// An empty title yields an inert entity.
    pub fn new(title: &str, subtitle: Option<&str>) -> Self {
        if title.is_empty() {
            return Self::default();
        }
        Self {
            org_string: Some(title.to_string()),
            subtitle: subtitle.map(str::to_string),
            ..Self::default()
        }
    }

    pub fn is_inert(&self) -> bool {
        self.org_string.is_none()
    }

    pub fn is_movie(&self) -> bool {
        self.kind == MediaKind::Movie
    }

    pub fn display_name(&self) -> &str {
        non_empty(&self.cn_name)
            .or_else(|| non_empty(&self.en_name))
            .unwrap_or("")
    }

    pub fn title_display(&self) -> String {
        let title = self.title.as_deref().unwrap_or("");
        match non_empty(&self.year) {
            Some(year) => format!("{title} ({year})"),
            None => title.to_string(),
        }
    }

    pub fn vote_display(&self) -> String {
        match self.vote_average {
            Some(vote) if vote != 0.0 => format!("Rating: {vote:.1}"),
            _ => String::new(),
        }
    }

    pub fn title_vote_display(&self) -> String {
        let vote = self.vote_display();
        if vote.is_empty() {
            self.title_display()
        } else {
            format!("{} {}", self.title_display(), vote)
        }
    }

    pub fn resource_type_display(&self) -> String {
        match (non_empty(&self.resource_type), non_empty(&self.resource_pix)) {
            (Some(kind), Some(pix)) => format!("{kind} {pix}"),
            (Some(kind), None) => kind.to_string(),
            (None, Some(pix)) => pix.to_string(),
            (None, None) => String::new(),
        }
    }

    pub fn backdrop_image(&self) -> &str {
        non_empty(&self.fanart_url)
            .or_else(|| non_empty(&self.backdrop_url))
            .unwrap_or(DEFAULT_IMAGE)
    }

    pub fn message_image(&self) -> &str {
        non_empty(&self.fanart_url)
            .or_else(|| non_empty(&self.poster_url))
            .unwrap_or(DEFAULT_IMAGE)
    }

    // Seasons default to S01 for anything that isn't a movie.
    fn effective_seasons(&self) -> Span {
        if self.seasons.is_unset() {
            Span::single(1)
        } else {
            self.seasons
        }
    }

    pub fn season_display(&self) -> String {
        if self.is_movie() {
            return String::new();
        }
        self.effective_seasons().label('S')
    }

    pub fn season_item_display(&self) -> String {
        if self.is_movie() {
            return String::new();
        }
        self.effective_seasons().first_label('S')
    }

    pub fn season_list(&self) -> Vec<u32> {
        if self.is_movie() {
            return Vec::new();
        }
        self.effective_seasons().units()
    }

    pub fn episode_display(&self) -> String {
        if self.is_movie() {
            return String::new();
        }
        self.episodes.label('E')
    }

    pub fn episode_list(&self) -> Vec<u32> {
        self.episodes.units()
    }

    /// Multi-episode single-file form, e.g. `E03E04E05`.
    pub fn episode_items_display(&self) -> String {
        self.episodes.items('E')
    }

    pub fn season_episode_display(&self) -> String {
        if self.is_movie() {
            return String::new();
        }
        let parts = [self.season_display(), self.episode_display()];
        parts
            .iter()
            .filter(|p| !p.is_empty())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Membership of one season. An unset season counts as S01, movies included.
    pub fn is_in_season(&self, season: u32) -> bool {
        self.effective_seasons().contains(season)
    }

    /// True when every queried season is covered.
    pub fn contains_seasons(&self, seasons: &[u32]) -> bool {
        self.effective_seasons().contains_all(seasons)
    }

    pub fn is_in_episode(&self, episode: u32) -> bool {
        self.episodes.contains(episode)
    }

    /// True when every queried episode is covered. Never true without a begin episode.
    pub fn contains_episodes(&self, episodes: &[u32]) -> bool {
        !self.episodes.is_unset() && self.episodes.contains_all(episodes)
    }

    /// Overwrites all torrent attributes; use `..Default::default()` for omitted ones.
    pub fn set_torrent_info(&mut self, info: TorrentInfo) {
        self.torrent = info;
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}
