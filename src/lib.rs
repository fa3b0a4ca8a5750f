//! Normalizes filename tokens, metadata-provider records and torrent attributes
//! into one [`media::MediaEntity`] and derives display strings and season/episode
//! queries from it.

pub mod category;
pub mod config;
pub mod fanart;
pub mod media;
pub mod range;
pub mod reconcile;
pub mod tmdb;

pub use category::{CategoryClassifier, FixedCategories};
pub use config::Settings;
pub use fanart::{FanartEndpoints, FanartTransport, ImageLookupCache, ReqwestTransport};
pub use media::{MediaEntity, MediaKind, TorrentInfo};
pub use range::Span;
pub use reconcile::MetadataReconciler;
