//! Fetch a TMDB record, reconcile it into a media entity and print the projections.
//! Usage:
//!   medialink movie|tv <tmdb_id> [raw title] [season] [episode]
//!   medialink search <query>
//! Seasons and episodes accept `3` or `3-5`.
//! Requires TMDB_API_KEY and FANART_API_KEY in the environment (.env supported).

use anyhow::{anyhow, Context, Result};
use dotenvy::dotenv;
use medialink::tmdb::{parse_tmdb_id, TmdbApi, TmdbClient};
use medialink::{
    FixedCategories, ImageLookupCache, MediaEntity, MediaKind, MetadataReconciler, Settings, Span,
};
use std::env;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

fn usage() -> ! {
    eprintln!("Usage: medialink movie|tv <tmdb_id> [raw title] [season] [episode]");
    eprintln!("       medialink search <query>");
    std::process::exit(1);
}

#[tokio::main]
async fn main() -> Result<()> {
    let loaded = dotenv();
    init_tracing();
    if let Err(e) = loaded {
        warn!("No .env file loaded ({}) - relying on environment", e);
    }

    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        usage();
    }

    let settings = Settings::from_env()?;
    settings.require_fanart_key()?;
    let tmdb = TmdbClient::from_settings(&settings)?;
    let images = Arc::new(ImageLookupCache::from_settings(&settings)?);
    let reconciler =
        MetadataReconciler::from_settings(&settings, images, Arc::new(FixedCategories::default()));

    let (mut entity, record) = if args[1] == "search" {
        let query = args[2..].join(" ");
        let record = tmdb
            .search_multi(&query)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("No TMDB result for '{}'", query))?;
        (MediaEntity::new(&query, None), record)
    } else {
        let kind: MediaKind = args[1].parse()?;
        let id = parse_tmdb_id(&args[2]).context("tmdb_id must be an integer")?;
        let raw_title = args.get(3).unwrap_or(&args[2]);
        let mut entity = MediaEntity::new(raw_title, None);
        if let Some(season) = args.get(4) {
            entity.seasons = season.parse::<Span>().context("invalid season")?;
        }
        if let Some(episode) = args.get(5) {
            entity.episodes = episode.parse::<Span>().context("invalid episode")?;
        }
        (entity, tmdb.fetch_record(kind, id).await?)
    };

    if !reconciler.reconcile(&mut entity, &record).await {
        return Err(anyhow!("TMDB record could not be classified"));
    }
    info!("Reconciled {} {:?}", entity.kind, entity.tmdb_id);

    println!("{:<20} {}", "Kind", entity.kind);
    println!("{:<20} {}", "Title", entity.title_vote_display());
    println!("{:<20} {}", "Original title", entity.original_title.as_deref().unwrap_or(""));
    println!("{:<20} {}", "Category", entity.category.as_deref().unwrap_or(""));
    println!("{:<20} {}", "Season/Episode", entity.season_episode_display());
    println!("{:<20} {}", "Episode items", entity.episode_items_display());
    println!("{:<20} {}", "Backdrop", entity.backdrop_image());
    println!("{:<20} {}", "Message image", entity.message_image());
    println!("{:<20} {}", "Overview", entity.overview.as_deref().unwrap_or(""));
    Ok(())
}
