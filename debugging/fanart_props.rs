//! Fetch the raw fanart.tv response for a TMDB id and print the resolved thumbnail.
//! Usage:
//!   cargo run --bin fanart_props -- movie <tmdb_id>
//!   cargo run --bin fanart_props -- tv <tmdb_id>
//! Requires FANART_API_KEY in the environment (.env supported).

use anyhow::{anyhow, Context, Result};
use dotenvy::dotenv;
use medialink::tmdb::parse_tmdb_id;
use medialink::{
    FanartEndpoints, FanartTransport, ImageLookupCache, MediaKind, ReqwestTransport, Settings,
};
use std::env;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: cargo run --bin fanart_props -- movie <tmdb_id>");
        eprintln!("       cargo run --bin fanart_props -- tv <tmdb_id>");
        std::process::exit(1);
    }

    let kind: MediaKind = args[1].parse()?;
    let tmdb_id = parse_tmdb_id(&args[2]).context("tmdb_id must be an integer")?;
    let settings = Settings::from_env()?;
    let endpoints = FanartEndpoints::new(settings.require_fanart_key()?);
    let url = endpoints
        .url(kind, tmdb_id)
        .ok_or_else(|| anyhow!("no fanart endpoint for {}", kind))?;

    let transport = Arc::new(ReqwestTransport::from_settings(&settings)?);
    let raw = transport.get_json(&url).await?;
    println!("{}", serde_json::to_string_pretty(&raw)?);

    let cache = ImageLookupCache::new(transport, endpoints, 1);
    let thumb = cache.lookup(kind, Some(tmdb_id), "").await;
    println!();
    println!("Thumbnail: {}", if thumb.is_empty() { "(none)" } else { thumb.as_str() });
    Ok(())
}
