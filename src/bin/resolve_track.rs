//! Resolve a single track and print the match decision as JSON
//!
//! Usage: resolve-track --title "Song" --artist "Band" [--album ..] [--isrc ..]

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use playlist_transfer::apple_music::AppleMusicClient;
use playlist_transfer::config::SessionConfig;
use playlist_transfer::matcher::MatchEngine;
use playlist_transfer::models::SourceRecord;
use playlist_transfer::progress::init_tracing;

#[derive(Parser)]
#[command(name = "resolve-track")]
#[command(about = "Resolve one track against the Apple Music catalog")]
struct Args {
    #[arg(long)]
    title: String,

    #[arg(long, default_value = "")]
    artist: String,

    #[arg(long, default_value = "")]
    album: String,

    /// Defaults to --artist
    #[arg(long)]
    album_artist: Option<String>,

    #[arg(long, default_value = "")]
    isrc: String,

    #[arg(long, default_value = ".")]
    credentials_dir: PathBuf,

    #[arg(long)]
    storefront: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing();

    let config = SessionConfig::load(&args.credentials_dir, args.storefront.as_deref())
        .context("Failed to load Apple Music credentials")?;
    let client = AppleMusicClient::new(config);

    let record = SourceRecord {
        album_artist: args.album_artist.unwrap_or_else(|| args.artist.clone()),
        title: args.title,
        artist: args.artist,
        album: args.album,
        isrc: args.isrc,
    };

    let decision = MatchEngine::new(&client).resolve(&record);
    println!("{}", serde_json::to_string_pretty(&decision)?);

    Ok(())
}
