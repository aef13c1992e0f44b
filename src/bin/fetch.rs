//! Downloads one song into the library from the command line.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use resonance_scraper::{
    config::absolute_dir,
    songs::{DownloadRequest, Songify},
    upstream::{UltimateGuitarClient, UltimateGuitarConfig},
    SongRepository, SongService,
};

#[derive(Parser)]
#[command(name = "resonance-fetch")]
#[command(about = "Download chords and tabs for a song", long_about = None)]
struct Cli {
    /// Artist name
    artist: String,

    /// Song title
    song: String,

    /// Song library directory
    #[arg(long, env = "SONGS_DIR", default_value = "../songs")]
    songs: PathBuf,

    /// Use this chords tab instead of the best-ranked hit
    #[arg(long)]
    chord_id: Option<i64>,

    /// Use this tab instead of the best-ranked hit
    #[arg(long)]
    tab_id: Option<i64>,

    /// song.json converter script
    #[arg(long, env = "SONGIFY_SCRIPT")]
    songify_script: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "resonance_scraper=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let songs_dir = absolute_dir(&cli.songs).context("resolving songs directory")?;

    let client = UltimateGuitarClient::new(UltimateGuitarConfig::default())
        .context("building tab site client")?;
    let songify = Songify::discover(&songs_dir, cli.songify_script.as_deref());
    let service = SongService::open(&songs_dir, Arc::new(client))
        .await
        .context("opening song library")?
        .with_songify(songify);

    info!("Fetching {} - {}", cli.artist, cli.song);
    let detail = service
        .download(DownloadRequest {
            artist: cli.artist.clone(),
            title: cli.song.clone(),
            chord_id: cli.chord_id,
            tab_id: cli.tab_id,
        })
        .await
        .with_context(|| format!("downloading {} - {}", cli.artist, cli.song))?;

    let summary = &detail.summary;
    for path in service
        .stored_files(&summary.artist_slug, &summary.song_slug)
        .await
    {
        println!("{}", path.display());
    }

    Ok(())
}
