//! spotiload - sync your saved Spotify tracks to a local music library

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use spotiload::config::{self, Config};
use spotiload::notify::DiscordNotifier;
use spotiload::spotify::{AuthContext, HttpAudioSource, SpotifyClient};
use spotiload::sync::ledger::Ledger;
use spotiload::sync::pipeline::{PipelineOptions, TrackPipeline};
use spotiload::sync::run_batch;
use spotiload::sync::transcode::{FfmpegTranscoder, TARGET_EXT};
use spotiload::utils::LoftyTagger;

#[derive(Parser, Debug)]
#[command(name = "spotiload", about = "Sync your saved Spotify tracks to a local music library")]
#[command(version)]
struct Cli {
    /// Path to the config file (defaults to $XDG_CONFIG_HOME/spotiload/config.json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "spotiload=debug"
    } else {
        "spotiload=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Startup/config errors are the only fatal class; per-track failures
    // are reported and still exit 0.
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let output_dir = config.output_dir()?;

    let auth = AuthContext::establish(&config.username, &config.password).await?;
    let client = SpotifyClient::new(&auth);
    let audio = HttpAudioSource::new(&auth);
    let ledger = Ledger::new(&config::app_dir()?);
    let transcoder = FfmpegTranscoder;
    let tagger = LoftyTagger;

    let pipeline = TrackPipeline::new(
        &client,
        &audio,
        &transcoder,
        &tagger,
        &ledger,
        PipelineOptions {
            output_dir,
            template: config.template().to_string(),
            extension: TARGET_EXT.to_string(),
        },
    );

    let saved = client.saved_tracks().await?;
    info!("Found {} saved tracks", saved.len());

    let report = run_batch(&pipeline, &saved).await;
    info!(
        "Run complete: {} downloaded, {} failed",
        report.downloaded.len(),
        report.errors.len()
    );

    if let Some(webhook) = &config.discord {
        DiscordNotifier::new(webhook).send_report(&report).await;
    }

    Ok(())
}
