mod commands;
mod device;
mod terminal;

use crate::commands::{PlayerCommand, HELP};
use crate::device::VirtualDevice;
use cadenza_antara::{
    normalize_country, AntaraTrackProvider, CountryLocator, PaxsenixStreamProvider,
    DEFAULT_COUNTRY,
};
use cadenza_core::{
    config_path, log_file_path, render, search_text, CadenzaConfig, CoreError, DurationExt,
    Greeting, LyricsFetcher, LyricsProvider, LyricsProviderType, NoopWakeLock, Player,
    PlayerOptions, PlayerParams, RenderOptions, RequestId, SearchProvider, SyncEngine, SyncEvent,
    TrackProvider, WakeLock,
};
use cadenza_lastfm::LastfmSearchProvider;
use cadenza_lyrics_lrclib::LrclibProvider;
use cadenza_lyrics_ovh::LyricsOvhProvider;
use clap::{Parser, Subcommand};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Shown when the home feed cannot be loaded
const HOME_FETCH_FAILED: &str = "Failed to fetch data. Please try again later.";
const SEARCH_FAILED: &str = "Search failed. Please try again later.";

#[derive(Debug, Parser)]
#[command(name = "cadenza", version, about = "Synchronized lyrics player for the terminal")]
struct Cli {
    /// Config file to use instead of the default location
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Open the player for a track
    Play {
        /// Player link or query string, e.g. `audioId=ID&title=TITLE&author=ARTIST`
        query: String,
        /// Track length in seconds, used by the virtual clock
        #[arg(long, value_name = "SECS")]
        duration: Option<u64>,
        /// Load the track without starting playback
        #[arg(long)]
        paused: bool,
    },
    /// Show the greeting and quick picks for a country
    Home {
        /// Two-letter country code. Looked up from the IP address when omitted.
        #[arg(long, value_name = "CC")]
        country: Option<String>,
    },
    /// Search artists and tracks, then pick a result to search for it
    Search {
        /// Search text, or a search link carrying `q`
        query: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config_file = cli.config.clone().unwrap_or_else(config_path);

    // Check config for logging.enabled before full config load
    let file_logging_enabled = check_file_logging_enabled(&config_file);
    init_tracing(file_logging_enabled);

    let config = match CadenzaConfig::load_or_create_at(&config_file) {
        Ok(config) => config,
        Err(CoreError::ConfigNotFound { path }) => {
            println!(
                "A configuration file has been created at {}.\nEdit it if needed and run cadenza again.",
                path.display()
            );
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            error!("Failed to load config from {}: {e}", config_file.display());
            return ExitCode::FAILURE;
        }
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            error!("Failed to create tokio runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    let cancel_token = CancellationToken::new();
    let ctrlc_token = cancel_token.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        info!("Received Ctrl+C, shutting down gracefully...");
        ctrlc_token.cancel();
    }) {
        error!("Failed to set Ctrl+C handler: {}", e);
    }

    let result = match cli.command {
        Command::Play {
            query,
            duration,
            paused,
        } => runtime.block_on(run_player(
            &config,
            &query,
            duration.map(Duration::from_secs),
            !paused,
            cancel_token,
        )),
        Command::Home { country } => runtime.block_on(run_home(&config, country.as_deref())),
        Command::Search { query } => {
            runtime.block_on(run_search(&config, &query, &cancel_token))
        }
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn create_providers(config: &CadenzaConfig) -> Vec<Arc<dyn LyricsProvider>> {
    config
        .lyrics
        .providers
        .iter()
        .filter_map(|provider_type| -> Option<Arc<dyn LyricsProvider>> {
            match provider_type {
                LyricsProviderType::Lrclib => {
                    info!("Initializing LRCLIB provider");
                    match LrclibProvider::from_config(config) {
                        Ok(provider) => Some(Arc::new(provider)),
                        Err(e) => {
                            error!("Failed to create LRCLIB provider: {}", e);
                            None
                        }
                    }
                }
                LyricsProviderType::LyricsOvh => {
                    info!("Initializing lyrics.ovh provider");
                    match LyricsOvhProvider::from_config(config) {
                        Ok(provider) => Some(Arc::new(provider)),
                        Err(e) => {
                            error!("Failed to create lyrics.ovh provider: {}", e);
                            None
                        }
                    }
                }
            }
        })
        .collect()
}

async fn run_player(
    config: &CadenzaConfig,
    query: &str,
    duration: Option<Duration>,
    autoplay: bool,
    cancel_token: CancellationToken,
) -> Result<ExitCode, CoreError> {
    let sync_engine = SyncEngine::new(config.player.time_format);

    let providers = create_providers(config);
    let provider_names: Vec<_> = providers.iter().map(|p| p.name()).collect();
    info!(
        "Initialized {} lyrics provider(s): {:?}",
        providers.len(),
        provider_names
    );

    let lyrics_fetcher = Arc::new(LyricsFetcher::new(
        sync_engine.clone(),
        providers,
        Some(cancel_token.clone()),
    ));
    let fetcher_handle = lyrics_fetcher.start();

    let device = Arc::new(VirtualDevice::new(duration));
    tokio::spawn(log_sync_events(sync_engine.subscribe()));

    let tracks: Arc<dyn TrackProvider> = Arc::new(AntaraTrackProvider::from_config(config)?);
    let streams = Arc::new(PaxsenixStreamProvider::from_config(config)?);
    let mut player = Player::new(
        sync_engine.clone(),
        device.clone(),
        tracks,
        streams,
        PlayerOptions::from(&config.player),
    );
    if config.player.keep_awake {
        player = player.with_wake_lock(WakeLock::new(Box::new(NoopWakeLock)));
    }

    if player
        .open(PlayerParams::from_query(query), autoplay)
        .await?
        .is_none()
    {
        warn!("No audioId in {query:?}, player stays idle");
    }

    let render_options = RenderOptions {
        context_before: config.lyrics.context_before,
        context_after: config.lyrics.context_after,
    };
    let mut ticker = tokio::time::interval(config.player.tick_interval());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut last_frame = String::new();
    let mut reported = None;

    println!("{HELP}\n");

    loop {
        tokio::select! {
            () = cancel_token.cancelled() => break,
            _ = ticker.tick() => {
                report_metadata(&player, &device, &mut reported).await;
                if device.take_ended() {
                    player.on_ended().await;
                } else {
                    sync_engine.tick(device.position()).await;
                }
            }
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(line)) => {
                    if !handle_command(&player, &line).await {
                        cancel_token.cancel();
                        break;
                    }
                }
                Ok(None) => {
                    debug!("stdin closed, commands disabled");
                    stdin_open = false;
                }
                Err(e) => {
                    warn!("Failed to read command: {e}");
                    stdin_open = false;
                }
            },
        }

        let frame = terminal::format_frame(&render(&sync_engine.view().await, &render_options));
        if frame != last_frame {
            println!("{frame}");
            last_frame = frame;
        }
    }

    let _ = fetcher_handle.await;
    Ok(ExitCode::SUCCESS)
}

/// Report the virtual track length once per loaded track, the way a media
/// element fires `loadedmetadata`
async fn report_metadata(
    player: &Player,
    device: &VirtualDevice,
    reported: &mut Option<RequestId>,
) {
    let Some(duration) = device.duration() else {
        return;
    };
    let engine = player.engine();
    let request = engine.current_request().await;
    if *reported == Some(request) || engine.current_track().await.is_none() {
        return;
    }
    if player.on_metadata(request, duration).await {
        *reported = Some(request);
    }
}

/// Apply one input line. Returns `false` when the user asked to quit.
async fn handle_command(player: &Player, line: &str) -> bool {
    let Some(command) = PlayerCommand::parse(line) else {
        if !line.trim().is_empty() {
            println!("Unknown command: {}", line.trim());
        }
        return true;
    };

    let engine = player.engine();
    engine.clear_notice().await;
    match command {
        PlayerCommand::Toggle => {
            player.toggle().await;
        }
        PlayerCommand::Advance(direction) => {
            player.advance(direction).await;
        }
        PlayerCommand::SkipForward => {
            player.skip_forward().await;
        }
        PlayerCommand::SkipBackward => {
            player.skip_backward().await;
        }
        PlayerCommand::Scrub(value) => {
            engine.begin_scrub().await;
            if engine.scrub_to(value).await {
                player.commit_scrub().await;
            } else {
                engine.cancel_scrub().await;
            }
        }
        PlayerCommand::Help => println!("{HELP}"),
        PlayerCommand::Quit => return false,
    }
    true
}

async fn run_home(config: &CadenzaConfig, country: Option<&str>) -> Result<ExitCode, CoreError> {
    let tracks = AntaraTrackProvider::from_config(config)?;
    let country = resolve_country(config, country).await;
    info!("Loading home feed for {country}");

    match tracks.home(&country).await {
        Ok(picks) => {
            print!("{}", terminal::format_home(Greeting::current(), &picks));
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            warn!("Failed to fetch home feed: {e}");
            eprintln!("{HOME_FETCH_FAILED}");
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Print matches for the search text, then search again for the picked
/// result until the user quits
async fn run_search(
    config: &CadenzaConfig,
    input: &str,
    cancel_token: &CancellationToken,
) -> Result<ExitCode, CoreError> {
    let mut text = search_text(input).unwrap_or_else(|| input.trim().to_string());
    if text.is_empty() {
        eprintln!("No search query provided.");
        return Ok(ExitCode::FAILURE);
    }

    let provider = LastfmSearchProvider::from_config(config)?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let results = match provider.search(&text).await {
            Ok(results) => results,
            Err(e) => {
                warn!("Search for {text:?} failed: {e}");
                eprintln!("{SEARCH_FAILED}");
                return Ok(ExitCode::FAILURE);
            }
        };
        print!("{}", terminal::format_search(&text, &results));
        if results.is_empty() {
            return Ok(ExitCode::SUCCESS);
        }
        println!("\nPick a number to search for it, or press Enter to quit.");

        text = loop {
            let line = tokio::select! {
                () = cancel_token.cancelled() => return Ok(ExitCode::SUCCESS),
                line = lines.next_line() => line,
            };
            let line = match line {
                Ok(Some(line)) => line,
                Ok(None) => return Ok(ExitCode::SUCCESS),
                Err(e) => {
                    warn!("Failed to read choice: {e}");
                    return Ok(ExitCode::SUCCESS);
                }
            };
            let line = line.trim();
            if line.is_empty() || line == "q" {
                return Ok(ExitCode::SUCCESS);
            }
            match terminal::search_choice(&results, line) {
                Some(name) => break name,
                None => println!("No result numbered {line}"),
            }
        };
    }
}

/// Country from the command line, else from the IP address, else the default
async fn resolve_country(config: &CadenzaConfig, country: Option<&str>) -> String {
    if let Some(code) = country {
        match normalize_country(code) {
            Ok(code) => return code,
            Err(e) => warn!("{e}, looking up country instead"),
        }
    }

    let located = match CountryLocator::from_config(config) {
        Ok(locator) => locator.locate().await.map_err(|e| e.to_string()),
        Err(e) => Err(e.to_string()),
    };
    located.unwrap_or_else(|e| {
        warn!("Country lookup failed ({e}), using {DEFAULT_COUNTRY}");
        DEFAULT_COUNTRY.to_string()
    })
}

/// Log sync events
async fn log_sync_events(mut rx: broadcast::Receiver<SyncEvent>) {
    loop {
        match rx.recv().await {
            Ok(event) => match &event {
                SyncEvent::TrackLoading { track, request } => {
                    info!("Loading {} - {} ({request})", track.author, track.title);
                }
                SyncEvent::MetadataLoaded { duration, .. } => {
                    info!("Track length: {}s", duration.as_secs_u32());
                }
                SyncEvent::PlaybackPaused { position } => {
                    info!("Playback paused at {}ms", position.as_millis_u64());
                }
                SyncEvent::PlaybackResumed { position } => {
                    info!("Playback resumed at {}ms", position.as_millis_u64());
                }
                SyncEvent::PositionSync { .. } | SyncEvent::LineChanged { .. } => {}
                SyncEvent::SeekOccurred { position } => {
                    info!("Seek to {}ms", position.as_millis_u64());
                }
                SyncEvent::TrackEnded => info!("Track ended"),
                SyncEvent::LyricsLoaded { lyrics } => {
                    info!("Lyrics loaded: {} lines", lyrics.lines.len());
                }
                SyncEvent::LyricsNotFound => info!("No lyrics found for current track"),
                SyncEvent::Notice { message } => warn!("{message}"),
            },
            Err(RecvError::Closed) => {
                info!("Sync event channel closed");
                break;
            }
            Err(RecvError::Lagged(n)) => {
                info!("Missed {} sync events", n);
            }
        }
    }
}

/// Check if file logging is enabled by reading the config file.
/// This is done before full config loading to set up tracing first.
/// Returns `false` if config doesn't exist or can't be parsed.
fn check_file_logging_enabled(config_path: &Path) -> bool {
    #[derive(serde::Deserialize)]
    struct PartialConfig {
        #[serde(default)]
        logging: PartialLoggingConfig,
    }
    #[derive(serde::Deserialize, Default)]
    struct PartialLoggingConfig {
        #[serde(default)]
        enabled: bool,
    }

    let Ok(content) = std::fs::read_to_string(config_path) else {
        return false;
    };

    toml::from_str::<PartialConfig>(&content)
        .map(|c| c.logging.enabled)
        .unwrap_or(false)
}

/// Initialize tracing with stderr output and optional file logging
fn init_tracing(file_logging_enabled: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    // Frames go to stdout
    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    if file_logging_enabled {
        let log_path = log_file_path();

        if let Some(parent) = log_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }

        match File::create(&log_path) {
            Ok(file) => {
                let file_layer = tracing_subscriber::fmt::layer()
                    .with_writer(Arc::new(file))
                    .with_ansi(false);

                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt_layer)
                    .with(file_layer)
                    .init();

                return;
            }
            Err(e) => {
                eprintln!("Failed to create log file at {}: {e}", log_path.display());
            }
        }
    }

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}
