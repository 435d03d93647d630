//! Eribot CLI entry point.

use anyhow::Context as _;
use clap::Parser;
use std::sync::Arc;
use tokio::io::AsyncBufReadExt as _;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "eribot")]
#[command(about = "A conversational assistant with intent classification and music queues")]
struct Cli {
    /// Directory holding the lexicon files (optional)
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!("Starting Eribot...");

    let config = if let Some(config_dir) = cli.config {
        eribot::config::Config::load_from_dir(&config_dir)
            .with_context(|| format!("failed to load config from {}", config_dir.display()))?
    } else {
        eribot::config::Config::load()
            .with_context(|| "failed to load configuration from environment")?
    };

    tracing::info!(data_dir = %config.data_dir.display(), wake_word = %config.wake_word, "Configuration loaded");

    // Lexicon problems are fatal here; a bot with no patterns answers nothing.
    let normalizer =
        eribot::text::TextNormalizer::new(eribot::text::WakeWord::new(&config.wake_word));
    let mut lexicon = eribot::convo::Lexicon::default();
    for path in &config.lexicon_paths {
        lexicon
            .load_file(path, &normalizer)
            .with_context(|| format!("failed to load lexicon from {}", path.display()))?;
    }
    lexicon.ensure_non_empty()?;

    tracing::info!(entries = lexicon.len(), "Lexicon loaded");

    let chat = Arc::new(eribot::messaging::ConsoleChat);
    let deps = Arc::new(eribot::BotDeps {
        chat: chat.clone(),
        context: eribot::convo::ContextStore::new(),
        players: Arc::new(eribot::playback::PlayerRegistry::new(config.playback)),
        voice: Arc::new(eribot::media::NoVoiceGateway),
        resolver: Arc::new(eribot::media::NoMediaResolver),
        songs: Arc::new(eribot::media::MemorySongStore::default()),
    });

    let mut registry = eribot::convo::IntentRegistry::new();
    eribot::handlers::register_builtins(&mut registry);

    let dispatcher = Arc::new(eribot::convo::Dispatcher::new(
        deps,
        lexicon,
        registry,
        normalizer,
        config.classify,
    ));

    tracing::info!("Eribot started successfully");
    println!("Escribe algo (ctrl-c para salir):");

    // Console REPL: each stdin line becomes an inbound message on one
    // channel. A platform adapter would feed recognize() the same way.
    let repl = tokio::spawn({
        let dispatcher = Arc::clone(&dispatcher);
        async move {
            let stdin = tokio::io::stdin();
            let mut lines = tokio::io::BufReader::new(stdin).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let line = line.trim();
                        if line.is_empty() {
                            continue;
                        }
                        let message = eribot::InboundMessage::text("console", "operator", line)
                            .with_guild("console-guild");
                        if let Err(error) = dispatcher.recognize(message).await {
                            tracing::error!(%error, "turn failed");
                        }
                    }
                    Ok(None) => break,
                    Err(error) => {
                        tracing::error!(%error, "stdin read failed");
                        break;
                    }
                }
            }
        }
    });

    tokio::select! {
        _ = repl => {
            tracing::info!("Input closed");
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    tracing::info!("Eribot stopped");
    Ok(())
}
