//! GvBot application binary - composition root.
//!
//! Ties the GvBot crates into a single executable with three subcommands:
//! 1. `chat` - interactive relay chat with history, retrieval grounding,
//!    and (logged) spoken replies
//! 2. `status` - one-shot CSV signal dashboard report
//! 3. `guard` - runtime-guard step over telemetry JSON from stdin

use std::io::{BufRead, Read, Write};
use std::path::{Path, PathBuf};

use clap::Parser;

use gvbot_chat::{
    ChatSession, HistoryStore, KnowledgeIndex, LoggingSynthesizer, RelayClient, Retriever,
    SpeechQueue,
};
use gvbot_core::{GvBotConfig, GvBotError};
use gvbot_signals::{RuntimeGuard, RuntimeSignals, SignalFetcher};

use crate::cli::{CliArgs, Command};

mod cli;

/// Expand ~ to home directory in a path string.
fn resolve_data_dir(data_dir: &str) -> PathBuf {
    if data_dir.starts_with("~/") || data_dir.starts_with("~\\") {
        #[cfg(target_os = "windows")]
        let home = std::env::var("USERPROFILE").unwrap_or_else(|_| ".".to_string());
        #[cfg(not(target_os = "windows"))]
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(&data_dir[2..])
    } else {
        PathBuf::from(data_dir)
    }
}

/// Interactive chat REPL over stdin.
async fn run_chat(
    config: &GvBotConfig,
    endpoint: Option<String>,
    no_voice: bool,
) -> Result<(), GvBotError> {
    let mut relay_config = config.relay.clone();
    if let Some(e) = endpoint {
        relay_config.endpoint = e;
    }
    let transport =
        RelayClient::new(&relay_config).map_err(|e| GvBotError::Relay(e.to_string()))?;

    let mut voice_config = config.voice.clone();
    if no_voice {
        voice_config.enabled = false;
    }
    let speech = SpeechQueue::new(LoggingSynthesizer, &voice_config);

    let mut session = ChatSession::new(
        transport,
        speech,
        relay_config.buffer_cap,
        relay_config.system_preamble.clone(),
    );

    if let Some(ref index_path) = config.retrieval.index_path {
        match KnowledgeIndex::load(Path::new(index_path)) {
            Ok(index) => {
                session = session.with_knowledge(index, Retriever::new(&config.retrieval));
            }
            Err(e) => tracing::warn!(error = %e, "Knowledge index unavailable"),
        }
    }

    let data_dir = resolve_data_dir(&config.general.data_dir);
    let history = HistoryStore::new(
        data_dir.join(&config.history.file_name),
        config.history.max_messages,
    );
    session.seed_history(history.load());

    println!(
        "GvBot connected to {} - type a message, /quit to exit.",
        relay_config.endpoint
    );

    let stdin = std::io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // EOF
        }
        let text = line.trim();
        if text == "/quit" || text == "/exit" {
            break;
        }
        if text.is_empty() {
            continue;
        }

        match session.send(text).await {
            Ok(outcome) => println!("gv> {}", outcome.text()),
            Err(e) => eprintln!("! {}", e),
        }

        // Best-effort persistence after every turn.
        if let Err(e) = history.save(session.log()) {
            tracing::warn!(error = %e, "History save failed");
        }
    }

    tracing::info!(messages = session.log().len(), "Session ended");
    Ok(())
}

/// One-shot signal dashboard report.
async fn run_status(config: &GvBotConfig, source: Option<String>) -> Result<(), GvBotError> {
    let mut signal_config = config.signals.clone();
    if let Some(s) = source {
        signal_config.sources.insert(0, s);
    }
    let fetcher = SignalFetcher::new(&signal_config);
    let report = fetcher.fetch().await?;
    print!("{}", report.render());
    Ok(())
}

/// Read telemetry JSON from stdin and print one guard decision.
///
/// Exits with code 2 on empty or invalid input so callers can distinguish
/// bad telemetry from a guard failure.
fn run_guard(config: &GvBotConfig) -> Result<(), GvBotError> {
    let mut raw = String::new();
    std::io::stdin().read_to_string(&mut raw)?;
    let raw = raw.trim();
    if raw.is_empty() {
        eprintln!("Expected telemetry JSON on stdin.");
        std::process::exit(2);
    }

    let signals: RuntimeSignals = match serde_json::from_str(raw) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Invalid telemetry JSON: {}", e);
            std::process::exit(2);
        }
    };

    let mut guard = RuntimeGuard::new(config.guard.clone());
    let decision = guard.step(signals);
    println!("{}", serde_json::to_string_pretty(&decision)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let config = GvBotConfig::load_or_default(&config_file);

    // Tracing. Priority: --log-level > RUST_LOG > config file value.
    let directive =
        args.resolve_log_directive(std::env::var("RUST_LOG").ok(), &config.general.log_level);
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(directive))
        .init();

    tracing::info!("Starting GvBot v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration resolved");

    match args.command {
        Some(Command::Chat { endpoint, no_voice }) => {
            run_chat(&config, endpoint, no_voice).await?
        }
        None => run_chat(&config, None, false).await?,
        Some(Command::Status { source }) => run_status(&config, source).await?,
        Some(Command::Guard) => run_guard(&config)?,
    }

    Ok(())
}
