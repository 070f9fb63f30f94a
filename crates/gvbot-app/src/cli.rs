//! CLI argument definitions for the GvBot application.
//!
//! Uses `clap` with derive macros for ergonomic argument parsing.
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// GvBot — relay chat client with spoken replies and a signal dashboard.
#[derive(Parser, Debug)]
#[command(name = "gvbot", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Interactive chat with the relay (the default).
    Chat {
        /// Relay endpoint override.
        #[arg(short = 'e', long = "endpoint")]
        endpoint: Option<String>,

        /// Disable spoken replies for this run.
        #[arg(long = "no-voice")]
        no_voice: bool,
    },
    /// One-shot signal dashboard report.
    Status {
        /// Signal CSV source (path or URL) tried before the configured list.
        #[arg(short = 's', long = "source")]
        source: Option<String>,
    },
    /// Read runtime telemetry JSON from stdin and print a guard decision.
    Guard,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > GVBOT_CONFIG env var > ~/.gvbot/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("GVBOT_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the log level.
    ///
    /// Priority: --log-level flag > config file value.
    /// Returns `None` if not overridden.
    pub fn resolve_log_level(&self) -> Option<String> {
        self.log_level.clone()
    }

    /// Resolve the tracing filter directive.
    ///
    /// Priority: --log-level flag > RUST_LOG env var > config file value.
    pub fn resolve_log_directive(&self, env_directive: Option<String>, config_level: &str) -> String {
        if let Some(ref level) = self.log_level {
            return level.clone();
        }
        if let Some(directive) = env_directive {
            if !directive.is_empty() {
                return directive;
            }
        }
        config_level.to_string()
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".gvbot").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".gvbot").join("config.toml");
    }
    PathBuf::from("config.toml")
}
