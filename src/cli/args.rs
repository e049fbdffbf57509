//! CLI argument definitions using Clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

/// ChatComposer - voice message composer for the terminal
#[derive(Parser, Debug)]
#[command(name = "chat-composer")]
#[command(version)]
#[command(about = "Compose chat messages with text, media and recorded voice messages")]
#[command(long_about = None)]
pub struct Cli {
    /// Recording format (name, extension or four-character code, e.g. lpcm, flac, .ulaw)
    #[arg(short = 'f', long, value_name = "FORMAT")]
    pub format: Option<String>,

    /// Recording sample rate in Hz
    #[arg(short = 'r', long, value_name = "HZ")]
    pub sample_rate: Option<u32>,

    /// Number of channels in the recorded file
    #[arg(short = 'C', long, value_name = "N")]
    pub channels: Option<u16>,

    /// Transcribe voice-only messages with Gemini instead of sending them
    #[arg(short = 't', long)]
    pub transcribe: bool,

    /// Directory recordings are written to
    #[arg(long, value_name = "DIR")]
    pub recordings_dir: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short = 'v', long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Subcommand
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// List recording formats and their file extensions
    Formats,
}

/// Config action subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Create config file with defaults
    Init,
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// Config value
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// List all config values
    List,
    /// Show config file path
    Path,
}

/// Valid config keys
pub const VALID_CONFIG_KEYS: &[&str] = &[
    "api_key",
    "model",
    "format",
    "sample_rate",
    "channels",
    "bitrate",
    "recordings_dir",
    "transcribe",
];

/// Check if a config key is valid
pub fn is_valid_config_key(key: &str) -> bool {
    VALID_CONFIG_KEYS.contains(&key)
}

/// Log filter for the given number of `-v` flags
pub fn log_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_parses_defaults() {
        let cli = Cli::parse_from(["chat-composer"]);
        assert!(cli.format.is_none());
        assert!(cli.sample_rate.is_none());
        assert!(cli.channels.is_none());
        assert!(!cli.transcribe);
        assert!(cli.recordings_dir.is_none());
        assert_eq!(cli.verbose, 0);
        assert!(cli.command.is_none());
    }

    #[test]
    fn cli_parses_capture_options() {
        let cli = Cli::parse_from(["chat-composer", "-f", "flac", "-r", "44100", "-C", "2", "-t"]);
        assert_eq!(cli.format, Some("flac".to_string()));
        assert_eq!(cli.sample_rate, Some(44_100));
        assert_eq!(cli.channels, Some(2));
        assert!(cli.transcribe);
    }

    #[test]
    fn cli_counts_verbosity() {
        let cli = Cli::parse_from(["chat-composer", "-vv"]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(log_level(cli.verbose), "trace");
        assert_eq!(log_level(0), "warn");
    }

    #[test]
    fn cli_parses_config_set() {
        let cli = Cli::parse_from(["chat-composer", "config", "set", "format", "ulaw"]);
        if let Some(Commands::Config {
            action: ConfigAction::Set { key, value },
        }) = cli.command
        {
            assert_eq!(key, "format");
            assert_eq!(value, "ulaw");
        } else {
            panic!("Expected Config Set command");
        }
    }

    #[test]
    fn cli_parses_formats() {
        let cli = Cli::parse_from(["chat-composer", "formats"]);
        assert!(matches!(cli.command, Some(Commands::Formats)));
    }

    #[test]
    fn valid_config_keys() {
        assert!(is_valid_config_key("api_key"));
        assert!(is_valid_config_key("sample_rate"));
        assert!(!is_valid_config_key("duration"));
    }

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }
}
