//! ChatComposer CLI entry point

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use chat_composer::cli::{
    app::{load_merged_config, run_composer, EXIT_ERROR, EXIT_USAGE_ERROR},
    args::{log_level, Cli, Commands},
    config_cmd::handle_config_command,
    presenter::Presenter,
};
use chat_composer::domain::capture::{AudioFormat, ALL_FORMATS};
use chat_composer::domain::config::AppConfig;
use chat_composer::infrastructure::XdgConfigStore;

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let presenter = Presenter::new();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level(cli.verbose)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Handle subcommands
    match cli.command {
        Some(Commands::Config { action }) => {
            let store = XdgConfigStore::new();
            if let Err(e) = handle_config_command(action, &store, &presenter).await {
                presenter.error(&e.to_string());
                return ExitCode::from(EXIT_ERROR);
            }
            return ExitCode::SUCCESS;
        }
        Some(Commands::Formats) => {
            presenter.formats(ALL_FORMATS);
            return ExitCode::SUCCESS;
        }
        None => {}
    }

    // Validate the format before it reaches the config merge
    let format = match cli.format.as_deref().map(str::parse::<AudioFormat>) {
        Some(Ok(format)) => Some(format.to_string()),
        Some(Err(e)) => {
            presenter.error(&e.to_string());
            return ExitCode::from(EXIT_USAGE_ERROR);
        }
        None => None,
    };

    // Build CLI config from args
    let cli_config = AppConfig {
        api_key: None, // API key comes from env/file only
        model: None,
        format,
        sample_rate: cli.sample_rate,
        channels: cli.channels,
        bitrate: None,
        recordings_dir: cli
            .recordings_dir
            .map(|dir| dir.to_string_lossy().into_owned()),
        transcribe: if cli.transcribe { Some(true) } else { None },
    };

    let config = load_merged_config(cli_config).await;
    run_composer(config).await
}
