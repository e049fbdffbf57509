//! Interactive composer runner

use std::env;
use std::io::BufRead;
use std::process::ExitCode;
use std::sync::Arc;
use std::thread;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::application::ports::{ConfigStore, DraftSender, Transcriber};
use crate::application::{
    AudioCaptureSession, AudioPlaybackSession, CaptureRegistry, ComposerEvent, InputSnapshot,
    InputViewModel, PlaybackRegistry,
};
use crate::domain::composer::{DraftMessage, InputAction, InputState, Media};
use crate::domain::config::AppConfig;
use crate::infrastructure::recording::Encoder;
use crate::infrastructure::{
    CpalInputDevice, DeviceProbePermission, GeminiTranscriber, RodioOutputDevice, XdgConfigStore,
};

use super::commands::{Command, HELP};
use super::presenter::Presenter;

/// Exit codes
pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;
pub const EXIT_USAGE_ERROR: u8 = 2;

/// Prints every finished draft to stdout as one JSON line
#[derive(Debug, Default)]
pub struct JsonLineSender;

impl DraftSender for JsonLineSender {
    fn on_draft_ready(&self, draft: DraftMessage) {
        match serde_json::to_string(&draft) {
            Ok(line) => println!("{}", line),
            Err(e) => warn!(error = %e, "Failed to serialize draft"),
        }
    }
}

/// What woke the prompt loop up
enum Wakeup {
    Line(Option<String>),
    Event(Option<ComposerEvent>),
    Interrupt,
}

/// Run the interactive composer until `quit`, end of input or Ctrl+C
pub async fn run_composer(config: AppConfig) -> ExitCode {
    let mut presenter = Presenter::new();

    let settings = config.capture_settings();
    if let Err(e) = settings.validate() {
        presenter.error(&e.to_string());
        return ExitCode::from(EXIT_USAGE_ERROR);
    }
    let format = config.format_or_default();
    if Encoder::for_format(format).is_none() {
        presenter.warn(&format!(
            "Recording {} is not supported on this platform; try lpcm, flac, ulaw or alaw",
            format.label()
        ));
    }

    let recordings_dir = config.recordings_dir_or_default();
    let recorder = Arc::new(AudioCaptureSession::new(
        Arc::new(CpalInputDevice::new()),
        Arc::new(DeviceProbePermission::new()),
        CaptureRegistry::shared(),
        recordings_dir.clone(),
    ));
    let player = Arc::new(AudioPlaybackSession::new(
        Arc::new(RodioOutputDevice::new()),
        PlaybackRegistry::shared(),
    ));

    let mut vm = InputViewModel::new(recorder, player, Arc::new(JsonLineSender), settings);
    if config.transcribe_or_default() {
        match build_transcriber(&config) {
            Ok(transcriber) => vm = vm.with_transcriber(transcriber),
            Err(e) => presenter.warn(&format!("Transcription disabled: {}", e)),
        }
    }

    info!(
        format = %format,
        dir = %recordings_dir.display(),
        "Composer ready"
    );
    presenter.info("Type 'help' for commands");
    let mut last = vm.snapshot();
    presenter.status(&last);

    let mut lines = match spawn_line_reader() {
        Ok(lines) => lines,
        Err(e) => {
            presenter.error(&format!("Failed to read input: {}", e));
            return ExitCode::from(EXIT_ERROR);
        }
    };
    loop {
        let wakeup = tokio::select! {
            line = lines.recv() => Wakeup::Line(line),
            event = vm.next_event() => Wakeup::Event(event),
            _ = tokio::signal::ctrl_c() => Wakeup::Interrupt,
        };

        match wakeup {
            Wakeup::Line(Some(line)) => {
                let command = match line.parse::<Command>() {
                    Ok(command) => command,
                    Err(e) => {
                        presenter.error(&e.to_string());
                        continue;
                    }
                };
                match command {
                    Command::Quit => break,
                    Command::Help => presenter.output(HELP),
                    Command::Status => presenter.status(&vm.snapshot()),
                    command => run_command(&mut vm, &presenter, command),
                }
            }
            Wakeup::Line(None) | Wakeup::Interrupt => break,
            Wakeup::Event(Some(event)) => vm.handle_event(event),
            Wakeup::Event(None) => break,
        }

        let snapshot = vm.snapshot();
        render(&mut presenter, &last, &snapshot);
        last = snapshot;
    }

    presenter.stop_spinner();
    vm.perform(InputAction::DeleteRecord);
    debug!("Composer closed");
    ExitCode::from(EXIT_SUCCESS)
}

/// Read stdin on its own thread so a pending read never holds up shutdown
fn spawn_line_reader() -> std::io::Result<mpsc::UnboundedReceiver<String>> {
    let (tx, rx) = mpsc::unbounded_channel();
    thread::Builder::new()
        .name("stdin-reader".into())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                match line {
                    Ok(line) => {
                        if tx.send(line).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "Failed to read input");
                        break;
                    }
                }
            }
        })?;
    Ok(rx)
}

fn run_command(vm: &mut InputViewModel, presenter: &Presenter, command: Command) {
    match command {
        Command::Text(text) => vm.set_text(text),
        Command::Attach(path) => {
            if !path.exists() {
                presenter.warn(&format!("{} does not exist", path.display()));
            }
            vm.add_media(Media::from_path(path));
        }
        Command::Reply(reply) => vm.set_reply_message(reply),
        Command::Action(action) => vm.perform(action),
        Command::Seek(fraction) => vm.seek_record(fraction),
        Command::Edit(text) => vm.edit(text, |edited| {
            println!("{}", serde_json::json!({ "edited": edited }));
        }),
        Command::Status | Command::Help | Command::Quit => {}
    }
}

/// Show what changed between two snapshots
fn render(presenter: &mut Presenter, before: &InputSnapshot, after: &InputSnapshot) {
    let live = match (after.state, &after.recording) {
        (InputState::RecordingHeld | InputState::RecordingTapped, Some(recording)) => Some(
            format!("Recording {}", presenter.format_recording(recording)),
        ),
        (InputState::Playing, _) => Some(format!(
            "Playing {}",
            presenter.format_playback(&after.playback)
        )),
        _ => None,
    };
    if let Some(message) = live {
        if presenter.is_spinning() && before.state == after.state {
            presenter.update_spinner(&message);
        } else {
            presenter.stop_spinner();
            presenter.start_spinner(&message);
        }
        return;
    }

    if after.is_transcribing {
        if !presenter.is_spinning() {
            presenter.start_spinner("Transcribing voice message...");
        }
        return;
    }

    if before.is_transcribing {
        presenter.spinner_success("Transcribed");
    } else {
        presenter.stop_spinner();
    }

    if let Some(error) = &after.last_error {
        if before.last_error.as_ref() != Some(error) {
            presenter.error(&error.to_string());
        }
    }

    if before.state != after.state
        || before.text != after.text
        || before.media_count != after.media_count
    {
        presenter.status(after);
    }
}

fn build_transcriber(config: &AppConfig) -> Result<Arc<dyn Transcriber>, String> {
    let api_key = config.api_key.clone().ok_or_else(|| {
        "Missing API key. Set GEMINI_API_KEY environment variable or run 'chat-composer config set api_key <key>'".to_string()
    })?;
    Ok(Arc::new(GeminiTranscriber::with_model(
        api_key,
        config.model_or_default(),
    )))
}

/// Load and merge configuration from file, env, and CLI
pub async fn load_merged_config(cli_config: AppConfig) -> AppConfig {
    let store = XdgConfigStore::new();
    let file_config = match store.load().await {
        Ok(config) => config,
        Err(e) => {
            warn!(error = %e, "Ignoring config file");
            AppConfig::empty()
        }
    };

    // Build env config
    let env_config = AppConfig {
        api_key: env::var("GEMINI_API_KEY").ok().filter(|s| !s.is_empty()),
        ..Default::default()
    };

    // Merge: defaults < file < env < cli
    AppConfig::defaults()
        .merge(file_config)
        .merge(env_config)
        .merge(cli_config)
}
