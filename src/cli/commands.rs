//! Commands typed into the interactive composer

use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

use crate::domain::composer::{InputAction, ReplyMessage};

/// Help text for the interactive prompt
pub const HELP: &str = "\
Commands:
  text <message>        set the draft text (empty clears it)
  attach <path>         attach a photo or video
  photo | camera        open the media picker
  reply <author> <text> reply to a message (no arguments clears it)
  tap                   start recording, stop with 'stop'
  hold                  start a held recording, released with 'stop'
  lock                  lock a held recording
  stop                  stop recording
  delete                discard the recording
  play | pause          play or pause the recording
  seek <0..1>           play from a fraction of the recording
  send                  send the draft
  edit <message>        edit a sent message
  save | cancel         finish editing
  status                show the composer
  help                  show this help
  quit                  exit";

/// Command parse errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("Unknown command '{0}'. Type 'help' for a list")]
    Unknown(String),

    #[error("'{command}' needs {expected}")]
    MissingArgument {
        command: &'static str,
        expected: &'static str,
    },

    #[error("Invalid seek position '{0}': expected a number between 0 and 1")]
    InvalidPosition(String),
}

/// A line of input at the composer prompt
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Text(String),
    Attach(PathBuf),
    Reply(Option<ReplyMessage>),
    Action(InputAction),
    Seek(f64),
    Edit(String),
    Status,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let command = match word.to_ascii_lowercase().as_str() {
            "text" | "t" => Self::Text(rest.to_string()),
            "attach" | "a" => {
                if rest.is_empty() {
                    return Err(CommandError::MissingArgument {
                        command: "attach",
                        expected: "a file path",
                    });
                }
                Self::Attach(PathBuf::from(rest))
            }
            "reply" => Self::Reply(parse_reply(rest)?),
            "photo" => Self::Action(InputAction::Photo),
            "add" => Self::Action(InputAction::Add),
            "camera" => Self::Action(InputAction::Camera),
            "tap" | "rec" | "record" => Self::Action(InputAction::RecordAudioTap),
            "hold" => Self::Action(InputAction::RecordAudioHold),
            "lock" => Self::Action(InputAction::RecordAudioLock),
            "stop" => Self::Action(InputAction::StopRecordAudio),
            "delete" | "del" => Self::Action(InputAction::DeleteRecord),
            "play" => Self::Action(InputAction::PlayRecord),
            "pause" => Self::Action(InputAction::PauseRecord),
            "send" | "s" => Self::Action(InputAction::Send),
            "save" => Self::Action(InputAction::SaveEdit),
            "cancel" => Self::Action(InputAction::CancelEdit),
            "seek" => {
                let fraction = rest
                    .parse::<f64>()
                    .ok()
                    .filter(|f| (0.0..=1.0).contains(f))
                    .ok_or_else(|| CommandError::InvalidPosition(rest.to_string()))?;
                Self::Seek(fraction)
            }
            "edit" => Self::Edit(rest.to_string()),
            "status" | "" => Self::Status,
            "help" | "?" => Self::Help,
            "quit" | "exit" | "q" => Self::Quit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(command)
    }
}

fn parse_reply(rest: &str) -> Result<Option<ReplyMessage>, CommandError> {
    if rest.is_empty() {
        return Ok(None);
    }
    match rest.split_once(char::is_whitespace) {
        Some((author, text)) => Ok(Some(ReplyMessage {
            id: uuid::Uuid::new_v4().to_string(),
            author: author.to_string(),
            text: text.trim().to_string(),
        })),
        None => Err(CommandError::MissingArgument {
            command: "reply",
            expected: "an author and the message text",
        }),
    }
}
