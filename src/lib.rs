//! ChatComposer - chat message composer with voice messages
//!
//! This crate provides the core of a message composer: recording voice
//! messages from the microphone with live metering, playing them back,
//! and the input state machine that ties recording, playback and
//! text/media composition together.
//!
//! # Architecture
//!
//! The crate follows hexagonal (ports & adapters) architecture:
//!
//! - **Domain**: Core business logic, value objects, entities, and errors
//! - **Application**: Capture/playback sessions, the input view model, and port interfaces (traits)
//! - **Infrastructure**: Adapter implementations (cpal, rodio, Gemini, XDG config)
//! - **CLI**: Command-line interface, argument parsing, and the interactive composer

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
