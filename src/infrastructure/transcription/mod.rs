//! Transcription infrastructure module

mod gemini;

pub use gemini::GeminiTranscriber;
