//! Error types for voice sessions.

use bookreel_core::BookreelError;
use thiserror::Error;

/// Result type for voice operations.
pub type Result<T> = std::result::Result<T, VoiceError>;

#[derive(Error, Debug)]
pub enum VoiceError {
    /// Room connection or transport failure.
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Speech-to-text service failure.
    #[error("STT error: {0}")]
    Stt(String),

    /// Text-to-speech service failure.
    #[error("TTS error: {0}")]
    Tts(String),

    #[error("VAD error: {0}")]
    Vad(String),

    #[error("Audio format error: {0}")]
    Audio(String),

    /// A session channel or task went away.
    #[error("Channel error: {0}")]
    Channel(String),

    #[error(transparent)]
    Agent(#[from] BookreelError),
}

impl VoiceError {
    pub fn connection<S: Into<String>>(msg: S) -> Self {
        Self::Connection(msg.into())
    }

    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    pub fn audio<S: Into<String>>(msg: S) -> Self {
        Self::Audio(msg.into())
    }

    pub fn channel<S: Into<String>>(msg: S) -> Self {
        Self::Channel(msg.into())
    }
}
