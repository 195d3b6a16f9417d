//! # bookreel-voice
//!
//! Voice sessions for the bookreel assistant.
//!
//! ## Overview
//!
//! - [`AgentSession`] - one room, one agent, one cooperative loop
//! - [`Worker`] - runs an entrypoint per job with bounded concurrency
//! - [`RoomConnection`] - room transport ([`MemoryRoom`], LiveKit behind the `livekit` feature)
//! - [`SpeechToText`] / [`TextToSpeech`] - speech capabilities, with [`deepgram`] adapters
//! - [`VadWorker`] and [`TurnDetector`] - voice activity and silence-gap turn detection
//! - [`NoiseGate`] - inbound noise suppression
//!
//! Inbound audio flows room → noise gate → VAD thread → turn detector →
//! STT → agent → TTS → room.

pub mod audio;
pub mod config;
pub mod deepgram;
pub mod error;
#[cfg(feature = "livekit")]
pub mod livekit;
pub mod noise;
pub mod room;
pub mod session;
pub mod stt;
pub mod tts;
pub mod turn;
pub mod vad;
pub mod worker;

pub use audio::{AudioFormat, AudioFrame};
pub use config::{
    NoiseCancellation, RoomInputOptions, SessionConfig, SttConfig, TtsConfig, TurnConfig,
    VadConfig, VadKind,
};
pub use deepgram::{DeepgramConfig, DeepgramStt, DeepgramTts};
pub use error::{Result, VoiceError};
pub use noise::NoiseGate;
pub use room::{MemoryConnector, MemoryRoom, MemoryRoomPeer, RoomConnection, RoomConnector};
pub use session::{AgentSession, AgentSessionBuilder};
pub use stt::{SpeechToText, Transcript};
pub use tts::TextToSpeech;
pub use turn::{TurnDetector, TurnEvent};
pub use vad::{EnergyVad, VadWorker, VoiceActivityDetector, WebRtcVad};
pub use worker::{
    ChannelJobSource, Job, JobContext, JobSource, StaticJobSource, Worker, WorkerOptions,
    WorkerReport,
};
