//! LiveKit rooms.
//!
//! Requires the **`livekit`** Cargo feature.

use crate::audio::{AudioFormat, AudioFrame, INPUT_SAMPLE_RATE, OUTPUT_SAMPLE_RATE};
use crate::error::{Result, VoiceError};
use crate::room::{RoomConnection, RoomConnector};
use async_trait::async_trait;
use futures::StreamExt;
use livekit::options::TrackPublishOptions;
use livekit::prelude::{LocalAudioTrack, LocalTrack, RemoteTrack, Room, RoomEvent, RoomOptions};
use livekit::webrtc::audio_frame::AudioFrame as RtcAudioFrame;
use livekit::webrtc::audio_source::native::NativeAudioSource;
use livekit::webrtc::audio_source::{AudioSourceOptions, RtcAudioSource};
use livekit::webrtc::audio_stream::native::NativeAudioStream;
use livekit_api::access_token::{AccessToken, VideoGrants};
use std::borrow::Cow;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info, warn};

/// Publish in 10 ms frames.
const PUBLISH_FRAME_MS: u32 = 10;
const SOURCE_QUEUE_MS: u32 = 100;

/// Server URL and API credentials.
#[derive(Clone)]
pub struct LiveKitConfig {
    pub url: String,
    pub api_key: String,
    pub api_secret: String,
}

impl std::fmt::Debug for LiveKitConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveKitConfig")
            .field("url", &self.url)
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .finish()
    }
}

impl LiveKitConfig {
    pub fn new(
        url: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        Self { url: url.into(), api_key: api_key.into(), api_secret: api_secret.into() }
    }

    /// Room-join token for `identity`.
    pub fn token(&self, room: &str, identity: &str) -> Result<String> {
        AccessToken::with_api_key(&self.api_key, &self.api_secret)
            .with_identity(identity)
            .with_name(identity)
            .with_grants(VideoGrants {
                room_join: true,
                room: room.to_string(),
                ..Default::default()
            })
            .to_jwt()
            .map_err(|e| VoiceError::connection(format!("failed to mint access token: {e}")))
    }
}

pub struct LiveKitConnector {
    config: LiveKitConfig,
}

impl LiveKitConnector {
    pub fn new(config: LiveKitConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl RoomConnector for LiveKitConnector {
    async fn connect(&self, room: &str, identity: &str) -> Result<Arc<dyn RoomConnection>> {
        let room = LiveKitRoom::connect(&self.config, room, identity).await?;
        Ok(Arc::new(room))
    }
}

/// A joined LiveKit room with one published audio track.
pub struct LiveKitRoom {
    name: String,
    room: Room,
    source: NativeAudioSource,
    inbound: Mutex<mpsc::UnboundedReceiver<AudioFrame>>,
}

impl LiveKitRoom {
    pub async fn connect(config: &LiveKitConfig, room_name: &str, identity: &str) -> Result<Self> {
        let token = config.token(room_name, identity)?;
        let (room, mut events) = Room::connect(&config.url, &token, RoomOptions::default())
            .await
            .map_err(|e| VoiceError::connection(format!("failed to join '{room_name}': {e}")))?;
        info!(room = room_name, identity, "connected to LiveKit");

        let source =
            NativeAudioSource::new(AudioSourceOptions::default(), OUTPUT_SAMPLE_RATE, 1, SOURCE_QUEUE_MS);
        let track = LocalAudioTrack::create_audio_track(
            "bookreel-agent-audio",
            RtcAudioSource::Native(source.clone()),
        );
        room.local_participant()
            .publish_track(LocalTrack::Audio(track), TrackPublishOptions::default())
            .await
            .map_err(|e| VoiceError::connection(format!("failed to publish audio track: {e}")))?;

        let (frame_tx, frame_rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                match event {
                    RoomEvent::TrackSubscribed { track: RemoteTrack::Audio(track), .. } => {
                        debug!("subscribed to remote audio track");
                        let frames = frame_tx.clone();
                        tokio::spawn(async move {
                            let mut stream = NativeAudioStream::new(
                                track.rtc_track(),
                                INPUT_SAMPLE_RATE as i32,
                                1,
                            );
                            while let Some(frame) = stream.next().await {
                                let frame =
                                    AudioFrame::mono(frame.data.to_vec(), INPUT_SAMPLE_RATE);
                                if frames.send(frame).is_err() {
                                    break;
                                }
                            }
                        });
                    }
                    RoomEvent::Disconnected { .. } => {
                        info!("disconnected from LiveKit");
                        break;
                    }
                    _ => {}
                }
            }
        });

        Ok(Self { name: room_name.to_string(), room, source, inbound: Mutex::new(frame_rx) })
    }
}

#[async_trait]
impl RoomConnection for LiveKitRoom {
    fn name(&self) -> &str {
        &self.name
    }

    async fn next_audio_frame(&self) -> Option<AudioFrame> {
        self.inbound.lock().await.recv().await
    }

    async fn publish_audio(&self, frame: AudioFrame) -> Result<()> {
        if frame.format.sample_rate != OUTPUT_SAMPLE_RATE {
            warn!(
                sample_rate = frame.format.sample_rate,
                expected = OUTPUT_SAMPLE_RATE,
                "publishing audio at an unexpected sample rate"
            );
        }
        let format = AudioFormat::mono(frame.format.sample_rate);
        let chunk = format.samples_for_ms(PUBLISH_FRAME_MS).max(1);
        for samples in frame.samples.chunks(chunk) {
            let rtc_frame = RtcAudioFrame {
                data: Cow::Borrowed(samples),
                sample_rate: frame.format.sample_rate,
                num_channels: 1,
                samples_per_channel: samples.len() as u32,
            };
            self.source
                .capture_frame(&rtc_frame)
                .await
                .map_err(|e| VoiceError::connection(format!("failed to push audio: {e}")))?;
        }
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.room
            .close()
            .await
            .map_err(|e| VoiceError::connection(format!("failed to leave '{}': {e}", self.name)))
    }
}
