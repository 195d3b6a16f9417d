//! Room abstraction: where audio comes from and where replies go.

use crate::audio::AudioFrame;
use crate::error::{Result, VoiceError};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc, watch};

/// A connected room carrying one remote speaker.
#[async_trait]
pub trait RoomConnection: Send + Sync {
    fn name(&self) -> &str;

    /// Next inbound frame from the remote participant. `None` once the room
    /// is closed or the participant's track has ended.
    async fn next_audio_frame(&self) -> Option<AudioFrame>;

    async fn publish_audio(&self, frame: AudioFrame) -> Result<()>;

    async fn close(&self) -> Result<()>;
}

/// Opens room connections for jobs.
#[async_trait]
pub trait RoomConnector: Send + Sync {
    async fn connect(&self, room: &str, identity: &str) -> Result<Arc<dyn RoomConnection>>;
}

/// In-process room for tests and loopback runs.
pub struct MemoryRoom {
    name: String,
    inbound: Mutex<mpsc::UnboundedReceiver<AudioFrame>>,
    outbound: mpsc::UnboundedSender<AudioFrame>,
    closed: watch::Sender<bool>,
}

/// The far side of a [`MemoryRoom`]: plays the remote participant.
pub struct MemoryRoomPeer {
    inbound: Option<mpsc::UnboundedSender<AudioFrame>>,
    outbound: mpsc::UnboundedReceiver<AudioFrame>,
}

impl MemoryRoom {
    pub fn new(name: impl Into<String>) -> (Arc<Self>, MemoryRoomPeer) {
        let (in_tx, in_rx) = mpsc::unbounded_channel();
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let room = Arc::new(Self {
            name: name.into(),
            inbound: Mutex::new(in_rx),
            outbound: out_tx,
            closed: watch::Sender::new(false),
        });
        (room, MemoryRoomPeer { inbound: Some(in_tx), outbound: out_rx })
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }
}

async fn wait_closed(closed: &mut watch::Receiver<bool>) {
    loop {
        if *closed.borrow_and_update() {
            return;
        }
        if closed.changed().await.is_err() {
            return;
        }
    }
}

#[async_trait]
impl RoomConnection for MemoryRoom {
    fn name(&self) -> &str {
        &self.name
    }

    async fn next_audio_frame(&self) -> Option<AudioFrame> {
        let mut closed = self.closed.subscribe();
        if *closed.borrow_and_update() {
            return None;
        }
        let mut inbound = self.inbound.lock().await;
        tokio::select! {
            frame = inbound.recv() => frame,
            _ = wait_closed(&mut closed) => None,
        }
    }

    async fn publish_audio(&self, frame: AudioFrame) -> Result<()> {
        if self.is_closed() {
            return Err(VoiceError::connection(format!("room '{}' is closed", self.name)));
        }
        self.outbound
            .send(frame)
            .map_err(|_| VoiceError::channel(format!("room '{}' has no listener", self.name)))
    }

    async fn close(&self) -> Result<()> {
        self.closed.send_replace(true);
        Ok(())
    }
}

impl MemoryRoomPeer {
    /// Speak into the room. Returns false once the peer has hung up or the
    /// room is gone.
    pub fn send_audio(&self, frame: AudioFrame) -> bool {
        self.inbound.as_ref().is_some_and(|tx| tx.send(frame).is_ok())
    }

    /// End the participant's track; the session sees end of audio.
    pub fn hang_up(&mut self) {
        self.inbound = None;
    }

    /// Next frame the agent published.
    pub async fn recv_published(&mut self) -> Option<AudioFrame> {
        self.outbound.recv().await
    }

    pub fn try_recv_published(&mut self) -> Option<AudioFrame> {
        self.outbound.try_recv().ok()
    }
}

/// Hands out fresh [`MemoryRoom`]s and keeps their peers for the caller.
#[derive(Default)]
pub struct MemoryConnector {
    peers: std::sync::Mutex<Vec<(String, MemoryRoomPeer)>>,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the peer for `room`, if that room was opened.
    pub fn take_peer(&self, room: &str) -> Option<MemoryRoomPeer> {
        let mut peers = self.peers.lock().ok()?;
        let index = peers.iter().position(|(name, _)| name == room)?;
        Some(peers.remove(index).1)
    }

    pub fn opened(&self) -> Vec<String> {
        self.peers
            .lock()
            .map(|p| p.iter().map(|(name, _)| name.clone()).collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl RoomConnector for MemoryConnector {
    async fn connect(&self, room: &str, identity: &str) -> Result<Arc<dyn RoomConnection>> {
        let (connection, peer) = MemoryRoom::new(room);
        self.peers
            .lock()
            .map_err(|_| VoiceError::connection("memory connector lock poisoned"))?
            .push((room.to_string(), peer));
        tracing::debug!(room, identity, "memory room connected");
        Ok(connection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn frames_flow_both_ways() {
        let (room, mut peer) = MemoryRoom::new("test");
        assert!(peer.send_audio(AudioFrame::mono(vec![1, 2, 3], 16_000)));
        assert_eq!(room.next_audio_frame().await.unwrap().samples, vec![1, 2, 3]);

        room.publish_audio(AudioFrame::mono(vec![9], 24_000)).await.unwrap();
        assert_eq!(peer.recv_published().await.unwrap().samples, vec![9]);
    }

    #[tokio::test]
    async fn hang_up_ends_the_stream() {
        let (room, mut peer) = MemoryRoom::new("test");
        peer.hang_up();
        assert!(room.next_audio_frame().await.is_none());
        assert!(!peer.send_audio(AudioFrame::default()));
    }

    #[tokio::test]
    async fn closed_room_rejects_publishing() {
        let (room, _peer) = MemoryRoom::new("test");
        room.close().await.unwrap();
        assert!(room.next_audio_frame().await.is_none());
        assert!(matches!(
            room.publish_audio(AudioFrame::default()).await,
            Err(VoiceError::Connection(_))
        ));
    }
}
