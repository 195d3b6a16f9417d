//! Agent session: one room, one agent, one cooperative loop.

use crate::audio::AudioFrame;
use crate::config::{RoomInputOptions, SessionConfig, VadConfig};
use crate::error::{Result, VoiceError};
use crate::noise::NoiseGate;
use crate::room::RoomConnection;
use crate::stt::SpeechToText;
use crate::tts::TextToSpeech;
use crate::turn::TurnEvent;
use crate::vad::VadWorker;
use bookreel_core::{Agent, Reply, Utterance};
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, info, warn};

enum SessionCommand {
    GenerateReply { instructions: String, respond: oneshot::Sender<Result<Reply>> },
}

struct Running {
    commands: mpsc::Sender<SessionCommand>,
    task: Option<JoinHandle<Result<()>>>,
    room: Arc<dyn RoomConnection>,
    _vad: VadWorker,
}

pub struct AgentSessionBuilder {
    config: SessionConfig,
    stt: Option<Arc<dyn SpeechToText>>,
    tts: Option<Arc<dyn TextToSpeech>>,
}

impl AgentSessionBuilder {
    pub fn new(config: SessionConfig) -> Self {
        Self { config, stt: None, tts: None }
    }

    pub fn stt(mut self, stt: Arc<dyn SpeechToText>) -> Self {
        self.stt = Some(stt);
        self
    }

    pub fn tts(mut self, tts: Arc<dyn TextToSpeech>) -> Self {
        self.tts = Some(tts);
        self
    }

    /// Override the VAD settings from the session config.
    pub fn vad(mut self, vad: VadConfig) -> Self {
        self.config.vad = vad;
        self
    }

    pub fn build(self) -> Result<AgentSession> {
        self.config.validate()?;
        let stt = self.stt.ok_or_else(|| VoiceError::config("STT is required"))?;
        let tts = self.tts.ok_or_else(|| VoiceError::config("TTS is required"))?;

        Ok(AgentSession {
            id: uuid::Uuid::new_v4().to_string(),
            config: self.config,
            stt,
            tts,
            running: Mutex::new(None),
        })
    }
}

/// Binds an [`Agent`] to a room.
///
/// [`start`](Self::start) spawns a single loop that takes proactive reply
/// requests and committed user turns one at a time, so an agent never sees
/// two turns at once.
///
/// # Example
///
/// ```rust,ignore
/// let session = AgentSession::builder(config).stt(stt).tts(tts).build()?;
/// session.start(room, agent, RoomInputOptions::default()).await?;
/// session.generate_reply(GREETING).await?;
/// session.wait().await?;
/// ```
pub struct AgentSession {
    id: String,
    config: SessionConfig,
    stt: Arc<dyn SpeechToText>,
    tts: Arc<dyn TextToSpeech>,
    running: Mutex<Option<Running>>,
}

impl AgentSession {
    pub fn builder(config: SessionConfig) -> AgentSessionBuilder {
        AgentSessionBuilder::new(config)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub async fn start(
        &self,
        room: Arc<dyn RoomConnection>,
        agent: Arc<dyn Agent>,
        options: RoomInputOptions,
    ) -> Result<()> {
        let mut running = self.running.lock().await;
        if running.is_some() {
            return Err(VoiceError::config(format!("session {} already started", self.id)));
        }

        let (frame_tx, frame_rx) = mpsc::unbounded_channel();
        let (turn_tx, turn_rx) = mpsc::unbounded_channel();
        let vad = VadWorker::spawn(self.config.vad.clone(), self.config.turn.clone(), frame_rx, turn_tx)?;

        let gate = NoiseGate::from_options(&options);
        tokio::spawn(
            pump_audio(Arc::clone(&room), gate, frame_tx).instrument(tracing::Span::current()),
        );

        let (command_tx, command_rx) = mpsc::channel(8);
        let session_loop = SessionLoop {
            stt: Arc::clone(&self.stt),
            tts: Arc::clone(&self.tts),
            agent,
            room: Arc::clone(&room),
        };
        let span = tracing::info_span!("session.loop", session.id = %self.id, room.name = room.name());
        let task = tokio::spawn(session_loop.run(command_rx, turn_rx).instrument(span));

        info!(session.id = %self.id, room = room.name(), "session started");
        *running = Some(Running { commands: command_tx, task: Some(task), room, _vad: vad });
        Ok(())
    }

    /// Ask the agent for a proactive utterance and speak it.
    pub async fn generate_reply(&self, instructions: &str) -> Result<Reply> {
        let commands = {
            let running = self.running.lock().await;
            let running = running
                .as_ref()
                .ok_or_else(|| VoiceError::channel("session has not been started"))?;
            running.commands.clone()
        };

        let (respond, response) = oneshot::channel();
        commands
            .send(SessionCommand::GenerateReply { instructions: instructions.to_string(), respond })
            .await
            .map_err(|_| VoiceError::channel("session loop has stopped"))?;
        response.await.map_err(|_| VoiceError::channel("session loop dropped the reply"))?
    }

    /// Wait for the session loop to finish. Returns the first turn failure,
    /// if any.
    pub async fn wait(&self) -> Result<()> {
        let task = {
            let mut running = self.running.lock().await;
            running.as_mut().and_then(|r| r.task.take())
        };
        match task {
            Some(task) => task
                .await
                .map_err(|e| VoiceError::channel(format!("session task failed: {e}")))?,
            None => Ok(()),
        }
    }

    /// Close the room and wait for the loop to wind down.
    pub async fn close(&self) -> Result<()> {
        let room = self.running.lock().await.as_ref().map(|r| Arc::clone(&r.room));
        if let Some(room) = room {
            room.close().await?;
        }
        self.wait().await
    }
}

async fn pump_audio(
    room: Arc<dyn RoomConnection>,
    gate: Option<NoiseGate>,
    frames: mpsc::UnboundedSender<AudioFrame>,
) {
    while let Some(mut frame) = room.next_audio_frame().await {
        if let Some(gate) = &gate {
            gate.apply(&mut frame);
        }
        if frames.send(frame).is_err() {
            break;
        }
    }
    debug!(room = room.name(), "inbound audio ended");
}

struct SessionLoop {
    stt: Arc<dyn SpeechToText>,
    tts: Arc<dyn TextToSpeech>,
    agent: Arc<dyn Agent>,
    room: Arc<dyn RoomConnection>,
}

impl SessionLoop {
    async fn run(
        self,
        commands: mpsc::Receiver<SessionCommand>,
        turns: mpsc::UnboundedReceiver<TurnEvent>,
    ) -> Result<()> {
        let result = self.drive(commands, turns).await;
        if let Err(e) = &result {
            warn!(error = %e, "session stopped");
        }
        if let Err(e) = self.room.close().await {
            warn!(error = %e, "failed to close room");
        }
        result
    }

    async fn drive(
        &self,
        mut commands: mpsc::Receiver<SessionCommand>,
        mut turns: mpsc::UnboundedReceiver<TurnEvent>,
    ) -> Result<()> {
        let mut commands_open = true;
        loop {
            tokio::select! {
                biased;

                command = commands.recv(), if commands_open => match command {
                    Some(SessionCommand::GenerateReply { instructions, respond }) => {
                        let result = self.proactive_reply(&instructions).await;
                        let failed = result.is_err();
                        if let Err(Err(e)) = respond.send(result) {
                            return Err(e);
                        }
                        if failed {
                            // The caller has the error; nothing more to say in this room.
                            return Ok(());
                        }
                    }
                    None => commands_open = false,
                },
                event = turns.recv() => match event {
                    Some(TurnEvent::SpeechStarted) => debug!("user started speaking"),
                    Some(TurnEvent::TurnCommitted { audio, speech_ms }) => {
                        self.handle_turn(audio, speech_ms).await?;
                    }
                    None => {
                        info!("audio ended, closing session");
                        return Ok(());
                    }
                },
            }
        }
    }

    async fn proactive_reply(&self, instructions: &str) -> Result<Reply> {
        let reply = self.agent.generate_reply(instructions).await?;
        self.speak(&reply).await?;
        Ok(reply)
    }

    async fn handle_turn(&self, audio: AudioFrame, speech_ms: u64) -> Result<()> {
        let transcript = self.stt.transcribe(&audio).await?;
        if transcript.is_blank() {
            debug!(speech_ms, "empty transcript, skipping turn");
            return Ok(());
        }
        info!(text = %transcript.text, speech_ms, "user turn");

        let mut utterance = Utterance::new(transcript.text.trim());
        utterance.language = transcript.language;
        let reply = self.agent.on_user_turn(&utterance).await?;
        self.speak(&reply).await
    }

    async fn speak(&self, reply: &Reply) -> Result<()> {
        if reply.text.trim().is_empty() {
            return Ok(());
        }
        info!(text = %reply.text, "agent reply");
        let audio = self.tts.synthesize(&reply.text, reply.language.as_deref()).await?;
        self.room.publish_audio(audio).await
    }
}
