use async_trait::async_trait;
use bookreel_agent::{GREETING, PolicyOptions};
use bookreel_cli::cli::{Cli, Commands};
use bookreel_cli::entrypoint::{Services, entrypoint};
use bookreel_cli::serve_rooms;
use bookreel_model::MockLlm;
use bookreel_telemetry::LogFormat;
use bookreel_voice::{
    AudioFrame, MemoryConnector, RoomConnection, RoomConnector, SessionConfig, SpeechToText,
    StaticJobSource, TextToSpeech, Transcript, VoiceError, Worker, WorkerOptions,
};
use clap::Parser;
use std::path::Path;
use std::sync::{Arc, Mutex};

#[test]
fn start_accepts_several_rooms() {
    let cli = Cli::try_parse_from([
        "bookreel", "start", "--room", "lobby", "--room", "kitchen", "--max-jobs", "2",
    ])
    .unwrap();
    match cli.command {
        Commands::Start { rooms, max_jobs } => {
            assert_eq!(rooms, vec!["lobby", "kitchen"]);
            assert_eq!(max_jobs, Some(2));
        }
        other => panic!("unexpected command {other:?}"),
    }
}

#[test]
fn start_requires_a_room() {
    assert!(Cli::try_parse_from(["bookreel", "start"]).is_err());
}

#[test]
fn dev_takes_one_room_and_logs_at_debug() {
    let cli = Cli::try_parse_from(["bookreel", "dev", "--room", "lobby"]).unwrap();
    assert_eq!(cli.command.log_level(), "debug");
    assert!(matches!(cli.command, Commands::Dev { room } if room == "lobby"));
}

#[test]
fn config_flag_is_global() {
    let cli = Cli::try_parse_from(["bookreel", "console", "--config", "bookreel.toml"]).unwrap();
    assert_eq!(cli.config.as_deref(), Some(Path::new("bookreel.toml")));
    assert!(matches!(cli.command, Commands::Console));
    assert!(!cli.json_logs);
}

#[test]
fn otlp_endpoint_reaches_telemetry() {
    let cli = Cli::try_parse_from([
        "bookreel",
        "dev",
        "--room",
        "lobby",
        "--json-logs",
        "--otlp-endpoint",
        "http://localhost:4317",
    ])
    .unwrap();
    let telemetry = cli.telemetry();
    assert_eq!(telemetry.otlp_endpoint.as_deref(), Some("http://localhost:4317"));
    assert_eq!(telemetry.format, LogFormat::Json);
    assert_eq!(telemetry.default_level, "debug");
}

#[test]
fn unknown_subcommand_is_rejected() {
    assert!(Cli::try_parse_from(["bookreel", "serve"]).is_err());
}

struct SilentStt;

#[async_trait]
impl SpeechToText for SilentStt {
    fn name(&self) -> &str {
        "silent"
    }

    async fn transcribe(&self, _audio: &AudioFrame) -> bookreel_voice::Result<Transcript> {
        Ok(Transcript::new(""))
    }
}

#[derive(Default)]
struct RecordingTts {
    spoken: Mutex<Vec<String>>,
}

#[async_trait]
impl TextToSpeech for RecordingTts {
    fn name(&self) -> &str {
        "recording"
    }

    fn sample_rate(&self) -> u32 {
        24_000
    }

    async fn synthesize(
        &self,
        text: &str,
        _language: Option<&str>,
    ) -> bookreel_voice::Result<AudioFrame> {
        self.spoken.lock().unwrap().push(text.to_string());
        Ok(AudioFrame::mono(vec![1; 240], 24_000))
    }
}

#[tokio::test]
async fn job_greets_the_room_and_ends_on_hang_up() {
    let tts = Arc::new(RecordingTts::default());
    let services = Arc::new(Services {
        model: Arc::new(MockLlm::new("mock")),
        stt: Arc::new(SilentStt),
        tts: tts.clone(),
        session: SessionConfig::default(),
        policy: PolicyOptions::default(),
    });
    let connector = Arc::new(MemoryConnector::new());
    let worker = Worker::new(WorkerOptions::default(), connector.clone());

    let run = tokio::spawn(async move {
        worker
            .run(StaticJobSource::rooms(["lobby"]), move |ctx| entrypoint(ctx, Arc::clone(&services)))
            .await
    });

    let mut peer = loop {
        if let Some(peer) = connector.take_peer("lobby") {
            break peer;
        }
        tokio::task::yield_now().await;
    };
    assert_eq!(peer.recv_published().await.unwrap().len(), 240);
    peer.hang_up();

    let report = run.await.unwrap().unwrap();
    assert_eq!(report.completed, 1);
    assert_eq!(*tts.spoken.lock().unwrap(), vec![GREETING.to_string()]);
}

/// Refuses every room.
struct UnreachableConnector;

#[async_trait]
impl RoomConnector for UnreachableConnector {
    async fn connect(
        &self,
        room: &str,
        _identity: &str,
    ) -> bookreel_voice::Result<Arc<dyn RoomConnection>> {
        Err(VoiceError::connection(format!("{room} is unreachable")))
    }
}

#[tokio::test]
async fn failed_rooms_are_reported_not_raised() {
    let services = Arc::new(Services {
        model: Arc::new(MockLlm::new("mock")),
        stt: Arc::new(SilentStt),
        tts: Arc::new(RecordingTts::default()),
        session: SessionConfig::default(),
        policy: PolicyOptions::default(),
    });

    let report = serve_rooms(
        Arc::new(UnreachableConnector),
        services,
        WorkerOptions::default(),
        StaticJobSource::rooms(["lobby", "kitchen"]),
    )
    .await
    .unwrap();

    assert_eq!(report.completed, 0);
    assert_eq!(report.failed, 2);
}
