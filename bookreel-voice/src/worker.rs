//! Job worker: runs an entrypoint once per incoming room job.

use crate::error::{Result, VoiceError};
use crate::room::{RoomConnection, RoomConnector};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;
use tracing::{Instrument, error, info};

/// A request to serve one room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub id: String,
    pub room: String,
}

impl Job {
    pub fn new(room: impl Into<String>) -> Self {
        Self { id: format!("job-{}", uuid::Uuid::new_v4()), room: room.into() }
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }
}

/// Where jobs come from.
#[async_trait]
pub trait JobSource: Send {
    /// `None` when no more jobs will arrive.
    async fn next_job(&mut self) -> Option<Job>;
}

/// A fixed list of jobs, e.g. from `--room` flags.
#[derive(Debug, Default)]
pub struct StaticJobSource {
    jobs: VecDeque<Job>,
}

impl StaticJobSource {
    pub fn new(jobs: impl IntoIterator<Item = Job>) -> Self {
        Self { jobs: jobs.into_iter().collect() }
    }

    pub fn rooms<I, S>(rooms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(rooms.into_iter().map(Job::new))
    }
}

#[async_trait]
impl JobSource for StaticJobSource {
    async fn next_job(&mut self) -> Option<Job> {
        self.jobs.pop_front()
    }
}

/// Jobs pushed at runtime over a channel.
pub struct ChannelJobSource {
    receiver: mpsc::Receiver<Job>,
}

impl ChannelJobSource {
    pub fn new(buffer: usize) -> (mpsc::Sender<Job>, Self) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (tx, Self { receiver: rx })
    }
}

#[async_trait]
impl JobSource for ChannelJobSource {
    async fn next_job(&mut self) -> Option<Job> {
        self.receiver.recv().await
    }
}

/// What an entrypoint gets for its job.
#[derive(Clone)]
pub struct JobContext {
    job: Job,
    identity: String,
    connector: Arc<dyn RoomConnector>,
}

impl JobContext {
    pub fn job(&self) -> &Job {
        &self.job
    }

    pub fn room_name(&self) -> &str {
        &self.job.room
    }

    /// Connect to the job's room as the agent participant.
    pub async fn connect(&self) -> Result<Arc<dyn RoomConnection>> {
        self.connector.connect(&self.job.room, &self.identity).await
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerOptions {
    pub max_concurrent_jobs: usize,
    /// Participant identity the agent joins rooms with.
    pub agent_identity: String,
}

impl Default for WorkerOptions {
    fn default() -> Self {
        Self { max_concurrent_jobs: 4, agent_identity: "bookreel-agent".to_string() }
    }
}

impl WorkerOptions {
    #[must_use]
    pub fn with_max_concurrent_jobs(mut self, max: usize) -> Self {
        self.max_concurrent_jobs = max.max(1);
        self
    }

    #[must_use]
    pub fn with_agent_identity(mut self, identity: impl Into<String>) -> Self {
        self.agent_identity = identity.into();
        self
    }
}

/// Totals after a worker has drained its job source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerReport {
    pub completed: usize,
    pub failed: usize,
}

pub struct Worker {
    options: WorkerOptions,
    connector: Arc<dyn RoomConnector>,
}

impl Worker {
    pub fn new(options: WorkerOptions, connector: Arc<dyn RoomConnector>) -> Self {
        Self { options, connector }
    }

    pub fn options(&self) -> &WorkerOptions {
        &self.options
    }

    /// Run `entrypoint` for every job until the source is exhausted and all
    /// jobs have finished. Jobs share nothing; a failing job is logged with
    /// its id and does not affect the others.
    pub async fn run<S, F, Fut>(&self, mut source: S, entrypoint: F) -> Result<WorkerReport>
    where
        S: JobSource,
        F: Fn(JobContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let permits = Arc::new(Semaphore::new(self.options.max_concurrent_jobs.max(1)));
        let entrypoint = Arc::new(entrypoint);
        let mut jobs = JoinSet::new();
        let mut report = WorkerReport::default();

        info!(max_concurrent_jobs = self.options.max_concurrent_jobs, "worker started");
        while let Some(job) = source.next_job().await {
            let permit = Arc::clone(&permits)
                .acquire_owned()
                .await
                .map_err(|_| VoiceError::channel("worker semaphore closed"))?;

            // Collect anything that already finished so the report stays current.
            while let Some(done) = jobs.try_join_next() {
                tally(&mut report, done);
            }

            let ctx = JobContext {
                job: job.clone(),
                identity: self.options.agent_identity.clone(),
                connector: Arc::clone(&self.connector),
            };
            let entrypoint = Arc::clone(&entrypoint);
            let span = bookreel_telemetry::session_span(&job.room, &job.id);
            jobs.spawn(
                async move {
                    let _permit = permit;
                    info!("job started");
                    let result = entrypoint(ctx).await;
                    match &result {
                        Ok(()) => info!("job finished"),
                        Err(e) => error!(job.id = %job.id, error = %e, "job failed"),
                    }
                    result
                }
                .instrument(span),
            );
        }

        while let Some(done) = jobs.join_next().await {
            tally(&mut report, done);
        }
        info!(completed = report.completed, failed = report.failed, "worker drained");
        Ok(report)
    }
}

fn tally(report: &mut WorkerReport, done: std::result::Result<Result<()>, tokio::task::JoinError>) {
    match done {
        Ok(Ok(())) => report.completed += 1,
        Ok(Err(_)) => report.failed += 1,
        Err(e) => {
            error!(error = %e, "job task panicked");
            report.failed += 1;
        }
    }
}
