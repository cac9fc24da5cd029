//! Ingestion scheduler
//!
//! Each cycle moves through `Idle -> Fetching -> Committing -> Sleeping`,
//! leaving `Fetching` early for `Sleeping` on a transient error or for
//! `Suspended` when the credential runs out of quota. Suspension parks only
//! the offending credential; the remaining ones keep rotating.

use crate::config::Config;
use crate::credentials::{Acquisition, Credential, CredentialPool, CredentialState};
use crate::fetcher::{FetchOutcome, SearchClient};
use crate::ingest::report::{CycleReport, CycleState};
use crate::ingest::SchedulerMode;
use crate::storage::RecordStore;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{JoinError, JoinSet};
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Longest a credential is ever parked after a quota error
const MAX_SUSPENSION: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Timing and query settings for the scheduler
#[derive(Debug, Clone)]
pub struct SchedulerSettings {
    pub query: String,
    pub interval: Duration,
    pub quota_backoff: Duration,
    pub mode: SchedulerMode,
    pub shutdown_grace: Duration,
}

impl SchedulerSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            query: config.youtube.search_query.clone(),
            interval: config.youtube.fetch_interval(),
            quota_backoff: config.youtube.quota_backoff(),
            mode: config.scheduler.mode,
            shutdown_grace: config.scheduler.shutdown_grace(),
        }
    }
}

/// Drives the recurring fetch-then-store cycle
///
/// Cloning is cheap; clones share the pool, client and store.
#[derive(Clone)]
pub struct IngestScheduler {
    pool: Arc<CredentialPool>,
    client: Arc<dyn SearchClient>,
    store: Arc<dyn RecordStore>,
    settings: Arc<SchedulerSettings>,
}

impl IngestScheduler {
    pub fn new(
        pool: Arc<CredentialPool>,
        client: Arc<dyn SearchClient>,
        store: Arc<dyn RecordStore>,
        settings: SchedulerSettings,
    ) -> Self {
        Self {
            pool,
            client,
            store,
            settings: Arc::new(settings),
        }
    }

    pub fn settings(&self) -> &SchedulerSettings {
        &self.settings
    }

    pub fn pool(&self) -> &CredentialPool {
        &self.pool
    }

    /// Runs one complete rotating tick inline
    ///
    /// Acquires the next usable credential and runs a cycle with it. When
    /// every credential is suspended nothing is fetched.
    pub async fn tick(&self) -> CycleReport {
        match self.acquire() {
            Ok(credential) => self.run_cycle(credential).await,
            Err(report) => report,
        }
    }

    fn acquire(&self) -> Result<Credential, CycleReport> {
        let now = Instant::now();
        match self.pool.acquire_available(now) {
            Acquisition::Ready(credential) => Ok(credential),
            Acquisition::AllSuspended { next_resume } => Err(CycleReport::AllSuspended {
                next_resume: wall_clock(next_resume),
            }),
        }
    }

    /// Runs one fetch-then-store cycle with the given credential
    ///
    /// Never fails: every error is folded into the returned report.
    pub async fn run_cycle(&self, credential: Credential) -> CycleReport {
        transition(&credential, CycleState::Idle, CycleState::Fetching);

        match self.client.fetch(&credential, &self.settings.query).await {
            FetchOutcome::Success(batch) => {
                transition(&credential, CycleState::Fetching, CycleState::Committing);
                let report = self.commit(credential.clone(), batch).await;
                transition(&credential, CycleState::Committing, report.final_state());
                report
            }
            FetchOutcome::TransientError(error) => {
                transition(&credential, CycleState::Fetching, CycleState::Sleeping);
                CycleReport::Skipped { credential, error }
            }
            FetchOutcome::QuotaExceeded(exhausted) => {
                let report = self.suspend(exhausted);
                transition(&credential, CycleState::Fetching, report.final_state());
                report
            }
        }
    }

    fn suspend(&self, credential: Credential) -> CycleReport {
        let resume_at = resume_instant(Instant::now(), self.settings.quota_backoff);
        if !self.pool.suspend(&credential, resume_at) {
            tracing::warn!("Quota reported for {} which is not in the pool", credential);
        }
        CycleReport::Suspended {
            credential,
            resume_at: wall_clock(resume_at),
        }
    }

    /// Hands the batch to the store on the blocking pool
    async fn commit(
        &self,
        credential: Credential,
        batch: Vec<crate::record::CanonicalRecord>,
    ) -> CycleReport {
        let fetched = batch.len();
        let store = Arc::clone(&self.store);

        match tokio::task::spawn_blocking(move || store.append(&batch)).await {
            Ok(Ok(_)) if fetched == 0 => CycleReport::Empty { credential },
            Ok(Ok(inserted)) => CycleReport::Stored {
                credential,
                fetched,
                inserted,
            },
            Ok(Err(e)) => CycleReport::StoreFailed {
                credential,
                fetched,
                error: e.to_string(),
            },
            Err(e) => CycleReport::StoreFailed {
                credential,
                fetched,
                error: format!("store task failed: {}", e),
            },
        }
    }

    /// Runs until `shutdown` is cancelled, then drains in-flight work
    pub async fn run(self, shutdown: CancellationToken) {
        tracing::info!(
            mode = ?self.settings.mode,
            credentials = self.pool.len(),
            "Starting ingestion every {:?} for query '{}'",
            self.settings.interval,
            self.settings.query
        );

        match self.settings.mode {
            SchedulerMode::Rotating => self.run_rotating(shutdown).await,
            SchedulerMode::PerCredential => self.run_per_credential(shutdown).await,
        }

        tracing::info!("Ingestion stopped");
    }

    /// Single timer; each tick spawns one cycle on its own task
    async fn run_rotating(self, shutdown: CancellationToken) {
        let mut ticker = time::interval(self.settings.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut in_flight: JoinSet<CycleReport> = JoinSet::new();

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                Some(result) = in_flight.join_next(), if !in_flight.is_empty() => {
                    log_cycle_result(result);
                }
                _ = ticker.tick() => {
                    match self.acquire() {
                        Ok(credential) => {
                            let this = self.clone();
                            in_flight.spawn(async move { this.run_cycle(credential).await });
                        }
                        Err(report) => report.log(),
                    }
                }
            }
        }

        drain(in_flight, self.settings.shutdown_grace, log_cycle_result).await;
    }

    /// One worker per credential, staggered across the interval
    async fn run_per_credential(self, shutdown: CancellationToken) {
        let credentials = self.pool.credentials();
        let count = credentials.len() as u32;
        let mut workers: JoinSet<()> = JoinSet::new();

        for (index, credential) in credentials.into_iter().enumerate() {
            let offset = self.settings.interval * index as u32 / count;
            let this = self.clone();
            let token = shutdown.clone();
            workers.spawn(async move { this.run_worker(credential, offset, token).await });
        }

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                result = workers.join_next() => match result {
                    Some(result) => log_worker_result(result),
                    None => break,
                },
            }
        }

        drain(workers, self.settings.shutdown_grace, log_worker_result).await;
    }

    async fn run_worker(self, credential: Credential, offset: Duration, shutdown: CancellationToken) {
        let mut ticker = time::interval_at(Instant::now() + offset, self.settings.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::debug!("Worker for {} starting in {:?}", credential, offset);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {}
            }

            if let Some(CredentialState::Suspended { resume_at }) =
                self.pool.state_of(&credential, Instant::now())
            {
                tracing::info!(
                    "Worker for {} idle until {}",
                    credential,
                    wall_clock(resume_at).to_rfc3339()
                );
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = time::sleep_until(resume_at) => {}
                }
                ticker.reset();
                if self.pool.state_of(&credential, Instant::now()) != Some(CredentialState::Active) {
                    continue;
                }
            }

            self.run_cycle(credential.clone()).await.log();
        }

        tracing::debug!("Worker for {} stopped", credential);
    }
}

/// Waits up to `grace` for tasks to finish, then aborts the rest
async fn drain<T, F>(mut tasks: JoinSet<T>, grace: Duration, mut on_done: F)
where
    T: 'static,
    F: FnMut(Result<T, JoinError>),
{
    if tasks.is_empty() {
        return;
    }

    tracing::info!(
        "Waiting up to {:?} for {} in-flight task(s)",
        grace,
        tasks.len()
    );

    let finished = time::timeout(grace, async {
        while let Some(result) = tasks.join_next().await {
            on_done(result);
        }
    })
    .await;
    if finished.is_err() {
        tracing::warn!("Aborting {} task(s) after shutdown grace period", tasks.len());
        tasks.shutdown().await;
    }
}

fn log_cycle_result(result: Result<CycleReport, JoinError>) {
    match result {
        Ok(report) => report.log(),
        Err(e) if e.is_cancelled() => tracing::debug!("Cycle cancelled"),
        Err(e) => tracing::error!("Cycle task panicked: {}", e),
    }
}

fn log_worker_result(result: Result<(), JoinError>) {
    match result {
        Ok(()) => {}
        Err(e) if e.is_cancelled() => tracing::debug!("Worker cancelled"),
        Err(e) => tracing::error!("Worker task panicked: {}", e),
    }
}

fn transition(credential: &Credential, from: CycleState, to: CycleState) {
    tracing::trace!(credential = %credential, "{} -> {}", from, to);
}

/// End of a quota suspension, capped so it always fits the clock
fn resume_instant(now: Instant, backoff: Duration) -> Instant {
    let backoff = backoff.min(MAX_SUSPENSION);
    now.checked_add(backoff).unwrap_or(now)
}

/// Maps a monotonic instant onto the wall clock for reporting
fn wall_clock(at: Instant) -> DateTime<Utc> {
    let now = Instant::now();
    let now_utc = Utc::now();
    if at >= now {
        chrono::Duration::from_std(at - now)
            .ok()
            .and_then(|d| now_utc.checked_add_signed(d))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    } else {
        chrono::Duration::from_std(now - at)
            .ok()
            .and_then(|d| now_utc.checked_sub_signed(d))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}
