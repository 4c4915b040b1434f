//! Search dispatcher
//!
//! The dispatcher owns the nonce cursor and a fixed pool of [`CpuWorker`]
//! threads. It keeps at most W jobs outstanding, hands them out in strictly
//! increasing non-overlapping order and stops at the first reported
//! solution. Workers never touch the cursor.
//!
//! ```text
//! Dispatching --(W jobs outstanding)--> Waiting --(completion)--> Dispatching
//!      \                                   |
//!       `------------------------------- Done (first solution, error or cancel)
//! ```

use crate::crypto::PowHasher;
use crate::genesis::GenesisBlock;
use crate::target::DifficultyTarget;
use crate::worker::{
    CpuWorker, JobOutcome, JobReport, MiningJob, MiningStats, Scanner, Solution, StatsSnapshot,
    DEFAULT_CHUNK_SIZE, NONCE_SPACE,
};
use crate::{Error, Result};
use crossbeam::channel::{bounded, RecvTimeoutError};
use std::fmt;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// How long the dispatcher waits for a completion before re-checking
/// cancellation and progress
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Pool sizing and reporting cadence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchSettings {
    /// Number of worker threads, at least one
    pub workers: usize,
    /// Nonces per job
    pub chunk_size: u64,
    /// Interval between progress log lines, zero disables them
    pub progress_interval: Duration,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            workers: 4,
            chunk_size: DEFAULT_CHUNK_SIZE,
            progress_interval: Duration::from_secs(10),
        }
    }
}

/// Dispatcher state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatcherState {
    /// Issuing jobs while fewer than W are outstanding
    Dispatching,
    /// Blocked on a completion with no free slot
    Waiting,
    /// Terminal
    Done,
}

impl fmt::Display for DispatcherState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatcherState::Dispatching => write!(f, "dispatching"),
            DispatcherState::Waiting => write!(f, "waiting"),
            DispatcherState::Done => write!(f, "done"),
        }
    }
}

/// Monotonic position in the nonce x timestamp space
///
/// Jobs never cross the 32-bit boundary: a chunk reaching it is cut short,
/// and the following job starts at nonce 0 with the timestamp advanced by one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonceCursor {
    next: u64,
    timestamp: u32,
    chunk: u64,
    next_id: u64,
}

impl NonceCursor {
    pub fn new(nonce: u32, timestamp: u32, chunk: u64) -> Self {
        Self {
            next: u64::from(nonce),
            timestamp,
            chunk: chunk.max(1),
            next_id: 0,
        }
    }

    pub fn timestamp(&self) -> u32 {
        self.timestamp
    }

    /// Issue the next job, rolling the timestamp at the end of the nonce space
    pub fn next_job(&mut self) -> Result<MiningJob> {
        if self.next >= NONCE_SPACE {
            self.timestamp = self.timestamp.checked_add(1).ok_or_else(|| {
                Error::exhausted(format!(
                    "every nonce up to timestamp {} has been tried",
                    u32::MAX
                ))
            })?;
            self.next = 0;
            info!(timestamp = self.timestamp, "Nonce space exhausted, advancing timestamp");
        }

        let start = self.next;
        let end = (start + self.chunk).min(NONCE_SPACE);
        self.next = end;

        let job = MiningJob::new(self.next_id, start as u32, end, self.timestamp);
        self.next_id += 1;
        Ok(job)
    }
}

/// A finished search
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub solution: Solution,
    pub stats: StatsSnapshot,
    pub jobs_issued: u64,
    pub elapsed: Duration,
}

/// Coordinates the worker pool for one search
pub struct Dispatcher {
    settings: SearchSettings,
    template: Arc<GenesisBlock>,
    hasher: PowHasher,
    target: Arc<DifficultyTarget>,
    cancel: CancellationToken,
    stats: Arc<MiningStats>,
}

impl Dispatcher {
    /// Search starting at the template's nonce and timestamp
    pub fn new(
        settings: SearchSettings,
        template: GenesisBlock,
        hasher: PowHasher,
        target: DifficultyTarget,
    ) -> Self {
        Self {
            settings,
            template: Arc::new(template),
            hasher,
            target: Arc::new(target),
            cancel: CancellationToken::new(),
            stats: Arc::new(MiningStats::new()),
        }
    }

    /// Token that aborts the search with [`Error::Cancelled`] when cancelled
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Shared counters, readable while the search runs
    pub fn stats(&self) -> Arc<MiningStats> {
        Arc::clone(&self.stats)
    }

    /// Run the search to completion on the calling thread
    ///
    /// Returns the first solution any worker reports. Every worker has been
    /// stopped and joined by the time this returns.
    pub fn run(self) -> Result<SearchResult> {
        let started = Instant::now();
        let workers = self.settings.workers.max(1);
        let header = self.template.header();

        info!(
            workers,
            chunk_size = self.settings.chunk_size,
            algorithm = %self.hasher.algorithm(),
            threshold = %self.target,
            nonce = header.nonce,
            timestamp = header.timestamp,
            "Starting proof-of-work search"
        );

        let search = self.cancel.child_token();
        let (job_tx, job_rx) = bounded::<MiningJob>(workers);
        let (report_tx, report_rx) = bounded::<JobReport>(workers);

        let mut handles: Vec<JoinHandle<()>> = Vec::with_capacity(workers);
        for id in 0..workers {
            let scanner = Scanner::new(
                self.hasher.clone(),
                Arc::clone(&self.target),
                search.clone(),
                Arc::clone(&self.stats),
            );
            let worker = CpuWorker::new(
                id,
                Arc::clone(&self.template),
                scanner,
                job_rx.clone(),
                report_tx.clone(),
                search.clone(),
                Arc::clone(&self.stats),
            );
            match worker.spawn() {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    search.cancel();
                    drop(job_tx);
                    drop(report_rx);
                    join_workers(handles);
                    return Err(e);
                }
            }
        }
        drop(job_rx);
        drop(report_tx);

        let mut cursor = NonceCursor::new(header.nonce, header.timestamp, self.settings.chunk_size);
        let mut state = DispatcherState::Dispatching;
        let mut outstanding = 0usize;
        let mut jobs_issued = 0u64;
        let mut exhausted: Option<Error> = None;
        let mut finished: Option<Result<Solution>> = None;
        let mut last_progress = Instant::now();

        let outcome: Result<Solution> = loop {
            if state != DispatcherState::Done && self.cancel.is_cancelled() {
                finished = Some(Err(Error::cancelled("proof-of-work search")));
                state = DispatcherState::Done;
            }
            self.log_progress(&mut last_progress, jobs_issued);

            match state {
                DispatcherState::Dispatching => {
                    if outstanding >= workers {
                        state = DispatcherState::Waiting;
                    } else if let Some(e) = exhausted.take() {
                        if outstanding == 0 {
                            finished = Some(Err(e));
                            state = DispatcherState::Done;
                        } else {
                            exhausted = Some(e);
                            state = DispatcherState::Waiting;
                        }
                    } else {
                        match cursor.next_job() {
                            Ok(job) => {
                                if job_tx.send(job).is_err() {
                                    finished = Some(Err(Error::worker("every worker has exited")));
                                    state = DispatcherState::Done;
                                } else {
                                    outstanding += 1;
                                    jobs_issued += 1;
                                }
                            }
                            Err(e) => exhausted = Some(e),
                        }
                    }
                }
                DispatcherState::Waiting => match report_rx.recv_timeout(POLL_INTERVAL) {
                    Ok(report) => {
                        outstanding = outstanding.saturating_sub(1);
                        match report.outcome {
                            JobOutcome::Found(solution) => {
                                debug!(
                                    worker = report.worker_id,
                                    job = report.job.id,
                                    "Accepting first reported solution"
                                );
                                finished = Some(Ok(solution));
                                state = DispatcherState::Done;
                            }
                            JobOutcome::NotFound | JobOutcome::Cancelled => {
                                state = DispatcherState::Dispatching;
                            }
                            JobOutcome::Failed(e) => {
                                finished = Some(Err(e));
                                state = DispatcherState::Done;
                            }
                        }
                    }
                    Err(RecvTimeoutError::Timeout) => {}
                    Err(RecvTimeoutError::Disconnected) => {
                        finished = Some(Err(Error::worker("every worker has exited")));
                        state = DispatcherState::Done;
                    }
                },
                DispatcherState::Done => {
                    break finished
                        .take()
                        .unwrap_or_else(|| Err(Error::worker("search ended without a result")));
                }
            }
        };
        debug!(%state, jobs_issued, "Stopping workers");

        search.cancel();
        drop(job_tx);
        drop(report_rx);
        join_workers(handles);

        let solution = outcome?;
        let stats = self.stats.snapshot();
        let elapsed = started.elapsed();
        info!(
            nonce = solution.nonce,
            timestamp = solution.timestamp,
            hashes = stats.total_hashes,
            rate = %stats.hash_rate,
            elapsed = %humantime::format_duration(Duration::from_secs(elapsed.as_secs())),
            "Search finished"
        );

        Ok(SearchResult {
            solution,
            stats,
            jobs_issued,
            elapsed,
        })
    }

    fn log_progress(&self, last: &mut Instant, jobs_issued: u64) {
        let interval = self.settings.progress_interval;
        if interval.is_zero() || last.elapsed() < interval {
            return;
        }
        *last = Instant::now();
        let stats = self.stats.snapshot();
        info!(
            hashes = %crate::utils::format_count(stats.total_hashes),
            rate = %stats.hash_rate,
            jobs = jobs_issued,
            "Search in progress"
        );
    }
}

fn join_workers(handles: Vec<JoinHandle<()>>) {
    for handle in handles {
        if handle.join().is_err() {
            warn!("Worker thread panicked");
        }
    }
}
