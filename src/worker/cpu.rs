//! CPU search worker
//!
//! Each worker is a dedicated OS thread. It blocks on the job queue, scans
//! the job it receives and posts a [`JobReport`] on the completion channel.
//! It exits when the queue closes, when cancelled, or after a hashing error.

use super::{MiningJob, MiningStats, ScanOutcome, Scanner, Solution};
use crate::genesis::GenesisBlock;
use crate::{Error, Result};
use crossbeam::channel::{Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn};

/// What happened to one job
#[derive(Debug)]
pub enum JobOutcome {
    Found(Solution),
    NotFound,
    Cancelled,
    Failed(Error),
}

/// Completion message posted by a worker
#[derive(Debug)]
pub struct JobReport {
    pub worker_id: usize,
    pub job: MiningJob,
    pub hashes: u64,
    pub outcome: JobOutcome,
}

/// A search thread bound to the dispatcher's channels
pub struct CpuWorker {
    id: usize,
    template: Arc<GenesisBlock>,
    scanner: Scanner,
    jobs: Receiver<MiningJob>,
    reports: Sender<JobReport>,
    cancel: CancellationToken,
    stats: Arc<MiningStats>,
}

impl CpuWorker {
    pub fn new(
        id: usize,
        template: Arc<GenesisBlock>,
        scanner: Scanner,
        jobs: Receiver<MiningJob>,
        reports: Sender<JobReport>,
        cancel: CancellationToken,
        stats: Arc<MiningStats>,
    ) -> Self {
        Self {
            id,
            template,
            scanner,
            jobs,
            reports,
            cancel,
            stats,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Start the worker on a named thread
    pub fn spawn(self) -> Result<JoinHandle<()>> {
        thread::Builder::new()
            .name(format!("genesis-worker-{}", self.id))
            .spawn(move || self.run())
            .map_err(Error::from)
    }

    /// Process jobs until the queue closes or the search is cancelled
    pub fn run(self) {
        let span = info_span!("worker", id = self.id);
        let _enter = span.enter();
        debug!("Worker started");

        while let Ok(job) = self.jobs.recv() {
            if self.cancel.is_cancelled() {
                self.report(job, 0, JobOutcome::Cancelled);
                break;
            }

            debug!(
                job = job.id,
                start = job.start,
                end = job.end,
                timestamp = job.timestamp,
                "Scanning job"
            );

            let (hashes, outcome) = match self.scanner.scan(&self.template, &job) {
                Ok(ScanOutcome::Found { solution, hashes }) => {
                    info!(
                        nonce = solution.nonce,
                        timestamp = solution.timestamp,
                        hash = %solution.pow_hash,
                        "Solution found"
                    );
                    self.stats.solution_found();
                    (hashes, JobOutcome::Found(solution))
                }
                Ok(ScanOutcome::NotFound { hashes }) => {
                    debug!(job = job.id, hashes, "Job exhausted without a solution");
                    (hashes, JobOutcome::NotFound)
                }
                Ok(ScanOutcome::Cancelled { hashes }) => {
                    debug!(job = job.id, hashes, "Job cancelled");
                    (hashes, JobOutcome::Cancelled)
                }
                Err(e) => {
                    warn!(job = job.id, error = %e, category = e.category(), "Job failed");
                    (0, JobOutcome::Failed(e))
                }
            };

            let stop = !matches!(outcome, JobOutcome::NotFound);
            self.stats.job_completed();
            if !self.report(job, hashes, outcome) || stop {
                break;
            }
        }

        debug!("Worker stopped");
    }

    /// Post a report, returning false once the dispatcher has gone away
    fn report(&self, job: MiningJob, hashes: u64, outcome: JobOutcome) -> bool {
        self.reports
            .send(JobReport {
                worker_id: self.id,
                job,
                hashes,
                outcome,
            })
            .is_ok()
    }
}
