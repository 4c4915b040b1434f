//! Proof-of-work search workers
//!
//! A [`Scanner`] hashes one [`MiningJob`] worth of nonces against the target.
//! [`CpuWorker`] runs a scanner on its own OS thread, pulling jobs from the
//! dispatcher's queue and reporting each outcome back.

use crate::crypto::PowHasher;
use crate::genesis::GenesisBlock;
use crate::target::DifficultyTarget;
use crate::types::{Hash256, HashRate};
use crate::Result;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

pub mod cpu;

pub use cpu::{CpuWorker, JobOutcome, JobReport};

/// Nonces handed out per job unless configured otherwise
pub const DEFAULT_CHUNK_SIZE: u64 = 1_024_000;

/// Size of the 32-bit nonce space
pub const NONCE_SPACE: u64 = 1 << 32;

/// Nonces hashed between cancellation checks and stats flushes
pub const CANCEL_CHECK_INTERVAL: u64 = 4096;

/// A half-open nonce interval `[start, end)` at a fixed timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MiningJob {
    pub id: u64,
    pub start: u32,
    /// Exclusive bound, at most [`NONCE_SPACE`]
    pub end: u64,
    pub timestamp: u32,
}

impl MiningJob {
    pub fn new(id: u64, start: u32, end: u64, timestamp: u32) -> Self {
        debug_assert!(u64::from(start) <= end && end <= NONCE_SPACE);
        Self {
            id,
            start,
            end,
            timestamp,
        }
    }

    /// Number of nonces in the job
    pub fn len(&self) -> u64 {
        self.end - u64::from(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, nonce: u32) -> bool {
        nonce >= self.start && u64::from(nonce) < self.end
    }
}

/// A nonce and timestamp whose header meets the target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solution {
    pub nonce: u32,
    pub timestamp: u32,
    pub pow_hash: Hash256,
    /// The solved block, header carrying the winning nonce and timestamp
    pub block: GenesisBlock,
}

/// Result of scanning one job
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    Found { solution: Solution, hashes: u64 },
    NotFound { hashes: u64 },
    Cancelled { hashes: u64 },
}

impl ScanOutcome {
    /// Nonces hashed before the scan ended
    pub fn hashes(&self) -> u64 {
        match self {
            ScanOutcome::Found { hashes, .. }
            | ScanOutcome::NotFound { hashes }
            | ScanOutcome::Cancelled { hashes } => *hashes,
        }
    }
}

/// Search counters shared by every worker
#[derive(Debug)]
pub struct MiningStats {
    total_hashes: AtomicU64,
    jobs_completed: AtomicU64,
    solutions_found: AtomicU64,
    start_time: Instant,
}

impl MiningStats {
    pub fn new() -> Self {
        Self {
            total_hashes: AtomicU64::new(0),
            jobs_completed: AtomicU64::new(0),
            solutions_found: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn add_hashes(&self, hashes: u64) {
        self.total_hashes.fetch_add(hashes, Ordering::Relaxed);
    }

    pub fn job_completed(&self) {
        self.jobs_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn solution_found(&self) {
        self.solutions_found.fetch_add(1, Ordering::Relaxed);
    }

    pub fn total_hashes(&self) -> u64 {
        self.total_hashes.load(Ordering::Relaxed)
    }

    /// Point-in-time copy of the counters
    pub fn snapshot(&self) -> StatsSnapshot {
        let total_hashes = self.total_hashes();
        let elapsed = self.start_time.elapsed();
        StatsSnapshot {
            total_hashes,
            jobs_completed: self.jobs_completed.load(Ordering::Relaxed),
            solutions_found: self.solutions_found.load(Ordering::Relaxed),
            elapsed,
            hash_rate: HashRate::from_hashes(total_hashes, elapsed),
        }
    }
}

impl Default for MiningStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Counters captured at one instant
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatsSnapshot {
    pub total_hashes: u64,
    pub jobs_completed: u64,
    pub solutions_found: u64,
    pub elapsed: Duration,
    pub hash_rate: HashRate,
}

/// Hashes nonce ranges of a block template against a target
#[derive(Debug, Clone)]
pub struct Scanner {
    hasher: PowHasher,
    target: Arc<DifficultyTarget>,
    cancel: CancellationToken,
    stats: Arc<MiningStats>,
}

impl Scanner {
    pub fn new(
        hasher: PowHasher,
        target: Arc<DifficultyTarget>,
        cancel: CancellationToken,
        stats: Arc<MiningStats>,
    ) -> Self {
        Self {
            hasher,
            target,
            cancel,
            stats,
        }
    }

    /// Scan `job` over `template`
    ///
    /// The template's merkle root is reused as is; only the timestamp is set
    /// once and the nonce patched per attempt. Returns at the end of the
    /// interval, never wrapping past `u32::MAX`.
    pub fn scan(&self, template: &GenesisBlock, job: &MiningJob) -> Result<ScanOutcome> {
        let block = template.with_timestamp(job.timestamp);
        let mut header = block.header_bytes();
        let mut hashes = 0u64;
        let mut unflushed = 0u64;
        let mut nonce = u64::from(job.start);

        while nonce < job.end {
            if hashes % CANCEL_CHECK_INTERVAL == 0 {
                self.stats.add_hashes(unflushed);
                unflushed = 0;
                if self.cancel.is_cancelled() {
                    return Ok(ScanOutcome::Cancelled { hashes });
                }
            }

            header.set_nonce(nonce as u32);
            let hash = self.hasher.pow_hash(header.as_bytes())?;
            hashes += 1;
            unflushed += 1;

            if self.target.is_met_by(&hash) {
                self.stats.add_hashes(unflushed);
                let solution = Solution {
                    nonce: nonce as u32,
                    timestamp: job.timestamp,
                    pow_hash: hash,
                    block: block.with_nonce(nonce as u32),
                };
                return Ok(ScanOutcome::Found { solution, hashes });
            }

            nonce += 1;
        }

        self.stats.add_hashes(unflushed);
        Ok(ScanOutcome::NotFound { hashes })
    }
}
