//! Success report
//!
//! Printed on stdout once a solution is accepted, either as aligned text or
//! as a JSON object with the same fields.

use crate::crypto::{Algorithm, PowHasher};
use crate::dispatcher::SearchResult;
use crate::genesis::GenesisParameters;
use crate::target::DifficultyTarget;
use crate::types::{Hash256, HashRate};
use crate::Result;
use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Report rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Everything printed about a solved genesis block
#[derive(Debug, Clone, Serialize)]
pub struct GenesisReport {
    pub algorithm: Algorithm,
    pub pow_hash: Hash256,
    /// Target as 32 big-endian bytes in hex
    pub target: String,
    pub block_hash: Hash256,
    pub merkle_root: Hash256,
    pub nonce: u32,
    pub timestamp: u32,
    pub timestamp_utc: Option<DateTime<Utc>>,
    pub public_key: String,
    pub coins: u64,
    pub message: String,
    pub hashes: u64,
    pub elapsed_secs: f64,
    pub hash_rate: HashRate,
}

impl GenesisReport {
    /// Assemble the report, computing the block identity hash of the solved header
    pub fn new(
        params: &GenesisParameters,
        target: &DifficultyTarget,
        hasher: &PowHasher,
        result: &SearchResult,
    ) -> Result<Self> {
        let solution = &result.solution;
        Ok(Self {
            algorithm: hasher.algorithm(),
            pow_hash: solution.pow_hash,
            target: target.to_string(),
            block_hash: solution.block.block_hash(hasher)?,
            merkle_root: solution.block.merkle_root(),
            nonce: solution.nonce,
            timestamp: solution.timestamp,
            timestamp_utc: DateTime::from_timestamp(i64::from(solution.timestamp), 0),
            public_key: params.public_key_hex(),
            coins: params.coins,
            message: params.message.clone(),
            hashes: result.stats.total_hashes,
            elapsed_secs: result.elapsed.as_secs_f64(),
            hash_rate: HashRate::from_hashes(result.stats.total_hashes, result.elapsed),
        })
    }

    /// Render in the requested format
    pub fn render(&self, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Text => Ok(self.to_string()),
            OutputFormat::Json => Ok(serde_json::to_string_pretty(self)?),
        }
    }
}

impl fmt::Display for GenesisReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Ctrl Hash:\t0x{}", self.pow_hash)?;
        writeln!(f, "Target:\t\t0x{}", self.target)?;
        writeln!(f, "Blk Hash:\t0x{}", self.block_hash)?;
        writeln!(f, "Mkl Hash:\t0x{}", self.merkle_root)?;
        writeln!(f, "Nonce:\t\t{}", self.nonce)?;
        match &self.timestamp_utc {
            Some(utc) => writeln!(f, "Timestamp:\t{} ({})", self.timestamp, utc.to_rfc3339())?,
            None => writeln!(f, "Timestamp:\t{}", self.timestamp)?,
        }
        writeln!(f, "Pubkey:\t\t{}", self.public_key)?;
        writeln!(f, "Coins:\t\t{}", self.coins)?;
        writeln!(f, "Psz:\t\t'{}'", self.message)?;
        writeln!(f, "Algorithm:\t{}", self.algorithm)?;
        writeln!(f, "Hashes:\t\t{}", crate::utils::format_count(self.hashes))?;
        writeln!(
            f,
            "Elapsed:\t{}",
            humantime::format_duration(Duration::from_millis((self.elapsed_secs * 1000.0) as u64))
        )?;
        write!(f, "Hash rate:\t{}", self.hash_rate)
    }
}
