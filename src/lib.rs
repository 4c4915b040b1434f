//! Genesis Miner
//!
//! Builds the genesis block of a Bitcoin-derived chain and searches for a
//! proof-of-work solution:
//! - Coinbase transaction and 80-byte header encoding
//! - SHA256d and scrypt hashing, with X11/Quark through pluggable primitives
//! - Compact difficulty target decoding
//! - Multi-threaded nonce search with timestamp rollover and cancellation

pub mod block;
pub mod config;
pub mod crypto;
pub mod dispatcher;
pub mod error;
pub mod genesis;
pub mod report;
pub mod script;
pub mod target;
pub mod transaction;
pub mod types;
pub mod utils;
pub mod worker;

pub use config::Config;
pub use error::{Error, Result};
pub use types::*;

/// Application information
pub const APP_NAME: &str = "genesis-miner";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
