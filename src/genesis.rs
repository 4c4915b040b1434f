//! Genesis block construction
//!
//! [`GenesisParameters`] is the immutable input fixed at startup. A
//! [`GenesisBlock`] pairs the coinbase transaction with the header template
//! that the search patches nonce and timestamp into.

use crate::block::{BlockHeader, HeaderBytes};
use crate::crypto::{Algorithm, PowHasher};
use crate::target::DifficultyTarget;
use crate::transaction::CoinbaseTransaction;
use crate::types::Hash256;
use crate::{Error, Result};
use serde::Serialize;
use tracing::debug;

/// Everything that defines a genesis block
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenesisParameters {
    pub algorithm: Algorithm,
    /// Timestamp message embedded in the coinbase input
    pub message: String,
    /// Block reward in base units
    pub coins: u64,
    /// Decoded public key receiving the reward
    #[serde(serialize_with = "serialize_hex")]
    pub public_key: Vec<u8>,
    pub timestamp: u32,
    pub nonce: u32,
    pub bits: u32,
}

fn serialize_hex<S>(bytes: &[u8], serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&hex::encode(bytes))
}

impl GenesisParameters {
    /// Public key as hex
    pub fn public_key_hex(&self) -> String {
        hex::encode(&self.public_key)
    }

    /// Decode the compact bits into a target
    pub fn target(&self) -> Result<DifficultyTarget> {
        DifficultyTarget::from_compact(self.bits)
    }
}

/// A genesis block: one coinbase transaction under a header template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenesisBlock {
    header: BlockHeader,
    coinbase: CoinbaseTransaction,
}

impl GenesisBlock {
    /// Build the coinbase and header from `params`
    ///
    /// Fails before any hashing if the message is empty or a script does not
    /// fit its length byte.
    pub fn build(params: &GenesisParameters) -> Result<Self> {
        if params.message.is_empty() {
            return Err(Error::missing_input("message"));
        }

        let coinbase =
            CoinbaseTransaction::new(params.message.as_bytes(), params.coins, &params.public_key)?;
        let merkle_root = coinbase.txid()?;

        debug!(
            merkle_root = %merkle_root,
            algorithm = %params.algorithm,
            "Built genesis coinbase"
        );

        Ok(Self {
            header: BlockHeader::genesis(merkle_root, params.timestamp, params.bits, params.nonce),
            coinbase,
        })
    }

    pub fn header(&self) -> &BlockHeader {
        &self.header
    }

    pub fn coinbase(&self) -> &CoinbaseTransaction {
        &self.coinbase
    }

    /// Merkle root of a single-transaction block is the coinbase txid
    pub fn merkle_root(&self) -> Hash256 {
        self.header.merkle_root
    }

    /// Same block with a different header timestamp
    pub fn with_timestamp(&self, timestamp: u32) -> Self {
        Self {
            header: self.header.with_timestamp(timestamp),
            coinbase: self.coinbase.clone(),
        }
    }

    /// Same block with a different header nonce
    pub fn with_nonce(&self, nonce: u32) -> Self {
        Self {
            header: self.header.with_nonce(nonce),
            coinbase: self.coinbase.clone(),
        }
    }

    /// Encoded header ready for nonce patching
    pub fn header_bytes(&self) -> HeaderBytes {
        HeaderBytes::new(&self.header)
    }

    /// Hash compared against the target
    pub fn pow_hash(&self, hasher: &PowHasher) -> Result<Hash256> {
        hasher.pow_hash(&self.header.to_bytes())
    }

    /// Hash the chain publishes as the block id
    pub fn block_hash(&self, hasher: &PowHasher) -> Result<Hash256> {
        hasher.block_hash(&self.header.to_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::HashBackends;
    use assert_matches::assert_matches;

    fn params() -> GenesisParameters {
        GenesisParameters {
            algorithm: Algorithm::Sha256,
            message: "genesis".to_string(),
            coins: 100,
            public_key: vec![0x02; 33],
            timestamp: 1_700_000_000,
            nonce: 0,
            bits: 0x207fffff,
        }
    }

    #[test]
    fn test_build_sets_header_fields() {
        let block = GenesisBlock::build(&params()).unwrap();
        let header = block.header();

        assert_eq!(header.version, 1);
        assert!(header.prev_block_hash.is_zero());
        assert_eq!(header.timestamp, 1_700_000_000);
        assert_eq!(header.bits, 0x207fffff);
        assert_eq!(block.merkle_root(), block.coinbase().txid().unwrap());
    }

    #[test]
    fn test_empty_message_is_rejected() {
        let mut p = params();
        p.message.clear();
        assert_matches!(GenesisBlock::build(&p), Err(Error::MissingInput { .. }));
    }

    #[test]
    fn test_empty_public_key_still_builds() {
        let mut p = params();
        p.public_key.clear();
        let block = GenesisBlock::build(&p).unwrap();

        assert_eq!(block.coinbase().output.script, vec![0x00, 0xac]);
        assert_eq!(p.public_key_hex(), "");
    }

    #[test]
    fn test_nonce_and_timestamp_keep_merkle_root() {
        let block = GenesisBlock::build(&params()).unwrap();
        let moved = block.with_timestamp(5).with_nonce(9);

        assert_eq!(moved.merkle_root(), block.merkle_root());
        assert_eq!(moved.header().timestamp, 5);
        assert_eq!(moved.header().nonce, 9);
    }

    #[test]
    fn test_hashing_is_deterministic() {
        let hasher = PowHasher::resolve(Algorithm::Sha256, &HashBackends::new()).unwrap();
        let a = GenesisBlock::build(&params()).unwrap();
        let b = GenesisBlock::build(&params()).unwrap();

        assert_eq!(a.header().to_bytes(), b.header().to_bytes());
        assert_eq!(a.block_hash(&hasher).unwrap(), b.block_hash(&hasher).unwrap());
        assert_eq!(a.pow_hash(&hasher).unwrap(), a.block_hash(&hasher).unwrap());
    }

    #[test]
    fn test_parameters_helpers() {
        let p = params();
        assert_eq!(p.public_key_hex(), "02".repeat(33));
        assert_eq!(p.target().unwrap().bits(), 0x207fffff);

        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["algorithm"], "sha256");
        assert_eq!(json["public_key"], "02".repeat(33));
    }
}
