//! Block header encoding
//!
//! The header is 80 bytes: version, previous block hash, merkle root,
//! timestamp, bits and nonce, integers little-endian. Only the trailing
//! nonce changes while mining, so the search patches it in place through
//! [`HeaderBytes`] instead of re-encoding.

use crate::types::Hash256;
use byteorder::{ByteOrder, LittleEndian};

/// Encoded header size
pub const HEADER_SIZE: usize = 80;

/// Byte offset of the timestamp field
pub const TIMESTAMP_OFFSET: usize = 68;

/// Byte offset of the bits field
pub const BITS_OFFSET: usize = 72;

/// Byte offset of the nonce field
pub const NONCE_OFFSET: usize = 76;

/// Genesis block header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader {
    pub version: u32,
    pub prev_block_hash: Hash256,
    pub merkle_root: Hash256,
    pub timestamp: u32,
    pub bits: u32,
    pub nonce: u32,
}

impl BlockHeader {
    pub const VERSION: u32 = 1;

    /// Header with version 1 and an all-zero previous hash
    pub fn genesis(merkle_root: Hash256, timestamp: u32, bits: u32, nonce: u32) -> Self {
        Self {
            version: Self::VERSION,
            prev_block_hash: Hash256::ZERO,
            merkle_root,
            timestamp,
            bits,
            nonce,
        }
    }

    /// The 80-byte encoding
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut out = [0u8; HEADER_SIZE];
        LittleEndian::write_u32(&mut out[0..4], self.version);
        out[4..36].copy_from_slice(self.prev_block_hash.as_bytes());
        out[36..68].copy_from_slice(self.merkle_root.as_bytes());
        LittleEndian::write_u32(&mut out[TIMESTAMP_OFFSET..BITS_OFFSET], self.timestamp);
        LittleEndian::write_u32(&mut out[BITS_OFFSET..NONCE_OFFSET], self.bits);
        LittleEndian::write_u32(&mut out[NONCE_OFFSET..HEADER_SIZE], self.nonce);
        out
    }

    /// Copy of this header with a different timestamp
    pub fn with_timestamp(mut self, timestamp: u32) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Copy of this header with a different nonce
    pub fn with_nonce(mut self, nonce: u32) -> Self {
        self.nonce = nonce;
        self
    }
}

/// An encoded header whose nonce can be rewritten without touching the rest
#[derive(Debug, Clone)]
pub struct HeaderBytes([u8; HEADER_SIZE]);

impl HeaderBytes {
    pub fn new(header: &BlockHeader) -> Self {
        Self(header.to_bytes())
    }

    #[inline]
    pub fn set_nonce(&mut self, nonce: u32) {
        LittleEndian::write_u32(&mut self.0[NONCE_OFFSET..], nonce);
    }

    pub fn nonce(&self) -> u32 {
        LittleEndian::read_u32(&self.0[NONCE_OFFSET..])
    }

    pub fn timestamp(&self) -> u32 {
        LittleEndian::read_u32(&self.0[TIMESTAMP_OFFSET..BITS_OFFSET])
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8; HEADER_SIZE] {
        &self.0
    }
}

impl From<&BlockHeader> for HeaderBytes {
    fn from(header: &BlockHeader) -> Self {
        Self::new(header)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> BlockHeader {
        BlockHeader::genesis(Hash256::new([0xab; 32]), 1231006505, 0x1d00ffff, 2083236893)
    }

    #[test]
    fn test_header_layout() {
        let bytes = sample().to_bytes();
        assert_eq!(bytes.len(), HEADER_SIZE);
        assert_eq!(&bytes[0..4], &[1, 0, 0, 0]);
        assert!(bytes[4..36].iter().all(|b| *b == 0));
        assert!(bytes[36..68].iter().all(|b| *b == 0xab));
        assert_eq!(&bytes[68..72], &1231006505u32.to_le_bytes());
        assert_eq!(&bytes[72..76], &[0xff, 0xff, 0x00, 0x1d]);
        assert_eq!(&bytes[76..80], &2083236893u32.to_le_bytes());
    }

    #[test]
    fn test_patching_nonce_matches_reencoding() {
        let header = sample();
        let mut patched = HeaderBytes::new(&header);
        patched.set_nonce(42);

        assert_eq!(patched.as_bytes(), &header.with_nonce(42).to_bytes());
        assert_eq!(patched.nonce(), 42);
        assert_eq!(patched.timestamp(), 1231006505);
    }

    #[test]
    fn test_with_timestamp() {
        let header = sample().with_timestamp(7);
        assert_eq!(header.timestamp, 7);
        assert_eq!(HeaderBytes::from(&header).timestamp(), 7);
    }
}
