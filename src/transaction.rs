//! Coinbase transaction encoding
//!
//! A genesis coinbase has exactly one input and one output. Counts and
//! script lengths are written as single bytes, which is only valid because
//! both scripts are bounded by [`MAX_SCRIPT_LEN`].

use crate::crypto::double_sha256;
use crate::script::{self, MAX_SCRIPT_LEN};
use crate::types::Hash256;
use crate::{Error, Result};
use byteorder::{LittleEndian, WriteBytesExt};
use std::io::Write;

/// Input spending nothing: zero previous hash, index `0xFFFFFFFF`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoinbaseInput {
    pub prev_hash: Hash256,
    pub prev_index: u32,
    pub script: Vec<u8>,
    pub sequence: u32,
}

impl CoinbaseInput {
    /// Input carrying `script` with the fixed genesis outpoint and sequence
    pub fn new(script: Vec<u8>) -> Self {
        Self {
            prev_hash: Hash256::ZERO,
            prev_index: u32::MAX,
            script,
            sequence: u32::MAX,
        }
    }

    /// Encode as prev_hash(32) prev_index(4) script_len(1) script sequence(4)
    pub fn encode<W: Write>(&self, out: &mut W) -> Result<()> {
        out.write_all(self.prev_hash.as_bytes())?;
        out.write_u32::<LittleEndian>(self.prev_index)?;
        write_script(out, &self.script)?;
        out.write_u32::<LittleEndian>(self.sequence)?;
        Ok(())
    }
}

/// Output paying `value` base units to `script`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoinbaseOutput {
    pub value: u64,
    pub script: Vec<u8>,
}

impl CoinbaseOutput {
    pub fn new(value: u64, script: Vec<u8>) -> Self {
        Self { value, script }
    }

    /// Encode as value(8) script_len(1) script
    pub fn encode<W: Write>(&self, out: &mut W) -> Result<()> {
        out.write_u64::<LittleEndian>(self.value)?;
        write_script(out, &self.script)?;
        Ok(())
    }
}

/// The single transaction of a genesis block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoinbaseTransaction {
    pub version: u32,
    pub input: CoinbaseInput,
    pub output: CoinbaseOutput,
    pub lock_time: u32,
}

impl CoinbaseTransaction {
    pub const VERSION: u32 = 1;

    /// Build the coinbase for `message`, paying `coins` to `public_key`
    pub fn new(message: &[u8], coins: u64, public_key: &[u8]) -> Result<Self> {
        let input = CoinbaseInput::new(script::input_script(message)?);
        let output = CoinbaseOutput::new(coins, script::output_script(public_key)?);
        Ok(Self {
            version: Self::VERSION,
            input,
            output,
            lock_time: 0,
        })
    }

    /// Encode as version(4) 0x01 input 0x01 output lock_time(4)
    pub fn encode<W: Write>(&self, out: &mut W) -> Result<()> {
        out.write_u32::<LittleEndian>(self.version)?;
        out.write_u8(1)?;
        self.input.encode(out)?;
        out.write_u8(1)?;
        self.output.encode(out)?;
        out.write_u32::<LittleEndian>(self.lock_time)?;
        Ok(())
    }

    /// Serialized transaction bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(
            4 + 1 + 32 + 4 + 1 + self.input.script.len() + 4 + 1 + 8 + 1
                + self.output.script.len()
                + 4,
        );
        self.encode(&mut out)?;
        Ok(out)
    }

    /// Transaction id: double SHA256 of the serialization
    pub fn txid(&self) -> Result<Hash256> {
        Ok(double_sha256(&self.to_bytes()?))
    }
}

fn write_script<W: Write>(out: &mut W, script: &[u8]) -> Result<()> {
    if script.len() > MAX_SCRIPT_LEN {
        return Err(Error::ScriptTooLong {
            length: script.len(),
            max: MAX_SCRIPT_LEN,
        });
    }
    out.write_u8(script.len() as u8)?;
    out.write_all(script)?;
    Ok(())
}
