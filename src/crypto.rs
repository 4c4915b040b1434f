//! Hash algorithms for genesis mining
//!
//! The algorithm is chosen once at startup and resolved into a [`PowHasher`],
//! which every worker clones. SHA256d and scrypt are built in. The chained
//! multi-round families (X11, Quark) are reached through [`ChainedHash`]
//! implementations handed over in [`HashBackends`].

use crate::types::Hash256;
use crate::{Error, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::Arc;

/// Proof-of-work algorithm selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    /// SHA256(SHA256(x))
    #[value(alias = "sha256-double")]
    Sha256,
    /// scrypt with N=1024, r=1, p=1
    Scrypt,
    /// Eleven chained hash rounds
    #[value(alias = "multi-round-11")]
    X11,
    /// Quark chained hash
    #[value(alias = "multi-round-quark")]
    Quark,
}

impl Algorithm {
    /// Whether the chain identifies blocks by SHA256d regardless of the PoW hash
    pub fn uses_sha256_block_id(&self) -> bool {
        matches!(self, Algorithm::Sha256 | Algorithm::Scrypt)
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Algorithm::Sha256 => write!(f, "sha256"),
            Algorithm::Scrypt => write!(f, "scrypt"),
            Algorithm::X11 => write!(f, "x11"),
            Algorithm::Quark => write!(f, "quark"),
        }
    }
}

/// Single SHA256
#[inline]
pub fn sha256(data: &[u8]) -> Hash256 {
    Hash256::new(Sha256::digest(data).into())
}

/// Double SHA256: SHA256(SHA256(data))
#[inline]
pub fn double_sha256(data: &[u8]) -> Hash256 {
    let first = Sha256::digest(data);
    Hash256::new(Sha256::digest(first).into())
}

/// scrypt cost parameters used by scrypt chains: N = 2^10, r = 1, p = 1
pub const SCRYPT_LOG_N: u8 = 10;
pub const SCRYPT_R: u32 = 1;
pub const SCRYPT_P: u32 = 1;

/// An opaque multi-round hash primitive
///
/// Implementations must be pure: the same input always yields the same digest.
pub trait ChainedHash: Send + Sync {
    /// Compute the 32-byte digest of `data`
    fn hash(&self, data: &[u8]) -> Hash256;
}

impl<F> ChainedHash for F
where
    F: Fn(&[u8]) -> Hash256 + Send + Sync,
{
    fn hash(&self, data: &[u8]) -> Hash256 {
        self(data)
    }
}

/// Implementations of the chained hash families available to this process
#[derive(Clone, Default)]
pub struct HashBackends {
    x11: Option<Arc<dyn ChainedHash>>,
    quark: Option<Arc<dyn ChainedHash>>,
}

impl HashBackends {
    /// No chained primitives
    pub fn new() -> Self {
        Self::default()
    }

    /// Provide the X11 primitive
    pub fn with_x11(mut self, primitive: Arc<dyn ChainedHash>) -> Self {
        self.x11 = Some(primitive);
        self
    }

    /// Provide the Quark primitive
    pub fn with_quark(mut self, primitive: Arc<dyn ChainedHash>) -> Self {
        self.quark = Some(primitive);
        self
    }

    fn get(&self, algorithm: Algorithm) -> Option<Arc<dyn ChainedHash>> {
        match algorithm {
            Algorithm::X11 => self.x11.clone(),
            Algorithm::Quark => self.quark.clone(),
            Algorithm::Sha256 | Algorithm::Scrypt => None,
        }
    }
}

impl fmt::Debug for HashBackends {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashBackends")
            .field("x11", &self.x11.is_some())
            .field("quark", &self.quark.is_some())
            .finish()
    }
}

/// A resolved proof-of-work hash strategy
#[derive(Clone)]
pub enum PowHasher {
    DoubleSha256,
    Scrypt(scrypt::Params),
    Chained {
        algorithm: Algorithm,
        primitive: Arc<dyn ChainedHash>,
    },
}

impl PowHasher {
    /// Resolve an algorithm selector into a hasher
    ///
    /// Fails with [`Error::HashPrimitive`] when scrypt parameters are rejected or
    /// a chained family has no implementation in `backends`.
    pub fn resolve(algorithm: Algorithm, backends: &HashBackends) -> Result<Self> {
        match algorithm {
            Algorithm::Sha256 => Ok(PowHasher::DoubleSha256),
            Algorithm::Scrypt => {
                let params = scrypt::Params::new(SCRYPT_LOG_N, SCRYPT_R, SCRYPT_P, Hash256::SIZE)
                    .map_err(|e| Error::hash_primitive(algorithm, e))?;
                Ok(PowHasher::Scrypt(params))
            }
            Algorithm::X11 | Algorithm::Quark => {
                let primitive = backends.get(algorithm).ok_or_else(|| {
                    Error::hash_primitive(
                        algorithm,
                        "no implementation linked into this build",
                    )
                })?;
                Ok(PowHasher::Chained {
                    algorithm,
                    primitive,
                })
            }
        }
    }

    /// The selector this hasher was resolved from
    pub fn algorithm(&self) -> Algorithm {
        match self {
            PowHasher::DoubleSha256 => Algorithm::Sha256,
            PowHasher::Scrypt(_) => Algorithm::Scrypt,
            PowHasher::Chained { algorithm, .. } => *algorithm,
        }
    }

    /// Hash compared against the difficulty target
    #[inline]
    pub fn pow_hash(&self, data: &[u8]) -> Result<Hash256> {
        match self {
            PowHasher::DoubleSha256 => Ok(double_sha256(data)),
            PowHasher::Scrypt(params) => {
                let mut out = [0u8; 32];
                scrypt::scrypt(data, data, params, &mut out)
                    .map_err(|e| Error::hash_primitive(Algorithm::Scrypt, e))?;
                Ok(Hash256::new(out))
            }
            PowHasher::Chained { primitive, .. } => Ok(primitive.hash(data)),
        }
    }

    /// Hash the chain uses to identify the block
    pub fn block_hash(&self, data: &[u8]) -> Result<Hash256> {
        if self.algorithm().uses_sha256_block_id() {
            Ok(double_sha256(data))
        } else {
            self.pow_hash(data)
        }
    }
}

impl fmt::Debug for PowHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PowHasher({})", self.algorithm())
    }
}
