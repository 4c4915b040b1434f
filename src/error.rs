//! Error handling for the genesis miner
//!
//! Every failure the miner can hit is fatal: construction errors abort before
//! any hashing begins, search errors end the run. An unexpected public key
//! length is only a warning and is logged, not returned.

use thiserror::Error;

/// Result type alias for genesis mining operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the genesis miner
#[derive(Error, Debug)]
pub enum Error {
    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Configuration file loading errors
    #[error("Configuration file error: {0}")]
    ConfigFile(#[from] config::ConfigError),

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// A required operator input was empty or absent
    #[error("Missing required input: {field}")]
    MissingInput { field: String },

    /// A hex-encoded input could not be decoded
    #[error("Invalid hex in {field}: {message}")]
    InvalidHex { field: String, message: String },

    /// A coinbase script does not fit its single-byte length prefix
    #[error("Script too long: {length} bytes exceeds the {max} byte limit")]
    ScriptTooLong { length: usize, max: usize },

    /// Compact difficulty bits outside the supported encoding range
    #[error("Invalid compact bits 0x{bits:08x}: {reason}")]
    InvalidBits { bits: u32, reason: String },

    /// An underlying hash primitive could not be initialized or evaluated
    #[error("Hash primitive failure ({algorithm}): {message}")]
    HashPrimitive { algorithm: String, message: String },

    /// Worker pool errors
    #[error("Worker error: {message}")]
    Worker { message: String },

    /// The nonce x timestamp search space ran out
    #[error("Search space exhausted: {message}")]
    Exhausted { message: String },

    /// Cancellation of a running search
    #[error("Operation was cancelled: {operation}")]
    Cancelled { operation: String },
}

impl Error {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing input error
    pub fn missing_input(field: impl Into<String>) -> Self {
        Self::MissingInput {
            field: field.into(),
        }
    }

    /// Create an invalid hex error
    pub fn invalid_hex(field: impl Into<String>, message: impl ToString) -> Self {
        Self::InvalidHex {
            field: field.into(),
            message: message.to_string(),
        }
    }

    /// Create an invalid bits error
    pub fn invalid_bits(bits: u32, reason: impl Into<String>) -> Self {
        Self::InvalidBits {
            bits,
            reason: reason.into(),
        }
    }

    /// Create a hash primitive error
    pub fn hash_primitive(algorithm: impl ToString, message: impl ToString) -> Self {
        Self::HashPrimitive {
            algorithm: algorithm.to_string(),
            message: message.to_string(),
        }
    }

    /// Create a worker error
    pub fn worker(message: impl Into<String>) -> Self {
        Self::Worker {
            message: message.into(),
        }
    }

    /// Create a search-space exhaustion error
    pub fn exhausted(message: impl Into<String>) -> Self {
        Self::Exhausted {
            message: message.into(),
        }
    }

    /// Create a cancellation error
    pub fn cancelled(operation: impl Into<String>) -> Self {
        Self::Cancelled {
            operation: operation.into(),
        }
    }

    /// Whether the error stems from operator input rather than the machine
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Error::Config { .. }
                | Error::ConfigFile(_)
                | Error::MissingInput { .. }
                | Error::InvalidHex { .. }
                | Error::ScriptTooLong { .. }
                | Error::InvalidBits { .. }
        )
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            Error::Io(_) => "io",
            Error::Json(_) => "json",
            Error::Yaml(_) => "yaml",
            Error::ConfigFile(_) => "config_file",
            Error::Config { .. } => "config",
            Error::MissingInput { .. } => "missing_input",
            Error::InvalidHex { .. } => "invalid_hex",
            Error::ScriptTooLong { .. } => "script_too_long",
            Error::InvalidBits { .. } => "invalid_bits",
            Error::HashPrimitive { .. } => "hash_primitive",
            Error::Worker { .. } => "worker",
            Error::Exhausted { .. } => "exhausted",
            Error::Cancelled { .. } => "cancelled",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = Error::invalid_bits(0x0200ffff, "exponent below 3");
        assert_eq!(
            err.to_string(),
            "Invalid compact bits 0x0200ffff: exponent below 3"
        );

        let err = Error::ScriptTooLong { length: 300, max: 255 };
        assert_eq!(err.to_string(), "Script too long: 300 bytes exceeds the 255 byte limit");
    }

    #[test]
    fn test_user_error_classification() {
        assert!(Error::missing_input("psz").is_user_error());
        assert!(Error::invalid_hex("pubkey", "odd length").is_user_error());
        assert!(!Error::hash_primitive("scrypt", "bad params").is_user_error());
        assert!(!Error::cancelled("search").is_user_error());
    }

    #[test]
    fn test_category() {
        assert_eq!(Error::config("x").category(), "config");
        assert_eq!(Error::worker("x").category(), "worker");
        assert_eq!(Error::exhausted("x").category(), "exhausted");
    }
}
