//! Configuration management for the genesis miner
//!
//! Options come from the command line, `GENESIS_*` environment variables and
//! an optional configuration file (YAML, JSON or TOML). A value given on the
//! command line or in the environment wins; otherwise the file's value is
//! used; otherwise the built-in default, which reproduces the Bitcoin
//! genesis block.

use crate::crypto::Algorithm;
use crate::dispatcher::SearchSettings;
use crate::genesis::GenesisParameters;
use crate::report::OutputFormat;
use crate::script::decode_public_key;
use crate::utils::parse_compact_bits;
use crate::worker::DEFAULT_CHUNK_SIZE;
use crate::{Error, Result};
use clap::parser::ValueSource;
use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_MESSAGE: &str =
    "The Times 03/Jan/2009 Chancellor on brink of second bailout for banks";
pub const DEFAULT_PUBKEY: &str = "04678afdb0fe5548271967f1a67130b7105cd6a828e03909a67962e0ea1f61deb649f6bc3f4cef38c4f35504e51ec112de5c384df7ba0b8d578a4c702b6bf11d5f";

/// Log levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Directive understood by `tracing_subscriber::EnvFilter`
    pub fn as_directive(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Complete configuration for the genesis miner
#[derive(Debug, Clone, Parser, Serialize)]
#[command(
    name = "genesis-miner",
    version = env!("CARGO_PKG_VERSION"),
    about = "Genesis block builder and proof-of-work search",
    long_about = "Builds the genesis block of a Bitcoin-derived chain and searches the nonce and timestamp space for a header meeting the target"
)]
pub struct Config {
    /// Print the effective configuration as YAML and exit
    #[arg(long)]
    #[serde(skip)]
    pub print_config: bool,

    /// Configuration file (YAML, JSON or TOML)
    #[arg(long, value_name = "FILE", env = "GENESIS_CONFIG_FILE")]
    pub config_file: Option<PathBuf>,

    /// Proof-of-work algorithm; x11 and quark need a linked hash backend
    #[arg(short = 'a', long, value_enum, default_value = "sha256", env = "GENESIS_ALGO")]
    pub algo: Algorithm,

    /// Timestamp message embedded in the coinbase
    #[arg(long, visible_alias = "message", default_value = DEFAULT_MESSAGE, env = "GENESIS_PSZ")]
    pub psz: String,

    /// Block reward in base units
    #[arg(long, default_value_t = 50 * 100_000_000, env = "GENESIS_COINS")]
    pub coins: u64,

    /// Hex public key receiving the reward
    #[arg(long, default_value = DEFAULT_PUBKEY, env = "GENESIS_PUBKEY")]
    pub pubkey: String,

    /// Starting header timestamp (Unix seconds)
    #[arg(long, default_value_t = 1231006505, env = "GENESIS_TIMESTAMP")]
    pub timestamp: u32,

    /// Starting nonce
    #[arg(long, default_value_t = 2083236893, env = "GENESIS_NONCE")]
    pub nonce: u32,

    /// Compact difficulty bits in hex
    #[arg(long, default_value = "1d00ffff", env = "GENESIS_BITS")]
    pub bits: String,

    /// Number of search threads, 0 for one per logical CPU
    #[arg(short = 't', long, default_value_t = 4, env = "GENESIS_THREADS")]
    pub threads: usize,

    /// Nonces handed to a worker per job
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE, env = "GENESIS_CHUNK_SIZE")]
    pub chunk_size: u64,

    /// Seconds between progress log lines, 0 disables them
    #[arg(long, default_value_t = 10, env = "GENESIS_PROGRESS_INTERVAL")]
    pub progress_interval: u64,

    /// Log level
    #[arg(short = 'l', long, value_enum, default_value = "info", env = "GENESIS_LOG_LEVEL")]
    pub log_level: LogLevel,

    /// Shorthand for --log-level debug
    #[arg(short = 'v', long, env = "GENESIS_VERBOSE")]
    pub verbose: bool,

    /// Report format
    #[arg(short = 'f', long, value_enum, default_value = "text", env = "GENESIS_FORMAT")]
    pub format: OutputFormat,
}

/// Values read from a configuration file, every one optional
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    algo: Option<String>,
    #[serde(alias = "message")]
    psz: Option<String>,
    coins: Option<u64>,
    pubkey: Option<String>,
    timestamp: Option<u32>,
    nonce: Option<u32>,
    bits: Option<String>,
    threads: Option<usize>,
    chunk_size: Option<u64>,
    progress_interval: Option<u64>,
    log_level: Option<String>,
    verbose: Option<bool>,
    format: Option<String>,
}

impl FileConfig {
    fn load(path: &Path) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path))
            .build()?;
        Ok(settings.try_deserialize()?)
    }
}

impl Config {
    /// Load configuration from the process arguments and environment
    ///
    /// Exits the process on `--help`, `--version` and argument errors, like
    /// any clap program.
    pub fn load() -> Result<Self> {
        let matches = Self::command().get_matches();
        Self::from_matches(&matches)
    }

    /// Load configuration from explicit arguments, the first being the program name
    pub fn try_load_from<I, T>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = Self::command()
            .try_get_matches_from(args)
            .map_err(|e| Error::config(e.to_string()))?;
        Self::from_matches(&matches)
    }

    fn from_matches(matches: &ArgMatches) -> Result<Self> {
        let mut config =
            Self::from_arg_matches(matches).map_err(|e| Error::config(e.to_string()))?;

        if let Some(path) = config.config_file.clone() {
            let file = FileConfig::load(&path)?;
            config.merge_with_file(file, matches)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Apply file values to every option not set explicitly
    fn merge_with_file(&mut self, file: FileConfig, matches: &ArgMatches) -> Result<()> {
        let explicit = |id: &str| {
            matches!(
                matches.value_source(id),
                Some(ValueSource::CommandLine) | Some(ValueSource::EnvVariable)
            )
        };

        if let Some(algo) = file.algo.filter(|_| !explicit("algo")) {
            self.algo = Algorithm::from_str(&algo, true)
                .map_err(|e| Error::config(format!("Invalid algo in config file: {}", e)))?;
        }
        if let Some(psz) = file.psz.filter(|_| !explicit("psz")) {
            self.psz = psz;
        }
        if let Some(coins) = file.coins.filter(|_| !explicit("coins")) {
            self.coins = coins;
        }
        if let Some(pubkey) = file.pubkey.filter(|_| !explicit("pubkey")) {
            self.pubkey = pubkey;
        }
        if let Some(timestamp) = file.timestamp.filter(|_| !explicit("timestamp")) {
            self.timestamp = timestamp;
        }
        if let Some(nonce) = file.nonce.filter(|_| !explicit("nonce")) {
            self.nonce = nonce;
        }
        if let Some(bits) = file.bits.filter(|_| !explicit("bits")) {
            self.bits = bits;
        }
        if let Some(threads) = file.threads.filter(|_| !explicit("threads")) {
            self.threads = threads;
        }
        if let Some(chunk_size) = file.chunk_size.filter(|_| !explicit("chunk_size")) {
            self.chunk_size = chunk_size;
        }
        if let Some(interval) = file
            .progress_interval
            .filter(|_| !explicit("progress_interval"))
        {
            self.progress_interval = interval;
        }
        if let Some(level) = file.log_level.filter(|_| !explicit("log_level")) {
            self.log_level = LogLevel::from_str(&level, true)
                .map_err(|e| Error::config(format!("Invalid log_level in config file: {}", e)))?;
        }
        if let Some(verbose) = file.verbose.filter(|_| !explicit("verbose")) {
            self.verbose = verbose;
        }
        if let Some(format) = file.format.filter(|_| !explicit("format")) {
            self.format = OutputFormat::from_str(&format, true)
                .map_err(|e| Error::config(format!("Invalid format in config file: {}", e)))?;
        }
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.psz.is_empty() {
            return Err(Error::missing_input("psz"));
        }

        if self.chunk_size == 0 {
            return Err(Error::config("Chunk size must be greater than 0"));
        }

        Ok(())
    }

    /// Log level after applying `--verbose`
    pub fn effective_log_level(&self) -> LogLevel {
        if self.verbose && !matches!(self.log_level, LogLevel::Trace) {
            LogLevel::Debug
        } else {
            self.log_level
        }
    }

    /// Number of worker threads, resolving 0 to the logical CPU count
    pub fn worker_count(&self) -> usize {
        if self.threads == 0 {
            num_cpus::get()
        } else {
            self.threads
        }
    }

    /// Immutable genesis parameters, decoding the hex inputs
    pub fn genesis_parameters(&self) -> Result<GenesisParameters> {
        if self.psz.is_empty() {
            return Err(Error::missing_input("psz"));
        }

        Ok(GenesisParameters {
            algorithm: self.algo,
            message: self.psz.clone(),
            coins: self.coins,
            public_key: decode_public_key(&self.pubkey)?,
            timestamp: self.timestamp,
            nonce: self.nonce,
            bits: parse_compact_bits(&self.bits)?,
        })
    }

    /// Pool sizing and progress cadence
    pub fn search_settings(&self) -> SearchSettings {
        SearchSettings {
            workers: self.worker_count(),
            chunk_size: self.chunk_size,
            progress_interval: Duration::from_secs(self.progress_interval),
        }
    }

    /// Effective configuration as YAML
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::io::Write;
    use tempfile::Builder;

    fn yaml_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = Builder::new().suffix(".yaml").tempfile().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::try_load_from(["genesis-miner"]).unwrap();

        assert_eq!(config.algo, Algorithm::Sha256);
        assert_eq!(config.psz, DEFAULT_MESSAGE);
        assert_eq!(config.coins, 5_000_000_000);
        assert_eq!(config.timestamp, 1231006505);
        assert_eq!(config.nonce, 2083236893);
        assert_eq!(config.bits, "1d00ffff");
        assert_eq!(config.threads, 4);
        assert_eq!(config.chunk_size, 1_024_000);
        assert_eq!(config.log_level, LogLevel::Info);
        assert_eq!(config.format, OutputFormat::Text);
    }

    #[test]
    fn test_aliases_and_overrides() {
        let config = Config::try_load_from([
            "genesis-miner",
            "--algo",
            "multi-round-11",
            "--message",
            "hello",
            "--bits",
            "0x1e0ffff0",
            "--threads",
            "0",
            "-v",
        ])
        .unwrap();

        assert_eq!(config.algo, Algorithm::X11);
        assert_eq!(config.psz, "hello");
        assert_eq!(config.worker_count(), num_cpus::get());
        assert_eq!(config.effective_log_level(), LogLevel::Debug);
        assert_eq!(config.genesis_parameters().unwrap().bits, 0x1e0ffff0);
    }

    #[test]
    fn test_validation() {
        assert_matches!(
            Config::try_load_from(["genesis-miner", "--psz", ""]),
            Err(Error::MissingInput { .. })
        );
        assert_matches!(
            Config::try_load_from(["genesis-miner", "--chunk-size", "0"]),
            Err(Error::Config { .. })
        );
        assert_matches!(
            Config::try_load_from(["genesis-miner", "--algo", "blake"]),
            Err(Error::Config { .. })
        );
    }

    #[test]
    fn test_genesis_parameters_decode_errors() {
        let config = Config::try_load_from(["genesis-miner", "--pubkey", "04zz"]).unwrap();
        assert_matches!(config.genesis_parameters(), Err(Error::InvalidHex { .. }));

        let config = Config::try_load_from(["genesis-miner", "--bits", "nothex"]).unwrap();
        assert_matches!(config.genesis_parameters(), Err(Error::InvalidHex { .. }));
    }

    #[test]
    fn test_empty_hex_inputs() {
        let config = Config::try_load_from(["genesis-miner", "--pubkey", ""]).unwrap();
        assert!(config.genesis_parameters().unwrap().public_key.is_empty());

        let config = Config::try_load_from(["genesis-miner", "--bits", ""]).unwrap();
        assert_matches!(config.genesis_parameters(), Err(Error::InvalidHex { .. }));
    }

    #[test]
    fn test_algo_help_names_backend_requirement() {
        let command = Config::command();
        let algo = command
            .get_arguments()
            .find(|arg| arg.get_id() == "algo")
            .unwrap();
        let help = algo.get_help().unwrap().to_string();

        assert!(help.contains("x11 and quark need a linked hash backend"));
    }

    #[test]
    fn test_search_settings() {
        let config = Config::try_load_from([
            "genesis-miner",
            "--threads",
            "2",
            "--chunk-size",
            "500",
            "--progress-interval",
            "0",
        ])
        .unwrap();
        let settings = config.search_settings();

        assert_eq!(settings.workers, 2);
        assert_eq!(settings.chunk_size, 500);
        assert!(settings.progress_interval.is_zero());
    }

    #[test]
    fn test_config_file_fills_unset_options() {
        let file = yaml_file(
            r#"
algo: scrypt
message: "NY Times 05/Oct/2011"
coins: 8800000000
bits: "1e0ffff0"
threads: 8
format: json
"#,
        );
        let path = file.path().to_str().unwrap();
        let config =
            Config::try_load_from(["genesis-miner", "--config-file", path, "--coins", "1"]).unwrap();

        assert_eq!(config.algo, Algorithm::Scrypt);
        assert_eq!(config.psz, "NY Times 05/Oct/2011");
        assert_eq!(config.coins, 1);
        assert_eq!(config.bits, "1e0ffff0");
        assert_eq!(config.threads, 8);
        assert_eq!(config.format, OutputFormat::Json);
        assert_eq!(config.timestamp, 1231006505);
    }

    #[test]
    fn test_config_file_invalid_values() {
        let file = yaml_file("algo: blake\n");
        let path = file.path().to_str().unwrap();
        assert_matches!(
            Config::try_load_from(["genesis-miner", "--config-file", path]),
            Err(Error::Config { .. })
        );

        assert_matches!(
            Config::try_load_from(["genesis-miner", "--config-file", "/nonexistent/genesis.yaml"]),
            Err(Error::ConfigFile(_))
        );
    }

    #[test]
    fn test_print_config_yaml() {
        let config = Config::try_load_from(["genesis-miner", "--algo", "quark"]).unwrap();
        let yaml = config.to_yaml().unwrap();

        assert!(yaml.contains("algo: quark"));
        assert!(yaml.contains("bits: 1d00ffff") || yaml.contains("bits: '1d00ffff'"));
        assert!(!yaml.contains("print_config"));
    }
}
