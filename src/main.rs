//! Genesis Miner - Main Application
//!
//! Builds a genesis block from the configured parameters, searches for a
//! nonce meeting the target and prints the solved block.

use genesis_miner::{
    config::Config,
    crypto::{HashBackends, PowHasher},
    dispatcher::Dispatcher,
    genesis::GenesisBlock,
    report::GenesisReport,
    Error, Result, APP_NAME, APP_VERSION,
};
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> ExitCode {
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return exit_code(&e);
        }
    };

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.effective_log_level().as_directive()));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();

    if config.print_config {
        return match config.to_yaml() {
            Ok(yaml) => {
                println!("{}", yaml);
                ExitCode::SUCCESS
            }
            Err(e) => {
                error!(category = e.category(), "{}", e);
                exit_code(&e)
            }
        };
    }

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(category = e.category(), "{}", e);
            exit_code(&e)
        }
    }
}

/// Operator input errors exit with 2, like command line usage errors
fn exit_code(e: &Error) -> ExitCode {
    if e.is_user_error() {
        ExitCode::from(2)
    } else {
        ExitCode::FAILURE
    }
}

async fn run(config: Config) -> Result<()> {
    info!("Starting {} v{}", APP_NAME, APP_VERSION);

    let params = config.genesis_parameters()?;
    let hasher = PowHasher::resolve(params.algorithm, &HashBackends::default())?;
    let target = params.target()?;
    let block = GenesisBlock::build(&params)?;

    info!(
        algorithm = %params.algorithm,
        message = %params.message,
        coins = params.coins,
        timestamp = params.timestamp,
        nonce = params.nonce,
        bits = %format!("{:08x}", params.bits),
        merkle_root = %block.merkle_root(),
        "Genesis block template ready"
    );
    info!(threshold = %target, "Difficulty target");

    let dispatcher = Dispatcher::new(
        config.search_settings(),
        block,
        hasher.clone(),
        target.clone(),
    );
    let cancel = dispatcher.cancellation_token();

    let interrupt = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, stopping search");
                cancel.cancel();
            }
        }
    });

    let outcome = tokio::task::spawn_blocking(move || dispatcher.run())
        .await
        .map_err(|e| Error::worker(format!("search task failed: {}", e)));
    interrupt.abort();
    let result = outcome??;

    let report = GenesisReport::new(&params, &target, &hasher, &result)?;
    println!("{}", report.render(config.format)?);
    Ok(())
}
