//! Dispatcher behaviour with planted solutions
//!
//! A fake chained hash reads the nonce and timestamp back out of the header
//! and returns an all-zero digest only for chosen pairs, so every test knows
//! exactly which headers meet the target.

use assert_matches::assert_matches;
use byteorder::{ByteOrder, LittleEndian};
use genesis_miner::crypto::{Algorithm, HashBackends, PowHasher};
use genesis_miner::dispatcher::{Dispatcher, SearchSettings};
use genesis_miner::genesis::{GenesisBlock, GenesisParameters};
use genesis_miner::target::DifficultyTarget;
use genesis_miner::{Error, Hash256};
use std::collections::HashSet;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const START_TIMESTAMP: u32 = 1_500_000_000;

fn template(nonce: u32, timestamp: u32) -> GenesisBlock {
    GenesisBlock::build(&GenesisParameters {
        algorithm: Algorithm::X11,
        message: "planted".to_string(),
        coins: 1,
        public_key: vec![0x02; 33],
        timestamp,
        nonce,
        bits: 0x1e0ffff0,
    })
    .unwrap()
}

/// Hasher accepting exactly the `(timestamp, nonce)` pairs in `winners`
fn planted(winners: &[(u32, u32)]) -> PowHasher {
    let winners: HashSet<(u32, u32)> = winners.iter().copied().collect();
    let backends = HashBackends::new().with_x11(Arc::new(move |data: &[u8]| {
        let timestamp = LittleEndian::read_u32(&data[68..72]);
        let nonce = LittleEndian::read_u32(&data[76..80]);
        if winners.contains(&(timestamp, nonce)) {
            Hash256::ZERO
        } else {
            Hash256::new([0xff; 32])
        }
    }));
    PowHasher::resolve(Algorithm::X11, &backends).unwrap()
}

fn settings(workers: usize, chunk_size: u64) -> SearchSettings {
    SearchSettings {
        workers,
        chunk_size,
        progress_interval: Duration::ZERO,
    }
}

fn target() -> DifficultyTarget {
    DifficultyTarget::from_compact(0x1e0ffff0).unwrap()
}

#[test]
fn finds_single_planted_solution() {
    let hasher = planted(&[(START_TIMESTAMP, 4_321)]);
    let dispatcher = Dispatcher::new(
        settings(3, 500),
        template(0, START_TIMESTAMP),
        hasher,
        target(),
    );

    let result = dispatcher.run().unwrap();

    assert_eq!(result.solution.nonce, 4_321);
    assert_eq!(result.solution.timestamp, START_TIMESTAMP);
    assert_eq!(result.solution.block.header().nonce, 4_321);
    assert!(result.solution.pow_hash.is_zero());
    // At least the winning job's nonces 4_000..=4_321
    assert!(result.stats.total_hashes >= 322);
    assert!(result.jobs_issued >= 9);
}

#[test]
fn nonce_wrap_advances_timestamp_once() {
    // Nothing meets the target at the starting timestamp
    let hasher = planted(&[(START_TIMESTAMP + 1, 10)]);
    let dispatcher = Dispatcher::new(
        settings(2, 0x400),
        template(0xFFFF_F000, START_TIMESTAMP),
        hasher,
        target(),
    );

    let result = dispatcher.run().unwrap();

    assert_eq!(result.solution.timestamp, START_TIMESTAMP + 1);
    assert_eq!(result.solution.nonce, 10);
    assert_eq!(result.solution.block.header().timestamp, START_TIMESTAMP + 1);
    assert!(result.jobs_issued >= 5);
    assert!(result.stats.total_hashes >= 11);
}

#[test]
fn any_worker_may_win() {
    let planted_nonces = [5_000u32, 12_000, 27_000];
    let winners: Vec<(u32, u32)> = planted_nonces
        .iter()
        .map(|nonce| (START_TIMESTAMP, *nonce))
        .collect();

    for _ in 0..5 {
        let dispatcher = Dispatcher::new(
            settings(4, 1_000),
            template(0, START_TIMESTAMP),
            planted(&winners),
            target(),
        );
        let result = dispatcher.run().unwrap();

        assert!(planted_nonces.contains(&result.solution.nonce));
        assert!(target().is_met_by(&result.solution.pow_hash));
        assert!(result.stats.solutions_found >= 1);
    }
}

#[test]
fn cancelled_before_start() {
    let dispatcher = Dispatcher::new(
        settings(2, 1_000),
        template(0, START_TIMESTAMP),
        planted(&[]),
        target(),
    );
    dispatcher.cancellation_token().cancel();

    assert_matches!(dispatcher.run(), Err(Error::Cancelled { .. }));
}

#[test]
fn cancelled_while_running() {
    let dispatcher = Dispatcher::new(
        settings(2, 10_000),
        template(0, START_TIMESTAMP),
        planted(&[]),
        target(),
    );
    let cancel = dispatcher.cancellation_token();
    let stats = dispatcher.stats();

    let canceller = thread::spawn(move || {
        thread::sleep(Duration::from_millis(200));
        cancel.cancel();
    });

    assert_matches!(dispatcher.run(), Err(Error::Cancelled { .. }));
    canceller.join().unwrap();
    assert!(stats.total_hashes() > 0);
}

#[test]
fn timestamp_overflow_exhausts_search() {
    let dispatcher = Dispatcher::new(
        settings(2, 0x40),
        template(0xFFFF_FF00, u32::MAX),
        planted(&[]),
        target(),
    );

    assert_matches!(dispatcher.run(), Err(Error::Exhausted { .. }));
}
