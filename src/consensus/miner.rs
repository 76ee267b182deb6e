// Proof of work mining

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::core::{Block, HashedBlock, now_millis};

/// Count leading zero bits of a byte string
pub fn count_leading_zero_bits(data: &[u8]) -> u32 {
    let mut zeros = 0;
    for byte in data {
        if *byte == 0 {
            zeros += 8;
        } else {
            zeros += byte.leading_zeros();
            break;
        }
    }
    zeros
}

/// Outcome of a mining run. Cancellation is an expected outcome,
/// not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MineOutcome {
    Mined(HashedBlock),
    Cancelled,
    Exhausted,
}

/// Proof of work miner with a fixed difficulty
pub struct Miner {
    /// Required leading-zero-bit count. A hash matches only when its count
    /// is exactly this value; a luckier hash is not a solution.
    difficulty_bits: u32,
    /// Attempts per second, 0 for unthrottled
    max_hash_rate: u32,
}

impl Miner {
    pub fn new(difficulty_bits: u32, max_hash_rate: u32) -> Self {
        Self { difficulty_bits, max_hash_rate }
    }

    /// Mine a block candidate. Every attempt hashes the header with a fresh
    /// wall-clock timestamp, so the mined timestamp is the solution time.
    /// `max_attempts` bounds the search, `None` runs until solved or
    /// cancelled.
    pub fn mine(&self, block: &Block, cancel: &AtomicBool, max_attempts: Option<u64>) -> MineOutcome {
        let started = Instant::now();
        let mut attempts = 0u64;

        for nonce in 0u64.. {
            if cancel.load(Ordering::Relaxed) {
                log::debug!("mining of block #{} cancelled after {} attempts", block.id, attempts);
                return MineOutcome::Cancelled;
            }
            if let Some(max) = max_attempts
                && attempts >= max
            {
                return MineOutcome::Exhausted;
            }

            let timestamp = now_millis();
            let hash = block.hash_with(timestamp, nonce);
            attempts += 1;

            if count_leading_zero_bits(hash.as_bytes()) == self.difficulty_bits {
                let elapsed = started.elapsed();
                log::info!(
                    "mined block #{} after {} attempts ({:.1} KH/s)",
                    block.id,
                    attempts,
                    attempts as f64 / elapsed.as_secs_f64().max(f64::EPSILON) / 1000.0
                );
                return MineOutcome::Mined(block.clone().into_hashed(timestamp, nonce, hash));
            }

            if attempts % 100_000 == 0 {
                let elapsed = started.elapsed();
                log::debug!(
                    "mining block #{}: {} attempts ({:.1} KH/s)",
                    block.id,
                    attempts,
                    attempts as f64 / elapsed.as_secs_f64() / 1000.0
                );
            }

            if self.max_hash_rate > 0 {
                std::thread::sleep(Duration::from_millis(1000 / u64::from(self.max_hash_rate)));
            }
        }

        MineOutcome::Exhausted
    }
}
