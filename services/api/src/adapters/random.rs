//! services/api/src/adapters/random.rs
//!
//! The production `RandomSource`, backed by the thread-local generator from `rand`.

use rand::Rng;
use referral_rewards_core::ports::RandomSource;

#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next_in_range(&self, low: u32, high: u32) -> u32 {
        if low >= high {
            return low;
        }
        rand::thread_rng().gen_range(low..high)
    }
}
