//! Snowflake ID Generator
//!
//! Time-ordered 63-bit identifiers for users, posts, messages and
//! notifications. Layout: 41 bits of milliseconds since the configured
//! epoch, 10 bits of machine id, 12 bits of sequence.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;

/// Default epoch (2020-01-01T00:00:00.000Z)
pub const DEFAULT_EPOCH: u64 = 1_577_836_800_000;

const MACHINE_BITS: u64 = 10;
const SEQUENCE_BITS: u64 = 12;
const SEQUENCE_MASK: u64 = (1 << SEQUENCE_BITS) - 1;
const MACHINE_MASK: u64 = (1 << MACHINE_BITS) - 1;

/// Snowflake ID generator
pub struct SnowflakeGenerator {
    machine_id: u64,
    epoch: u64,
    /// Packed `(timestamp << SEQUENCE_BITS) | sequence` of the last issued id.
    state: AtomicU64,
}

impl SnowflakeGenerator {
    /// Create a new snowflake generator
    pub fn new(machine_id: u64, epoch: u64) -> Self {
        Self {
            machine_id: machine_id & MACHINE_MASK,
            epoch,
            state: AtomicU64::new(0),
        }
    }

    /// Generate a new snowflake ID
    pub fn generate(&self) -> i64 {
        let mut current = self.state.load(Ordering::Acquire);
        loop {
            let now = self.elapsed_millis();
            let last_ts = current >> SEQUENCE_BITS;
            let next = if now > last_ts {
                now << SEQUENCE_BITS
            } else if (current & SEQUENCE_MASK) < SEQUENCE_MASK {
                current + 1
            } else {
                // Sequence exhausted for this millisecond: borrow the next one.
                (last_ts + 1) << SEQUENCE_BITS
            };

            match self
                .state
                .compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => {
                    let timestamp = next >> SEQUENCE_BITS;
                    let sequence = next & SEQUENCE_MASK;
                    let id = (timestamp << (MACHINE_BITS + SEQUENCE_BITS))
                        | (self.machine_id << SEQUENCE_BITS)
                        | sequence;
                    return id as i64;
                }
                Err(observed) => current = observed,
            }
        }
    }

    /// Unix timestamp (ms) encoded in an id issued by this generator.
    pub fn timestamp_of(&self, snowflake: i64) -> u64 {
        ((snowflake as u64) >> (MACHINE_BITS + SEQUENCE_BITS)) + self.epoch
    }

    fn elapsed_millis(&self) -> u64 {
        (Utc::now().timestamp_millis() as u64).saturating_sub(self.epoch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generate_unique() {
        let gen = SnowflakeGenerator::new(1, DEFAULT_EPOCH);
        let ids: HashSet<i64> = (0..10_000).map(|_| gen.generate()).collect();
        assert_eq!(ids.len(), 10_000);
    }

    #[test]
    fn test_ids_are_increasing() {
        let gen = SnowflakeGenerator::new(3, DEFAULT_EPOCH);
        let first = gen.generate();
        let second = gen.generate();
        assert!(second > first);
        assert!(first > 0);
    }

    #[test]
    fn test_timestamp_of() {
        let gen = SnowflakeGenerator::new(1, DEFAULT_EPOCH);
        let before = Utc::now().timestamp_millis() as u64;
        let id = gen.generate();
        let ts = gen.timestamp_of(id);
        assert!(ts >= before);
        assert!(ts <= before + 1000);
    }

    #[test]
    fn test_machine_id_is_masked() {
        let gen = SnowflakeGenerator::new(MACHINE_MASK + 2, DEFAULT_EPOCH);
        let id = gen.generate() as u64;
        assert_eq!((id >> SEQUENCE_BITS) & MACHINE_MASK, 1);
    }
}
