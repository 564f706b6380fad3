//! Booking number generation.

use std::sync::atomic::{AtomicUsize, Ordering};

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Symbols used in booking numbers. Excludes I, O, 0 and 1.
pub const BOOKING_NUMBER_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

const PREFIX: &str = "BK-";
const SUFFIX_LEN: usize = 6;

/// Source of randomness for booking numbers.
///
/// Uniqueness is not guaranteed by the generator; the store's unique
/// constraint on booking numbers is what rejects a collision.
pub trait RandomSource: Send + Sync {
    /// Returns an index in `0..bound`.
    fn next_index(&self, bound: usize) -> usize;
}

/// Random source backed by the thread-local generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandomSource;

impl RandomSource for ThreadRandomSource {
    fn next_index(&self, bound: usize) -> usize {
        rand::thread_rng().gen_range(0..bound)
    }
}

/// Deterministic random source that replays a fixed sequence of indexes.
#[derive(Debug, Default)]
pub struct SequenceRandomSource {
    sequence: Vec<usize>,
    position: AtomicUsize,
}

impl SequenceRandomSource {
    /// Creates a source that cycles through `sequence`.
    pub fn new(sequence: Vec<usize>) -> Self {
        Self {
            sequence,
            position: AtomicUsize::new(0),
        }
    }
}

impl RandomSource for SequenceRandomSource {
    fn next_index(&self, bound: usize) -> usize {
        if self.sequence.is_empty() {
            return 0;
        }
        let i = self.position.fetch_add(1, Ordering::Relaxed);
        self.sequence[i % self.sequence.len()] % bound
    }
}

/// Human-readable booking reference in the form `BK-XXXXXX`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookingNumber(String);

impl BookingNumber {
    /// Generates a new booking number from the given random source.
    pub fn generate(rng: &dyn RandomSource) -> Self {
        let mut number = String::with_capacity(PREFIX.len() + SUFFIX_LEN);
        number.push_str(PREFIX);
        for _ in 0..SUFFIX_LEN {
            let idx = rng.next_index(BOOKING_NUMBER_ALPHABET.len());
            number.push(char::from(BOOKING_NUMBER_ALPHABET[idx]));
        }
        Self(number)
    }

    /// Wraps a stored booking number without validation.
    pub fn from_stored(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BookingNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
