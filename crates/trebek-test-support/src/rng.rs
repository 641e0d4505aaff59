//! Test RNG — deterministic `DeterministicRng` implementations for tests.

use trebek_core::rng::DeterministicRng;

/// An RNG that always returns `min`. With `next_index` this always picks the
/// first element, which makes buffer and hint selection FIFO-like in tests
/// that do not care about randomness.
#[derive(Debug)]
pub struct MockRng;

impl DeterministicRng for MockRng {
    fn next_u32_range(&mut self, min: u32, _max: u32) -> u32 {
        min
    }
}

/// An RNG that replays a predetermined sequence, clamped into the requested
/// range, and then repeats its last value. Used in tests that need specific
/// hint positions or buffer picks.
#[derive(Debug)]
pub struct SequenceRng {
    values: Vec<u32>,
    index: usize,
}

impl SequenceRng {
    /// Create a new `SequenceRng` with the given values.
    #[must_use]
    pub fn new(values: Vec<u32>) -> Self {
        Self { values, index: 0 }
    }
}

impl DeterministicRng for SequenceRng {
    fn next_u32_range(&mut self, min: u32, max: u32) -> u32 {
        let val = self
            .values
            .get(self.index)
            .or_else(|| self.values.last())
            .copied()
            .unwrap_or(min);
        self.index += 1;
        val.clamp(min, max)
    }
}
