//! Per-batch boundary token source.
//!
//! Tokens combine an instance seed with a monotonic counter, so two batches
//! built concurrently never share a boundary and a seeded source reproduces
//! the exact payload in tests.

use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct BoundarySource {
    seed: String,
    counter: u32,
}

impl BoundarySource {
    /// A source seeded from a fresh random id.
    #[must_use]
    pub fn new() -> Self {
        Self::with_seed(Uuid::new_v4().simple().to_string())
    }

    /// A source with a fixed seed, for reproducible payloads.
    #[must_use]
    pub fn with_seed(seed: impl Into<String>) -> Self {
        Self {
            seed: seed.into(),
            counter: 0,
        }
    }

    /// Next unique token with the given prefix.
    pub fn next(&mut self, prefix: &str) -> String {
        self.counter += 1;
        format!("{prefix}_{}_{}", self.seed, self.counter)
    }
}

impl Default for BoundarySource {
    fn default() -> Self {
        Self::new()
    }
}
