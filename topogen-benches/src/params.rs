//! Benchmark parameter types.

use std::fmt;

use thiserror::Error;
use topogen_core::Capacity;

/// Headroom applied to the expected link count of randomised generators.
const LINK_HEADROOM: usize = 2;

/// Errors raised while sizing a benchmark substrate.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BenchSetupError {
    /// The requested size overflows `usize`.
    #[error("benchmark with {nodes} nodes and degree {degree} overflows the link count")]
    Overflow {
        /// Requested node count.
        nodes: usize,
        /// Requested degree.
        degree: usize,
    },
}

/// Parameters for a generator benchmark run.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct GeneratorBenchParams {
    /// Nodes created by the generator.
    pub nodes: usize,
    /// Target degree, or mean degree for the randomised models.
    pub degree: usize,
}

impl GeneratorBenchParams {
    /// Substrate large enough for the run, with headroom on the links.
    ///
    /// # Errors
    /// Returns [`BenchSetupError::Overflow`] when the link count overflows.
    pub fn capacity(&self) -> Result<Capacity, BenchSetupError> {
        let links = self
            .nodes
            .checked_mul(self.degree)
            .and_then(|stubs| stubs.checked_mul(LINK_HEADROOM))
            .ok_or(BenchSetupError::Overflow {
                nodes: self.nodes,
                degree: self.degree,
            })?;
        Ok(Capacity::new(self.nodes, links, 2))
    }
}

impl fmt::Display for GeneratorBenchParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n={},d={}", self.nodes, self.degree)
    }
}
