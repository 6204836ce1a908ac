//! Support library for the topogen CLI binary.
//!
//! Re-exports the CLI module so doctests and tests can drive the generators
//! without spawning a subprocess.

pub mod cli;
pub mod logging;
