//! Shared test utilities for `topogen-core`.

use rand::{SeedableRng, rngs::SmallRng};
use topogen_test_support::proptest_profile::ProptestRunProfile;
use proptest::test_runner::Config as ProptestConfig;

/// Builds a proptest configuration from the shared run profile.
///
/// Keeps every property suite on the same `PROGTEST_CASES` and
/// `TOPOGEN_PBT_FORK` interpretation.
#[must_use]
pub(crate) fn suite_proptest_config(default_cases: u32) -> ProptestConfig {
    let profile = ProptestRunProfile::load(default_cases, false);
    ProptestConfig {
        cases: profile.cases(),
        fork: profile.fork(),
        ..ProptestConfig::default()
    }
}

/// Deterministic random source for reproducible generator runs.
#[must_use]
pub(crate) fn seeded_rng(seed: u64) -> SmallRng {
    SmallRng::seed_from_u64(seed)
}
