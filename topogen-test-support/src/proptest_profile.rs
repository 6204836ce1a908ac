//! Property-test run profile shared by the topogen suites.
//!
//! Case counts and process forking can be overridden from the environment so
//! CI can run deeper sweeps than a local `cargo test`.

use std::env;

/// Environment variable controlling proptest case counts.
pub const PROGTEST_CASES_ENV_KEY: &str = "PROGTEST_CASES";
/// Environment variable controlling proptest process forking.
pub const TOPOGEN_PBT_FORK_ENV_KEY: &str = "TOPOGEN_PBT_FORK";

/// Runtime profile for property-test execution.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProptestRunProfile {
    cases: u32,
    fork: bool,
}

impl ProptestRunProfile {
    /// Loads a profile from the process environment, falling back to the
    /// supplied defaults for missing or malformed overrides.
    ///
    /// # Examples
    ///
    /// ```
    /// use topogen_test_support::proptest_profile::ProptestRunProfile;
    ///
    /// let profile = ProptestRunProfile::load(64, false);
    /// assert!(profile.cases() > 0);
    /// ```
    #[must_use]
    pub fn load(default_cases: u32, default_fork: bool) -> Self {
        Self::from_lookup(default_cases, default_fork, |key| env::var(key).ok())
    }

    /// Loads a profile through an arbitrary key lookup.
    ///
    /// # Examples
    ///
    /// ```
    /// use topogen_test_support::proptest_profile::ProptestRunProfile;
    ///
    /// let profile = ProptestRunProfile::from_lookup(64, false, |key| {
    ///     (key == "PROGTEST_CASES").then(|| "512".to_owned())
    /// });
    /// assert_eq!(profile.cases(), 512);
    /// assert!(!profile.fork());
    /// ```
    #[must_use]
    pub fn from_lookup<F>(default_cases: u32, default_fork: bool, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let cases = override_or(&lookup, PROGTEST_CASES_ENV_KEY, default_cases, parse_cases);
        let fork = override_or(&lookup, TOPOGEN_PBT_FORK_ENV_KEY, default_fork, parse_bool);
        Self { cases, fork }
    }

    /// Number of cases to run per property.
    #[must_use]
    pub fn cases(&self) -> u32 {
        self.cases
    }

    /// Whether to run proptest cases in forked subprocesses.
    #[must_use]
    pub fn fork(&self) -> bool {
        self.fork
    }
}

fn override_or<T, L, P>(lookup: &L, key: &'static str, default: T, parse: P) -> T
where
    L: Fn(&str) -> Option<String>,
    P: Fn(&str) -> Result<T, String>,
{
    let Some(raw) = lookup(key) else {
        return default;
    };
    parse(&raw).unwrap_or_else(|reason| {
        tracing::warn!(
            env = key,
            raw = %raw,
            reason = %reason,
            "ignoring invalid property-test override",
        );
        default
    })
}

fn parse_cases(raw: &str) -> Result<u32, String> {
    match raw.trim().parse::<u32>() {
        Ok(0) => Err("cases must be > 0".to_owned()),
        Ok(cases) => Ok(cases),
        Err(error) => Err(format!("parse error: {error}")),
    }
}

fn parse_bool(raw: &str) -> Result<bool, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err("expected one of: true/false/1/0/yes/no/on/off".to_owned()),
    }
}
