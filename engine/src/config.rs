//! Engine configuration
//!
//! Values are loaded from:
//! 1. `.env` file in the current directory or parent directories (if present)
//! 2. System environment variables
//!
//! Command-line flags override both.
//!
//! ## Variables
//! - `ENGINE_LOCK_WINDOW_MINUTES`: how long after a match starts it may still be locked (default 60)
//! - `ENGINE_LEADERSHIP_POLICY`: `strict` or `auto-assign` (default strict)
//! - `ENGINE_MAX_CONCURRENCY`: participants locked in parallel per match (default 8)
//! - `ENGINE_COMMIT_RETRIES`: attempts on a ledger conflict before giving up (default 3)

use std::str::FromStr;

use chrono::Duration;

use crate::core::{LeadershipPolicy, PhaseRules};
use crate::error::{EngineError, EngineResult};

pub const LOCK_WINDOW_VAR: &str = "ENGINE_LOCK_WINDOW_MINUTES";
pub const LEADERSHIP_POLICY_VAR: &str = "ENGINE_LEADERSHIP_POLICY";
pub const MAX_CONCURRENCY_VAR: &str = "ENGINE_MAX_CONCURRENCY";
pub const COMMIT_RETRIES_VAR: &str = "ENGINE_COMMIT_RETRIES";

/// Longest lock window accepted, in minutes (one week)
pub const MAX_LOCK_WINDOW_MINUTES: i64 = 7 * 24 * 60;

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// A match is lockable from its start time until start + window
    pub lock_window: Duration,
    pub leadership_policy: LeadershipPolicy,
    pub max_concurrency: usize,
    pub commit_retries: u32,
    pub phase_rules: PhaseRules,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lock_window: Duration::minutes(60),
            leadership_policy: LeadershipPolicy::Strict,
            max_concurrency: 8,
            commit_retries: 3,
            phase_rules: PhaseRules::default(),
        }
    }
}

impl EngineConfig {
    /// Load from `.env` and the process environment, falling back to defaults
    pub fn from_env() -> EngineResult<Self> {
        let _ = dotenv::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset keys keep their default
    pub fn from_lookup<F>(lookup: F) -> EngineResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(minutes) = parse_var::<i64, _>(&lookup, LOCK_WINDOW_VAR)? {
            config.lock_window = lock_window_minutes(minutes)
                .map_err(|e| EngineError::config(format!("{LOCK_WINDOW_VAR}: {e}")))?;
        }
        if let Some(policy) = lookup(LEADERSHIP_POLICY_VAR) {
            config.leadership_policy = policy
                .trim()
                .parse()
                .map_err(|e: String| EngineError::config(format!("{LEADERSHIP_POLICY_VAR}: {e}")))?;
        }
        if let Some(limit) = parse_var::<usize, _>(&lookup, MAX_CONCURRENCY_VAR)? {
            config.max_concurrency = limit;
        }
        if let Some(retries) = parse_var::<u32, _>(&lookup, COMMIT_RETRIES_VAR)? {
            config.commit_retries = retries;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> EngineResult<()> {
        if self.max_concurrency == 0 {
            return Err(EngineError::config(format!("{MAX_CONCURRENCY_VAR} must be at least 1")));
        }
        if self.commit_retries == 0 {
            return Err(EngineError::config(format!("{COMMIT_RETRIES_VAR} must be at least 1")));
        }
        if self.lock_window <= Duration::zero() || self.lock_window > Duration::minutes(MAX_LOCK_WINDOW_MINUTES) {
            return Err(EngineError::config(format!(
                "lock window must be between 1 and {MAX_LOCK_WINDOW_MINUTES} minutes"
            )));
        }
        Ok(())
    }
}

/// Lock window from a minute count, rejecting values chrono cannot hold or
/// that leave the accepted range
pub fn lock_window_minutes(minutes: i64) -> Result<Duration, String> {
    if !(1..=MAX_LOCK_WINDOW_MINUTES).contains(&minutes) {
        return Err(format!("must be between 1 and {MAX_LOCK_WINDOW_MINUTES} minutes, got {minutes}"));
    }
    Duration::try_minutes(minutes).ok_or_else(|| format!("{minutes} minutes is out of range"))
}

fn parse_var<T, F>(lookup: &F, key: &str) -> EngineResult<Option<T>>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| EngineError::config(format!("{key}: invalid value '{raw}'"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = EngineConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.lock_window, Duration::minutes(60));
        assert_eq!(config.max_concurrency, 8);
        assert_eq!(config.commit_retries, 3);
        assert_eq!(config.leadership_policy, LeadershipPolicy::Strict);
    }

    #[test]
    fn test_overrides_from_environment() {
        let config = EngineConfig::from_lookup(lookup_from(&[
            (LOCK_WINDOW_VAR, "90"),
            (LEADERSHIP_POLICY_VAR, " auto-assign "),
            (MAX_CONCURRENCY_VAR, "2"),
            (COMMIT_RETRIES_VAR, "5"),
        ]))
        .unwrap();

        assert_eq!(config.lock_window, Duration::minutes(90));
        assert_eq!(config.leadership_policy, LeadershipPolicy::AutoAssign);
        assert_eq!(config.max_concurrency, 2);
        assert_eq!(config.commit_retries, 5);
    }

    #[test]
    fn test_invalid_values_rejected() {
        for pairs in [
            [(LOCK_WINDOW_VAR, "soon")],
            [(LOCK_WINDOW_VAR, "0")],
            [(LOCK_WINDOW_VAR, "9223372036854775807")],
            [(LOCK_WINDOW_VAR, "10081")],
            [(LEADERSHIP_POLICY_VAR, "lenient")],
            [(MAX_CONCURRENCY_VAR, "0")],
            [(COMMIT_RETRIES_VAR, "-1")],
        ] {
            let result = EngineConfig::from_lookup(lookup_from(&pairs));
            assert!(
                matches!(result, Err(EngineError::ConfigurationError { .. })),
                "expected configuration error for {:?}",
                pairs
            );
        }
    }

    #[test]
    fn test_lock_window_bounds() {
        assert_eq!(lock_window_minutes(1), Ok(Duration::minutes(1)));
        assert_eq!(lock_window_minutes(MAX_LOCK_WINDOW_MINUTES), Ok(Duration::days(7)));
        assert!(lock_window_minutes(i64::MAX).is_err());
        assert!(lock_window_minutes(i64::MIN).is_err());

        let too_long = EngineConfig { lock_window: Duration::days(8), ..EngineConfig::default() };
        assert!(matches!(too_long.validate(), Err(EngineError::ConfigurationError { .. })));
    }
}
