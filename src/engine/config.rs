//! Runner configuration shared by the CLI, the isolation driver and module harnesses.
//!
//! The CLI builds a [`RunnerConfig`] from its flags; the parent process hands it to each module child through
//! environment variables, and the child's harness reads it back with [`RunnerConfig::from_env`].

use std::env;
use std::time::Duration;

use thiserror::Error;

/// Set by the runner when it spawns a module: the token of that module's event marker. Its presence switches the
/// harness to the event protocol.
pub const PROTOCOL_ENV: &str = "MINITEST_PROTOCOL";
/// Case display-name substring filter.
pub const FILTER_ENV: &str = "MINITEST_FILTER";
/// Per-case timeout in whole milliseconds.
pub const TIMEOUT_ENV: &str = "MINITEST_CASE_TIMEOUT_MS";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid {var} `{value}`: expected a whole number of milliseconds")]
    InvalidTimeout { var: &'static str, value: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Only cases whose display name contains this substring run.
    pub filter: Option<String>,
    /// Limit for asynchronous bodies and hooks. `None` means no limit.
    pub case_timeout: Option<Duration>,
}

impl RunnerConfig {
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn with_case_timeout(mut self, timeout: Duration) -> Self {
        self.case_timeout = Some(timeout);
        self
    }

    /// Read the configuration a parent runner exported.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let filter = lookup(FILTER_ENV).filter(|f| !f.is_empty());
        let case_timeout = match lookup(TIMEOUT_ENV).filter(|t| !t.trim().is_empty()) {
            None => None,
            Some(raw) => {
                let millis = raw
                    .trim()
                    .parse::<u64>()
                    .map_err(|_| ConfigError::InvalidTimeout {
                        var: TIMEOUT_ENV,
                        value: raw.clone(),
                    })?;
                Some(Duration::from_millis(millis))
            }
        };
        Ok(Self { filter, case_timeout })
    }

    /// Variables to export to a module child so its harness sees this configuration. The protocol token is set
    /// separately by the isolation driver.
    pub fn to_env(&self) -> Vec<(&'static str, String)> {
        let mut vars = Vec::new();
        if let Some(filter) = &self.filter {
            vars.push((FILTER_ENV, filter.clone()));
        }
        if let Some(timeout) = self.case_timeout {
            vars.push((TIMEOUT_ENV, timeout.as_millis().to_string()));
        }
        vars
    }

    pub fn selects(&self, display_name: &str) -> bool {
        self.filter.as_deref().is_none_or(|f| display_name.contains(f))
    }
}

/// The marker token, when the current process was spawned by the runner.
pub fn protocol_token() -> Option<String> {
    env::var(PROTOCOL_ENV).ok().filter(|token| !token.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_empty_environment_is_default() {
        assert_eq!(RunnerConfig::from_lookup(lookup(&[])).unwrap(), RunnerConfig::default());
    }

    #[test]
    fn test_env_round_trip() {
        let config = RunnerConfig::default()
            .with_filter("add")
            .with_case_timeout(Duration::from_millis(250));
        let exported = config.to_env();
        assert!(exported.iter().all(|(key, _)| *key != PROTOCOL_ENV));

        let pairs: Vec<(&str, &str)> = exported.iter().map(|(k, v)| (*k, v.as_str())).collect();
        assert_eq!(RunnerConfig::from_lookup(lookup(&pairs)).unwrap(), config);
    }

    #[test]
    fn test_rejects_malformed_timeout() {
        let err = RunnerConfig::from_lookup(lookup(&[(TIMEOUT_ENV, "soon")])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid MINITEST_CASE_TIMEOUT_MS `soon`: expected a whole number of milliseconds"
        );
    }

    #[test]
    fn test_filter_is_substring_match() {
        let config = RunnerConfig::default().with_filter("add(2");
        assert!(config.selects("add(2, 3, 5)"));
        assert!(!config.selects("subtract"));
        assert!(RunnerConfig::default().selects("anything"));
    }
}
