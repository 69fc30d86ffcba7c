use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

pub const DEFAULT_MAX_DEPTH: u32 = 10;
pub const DEFAULT_MONITOR_INTERVAL_MS: u64 = 1_000;
pub const DEFAULT_MONITOR_DURATION_MS: u64 = 60_000;

const MAX_DEPTH_ENV: &str = "GCPROBE_MAX_DEPTH";
const NODE_BUDGET_ENV: &str = "GCPROBE_NODE_BUDGET";
const MONITOR_INTERVAL_ENV: &str = "GCPROBE_MONITOR_INTERVAL_MS";
const MONITOR_DURATION_ENV: &str = "GCPROBE_MONITOR_DURATION_MS";

/// Tunables shared by the library and the CLI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeConfig {
    /// Depth bound for cycle searches.
    pub max_depth: u32,
    /// Upper bound on expanded nodes per cycle search. `None` means unbounded.
    pub node_budget: Option<u64>,
    pub monitor_interval: Duration,
    pub monitor_duration: Duration,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            node_budget: None,
            monitor_interval: Duration::from_millis(DEFAULT_MONITOR_INTERVAL_MS),
            monitor_duration: Duration::from_millis(DEFAULT_MONITOR_DURATION_MS),
        }
    }
}

impl ProbeConfig {
    /// Defaults overridden by `GCPROBE_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ProbeConfig::from_env`], reading values through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            max_depth: parse_or(&lookup, MAX_DEPTH_ENV, defaults.max_depth),
            node_budget: parse_optional(&lookup, NODE_BUDGET_ENV).or(defaults.node_budget),
            monitor_interval: Duration::from_millis(
                parse_optional::<u64>(&lookup, MONITOR_INTERVAL_ENV)
                    .filter(|&ms| {
                        if ms == 0 {
                            warn!(key = MONITOR_INTERVAL_ENV, "ignoring zero monitoring interval");
                        }
                        ms > 0
                    })
                    .unwrap_or(DEFAULT_MONITOR_INTERVAL_MS),
            ),
            monitor_duration: Duration::from_millis(parse_or(
                &lookup,
                MONITOR_DURATION_ENV,
                DEFAULT_MONITOR_DURATION_MS,
            )),
        }
    }
}

fn parse_optional<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "ignoring malformed configuration value");
            None
        }
    }
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    parse_optional(lookup, key).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn missing_variables_keep_defaults() {
        let config = ProbeConfig::from_lookup(lookup_from(&[]));
        assert_eq!(config, ProbeConfig::default());
        assert_eq!(config.max_depth, 10);
        assert_eq!(config.node_budget, None);
    }

    #[test]
    fn variables_override_defaults() {
        let config = ProbeConfig::from_lookup(lookup_from(&[
            ("GCPROBE_MAX_DEPTH", "4"),
            ("GCPROBE_NODE_BUDGET", "5000"),
            ("GCPROBE_MONITOR_INTERVAL_MS", "250"),
            ("GCPROBE_MONITOR_DURATION_MS", " 2000 "),
        ]));
        assert_eq!(config.max_depth, 4);
        assert_eq!(config.node_budget, Some(5000));
        assert_eq!(config.monitor_interval, Duration::from_millis(250));
        assert_eq!(config.monitor_duration, Duration::from_millis(2000));
    }

    #[test]
    fn malformed_values_fall_back() {
        let config = ProbeConfig::from_lookup(lookup_from(&[
            ("GCPROBE_MAX_DEPTH", "deep"),
            ("GCPROBE_NODE_BUDGET", "-1"),
        ]));
        assert_eq!(config.max_depth, DEFAULT_MAX_DEPTH);
        assert_eq!(config.node_budget, None);
    }

    #[test]
    fn zero_monitor_interval_keeps_default() {
        let config =
            ProbeConfig::from_lookup(lookup_from(&[("GCPROBE_MONITOR_INTERVAL_MS", "0")]));
        assert_eq!(
            config.monitor_interval,
            Duration::from_millis(DEFAULT_MONITOR_INTERVAL_MS)
        );
    }
}
