//! Environment lookup helpers for service configuration
//!
//! Services read their environment exactly once, into a config struct, by
//! passing a lookup function here. Tests pass a map instead of touching the
//! process environment.

use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

/// Source of configuration values
pub trait Lookup {
    fn get(&self, key: &str) -> Option<String>;
}

/// The process environment
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnv;

impl Lookup for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl Lookup for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

impl Lookup for HashMap<&str, &str> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).map(|v| v.to_string())
    }
}

/// Non-empty value of `key`, or `default`
pub fn string_or(env: &impl Lookup, key: &str, default: &str) -> String {
    env.get(key)
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Parsed value of `key`, or `default` when unset or unparsable
pub fn parse_or<T: FromStr>(env: &impl Lookup, key: &str, default: T) -> T {
    env.get(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Duration value of `key`, or `default` when unset or unparsable
///
/// Accepts humantime syntax (`500ms`, `1m30s`, `2h 15min`) and bare seconds.
pub fn duration_or(env: &impl Lookup, key: &str, default: Duration) -> Duration {
    let Some(value) = env.get(key) else {
        return default;
    };
    let value = value.trim();

    match humantime::parse_duration(value) {
        Ok(duration) => duration,
        Err(e) => match value.parse::<u64>() {
            Ok(secs) => Duration::from_secs(secs),
            Err(_) => {
                warn!(key, value, error = %e, "Invalid duration, using default");
                default
            }
        },
    }
}

/// Boolean value of `key`, or `default` when unset or unrecognised
///
/// `true`/`1`/`yes`/`on` and `false`/`0`/`no`/`off`, in any case.
pub fn flag_or(env: &impl Lookup, key: &str, default: bool) -> bool {
    let Some(value) = env.get(key) else {
        return default;
    };

    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => true,
        "false" | "0" | "no" | "off" => false,
        "" => default,
        _ => {
            warn!(key, value = %value, default, "Invalid boolean, using default");
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_or() {
        let env: HashMap<&str, &str> = [
            ("LIFETIME", "1m30s"),
            ("SPACED", "2h 15min"),
            ("MILLIS", "500ms"),
            ("BARE", "10"),
            ("ZERO", "0"),
            ("BAD", "fast"),
        ]
        .into_iter()
        .collect();
        let default = Duration::from_secs(5);

        assert_eq!(duration_or(&env, "LIFETIME", default), Duration::from_secs(90));
        assert_eq!(duration_or(&env, "SPACED", default), Duration::from_secs(8100));
        assert_eq!(duration_or(&env, "MILLIS", default), Duration::from_millis(500));
        assert_eq!(duration_or(&env, "BARE", default), Duration::from_secs(10));
        assert_eq!(duration_or(&env, "ZERO", default), Duration::ZERO);
        assert_eq!(duration_or(&env, "BAD", default), default);
    }

    #[test]
    fn test_flag_or() {
        let env: HashMap<&str, &str> = [
            ("UPPER", "TRUE"),
            ("ONE", "1"),
            ("YES", "Yes"),
            ("OFF", "off"),
            ("GARBAGE", "enforce"),
        ]
        .into_iter()
        .collect();

        assert!(flag_or(&env, "UPPER", false));
        assert!(flag_or(&env, "ONE", false));
        assert!(flag_or(&env, "YES", false));
        assert!(!flag_or(&env, "OFF", true));
        assert!(flag_or(&env, "GARBAGE", true));
        assert!(!flag_or(&env, "GARBAGE", false));
        assert!(!flag_or(&env, "MISSING", false));
    }

    #[test]
    fn test_lookup_fallbacks() {
        let env: HashMap<&str, &str> =
            [("PORT", "9191"), ("EMPTY", ""), ("BAD_PORT", "ninety")].into_iter().collect();

        assert_eq!(parse_or(&env, "PORT", 9090u16), 9191);
        assert_eq!(parse_or(&env, "BAD_PORT", 9090u16), 9090);
        assert_eq!(string_or(&env, "EMPTY", "fallback"), "fallback");
        assert_eq!(string_or(&env, "MISSING", "fallback"), "fallback");
        assert_eq!(
            duration_or(&env, "MISSING", Duration::from_secs(3)),
            Duration::from_secs(3)
        );
    }
}
