use std::{env, str::FromStr, time::Duration};

use tanks_core::utils::Size;
use tracing::Level;

const DEFAULT_VIEWPORT_WIDTH: f64 = 1024.0;
const DEFAULT_VIEWPORT_HEIGHT: f64 = 768.0;
const DEFAULT_TICK_MS: u64 = 16;

/// Settings of the headless host, read from `TANKS_*` environment variables
#[derive(Debug, Clone, PartialEq)]
pub struct HostConfig {
    pub viewport: Size,
    /// How often the virtual clock catches up with the wall clock
    pub tick: Duration,
    pub network: bool,
    pub seed: Option<u64>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            viewport: Size::new(DEFAULT_VIEWPORT_WIDTH, DEFAULT_VIEWPORT_HEIGHT),
            tick: Duration::from_millis(DEFAULT_TICK_MS),
            network: false,
            seed: None,
        }
    }
}

impl HostConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from any key/value source, unparsable values fall back to
    /// their default with a warning
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let width = positive(&lookup, "TANKS_VIEWPORT_WIDTH", DEFAULT_VIEWPORT_WIDTH);
        let height = positive(&lookup, "TANKS_VIEWPORT_HEIGHT", DEFAULT_VIEWPORT_HEIGHT);

        let tick = match parsed(&lookup, "TANKS_TICK_MS", DEFAULT_TICK_MS) {
            0 => {
                tracing::warn!("TANKS_TICK_MS must be at least 1, using {}", DEFAULT_TICK_MS);
                DEFAULT_TICK_MS
            }
            millis => millis,
        };

        let network = match lookup("TANKS_NETWORK").as_deref().map(str::trim) {
            None => false,
            Some("on" | "true" | "1") => true,
            Some("off" | "false" | "0") => false,
            Some(other) => {
                tracing::warn!(value = other, "unknown TANKS_NETWORK value, network stays off");
                false
            }
        };

        let seed = lookup("TANKS_SEED").and_then(|raw| match raw.trim().parse() {
            Ok(seed) => Some(seed),
            Err(_) => {
                tracing::warn!(value = %raw, "ignoring unparsable TANKS_SEED");
                None
            }
        });

        Self {
            viewport: Size::new(width, height),
            tick: Duration::from_millis(tick),
            network,
            seed,
        }
    }
}

/// Maximum log level from `TANKS_LOG`, `info` unless set
pub fn log_level() -> Level {
    env::var("TANKS_LOG")
        .ok()
        .and_then(|value| Level::from_str(value.trim()).ok())
        .unwrap_or(Level::INFO)
}

fn parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "unparsable value, using the default");
            default
        }),
    }
}

fn positive(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: f64) -> f64 {
    let value = parsed(lookup, key, default);
    if value.is_finite() && value > 0.0 {
        value
    } else {
        tracing::warn!(key, value, "viewport dimensions must be positive, using the default");
        default
    }
}
