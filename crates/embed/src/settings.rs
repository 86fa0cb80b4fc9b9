use std::time::Duration;

pub const ENV_REFRESH_INTERVAL_MS: &str = "CODE_EMBED_REFRESH_INTERVAL_MS";
pub const ENV_REFRESH_TIMEOUT_MS: &str = "CODE_EMBED_REFRESH_TIMEOUT_MS";

/// Polling parameters of the refresh scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshConfig {
    /// Time between two checks of the active file
    pub interval: Duration,

    /// Give up after this much polling without a match
    pub timeout: Duration,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(3_000),
            timeout: Duration::from_millis(300_000),
        }
    }
}

impl RefreshConfig {
    /// Defaults overridden by `CODE_EMBED_REFRESH_INTERVAL_MS` / `CODE_EMBED_REFRESH_TIMEOUT_MS`
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(ms) = millis(&lookup, ENV_REFRESH_INTERVAL_MS) {
            config.interval = ms;
        }
        if let Some(ms) = millis(&lookup, ENV_REFRESH_TIMEOUT_MS) {
            config.timeout = ms;
        }
        config
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.interval.is_zero() {
            return Err("refresh interval must be > 0".to_string());
        }
        if self.timeout < self.interval {
            return Err(format!(
                "refresh timeout ({:?}) cannot be shorter than the interval ({:?})",
                self.timeout, self.interval
            ));
        }
        Ok(())
    }
}

fn millis(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<Duration> {
    let raw = lookup(key)?;
    match raw.trim().parse::<u64>() {
        Ok(ms) => Some(Duration::from_millis(ms)),
        Err(_) => {
            log::warn!("ignoring {key}={raw:?}: not a number of milliseconds");
            None
        }
    }
}
