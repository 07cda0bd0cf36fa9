use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_BUFFER_THRESHOLD: usize = 3;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 300;
pub const DEFAULT_MATCH_TOLERANCE_SECS: f64 = 2.0;
pub const DEFAULT_PLAYBACK_RATE: f32 = 1.1;
pub const DEFAULT_AUTOPLAY_DELAY_MS: u64 = 2000;

/// What the synchronizer shows when no segment contains the playback position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatchPolicy {
    /// Blank display, no audio.
    ContainmentOnly,
    /// Fall back to the segment whose `start` is closest to the position,
    /// accepted only if `|start - position| <= tolerance_secs`.
    NearestWithin { tolerance_secs: f64 },
}

impl Default for MatchPolicy {
    fn default() -> Self {
        MatchPolicy::NearestWithin {
            tolerance_secs: DEFAULT_MATCH_TOLERANCE_SECS,
        }
    }
}

/// Everything the kernel needs, supplied at construction.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Arrivals required before the ready signal fires (T >= 1).
    pub buffer_threshold: usize,
    pub poll_interval: Duration,
    pub match_policy: MatchPolicy,
    /// Rate multiplier applied to every dubbed clip.
    pub playback_rate: f32,
    /// Issue a play command on the ready signal.
    pub autoplay: bool,
    pub autoplay_delay: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            buffer_threshold: DEFAULT_BUFFER_THRESHOLD,
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            match_policy: MatchPolicy::default(),
            playback_rate: DEFAULT_PLAYBACK_RATE,
            autoplay: true,
            autoplay_delay: Duration::from_millis(DEFAULT_AUTOPLAY_DELAY_MS),
        }
    }
}

impl SyncConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.buffer_threshold < 1 {
            return Err(ConfigError::BufferThreshold(self.buffer_threshold));
        }
        if self.poll_interval.is_zero() {
            return Err(ConfigError::PollInterval);
        }
        if let MatchPolicy::NearestWithin { tolerance_secs } = self.match_policy {
            if !tolerance_secs.is_finite() || tolerance_secs < 0.0 {
                return Err(ConfigError::Tolerance(tolerance_secs));
            }
        }
        if !self.playback_rate.is_finite() || self.playback_rate <= 0.0 {
            return Err(ConfigError::PlaybackRate(self.playback_rate));
        }
        Ok(())
    }

    /// Number of whole ticks covering `autoplay_delay`, rounded up.
    /// Saturates for delays no session will ever reach.
    pub fn autoplay_delay_ticks(&self) -> u64 {
        let delay = self.autoplay_delay.as_millis();
        let poll = self.poll_interval.as_millis().max(1);
        u64::try_from(delay.div_ceil(poll)).unwrap_or(u64::MAX)
    }

    /// Defaults overlaid with `DUBLINE_*` environment variables, validated.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(v) = lookup("DUBLINE_BUFFER_THRESHOLD") {
            config.buffer_threshold = parse_var("DUBLINE_BUFFER_THRESHOLD", &v)?;
        }
        if let Some(v) = lookup("DUBLINE_POLL_INTERVAL_MS") {
            config.poll_interval =
                Duration::from_millis(parse_var("DUBLINE_POLL_INTERVAL_MS", &v)?);
        }
        if let Some(v) = lookup("DUBLINE_MATCH_TOLERANCE_SECS") {
            config.match_policy = if v.trim().eq_ignore_ascii_case("off") {
                MatchPolicy::ContainmentOnly
            } else {
                MatchPolicy::NearestWithin {
                    tolerance_secs: parse_var("DUBLINE_MATCH_TOLERANCE_SECS", &v)?,
                }
            };
        }
        if let Some(v) = lookup("DUBLINE_PLAYBACK_RATE") {
            config.playback_rate = parse_var("DUBLINE_PLAYBACK_RATE", &v)?;
        }
        if let Some(v) = lookup("DUBLINE_AUTOPLAY") {
            config.autoplay = parse_var("DUBLINE_AUTOPLAY", &v)?;
        }
        if let Some(v) = lookup("DUBLINE_AUTOPLAY_DELAY_MS") {
            config.autoplay_delay =
                Duration::from_millis(parse_var("DUBLINE_AUTOPLAY_DELAY_MS", &v)?);
        }

        config.validate()?;
        Ok(config)
    }
}

fn parse_var<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Env {
        key: key.to_string(),
        message: e.to_string(),
    })
}
