use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

/// Tuning parameters for input handling, timers and audio boost.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Seconds moved by arrow keys and double-taps.
    pub seek_step_secs: f64,
    /// Volume change per arrow key press.
    pub volume_step: f64,
    /// Max gap between two taps that count as a double-tap.
    pub double_tap_window_ms: u64,
    /// How long the double-tap acknowledgement stays on screen.
    pub tap_ack_ms: u64,
    /// Inactivity period before the overlay hides during playback.
    pub idle_hide_ms: u64,
    /// Highest accepted gain multiplier.
    pub max_boost: u8,
    /// Allowed playback rate multipliers.
    pub playback_rates: Vec<f64>,
    /// Where cross-origin sources are routed when the audio graph needs them.
    pub proxy: ProxyConfig,
}

/// Same-origin proxy endpoint used for audio amplification.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Origin the player page is served from, e.g. `https://catalog.example.com`.
    pub app_origin: String,
    /// Path of the proxy endpoint on that origin.
    pub endpoint: String,
    /// Query parameter carrying the encoded upstream URL.
    pub query_param: String,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            seek_step_secs: 10.0,
            volume_step: 0.1,
            double_tap_window_ms: 350,
            tap_ack_ms: 700,
            idle_hide_ms: 3500,
            max_boost: 5,
            playback_rates: vec![0.5, 0.75, 1.0, 1.25, 1.5, 2.0],
            proxy: ProxyConfig::default(),
        }
    }
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            app_origin: "http://localhost:3000".to_string(),
            endpoint: "/api/proxy".to_string(),
            query_param: "url".to_string(),
        }
    }
}

impl PlayerConfig {
    /// Reject settings the player cannot operate with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.seek_step_secs.is_finite() && self.seek_step_secs > 0.0) {
            return Err(ConfigError::Invalid("seek_step_secs must be positive".into()));
        }
        if !(self.volume_step.is_finite() && self.volume_step > 0.0 && self.volume_step <= 1.0) {
            return Err(ConfigError::Invalid("volume_step must be in (0, 1]".into()));
        }
        if self.double_tap_window_ms == 0 || self.tap_ack_ms == 0 || self.idle_hide_ms == 0 {
            return Err(ConfigError::Invalid("timer durations must be non-zero".into()));
        }
        if !(1..=10).contains(&self.max_boost) {
            return Err(ConfigError::Invalid("max_boost must be within 1..=10".into()));
        }
        if self.playback_rates.is_empty() {
            return Err(ConfigError::Invalid("playback_rates must not be empty".into()));
        }
        if self
            .playback_rates
            .iter()
            .any(|rate| !(rate.is_finite() && *rate > 0.0))
        {
            return Err(ConfigError::Invalid("playback_rates must be positive".into()));
        }
        if !self.playback_rates.iter().any(|rate| *rate == 1.0) {
            return Err(ConfigError::Invalid("playback_rates must include 1.0".into()));
        }
        if url::Url::parse(&self.proxy.app_origin).is_err() {
            return Err(ConfigError::Invalid(format!(
                "proxy.app_origin is not a URL: {}",
                self.proxy.app_origin
            )));
        }
        Ok(())
    }

    pub fn double_tap_window(&self) -> Duration {
        Duration::from_millis(self.double_tap_window_ms)
    }

    pub fn tap_ack(&self) -> Duration {
        Duration::from_millis(self.tap_ack_ms)
    }

    pub fn idle_hide(&self) -> Duration {
        Duration::from_millis(self.idle_hide_ms)
    }
}
