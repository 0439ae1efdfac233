use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use video_player::config::PlayerConfig;
use video_player::error::CastFailure;
use video_player::sim::{SimElementState, SimEnvState, SimGraphState};

/// Simulator configuration file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Player tuning, see [`PlayerConfig`].
    pub player: PlayerConfig,
    pub environment: EnvironmentConfig,
    pub audio_graph: AudioGraphConfig,
    pub element: ElementConfig,
}

/// Capabilities of the simulated display environment.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    pub fullscreen: bool,
    pub remote_playback: bool,
    /// What the device picker reports when prompted.
    pub cast_outcome: CastOutcome,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CastOutcome {
    #[default]
    Connected,
    NotFound,
    Cancelled,
    InsecureContext,
    NotSupported,
    Failed,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AudioGraphConfig {
    /// Refuse to build the graph.
    pub fail_connect: bool,
    /// Reject every gain change.
    pub fail_gain: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ElementConfig {
    /// Reject `play()`, as an autoplay policy would.
    pub fail_play: bool,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            fullscreen: true,
            remote_playback: true,
            cast_outcome: CastOutcome::Connected,
        }
    }
}

impl CastOutcome {
    pub fn failure(self) -> Option<CastFailure> {
        match self {
            CastOutcome::Connected => None,
            CastOutcome::NotFound => Some(CastFailure::NotFound),
            CastOutcome::Cancelled => Some(CastFailure::Cancelled),
            CastOutcome::InsecureContext => Some(CastFailure::InsecureContext),
            CastOutcome::NotSupported => Some(CastFailure::NotSupported),
            CastOutcome::Failed => Some(CastFailure::Other("simulated failure".to_string())),
        }
    }
}

impl SimConfig {
    /// Load configuration from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let raw =
            std::fs::read_to_string(path).with_context(|| format!("read config {:?}", path))?;
        let cfg = toml::from_str::<SimConfig>(&raw)
            .with_context(|| format!("parse config {:?}", path))?;
        cfg.player
            .validate()
            .with_context(|| format!("invalid player settings in {:?}", path))?;
        Ok(cfg)
    }

    pub fn element_state(&self) -> SimElementState {
        SimElementState {
            fail_play: self.element.fail_play,
            ..SimElementState::default()
        }
    }

    pub fn graph_state(&self) -> SimGraphState {
        SimGraphState {
            fail_connect: self.audio_graph.fail_connect,
            fail_gain: self.audio_graph.fail_gain,
            ..SimGraphState::default()
        }
    }

    pub fn env_state(&self) -> SimEnvState {
        SimEnvState {
            fullscreen_supported: self.environment.fullscreen,
            remote_playback_supported: self.environment.remote_playback,
            cast_outcome: self.environment.cast_outcome.failure(),
            ..SimEnvState::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let cfg: SimConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.player.max_boost, 5);
        assert!(cfg.environment.fullscreen);
        assert_eq!(cfg.environment.cast_outcome, CastOutcome::Connected);
        assert!(!cfg.audio_graph.fail_connect);
    }

    #[test]
    fn tables_override_backend_behaviour() {
        let raw = r#"
            [player]
            seek_step_secs = 5.0
            max_boost = 3

            [player.proxy]
            app_origin = "https://catalog.example.com"

            [environment]
            remote_playback = false
            cast_outcome = "insecure_context"

            [audio_graph]
            fail_gain = true

            [element]
            fail_play = true
        "#;
        let cfg: SimConfig = toml::from_str(raw).unwrap();
        assert_eq!(cfg.player.seek_step_secs, 5.0);
        assert_eq!(cfg.player.proxy.app_origin, "https://catalog.example.com");
        assert_eq!(cfg.player.proxy.endpoint, "/api/proxy");
        assert!(!cfg.env_state().remote_playback_supported);
        assert_eq!(cfg.env_state().cast_outcome, Some(CastFailure::InsecureContext));
        assert!(cfg.graph_state().fail_gain);
        assert!(cfg.element_state().fail_play);
    }

    #[test]
    fn load_rejects_invalid_player_settings() {
        let path = std::env::temp_dir().join(format!(
            "player-sim-config-{}.toml",
            std::process::id()
        ));
        std::fs::write(&path, "[player]\nplayback_rates = [0.5, 2.0]\n").unwrap();
        let result = SimConfig::load(&path);
        let _ = std::fs::remove_file(&path);
        assert!(result.is_err());
    }
}
