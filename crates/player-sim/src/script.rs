//! Scenario scripts.
//!
//! A script is a TOML file with one `[[step]]` table per action. `at_ms` is
//! the step's offset from the start of the run and must not go backwards.
//!
//! ```toml
//! [[step]]
//! at_ms = 0
//! action = "load"
//! source_url = "https://cdn.example.net/feature.mp4"
//! title = "Feature"
//!
//! [[step]]
//! at_ms = 50
//! action = "media"
//! event = { kind = "loaded_metadata", duration = 1200.0 }
//! ```

use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use video_player_types::{MediaEvent, NoticeKind, PlayableUnit};

#[derive(Debug, Deserialize)]
pub struct Script {
    #[serde(default, rename = "step")]
    pub steps: Vec<Step>,
}

#[derive(Debug, Deserialize)]
pub struct Step {
    #[serde(default)]
    pub at_ms: u64,
    #[serde(flatten)]
    pub action: Action,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    Load(UnitEntry),
    /// Native element event, delivered through the unit's subscription.
    Media { event: MediaEvent },
    FullscreenChanged { active: bool },
    Focus { focused: bool },
    /// DOM key name, e.g. `" "` or `"ArrowLeft"`.
    Key { key: String },
    Tap { x: f64, width: f64 },
    PointerMove,
    ScrubStart { x: f64, track_left: f64, track_width: f64 },
    ScrubMove { x: f64, track_left: f64, track_width: f64 },
    ScrubEnd,
    TogglePlay,
    SeekBy { delta: f64 },
    SeekFraction { fraction: f64 },
    SkipIntro,
    Rate { rate: f64 },
    Volume { volume: f64 },
    Mute,
    Boost { level: f64 },
    Fullscreen,
    Cast,
    Next,
    Prev,
    Dismiss { notice: NoticeKind },
    /// Advance timers without input.
    Tick,
    /// Record a snapshot of the player.
    Snapshot,
}

#[derive(Debug, Deserialize)]
pub struct UnitEntry {
    pub source_url: String,
    #[serde(default)]
    pub title: String,
    pub subtitle: Option<String>,
    pub poster_url: Option<String>,
    pub intro_end_offset_seconds: Option<f64>,
    #[serde(default)]
    pub has_next_unit: bool,
    #[serde(default)]
    pub has_prev_unit: bool,
}

impl From<UnitEntry> for PlayableUnit {
    fn from(entry: UnitEntry) -> Self {
        PlayableUnit {
            source_url: entry.source_url,
            poster_url: entry.poster_url,
            title: entry.title,
            subtitle: entry.subtitle,
            intro_end_offset_seconds: entry.intro_end_offset_seconds,
            has_next_unit: entry.has_next_unit,
            has_prev_unit: entry.has_prev_unit,
        }
    }
}

impl Script {
    pub fn load(path: &Path) -> Result<Self> {
        let raw =
            std::fs::read_to_string(path).with_context(|| format!("read script {:?}", path))?;
        Self::parse(&raw).with_context(|| format!("parse script {:?}", path))
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let script: Script = toml::from_str(raw)?;
        script.check_order()?;
        Ok(script)
    }

    fn check_order(&self) -> Result<()> {
        for (index, pair) in self.steps.windows(2).enumerate() {
            if pair[1].at_ms < pair[0].at_ms {
                bail!(
                    "step {} at {}ms runs before step {} at {}ms",
                    index + 1,
                    pair[1].at_ms,
                    index,
                    pair[0].at_ms
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tagged_steps() {
        let script = Script::parse(
            r#"
            [[step]]
            action = "load"
            source_url = "https://cdn.example.net/a.mp4"
            title = "A"
            intro_end_offset_seconds = 42.0

            [[step]]
            at_ms = 10
            action = "media"
            event = { kind = "time_update", current_time = 3.5 }

            [[step]]
            at_ms = 20
            action = "dismiss"
            notice = "proxy_fallback"

            [[step]]
            at_ms = 20
            action = "snapshot"
            "#,
        )
        .unwrap();

        assert_eq!(script.steps.len(), 4);
        match &script.steps[0].action {
            Action::Load(unit) => assert_eq!(unit.intro_end_offset_seconds, Some(42.0)),
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            script.steps[1].action,
            Action::Media {
                event: MediaEvent::TimeUpdate { current_time }
            } if current_time == 3.5
        ));
        assert!(matches!(
            script.steps[2].action,
            Action::Dismiss {
                notice: NoticeKind::ProxyFallback
            }
        ));
    }

    #[test]
    fn rejects_steps_out_of_order() {
        let err = Script::parse(
            r#"
            [[step]]
            at_ms = 100
            action = "tick"

            [[step]]
            at_ms = 50
            action = "tick"
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("runs before"));
    }

    #[test]
    fn empty_script_is_valid() {
        assert!(Script::parse("").unwrap().steps.is_empty());
    }
}
