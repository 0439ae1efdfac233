use std::fmt::{Debug, Display};
use std::time::{Duration, Instant};

use anyhow::Result;
use video_player::events::{MediaEventSink, PlayerEvent};
use video_player::input::Key;
use video_player::player::{NavigationHooks, PlayerBackends, VideoPlayer};
use video_player::sim::{SimAudioGraph, SimEnvironment, SimMediaElement};
use video_player_types::PlayerSnapshot;

use crate::config::SimConfig;
use crate::script::{Action, Script};

/// Drives one player through a script on a virtual clock.
pub struct Runner {
    player: VideoPlayer,
    sink: Option<MediaEventSink>,
    start: Instant,
    snapshots: Vec<PlayerSnapshot>,
}

fn report<T: Debug, E: Display>(step: usize, what: &str, result: Result<T, E>) {
    match result {
        Ok(value) => tracing::debug!(step, what, ?value, "step applied"),
        Err(err) => tracing::warn!(step, what, "step rejected: {err}"),
    }
}

impl Runner {
    pub fn new(config: &SimConfig, start: Instant) -> Result<Self> {
        let backends = PlayerBackends {
            element: Box::new(SimMediaElement::new(config.element_state())),
            audio_graph: Box::new(SimAudioGraph::new(config.graph_state())),
            environment: Box::new(SimEnvironment::new(config.env_state())),
        };
        let mut player = VideoPlayer::new(config.player.clone(), backends, start)?;
        player.set_navigation(NavigationHooks {
            on_next: Some(Box::new(|| tracing::info!("host asked for the next unit"))),
            on_prev: Some(Box::new(|| tracing::info!("host asked for the previous unit"))),
        });
        Ok(Self {
            player,
            sink: None,
            start,
            snapshots: Vec::new(),
        })
    }

    /// Run every step, then return the recorded snapshots followed by the final state.
    pub fn run(mut self, script: Script) -> Vec<PlayerSnapshot> {
        let mut now = self.start;
        for (index, step) in script.steps.into_iter().enumerate() {
            now = self.start + Duration::from_millis(step.at_ms);
            self.player.pump(now);
            self.apply(index, step.action, now);
            self.player.pump(now);
        }
        self.snapshots.push(self.player.snapshot(now));
        self.player.unmount();
        self.snapshots
    }

    fn apply(&mut self, step: usize, action: Action, now: Instant) {
        let player = &mut self.player;
        match action {
            Action::Load(unit) => match player.load_unit(unit.into(), now) {
                Ok(sink) => self.sink = Some(sink),
                Err(err) => tracing::warn!(step, "unit rejected: {err}"),
            },
            Action::Media { event } => {
                let Some(sink) = self.sink.as_ref() else {
                    tracing::warn!(step, "media event before any unit was loaded");
                    return;
                };
                if !sink.media(event) {
                    tracing::warn!(step, "subscription already torn down");
                }
            }
            Action::FullscreenChanged { active } => {
                if let Some(sink) = self.sink.as_ref() {
                    sink.emit(PlayerEvent::FullscreenChanged(active));
                } else {
                    player.handle_event(PlayerEvent::FullscreenChanged(active), now);
                }
            }
            Action::Focus { focused } => player.set_focus(focused),
            Action::Key { key } => {
                if !player.handle_key(Key::from_dom(&key), now) {
                    tracing::debug!(step, %key, "key not handled");
                }
            }
            Action::Tap { x, width } => player.tap(x, width, now),
            Action::PointerMove => player.pointer_moved(now),
            Action::ScrubStart {
                x,
                track_left,
                track_width,
            } => player.scrub_start(x, track_left, track_width, now),
            Action::ScrubMove {
                x,
                track_left,
                track_width,
            } => player.scrub_move(x, track_left, track_width, now),
            Action::ScrubEnd => player.scrub_end(now),
            Action::TogglePlay => report(step, "toggle_play", player.toggle_play(now)),
            Action::SeekBy { delta } => report(step, "seek_by", player.seek_by(delta, now)),
            Action::SeekFraction { fraction } => {
                report(step, "seek_fraction", player.seek_to_fraction(fraction, now))
            }
            Action::SkipIntro => report(step, "skip_intro", player.skip_intro(now)),
            Action::Rate { rate } => report(step, "rate", player.set_rate(rate)),
            Action::Volume { volume } => report(step, "volume", player.set_volume(volume, now)),
            Action::Mute => report(step, "mute", player.toggle_mute(now)),
            Action::Boost { level } => report(step, "boost", player.set_boost(level, now)),
            Action::Fullscreen => player.toggle_fullscreen(now),
            Action::Cast => player.cast(),
            Action::Next => {
                player.next_unit();
            }
            Action::Prev => {
                player.prev_unit();
            }
            Action::Dismiss { notice } => player.dismiss_notice(notice),
            Action::Tick => player.tick(now),
            Action::Snapshot => {
                player.pump(now);
                self.snapshots.push(player.snapshot(now));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use video_player_types::NoticeKind;

    fn run(config: &str, script: &str) -> Vec<PlayerSnapshot> {
        let config: SimConfig = toml::from_str(config).unwrap();
        let script = Script::parse(script).unwrap();
        Runner::new(&config, Instant::now()).unwrap().run(script)
    }

    const LOAD_CDN: &str = r#"
        [[step]]
        action = "load"
        source_url = "https://cdn.example.net/feature.mp4"
        title = "Feature"
        intro_end_offset_seconds = 90.0

        [[step]]
        action = "media"
        event = { kind = "loaded_metadata", duration = 1200.0 }

        [[step]]
        action = "media"
        event = { kind = "playing" }

        [[step]]
        action = "media"
        event = { kind = "time_update", current_time = 300.0 }
    "#;

    #[test]
    fn final_snapshot_is_always_recorded() {
        let snapshots = run("", LOAD_CDN);
        assert_eq!(snapshots.len(), 1);
        let last = &snapshots[0];
        assert_eq!(last.title.as_deref(), Some("Feature"));
        assert_eq!(last.current_time, 300.0);
        assert_eq!(last.elapsed_label, "5:00");
        assert!(last.is_playing);
        assert!(!last.intro_skip_visible);
    }

    #[test]
    fn proxy_boost_scenario() {
        let script = format!(
            "{LOAD_CDN}{}",
            r#"
            [[step]]
            at_ms = 100
            action = "boost"
            level = 3.0

            [[step]]
            at_ms = 100
            action = "snapshot"

            [[step]]
            at_ms = 400
            action = "media"
            event = { kind = "loaded_metadata", duration = 1200.0 }
            "#
        );
        let snapshots = run("", &script);
        let pending = &snapshots[0];
        assert!(pending.using_proxy);
        assert!(pending.restore_pending);
        assert_eq!(pending.current_time, 300.0);

        let last = snapshots.last().unwrap();
        assert_eq!(last.boost_level, 3);
        assert!(!last.restore_pending);
        assert_eq!(last.current_time, 300.0);
    }

    #[test]
    fn proxy_error_falls_back_with_notice() {
        let script = format!(
            "{LOAD_CDN}{}",
            r#"
            [[step]]
            at_ms = 100
            action = "boost"
            level = 2.0

            [[step]]
            at_ms = 200
            action = "media"
            event = { kind = "error", message = "bad gateway" }
            "#
        );
        let last = run("", &script).pop().unwrap();
        assert_eq!(last.boost_level, 1);
        assert!(!last.using_proxy);
        assert_eq!(
            last.source_url.as_deref(),
            Some("https://cdn.example.net/feature.mp4")
        );
        assert_eq!(last.notices.len(), 1);
        assert_eq!(last.notices[0].kind, NoticeKind::ProxyFallback);
    }

    #[test]
    fn idle_overlay_hides_on_virtual_clock() {
        let script = format!(
            "{LOAD_CDN}{}",
            r#"
            [[step]]
            at_ms = 3000
            action = "snapshot"

            [[step]]
            at_ms = 4000
            action = "tick"
            "#
        );
        let snapshots = run("", &script);
        assert!(snapshots[0].controls_visible);
        assert!(!snapshots[1].controls_visible);
    }

    #[test]
    fn cast_failure_from_config_raises_notice() {
        let config = r#"
            [environment]
            cast_outcome = "not_found"
        "#;
        let script = format!(
            "{LOAD_CDN}{}",
            r#"
            [[step]]
            action = "cast"
            "#
        );
        let last = run(config, &script).pop().unwrap();
        assert_eq!(last.notices.len(), 1);
        assert_eq!(last.notices[0].kind, NoticeKind::CastNotFound);
    }
}
