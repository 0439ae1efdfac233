//! Overlay visibility, fullscreen and remote playback.

use std::time::{Duration, Instant};

use video_player_types::NoticeKind;

use crate::error::CastFailure;

/// Host display capabilities.
pub trait DisplayEnvironment {
    fn fullscreen_supported(&self) -> bool;
    /// Ask for fullscreen on the player container; confirmed by a change notification.
    fn request_fullscreen(&mut self) -> anyhow::Result<()>;
    fn exit_fullscreen(&mut self) -> anyhow::Result<()>;
    fn remote_playback_supported(&self) -> bool;
    /// Open the device picker for remote playback.
    fn prompt_remote_playback(&mut self) -> Result<(), CastFailure>;
}

/// Control overlay that hides after a period without input during playback.
#[derive(Clone, Debug)]
pub struct Overlay {
    visible: bool,
    last_input: Instant,
    hide_after: Duration,
}

impl Overlay {
    pub fn new(hide_after: Duration, now: Instant) -> Self {
        Self {
            visible: true,
            last_input: now,
            hide_after,
        }
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    /// Qualifying input: show the overlay and restart the idle timer.
    pub fn touch(&mut self, now: Instant) {
        self.visible = true;
        self.last_input = now;
    }

    /// Hide when idle during playback; stay up while paused or scrubbing.
    pub fn tick(&mut self, now: Instant, playing: bool, seeking: bool) {
        if !playing {
            self.visible = true;
            return;
        }
        if seeking {
            return;
        }
        if self.visible && now.saturating_duration_since(self.last_input) >= self.hide_after {
            self.visible = false;
        }
    }
}

/// Fullscreen flag and cast capability for the mounted player.
pub struct Presentation {
    env: Box<dyn DisplayEnvironment>,
    fullscreen: bool,
    cast_available: bool,
}

impl Presentation {
    pub fn new(env: Box<dyn DisplayEnvironment>) -> Self {
        let mut presentation = Self {
            env,
            fullscreen: false,
            cast_available: false,
        };
        presentation.probe_cast();
        presentation
    }

    pub fn fullscreen(&self) -> bool {
        self.fullscreen
    }

    pub fn fullscreen_available(&self) -> bool {
        self.env.fullscreen_supported()
    }

    pub fn cast_available(&self) -> bool {
        self.cast_available
    }

    /// Re-probe remote playback support.
    pub fn probe_cast(&mut self) {
        self.cast_available = self.env.remote_playback_supported();
        tracing::debug!(available = self.cast_available, "remote playback probed");
    }

    /// Request the opposite of the current fullscreen state.
    ///
    /// The flag itself only changes through [`Presentation::on_fullscreen_changed`].
    pub fn toggle_fullscreen(&mut self) {
        if !self.env.fullscreen_supported() {
            return;
        }
        let result = if self.fullscreen {
            self.env.exit_fullscreen()
        } else {
            self.env.request_fullscreen()
        };
        if let Err(err) = result {
            tracing::warn!(fullscreen = self.fullscreen, "fullscreen request failed: {err:#}");
        }
    }

    /// The environment entered or left fullscreen, whoever initiated it.
    pub fn on_fullscreen_changed(&mut self, active: bool) {
        self.fullscreen = active;
    }

    /// Prompt for a remote playback device.
    ///
    /// Returns the notice to show, if any. Cancellation is silent.
    pub fn cast(&mut self) -> Option<(NoticeKind, String)> {
        if !self.cast_available {
            return None;
        }
        match self.env.prompt_remote_playback() {
            Ok(()) => {
                tracing::info!("remote playback connected");
                None
            }
            Err(CastFailure::Cancelled) => None,
            Err(failure) => {
                tracing::warn!("remote playback failed: {failure}");
                Some(cast_notice(&failure))
            }
        }
    }
}

fn cast_notice(failure: &CastFailure) -> (NoticeKind, String) {
    match failure {
        CastFailure::NotFound => (
            NoticeKind::CastNotFound,
            "No cast devices found. Make sure your device is on the same network.".to_string(),
        ),
        CastFailure::InsecureContext => (
            NoticeKind::CastInsecureContext,
            "Casting needs a secure connection. Open this page over HTTPS and try again."
                .to_string(),
        ),
        CastFailure::NotSupported => (
            NoticeKind::CastUnsupported,
            "This browser does not support casting.".to_string(),
        ),
        CastFailure::Cancelled | CastFailure::Other(_) => (
            NoticeKind::CastFailed,
            "Casting failed. Please try again.".to_string(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{SimEnvState, SimEnvironment};

    #[test]
    fn overlay_hides_after_idle_only_while_playing() {
        let t0 = Instant::now();
        let mut overlay = Overlay::new(Duration::from_millis(3500), t0);

        overlay.tick(t0 + Duration::from_secs(10), false, false);
        assert!(overlay.visible());

        overlay.tick(t0 + Duration::from_millis(3400), true, false);
        assert!(overlay.visible());
        overlay.tick(t0 + Duration::from_millis(3500), true, false);
        assert!(!overlay.visible());

        overlay.touch(t0 + Duration::from_secs(4));
        assert!(overlay.visible());
    }

    #[test]
    fn overlay_stays_while_seeking() {
        let t0 = Instant::now();
        let mut overlay = Overlay::new(Duration::from_millis(3500), t0);
        overlay.tick(t0 + Duration::from_secs(60), true, true);
        assert!(overlay.visible());
    }

    #[test]
    fn fullscreen_flag_follows_notifications() {
        let env = SimEnvironment::default();
        let mut presentation = Presentation::new(Box::new(env.clone()));

        presentation.toggle_fullscreen();
        assert!(!presentation.fullscreen());
        assert_eq!(env.snapshot().fullscreen_requests, 1);

        presentation.on_fullscreen_changed(true);
        presentation.toggle_fullscreen();
        assert_eq!(env.snapshot().fullscreen_exits, 1);

        // Left through browser chrome.
        presentation.on_fullscreen_changed(false);
        assert!(!presentation.fullscreen());
    }

    #[test]
    fn unsupported_fullscreen_is_hidden_and_inert() {
        let env = SimEnvironment::new(SimEnvState {
            fullscreen_supported: false,
            ..SimEnvState::default()
        });
        let mut presentation = Presentation::new(Box::new(env.clone()));
        assert!(!presentation.fullscreen_available());
        presentation.toggle_fullscreen();
        assert_eq!(env.snapshot().fullscreen_requests, 0);
    }

    #[test]
    fn cast_failures_map_to_distinct_notices() {
        let env = SimEnvironment::default();
        let mut presentation = Presentation::new(Box::new(env.clone()));

        env.set_cast_outcome(Some(CastFailure::Cancelled));
        assert_eq!(presentation.cast(), None);

        let mut kinds = Vec::new();
        for failure in [
            CastFailure::NotFound,
            CastFailure::InsecureContext,
            CastFailure::NotSupported,
            CastFailure::Other("boom".into()),
        ] {
            env.set_cast_outcome(Some(failure));
            kinds.push(presentation.cast().map(|(kind, _)| kind));
        }
        assert_eq!(
            kinds,
            vec![
                Some(NoticeKind::CastNotFound),
                Some(NoticeKind::CastInsecureContext),
                Some(NoticeKind::CastUnsupported),
                Some(NoticeKind::CastFailed),
            ]
        );
    }

    #[test]
    fn cast_is_inert_without_remote_playback() {
        let env = SimEnvironment::new(SimEnvState {
            remote_playback_supported: false,
            ..SimEnvState::default()
        });
        let mut presentation = Presentation::new(Box::new(env.clone()));
        assert!(!presentation.cast_available());
        assert_eq!(presentation.cast(), None);
        assert_eq!(env.snapshot().cast_prompts, 0);
    }
}
