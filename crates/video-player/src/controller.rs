//! Playback controller.
//!
//! Owns the transport state and forwards primitive operations (play, pause,
//! seek, rate, volume) to the media element. Position changes made by the
//! user are applied immediately; play/pause wait for element confirmation.

use video_player_types::MediaEvent;

use crate::error::ControlError;
use crate::status::TransportState;
use crate::transport::MediaElement;

pub struct PlaybackController {
    element: Box<dyn MediaElement>,
    state: TransportState,
    rates: Vec<f64>,
}

fn element_err(err: anyhow::Error) -> ControlError {
    ControlError::Element(format!("{err:#}"))
}

impl PlaybackController {
    pub fn new(element: Box<dyn MediaElement>, rates: Vec<f64>) -> Self {
        Self {
            element,
            state: TransportState::default(),
            rates,
        }
    }

    pub fn state(&self) -> &TransportState {
        &self.state
    }

    /// Allowed playback rates, in configuration order.
    pub fn rates(&self) -> &[f64] {
        &self.rates
    }

    /// Bind a new resource URL to the element and forget per-resource state.
    pub fn load_source(&mut self, url: &str) -> Result<(), ControlError> {
        self.element.set_source(url).map_err(element_err)?;
        self.state.reset_for_source();
        tracing::debug!(url, "source bound to media element");
        Ok(())
    }

    /// Push rate, volume and mute back to the element after a source load.
    pub fn reapply_output(&mut self) {
        let rate = self.state.playback_rate;
        let volume = self.state.volume;
        let muted = self.state.muted;
        if let Err(err) = self.element.set_playback_rate(rate) {
            tracing::warn!(rate, "failed to reapply playback rate: {err:#}");
        }
        if let Err(err) = self.element.set_volume(volume) {
            tracing::warn!(volume, "failed to reapply volume: {err:#}");
        }
        if let Err(err) = self.element.set_muted(muted) {
            tracing::warn!(muted, "failed to reapply mute: {err:#}");
        }
    }

    /// Request play when paused and pause when playing.
    pub fn toggle_play(&mut self) -> Result<(), ControlError> {
        if self.state.is_playing {
            self.pause()
        } else {
            self.play()
        }
    }

    pub fn play(&mut self) -> Result<(), ControlError> {
        self.element.play().map_err(element_err)
    }

    pub fn pause(&mut self) -> Result<(), ControlError> {
        self.element.pause().map_err(element_err)
    }

    /// Seek to an absolute position, clamped into `[0, duration]`.
    pub fn seek_to(&mut self, secs: f64) -> Result<f64, ControlError> {
        if !self.state.duration_known() {
            return Err(ControlError::MetadataPending);
        }
        let target = self
            .state
            .clamp_time(secs)
            .ok_or(ControlError::InvalidTarget(secs))?;
        self.element.set_current_time(target).map_err(element_err)?;
        self.state.current_time = target;
        Ok(target)
    }

    /// Seek relative to the current position.
    pub fn seek_by(&mut self, delta: f64) -> Result<f64, ControlError> {
        if !delta.is_finite() {
            return Err(ControlError::InvalidTarget(delta));
        }
        self.seek_to(self.state.current_time + delta)
    }

    /// Seek to a fraction of the duration, as picked on the progress bar.
    pub fn seek_to_fraction(&mut self, fraction: f64) -> Result<f64, ControlError> {
        if !self.state.duration_known() {
            return Err(ControlError::MetadataPending);
        }
        if !fraction.is_finite() {
            return Err(ControlError::InvalidTarget(fraction));
        }
        self.seek_to(fraction.clamp(0.0, 1.0) * self.state.duration)
    }

    /// Apply one of the allowed rates. Returns `false` when the rate was already active.
    pub fn set_rate(&mut self, rate: f64) -> Result<bool, ControlError> {
        let Some(rate) = self
            .rates
            .iter()
            .copied()
            .find(|allowed| (allowed - rate).abs() < 1e-9)
        else {
            return Err(ControlError::RateNotAllowed(rate));
        };
        if self.state.playback_rate == rate {
            return Ok(false);
        }
        self.element.set_playback_rate(rate).map_err(element_err)?;
        self.state.playback_rate = rate;
        Ok(true)
    }

    /// Set output volume, clamped to `0.0..=1.0`.
    pub fn set_volume(&mut self, volume: f64) -> Result<f64, ControlError> {
        if volume.is_nan() {
            return Err(ControlError::InvalidTarget(volume));
        }
        // Round so repeated ±0.1 steps land back on exact values.
        let volume = (volume.clamp(0.0, 1.0) * 100.0).round() / 100.0;
        self.element.set_volume(volume).map_err(element_err)?;
        self.state.volume = volume;
        if volume > 0.0 {
            self.state.last_audible_volume = volume;
        }
        Ok(volume)
    }

    pub fn adjust_volume(&mut self, delta: f64) -> Result<f64, ControlError> {
        self.set_volume(self.state.volume + delta)
    }

    /// Toggle mute as displayed. Returns the displayed mute state afterwards.
    pub fn toggle_mute(&mut self) -> Result<bool, ControlError> {
        if self.state.displayed_muted() {
            if self.state.volume <= 0.0 {
                let restore = self.state.last_audible_volume;
                self.set_volume(restore)?;
            }
            if self.state.muted {
                self.element.set_muted(false).map_err(element_err)?;
                self.state.muted = false;
            }
        } else {
            self.element.set_muted(true).map_err(element_err)?;
            self.state.muted = true;
        }
        Ok(self.state.displayed_muted())
    }

    pub fn set_seeking(&mut self, seeking: bool) {
        self.state.is_seeking = seeking;
    }

    /// Show `secs` as the position while the element reloads elsewhere.
    pub fn hold_position(&mut self, secs: f64) {
        self.state.current_time = secs.max(0.0);
    }

    /// Mirror a native element event into the transport state.
    pub fn apply_event(&mut self, event: &MediaEvent) {
        let state = &mut self.state;
        match event {
            MediaEvent::LoadedMetadata { duration } => {
                state.duration = if duration.is_finite() && *duration > 0.0 {
                    *duration
                } else {
                    0.0
                };
                if state.duration_known() {
                    state.current_time = state.current_time.clamp(0.0, state.duration);
                }
            }
            MediaEvent::TimeUpdate { current_time } => {
                if current_time.is_nan() {
                    return;
                }
                state.current_time = if state.duration_known() {
                    current_time.clamp(0.0, state.duration)
                } else {
                    current_time.max(0.0)
                };
            }
            MediaEvent::Waiting => state.is_buffering = true,
            MediaEvent::CanPlay => state.is_buffering = false,
            MediaEvent::Playing => {
                state.is_playing = true;
                state.is_buffering = false;
            }
            MediaEvent::Paused => state.is_playing = false,
            MediaEvent::Ended => {
                state.is_playing = false;
                state.is_buffering = false;
                if state.duration_known() {
                    state.current_time = state.duration;
                }
            }
            MediaEvent::Error { .. } => {
                state.is_playing = false;
                state.is_buffering = false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlayerConfig;
    use crate::sim::{ElementCall, SimMediaElement};

    fn make_controller() -> (PlaybackController, SimMediaElement) {
        let element = SimMediaElement::default();
        let controller = PlaybackController::new(
            Box::new(element.clone()),
            PlayerConfig::default().playback_rates,
        );
        (controller, element)
    }

    fn loaded(duration: f64) -> (PlaybackController, SimMediaElement) {
        let (mut controller, element) = make_controller();
        controller.load_source("https://cdn.example.net/a.mp4").unwrap();
        controller.apply_event(&MediaEvent::LoadedMetadata { duration });
        (controller, element)
    }

    #[test]
    fn toggle_play_does_not_mutate_state_optimistically() {
        let (mut controller, element) = loaded(100.0);

        controller.toggle_play().unwrap();

        assert!(!controller.state().is_playing);
        assert_eq!(element.calls().last(), Some(&ElementCall::Play));

        controller.apply_event(&MediaEvent::Playing);
        controller.toggle_play().unwrap();
        assert_eq!(element.calls().last(), Some(&ElementCall::Pause));
    }

    #[test]
    fn seek_by_stays_within_bounds() {
        let (mut controller, _element) = loaded(100.0);
        for delta in [-1e9, -10.0, -0.5, 0.0, 3.3, 10.0, 99.0, 1e9] {
            let target = controller.seek_by(delta).unwrap();
            assert!((0.0..=100.0).contains(&target));
            assert!((0.0..=100.0).contains(&controller.state().current_time));
        }
    }

    #[test]
    fn seeks_before_metadata_are_noops() {
        let (mut controller, element) = make_controller();
        controller.load_source("https://cdn.example.net/a.mp4").unwrap();
        let before = element.calls().len();

        assert_eq!(controller.seek_by(10.0), Err(ControlError::MetadataPending));
        assert_eq!(controller.seek_to_fraction(0.5), Err(ControlError::MetadataPending));

        controller.apply_event(&MediaEvent::LoadedMetadata { duration: f64::NAN });
        assert_eq!(controller.seek_to_fraction(0.5), Err(ControlError::MetadataPending));

        assert_eq!(element.calls().len(), before);
        assert_eq!(controller.state().current_time, 0.0);
    }

    #[test]
    fn seek_to_fraction_maps_onto_duration() {
        let (mut controller, element) = loaded(200.0);
        assert_eq!(controller.seek_to_fraction(0.25).unwrap(), 50.0);
        assert_eq!(controller.seek_to_fraction(1.7).unwrap(), 200.0);
        assert_eq!(element.snapshot().current_time, 200.0);
    }

    #[test]
    fn set_rate_is_idempotent() {
        let (mut controller, element) = loaded(100.0);
        assert_eq!(controller.set_rate(1.5), Ok(true));
        let calls = element.calls().len();
        assert_eq!(controller.set_rate(1.5), Ok(false));
        assert_eq!(element.calls().len(), calls);
        assert_eq!(controller.state().playback_rate, 1.5);
    }

    #[test]
    fn set_rate_rejects_unknown_rates() {
        let (mut controller, _element) = loaded(100.0);
        assert_eq!(controller.set_rate(3.0), Err(ControlError::RateNotAllowed(3.0)));
        assert_eq!(controller.state().playback_rate, 1.0);
    }

    #[test]
    fn unmute_restores_prior_volume() {
        let (mut controller, _element) = loaded(100.0);
        controller.set_volume(0.6).unwrap();
        controller.set_volume(0.0).unwrap();
        assert!(controller.state().displayed_muted());
        assert!(!controller.state().muted);

        assert_eq!(controller.toggle_mute(), Ok(false));
        assert_eq!(controller.state().volume, 0.6);
    }

    #[test]
    fn mute_flag_is_independent_of_volume() {
        let (mut controller, element) = loaded(100.0);
        controller.set_volume(0.8).unwrap();
        assert_eq!(controller.toggle_mute(), Ok(true));
        assert_eq!(controller.state().volume, 0.8);
        assert!(element.snapshot().muted);

        assert_eq!(controller.toggle_mute(), Ok(false));
        assert_eq!(controller.state().volume, 0.8);
        assert!(!element.snapshot().muted);
    }

    #[test]
    fn volume_steps_clamp_to_unit_range() {
        let (mut controller, _element) = loaded(100.0);
        assert_eq!(controller.adjust_volume(0.1), Ok(1.0));
        controller.set_volume(0.05).unwrap();
        assert_eq!(controller.adjust_volume(-0.1), Ok(0.0));
        assert_eq!(controller.adjust_volume(0.1), Ok(0.1));
    }

    #[test]
    fn time_updates_are_clamped_to_duration() {
        let (mut controller, _element) = loaded(60.0);
        controller.apply_event(&MediaEvent::TimeUpdate { current_time: 75.0 });
        assert_eq!(controller.state().current_time, 60.0);
        controller.apply_event(&MediaEvent::TimeUpdate { current_time: -2.0 });
        assert_eq!(controller.state().current_time, 0.0);
    }

    #[test]
    fn buffering_follows_events() {
        let (mut controller, _element) = loaded(60.0);
        controller.apply_event(&MediaEvent::Waiting);
        assert!(controller.state().is_buffering);
        controller.apply_event(&MediaEvent::Playing);
        assert!(!controller.state().is_buffering);
        assert!(controller.state().is_playing);
    }
}
