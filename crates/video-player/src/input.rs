//! Input normalization.
//!
//! Turns keyboard shortcuts, taps on the playback surface and progress-bar
//! pointer gestures into [`Command`]s for the player. Timing state for
//! double-taps and their on-screen acknowledgement lives here as well.

use std::time::{Duration, Instant};

use video_player_types::TapSide;

use crate::config::PlayerConfig;

/// Keys the player reacts to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    Space,
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    F,
    M,
    Other,
}

impl Key {
    /// Map a DOM `KeyboardEvent.key` or `.code` value.
    pub fn from_dom(value: &str) -> Self {
        match value {
            " " | "Space" | "Spacebar" => Key::Space,
            "ArrowLeft" | "Left" => Key::ArrowLeft,
            "ArrowRight" | "Right" => Key::ArrowRight,
            "ArrowUp" | "Up" => Key::ArrowUp,
            "ArrowDown" | "Down" => Key::ArrowDown,
            "f" | "F" | "KeyF" => Key::F,
            "m" | "M" | "KeyM" => Key::M,
            _ => Key::Other,
        }
    }
}

/// Horizontal third of the playback surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TapZone {
    Left,
    Middle,
    Right,
}

impl TapZone {
    pub fn from_position(x: f64, width: f64) -> Option<Self> {
        if !(width.is_finite() && width > 0.0 && x.is_finite()) {
            return None;
        }
        let third = width / 3.0;
        Some(if x < third {
            TapZone::Left
        } else if x < third * 2.0 {
            TapZone::Middle
        } else {
            TapZone::Right
        })
    }
}

/// Player operation produced by an input.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Command {
    TogglePlay,
    SeekBy(f64),
    /// Absolute seek, used when the origin was captured earlier (double-tap).
    SeekTo(f64),
    SeekToFraction(f64),
    AdjustVolume(f64),
    ToggleFullscreen,
    ToggleMute,
    BeginScrub,
    EndScrub,
}

#[derive(Clone, Copy, Debug)]
struct PendingTap {
    zone: TapZone,
    at: Instant,
    position: f64,
}

#[derive(Clone, Copy, Debug)]
struct TapAck {
    side: TapSide,
    until: Instant,
}

#[derive(Debug)]
pub struct InputDispatcher {
    focused: bool,
    seek_step: f64,
    volume_step: f64,
    double_tap_window: Duration,
    tap_ack: Duration,
    last_tap: Option<PendingTap>,
    ack: Option<TapAck>,
    scrubbing: bool,
}

impl InputDispatcher {
    pub fn new(config: &PlayerConfig) -> Self {
        Self {
            focused: false,
            seek_step: config.seek_step_secs,
            volume_step: config.volume_step,
            double_tap_window: config.double_tap_window(),
            tap_ack: config.tap_ack(),
            last_tap: None,
            ack: None,
            scrubbing: false,
        }
    }

    pub fn set_focus(&mut self, focused: bool) {
        self.focused = focused;
    }

    pub fn has_focus(&self) -> bool {
        self.focused
    }

    pub fn is_scrubbing(&self) -> bool {
        self.scrubbing
    }

    /// Keyboard shortcuts apply only while the player holds input focus.
    pub fn key(&self, key: Key) -> Option<Command> {
        if !self.focused {
            return None;
        }
        match key {
            Key::Space => Some(Command::TogglePlay),
            Key::ArrowRight => Some(Command::SeekBy(self.seek_step)),
            Key::ArrowLeft => Some(Command::SeekBy(-self.seek_step)),
            Key::ArrowUp => Some(Command::AdjustVolume(self.volume_step)),
            Key::ArrowDown => Some(Command::AdjustVolume(-self.volume_step)),
            Key::F => Some(Command::ToggleFullscreen),
            Key::M => Some(Command::ToggleMute),
            Key::Other => None,
        }
    }

    /// Register a tap at `x` on a surface `width` wide.
    ///
    /// The middle third toggles playback on every tap. The side thirds seek
    /// only on the second tap within the double-tap window, relative to the
    /// position captured at the first tap.
    pub fn tap(&mut self, x: f64, width: f64, now: Instant, position: f64) -> Option<Command> {
        let zone = TapZone::from_position(x, width)?;
        let side = match zone {
            TapZone::Middle => {
                self.last_tap = None;
                return Some(Command::TogglePlay);
            }
            TapZone::Left => TapSide::Rewind,
            TapZone::Right => TapSide::Forward,
        };

        match self.last_tap.take() {
            Some(first)
                if first.zone == zone
                    && now.saturating_duration_since(first.at) <= self.double_tap_window =>
            {
                let delta = match side {
                    TapSide::Rewind => -self.seek_step,
                    TapSide::Forward => self.seek_step,
                };
                self.ack = Some(TapAck {
                    side,
                    until: now + self.tap_ack,
                });
                Some(Command::SeekTo(first.position + delta))
            }
            _ => {
                self.last_tap = Some(PendingTap {
                    zone,
                    at: now,
                    position,
                });
                None
            }
        }
    }

    /// Pointer went down on the progress track.
    pub fn scrub_start(&mut self, fraction: f64) -> [Command; 2] {
        self.scrubbing = true;
        [Command::BeginScrub, Command::SeekToFraction(fraction)]
    }

    pub fn scrub_move(&self, fraction: f64) -> Option<Command> {
        self.scrubbing.then_some(Command::SeekToFraction(fraction))
    }

    pub fn scrub_end(&mut self) -> Option<Command> {
        if !self.scrubbing {
            return None;
        }
        self.scrubbing = false;
        Some(Command::EndScrub)
    }

    /// Double-tap acknowledgement to display at `now`, if still active.
    pub fn tap_feedback(&self, now: Instant) -> Option<TapSide> {
        self.ack.filter(|ack| now < ack.until).map(|ack| ack.side)
    }

    pub fn tick(&mut self, now: Instant) {
        if self.ack.is_some_and(|ack| now >= ack.until) {
            self.ack = None;
        }
    }

    /// Drop gesture state tied to the previous unit.
    pub fn reset(&mut self) {
        self.last_tap = None;
        self.ack = None;
        self.scrubbing = false;
    }
}

/// Fraction of the track under a pointer at `x`, clamped to `0.0..=1.0`.
pub fn fraction_from_pointer(x: f64, track_left: f64, track_width: f64) -> Option<f64> {
    if !(track_width.is_finite() && track_width > 0.0 && x.is_finite() && track_left.is_finite()) {
        return None;
    }
    Some(((x - track_left) / track_width).clamp(0.0, 1.0))
}
