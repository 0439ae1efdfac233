/// Transport state mirrored from the media element.
///
/// Position, duration, playing and buffering follow element events. Rate,
/// volume and mute are user settings that outlive a source swap.
#[derive(Clone, Debug, PartialEq)]
pub struct TransportState {
    /// Playback position in seconds.
    pub current_time: f64,
    /// Duration in seconds; `0.0` (or NaN from the element) while unknown.
    pub duration: f64,
    /// Confirmed by `Playing` / `Paused` events, never set optimistically.
    pub is_playing: bool,
    /// A progress-bar scrub is in progress.
    pub is_seeking: bool,
    pub is_buffering: bool,
    pub playback_rate: f64,
    /// Requested output volume in `0.0..=1.0`.
    pub volume: f64,
    /// Explicit mute flag, independent of `volume`.
    pub muted: bool,
    /// Last non-zero volume, restored when un-muting from zero.
    pub last_audible_volume: f64,
}

impl Default for TransportState {
    fn default() -> Self {
        Self {
            current_time: 0.0,
            duration: 0.0,
            is_playing: false,
            is_seeking: false,
            is_buffering: false,
            playback_rate: 1.0,
            volume: 1.0,
            muted: false,
            last_audible_volume: 1.0,
        }
    }
}

impl TransportState {
    /// Whether the element reported a usable duration.
    pub fn duration_known(&self) -> bool {
        self.duration.is_finite() && self.duration > 0.0
    }

    /// Clamp a target position into `[0, duration]`.
    ///
    /// Returns `None` while the duration is unknown or the target is not a number.
    pub fn clamp_time(&self, secs: f64) -> Option<f64> {
        if !self.duration_known() || secs.is_nan() {
            return None;
        }
        Some(secs.clamp(0.0, self.duration))
    }

    /// Muted as displayed to the user.
    pub fn displayed_muted(&self) -> bool {
        self.muted || self.volume <= 0.0
    }

    /// Played fraction for the progress bar.
    pub fn progress(&self) -> f64 {
        if self.duration_known() {
            (self.current_time / self.duration).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Forget everything tied to the previous resource, keep user settings.
    pub fn reset_for_source(&mut self) {
        self.current_time = 0.0;
        self.duration = 0.0;
        self.is_playing = false;
        self.is_seeking = false;
        self.is_buffering = true;
    }
}

/// Format seconds as `m:ss`, or `h:mm:ss` from one hour up.
pub fn format_timestamp(secs: f64) -> String {
    let total = if secs.is_finite() && secs > 0.0 {
        secs.floor() as u64
    } else {
        0
    };
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes}:{seconds:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_time_requires_known_duration() {
        let mut state = TransportState::default();
        assert_eq!(state.clamp_time(5.0), None);

        state.duration = f64::NAN;
        assert_eq!(state.clamp_time(5.0), None);

        state.duration = 100.0;
        assert_eq!(state.clamp_time(-3.0), Some(0.0));
        assert_eq!(state.clamp_time(150.0), Some(100.0));
        assert_eq!(state.clamp_time(f64::NAN), None);
    }

    #[test]
    fn zero_volume_displays_as_muted() {
        let mut state = TransportState::default();
        assert!(!state.displayed_muted());
        state.volume = 0.0;
        assert!(state.displayed_muted());
        assert!(!state.muted);
    }

    #[test]
    fn reset_for_source_keeps_user_settings() {
        let mut state = TransportState {
            current_time: 40.0,
            duration: 90.0,
            is_playing: true,
            playback_rate: 1.5,
            volume: 0.4,
            muted: true,
            ..TransportState::default()
        };
        state.reset_for_source();
        assert_eq!(state.current_time, 0.0);
        assert_eq!(state.duration, 0.0);
        assert!(!state.is_playing);
        assert_eq!(state.playback_rate, 1.5);
        assert_eq!(state.volume, 0.4);
        assert!(state.muted);
    }

    #[test]
    fn format_timestamp_switches_to_hours() {
        assert_eq!(format_timestamp(0.0), "0:00");
        assert_eq!(format_timestamp(65.9), "1:05");
        assert_eq!(format_timestamp(3909.0), "1:05:09");
        assert_eq!(format_timestamp(f64::NAN), "0:00");
    }
}
