/// Skip-intro window for one playable unit.
///
/// Visible while the position is before the configured intro end, until
/// dismissed. Dismissal (skip, or playback crossing the end) lasts until the
/// next unit is armed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IntroSkip {
    offset: f64,
    dismissed: bool,
}

impl IntroSkip {
    /// Arm for a unit; missing, negative or non-finite offsets disable the window.
    pub fn new(offset: Option<f64>) -> Self {
        let offset = match offset {
            Some(secs) if secs.is_finite() && secs > 0.0 => secs,
            Some(secs) if secs != 0.0 => {
                tracing::warn!(offset = secs, "ignoring invalid intro end offset");
                0.0
            }
            _ => 0.0,
        };
        Self {
            offset,
            dismissed: false,
        }
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn is_dismissed(&self) -> bool {
        self.dismissed
    }

    pub fn visible(&self, current_time: f64) -> bool {
        !self.dismissed && self.offset > 0.0 && current_time < self.offset
    }

    /// Observe a position; crossing the intro end dismisses the window.
    pub fn observe(&mut self, current_time: f64) {
        if !self.dismissed && self.offset > 0.0 && current_time >= self.offset {
            self.dismissed = true;
            tracing::debug!(offset = self.offset, "intro window passed");
        }
    }

    /// Dismiss and return the seek target, or `None` when nothing is visible.
    pub fn skip(&mut self, current_time: f64) -> Option<f64> {
        if !self.visible(current_time) {
            return None;
        }
        self.dismissed = true;
        Some(self.offset)
    }
}
