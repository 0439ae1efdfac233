//! Media element abstraction for dispatching transport commands.
//!
//! Implementations translate player operations into calls on the host's
//! native media element. Results of those calls arrive later as
//! [`crate::MediaEvent`]s through [`crate::events::MediaEventSink`].

use anyhow::Result;

/// The host's media element.
///
/// Every method is a request: the element confirms state changes through its
/// event stream (for example `play` is confirmed by `MediaEvent::Playing`).
pub trait MediaElement {
    /// Replace the resource URL; the element restarts loading from position 0.
    fn set_source(&mut self, url: &str) -> Result<()>;
    fn play(&mut self) -> Result<()>;
    fn pause(&mut self) -> Result<()>;
    /// Jump to an absolute position in seconds.
    fn set_current_time(&mut self, secs: f64) -> Result<()>;
    fn set_playback_rate(&mut self, rate: f64) -> Result<()>;
    /// Native volume in `0.0..=1.0`.
    fn set_volume(&mut self, volume: f64) -> Result<()>;
    fn set_muted(&mut self, muted: bool) -> Result<()>;
}
