//! Error types returned by player operations.
//!
//! The player turns the ones a user should see into notices.

use thiserror::Error;

/// Invalid player configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid player config: {0}")]
    Invalid(String),
}

/// Transport command that could not be applied.
#[derive(Debug, Error, PartialEq)]
pub enum ControlError {
    /// Duration is not known yet, so positions cannot be computed.
    #[error("media metadata not loaded yet")]
    MetadataPending,
    /// A source swap is still waiting to restore the previous position.
    #[error("position restore pending after source swap")]
    RestorePending,
    /// No unit is loaded.
    #[error("no playable unit loaded")]
    NoSession,
    #[error("playback rate {0} is not allowed")]
    RateNotAllowed(f64),
    /// Target position, fraction or volume is not a number.
    #[error("invalid target value {0}")]
    InvalidTarget(f64),
    /// The media element refused the request.
    #[error("media element error: {0}")]
    Element(String),
}

/// Audio boost request that was rejected or failed.
#[derive(Debug, Error, PartialEq)]
pub enum BoostError {
    /// Requested level is not an integer within `1..=max`.
    #[error("boost level {requested} is outside 1..={max}")]
    InvalidLevel { requested: f64, max: u8 },
    /// The source is reloading back to its direct URL.
    #[error("source reload in progress")]
    ReloadPending,
    /// The processing graph could not be built.
    #[error("audio graph construction failed: {0}")]
    Graph(String),
    /// The gain could not be applied to the graph.
    #[error("gain update failed: {0}")]
    Gain(String),
    #[error("no playable unit loaded")]
    NoSession,
}

/// Failure to bind a playable unit to the element.
#[derive(Debug, Error, PartialEq)]
pub enum LoadError {
    #[error("playable unit has an empty source url")]
    EmptySource,
    #[error("media element rejected source: {0}")]
    Element(String),
}

/// Outcome of a remote playback prompt that did not connect.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CastFailure {
    #[error("no remote playback device found")]
    NotFound,
    /// The user closed the device picker.
    #[error("remote playback cancelled")]
    Cancelled,
    #[error("remote playback requires a secure context")]
    InsecureContext,
    #[error("remote playback not supported")]
    NotSupported,
    #[error("remote playback failed: {0}")]
    Other(String),
}
