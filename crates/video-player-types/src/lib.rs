use serde::{Deserialize, Serialize};

/// One watchable item handed to the player by the catalog layer.
///
/// Field names follow the camelCase descriptors produced by the content
/// services, so a descriptor can be deserialized straight from their JSON.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlayableUnit {
    /// Direct URL of the media resource.
    pub source_url: String,
    /// Poster image shown before playback starts.
    #[serde(default)]
    pub poster_url: Option<String>,
    /// Primary display title (movie or series name).
    pub title: String,
    /// Secondary line, typically the episode label.
    #[serde(default)]
    pub subtitle: Option<String>,
    /// End of the skippable intro in seconds; `None` or `0` disables the affordance.
    #[serde(default)]
    pub intro_end_offset_seconds: Option<f64>,
    /// Whether the host can switch to a following unit.
    #[serde(default)]
    pub has_next_unit: bool,
    /// Whether the host can switch to a preceding unit.
    #[serde(default)]
    pub has_prev_unit: bool,
}

/// Native events reported by the host's media element.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MediaEvent {
    /// Metadata is available; `duration` may be NaN for live sources.
    LoadedMetadata { duration: f64 },
    /// Playback position advanced (or jumped).
    TimeUpdate { current_time: f64 },
    /// Playback stalled waiting for data.
    Waiting,
    /// Enough data is buffered to continue.
    CanPlay,
    /// The element started playing.
    Playing,
    /// The element paused.
    Paused,
    /// Playback reached the end of the resource.
    Ended,
    /// The resource failed to load or decode.
    Error { message: String },
}

/// Side of the playback surface acknowledged after a double-tap seek.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TapSide {
    Rewind,
    Forward,
}

/// Category of a user-visible, non-fatal notice.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    /// The proxy failed; playback continues on the direct source without amplification.
    ProxyFallback,
    /// The audio graph could not be built or driven.
    BoostFailed,
    /// The media resource could not be loaded.
    LoadFailed,
    /// No remote playback device was found.
    CastNotFound,
    /// Remote playback is blocked because the page is not a secure context.
    CastInsecureContext,
    /// The browser does not implement remote playback.
    CastUnsupported,
    /// Remote playback failed for another reason.
    CastFailed,
}

/// Dismissible message shown over the player.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

/// Everything a host needs to render the player for one frame.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct PlayerSnapshot {
    /// Title of the loaded unit, if any.
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub poster_url: Option<String>,
    /// URL currently bound to the media element (direct or proxied).
    pub source_url: Option<String>,
    /// Playback position in seconds.
    pub current_time: f64,
    /// Duration in seconds; `0` until metadata arrives.
    pub duration: f64,
    /// Played fraction for the progress bar, `0.0..=1.0`.
    pub progress: f64,
    /// Position formatted for display, for example `1:05:09`.
    pub elapsed_label: String,
    /// Duration formatted for display.
    pub duration_label: String,
    pub is_playing: bool,
    pub is_seeking: bool,
    pub is_buffering: bool,
    pub playback_rate: f64,
    /// Rates offered in the speed menu.
    pub playback_rates: Vec<f64>,
    /// Output volume in `0.0..=1.0`.
    pub volume: f64,
    /// `true` when muted explicitly or when volume is zero.
    pub muted: bool,
    pub intro_skip_visible: bool,
    pub controls_visible: bool,
    pub fullscreen: bool,
    /// Whether the fullscreen control should be rendered at all.
    pub fullscreen_available: bool,
    /// Whether the cast control should be rendered at all.
    pub cast_available: bool,
    /// Active gain multiplier; `1` means native output.
    pub boost_level: u8,
    /// Highest level the boost control offers.
    pub max_boost: u8,
    pub using_proxy: bool,
    /// A source swap is waiting for metadata before restoring the position.
    pub restore_pending: bool,
    /// Transient double-tap acknowledgement.
    pub tap_feedback: Option<TapSide>,
    pub has_next: bool,
    pub has_prev: bool,
    pub notices: Vec<Notice>,
}
