//! Headless video player core.
//!
//! The host binds a media element, an audio graph and a display environment
//! through the traits in [`transport`], [`boost`] and [`presentation`], then
//! drives [`player::VideoPlayer`] with user input and the element's native
//! events. Everything the host renders comes back as a
//! [`video_player_types::PlayerSnapshot`].

pub mod boost;
pub mod config;
pub mod controller;
pub mod error;
pub mod events;
pub mod input;
pub mod intro;
pub mod notice;
pub mod player;
pub mod presentation;
pub mod session;
pub mod sim;
pub mod status;
pub mod transport;

pub use video_player_types::{
    MediaEvent, Notice, NoticeKind, PlayableUnit, PlayerSnapshot, TapSide,
};
