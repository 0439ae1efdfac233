//! In-memory backends for headless runs and tests.
//!
//! Each backend records the calls it receives in shared state, so a clone kept
//! by the caller can inspect what the player did after handing the other clone
//! to [`crate::player::VideoPlayer`].

use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{Result, anyhow};

use crate::boost::{AudioGraphFactory, GainControl};
use crate::error::CastFailure;
use crate::presentation::DisplayEnvironment;
use crate::transport::MediaElement;

fn lock<T>(inner: &Mutex<T>) -> MutexGuard<'_, T> {
    inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// One call received by [`SimMediaElement`].
#[derive(Clone, Debug, PartialEq)]
pub enum ElementCall {
    SetSource(String),
    Play,
    Pause,
    SetCurrentTime(f64),
    SetPlaybackRate(f64),
    SetVolume(f64),
    SetMuted(bool),
}

/// State of the simulated media element.
#[derive(Clone, Debug)]
pub struct SimElementState {
    pub source: Option<String>,
    pub current_time: f64,
    pub paused: bool,
    pub playback_rate: f64,
    pub volume: f64,
    pub muted: bool,
    /// Every call in order of arrival.
    pub calls: Vec<ElementCall>,
    /// Make `play` fail, like a browser blocking autoplay.
    pub fail_play: bool,
}

impl Default for SimElementState {
    fn default() -> Self {
        Self {
            source: None,
            current_time: 0.0,
            paused: true,
            playback_rate: 1.0,
            volume: 1.0,
            muted: false,
            calls: Vec::new(),
            fail_play: false,
        }
    }
}

/// Media element that only records requests.
#[derive(Clone, Debug, Default)]
pub struct SimMediaElement {
    inner: Arc<Mutex<SimElementState>>,
}

impl SimMediaElement {
    pub fn new(state: SimElementState) -> Self {
        Self {
            inner: Arc::new(Mutex::new(state)),
        }
    }

    pub fn snapshot(&self) -> SimElementState {
        lock(&self.inner).clone()
    }

    pub fn calls(&self) -> Vec<ElementCall> {
        lock(&self.inner).calls.clone()
    }

    /// Source URLs in the order they were bound.
    pub fn sources(&self) -> Vec<String> {
        lock(&self.inner)
            .calls
            .iter()
            .filter_map(|call| match call {
                ElementCall::SetSource(url) => Some(url.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn set_fail_play(&self, fail: bool) {
        lock(&self.inner).fail_play = fail;
    }
}

impl MediaElement for SimMediaElement {
    fn set_source(&mut self, url: &str) -> Result<()> {
        let mut s = lock(&self.inner);
        s.calls.push(ElementCall::SetSource(url.to_string()));
        s.source = Some(url.to_string());
        s.current_time = 0.0;
        s.paused = true;
        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        let mut s = lock(&self.inner);
        s.calls.push(ElementCall::Play);
        if s.fail_play {
            return Err(anyhow!("play() rejected"));
        }
        s.paused = false;
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        let mut s = lock(&self.inner);
        s.calls.push(ElementCall::Pause);
        s.paused = true;
        Ok(())
    }

    fn set_current_time(&mut self, secs: f64) -> Result<()> {
        let mut s = lock(&self.inner);
        s.calls.push(ElementCall::SetCurrentTime(secs));
        s.current_time = secs;
        Ok(())
    }

    fn set_playback_rate(&mut self, rate: f64) -> Result<()> {
        let mut s = lock(&self.inner);
        s.calls.push(ElementCall::SetPlaybackRate(rate));
        s.playback_rate = rate;
        Ok(())
    }

    fn set_volume(&mut self, volume: f64) -> Result<()> {
        let mut s = lock(&self.inner);
        s.calls.push(ElementCall::SetVolume(volume));
        s.volume = volume;
        Ok(())
    }

    fn set_muted(&mut self, muted: bool) -> Result<()> {
        let mut s = lock(&self.inner);
        s.calls.push(ElementCall::SetMuted(muted));
        s.muted = muted;
        Ok(())
    }
}

/// State of the simulated audio graph.
#[derive(Clone, Debug)]
pub struct SimGraphState {
    /// Number of successful graph constructions.
    pub connects: u32,
    /// Current gain of the gain node.
    pub gain: f32,
    /// Every gain applied, in order.
    pub gains: Vec<f32>,
    pub fail_connect: bool,
    pub fail_gain: bool,
}

impl Default for SimGraphState {
    fn default() -> Self {
        Self {
            connects: 0,
            gain: 1.0,
            gains: Vec::new(),
            fail_connect: false,
            fail_gain: false,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct SimAudioGraph {
    inner: Arc<Mutex<SimGraphState>>,
}

impl SimAudioGraph {
    pub fn new(state: SimGraphState) -> Self {
        Self {
            inner: Arc::new(Mutex::new(state)),
        }
    }

    pub fn snapshot(&self) -> SimGraphState {
        lock(&self.inner).clone()
    }

    pub fn set_fail_gain(&self, fail: bool) {
        lock(&self.inner).fail_gain = fail;
    }

    pub fn set_fail_connect(&self, fail: bool) {
        lock(&self.inner).fail_connect = fail;
    }
}

impl AudioGraphFactory for SimAudioGraph {
    fn connect(&mut self) -> Result<Box<dyn GainControl>> {
        let mut s = lock(&self.inner);
        if s.fail_connect {
            return Err(anyhow!("audio context unavailable"));
        }
        s.connects += 1;
        s.gain = 1.0;
        Ok(Box::new(SimGainNode {
            inner: self.inner.clone(),
        }))
    }
}

struct SimGainNode {
    inner: Arc<Mutex<SimGraphState>>,
}

impl GainControl for SimGainNode {
    fn set_gain(&mut self, gain: f32) -> Result<()> {
        let mut s = lock(&self.inner);
        if s.fail_gain {
            return Err(anyhow!("gain node rejected value {gain}"));
        }
        s.gain = gain;
        s.gains.push(gain);
        Ok(())
    }
}

/// State of the simulated display environment.
#[derive(Clone, Debug)]
pub struct SimEnvState {
    pub fullscreen_supported: bool,
    pub remote_playback_supported: bool,
    /// Result of the next cast prompt; `None` connects.
    pub cast_outcome: Option<CastFailure>,
    pub fullscreen_requests: u32,
    pub fullscreen_exits: u32,
    pub cast_prompts: u32,
}

impl Default for SimEnvState {
    fn default() -> Self {
        Self {
            fullscreen_supported: true,
            remote_playback_supported: true,
            cast_outcome: None,
            fullscreen_requests: 0,
            fullscreen_exits: 0,
            cast_prompts: 0,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct SimEnvironment {
    inner: Arc<Mutex<SimEnvState>>,
}

impl SimEnvironment {
    pub fn new(state: SimEnvState) -> Self {
        Self {
            inner: Arc::new(Mutex::new(state)),
        }
    }

    pub fn snapshot(&self) -> SimEnvState {
        lock(&self.inner).clone()
    }

    pub fn set_cast_outcome(&self, outcome: Option<CastFailure>) {
        lock(&self.inner).cast_outcome = outcome;
    }
}

impl DisplayEnvironment for SimEnvironment {
    fn fullscreen_supported(&self) -> bool {
        lock(&self.inner).fullscreen_supported
    }

    fn request_fullscreen(&mut self) -> Result<()> {
        let mut s = lock(&self.inner);
        if !s.fullscreen_supported {
            return Err(anyhow!("fullscreen not supported"));
        }
        s.fullscreen_requests += 1;
        Ok(())
    }

    fn exit_fullscreen(&mut self) -> Result<()> {
        lock(&self.inner).fullscreen_exits += 1;
        Ok(())
    }

    fn remote_playback_supported(&self) -> bool {
        lock(&self.inner).remote_playback_supported
    }

    fn prompt_remote_playback(&mut self) -> std::result::Result<(), CastFailure> {
        let mut s = lock(&self.inner);
        s.cast_prompts += 1;
        match s.cast_outcome.clone() {
            Some(failure) => Err(failure),
            None => Ok(()),
        }
    }
}
