//! Player facade.
//!
//! Wires the controller, intro window, input dispatcher, boost manager and
//! presentation state for one mounted player, and routes host events and user
//! input between them.

use std::time::Instant;

use video_player_types::{MediaEvent, NoticeKind, PlayableUnit, PlayerSnapshot};

use crate::boost::{AudioGraphFactory, BoostContext, BoostManager, BoostState, PendingRestore, Reload};
use crate::config::PlayerConfig;
use crate::controller::PlaybackController;
use crate::error::{BoostError, ConfigError, ControlError, LoadError};
use crate::events::{EventHub, MediaEventSink, PlayerEvent};
use crate::input::{Command, InputDispatcher, Key, fraction_from_pointer};
use crate::intro::IntroSkip;
use crate::notice::NoticeBoard;
use crate::presentation::{DisplayEnvironment, Overlay, Presentation};
use crate::session::PlaybackSession;
use crate::status::{TransportState, format_timestamp};
use crate::transport::MediaElement;

const PROXY_FALLBACK_MESSAGE: &str =
    "Volume boost is unavailable for this video. Playback continues at normal volume.";
const BOOST_FAILED_MESSAGE: &str = "Volume boost could not be applied.";

/// Host implementations the player drives.
pub struct PlayerBackends {
    pub element: Box<dyn MediaElement>,
    pub audio_graph: Box<dyn AudioGraphFactory>,
    pub environment: Box<dyn DisplayEnvironment>,
}

/// Host callbacks for the next/previous transport buttons.
#[derive(Default)]
pub struct NavigationHooks {
    pub on_next: Option<Box<dyn FnMut()>>,
    pub on_prev: Option<Box<dyn FnMut()>>,
}

pub struct VideoPlayer {
    config: PlayerConfig,
    session: Option<PlaybackSession>,
    controller: PlaybackController,
    intro: IntroSkip,
    input: InputDispatcher,
    boost: BoostManager,
    overlay: Overlay,
    presentation: Presentation,
    notices: NoticeBoard,
    hub: EventHub,
    hooks: NavigationHooks,
}

impl VideoPlayer {
    /// Mount a player. No unit is loaded until [`VideoPlayer::load_unit`].
    pub fn new(
        config: PlayerConfig,
        backends: PlayerBackends,
        now: Instant,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let controller = PlaybackController::new(backends.element, config.playback_rates.clone());
        let input = InputDispatcher::new(&config);
        let boost = BoostManager::new(backends.audio_graph, config.max_boost);
        let overlay = Overlay::new(config.idle_hide(), now);
        let presentation = Presentation::new(backends.environment);
        Ok(Self {
            config,
            session: None,
            controller,
            intro: IntroSkip::default(),
            input,
            boost,
            overlay,
            presentation,
            notices: NoticeBoard::default(),
            hub: EventHub::new(),
            hooks: NavigationHooks::default(),
        })
    }

    pub fn set_navigation(&mut self, hooks: NavigationHooks) {
        self.hooks = hooks;
    }

    /// Bind a new playable unit.
    ///
    /// All state of the previous unit (boost, proxy, pending restore, gestures,
    /// notices, event subscription) is dropped before the new source loads.
    /// The returned sink is where the host forwards this unit's native events.
    pub fn load_unit(
        &mut self,
        unit: PlayableUnit,
        now: Instant,
    ) -> Result<MediaEventSink, LoadError> {
        if unit.source_url.trim().is_empty() {
            return Err(LoadError::EmptySource);
        }
        self.boost.reset();
        self.input.reset();
        self.notices.clear();
        self.session = None;
        let sink = self.hub.rotate();

        let session = PlaybackSession::new(unit, &self.config.proxy);
        self.intro = IntroSkip::new(session.unit().intro_end_offset_seconds);
        self.controller
            .load_source(session.source_url())
            .map_err(|err| LoadError::Element(err.to_string()))?;
        self.presentation.probe_cast();
        self.overlay.touch(now);
        tracing::info!(
            title = %session.unit().title,
            same_origin = session.same_origin(),
            intro_end = self.intro.offset(),
            "playable unit loaded"
        );
        self.session = Some(session);
        Ok(sink)
    }

    /// Sink of the current subscription.
    pub fn event_sink(&self) -> MediaEventSink {
        self.hub.sink()
    }

    /// Tear the player down; outstanding sinks report disconnection.
    pub fn unmount(self) {
        tracing::debug!(generation = self.hub.generation(), "player unmounted");
    }

    /// Handle every queued host event, then advance timers.
    pub fn pump(&mut self, now: Instant) {
        for event in self.hub.drain() {
            self.handle_event(event, now);
        }
        self.tick(now);
    }

    pub fn handle_event(&mut self, event: PlayerEvent, now: Instant) {
        match event {
            PlayerEvent::FullscreenChanged(active) => {
                self.presentation.on_fullscreen_changed(active)
            }
            PlayerEvent::Media(event) => self.handle_media_event(event, now),
        }
    }

    /// Advance idle-hide and tap acknowledgement timers.
    pub fn tick(&mut self, now: Instant) {
        self.input.tick(now);
        let state = self.controller.state();
        self.overlay.tick(now, state.is_playing, state.is_seeking);
    }

    fn handle_media_event(&mut self, event: MediaEvent, now: Instant) {
        if self.session.is_none() {
            return;
        }
        match &event {
            // The reloading element reports positions of the fresh resource.
            MediaEvent::TimeUpdate { .. } if self.boost.restore_pending() => return,
            MediaEvent::Error { message } => {
                let ctx = self.boost_context();
                self.controller.apply_event(&event);
                self.on_load_error(message, ctx, now);
                return;
            }
            _ => {}
        }

        self.controller.apply_event(&event);
        match event {
            MediaEvent::LoadedMetadata { .. } => self.on_metadata_loaded(now),
            MediaEvent::TimeUpdate { .. } => self.intro.observe(self.controller.state().current_time),
            MediaEvent::Paused | MediaEvent::Ended => self.overlay.touch(now),
            _ => {}
        }
    }

    fn on_metadata_loaded(&mut self, now: Instant) {
        self.controller.reapply_output();
        let outcome = self.boost.on_metadata_loaded();
        if let Some(restore) = outcome.restore {
            self.restore_position(restore);
        }
        if let Some((kind, err)) = outcome.failure {
            tracing::warn!("boost failure: {err}");
            self.notices.push(kind, BOOST_FAILED_MESSAGE);
        }
        if let Some(reload) = outcome.reload {
            self.perform_reload(reload, now);
        }
    }

    fn on_load_error(&mut self, message: &str, ctx: BoostContext, now: Instant) {
        self.overlay.touch(now);
        match self.boost.on_load_error(ctx) {
            Some(reload) => {
                self.notices.push(NoticeKind::ProxyFallback, PROXY_FALLBACK_MESSAGE);
                self.perform_reload(reload, now);
            }
            None => {
                tracing::warn!(%message, "media failed to load");
                self.notices
                    .push(NoticeKind::LoadFailed, format!("Playback failed: {message}"));
            }
        }
    }

    fn restore_position(&mut self, restore: PendingRestore) {
        match self.controller.seek_to(restore.position) {
            Ok(position) => self.intro.observe(position),
            Err(err) => tracing::warn!(position = restore.position, "position restore failed: {err}"),
        }
        if restore.resume {
            if let Err(err) = self.controller.play() {
                tracing::warn!("resume after restore failed: {err}");
            }
        }
    }

    fn perform_reload(&mut self, reload: Reload, now: Instant) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let url = session.reroute(reload.route, &self.config.proxy).to_string();
        tracing::info!(
            route = ?reload.route,
            %url,
            position = reload.restore.position,
            "swapping source"
        );
        match self.controller.load_source(&url) {
            Ok(()) => {
                self.controller.hold_position(reload.restore.position);
                // A drag on the progress bar outlives the swap.
                self.controller.set_seeking(self.input.is_scrubbing());
            }
            Err(err) => {
                let ctx = BoostContext {
                    same_origin: false,
                    position: reload.restore.position,
                    playing: reload.restore.resume,
                };
                self.on_load_error(&err.to_string(), ctx, now);
            }
        }
    }

    fn boost_context(&self) -> BoostContext {
        let state = self.controller.state();
        BoostContext {
            same_origin: self.session.as_ref().is_some_and(|s| s.same_origin()),
            position: state.current_time,
            playing: state.is_playing,
        }
    }

    fn require_session(&self) -> Result<(), ControlError> {
        if self.session.is_none() {
            return Err(ControlError::NoSession);
        }
        Ok(())
    }

    fn ready_to_seek(&self) -> Result<(), ControlError> {
        self.require_session()?;
        if self.boost.restore_pending() {
            return Err(ControlError::RestorePending);
        }
        Ok(())
    }

    /// Play when paused, pause when playing. While a restore is pending the
    /// request is queued as the restore's resume intent.
    pub fn toggle_play(&mut self, now: Instant) -> Result<(), ControlError> {
        self.require_session()?;
        self.overlay.touch(now);
        if let Some(resume) = self.boost.toggle_resume_intent() {
            tracing::debug!(resume, "play/pause queued behind position restore");
            return Ok(());
        }
        self.controller.toggle_play()
    }

    pub fn seek_by(&mut self, delta: f64, now: Instant) -> Result<f64, ControlError> {
        self.ready_to_seek()?;
        self.overlay.touch(now);
        let position = self.controller.seek_by(delta)?;
        self.intro.observe(position);
        Ok(position)
    }

    pub fn seek_to(&mut self, secs: f64, now: Instant) -> Result<f64, ControlError> {
        self.ready_to_seek()?;
        self.overlay.touch(now);
        let position = self.controller.seek_to(secs)?;
        self.intro.observe(position);
        Ok(position)
    }

    pub fn seek_to_fraction(&mut self, fraction: f64, now: Instant) -> Result<f64, ControlError> {
        self.ready_to_seek()?;
        self.overlay.touch(now);
        let position = self.controller.seek_to_fraction(fraction)?;
        self.intro.observe(position);
        Ok(position)
    }

    /// Jump to the end of the intro. Returns `None` when the affordance is not shown.
    pub fn skip_intro(&mut self, now: Instant) -> Result<Option<f64>, ControlError> {
        self.ready_to_seek()?;
        if !self.controller.state().duration_known() {
            return Err(ControlError::MetadataPending);
        }
        let Some(target) = self.intro.skip(self.controller.state().current_time) else {
            return Ok(None);
        };
        self.overlay.touch(now);
        self.controller.seek_to(target).map(Some)
    }

    /// Returns `false` when the rate was already active.
    pub fn set_rate(&mut self, rate: f64) -> Result<bool, ControlError> {
        self.controller.set_rate(rate)
    }

    pub fn set_volume(&mut self, volume: f64, now: Instant) -> Result<f64, ControlError> {
        self.overlay.touch(now);
        self.controller.set_volume(volume)
    }

    pub fn adjust_volume(&mut self, delta: f64, now: Instant) -> Result<f64, ControlError> {
        self.overlay.touch(now);
        self.controller.adjust_volume(delta)
    }

    pub fn toggle_mute(&mut self, now: Instant) -> Result<bool, ControlError> {
        self.overlay.touch(now);
        self.controller.toggle_mute()
    }

    /// Request a gain multiplier. Returns the level now in effect (or pending
    /// behind a proxy reload).
    pub fn set_boost(&mut self, requested: f64, now: Instant) -> Result<u8, BoostError> {
        let level = self.boost.level_from(requested)?;
        if self.session.is_none() {
            return Err(BoostError::NoSession);
        }
        let ctx = self.boost_context();
        match self.boost.request(level, ctx) {
            Ok(Some(reload)) => {
                self.overlay.touch(now);
                self.perform_reload(reload, now);
                Ok(self.boost.level().get())
            }
            Ok(None) => Ok(self.boost.level().get()),
            Err(BoostError::ReloadPending) => Err(BoostError::ReloadPending),
            Err(err) => {
                tracing::warn!(requested, "boost request failed: {err}");
                self.notices.push(NoticeKind::BoostFailed, BOOST_FAILED_MESSAGE);
                Err(err)
            }
        }
    }

    pub fn toggle_fullscreen(&mut self, now: Instant) {
        self.overlay.touch(now);
        self.presentation.toggle_fullscreen();
    }

    /// Open the remote playback picker; failures other than cancellation raise a notice.
    pub fn cast(&mut self) {
        if let Some((kind, message)) = self.presentation.cast() {
            self.notices.push(kind, message);
        }
    }

    /// Ask the host to switch to the next unit. Returns `false` when there is none.
    pub fn next_unit(&mut self) -> bool {
        let has_next = self
            .session
            .as_ref()
            .is_some_and(|s| s.unit().has_next_unit);
        match self.hooks.on_next.as_mut() {
            Some(hook) if has_next => {
                hook();
                true
            }
            _ => false,
        }
    }

    pub fn prev_unit(&mut self) -> bool {
        let has_prev = self
            .session
            .as_ref()
            .is_some_and(|s| s.unit().has_prev_unit);
        match self.hooks.on_prev.as_mut() {
            Some(hook) if has_prev => {
                hook();
                true
            }
            _ => false,
        }
    }

    pub fn dismiss_notice(&mut self, kind: NoticeKind) {
        self.notices.dismiss(kind);
    }

    pub fn set_focus(&mut self, focused: bool) {
        self.input.set_focus(focused);
    }

    /// Keyboard input. Returns `true` when the key was consumed.
    pub fn handle_key(&mut self, key: Key, now: Instant) -> bool {
        if self.input.has_focus() {
            self.overlay.touch(now);
        }
        let Some(command) = self.input.key(key) else {
            return false;
        };
        self.dispatch(command, now);
        true
    }

    /// Tap or click at `x` on a playback surface `width` wide.
    pub fn tap(&mut self, x: f64, width: f64, now: Instant) {
        self.overlay.touch(now);
        let position = self.controller.state().current_time;
        if let Some(command) = self.input.tap(x, width, now, position) {
            self.dispatch(command, now);
        }
    }

    pub fn pointer_moved(&mut self, now: Instant) {
        self.overlay.touch(now);
    }

    /// Pointer down on the progress track.
    pub fn scrub_start(&mut self, x: f64, track_left: f64, track_width: f64, now: Instant) {
        let Some(fraction) = fraction_from_pointer(x, track_left, track_width) else {
            return;
        };
        self.overlay.touch(now);
        for command in self.input.scrub_start(fraction) {
            self.dispatch(command, now);
        }
    }

    pub fn scrub_move(&mut self, x: f64, track_left: f64, track_width: f64, now: Instant) {
        let Some(fraction) = fraction_from_pointer(x, track_left, track_width) else {
            return;
        };
        if let Some(command) = self.input.scrub_move(fraction) {
            self.dispatch(command, now);
        }
    }

    pub fn scrub_end(&mut self, now: Instant) {
        if let Some(command) = self.input.scrub_end() {
            self.dispatch(command, now);
        }
    }

    fn dispatch(&mut self, command: Command, now: Instant) {
        let result = match command {
            Command::TogglePlay => self.toggle_play(now),
            Command::SeekBy(delta) => self.seek_by(delta, now).map(|_| ()),
            Command::SeekTo(secs) => self.seek_to(secs, now).map(|_| ()),
            Command::SeekToFraction(fraction) => self.seek_to_fraction(fraction, now).map(|_| ()),
            Command::AdjustVolume(delta) => self.adjust_volume(delta, now).map(|_| ()),
            Command::ToggleFullscreen => {
                self.toggle_fullscreen(now);
                Ok(())
            }
            Command::ToggleMute => self.toggle_mute(now).map(|_| ()),
            Command::BeginScrub => {
                self.controller.set_seeking(true);
                Ok(())
            }
            Command::EndScrub => {
                self.controller.set_seeking(false);
                self.overlay.touch(now);
                Ok(())
            }
        };
        if let Err(err) = result {
            tracing::debug!(?command, "input ignored: {err}");
        }
    }

    pub fn transport(&self) -> &TransportState {
        self.controller.state()
    }

    pub fn session(&self) -> Option<&PlaybackSession> {
        self.session.as_ref()
    }

    pub fn boost_state(&self) -> BoostState {
        self.boost.state()
    }

    pub fn intro_visible(&self) -> bool {
        self.session.is_some() && self.intro.visible(self.controller.state().current_time)
    }

    pub fn controls_visible(&self) -> bool {
        self.overlay.visible()
    }

    pub fn snapshot(&self, now: Instant) -> PlayerSnapshot {
        let state = self.controller.state();
        let unit = self.session.as_ref().map(|s| s.unit());
        PlayerSnapshot {
            title: unit.map(|u| u.title.clone()),
            subtitle: unit.and_then(|u| u.subtitle.clone()),
            poster_url: unit.and_then(|u| u.poster_url.clone()),
            source_url: self.session.as_ref().map(|s| s.source_url().to_string()),
            current_time: state.current_time,
            duration: if state.duration_known() {
                state.duration
            } else {
                0.0
            },
            progress: state.progress(),
            elapsed_label: format_timestamp(state.current_time),
            duration_label: format_timestamp(state.duration),
            is_playing: state.is_playing,
            is_seeking: state.is_seeking,
            is_buffering: state.is_buffering,
            playback_rate: state.playback_rate,
            playback_rates: self.controller.rates().to_vec(),
            volume: state.volume,
            muted: state.displayed_muted(),
            intro_skip_visible: self.intro_visible(),
            controls_visible: self.overlay.visible(),
            fullscreen: self.presentation.fullscreen(),
            fullscreen_available: self.presentation.fullscreen_available(),
            cast_available: self.presentation.cast_available(),
            boost_level: self.boost.level().get(),
            max_boost: self.boost.max_level(),
            using_proxy: self.boost.using_proxy(),
            restore_pending: self.boost.restore_pending(),
            tap_feedback: self.input.tap_feedback(now),
            has_next: unit.is_some_and(|u| u.has_next_unit),
            has_prev: unit.is_some_and(|u| u.has_prev_unit),
            notices: self.notices.active().to_vec(),
        }
    }
}
