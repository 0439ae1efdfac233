//! Audio boost and proxy fallback.
//!
//! Amplification beyond the element's native ceiling needs an audio graph
//! (element source → gain → destination). Browsers only let that graph read
//! same-origin media, so a cross-origin source is first reloaded through the
//! same-origin proxy, and the playback position is restored once metadata for
//! the proxied resource arrives.
//!
//! The manager never touches the media element itself: transitions that need
//! a reload return a [`Reload`] for the player to carry out.

use video_player_types::NoticeKind;

use crate::error::BoostError;
use crate::session::SourceRoute;

/// Host hook that routes the media element through a gain stage.
pub trait AudioGraphFactory {
    /// Build the graph. Called at most once per player on success.
    fn connect(&mut self) -> anyhow::Result<Box<dyn GainControl>>;
}

/// Gain stage of a connected graph.
pub trait GainControl {
    fn set_gain(&mut self, gain: f32) -> anyhow::Result<()>;
}

/// Validated gain multiplier; `1` is native output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct BoostLevel(u8);

impl BoostLevel {
    pub const UNITY: BoostLevel = BoostLevel(1);

    /// Accept integer levels within `1..=max`.
    pub fn new(requested: f64, max: u8) -> Result<Self, BoostError> {
        let invalid = BoostError::InvalidLevel { requested, max };
        if !requested.is_finite() || requested.fract() != 0.0 {
            return Err(invalid);
        }
        if requested < 1.0 || requested > f64::from(max) {
            return Err(invalid);
        }
        Ok(BoostLevel(requested as u8))
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn is_unity(self) -> bool {
        self.0 == 1
    }

    fn gain(self) -> f32 {
        f32::from(self.0)
    }
}

/// Position and play intent captured before a source swap.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PendingRestore {
    pub position: f64,
    /// Resume playback once the position is restored.
    pub resume: bool,
}

/// Source swap requested by the manager.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Reload {
    pub route: SourceRoute,
    pub restore: PendingRestore,
}

/// Boost state. Proxy routing only exists together with a level above unity,
/// except while `Reverting` back to the direct source.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BoostState {
    /// Native output, direct source.
    Unity,
    /// Gain applied through the graph on the direct source.
    Direct { level: BoostLevel },
    /// Source routed through the proxy. `restore` is set until metadata of the
    /// proxied source arrives; the gain is applied after that.
    Proxy {
        level: BoostLevel,
        restore: Option<PendingRestore>,
    },
    /// Reloading the direct source at unity gain.
    Reverting { restore: PendingRestore },
}

/// What the player knows about playback when a boost is requested.
#[derive(Clone, Copy, Debug)]
pub struct BoostContext {
    pub same_origin: bool,
    pub position: f64,
    pub playing: bool,
}

/// Result of metadata arriving for the current source.
#[derive(Debug, Default, PartialEq)]
pub struct MetadataOutcome {
    /// Position to restore now.
    pub restore: Option<PendingRestore>,
    /// Follow-up swap when the gain could not be applied on the proxied source.
    pub reload: Option<Reload>,
    /// Failure to surface to the user.
    pub failure: Option<(NoticeKind, BoostError)>,
}

/// Graph built on first use, reused for the player's lifetime.
struct LazyGraph {
    factory: Box<dyn AudioGraphFactory>,
    gain: Option<Box<dyn GainControl>>,
    constructed: bool,
}

impl LazyGraph {
    fn new(factory: Box<dyn AudioGraphFactory>) -> Self {
        Self {
            factory,
            gain: None,
            constructed: false,
        }
    }

    fn ensure(&mut self) -> Result<&mut Box<dyn GainControl>, BoostError> {
        if !self.constructed {
            let gain = self
                .factory
                .connect()
                .map_err(|err| BoostError::Graph(format!("{err:#}")))?;
            self.gain = Some(gain);
            self.constructed = true;
            tracing::info!("audio graph constructed");
        }
        self.gain
            .as_mut()
            .ok_or_else(|| BoostError::Graph("graph missing after construction".into()))
    }

    fn apply(&mut self, level: BoostLevel) -> Result<(), BoostError> {
        self.ensure()?
            .set_gain(level.gain())
            .map_err(|err| BoostError::Gain(format!("{err:#}")))
    }

    /// Return an existing graph to unity; no-op before construction.
    fn reset(&mut self) {
        if let Some(gain) = self.gain.as_mut() {
            if let Err(err) = gain.set_gain(1.0) {
                tracing::warn!("failed to reset gain to unity: {err:#}");
            }
        }
    }
}

pub struct BoostManager {
    state: BoostState,
    graph: LazyGraph,
    max_level: u8,
}

impl BoostManager {
    pub fn new(factory: Box<dyn AudioGraphFactory>, max_level: u8) -> Self {
        Self {
            state: BoostState::Unity,
            graph: LazyGraph::new(factory),
            max_level,
        }
    }

    pub fn state(&self) -> BoostState {
        self.state
    }

    pub fn max_level(&self) -> u8 {
        self.max_level
    }

    /// Parse a requested level against this manager's maximum.
    pub fn level_from(&self, requested: f64) -> Result<BoostLevel, BoostError> {
        BoostLevel::new(requested, self.max_level)
    }

    pub fn level(&self) -> BoostLevel {
        match self.state {
            BoostState::Direct { level } | BoostState::Proxy { level, .. } => level,
            BoostState::Unity | BoostState::Reverting { .. } => BoostLevel::UNITY,
        }
    }

    pub fn using_proxy(&self) -> bool {
        matches!(self.state, BoostState::Proxy { .. })
    }

    pub fn pending_restore(&self) -> Option<PendingRestore> {
        match self.state {
            BoostState::Proxy { restore, .. } => restore,
            BoostState::Reverting { restore } => Some(restore),
            BoostState::Unity | BoostState::Direct { .. } => None,
        }
    }

    pub fn restore_pending(&self) -> bool {
        self.pending_restore().is_some()
    }

    pub fn graph_constructed(&self) -> bool {
        self.graph.constructed
    }

    /// Flip the resume intent of a pending restore, queuing play/pause behind it.
    /// Returns the new intent, or `None` when no restore is pending.
    pub fn toggle_resume_intent(&mut self) -> Option<bool> {
        match &mut self.state {
            BoostState::Proxy {
                restore: Some(restore),
                ..
            }
            | BoostState::Reverting { restore } => {
                restore.resume = !restore.resume;
                Some(restore.resume)
            }
            _ => None,
        }
    }

    /// Apply a validated level. Returns a reload when the source must be swapped.
    ///
    /// On error the state is unchanged.
    pub fn request(
        &mut self,
        level: BoostLevel,
        ctx: BoostContext,
    ) -> Result<Option<Reload>, BoostError> {
        let here = PendingRestore {
            position: ctx.position,
            resume: ctx.playing,
        };
        match (self.state, level.is_unity()) {
            (BoostState::Unity, true) | (BoostState::Reverting { .. }, true) => Ok(None),
            (BoostState::Reverting { .. }, false) => Err(BoostError::ReloadPending),
            (BoostState::Direct { level: current }, _) if current == level => Ok(None),
            (BoostState::Direct { .. }, true) => {
                self.graph.apply(level)?;
                self.state = BoostState::Unity;
                tracing::info!("boost disengaged");
                Ok(None)
            }
            (BoostState::Direct { .. }, false) => {
                self.graph.apply(level)?;
                self.state = BoostState::Direct { level };
                tracing::info!(level = level.get(), "boost level changed");
                Ok(None)
            }
            (BoostState::Unity, false) => {
                if self.graph.constructed || ctx.same_origin {
                    self.graph.apply(level)?;
                    self.state = BoostState::Direct { level };
                    tracing::info!(level = level.get(), "boost engaged on direct source");
                    return Ok(None);
                }
                self.state = BoostState::Proxy {
                    level,
                    restore: Some(here),
                };
                tracing::info!(
                    level = level.get(),
                    position = here.position,
                    "cross-origin source, reloading through proxy"
                );
                Ok(Some(Reload {
                    route: SourceRoute::Proxied,
                    restore: here,
                }))
            }
            (
                BoostState::Proxy {
                    restore: Some(restore),
                    ..
                },
                true,
            ) => {
                self.state = BoostState::Reverting { restore };
                tracing::info!("boost cancelled before proxy load, reverting to direct source");
                Ok(Some(Reload {
                    route: SourceRoute::Direct,
                    restore,
                }))
            }
            (
                BoostState::Proxy {
                    restore: Some(restore),
                    ..
                },
                false,
            ) => {
                self.state = BoostState::Proxy {
                    level,
                    restore: Some(restore),
                };
                Ok(None)
            }
            (BoostState::Proxy { restore: None, .. }, true) => {
                self.graph.reset();
                self.state = BoostState::Reverting { restore: here };
                tracing::info!(position = here.position, "boost disengaged, reverting to direct source");
                Ok(Some(Reload {
                    route: SourceRoute::Direct,
                    restore: here,
                }))
            }
            (
                BoostState::Proxy {
                    level: current,
                    restore: None,
                },
                false,
            ) => {
                if current != level {
                    self.graph.apply(level)?;
                    self.state = BoostState::Proxy {
                        level,
                        restore: None,
                    };
                    tracing::info!(level = level.get(), "boost level changed on proxied source");
                }
                Ok(None)
            }
        }
    }

    /// Metadata of the current source is loaded.
    pub fn on_metadata_loaded(&mut self) -> MetadataOutcome {
        match self.state {
            BoostState::Proxy {
                level,
                restore: Some(restore),
            } => match self.graph.apply(level) {
                Ok(()) => {
                    self.state = BoostState::Proxy {
                        level,
                        restore: None,
                    };
                    tracing::info!(level = level.get(), "boost applied on proxied source");
                    MetadataOutcome {
                        restore: Some(restore),
                        ..MetadataOutcome::default()
                    }
                }
                Err(err) => {
                    tracing::warn!("boost failed on proxied source, reverting: {err}");
                    self.graph.reset();
                    self.state = BoostState::Reverting { restore };
                    MetadataOutcome {
                        restore: None,
                        reload: Some(Reload {
                            route: SourceRoute::Direct,
                            restore,
                        }),
                        failure: Some((NoticeKind::BoostFailed, err)),
                    }
                }
            },
            BoostState::Reverting { restore } => {
                self.state = BoostState::Unity;
                tracing::debug!(position = restore.position, "direct source restored");
                MetadataOutcome {
                    restore: Some(restore),
                    ..MetadataOutcome::default()
                }
            }
            BoostState::Unity | BoostState::Direct { .. } | BoostState::Proxy { .. } => {
                MetadataOutcome::default()
            }
        }
    }

    /// The current source failed to load.
    ///
    /// While on the proxy this falls back to the direct source at unity gain,
    /// resuming from the pending restore or from `ctx`. Any other failure
    /// abandons a pending reload and is left to the caller to surface.
    pub fn on_load_error(&mut self, ctx: BoostContext) -> Option<Reload> {
        match self.state {
            BoostState::Proxy { restore, .. } => {
                let restore = restore.unwrap_or(PendingRestore {
                    position: ctx.position,
                    resume: ctx.playing,
                });
                self.graph.reset();
                self.state = BoostState::Reverting { restore };
                tracing::warn!(
                    position = restore.position,
                    "proxy failed to load, falling back to direct source"
                );
                Some(Reload {
                    route: SourceRoute::Direct,
                    restore,
                })
            }
            BoostState::Reverting { .. } => {
                self.state = BoostState::Unity;
                None
            }
            BoostState::Unity | BoostState::Direct { .. } => None,
        }
    }

    /// Forget everything tied to the current unit. The graph itself survives.
    pub fn reset(&mut self) {
        if self.state != BoostState::Unity {
            tracing::debug!(state = ?self.state, "dropping boost state for unit switch");
        }
        self.graph.reset();
        self.state = BoostState::Unity;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimAudioGraph;

    fn manager() -> (BoostManager, SimAudioGraph) {
        let graph = SimAudioGraph::default();
        (BoostManager::new(Box::new(graph.clone()), 5), graph)
    }

    fn level(n: f64) -> BoostLevel {
        BoostLevel::new(n, 5).unwrap()
    }

    fn ctx(same_origin: bool, position: f64, playing: bool) -> BoostContext {
        BoostContext {
            same_origin,
            position,
            playing,
        }
    }

    #[test]
    fn level_rejects_fractions_and_out_of_range() {
        assert!(BoostLevel::new(2.5, 5).is_err());
        assert!(BoostLevel::new(0.0, 5).is_err());
        assert!(BoostLevel::new(6.0, 5).is_err());
        assert!(BoostLevel::new(f64::NAN, 5).is_err());
        assert_eq!(BoostLevel::new(5.0, 5).unwrap().get(), 5);
    }

    #[test]
    fn same_origin_boost_builds_graph_once() {
        let (mut boost, graph) = manager();
        for n in [4.0, 2.0, 5.0] {
            assert_eq!(boost.request(level(n), ctx(true, 10.0, true)), Ok(None));
        }
        assert!(!boost.using_proxy());
        assert_eq!(boost.level().get(), 5);
        let snap = graph.snapshot();
        assert_eq!(snap.connects, 1);
        assert_eq!(snap.gains, vec![4.0, 2.0, 5.0]);
    }

    #[test]
    fn cross_origin_boost_requests_proxy_reload() {
        let (mut boost, graph) = manager();
        let reload = boost.request(level(3.0), ctx(false, 42.0, true)).unwrap();
        assert_eq!(
            reload,
            Some(Reload {
                route: SourceRoute::Proxied,
                restore: PendingRestore {
                    position: 42.0,
                    resume: true
                },
            })
        );
        assert!(boost.using_proxy());
        assert!(boost.restore_pending());
        assert_eq!(graph.snapshot().connects, 0);

        let outcome = boost.on_metadata_loaded();
        assert_eq!(outcome.restore.map(|r| r.position), Some(42.0));
        assert!(!boost.restore_pending());
        assert_eq!(graph.snapshot().connects, 1);
        assert_eq!(graph.snapshot().gain, 3.0);
    }

    #[test]
    fn unity_from_proxy_reverts_through_reload() {
        let (mut boost, _graph) = manager();
        boost.request(level(3.0), ctx(false, 42.0, true)).unwrap();
        boost.on_metadata_loaded();

        let reload = boost.request(BoostLevel::UNITY, ctx(false, 50.0, false)).unwrap();
        assert_eq!(reload.map(|r| r.route), Some(SourceRoute::Direct));
        assert!(!boost.using_proxy());
        assert_eq!(boost.level(), BoostLevel::UNITY);

        let outcome = boost.on_metadata_loaded();
        assert_eq!(
            outcome.restore,
            Some(PendingRestore {
                position: 50.0,
                resume: false
            })
        );
        assert_eq!(boost.state(), BoostState::Unity);
    }

    #[test]
    fn proxy_load_error_falls_back_to_direct() {
        let (mut boost, _graph) = manager();
        boost.request(level(2.0), ctx(false, 30.0, true)).unwrap();

        let reload = boost.on_load_error(ctx(false, 0.0, false)).unwrap();
        assert_eq!(reload.route, SourceRoute::Direct);
        assert_eq!(reload.restore.position, 30.0);
        assert!(reload.restore.resume);
        assert_eq!(boost.level(), BoostLevel::UNITY);
        assert!(!boost.using_proxy());
    }

    #[test]
    fn gain_failure_keeps_last_applied_level() {
        let (mut boost, graph) = manager();
        boost.request(level(2.0), ctx(true, 0.0, false)).unwrap();
        graph.set_fail_gain(true);

        let err = boost.request(level(4.0), ctx(true, 0.0, false)).unwrap_err();
        assert!(matches!(err, BoostError::Gain(_)));
        assert_eq!(boost.level().get(), 2);
    }

    #[test]
    fn graph_failure_leaves_unity() {
        let (mut boost, graph) = manager();
        graph.set_fail_connect(true);
        let err = boost.request(level(3.0), ctx(true, 0.0, false)).unwrap_err();
        assert!(matches!(err, BoostError::Graph(_)));
        assert_eq!(boost.state(), BoostState::Unity);
        assert!(!boost.graph_constructed());
    }

    #[test]
    fn gain_failure_after_proxy_load_reverts_with_notice() {
        let (mut boost, graph) = manager();
        boost.request(level(3.0), ctx(false, 12.0, true)).unwrap();
        graph.set_fail_connect(true);

        let outcome = boost.on_metadata_loaded();
        assert!(outcome.restore.is_none());
        assert_eq!(outcome.reload.map(|r| r.route), Some(SourceRoute::Direct));
        assert_eq!(outcome.failure.map(|(kind, _)| kind), Some(NoticeKind::BoostFailed));
        assert!(matches!(boost.state(), BoostState::Reverting { .. }));
    }

    #[test]
    fn boost_while_reverting_is_rejected() {
        let (mut boost, _graph) = manager();
        boost.request(level(3.0), ctx(false, 12.0, true)).unwrap();
        boost.request(BoostLevel::UNITY, ctx(false, 12.0, true)).unwrap();
        assert_eq!(
            boost.request(level(2.0), ctx(false, 12.0, true)),
            Err(BoostError::ReloadPending)
        );
    }

    #[test]
    fn resume_intent_toggles_only_while_pending() {
        let (mut boost, _graph) = manager();
        assert_eq!(boost.toggle_resume_intent(), None);
        boost.request(level(3.0), ctx(false, 12.0, true)).unwrap();
        assert_eq!(boost.toggle_resume_intent(), Some(false));
        let outcome = boost.on_metadata_loaded();
        assert_eq!(outcome.restore.map(|r| r.resume), Some(false));
    }

    #[test]
    fn reset_returns_to_unity_and_keeps_graph() {
        let (mut boost, graph) = manager();
        boost.request(level(3.0), ctx(true, 0.0, false)).unwrap();
        boost.reset();
        assert_eq!(boost.state(), BoostState::Unity);
        assert!(boost.graph_constructed());
        assert_eq!(graph.snapshot().gain, 1.0);
    }
}
