//! Event subscriptions between the host and the player.
//!
//! The host attaches its native listeners to a [`MediaEventSink`] handed out
//! per playable unit. Loading another unit or unmounting the player tears the
//! previous subscription down: its sink starts returning `false` from
//! [`MediaEventSink::emit`] and the host detaches those listeners.

use crossbeam_channel::{Receiver, Sender, TrySendError};
use video_player_types::MediaEvent;

/// Events delivered by the host.
#[derive(Clone, Debug, PartialEq)]
pub enum PlayerEvent {
    Media(MediaEvent),
    /// The environment entered or left fullscreen.
    FullscreenChanged(bool),
}

/// Sending half handed to the host's listeners.
#[derive(Clone, Debug)]
pub struct MediaEventSink {
    sender: Sender<PlayerEvent>,
    generation: u64,
}

impl MediaEventSink {
    /// Forward an event. Returns `false` once this subscription was torn down.
    pub fn emit(&self, event: PlayerEvent) -> bool {
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Disconnected(_)) => false,
            Err(TrySendError::Full(_)) => true,
        }
    }

    pub fn media(&self, event: MediaEvent) -> bool {
        self.emit(PlayerEvent::Media(event))
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Receiving side owned by the player; one channel per subscription.
#[derive(Debug)]
pub struct EventHub {
    sender: Sender<PlayerEvent>,
    receiver: Receiver<PlayerEvent>,
    generation: u64,
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new()
    }
}

impl EventHub {
    pub fn new() -> Self {
        let (sender, receiver) = crossbeam_channel::unbounded();
        Self {
            sender,
            receiver,
            generation: 0,
        }
    }

    /// Sink for the current subscription.
    pub fn sink(&self) -> MediaEventSink {
        MediaEventSink {
            sender: self.sender.clone(),
            generation: self.generation,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Tear down the current subscription and open a new one.
    ///
    /// Undelivered events of the old subscription are discarded with it.
    pub fn rotate(&mut self) -> MediaEventSink {
        let (sender, receiver) = crossbeam_channel::unbounded();
        self.sender = sender;
        self.receiver = receiver;
        self.generation += 1;
        tracing::debug!(generation = self.generation, "event subscription rotated");
        self.sink()
    }

    /// Take every event queued so far.
    pub fn drain(&self) -> Vec<PlayerEvent> {
        self.receiver.try_iter().collect()
    }
}
