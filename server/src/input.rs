//! Concurrent intent ingestion: the write-side boundary of the core.
//!
//! Many transport tasks submit intents; the simulation drains them once per
//! tick. Per player only the latest intent matters, so the inbox is a
//! latest-value slot per id rather than a queue. An overwritten intent is
//! dropped, never buffered, which bounds memory regardless of client send
//! rate.

use std::collections::HashMap;
use std::sync::Mutex;

use log::warn;
use shared::{sanitize_direction, Intent, PlayerAction, PlayerId, Vec2};

use crate::error::ArenaError;

/// Thread-safe last-write-wins inbox for player intents.
#[derive(Default)]
pub struct IntentInbox {
    slots: Mutex<HashMap<PlayerId, Intent>>,
}

impl IntentInbox {
    pub fn new() -> Self {
        IntentInbox::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<PlayerId, Intent>> {
        // A panic while holding this lock cannot leave partial state: slot
        // writes are single HashMap inserts.
        self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Records the latest intent for a player, replacing any unconsumed one.
    ///
    /// The direction is clamped to unit length; non-finite input is rejected
    /// and no slot is written, leaving other players unaffected.
    pub fn submit(
        &self,
        player_id: PlayerId,
        direction: Vec2,
        action: Option<PlayerAction>,
    ) -> Result<(), ArenaError> {
        let direction = match sanitize_direction(direction) {
            Some(direction) => direction,
            None => {
                warn!("rejecting non-finite direction from player {}", player_id);
                return Err(ArenaError::InvalidInput("direction must be finite"));
            }
        };

        self.lock().insert(player_id, Intent::new(direction, action));
        Ok(())
    }

    /// Atomically takes every pending intent, leaving the inbox empty.
    ///
    /// Called exactly once per tick. A concurrent submit lands either
    /// entirely before or entirely after the drain, never partially.
    pub fn drain_latest(&self) -> HashMap<PlayerId, Intent> {
        std::mem::take(&mut *self.lock())
    }

    /// Discards any pending intent for a departed player.
    pub fn forget(&self, player_id: PlayerId) {
        self.lock().remove(&player_id);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
