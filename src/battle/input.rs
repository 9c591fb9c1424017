//! The hand-off point between the presentation layer and a controlled
//! combatant waiting for its turn.
//!
//! While the engine waits, it parks a oneshot sender in a shared slot. The
//! first selection takes the sender and completes the wait; selections made
//! while nothing is waiting are dropped.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{oneshot, Notify};
use tracing::{debug, warn};

use crate::battle::action::ActionToken;
use crate::errors::{BattleError, BattleResult};

#[derive(Default)]
struct InputSlot {
    pending: Mutex<Option<oneshot::Sender<ActionToken>>>,
    ready: Notify,
}

/// Cloneable handle for supplying the player's actions.
#[derive(Clone, Default)]
pub struct PlayerInput {
    slot: Arc<InputSlot>,
}

impl std::fmt::Debug for PlayerInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerInput")
            .field("awaiting", &self.is_awaiting())
            .finish()
    }
}

impl PlayerInput {
    pub fn new() -> Self {
        Self::default()
    }

    fn pending(&self) -> MutexGuard<'_, Option<oneshot::Sender<ActionToken>>> {
        self.slot
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// True while a controlled combatant is waiting for an action.
    pub fn is_awaiting(&self) -> bool {
        self.pending().is_some()
    }

    /// Resolves once a controlled combatant is waiting for an action.
    pub async fn awaiting(&self) {
        loop {
            let notified = self.slot.ready.notified();
            if self.is_awaiting() {
                return;
            }
            notified.await;
        }
    }

    /// Selects a move by name. Selecting the run command flees.
    pub fn select_move(&self, move_id: impl Into<String>) -> bool {
        self.supply(ActionToken::from_move(move_id))
    }

    pub fn select_item(&self, index: usize) -> bool {
        self.supply(ActionToken::UseItem { index })
    }

    pub fn select_switch(&self, roster_index: usize) -> bool {
        self.supply(ActionToken::Switch { roster_index })
    }

    pub fn select_flee(&self) -> bool {
        self.supply(ActionToken::Flee)
    }

    /// Hands an action to the waiting combatant. Returns false, and drops
    /// the action, when nothing is waiting.
    pub fn supply(&self, action: ActionToken) -> bool {
        let sender = self.pending().take();
        match sender {
            Some(sender) => {
                debug!(%action, "player action supplied");
                sender.send(action).is_ok()
            }
            None => {
                warn!(%action, "ignoring player action: no combatant is awaiting input");
                false
            }
        }
    }

    /// Opens the input window and suspends until an action arrives.
    pub(crate) async fn await_action(&self) -> BattleResult<ActionToken> {
        let (sender, receiver) = oneshot::channel();
        *self.pending() = Some(sender);
        self.slot.ready.notify_waiters();
        receiver.await.map_err(|_| BattleError::InputClosed)
    }
}
