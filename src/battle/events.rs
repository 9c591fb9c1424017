//! Channel-based notification bus.
//!
//! Listeners subscribe to individual channels and are invoked synchronously,
//! in subscription order, every time the engine publishes on that channel.
//! Delivery is finished before `publish` returns, so a listener always sees
//! a battle's notifications in the order they were produced.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use schema::{BattlePhase, Side};
use serde::{Deserialize, Serialize};
use strum::{EnumIter, IntoEnumIterator};
use tracing::trace;

use crate::combatant::{CombatantSnapshot, StatSnapshot};
use crate::inventory::InventorySnapshot;

/// Channels a listener can subscribe to.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize, EnumIter)]
pub enum Channel {
    /// Narration lines
    Dialogue,
    /// HP/MP of either side
    Stats,
    /// Which creature is shown for either side
    Sprite,
    /// The player's party
    Roster,
    /// The player's bag
    Inventory,
    /// Battle start and conclusion
    BattleState,
    /// Moves of the player's active creature
    Moves,
}

/// A single notification, carrying the payload for its channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Notification {
    Dialogue(String),
    Stats { side: Side, stats: StatSnapshot },
    Sprite { side: Side, name: String },
    Roster(Vec<CombatantSnapshot>),
    Inventory(InventorySnapshot),
    BattleState(BattlePhase),
    Moves(Vec<String>),
}

impl Notification {
    pub fn channel(&self) -> Channel {
        match self {
            Notification::Dialogue(_) => Channel::Dialogue,
            Notification::Stats { .. } => Channel::Stats,
            Notification::Sprite { .. } => Channel::Sprite,
            Notification::Roster(_) => Channel::Roster,
            Notification::Inventory(_) => Channel::Inventory,
            Notification::BattleState(_) => Channel::BattleState,
            Notification::Moves(_) => Channel::Moves,
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notification::Dialogue(line) => write!(f, "{}", line),
            Notification::Stats { side, stats } => write!(
                f,
                "[{}] HP {}/{} MP {}/{}",
                side, stats.hp, stats.max_hp, stats.mp, stats.max_mp
            ),
            Notification::Sprite { side, name } => write!(f, "[{}] {}", side, name),
            Notification::Roster(members) => {
                let names: Vec<String> = members
                    .iter()
                    .map(|member| {
                        let marker = if member.fainted { " (fainted)" } else { "" };
                        format!("{} {}/{}{}", member.name, member.hp, member.max_hp, marker)
                    })
                    .collect();
                write!(f, "Roster: {}", names.join(", "))
            }
            Notification::Inventory(bag) => write!(
                f,
                "Bag ({}/{}): {} | {} coins",
                bag.items.len(),
                bag.capacity,
                bag.items.join(", "),
                bag.coins
            ),
            Notification::BattleState(phase) => write!(f, "Battle: {}", phase),
            Notification::Moves(moves) => write!(f, "Moves: {}", moves.join(", ")),
        }
    }
}

/// Something that reacts to notifications.
///
/// Any `FnMut(&Notification) + Send` closure is a listener.
pub trait Listener: Send {
    fn notify(&mut self, notification: &Notification);
}

impl<F> Listener for F
where
    F: FnMut(&Notification) + Send,
{
    fn notify(&mut self, notification: &Notification) {
        self(notification)
    }
}

/// Handle returned by `subscribe`, used to unsubscribe later.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub struct ListenerId(u64);

#[derive(Default)]
pub struct NotificationBus {
    listeners: HashMap<Channel, Vec<(ListenerId, Box<dyn Listener>)>>,
    next_id: u64,
}

impl NotificationBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, channel: Channel, listener: impl Listener + 'static) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners
            .entry(channel)
            .or_default()
            .push((id, Box::new(listener)));
        id
    }

    /// Subscribes one listener per channel, each built by `make`.
    pub fn subscribe_multiple<L, F>(&mut self, channels: &[Channel], mut make: F) -> Vec<ListenerId>
    where
        L: Listener + 'static,
        F: FnMut(Channel) -> L,
    {
        channels
            .iter()
            .map(|&channel| self.subscribe(channel, make(channel)))
            .collect()
    }

    /// Removes a listener. Returns false if it was not subscribed.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        for listeners in self.listeners.values_mut() {
            if let Some(position) = listeners.iter().position(|(listener_id, _)| *listener_id == id) {
                listeners.remove(position);
                return true;
            }
        }
        false
    }

    pub fn listener_count(&self, channel: Channel) -> usize {
        self.listeners.get(&channel).map_or(0, Vec::len)
    }

    /// Delivers a notification to every listener on its channel.
    pub fn publish(&mut self, notification: Notification) {
        let channel = notification.channel();
        let Some(listeners) = self.listeners.get_mut(&channel) else {
            trace!(?channel, "no listeners for channel");
            return;
        };
        for (_, listener) in listeners.iter_mut() {
            listener.notify(&notification);
        }
    }
}

impl fmt::Debug for NotificationBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: HashMap<Channel, usize> = self
            .listeners
            .iter()
            .map(|(channel, listeners)| (*channel, listeners.len()))
            .collect();
        f.debug_struct("NotificationBus")
            .field("listeners", &counts)
            .finish()
    }
}

/// A listener that records every notification it receives.
///
/// Clones share the same log, so one clone can be attached to the bus while
/// another is kept for reading.
#[derive(Debug, Clone, Default)]
pub struct NotificationLog {
    entries: Arc<Mutex<Vec<Notification>>>,
}

impl NotificationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes this log to every channel.
    pub fn attach(&self, bus: &mut NotificationBus) -> Vec<ListenerId> {
        let channels: Vec<Channel> = Channel::iter().collect();
        bus.subscribe_multiple(&channels, |_| self.clone())
    }

    pub fn entries(&self) -> Vec<Notification> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn dialogue(&self) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter_map(|entry| match entry {
                Notification::Dialogue(line) => Some(line),
                _ => None,
            })
            .collect()
    }

    pub fn phases(&self) -> Vec<BattlePhase> {
        self.entries()
            .into_iter()
            .filter_map(|entry| match entry {
                Notification::BattleState(phase) => Some(phase),
                _ => None,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Listener for NotificationLog {
    fn notify(&mut self, notification: &Notification) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notification.clone());
    }
}
