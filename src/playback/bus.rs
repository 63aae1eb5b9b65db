//! Page-wide "playback started" broadcast.
//!
//! Every playback unit holds a [`Subscription`] for as long as it exists.
//! When a unit's pipeline confirms that audio started, the unit publishes
//! [`BusEvent::PlaybackStarted`] with its own [`UnitId`]; every other unit
//! that is currently playing pauses itself when it drains its inbox.
//!
//! Delivery is a synchronous fan-out into per-subscriber mailboxes: once
//! `publish` returns, every subscriber registered at that moment has the
//! event queued.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, Weak};

static NEXT_UNIT_ID: AtomicU64 = AtomicU64::new(1);
static NEXT_TOKEN: AtomicU64 = AtomicU64::new(1);
static GLOBAL_BUS: OnceLock<PlaybackBus> = OnceLock::new();

/// Opaque identity of one mounted playback unit.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct UnitId(u64);

impl UnitId {
    /// Allocate an identity that no other unit in this process carries.
    pub fn next() -> Self {
        Self(NEXT_UNIT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unit-{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusEvent {
    /// The unit with this id has confirmed audible playback.
    PlaybackStarted(UnitId),
}

/// Per-unit mailbox, tagged with the token of the subscription that owns it.
type Mailboxes = HashMap<UnitId, (u64, Sender<BusEvent>)>;

/// Publish/subscribe point shared by every unit on the page.
///
/// Cloning is cheap and yields a handle to the same set of subscribers.
#[derive(Clone, Default)]
pub struct PlaybackBus {
    mailboxes: Arc<Mutex<Mailboxes>>,
}

impl PlaybackBus {
    /// Create an isolated bus. Units on different buses never see each other.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide bus used by the terminal page.
    pub fn global() -> &'static PlaybackBus {
        GLOBAL_BUS.get_or_init(PlaybackBus::new)
    }

    /// Register `id` and return the scoped subscription that receives events.
    ///
    /// Subscribing the same id twice replaces the earlier mailbox; the
    /// earlier subscription stops receiving events.
    pub fn subscribe(&self, id: UnitId) -> Subscription {
        let (tx, rx) = mpsc::channel();
        let token = NEXT_TOKEN.fetch_add(1, Ordering::Relaxed);
        lock(&self.mailboxes).insert(id, (token, tx));
        log::trace!("bus: {id} subscribed");
        Subscription {
            id,
            token,
            rx,
            mailboxes: Arc::downgrade(&self.mailboxes),
        }
    }

    /// Deliver `event` to every current subscriber, including the publisher.
    ///
    /// Returns the number of mailboxes the event was queued in.
    pub fn publish(&self, event: BusEvent) -> usize {
        let mailboxes = lock(&self.mailboxes);
        let delivered = mailboxes
            .values()
            .filter(|(_, tx)| tx.send(event.clone()).is_ok())
            .count();
        log::debug!("bus: {event:?} delivered to {delivered} subscriber(s)");
        delivered
    }

    /// Number of units currently subscribed.
    pub fn subscriber_count(&self) -> usize {
        lock(&self.mailboxes).len()
    }
}

/// A unit's registration on a [`PlaybackBus`]. Dropping it unsubscribes.
pub struct Subscription {
    id: UnitId,
    token: u64,
    rx: Receiver<BusEvent>,
    mailboxes: Weak<Mutex<Mailboxes>>,
}

impl Subscription {
    pub fn id(&self) -> UnitId {
        self.id
    }

    /// Take every event queued since the last drain, oldest first.
    pub fn drain(&self) -> Vec<BusEvent> {
        self.rx.try_iter().collect()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let Some(mailboxes) = self.mailboxes.upgrade() else {
            return;
        };
        let mut mailboxes = lock(&mailboxes);
        // A re-subscription under the same id owns the slot now.
        let ours = mailboxes
            .get(&self.id)
            .is_some_and(|(token, _)| *token == self.token);
        if ours {
            mailboxes.remove(&self.id);
            log::trace!("bus: {} unsubscribed", self.id);
        }
    }
}

fn lock(mailboxes: &Mutex<Mailboxes>) -> MutexGuard<'_, Mailboxes> {
    mailboxes.lock().unwrap_or_else(|e| e.into_inner())
}
