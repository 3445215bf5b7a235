use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crossbeam_channel::{unbounded, Receiver, Sender};
use tracing::{debug, warn};

use super::{FrameBuffer, GameKey, InputEvent, KeyMap, Rgb};

static SESSION_LOCK_POISON_WARNED: AtomicBool = AtomicBool::new(false);

fn warn_session_lock_poison_once(operation: &'static str) {
    if SESSION_LOCK_POISON_WARNED
        .compare_exchange(false, true, Ordering::Relaxed, Ordering::Relaxed)
        .is_ok()
    {
        warn!(operation, "session lock poisoned; recovered inner value");
    }
}

/// State shared between the GUI thread and the game thread for one
/// play-to-stop lifetime.
///
/// The GUI thread is the only producer of input events and the only writer of
/// the held-key set. The game thread is the only consumer of events and the
/// only publisher of frames.
pub struct SessionContext {
    id: u64,
    key_map: Arc<dyn KeyMap>,
    events_tx: Sender<InputEvent>,
    events_rx: Receiver<InputEvent>,
    held_keys: RwLock<HashSet<GameKey>>,
    frame: Mutex<Option<Arc<FrameBuffer>>>,
    paused: AtomicBool,
    stop_requested: AtomicBool,
    sim_ticks: AtomicU64,
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("id", &self.id)
            .field("pending_events", &self.events_rx.len())
            .field("paused", &self.is_paused())
            .field("stop_requested", &self.stop_requested())
            .finish_non_exhaustive()
    }
}

impl SessionContext {
    pub fn new(id: u64, key_map: Arc<dyn KeyMap>) -> Arc<Self> {
        let (events_tx, events_rx) = unbounded();
        Arc::new(Self {
            id,
            key_map,
            events_tx,
            events_rx,
            held_keys: RwLock::new(HashSet::new()),
            frame: Mutex::new(None),
            paused: AtomicBool::new(false),
            stop_requested: AtomicBool::new(false),
            sim_ticks: AtomicU64::new(0),
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn key_map(&self) -> &dyn KeyMap {
        self.key_map.as_ref()
    }

    pub(crate) fn push_event(&self, event: InputEvent) {
        // The receiver lives in `self`, so the channel cannot be disconnected here.
        if self.events_tx.send(event).is_err() {
            warn!(session = self.id, "input_event_dropped");
        }
    }

    pub fn try_next_event(&self) -> Option<InputEvent> {
        self.events_rx.try_recv().ok()
    }

    pub fn pending_event_count(&self) -> usize {
        self.events_rx.len()
    }

    pub(crate) fn hold_key(&self, key: GameKey) -> bool {
        self.held_write().insert(key)
    }

    pub(crate) fn release_key(&self, key: GameKey) -> bool {
        self.held_write().remove(&key)
    }

    pub fn is_key_held(&self, key: GameKey) -> bool {
        self.held_read().contains(&key)
    }

    pub fn held_keys(&self) -> Vec<GameKey> {
        let mut keys = self.held_read().iter().copied().collect::<Vec<_>>();
        keys.sort_unstable();
        keys
    }

    /// Replaces the presented frame and hands back the previous one when no
    /// reader still holds it, so the caller can draw into it next.
    pub fn publish_frame(&self, frame: FrameBuffer) -> Option<FrameBuffer> {
        let previous = self.frame_slot().replace(Arc::new(frame));
        previous.and_then(|frame| Arc::try_unwrap(frame).ok())
    }

    pub fn latest_frame(&self) -> Option<Arc<FrameBuffer>> {
        self.frame_slot().clone()
    }

    pub(crate) fn clear_frame_to_black(&self) {
        let mut slot = self.frame_slot();
        if let Some(frame) = slot.as_mut() {
            Arc::make_mut(frame).fill(Rgb::BLACK);
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    pub fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::Release);
    }

    /// Returns the new paused state.
    pub fn toggle_paused(&self) -> bool {
        !self.paused.fetch_xor(true, Ordering::AcqRel)
    }

    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
    }

    pub fn stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    pub fn record_sim_tick(&self) {
        self.sim_ticks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn sim_ticks(&self) -> u64 {
        self.sim_ticks.load(Ordering::Relaxed)
    }

    /// Drops queued events and releases every held key.
    pub(crate) fn clear_input(&self) {
        let dropped = self.events_rx.try_iter().count();
        let released = {
            let mut held = self.held_write();
            let count = held.len();
            held.clear();
            count
        };
        debug!(
            session = self.id,
            dropped_events = dropped,
            released_keys = released,
            "session_input_cleared"
        );
    }

    fn held_read(&self) -> RwLockReadGuard<'_, HashSet<GameKey>> {
        match self.held_keys.read() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn_session_lock_poison_once("held_keys_read");
                poisoned.into_inner()
            }
        }
    }

    fn held_write(&self) -> RwLockWriteGuard<'_, HashSet<GameKey>> {
        match self.held_keys.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn_session_lock_poison_once("held_keys_write");
                poisoned.into_inner()
            }
        }
    }

    fn frame_slot(&self) -> MutexGuard<'_, Option<Arc<FrameBuffer>>> {
        match self.frame.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn_session_lock_poison_once("frame_slot");
                poisoned.into_inner()
            }
        }
    }
}
