//! Expiry scheduler
//!
//! A single worker thread owns a deadline heap and fires callbacks as their
//! deadlines pass. Schedules reach it over a channel.

use std::cmp::Ordering as CmpOrdering;
use std::collections::{BinaryHeap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::Mutex;

use crate::error::Result;

/// Identifies one scheduling of one key
pub type Generation = u64;

/// Name given to the worker thread
pub const WORKER_THREAD_NAME: &str = "slotkv-expiry";

/// Longer TTLs are clamped to this so the deadline stays representable
const MAX_TTL: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

type Callback = Box<dyn FnOnce(&str, Generation) + Send>;

/// One scheduled expiration waiting in the worker's heap
struct Pending {
    deadline: Instant,
    generation: Generation,
    key: String,
    on_expire: Callback,
}

// Ordered so that `BinaryHeap` (a max-heap) pops the earliest deadline first
impl Ord for Pending {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        other
            .deadline
            .cmp(&self.deadline)
            .then_with(|| other.generation.cmp(&self.generation))
    }
}

impl PartialOrd for Pending {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Pending {
    fn eq(&self, other: &Self) -> bool {
        self.generation == other.generation
    }
}

impl Eq for Pending {}

enum Command {
    Schedule(Pending),
    /// Drop heap entries that are no longer registered
    Purge,
}

/// key → generation of its registered timer
#[derive(Default)]
struct Registry {
    timers: Mutex<HashMap<String, Generation>>,
}

impl Registry {
    fn is_current(&self, key: &str, generation: Generation) -> bool {
        self.timers.lock().get(key) == Some(&generation)
    }
}

/// Registry of pending per-key expirations
///
/// At most one timer is registered per key. A timer only acts on its key
/// while it is still the registered one, so a key that was deleted and
/// re-created is never removed by the old key's timer.
///
/// The worker thread starts on the first `schedule` and exits once the
/// scheduler is dropped.
#[derive(Default)]
pub struct ExpiryScheduler {
    registry: Arc<Registry>,
    next_generation: AtomicU64,
    worker: Mutex<Option<Sender<Command>>>,
}

impl ExpiryScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Call `on_expire(key, generation)` once after `ttl`, unless cancelled
    ///
    /// Replaces (and so cancels) any timer already registered for `key`.
    /// The callback runs on the worker thread and must check
    /// `take_if_current` before acting.
    pub fn schedule<F>(&self, key: &str, ttl: Duration, on_expire: F) -> Result<Generation>
    where
        F: FnOnce(&str, Generation) + Send + 'static,
    {
        let generation = self.next_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let replaced = self
            .registry
            .timers
            .lock()
            .insert(key.to_string(), generation)
            .is_some();

        let pending = Pending {
            deadline: Instant::now() + ttl.min(MAX_TTL),
            generation,
            key: key.to_string(),
            on_expire: Box::new(on_expire),
        };

        if let Err(e) = self.send(Command::Schedule(pending)) {
            self.take_if_current(key, generation);
            return Err(e);
        }
        if replaced {
            self.purge();
        }

        tracing::debug!(key, generation, ttl_ms = ttl.as_millis() as u64, "scheduled expiry");
        Ok(generation)
    }

    /// Cancel the timer registered for `key`, if any
    pub fn cancel(&self, key: &str) -> bool {
        let cancelled = self.registry.timers.lock().remove(key).is_some();
        if cancelled {
            self.purge();
        }
        cancelled
    }

    /// Unregister `key` if `generation` is still its registered timer
    ///
    /// Returns false when the timer was cancelled or superseded, in which
    /// case the caller must not act on the key.
    pub fn take_if_current(&self, key: &str, generation: Generation) -> bool {
        let mut timers = self.registry.timers.lock();
        match timers.get(key) {
            Some(current) if *current == generation => {
                timers.remove(key);
                true
            }
            _ => false,
        }
    }

    /// True while `generation` is the timer registered for `key`
    pub fn is_current(&self, key: &str, generation: Generation) -> bool {
        self.registry.is_current(key, generation)
    }

    /// Cancel every pending timer
    pub fn cancel_all(&self) {
        let cancelled = {
            let mut timers = self.registry.timers.lock();
            let count = timers.len();
            timers.clear();
            count
        };
        if cancelled > 0 {
            self.purge();
            tracing::debug!(cancelled, "cancelled pending expirations");
        }
    }

    /// Number of timers still pending
    pub fn pending(&self) -> usize {
        self.registry.timers.lock().len()
    }

    // =========================================================================
    // Worker
    // =========================================================================

    /// Hand `command` to the worker, starting it if needed
    ///
    /// A worker that has stopped (its callback panicked) is replaced.
    fn send(&self, command: Command) -> Result<()> {
        let mut worker = self.worker.lock();

        let command = match worker.as_ref() {
            Some(tx) => match tx.send(command) {
                Ok(()) => return Ok(()),
                Err(channel::SendError(command)) => {
                    tracing::warn!("expiry worker stopped, restarting");
                    command
                }
            },
            None => command,
        };

        *worker = Some(self.spawn_worker(command)?);
        Ok(())
    }

    fn purge(&self) {
        if let Some(tx) = self.worker.lock().as_ref() {
            let _ = tx.send(Command::Purge);
        }
    }

    /// Start a worker with `first` already queued
    fn spawn_worker(&self, first: Command) -> Result<Sender<Command>> {
        let (tx, rx) = channel::unbounded();
        // The receiver is still held here, so the send cannot fail
        let _ = tx.send(first);

        let registry = Arc::clone(&self.registry);
        thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || run_worker(registry, rx))?;

        tracing::debug!("started expiry worker");
        Ok(tx)
    }
}

enum Wake {
    Command(Command),
    Due,
    Shutdown,
}

/// Worker loop: sleep until the earliest deadline or the next command
fn run_worker(registry: Arc<Registry>, commands: Receiver<Command>) {
    let mut queue: BinaryHeap<Pending> = BinaryHeap::new();

    loop {
        let next_deadline = queue.peek().map(|pending| pending.deadline);
        let wake = match next_deadline {
            Some(deadline) => {
                let timeout = channel::at(deadline);
                crossbeam::select! {
                    recv(commands) -> msg => msg.map_or(Wake::Shutdown, Wake::Command),
                    recv(timeout) -> _ => Wake::Due,
                }
            }
            None => commands.recv().map_or(Wake::Shutdown, Wake::Command),
        };

        match wake {
            Wake::Command(Command::Schedule(pending)) => queue.push(pending),
            Wake::Command(Command::Purge) => {
                queue.retain(|pending| registry.is_current(&pending.key, pending.generation));
            }
            Wake::Due => fire_due(&registry, &mut queue),
            Wake::Shutdown => break,
        }
    }

    tracing::trace!(dropped = queue.len(), "expiry worker stopped");
}

/// Run every callback whose deadline has passed and is still registered
fn fire_due(registry: &Registry, queue: &mut BinaryHeap<Pending>) {
    let now = Instant::now();

    while queue.peek().map_or(false, |pending| pending.deadline <= now) {
        let Some(pending) = queue.pop() else { break };

        if registry.is_current(&pending.key, pending.generation) {
            (pending.on_expire)(&pending.key, pending.generation);
        } else {
            tracing::trace!(key = %pending.key, generation = pending.generation, "expiry cancelled");
        }
    }
}
