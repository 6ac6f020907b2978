//! Priority inbox for session messages
//!
//! This module provides the ordered queue a session drains: control messages
//! outrank gameplay messages, and a monotonic sequence number preserves
//! arrival order within equal priority. The inbox is the only cross-thread
//! boundary of a session — any number of producers may enqueue concurrently
//! while the session's single dispatch loop consumes, blocking for at most a
//! bounded interval so the loop can re-check its running flag.

use std::{
    cmp::{Ordering, Reverse},
    collections::BinaryHeap,
    sync::{Condvar, Mutex},
};

use web_time::Duration;

use crate::message::{Message, Priority};

/// A queued message together with its dispatch key
#[derive(Debug)]
struct Sequenced {
    /// Category priority; lower is dispatched first
    priority: Priority,
    /// Monotonic arrival number, breaking ties within equal priority
    seq: u64,
    /// The queued message itself
    message: Message,
}

impl Sequenced {
    /// The dispatch key: priority first, then arrival order
    fn key(&self) -> (Priority, u64) {
        (self.priority, self.seq)
    }
}

// Ordering considers only the dispatch key, never message contents.
impl PartialEq for Sequenced {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Sequenced {}

impl PartialOrd for Sequenced {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Sequenced {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

/// Heap plus the sequence counter it is ordered by
#[derive(Debug, Default)]
struct Queue {
    /// Min-heap over the dispatch key
    heap: BinaryHeap<Reverse<Sequenced>>,
    /// Next arrival number to hand out
    next_seq: u64,
}

/// Thread-safe priority inbox of one session
///
/// Producers only ever enqueue; they never touch session state directly.
/// The consuming loop dequeues strictly in `(priority, arrival)` order.
#[derive(Debug, Default)]
pub struct Inbox {
    /// Queued messages and the sequence counter
    queue: Mutex<Queue>,
    /// Signalled whenever a message is enqueued
    available: Condvar,
}

impl Inbox {
    /// Creates an empty inbox
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueues a message
    ///
    /// Safe to call from any thread; wakes a consumer blocked in
    /// [`Inbox::pop_timeout`].
    pub fn push(&self, message: Message) {
        let mut queue = self.queue.lock().expect("inbox lock is never poisoned");
        let seq = queue.next_seq;
        queue.next_seq += 1;
        queue.heap.push(Reverse(Sequenced {
            priority: message.priority(),
            seq,
            message,
        }));
        drop(queue);
        self.available.notify_one();
    }

    /// Removes and returns the next message, if one is already queued
    pub fn try_pop(&self) -> Option<Message> {
        self.queue
            .lock()
            .expect("inbox lock is never poisoned")
            .heap
            .pop()
            .map(|Reverse(sequenced)| sequenced.message)
    }

    /// Removes and returns the next message, waiting up to `wait` for one
    ///
    /// Returns `None` if the inbox is still empty when the bounded wait
    /// elapses; callers are expected to re-check their running flag and
    /// retry, which is what makes shutdown possible without a cancellation
    /// signal threaded through the queue.
    pub fn pop_timeout(&self, wait: Duration) -> Option<Message> {
        let mut queue = self.queue.lock().expect("inbox lock is never poisoned");
        if queue.heap.is_empty() {
            (queue, _) = self
                .available
                .wait_timeout(queue, wait)
                .expect("inbox lock is never poisoned");
        }
        queue.heap.pop().map(|Reverse(sequenced)| sequenced.message)
    }

    /// Returns the number of queued messages
    pub fn len(&self) -> usize {
        self.queue
            .lock()
            .expect("inbox lock is never poisoned")
            .heap
            .len()
    }

    /// Returns whether the inbox has no queued messages
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
