use std::collections::VecDeque;

use parking_lot::Mutex;

use crate::kind::MessageKind;
use crate::payload::Message;

/// Most recent messages per kind.
///
/// One fixed-capacity queue per [`MessageKind`], allocated up front. When a
/// queue is full, appending evicts its oldest entry. The receiver is the only
/// writer; consumers read or drain through a shared reference, possibly from
/// other threads. Every operation takes one lock, so an append (with its
/// eviction) and a drain never observe each other half-done.
#[derive(Debug)]
pub struct MessageStore {
    capacity: usize,
    queues: Mutex<Vec<VecDeque<Message>>>,
}

impl MessageStore {
    /// Create an empty store keeping up to `capacity` messages per kind.
    pub fn new(capacity: usize) -> Self {
        let queues = MessageKind::ALL
            .iter()
            .map(|_| VecDeque::with_capacity(capacity))
            .collect();
        Self {
            capacity,
            queues: Mutex::new(queues),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Push onto the tail of the message's queue. Returns the evicted entry,
    /// if any.
    pub(crate) fn append(&self, message: Message) -> Option<Message> {
        if self.capacity == 0 {
            return Some(message);
        }
        let mut queues = self.queues.lock();
        let queue = &mut queues[message.kind().index()];
        let evicted = if queue.len() >= self.capacity {
            queue.pop_front()
        } else {
            None
        };
        queue.push_back(message);
        evicted
    }

    pub fn len(&self, kind: MessageKind) -> usize {
        self.queues.lock()[kind.index()].len()
    }

    pub fn is_empty(&self, kind: MessageKind) -> bool {
        self.len(kind) == 0
    }

    /// Messages held across all kinds.
    pub fn total_len(&self) -> usize {
        self.queues.lock().iter().map(VecDeque::len).sum()
    }

    /// Copy of a kind's queue, oldest first. Leaves the store unchanged.
    pub fn snapshot(&self, kind: MessageKind) -> Vec<Message> {
        self.queues.lock()[kind.index()].iter().cloned().collect()
    }

    /// Oldest message of a kind, left in place.
    pub fn peek(&self, kind: MessageKind) -> Option<Message> {
        self.queues.lock()[kind.index()].front().cloned()
    }

    /// Newest message of a kind.
    pub fn latest(&self, kind: MessageKind) -> Option<Message> {
        self.queues.lock()[kind.index()].back().cloned()
    }

    /// Remove and return the oldest message of a kind.
    pub fn pop_oldest(&self, kind: MessageKind) -> Option<Message> {
        self.queues.lock()[kind.index()].pop_front()
    }

    /// Remove and return every message of a kind, oldest first.
    pub fn drain(&self, kind: MessageKind) -> Vec<Message> {
        self.queues.lock()[kind.index()].drain(..).collect()
    }

    /// Remove and return up to `max` of the oldest messages of a kind.
    pub fn drain_up_to(&self, kind: MessageKind, max: usize) -> Vec<Message> {
        let mut queues = self.queues.lock();
        let queue = &mut queues[kind.index()];
        let n = max.min(queue.len());
        queue.drain(..n).collect()
    }

    /// Remove and return everything, grouped by kind in tag order. Kinds with
    /// no messages are left out.
    pub fn drain_all(&self) -> Vec<(MessageKind, Vec<Message>)> {
        let mut queues = self.queues.lock();
        MessageKind::ALL
            .iter()
            .filter_map(|kind| {
                let queue = &mut queues[kind.index()];
                if queue.is_empty() {
                    None
                } else {
                    Some((*kind, queue.drain(..).collect()))
                }
            })
            .collect()
    }

    pub fn clear(&self) {
        for queue in self.queues.lock().iter_mut() {
            queue.clear();
        }
    }
}

impl Default for MessageStore {
    fn default() -> Self {
        Self::new(crate::codec::DEFAULT_STORE_CAPACITY)
    }
}
