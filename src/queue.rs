//! Queue handles: send and receive messages on one named queue.

use crate::kv::KvClient;
use crate::types::{QueueError, QueueStats};
use eyre::Result;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

/// A handle to one named queue on the server.
///
/// The queue name doubles as the memcached key: `send` is a `set` on that
/// key, `receive` is a `get`, and the server dequeues in FIFO order (a
/// server guarantee, not enforced here). Handles are cheap to clone; clones
/// share the same local counters. The handle holds a weak reference to the
/// client's KV connection and does not keep it alive — operations on a
/// handle that outlives its [`QueueClient`](crate::QueueClient) fail with
/// [`QueueError::Connection`].
#[derive(Clone)]
pub struct Queue {
    name: String,
    kv: Weak<RefCell<dyn KvClient>>,
    stats: Rc<Cell<QueueStats>>,
}

impl Queue {
    pub(crate) fn new(name: String, kv: Weak<RefCell<dyn KvClient>>, stats: QueueStats) -> Self {
        Self {
            name,
            kv,
            stats: Rc::new(Cell::new(stats)),
        }
    }

    fn kv(&self) -> Result<Rc<RefCell<dyn KvClient>>> {
        self.kv.upgrade().ok_or_else(|| {
            eyre::eyre!(QueueError::Connection(format!(
                "client for queue '{}' has been closed",
                self.name
            )))
        })
    }

    /// The queue name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Enqueue a message. Increments the local `sent` counter on success and
    /// returns the KV client's success flag verbatim.
    pub fn send(&self, message: &str) -> Result<bool> {
        let kv = self.kv()?;
        let ok = kv.borrow_mut().set(&self.name, message, 0)?;
        if ok {
            let mut stats = self.stats.get();
            stats.sent += 1;
            self.stats.set(stats);
        }
        Ok(ok)
    }

    /// Dequeue the next message, or `None` when the queue is empty.
    /// Increments the local `received` counter when a message arrives.
    pub fn receive(&self) -> Result<Option<String>> {
        let kv = self.kv()?;
        let message = kv.borrow_mut().get(&self.name)?;
        if message.is_some() {
            let mut stats = self.stats.get();
            stats.received += 1;
            self.stats.set(stats);
        }
        Ok(message)
    }

    /// Dequeue up to `count` messages with exactly `count` sequential
    /// [`receive`](Self::receive) calls, collecting every result in call
    /// order, empty slots included. Not atomic: interleaving with other
    /// producers or consumers is possible and acceptable.
    pub fn receive_many(&self, count: usize) -> Result<Vec<Option<String>>> {
        let mut messages = Vec::with_capacity(count);
        for _ in 0..count {
            messages.push(self.receive()?);
        }
        Ok(messages)
    }

    /// Always fails with [`QueueError::DeleteMessageUnsupported`]: the wire
    /// protocol only supports deleting whole queues.
    pub fn delete_message(&self) -> Result<()> {
        Err(eyre::eyre!(QueueError::DeleteMessageUnsupported))
    }

    /// Local counters for this queue. Best-effort bookkeeping; see
    /// [`QueueStats`] for the staleness caveat.
    pub fn stats(&self) -> QueueStats {
        self.stats.get()
    }

    /// Messages still waiting, per the local counters.
    pub fn remaining(&self) -> u64 {
        self.stats.get().remaining()
    }
}

impl std::fmt::Debug for Queue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Queue")
            .field("name", &self.name)
            .field("stats", &self.stats.get())
            .finish()
    }
}
