//! Shared types for the memq client.

/// Per-queue message counters.
///
/// Seeded from the last `stats queue` refresh and bumped locally on
/// send/receive. Other clients touching the same queue are not observed,
/// so these drift from server truth until the next refresh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    /// Messages sent to the queue (the server's "total" counter).
    pub sent: u64,

    /// Messages consumed from the queue.
    pub received: u64,
}

impl QueueStats {
    /// Messages still waiting in the queue.
    pub fn remaining(&self) -> u64 {
        self.sent.saturating_sub(self.received)
    }
}

/// Errors that can occur while talking to the queue server.
#[derive(Debug)]
pub enum QueueError {
    /// The socket or memcached connection could not be established,
    /// or the owning client has already been torn down.
    Connection(String),
    /// The server reply was malformed or ended before its terminator.
    Protocol(String),
    /// No queue with this name in the registry.
    QueueNotFound(String),
    /// The wire protocol has no per-message delete, only whole-queue delete.
    DeleteMessageUnsupported,
}

impl std::fmt::Display for QueueError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueueError::Connection(msg) => write!(f, "connection failed: {}", msg),
            QueueError::Protocol(msg) => write!(f, "protocol error: {}", msg),
            QueueError::QueueNotFound(name) => write!(f, "queue not found: {}", name),
            QueueError::DeleteMessageUnsupported => {
                write!(f, "the server does not support deleting individual messages")
            }
        }
    }
}

impl std::error::Error for QueueError {}
