//! memq: a synchronous client for MemcacheQ-style queue servers.
//!
//! MemcacheQ speaks the memcached text protocol with queue semantics: a
//! `set` on a key enqueues a message, a `get` dequeues the next one in FIFO
//! order. This crate delegates those operations to the `memcache` crate and
//! adds the admin verbs memcached clients cannot express (`stats queue`,
//! whole-queue `delete`) over a raw line-protocol socket.
//!
//! One [`QueueClient`] owns one connection pair; all calls are blocking and
//! never retried. The client and its [`Queue`] handles are `!Send`: share a
//! server between threads by giving each thread its own client.
//!
//! # Example
//!
//! ```no_run
//! use memq::QueueClient;
//!
//! let mut client = QueueClient::connect("127.0.0.1", 22201).unwrap();
//!
//! let jobs = client.create_queue("jobs").unwrap();
//! jobs.send("resize image 42").unwrap();
//!
//! while let Some(message) = jobs.receive().unwrap() {
//!     println!("got: {}", message);
//! }
//!
//! client.delete_queue("jobs").unwrap();
//! client.close();
//! ```

mod client;
mod kv;
mod protocol;
mod queue;
mod types;

// Re-export public API
pub use client::{DEFAULT_HOST, DEFAULT_PORT, QueueClient};
pub use kv::{KvClient, MemcacheKv};
pub use protocol::LineConnection;
pub use queue::Queue;
pub use types::{QueueError, QueueStats};
