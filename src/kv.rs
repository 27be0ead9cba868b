//! Generic key-value collaborator used for enqueue/dequeue.

use crate::types::QueueError;
use eyre::Result;

/// Read/write timeout for the memcached connection, in seconds.
const IO_TIMEOUT_SECS: u32 = 10;

/// The slice of the memcached API that queue operations need.
///
/// Enqueue is a `set` on the queue name; dequeue is a `get` on the same key
/// (the server pops the next message). Implemented by [`MemcacheKv`] for
/// real servers; the test suite substitutes an in-memory fake.
pub trait KvClient {
    /// Store `value` under `key` with an expiry in seconds (0 = never).
    /// Returns the underlying client's success flag.
    fn set(&mut self, key: &str, value: &str, expiry: u32) -> Result<bool>;

    /// Fetch (and, on a queue server, dequeue) the value under `key`.
    fn get(&mut self, key: &str) -> Result<Option<String>>;
}

/// [`KvClient`] backed by the `memcache` crate, ascii protocol.
pub struct MemcacheKv {
    inner: memcache::Client,
}

impl MemcacheKv {
    /// Connect to the server, failing with [`QueueError::Connection`] if it
    /// is unreachable.
    pub fn connect(host: &str, port: u16) -> Result<Self> {
        let url = format!(
            "memcache://{}:{}?timeout={}&protocol=ascii",
            host, port, IO_TIMEOUT_SECS
        );
        let inner = memcache::Client::connect(url.as_str())
            .map_err(|e| eyre::eyre!(QueueError::Connection(format!("{}:{}: {}", host, port, e))))?;

        Ok(Self { inner })
    }
}

impl KvClient for MemcacheKv {
    fn set(&mut self, key: &str, value: &str, expiry: u32) -> Result<bool> {
        self.inner.set(key, value, expiry)?;
        Ok(true)
    }

    fn get(&mut self, key: &str) -> Result<Option<String>> {
        Ok(self.inner.get::<String>(key)?)
    }
}
