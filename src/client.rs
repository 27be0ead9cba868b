//! High-level queue client: registry, lifecycle, and stats parsing.

use crate::kv::{KvClient, MemcacheKv};
use crate::protocol::LineConnection;
use crate::queue::Queue;
use crate::types::{QueueError, QueueStats};
use eyre::Result;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Default MemcacheQ host.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default MemcacheQ port.
pub const DEFAULT_PORT: u16 = 22201;

/// Placeholder written to prime a queue on creation; the server auto-creates
/// the queue structure on first write, and an immediate get drains it again.
const CREATE_PLACEHOLDER: &str = "creating queue";

/// Expiry for the creation placeholder, in seconds. Keeps a stray
/// placeholder from lingering if the draining get is never reached.
const CREATE_PLACEHOLDER_EXPIRY: u32 = 15;

/// Client for a MemcacheQ-style queue server.
///
/// Owns two connections: the generic memcached client used by [`Queue`]
/// handles for send/receive, and a raw [`LineConnection`] for the admin
/// verbs the memcached API cannot express. The registry of known queues is
/// a cache of server-side state and may be stale; the server is ground
/// truth, and [`refresh_queues`](Self::refresh_queues) re-synchronizes.
///
/// All operations are synchronous and blocking, with no retries. One client
/// means one protocol exchange at a time; the type is deliberately `!Send`,
/// so sharing it across threads without external synchronization does not
/// compile.
pub struct QueueClient {
    kv: Rc<RefCell<dyn KvClient>>,
    conn: LineConnection,
    queues: HashMap<String, Queue>,
}

impl QueueClient {
    /// Connect to the server and load the queue registry.
    ///
    /// Fails with [`QueueError::Connection`] if the server is unreachable:
    /// the initial [`refresh_queues`](Self::refresh_queues) doubles as a
    /// liveness check, so construction fails fast rather than deferring the
    /// error to the first operation.
    pub fn connect(host: &str, port: u16) -> Result<Self> {
        let kv = MemcacheKv::connect(host, port)?;
        Self::with_kv(kv, LineConnection::new(host, port))
    }

    /// Build a client from an explicit KV collaborator and admin connection.
    ///
    /// This is the seam for alternative transports and for tests, which
    /// substitute an in-memory [`KvClient`]. Performs the same initial
    /// registry refresh as [`connect`](Self::connect).
    pub fn with_kv<K: KvClient + 'static>(kv: K, conn: LineConnection) -> Result<Self> {
        let mut client = Self {
            kv: Rc::new(RefCell::new(kv)),
            conn,
            queues: HashMap::new(),
        };
        client.refresh_queues()?;
        Ok(client)
    }

    /// Re-query `stats queue` and rebuild the registry from scratch.
    ///
    /// Existing handles keep working but are no longer registered; counters
    /// on the fresh handles come from the server's response.
    pub fn refresh_queues(&mut self) -> Result<&HashMap<String, Queue>> {
        self.queues.clear();

        let lines = self.conn.send_command("stats queue", &["END"], false)?;
        for line in &lines {
            let (name, stats) = parse_stat_line(line)?;
            let queue = Queue::new(name.clone(), Rc::downgrade(&self.kv), stats);
            self.queues.insert(name, queue);
        }

        log::debug!("Refreshed registry: {} queue(s)", self.queues.len());
        Ok(&self.queues)
    }

    /// Whether `name` is a known queue.
    ///
    /// An empty registry is ambiguous between "no queues on the server" and
    /// "not yet loaded", so it triggers a refresh before the lookup.
    pub fn queue_exists(&mut self, name: &str) -> Result<bool> {
        if self.queues.is_empty() {
            self.refresh_queues()?;
        }
        Ok(self.queues.contains_key(name))
    }

    /// Get a queue handle, creating the queue server-side if needed.
    ///
    /// Idempotent: a known name returns the existing handle unchanged.
    /// Otherwise the queue is primed with a short-lived placeholder write
    /// that is immediately drained, and a handle with zeroed counters is
    /// registered. The prime-and-drain sequence is not safe under
    /// concurrent producers or consumers on the same name: another consumer
    /// can receive the placeholder, or the drain can swallow a real message.
    pub fn create_queue(&mut self, name: &str) -> Result<Queue> {
        if self.queue_exists(name)? {
            return self.get_queue(name);
        }

        {
            let mut kv = self.kv.borrow_mut();
            kv.set(name, CREATE_PLACEHOLDER, CREATE_PLACEHOLDER_EXPIRY)?;
            kv.get(name)?;
        }

        let queue = Queue::new(name.to_string(), Rc::downgrade(&self.kv), QueueStats::default());
        self.queues.insert(name.to_string(), queue.clone());
        log::debug!("Created queue '{}'", name);
        Ok(queue)
    }

    /// Delete a queue and all of its messages.
    ///
    /// Returns `true` and removes the registry entry when the server
    /// confirms `DELETED`; returns `false` on `NOT_FOUND`, leaving the
    /// registry untouched.
    pub fn delete_queue(&mut self, name: &str) -> Result<bool> {
        let response =
            self.conn
                .send_command(&format!("delete {}", name), &["DELETED", "NOT_FOUND"], true)?;

        if response.iter().any(|line| line == "DELETED") {
            self.queues.remove(name);
            log::debug!("Deleted queue '{}'", name);
            Ok(true)
        } else {
            log::debug!("Queue '{}' not found on delete", name);
            Ok(false)
        }
    }

    /// Delete every currently registered queue.
    pub fn delete_all_queues(&mut self) -> Result<()> {
        // Snapshot first: delete_queue mutates the registry.
        let names: Vec<String> = self.queues.keys().cloned().collect();
        for name in names {
            self.delete_queue(&name)?;
        }
        Ok(())
    }

    /// Look up a registered queue by name.
    pub fn get_queue(&self, name: &str) -> Result<Queue> {
        self.queues
            .get(name)
            .cloned()
            .ok_or_else(|| eyre::eyre!(QueueError::QueueNotFound(name.to_string())))
    }

    /// The current registry. May be stale; see [`refresh_queues`](Self::refresh_queues).
    pub fn queues(&self) -> &HashMap<String, Queue> {
        &self.queues
    }

    /// Tear down the admin connection with the best-effort `quit` handshake.
    ///
    /// Also runs on drop; the memcached connection closes when the last
    /// queue handle and the client are gone.
    pub fn close(&mut self) {
        self.conn.close();
    }
}

/// Parse one `STAT <name> <sent>/<received>` line from `stats queue`.
fn parse_stat_line(line: &str) -> Result<(String, QueueStats)> {
    let malformed = || eyre::eyre!(QueueError::Protocol(format!("malformed stats line: {}", line)));

    let rest = line.strip_prefix("STAT ").ok_or_else(malformed)?;
    let mut fields = rest.split_whitespace();
    let name = fields.next().ok_or_else(malformed)?;
    let counters = fields.next().ok_or_else(malformed)?;

    let (sent, received) = counters.split_once('/').ok_or_else(malformed)?;
    let stats = QueueStats {
        sent: sent.parse().map_err(|_| malformed())?,
        received: received.parse().map_err(|_| malformed())?,
    };

    Ok((name.to_string(), stats))
}
