//! Shared test infrastructure for memq integration tests.
//!
//! Provides a scripted admin-protocol server, an in-memory KV fake, and a
//! TestEnv helper for consistent setup/teardown.

#![allow(dead_code)]

use memq::{KvClient, LineConnection, QueueClient};
use std::collections::{HashMap, VecDeque};
use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;

type QueueCounters = Arc<Mutex<HashMap<String, (u64, u64)>>>;

/// A scripted queue server speaking the admin line protocol on an ephemeral
/// port: `stats queue`, `delete <name>`, and `quit`.
pub struct MockQueueServer {
    port: u16,
    queues: QueueCounters,
}

impl MockQueueServer {
    /// Start a well-behaved server.
    pub fn start() -> Self {
        Self::start_inner(false)
    }

    /// Start a server that closes the connection mid-reply, before the
    /// `END` terminator of `stats queue`.
    pub fn start_truncating() -> Self {
        Self::start_inner(true)
    }

    fn start_inner(truncate: bool) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind mock server");
        let port = listener
            .local_addr()
            .expect("Failed to read mock server addr")
            .port();
        let queues: QueueCounters = Arc::new(Mutex::new(HashMap::new()));

        let state = Arc::clone(&queues);
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { break };
                handle_connection(stream, &state, truncate);
            }
        });

        Self { port, queues }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Seed a queue with counters, as if other clients had used it.
    pub fn add_queue(&self, name: &str, sent: u64, received: u64) {
        self.queues
            .lock()
            .expect("mock server state poisoned")
            .insert(name.to_string(), (sent, received));
    }

    /// Drop a queue server-side without telling any client.
    pub fn remove_queue(&self, name: &str) {
        self.queues
            .lock()
            .expect("mock server state poisoned")
            .remove(name);
    }
}

fn handle_connection(stream: TcpStream, queues: &QueueCounters, truncate: bool) {
    let mut reader = BufReader::new(stream);
    loop {
        let mut line = String::new();
        let Ok(read) = reader.read_line(&mut line) else {
            return;
        };
        if read == 0 {
            return;
        }

        let command = line.trim().to_string();
        let mut reply = Vec::new();

        if command == "stats queue" {
            let mut entries: Vec<(String, u64, u64)> = queues
                .lock()
                .expect("mock server state poisoned")
                .iter()
                .map(|(name, &(sent, received))| (name.clone(), sent, received))
                .collect();
            entries.sort();

            for (name, sent, received) in entries {
                reply.push(format!("STAT {} {}/{}", name, sent, received));
            }

            if truncate {
                // Emit the STAT lines but hang up before END.
                for line in reply {
                    let _ = write!(reader.get_mut(), "{}\r\n", line);
                }
                return;
            }
            reply.push("END".to_string());
        } else if let Some(name) = command.strip_prefix("delete ") {
            let removed = queues
                .lock()
                .expect("mock server state poisoned")
                .remove(name)
                .is_some();
            reply.push(if removed { "DELETED" } else { "NOT_FOUND" }.to_string());
        } else if command == "quit" {
            return;
        } else {
            reply.push("ERROR".to_string());
        }

        for line in reply {
            if write!(reader.get_mut(), "{}\r\n", line).is_err() {
                return;
            }
        }
    }
}

/// In-memory FIFO stand-in for the memcached collaborator: `set` enqueues,
/// `get` dequeues, matching MemcacheQ's behavior for queue-backed keys.
pub struct MemoryKv {
    queues: HashMap<String, VecDeque<String>>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self {
            queues: HashMap::new(),
        }
    }
}

impl Default for MemoryKv {
    fn default() -> Self {
        Self::new()
    }
}

impl KvClient for MemoryKv {
    fn set(&mut self, key: &str, value: &str, _expiry: u32) -> eyre::Result<bool> {
        self.queues
            .entry(key.to_string())
            .or_default()
            .push_back(value.to_string());
        Ok(true)
    }

    fn get(&mut self, key: &str) -> eyre::Result<Option<String>> {
        Ok(self.queues.get_mut(key).and_then(|queue| queue.pop_front()))
    }
}

/// Test environment: a mock admin server plus a connected client backed by
/// an in-memory KV.
pub struct TestEnv {
    pub server: MockQueueServer,
    pub client: QueueClient,
}

impl TestEnv {
    /// Environment with no pre-existing queues.
    pub fn new() -> Self {
        Self::with_queues(&[])
    }

    /// Environment whose server already reports the given
    /// `(name, sent, received)` queues.
    pub fn with_queues(entries: &[(&str, u64, u64)]) -> Self {
        let server = MockQueueServer::start();
        for &(name, sent, received) in entries {
            server.add_queue(name, sent, received);
        }

        let client = QueueClient::with_kv(
            MemoryKv::new(),
            LineConnection::new("127.0.0.1", server.port()),
        )
        .expect("Failed to connect client");

        Self { server, client }
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}
