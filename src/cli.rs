//! CLI argument parsing for memq.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "memq",
    about = "A client for MemcacheQ-style queue servers",
    version,
    after_help = "Logs are written to: ~/.local/share/memq/logs/memq.log"
)]
pub struct Cli {
    /// Queue server host
    #[arg(short = 'H', long, global = true, default_value = "127.0.0.1")]
    pub host: String,

    /// Queue server port
    #[arg(short, long, global = true, default_value = "22201")]
    pub port: u16,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// List all queues with their counters
    List,

    /// Create a queue (no-op if it already exists)
    Create {
        /// Queue name
        name: String,
    },

    /// Delete a queue and all of its messages
    Delete {
        /// Queue name
        name: String,
    },

    /// Delete every queue on the server
    Purge,

    /// Send a message to a queue, creating it if needed
    Send {
        /// Queue name
        queue: String,

        /// Message body
        message: String,
    },

    /// Receive messages from a queue
    Recv {
        /// Queue name
        queue: String,

        /// How many messages to ask for
        #[arg(short, long, default_value = "1")]
        count: usize,
    },

    /// Show the counters for one queue
    Stats {
        /// Queue name
        queue: String,
    },
}
