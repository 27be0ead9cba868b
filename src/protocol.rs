//! Raw line-protocol channel for queue admin commands.
//!
//! The generic memcached client covers get/set, but the queue management
//! verbs (`stats queue`, `delete <queue>`) are not expressible through that
//! API, so those commands go over a dedicated text-protocol socket.

use crate::types::QueueError;
use eyre::{Context, Result};
use std::io::{BufRead, BufReader, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::Duration;

/// Connect timeout for the admin socket.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// A lazily opened, line-oriented connection to the queue server.
///
/// Commands are written as a single CRLF-terminated line; the response is
/// read line by line until one of the caller's terminator tokens appears.
/// The socket is opened on first use and reused for the lifetime of the
/// owning client.
pub struct LineConnection {
    host: String,
    port: u16,
    stream: Option<BufReader<TcpStream>>,
}

impl LineConnection {
    /// Create a connection handle. No socket is opened until the first command.
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            host: host.to_string(),
            port,
            stream: None,
        }
    }

    fn stream(&mut self) -> Result<&mut BufReader<TcpStream>> {
        let reader = match self.stream.take() {
            Some(reader) => reader,
            None => {
                let addr = (self.host.as_str(), self.port)
                    .to_socket_addrs()
                    .map_err(|e| {
                        eyre::eyre!(QueueError::Connection(format!(
                            "{}:{}: {}",
                            self.host, self.port, e
                        )))
                    })?
                    .next()
                    .ok_or_else(|| {
                        eyre::eyre!(QueueError::Connection(format!(
                            "{}:{}: hostname did not resolve",
                            self.host, self.port
                        )))
                    })?;

                let stream = TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT).map_err(|e| {
                    eyre::eyre!(QueueError::Connection(format!(
                        "{}:{}: {}",
                        self.host, self.port, e
                    )))
                })?;

                log::debug!("Opened admin connection to {}", addr);
                BufReader::new(stream)
            }
        };

        Ok(self.stream.insert(reader))
    }

    /// Send one command and collect response lines until a terminator is seen.
    ///
    /// The command is written with a trailing CRLF. Each response line is
    /// trimmed of surrounding whitespace; a line equal to one of
    /// `terminators` ends the read and is included in the result only when
    /// `include_terminator` is true.
    ///
    /// Fails with [`QueueError::Connection`] if the socket cannot be opened
    /// and with [`QueueError::Protocol`] if the peer closes the stream
    /// before a terminator arrives.
    pub fn send_command(
        &mut self,
        command: &str,
        terminators: &[&str],
        include_terminator: bool,
    ) -> Result<Vec<String>> {
        let reader = self.stream()?;

        log::debug!("Sending admin command: {}", command);
        reader
            .get_mut()
            .write_all(format!("{}\r\n", command).as_bytes())
            .with_context(|| format!("Failed to send command: {}", command))?;

        let mut response = Vec::new();
        loop {
            let mut line = String::new();
            let read = reader
                .read_line(&mut line)
                .with_context(|| format!("Failed to read response to: {}", command))?;

            if read == 0 {
                return Err(eyre::eyre!(QueueError::Protocol(format!(
                    "connection closed before a terminator while reading response to: {}",
                    command
                ))));
            }

            let line = line.trim();
            if terminators.contains(&line) {
                if include_terminator {
                    response.push(line.to_string());
                }
                break;
            }
            response.push(line.to_string());
        }

        Ok(response)
    }

    /// Best-effort shutdown: send `quit`, then drop the socket.
    ///
    /// Errors are swallowed; the server closes its side on `quit` anyway.
    pub fn close(&mut self) {
        if let Some(mut reader) = self.stream.take() {
            let stream = reader.get_mut();
            let _ = stream.write_all(b"quit\r\n");
            let _ = stream.shutdown(Shutdown::Both);
            log::debug!("Closed admin connection to {}:{}", self.host, self.port);
        }
    }
}

impl Drop for LineConnection {
    fn drop(&mut self) {
        self.close();
    }
}
