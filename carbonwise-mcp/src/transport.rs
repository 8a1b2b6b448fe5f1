//! Transport layer for the MCP server.
//!
//! - [`StdioTransport`]: newline-delimited JSON over stdin/stdout
//! - [`ChannelTransport`]: in-process tokio mpsc channels, for tests

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Stdin, Stdout};
use tokio::sync::mpsc;

use crate::error::McpError;

/// Reads and writes framed JSON-RPC messages.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Next message, or `Ok(None)` once the peer has closed its side.
    async fn read_message(&mut self) -> Result<Option<String>, McpError>;

    /// Write one message, including framing, and flush.
    async fn write_message(&mut self, message: &str) -> Result<(), McpError>;

    async fn close(&mut self) -> Result<(), McpError>;
}

/// One JSON-RPC message per line on stdin/stdout.
///
/// This is how MCP hosts launch the server as a child process, so nothing
/// else may write to stdout while it is in use.
pub struct StdioTransport {
    reader: BufReader<Stdin>,
    writer: Stdout,
}

impl StdioTransport {
    pub fn new() -> Self {
        Self {
            reader: BufReader::new(tokio::io::stdin()),
            writer: tokio::io::stdout(),
        }
    }
}

impl Default for StdioTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for StdioTransport {
    async fn read_message(&mut self) -> Result<Option<String>, McpError> {
        let mut line = String::new();
        if self.reader.read_line(&mut line).await? == 0 {
            return Ok(None);
        }
        // Handles both \n and \r\n framing.
        Ok(Some(line.trim_end().to_string()))
    }

    async fn write_message(&mut self, message: &str) -> Result<(), McpError> {
        self.writer.write_all(message.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), McpError> {
        self.writer.flush().await?;
        Ok(())
    }
}

/// In-process transport backed by tokio mpsc channels.
pub struct ChannelTransport {
    receiver: mpsc::Receiver<String>,
    sender: mpsc::Sender<String>,
}

impl ChannelTransport {
    pub fn new(receiver: mpsc::Receiver<String>, sender: mpsc::Sender<String>) -> Self {
        Self { receiver, sender }
    }

    /// Two linked transports: what one writes, the other reads.
    pub fn pair(buffer: usize) -> (Self, Self) {
        let (tx_a, rx_a) = mpsc::channel(buffer);
        let (tx_b, rx_b) = mpsc::channel(buffer);
        (
            ChannelTransport::new(rx_a, tx_b),
            ChannelTransport::new(rx_b, tx_a),
        )
    }
}

#[async_trait]
impl Transport for ChannelTransport {
    async fn read_message(&mut self) -> Result<Option<String>, McpError> {
        // All senders dropped means EOF.
        Ok(self.receiver.recv().await)
    }

    async fn write_message(&mut self, message: &str) -> Result<(), McpError> {
        self.sender
            .send(message.to_string())
            .await
            .map_err(|e| McpError::TransportError {
                message: format!("channel send failed: {e}"),
            })
    }

    async fn close(&mut self) -> Result<(), McpError> {
        self.receiver.close();
        Ok(())
    }
}
