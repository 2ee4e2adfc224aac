//! Newline-delimited JSON transports for talking to an MCP server.
//!
//! The stdio transport owns the server process; the generic line transport
//! works over any async reader/writer pair, which is what tests use to put
//! an in-memory server on the other end of a `tokio::io::duplex`.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::time::{timeout, Duration};

use crate::error::{Error, Result};

const EXIT_GRACE_PERIOD: Duration = Duration::from_secs(2);

#[async_trait]
pub trait Transport: Send {
    async fn send(&mut self, message: &Value) -> Result<()>;

    /// Next message from the server, or `None` once the stream is closed.
    async fn receive(&mut self) -> Result<Option<Value>>;

    async fn close(&mut self) -> Result<()>;
}

pub struct LineTransport<R, W> {
    lines: Lines<BufReader<R>>,
    writer: Option<W>,
}

impl<R, W> LineTransport<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            lines: BufReader::new(reader).lines(),
            writer: Some(writer),
        }
    }
}

#[async_trait]
impl<R, W> Transport for LineTransport<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn send(&mut self, message: &Value) -> Result<()> {
        let writer = self.writer.as_mut().ok_or(Error::ConnectionClosed)?;
        let mut line = serde_json::to_string(message)?;
        line.push('\n');
        writer.write_all(line.as_bytes()).await?;
        writer.flush().await?;
        tracing::trace!(message = %line.trim_end(), "sent MCP message");
        Ok(())
    }

    async fn receive(&mut self) -> Result<Option<Value>> {
        while let Some(line) = self.lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<Value>(line) {
                Ok(value) => {
                    tracing::trace!(message = %line, "received MCP message");
                    return Ok(Some(value));
                }
                Err(e) => {
                    // Servers occasionally print banners on stdout; skip them.
                    tracing::debug!(error = %e, line = %line, "ignoring non-JSON line from MCP server");
                }
            }
        }
        Ok(None)
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            let _ = writer.shutdown().await;
        }
        Ok(())
    }
}

/// How to launch an MCP server as a child process.
#[derive(Debug, Clone)]
pub struct ServerLaunch {
    pub command: String,
    pub args: Vec<String>,
    /// Set on top of the inherited environment.
    pub env: HashMap<String, String>,
    pub inherit_stderr: bool,
}

pub struct StdioTransport {
    child: Child,
    inner: LineTransport<ChildStdout, ChildStdin>,
}

impl StdioTransport {
    pub fn spawn(launch: &ServerLaunch) -> Result<Self> {
        let mut cmd = Command::new(&launch.command);
        cmd.args(&launch.args)
            .envs(&launch.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(if launch.inherit_stderr {
                Stdio::inherit()
            } else {
                Stdio::null()
            })
            .kill_on_drop(true);

        // Values may hold credentials, log the names only.
        let env_names: Vec<&str> = launch.env.keys().map(String::as_str).collect();
        tracing::debug!(
            command = %launch.command,
            args = ?launch.args,
            env = ?env_names,
            "spawning MCP server"
        );

        let mut child = cmd
            .spawn()
            .map_err(|e| Error::Other(format!("failed to spawn '{}': {}", launch.command, e)))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::Other("failed to capture server stdin".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::Other("failed to capture server stdout".to_string()))?;

        Ok(Self {
            child,
            inner: LineTransport::new(stdout, stdin),
        })
    }

    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }
}

#[async_trait]
impl Transport for StdioTransport {
    async fn send(&mut self, message: &Value) -> Result<()> {
        self.inner.send(message).await
    }

    async fn receive(&mut self) -> Result<Option<Value>> {
        self.inner.receive().await
    }

    async fn close(&mut self) -> Result<()> {
        // Closing stdin is the MCP stdio shutdown signal.
        self.inner.close().await?;
        match timeout(EXIT_GRACE_PERIOD, self.child.wait()).await {
            Ok(status) => {
                tracing::debug!(status = ?status.ok(), "MCP server exited");
            }
            Err(_) => {
                tracing::debug!("MCP server did not exit in time, killing it");
                let _ = self.child.kill().await;
            }
        }
        Ok(())
    }
}
