//! # File Transport
//!
//! Appends every write to a file instead of a radio link. The dump is the
//! exact byte stream a printer would receive, which makes it easy to diff
//! jobs or replay them later with another tool.
//!
//! The file has no notify side: [`FileTransport::subscribe`] hands out a
//! channel that never delivers, so a session against a file never pauses.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

use super::{Notifications, PeripheralId, Target, Transport};
use crate::error::{CatPrintError, Result};

/// Transport that writes to a file.
#[derive(Debug)]
pub struct FileTransport {
    path: PathBuf,
    file: Option<File>,
    written: u64,
    // Held so the receiver stays open until disconnect
    sender: Option<mpsc::UnboundedSender<Vec<u8>>>,
}

impl FileTransport {
    /// Dump to `path`. The file is created (or truncated) on connect.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            file: None,
            written: 0,
            sender: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bytes written since the last connect.
    pub fn bytes_written(&self) -> u64 {
        self.written
    }
}

#[async_trait]
impl Transport for FileTransport {
    async fn discover(&mut self, _target: &Target) -> Result<Option<PeripheralId>> {
        Ok(Some(self.path.display().to_string()))
    }

    async fn connect(&mut self, _peripheral: &PeripheralId) -> Result<()> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.path)
            .await?;
        debug!("Opened {}", self.path.display());
        self.file = Some(file);
        self.written = 0;
        Ok(())
    }

    async fn subscribe(&mut self, _characteristic: Uuid) -> Result<Notifications> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.sender = Some(tx);
        Ok(rx)
    }

    async fn write(&mut self, _characteristic: Uuid, data: &[u8]) -> Result<()> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| CatPrintError::Transport("file transport not connected".into()))?;
        file.write_all(data).await?;
        self.written += data.len() as u64;
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        if let Some(mut file) = self.file.take() {
            file.flush().await?;
            debug!("Wrote {} bytes to {}", self.written, self.path.display());
        }
        self.sender = None;
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
