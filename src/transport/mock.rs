//! # Scripted Transport
//!
//! An in-memory [`Transport`] that records every call and plays back
//! scripted notifications. Used by the session tests and handy for
//! exercising print jobs without hardware.
//!
//! ```
//! use catprint::transport::{MockTransport, Target, Transport};
//!
//! let rt = tokio::runtime::Runtime::new()?;
//! rt.block_on(async {
//!     let mut mock = MockTransport::new().found_after(2);
//!     let target = Target::Name("GB01".into());
//!     assert_eq!(mock.discover(&target).await?, None);
//!     assert!(mock.discover(&target).await?.is_some());
//!     Ok::<(), catprint::CatPrintError>(())
//! })?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use uuid::Uuid;

use super::{Notifications, PeripheralId, Target, Transport};
use crate::error::{CatPrintError, Result};

/// Something that happened on the mock link, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Discover,
    Connect(PeripheralId),
    Subscribe(Uuid),
    Write(Vec<u8>),
    Notify(Vec<u8>),
    Disconnect,
}

#[derive(Debug, Clone)]
struct Scheduled {
    delay: Duration,
    bytes: Vec<u8>,
}

/// Scripted peripheral.
#[derive(Debug)]
pub struct MockTransport {
    found_after: Option<u32>,
    polls: u32,
    fail_write_at: Option<usize>,
    fail_connect: bool,
    fail_disconnect: bool,
    after_write: HashMap<usize, Vec<Scheduled>>,
    writes: usize,
    sender: Option<mpsc::UnboundedSender<Vec<u8>>>,
    events: Arc<Mutex<Vec<Event>>>,
}

impl MockTransport {
    /// A peripheral that is found on the first discovery poll.
    pub fn new() -> Self {
        Self {
            found_after: Some(1),
            polls: 0,
            fail_write_at: None,
            fail_connect: false,
            fail_disconnect: false,
            after_write: HashMap::new(),
            writes: 0,
            sender: None,
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Only appear on the `polls`-th discovery poll.
    pub fn found_after(mut self, polls: u32) -> Self {
        self.found_after = Some(polls);
        self
    }

    /// Never appear.
    pub fn never_found(mut self) -> Self {
        self.found_after = None;
        self
    }

    /// Fail the `n`-th write (1-based) with a transport error.
    pub fn fail_write_at(mut self, n: usize) -> Self {
        self.fail_write_at = Some(n);
        self
    }

    pub fn fail_connect(mut self) -> Self {
        self.fail_connect = true;
        self
    }

    pub fn fail_disconnect(mut self) -> Self {
        self.fail_disconnect = true;
        self
    }

    /// Deliver `bytes` as a notification right after the `n`-th write.
    pub fn notify_after_write(self, n: usize, bytes: &[u8]) -> Self {
        self.notify_after_write_delayed(n, Duration::ZERO, bytes)
    }

    /// Deliver `bytes` `delay` after the `n`-th write completes.
    pub fn notify_after_write_delayed(mut self, n: usize, delay: Duration, bytes: &[u8]) -> Self {
        self.after_write.entry(n).or_default().push(Scheduled {
            delay,
            bytes: bytes.to_vec(),
        });
        self
    }

    /// Everything that happened so far.
    pub fn events(&self) -> Vec<Event> {
        self.lock_events().clone()
    }

    /// Payloads of every write, in order.
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.lock_events()
            .iter()
            .filter_map(|e| match e {
                Event::Write(bytes) => Some(bytes.clone()),
                _ => None,
            })
            .collect()
    }

    /// All written bytes concatenated.
    pub fn written_bytes(&self) -> Vec<u8> {
        self.writes().concat()
    }

    fn lock_events(&self) -> std::sync::MutexGuard<'_, Vec<Event>> {
        // A poisoned log still holds valid events
        self.events.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record(&self, event: Event) {
        self.lock_events().push(event);
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn discover(&mut self, target: &Target) -> Result<Option<PeripheralId>> {
        self.record(Event::Discover);
        self.polls += 1;
        match self.found_after {
            Some(n) if self.polls >= n => Ok(Some(match target {
                Target::Address(addr) => addr.clone(),
                Target::Name(name) => format!("mock-{}", name),
            })),
            _ => Ok(None),
        }
    }

    async fn connect(&mut self, peripheral: &PeripheralId) -> Result<()> {
        self.record(Event::Connect(peripheral.clone()));
        if self.fail_connect {
            return Err(CatPrintError::Transport(format!(
                "connection to {} refused",
                peripheral
            )));
        }
        Ok(())
    }

    async fn subscribe(&mut self, characteristic: Uuid) -> Result<Notifications> {
        self.record(Event::Subscribe(characteristic));
        let (tx, rx) = mpsc::unbounded_channel();
        self.sender = Some(tx);
        Ok(rx)
    }

    async fn write(&mut self, _characteristic: Uuid, data: &[u8]) -> Result<()> {
        self.writes += 1;
        if self.fail_write_at == Some(self.writes) {
            return Err(CatPrintError::Transport(format!(
                "write {} failed",
                self.writes
            )));
        }
        self.record(Event::Write(data.to_vec()));

        let Some(scheduled) = self.after_write.remove(&self.writes) else {
            return Ok(());
        };
        let Some(sender) = self.sender.clone() else {
            return Ok(());
        };

        for item in scheduled {
            if item.delay.is_zero() {
                self.record(Event::Notify(item.bytes.clone()));
                let _ = sender.send(item.bytes);
            } else {
                let sender = sender.clone();
                let events = Arc::clone(&self.events);
                tokio::spawn(async move {
                    tokio::time::sleep(item.delay).await;
                    events
                        .lock()
                        .unwrap_or_else(|e| e.into_inner())
                        .push(Event::Notify(item.bytes.clone()));
                    let _ = sender.send(item.bytes);
                });
            }
        }

        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        self.record(Event::Disconnect);
        self.sender = None;
        if self.fail_disconnect {
            return Err(CatPrintError::Transport("link dropped on disconnect".into()));
        }
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
