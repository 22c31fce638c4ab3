//! # Packetizer
//!
//! Splits encoded frames into transfer units no larger than the link MTU
//! and writes them one at a time. Fragments keep their order and frames are
//! never interleaved: every fragment of a frame is written before the first
//! fragment of the next.
//!
//! Before each fragment the pending notifications are fed through the
//! [`FlowController`]. If the printer has asked for a pause, the packetizer
//! waits on the notification stream until the resume sequence arrives.

use std::slice::Chunks;

use tracing::trace;

use crate::error::{CatPrintError, Result};
use crate::printer::profile::DEFAULT_MTU;
use crate::session::flow::FlowController;
use crate::transport::{Notifications, Transport, WRITE_CHARACTERISTIC};

/// Fragments byte streams to a fixed transfer unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Packetizer {
    mtu: usize,
}

impl Packetizer {
    /// A zero `mtu` is treated as 1.
    pub fn new(mtu: usize) -> Self {
        Self { mtu: mtu.max(1) }
    }

    #[inline]
    pub fn mtu(&self) -> usize {
        self.mtu
    }

    /// Split `bytes` into transfer units, in order.
    pub fn fragments<'a>(&self, bytes: &'a [u8]) -> Chunks<'a, u8> {
        bytes.chunks(self.mtu)
    }

    /// Number of writes needed for `len` bytes.
    #[inline]
    pub fn fragment_count(&self, len: usize) -> usize {
        len.div_ceil(self.mtu)
    }

    /// Write `bytes` fragment by fragment, honoring flow control.
    ///
    /// Returns the number of fragments written.
    pub async fn send<T: Transport + ?Sized>(
        &self,
        transport: &mut T,
        flow: &mut FlowController,
        notifications: &mut Notifications,
        bytes: &[u8],
    ) -> Result<usize> {
        let mut written = 0;
        for fragment in self.fragments(bytes) {
            wait_for_clearance(flow, notifications).await?;
            trace!("Fragment {:02X?}", fragment);
            transport.write(WRITE_CHARACTERISTIC, fragment).await?;
            written += 1;
        }
        Ok(written)
    }
}

impl Default for Packetizer {
    fn default() -> Self {
        Self::new(DEFAULT_MTU)
    }
}

/// Apply pending notifications, then block while the printer is paused.
///
/// ## Errors
///
/// [`CatPrintError::Transport`] if the notification stream ends while
/// paused, since no resume can ever arrive.
pub async fn wait_for_clearance(
    flow: &mut FlowController,
    notifications: &mut Notifications,
) -> Result<()> {
    drain_notifications(flow, notifications);

    while flow.is_paused() {
        match notifications.recv().await {
            Some(bytes) => {
                flow.handle(&bytes);
            }
            None => {
                return Err(CatPrintError::Transport(
                    "notification stream closed while paused".to_string(),
                ));
            }
        }
    }
    Ok(())
}

/// Feed every notification that has already arrived into `flow`.
pub fn drain_notifications(flow: &mut FlowController, notifications: &mut Notifications) {
    while let Ok(bytes) = notifications.try_recv() {
        flow.handle(&bytes);
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::notify::{PAUSE_SEQUENCE, RESUME_SEQUENCE};
    use crate::session::flow::FlowState;
    use crate::transport::MockTransport;
    use crate::transport::NOTIFY_CHARACTERISTIC;
    use pretty_assertions::assert_eq;
    use std::time::Duration;
    use tokio::sync::mpsc;

    #[test]
    fn test_fragments_respect_mtu() {
        let packetizer = Packetizer::new(30);
        let bytes: Vec<u8> = (0..100).collect();
        let sizes: Vec<usize> = packetizer.fragments(&bytes).map(|f| f.len()).collect();
        assert_eq!(sizes, vec![30, 30, 30, 10]);
        assert_eq!(packetizer.fragment_count(bytes.len()), 4);
        assert_eq!(packetizer.fragments(&bytes).collect::<Vec<_>>().concat(), bytes);
    }

    #[test]
    fn test_small_and_empty_inputs() {
        let packetizer = Packetizer::default();
        assert_eq!(packetizer.fragments(&[1, 2, 3]).count(), 1);
        assert_eq!(packetizer.fragments(&[]).count(), 0);
        assert_eq!(packetizer.fragment_count(0), 0);
    }

    #[test]
    fn test_zero_mtu_is_clamped() {
        assert_eq!(Packetizer::new(0).mtu(), 1);
    }

    #[tokio::test]
    async fn test_send_writes_every_fragment() {
        let mut mock = MockTransport::new();
        let mut rx = mock.subscribe(NOTIFY_CHARACTERISTIC).await.unwrap();
        let mut flow = FlowController::new();
        let bytes: Vec<u8> = (0..65).collect();

        let written = Packetizer::new(20)
            .send(&mut mock, &mut flow, &mut rx, &bytes)
            .await
            .unwrap();

        assert_eq!(written, 4);
        assert!(mock.writes().iter().all(|w| w.len() <= 20));
        assert_eq!(mock.written_bytes(), bytes);
    }

    #[tokio::test]
    async fn test_clearance_waits_for_resume() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut flow = FlowController::new();
        tx.send(PAUSE_SEQUENCE.to_vec()).unwrap();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            tx.send(RESUME_SEQUENCE.to_vec()).unwrap();
        });

        wait_for_clearance(&mut flow, &mut rx).await.unwrap();
        assert_eq!(flow.state(), FlowState::Transmitting);
    }

    #[tokio::test]
    async fn test_closed_stream_while_paused_is_an_error() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut flow = FlowController::new();
        tx.send(PAUSE_SEQUENCE.to_vec()).unwrap();
        drop(tx);

        let err = wait_for_clearance(&mut flow, &mut rx).await;
        assert!(matches!(err, Err(CatPrintError::Transport(_))));
        assert!(flow.is_paused());
    }

    #[tokio::test]
    async fn test_closed_stream_while_transmitting_is_fine() {
        let (tx, mut rx) = mpsc::unbounded_channel::<Vec<u8>>();
        drop(tx);
        let mut flow = FlowController::new();
        wait_for_clearance(&mut flow, &mut rx).await.unwrap();
    }
}
