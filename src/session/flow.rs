//! # Flow Control
//!
//! The printer has a small receive buffer. When it fills up the printer
//! sends the pause sequence on the notify characteristic, and the resume
//! sequence once it has drained. The host must not write while paused.
//!
//! ```text
//!                  pause sequence
//!   ┌──────────────┐ ───────────▶ ┌────────┐
//!   │ Transmitting │              │ Paused │
//!   └──────────────┘ ◀─────────── └────────┘
//!                  resume sequence
//! ```
//!
//! Nothing else changes the state. Other notifications are only inspected
//! for status reports, which are remembered as the last known
//! [`StatusReport`].
//!
//! The controller only records state. Waiting for a resume is done by the
//! packetizer, which reads the notification stream and feeds it back here.

use tracing::{debug, warn};

use crate::protocol::notify::{self, FlowSignal, Notification, StatusReport};

/// Whether the host may send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlowState {
    #[default]
    Transmitting,
    Paused,
}

/// Tracks pause/resume requests and status reports from the printer.
#[derive(Debug)]
pub struct FlowController {
    state: FlowState,
    last_status: Option<StatusReport>,
}

impl FlowController {
    pub fn new() -> Self {
        Self {
            state: FlowState::Transmitting,
            last_status: None,
        }
    }

    #[inline]
    pub fn state(&self) -> FlowState {
        self.state
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.state() == FlowState::Paused
    }

    /// Most recent status report, if the printer has sent one.
    #[inline]
    pub fn last_status(&self) -> Option<StatusReport> {
        self.last_status
    }

    /// Back to `Transmitting` with no status, for a fresh connection.
    pub fn reset(&mut self) {
        self.state = FlowState::Transmitting;
        self.last_status = None;
    }

    /// Feed one inbound notification through the state machine.
    ///
    /// Returns the classified notification, or `None` if the bytes could not
    /// be decoded. Undecodable notifications are logged and otherwise ignored.
    pub fn handle(&mut self, bytes: &[u8]) -> Option<Notification> {
        let notification = match notify::classify(bytes) {
            Ok(n) => n,
            Err(e) => {
                warn!("Ignoring notification {:02X?}: {}", bytes, e);
                return None;
            }
        };

        match &notification {
            Notification::Flow(FlowSignal::Pause) => {
                debug!("Printer requested pause");
                self.state = FlowState::Paused;
            }
            Notification::Flow(FlowSignal::Resume) => {
                debug!("Printer requested resume");
                self.state = FlowState::Transmitting;
            }
            Notification::Status(report) => {
                if report.is_ok() {
                    debug!("Printer status OK");
                } else {
                    warn!("Printer status: {}", report.describe().join(", "));
                }
                self.last_status = Some(*report);
            }
            Notification::Other(frame) => {
                debug!(
                    "Notification opcode {:#04x}, {} payload bytes",
                    frame.opcode,
                    frame.payload.len()
                );
            }
        }

        Some(notification)
    }
}

impl Default for FlowController {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::frame;
    use crate::protocol::notify::{PAUSE_SEQUENCE, RESUME_SEQUENCE};

    #[test]
    fn test_initial_state() {
        let flow = FlowController::new();
        assert_eq!(flow.state(), FlowState::Transmitting);
        assert_eq!(flow.last_status(), None);
    }

    #[test]
    fn test_pause_then_resume() {
        let mut flow = FlowController::new();
        flow.handle(&PAUSE_SEQUENCE);
        assert_eq!(flow.state(), FlowState::Paused);
        // Repeated pause stays paused
        flow.handle(&PAUSE_SEQUENCE);
        assert!(flow.is_paused());
        flow.handle(&RESUME_SEQUENCE);
        assert_eq!(flow.state(), FlowState::Transmitting);
    }

    #[test]
    fn test_perturbed_sequences_do_not_transition() {
        for i in 0..PAUSE_SEQUENCE.len() {
            let mut flow = FlowController::new();
            let mut bytes = PAUSE_SEQUENCE;
            bytes[i] = bytes[i].wrapping_add(1);
            flow.handle(&bytes);
            assert_eq!(flow.state(), FlowState::Transmitting, "pause byte {}", i);
        }

        for i in 0..RESUME_SEQUENCE.len() {
            let mut flow = FlowController::new();
            flow.handle(&PAUSE_SEQUENCE);
            let mut bytes = RESUME_SEQUENCE;
            bytes[i] = bytes[i].wrapping_add(1);
            flow.handle(&bytes);
            assert_eq!(flow.state(), FlowState::Paused, "resume byte {}", i);
        }
    }

    #[test]
    fn test_status_does_not_change_state() {
        let mut flow = FlowController::new();
        flow.handle(&PAUSE_SEQUENCE);

        let status = frame::encode(0xA3, &[0b0000_0001]).unwrap();
        let n = flow.handle(&status);
        assert_eq!(n, Some(Notification::Status(StatusReport::NO_PAPER)));
        assert_eq!(flow.state(), FlowState::Paused);
        assert_eq!(flow.last_status(), Some(StatusReport::NO_PAPER));
    }

    #[test]
    fn test_garbage_is_ignored() {
        let mut flow = FlowController::new();
        assert_eq!(flow.handle(&[0xDE, 0xAD]), None);
        assert_eq!(flow.state(), FlowState::Transmitting);
    }

    #[test]
    fn test_reset() {
        let mut flow = FlowController::new();
        flow.handle(&PAUSE_SEQUENCE);
        flow.handle(&frame::encode(0xA3, &[0x08]).unwrap());
        flow.reset();
        assert_eq!(flow.state(), FlowState::Transmitting);
        assert_eq!(flow.last_status(), None);
    }
}
