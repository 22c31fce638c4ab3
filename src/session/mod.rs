//! # Print Sessions
//!
//! A [`Session`] owns everything needed to run one job against one printer:
//! the [`PrinterProfile`], the [`CommandQueue`] and the [`FlowController`].
//!
//! ## Lifecycle
//!
//! ```text
//! enqueue ... ──▶ print(transport)
//!                   │ resolve every operation to frames (fail fast)
//!                   │ discover (bounded poll) ──▶ connect ──▶ subscribe
//!                   │ for each operation, for each frame:
//!                   │     fragment ──▶ wait while paused ──▶ write
//!                   │     settle after every scanline
//!                   │ settle after every operation
//!                   ▼ disconnect
//! ```
//!
//! Validation, discovery and connection all happen before the queue is
//! touched, so a job that fails there can simply be retried. Once the first
//! byte is on its way the queue is emptied; a failure after that point is
//! reported as [`CatPrintError::JobAborted`] with the number of operations
//! that reached the printer.
//!
//! ## Example
//!
//! ```
//! use catprint::session::Session;
//! use catprint::transport::{MockTransport, Target};
//! use catprint::PrinterProfile;
//!
//! let rt = tokio::runtime::Runtime::new()?;
//! let mut session = Session::new(PrinterProfile::classic());
//! session.set_target(Target::Name("GB01".into()));
//! session.set_quality(5).set_energy(0x1000).feed(5);
//!
//! let mut printer = MockTransport::new();
//! let report = rt.block_on(session.print(&mut printer))?;
//! assert_eq!(report.frames, 3);
//! assert!(session.queue().is_empty());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod flow;
pub mod packetizer;
pub mod queue;

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{CatPrintError, Result};
use crate::printer::PrinterProfile;
use crate::protocol::commands::{DrawingMode, FeedSpeed, Lattice, Opcode};
use crate::protocol::frame::Frame;
use crate::protocol::notify::StatusReport;
use crate::transport::{
    self, Notifications, PeripheralId, Target, Transport, NOTIFY_CHARACTERISTIC,
};

pub use flow::{FlowController, FlowState};
pub use packetizer::Packetizer;
pub use queue::{CommandQueue, ImageJob, Operation};

/// Discovery polls before giving up.
pub const DISCOVERY_ATTEMPTS: u32 = 50;

/// Pause between discovery polls (milliseconds)
pub const DISCOVERY_INTERVAL_MS: u64 = 100;

/// Pause after every scanline frame (milliseconds)
pub const LINE_DELAY_MS: u64 = 40;

/// Pause after every operation (milliseconds)
pub const SETTLE_DELAY_MS: u64 = 100;

/// Timing knobs for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub discovery_attempts: u32,
    pub discovery_interval: Duration,
    /// Keeps the printer's line buffer from overrunning.
    pub line_delay: Duration,
    pub settle_delay: Duration,
}

impl SessionConfig {
    /// No delays at all. Only safe against transports without a real
    /// printer behind them.
    pub fn immediate() -> Self {
        Self {
            discovery_attempts: DISCOVERY_ATTEMPTS,
            discovery_interval: Duration::ZERO,
            line_delay: Duration::ZERO,
            settle_delay: Duration::ZERO,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            discovery_attempts: DISCOVERY_ATTEMPTS,
            discovery_interval: Duration::from_millis(DISCOVERY_INTERVAL_MS),
            line_delay: Duration::from_millis(LINE_DELAY_MS),
            settle_delay: Duration::from_millis(SETTLE_DELAY_MS),
        }
    }
}

/// What a finished job put on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PrintReport {
    /// Operations fully transmitted
    pub operations: usize,
    pub frames: usize,
    pub fragments: usize,
    pub bytes: usize,
}

/// Queue, flow state and settings for one printer.
#[derive(Debug)]
pub struct Session {
    profile: PrinterProfile,
    config: SessionConfig,
    target: Option<Target>,
    queue: CommandQueue,
    flow: FlowController,
}

impl Session {
    pub fn new(profile: PrinterProfile) -> Self {
        Self::with_config(profile, SessionConfig::default())
    }

    pub fn with_config(profile: PrinterProfile, config: SessionConfig) -> Self {
        Self {
            profile,
            config,
            target: None,
            queue: CommandQueue::new(),
            flow: FlowController::new(),
        }
    }

    pub fn profile(&self) -> &PrinterProfile {
        &self.profile
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn set_target(&mut self, target: Target) -> &mut Self {
        self.target = Some(target);
        self
    }

    /// Target a printer by address.
    ///
    /// Accepts a MAC address or a platform peripheral UUID (macOS hides MACs
    /// behind UUIDs). Anything else is rejected and the current target is
    /// kept.
    pub fn set_address(&mut self, address: impl Into<String>) -> Result<&mut Self> {
        let address = address.into();
        if !transport::is_valid_mac(&address) && !transport::is_platform_id(&address) {
            return Err(CatPrintError::Config(format!(
                "'{}' is neither a MAC address nor a peripheral UUID",
                address
            )));
        }
        Ok(self.set_target(Target::Address(address)))
    }

    /// Target a printer by its advertised name.
    pub fn set_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.set_target(Target::Name(name.into()))
    }

    pub fn target(&self) -> Option<&Target> {
        self.target.as_ref()
    }

    pub fn queue(&self) -> &CommandQueue {
        &self.queue
    }

    pub fn clear_queue(&mut self) {
        self.queue.clear();
    }

    pub fn flow(&self) -> &FlowController {
        &self.flow
    }

    /// Last status report received from the printer.
    pub fn last_status(&self) -> Option<StatusReport> {
        self.flow.last_status()
    }

    // ========== Queue building ==========

    pub fn enqueue(&mut self, operation: Operation) -> &mut Self {
        self.queue.push(operation);
        self
    }

    pub fn set_energy(&mut self, energy: u16) -> &mut Self {
        self.enqueue(Operation::SetEnergy(energy))
    }

    pub fn set_quality(&mut self, quality: u8) -> &mut Self {
        self.enqueue(Operation::SetQuality(quality))
    }

    pub fn set_drawing_mode(&mut self, mode: DrawingMode) -> &mut Self {
        self.enqueue(Operation::SetDrawingMode(mode))
    }

    pub fn feed(&mut self, steps: u16) -> &mut Self {
        self.enqueue(Operation::Feed(steps))
    }

    pub fn retract(&mut self, steps: u16) -> &mut Self {
        self.enqueue(Operation::Retract(steps))
    }

    pub fn draw_image(&mut self, job: ImageJob) -> &mut Self {
        self.enqueue(Operation::DrawImage(job))
    }

    pub fn separator(&mut self) -> &mut Self {
        self.enqueue(Operation::Separator)
    }

    pub fn query_state(&mut self) -> &mut Self {
        self.enqueue(Operation::QueryState)
    }

    pub fn query_info(&mut self) -> &mut Self {
        self.enqueue(Operation::QueryInfo)
    }

    /// Queue the usual job setup for this profile.
    ///
    /// State query, default quality, lattice start, default energy, image
    /// mode and image feed speed. Steps the profile has no opcode for are
    /// left out.
    pub fn enqueue_prologue(&mut self) -> &mut Self {
        let quality = self.profile.quality.default;
        let energy = self.profile.default_energy;
        for operation in [
            Operation::QueryState,
            Operation::SetQuality(quality),
            Operation::Lattice(Lattice::Start),
            Operation::SetEnergy(energy),
            Operation::SetDrawingMode(DrawingMode::Image),
            Operation::AuxFeed(FeedSpeed::Image),
        ] {
            self.enqueue_if_supported(operation);
        }
        self
    }

    /// Queue the usual job teardown: blank feed speed, feed past the tear
    /// bar, lattice finish.
    pub fn enqueue_epilogue(&mut self) -> &mut Self {
        let steps = self.profile.finish_feed;
        for operation in [
            Operation::AuxFeed(FeedSpeed::Blank),
            Operation::Feed(steps),
            Operation::Lattice(Lattice::Finish),
        ] {
            self.enqueue_if_supported(operation);
        }
        self
    }

    fn enqueue_if_supported(&mut self, operation: Operation) {
        let supported = operation
            .as_command()
            .is_none_or(|command| self.profile.supports(command.opcode()));
        if supported {
            self.queue.push(operation);
        } else {
            debug!("{} has no {} command, skipping", self.profile.name, operation.name());
        }
    }

    // ========== Offline ==========

    /// Every frame the queue would send, in order. Does not consume it.
    pub fn frames(&self) -> Result<Vec<Frame>> {
        Ok(self
            .queue
            .resolve_all(&self.profile)?
            .into_iter()
            .flatten()
            .collect())
    }

    /// The complete byte stream the queue would send.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        for frame in self.frames()? {
            out.extend(frame.to_bytes()?);
        }
        Ok(out)
    }

    // ========== Execution ==========

    /// Run the queued job on `transport`.
    ///
    /// ## Errors
    ///
    /// Before anything is sent, with the queue left intact:
    /// - [`CatPrintError::NoTargetConfigured`] (no transport calls made)
    /// - [`CatPrintError::InvalidCommandPayload`] from resolving the queue
    /// - [`CatPrintError::DeviceNotFound`] after the configured polls
    /// - transport errors from connect or subscribe
    ///
    /// After transmission started the queue is always cleared, and failures
    /// come back as [`CatPrintError::JobAborted`].
    pub async fn print<T: Transport + ?Sized>(&mut self, transport: &mut T) -> Result<PrintReport> {
        let target = self.target.clone().ok_or(CatPrintError::NoTargetConfigured)?;
        let resolved = self.queue.resolve_all(&self.profile)?;

        let peripheral = self.discover(transport, &target).await?;
        info!("Connecting to {}", peripheral);
        transport.connect(&peripheral).await?;
        let mut notifications = match transport.subscribe(NOTIFY_CHARACTERISTIC).await {
            Ok(notifications) => notifications,
            Err(e) => {
                if let Err(close) = transport.disconnect().await {
                    warn!("Disconnect after failed subscribe: {}", close);
                }
                return Err(e);
            }
        };
        self.flow.reset();

        let operations = self.queue.take();
        let total = operations.len();
        info!("Printing {} operations on {}", total, self.profile.name);

        let mut report = PrintReport::default();
        let outcome = self
            .transmit(transport, &mut notifications, &operations, resolved, &mut report)
            .await;

        packetizer::drain_notifications(&mut self.flow, &mut notifications);
        let closed = transport.disconnect().await;

        match outcome {
            Ok(()) => {
                // Everything reached the printer, so the report stands
                if let Err(e) = closed {
                    warn!("Disconnect after finished job: {}", e);
                }
                info!(
                    "Job complete: {} frames in {} fragments ({} bytes)",
                    report.frames, report.fragments, report.bytes
                );
                Ok(report)
            }
            Err(source) => {
                if let Err(e) = closed {
                    warn!("Disconnect after failed job: {}", e);
                }
                Err(CatPrintError::JobAborted {
                    completed: report.operations,
                    total,
                    source: Box::new(source),
                })
            }
        }
    }

    async fn discover<T: Transport + ?Sized>(
        &self,
        transport: &mut T,
        target: &Target,
    ) -> Result<PeripheralId> {
        let attempts = self.config.discovery_attempts;
        debug!("Looking for printer by {}", target);

        for attempt in 1..=attempts {
            if let Some(peripheral) = transport.discover(target).await? {
                debug!("Found {} on poll {}", peripheral, attempt);
                return Ok(peripheral);
            }
            if attempt < attempts && !self.config.discovery_interval.is_zero() {
                tokio::time::sleep(self.config.discovery_interval).await;
            }
        }

        Err(CatPrintError::DeviceNotFound {
            target: target.to_string(),
            attempts,
        })
    }

    async fn transmit<T: Transport + ?Sized>(
        &mut self,
        transport: &mut T,
        notifications: &mut Notifications,
        operations: &[Operation],
        resolved: Vec<Vec<Frame>>,
        report: &mut PrintReport,
    ) -> Result<()> {
        let packetizer = Packetizer::new(self.profile.mtu);
        let draw_line = Opcode::DrawLine.byte();

        for (operation, frames) in operations.iter().zip(resolved) {
            debug!("{}: {} frames", operation.name(), frames.len());

            for frame in frames {
                let bytes = frame.to_bytes()?;
                report.fragments += packetizer
                    .send(transport, &mut self.flow, notifications, &bytes)
                    .await?;
                report.frames += 1;
                report.bytes += bytes.len();

                if frame.opcode == draw_line && !self.config.line_delay.is_zero() {
                    tokio::time::sleep(self.config.line_delay).await;
                }
            }

            report.operations += 1;
            if !self.config.settle_delay.is_zero() {
                tokio::time::sleep(self.config.settle_delay).await;
            }
        }

        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn names(session: &Session) -> Vec<&'static str> {
        session.queue().iter().map(|op| op.name()).collect()
    }

    #[test]
    fn test_default_config() {
        let config = SessionConfig::default();
        assert_eq!(config.discovery_attempts, 50);
        assert_eq!(config.discovery_interval, Duration::from_millis(100));
        assert_eq!(config.line_delay, Duration::from_millis(40));
        assert_eq!(config.settle_delay, Duration::from_millis(100));
    }

    #[test]
    fn test_gb01_prologue_and_epilogue() {
        let mut session = Session::new(PrinterProfile::gb01());
        session.enqueue_prologue().enqueue_epilogue();
        assert_eq!(
            names(&session),
            vec![
                "query_state",
                "set_quality",
                "lattice",
                "set_energy",
                "set_drawing_mode",
                "aux_feed",
                "aux_feed",
                "feed",
                "lattice",
            ]
        );
        assert!(session.frames().is_ok());
    }

    #[test]
    fn test_classic_prologue_skips_unsupported_steps() {
        let mut session = Session::new(PrinterProfile::classic());
        session.enqueue_prologue().enqueue_epilogue();
        assert_eq!(
            names(&session),
            vec!["query_state", "set_quality", "set_energy", "set_drawing_mode", "feed"]
        );

        let frames = session.frames().unwrap();
        assert_eq!(frames[1].payload, vec![5]);
        assert_eq!(frames[2].payload, vec![0x10, 0x00]);
        assert_eq!(frames[4].payload, vec![0x00, 0x05]);
    }

    #[test]
    fn test_encode_concatenates_frames() {
        let mut session = Session::new(PrinterProfile::classic());
        session.set_quality(3).feed(1);
        let bytes = session.encode().unwrap();
        assert_eq!(
            bytes,
            vec![
                0x51, 0x78, 0xA4, 0x00, 0x01, 0x00, 0x03, 0x09, 0xFF, // quality 3
                0x51, 0x78, 0xA1, 0x00, 0x02, 0x00, 0x00, 0x01, 0x07, 0xFF, // feed 1
            ]
        );
        // Offline encoding leaves the queue alone
        assert_eq!(session.queue().len(), 2);
    }

    #[test]
    fn test_set_address_and_name() {
        let mut session = Session::new(PrinterProfile::gb01());
        assert_eq!(session.target(), None);
        session.set_address("AA:BB:CC:DD:EE:FF").unwrap();
        assert_eq!(
            session.target(),
            Some(&Target::Address("AA:BB:CC:DD:EE:FF".into()))
        );
        session.set_name("GB01");
        assert_eq!(session.target(), Some(&Target::Name("GB01".into())));
    }

    #[test]
    fn test_set_address_validates() {
        let mut session = Session::new(PrinterProfile::gb01());
        session
            .set_address("6F1C2A3B-0D4E-4F50-8A6B-7C8D9E0F1A2B")
            .unwrap();
        assert!(matches!(session.target(), Some(Target::Address(_))));

        let err = session.set_address("printer-in-the-kitchen").unwrap_err();
        assert!(matches!(err, CatPrintError::Config(_)));
        // Rejected addresses leave the previous target in place
        assert_eq!(
            session.target(),
            Some(&Target::Address(
                "6F1C2A3B-0D4E-4F50-8A6B-7C8D9E0F1A2B".into()
            ))
        );
        assert!(session.set_address("00-11-22-33-44-55").is_err());
    }
}
