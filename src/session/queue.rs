//! # Command Queue
//!
//! A print job is an ordered list of [`Operation`] values. Nothing is sent
//! while building the queue; the session resolves each operation into
//! frames against a [`PrinterProfile`] when the job runs, so a queue can
//! be inspected or resolved offline.
//!
//! | Operation | Frames |
//! |-----------|--------|
//! | configuration (energy, quality, mode, feed, ...) | exactly one |
//! | [`Operation::DrawImage`] | one per scanline, optional feed after each, optional trailing feed |
//! | [`Operation::Separator`] | three (scanline, feed 1) pairs |

use std::collections::{VecDeque, vec_deque};
use std::mem;

use image::DynamicImage;
use tracing::debug;

use crate::error::Result;
use crate::printer::PrinterProfile;
use crate::protocol::commands::{Command, DrawingMode, FeedSpeed, Lattice};
use crate::protocol::frame::Frame;
use crate::render::bitmap::{BitmapEncoder, BlankLines};
use crate::render::dither::PixelPolicy;

/// Number of bars printed by [`Operation::Separator`].
pub const SEPARATOR_BARS: usize = 3;

/// An image plus the settings used to turn it into scanlines.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageJob {
    pub image: DynamicImage,
    pub policy: PixelPolicy,
    pub blank_lines: BlankLines,
    /// Feed this many steps after every scanline.
    pub line_feed: Option<u16>,
    /// Feed this many steps after the last scanline.
    pub trailing_feed: Option<u16>,
}

impl ImageJob {
    /// Strict raster job: luminance threshold, every line sent, no feeds.
    ///
    /// Suited to full-bleed images printed between a prologue and an
    /// epilogue, which handle paper movement.
    pub fn raster(image: DynamicImage) -> Self {
        Self {
            image,
            policy: PixelPolicy::default(),
            blank_lines: BlankLines::Keep,
            line_feed: None,
            trailing_feed: None,
        }
    }

    /// Rendered text or graphics on a transparent canvas.
    ///
    /// Only dark opaque pixels print, blank lines are dropped, each line is
    /// followed by a one-step feed and the image by a five-step feed.
    pub fn graphics(image: DynamicImage) -> Self {
        Self {
            image,
            policy: PixelPolicy::DarkOpaque,
            blank_lines: BlankLines::Skip,
            line_feed: Some(1),
            trailing_feed: Some(5),
        }
    }

    pub fn with_policy(mut self, policy: PixelPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_blank_lines(mut self, blank_lines: BlankLines) -> Self {
        self.blank_lines = blank_lines;
        self
    }

    pub fn with_line_feed(mut self, steps: Option<u16>) -> Self {
        self.line_feed = steps;
        self
    }

    pub fn with_trailing_feed(mut self, steps: Option<u16>) -> Self {
        self.trailing_feed = steps;
        self
    }

    /// Frames for this image on `profile`.
    pub fn resolve(&self, profile: &PrinterProfile) -> Result<Vec<Frame>> {
        let encoder = BitmapEncoder::for_profile(profile, self.policy, self.blank_lines);
        let lines = encoder.render(&self.image);

        let per_line = if self.line_feed.is_some() { 2 } else { 1 };
        let mut frames = Vec::with_capacity(lines.len() * per_line + 1);
        for line in lines {
            frames.push(Command::DrawLine(line.into_bytes()).to_frame(profile)?);
            if let Some(steps) = self.line_feed {
                frames.push(Command::FeedPaper(steps).to_frame(profile)?);
            }
        }
        if let Some(steps) = self.trailing_feed {
            frames.push(Command::FeedPaper(steps).to_frame(profile)?);
        }

        Ok(frames)
    }
}

/// One queued step of a print job.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    SetEnergy(u16),
    SetQuality(u8),
    SetDrawingMode(DrawingMode),
    Feed(u16),
    Retract(u16),
    DrawImage(ImageJob),
    /// Three full-width bars, each followed by a one-step feed.
    Separator,
    QueryState,
    QueryInfo,
    Lattice(Lattice),
    AuxFeed(FeedSpeed),
}

impl Operation {
    /// The single command behind a configuration operation.
    ///
    /// `None` for [`Operation::DrawImage`] and [`Operation::Separator`],
    /// which expand to several frames.
    pub fn as_command(&self) -> Option<Command> {
        let command = match self {
            Operation::SetEnergy(energy) => Command::SetEnergy(*energy),
            Operation::SetQuality(quality) => Command::SetQuality(*quality),
            Operation::SetDrawingMode(mode) => Command::DrawingMode(*mode),
            Operation::Feed(steps) => Command::FeedPaper(*steps),
            Operation::Retract(steps) => Command::RetractPaper(*steps),
            Operation::QueryState => Command::GetDeviceState,
            Operation::QueryInfo => Command::GetDeviceInfo,
            Operation::Lattice(lattice) => Command::Lattice(*lattice),
            Operation::AuxFeed(speed) => Command::AuxFeed(*speed),
            Operation::DrawImage(_) | Operation::Separator => return None,
        };
        Some(command)
    }

    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::SetEnergy(_) => "set_energy",
            Operation::SetQuality(_) => "set_quality",
            Operation::SetDrawingMode(_) => "set_drawing_mode",
            Operation::Feed(_) => "feed",
            Operation::Retract(_) => "retract",
            Operation::DrawImage(_) => "draw_image",
            Operation::Separator => "separator",
            Operation::QueryState => "query_state",
            Operation::QueryInfo => "query_info",
            Operation::Lattice(_) => "lattice",
            Operation::AuxFeed(_) => "aux_feed",
        }
    }

    /// Resolve into frames, validating every payload against `profile`.
    pub fn resolve(&self, profile: &PrinterProfile) -> Result<Vec<Frame>> {
        match self {
            Operation::DrawImage(job) => job.resolve(profile),
            Operation::Separator => {
                let bar = vec![0xFF; profile.width_bytes()];
                let mut frames = Vec::with_capacity(SEPARATOR_BARS * 2);
                for _ in 0..SEPARATOR_BARS {
                    frames.push(Command::DrawLine(bar.clone()).to_frame(profile)?);
                    frames.push(Command::FeedPaper(1).to_frame(profile)?);
                }
                Ok(frames)
            }
            other => match other.as_command() {
                Some(command) => Ok(vec![command.to_frame(profile)?]),
                None => Ok(Vec::new()),
            },
        }
    }
}

/// Ordered operations waiting to be sent.
#[derive(Debug, Clone, Default)]
pub struct CommandQueue {
    operations: VecDeque<Operation>,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, operation: Operation) {
        debug!("Queued {}", operation.name());
        self.operations.push_back(operation);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn iter(&self) -> vec_deque::Iter<'_, Operation> {
        self.operations.iter()
    }

    pub fn clear(&mut self) {
        self.operations.clear();
    }

    /// Remove and return every queued operation, leaving the queue empty.
    pub fn take(&mut self) -> Vec<Operation> {
        mem::take(&mut self.operations).into()
    }

    /// Resolve every operation in order, one frame list per operation.
    pub fn resolve_all(&self, profile: &PrinterProfile) -> Result<Vec<Vec<Frame>>> {
        self.operations
            .iter()
            .map(|operation| operation.resolve(profile))
            .collect()
    }
}

impl Extend<Operation> for CommandQueue {
    fn extend<I: IntoIterator<Item = Operation>>(&mut self, iter: I) {
        for operation in iter {
            self.push(operation);
        }
    }
}

impl<'a> IntoIterator for &'a CommandQueue {
    type Item = &'a Operation;
    type IntoIter = vec_deque::Iter<'a, Operation>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// ============================================================================
// TESTS
// ============================================================================
