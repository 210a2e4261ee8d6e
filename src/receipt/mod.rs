//! # Print Renderer
//!
//! Lays out a receipt as a flat list of [`PrintOp`]s and replays it on a
//! [`Printer`]. Rendering is pure; only [`PrintRenderer::print`] touches the
//! device.
//!
//! ```text
//!          (two blank lines)
//!             Jan 5, 2026
//!               3:07 PM
//!          (tall spacer line)
//!   `'. .'`'. .'`'. .'`'. .'`'. .'`
//!      `     `     `     `     `
//! poem, left-justified and wrapped
//!      .     .     .     .     .
//!   _.` `._.` `._.` `._.` `._.` `._
//!          (two blank lines)
//!     This poem was written by AI.
//!
//!       Explore the archives at
//!            poetry.camera
//!         (five blank lines)
//! ```

pub mod wrap;

pub use wrap::wrap;

use crate::hardware::{Alignment, HardwareError, Printer};
use crate::model::Poem;
use chrono::{DateTime, Local, TimeZone};
use tracing::debug;

pub const DEFAULT_WRAP_WIDTH: usize = 32;
pub const DEFAULT_ATTRIBUTION: &str = " This poem was written by AI.";
pub const DEFAULT_ARCHIVE_LABEL: &str = "Explore the archives at";
pub const DEFAULT_ARCHIVE_URL: &str = "poetry.camera";

const SPACER_LINE_HEIGHT: u8 = 56;
const HEADER_ORNAMENT: [&str; 2] = [
    "`'. .'`'. .'`'. .'`'. .'`'. .'`",
    "   `     `     `     `     `   ",
];
const FOOTER_ORNAMENT: [&str; 2] = [
    "   .     .     .     .     .   ",
    "_.` `._.` `._.` `._.` `._.` `._",
];
const TEAR_OFF_LINES: usize = 5;

/// One printer instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrintOp {
    Align(Alignment),
    /// `None` restores the default height.
    LineHeight(Option<u8>),
    Line(String),
}

/// A fully laid-out receipt.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RenderedReceipt {
    pub ops: Vec<PrintOp>,
}

impl RenderedReceipt {
    /// The printed text lines, in order, ignoring formatting.
    pub fn lines(&self) -> Vec<&str> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                PrintOp::Line(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    fn align(&mut self, alignment: Alignment) {
        self.ops.push(PrintOp::Align(alignment));
    }

    fn line(&mut self, text: impl Into<String>) {
        self.ops.push(PrintOp::Line(text.into()));
    }

    fn blank(&mut self, count: usize) {
        for _ in 0..count {
            self.line("");
        }
    }
}

#[derive(Debug, Clone)]
pub struct PrintRenderer {
    wrap_width: usize,
    attribution: String,
    archive_label: String,
    archive_url: String,
}

impl Default for PrintRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_WRAP_WIDTH)
    }
}

impl PrintRenderer {
    pub fn new(wrap_width: usize) -> Self {
        Self {
            wrap_width,
            attribution: DEFAULT_ATTRIBUTION.to_string(),
            archive_label: DEFAULT_ARCHIVE_LABEL.to_string(),
            archive_url: DEFAULT_ARCHIVE_URL.to_string(),
        }
    }

    pub fn with_footer(
        mut self,
        attribution: impl Into<String>,
        archive_label: impl Into<String>,
        archive_url: impl Into<String>,
    ) -> Self {
        self.attribution = attribution.into();
        self.archive_label = archive_label.into();
        self.archive_url = archive_url.into();
        self
    }

    /// Renders with the current local time in the header.
    pub fn render(&self, poem: &Poem) -> RenderedReceipt {
        self.render_at(poem, Local::now())
    }

    pub fn render_at<Tz: TimeZone>(&self, poem: &Poem, now: DateTime<Tz>) -> RenderedReceipt
    where
        Tz::Offset: std::fmt::Display,
    {
        let mut receipt = RenderedReceipt::default();

        receipt.align(Alignment::Center);
        receipt.blank(2);
        receipt.line(now.format("%b %-d, %Y").to_string());
        receipt.line(now.format("%-I:%M %p").to_string());
        receipt.ops.push(PrintOp::LineHeight(Some(SPACER_LINE_HEIGHT)));
        receipt.blank(1);
        receipt.ops.push(PrintOp::LineHeight(None));
        for ornament in HEADER_ORNAMENT {
            receipt.line(ornament);
        }

        receipt.align(Alignment::Left);
        for line in wrap(poem.as_str().trim(), self.wrap_width) {
            receipt.line(line);
        }

        receipt.align(Alignment::Center);
        for ornament in FOOTER_ORNAMENT {
            receipt.line(ornament);
        }
        receipt.blank(2);
        receipt.line(self.attribution.as_str());
        receipt.blank(1);
        receipt.line(self.archive_label.as_str());
        receipt.line(self.archive_url.as_str());
        receipt.blank(TEAR_OFF_LINES);

        receipt
    }

    /// Replays a receipt on the printer, stopping at the first device error.
    pub fn print(
        &self,
        receipt: &RenderedReceipt,
        printer: &mut dyn Printer,
    ) -> Result<(), HardwareError> {
        for op in &receipt.ops {
            match op {
                PrintOp::Align(alignment) => printer.set_alignment(*alignment)?,
                PrintOp::LineHeight(px) => printer.set_line_height(*px)?,
                PrintOp::Line(text) => printer.write_line(text)?,
            }
        }
        debug!(ops = receipt.ops.len(), "Receipt printed");
        Ok(())
    }
}
