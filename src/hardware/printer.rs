use crate::hardware::{Alignment, HardwareError, Printer};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use tracing::debug;

const ESC: u8 = 0x1B;

/// Line height restored by `set_line_height(None)`.
pub const DEFAULT_LINE_HEIGHT: u8 = 30;

/// Smallest line height the mechanism accepts; lower values are clamped.
pub const MIN_LINE_HEIGHT: u8 = 24;

/// Serial thermal receipt printer speaking the ESC/POS subset used for receipts.
///
/// The serial line itself (baud rate, framing) is expected to be configured
/// by the OS; this adapter only writes command bytes and text.
pub struct ThermalPrinter<W: Write + Send> {
    out: W,
}

impl ThermalPrinter<std::fs::File> {
    /// Opens the device node and resets the printer.
    pub fn open(device: impl AsRef<Path>) -> Result<Self, HardwareError> {
        let device = device.as_ref();
        let file = OpenOptions::new().write(true).open(device).map_err(|e| {
            HardwareError::Unavailable(format!("{}: {}", device.display(), e))
        })?;
        debug!(device = %device.display(), "Printer opened");
        let mut printer = Self::new(file);
        printer.reset()?;
        Ok(printer)
    }
}

impl<W: Write + Send> ThermalPrinter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// `ESC @`: clears styling and buffers.
    pub fn reset(&mut self) -> Result<(), HardwareError> {
        self.send(&[ESC, b'@'])
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn send(&mut self, bytes: &[u8]) -> Result<(), HardwareError> {
        self.out.write_all(bytes)?;
        self.out.flush()?;
        Ok(())
    }
}

impl<W: Write + Send> Printer for ThermalPrinter<W> {
    fn set_alignment(&mut self, alignment: Alignment) -> Result<(), HardwareError> {
        let n = match alignment {
            Alignment::Left => 0,
            Alignment::Center => 1,
        };
        self.send(&[ESC, b'a', n])
    }

    fn write_line(&mut self, text: &str) -> Result<(), HardwareError> {
        let mut bytes = printable(text);
        bytes.push(b'\n');
        self.send(&bytes)
    }

    fn set_line_height(&mut self, px: Option<u8>) -> Result<(), HardwareError> {
        let px = px.unwrap_or(DEFAULT_LINE_HEIGHT).max(MIN_LINE_HEIGHT);
        self.send(&[ESC, b'3', px])
    }
}

/// Folds text into the printer's 7-bit character set.
///
/// Typographic punctuation gets its ASCII look-alike, anything else outside
/// ASCII prints as `?`. Control characters are dropped.
fn printable(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    for c in text.chars() {
        match c {
            ' '..='~' => out.push(c as u8),
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{2032}' => out.push(b'\''),
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{2033}' => out.push(b'"'),
            '\u{2010}'..='\u{2015}' | '\u{2212}' => out.push(b'-'),
            '\u{2026}' => out.extend_from_slice(b"..."),
            '\u{00A0}' | '\u{2002}'..='\u{200A}' => out.push(b' '),
            '\u{200B}' | '\u{FEFF}' => {}
            c if c.is_control() => {}
            _ => out.push(b'?'),
        }
    }
    out
}
