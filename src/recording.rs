// SPDX-License-Identifier: MIT

//! The line format of a device recording:
//!
//! ```text
//! D: 0
//! N: Logitech USB Receiver
//! P: usb-0000:00:14.0-2/input0
//! I: 3 046d c52b
//! R: 10 05 01 09 30 75 08 95 01 81 06
//! E: 000000.000000 1 05
//! E: 000000.008011 1 fb
//! ```
//!
//! `D:` selects the device the following lines belong to, `R:` carries its
//! report descriptor and `E:` one report with its timestamp. Byte counts
//! are decimal, everything else is hex.

use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordingError {
    #[error("Invalid hex byte '{token}'")]
    InvalidByte { token: String },
    #[error("Invalid number '{token}'")]
    InvalidNumber { token: String },
    #[error("{prefix} line is missing the {field}")]
    MissingField { prefix: &'static str, field: &'static str },
}

type Result<T> = std::result::Result<T, RecordingError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceInfo {
    pub bus: u32,
    pub vendor: u32,
    pub product: u32,
}

/// One report as recorded from the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub sec: u64,
    pub usec: u32,
    pub data: Vec<u8>,
}

impl Event {
    /// The timestamp in the form `000012.000345`
    pub fn timestamp(&self) -> String {
        format!("{:06}.{:06}", self.sec, self.usec)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordingLine {
    /// `D:` the index of the device the following lines apply to
    Device(u32),
    /// `N:` the device name
    Name(String),
    /// `I:` bus type, vendor and product ID
    Info(DeviceInfo),
    /// `P:` the physical path
    Phys(String),
    /// `R:` the report descriptor
    Descriptor(Vec<u8>),
    /// `E:` a report
    Event(Event),
    /// Anything else, e.g. comments.
    Other(String),
}

fn parse_number(token: &str, radix: u32) -> Result<u32> {
    u32::from_str_radix(token, radix).map_err(|_| RecordingError::InvalidNumber {
        token: token.to_string(),
    })
}

/// Parse whitespace-separated hex bytes, e.g. `05 01 09 30`.
pub fn parse_hex_bytes(s: &str) -> Result<Vec<u8>> {
    s.split_whitespace()
        .map(|token| {
            u8::from_str_radix(token, 16).map_err(|_| RecordingError::InvalidByte {
                token: token.to_string(),
            })
        })
        .collect()
}

/// Parse a length-prefixed byte list. A length that does not match the
/// number of bytes is logged, the bytes are used as-is.
fn parse_sized_bytes(prefix: &'static str, s: &str) -> Result<Vec<u8>> {
    let (length, bytes) = s.trim().split_once(char::is_whitespace).unwrap_or((s.trim(), ""));
    if length.is_empty() {
        return Err(RecordingError::MissingField {
            prefix,
            field: "length",
        });
    }
    let length = parse_number(length, 10)? as usize;
    let bytes = parse_hex_bytes(bytes)?;
    if bytes.len() != length {
        warn!(
            "{prefix} line announces {length} bytes but has {}",
            bytes.len()
        );
    }
    Ok(bytes)
}

fn parse_event(s: &str) -> Result<Event> {
    let s = s.trim();
    let (timestamp, rest) = s.split_once(char::is_whitespace).ok_or(RecordingError::MissingField {
        prefix: "E:",
        field: "length",
    })?;
    let (sec, usec) = timestamp.split_once('.').unwrap_or((timestamp, "0"));
    let sec = sec.parse::<u64>().map_err(|_| RecordingError::InvalidNumber {
        token: timestamp.to_string(),
    })?;
    let usec = parse_number(usec, 10)?;
    let data = parse_sized_bytes("E:", rest)?;
    Ok(Event { sec, usec, data })
}

fn parse_info(s: &str) -> Result<DeviceInfo> {
    let mut tokens = s.split_whitespace();
    let mut next = |field| {
        tokens
            .next()
            .ok_or(RecordingError::MissingField { prefix: "I:", field })
            .and_then(|t| parse_number(t, 16))
    };
    Ok(DeviceInfo {
        bus: next("bus")?,
        vendor: next("vendor")?,
        product: next("product")?,
    })
}

/// Classify and parse one line of a recording.
///
/// ```
/// # use hidtools::recording::*;
/// let line = parse_line("R: 2 c0 c0").unwrap();
/// assert_eq!(line, RecordingLine::Descriptor(vec![0xc0, 0xc0]));
/// ```
pub fn parse_line(line: &str) -> Result<RecordingLine> {
    let line = line.trim_end();
    let prefix = line.get(..2).unwrap_or(line);
    let rest = line.get(2..).unwrap_or("");
    let parsed = match prefix {
        "D:" => RecordingLine::Device(parse_number(rest.trim(), 10)?),
        "N:" => RecordingLine::Name(rest.trim().to_string()),
        "P:" => RecordingLine::Phys(rest.trim().to_string()),
        "I:" => RecordingLine::Info(parse_info(rest)?),
        "R:" => RecordingLine::Descriptor(parse_sized_bytes("R:", rest)?),
        "E:" => RecordingLine::Event(parse_event(rest)?),
        _ => RecordingLine::Other(line.to_string()),
    };
    Ok(parsed)
}

fn hex_bytes(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// The `R:` line for a report descriptor.
pub fn format_descriptor(bytes: &[u8]) -> String {
    format!("R: {} {}", bytes.len(), hex_bytes(bytes))
}

/// The `E:` line for an event.
pub fn format_event(event: &Event) -> String {
    format!(
        "E: {} {} {}",
        event.timestamp(),
        event.data.len(),
        hex_bytes(&event.data)
    )
}
