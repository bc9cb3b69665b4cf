// SPDX-License-Identifier: MIT

//! Bit-level access to the report bytes described by a [Field].
//!
//! Fields are packed LSB-first: bit 0 is the least significant bit of
//! byte 0 and a field may span any number of bytes.
//!
//! ```
//! # use hidtools::report::*;
//! let mut report = [0u8; 3];
//! set_value(&mut report, 4, 12, 0xabc).unwrap();
//! assert_eq!(report, [0xc0, 0xab, 0x00]);
//! assert_eq!(get_value(&report, 4, 12, false).unwrap(), 0xabc);
//! assert_eq!(get_value(&report, 4, 12, true).unwrap(), 0xabc - 0x1000);
//! ```

use crate::types::{ReportId, Usage};
use crate::{Field, FieldKind};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReportError {
    #[error("Bits {start}..{end} are outside of the {len}-byte report")]
    OutOfData { start: usize, end: usize, len: usize },
    #[error("Value {value} does not fit into {size} bits")]
    ValueTooLarge { value: i64, size: usize },
    #[error("Fields of {size} bits are not supported")]
    FieldTooWide { size: usize },
    #[error("Expected {expected} values, got {actual}")]
    CountMismatch { expected: usize, actual: usize },
    #[error("Report ID {expected} does not match the first byte {actual:#04x}")]
    ReportIdMismatch { expected: ReportId, actual: u8 },
    #[error("No such report: {0:?}")]
    NoSuchReport(Option<ReportId>),
}

type Result<T> = std::result::Result<T, ReportError>;

/// The widest field value supported by [get_value] and [set_value].
pub const MAX_VALUE_BITS: usize = 64;

/// Interpret the low `bits` of `value` as a two's complement number.
///
/// ```
/// # use hidtools::report::twos_comp;
/// assert_eq!(twos_comp(0xff, 8), -1);
/// assert_eq!(twos_comp(0x7f, 8), 127);
/// assert_eq!(twos_comp(0x8, 4), -8);
/// ```
pub fn twos_comp(value: u64, bits: usize) -> i64 {
    if bits == 0 || bits >= 64 {
        return value as i64;
    }
    let value = value & ((1u64 << bits) - 1);
    if value & (1 << (bits - 1)) != 0 {
        value as i64 - (1i64 << bits)
    } else {
        value as i64
    }
}

/// The `bits`-wide two's complement representation of `value`.
pub fn to_twos_comp(value: i64, bits: usize) -> u64 {
    if bits >= 64 {
        value as u64
    } else {
        (value as u64) & ((1u64 << bits) - 1)
    }
}

fn check_bounds(report: &[u8], start_bit: usize, size: usize) -> Result<()> {
    if size > MAX_VALUE_BITS {
        return Err(ReportError::FieldTooWide { size });
    }
    let end = start_bit + size;
    if end.div_ceil(8) > report.len() {
        return Err(ReportError::OutOfData {
            start: start_bit,
            end,
            len: report.len(),
        });
    }
    Ok(())
}

/// Read `size` bits starting at `start_bit`. If `signed` is true and
/// the value is wider than one bit, it is sign-extended.
///
/// Requesting bits beyond the end of the report returns
/// [ReportError::OutOfData].
pub fn get_value(report: &[u8], start_bit: usize, size: usize, signed: bool) -> Result<i64> {
    check_bounds(report, start_bit, size)?;
    if size == 0 {
        return Ok(0);
    }
    let first = start_bit / 8;
    let last = (start_bit + size - 1) / 8;
    let raw = report[first..=last]
        .iter()
        .enumerate()
        .fold(0u128, |acc, (i, b)| acc | (u128::from(*b) << (8 * i)));
    let raw = ((raw >> (start_bit % 8)) & ((1u128 << size) - 1)) as u64;
    if signed && size > 1 {
        Ok(twos_comp(raw, size))
    } else {
        Ok(raw as i64)
    }
}

/// Write the low `size` bits of `value` starting at `start_bit`. All
/// other bits of the report are left as-is.
///
/// A `value` that does not fit into `size` bits returns
/// [ReportError::ValueTooLarge], signed values must be converted with
/// [to_twos_comp] first.
pub fn set_value(report: &mut [u8], start_bit: usize, size: usize, value: u64) -> Result<()> {
    check_bounds(report, start_bit, size)?;
    if size < 64 && value >> size != 0 {
        return Err(ReportError::ValueTooLarge {
            value: value as i64,
            size,
        });
    }

    let mut value = value;
    let mut bit = start_bit;
    let mut remaining = size;
    while remaining > 0 {
        let shift = bit % 8;
        let nbits = (8 - shift).min(remaining);
        let mask = (((1u16 << nbits) - 1) << shift) as u8;
        let byte = &mut report[bit / 8];
        *byte = (*byte & !mask) | (((value << shift) as u8) & mask);
        value >>= nbits;
        bit += nbits;
        remaining -= nbits;
    }
    Ok(())
}

impl Field {
    /// A field is signed if its logical minimum is negative.
    pub fn is_signed(&self) -> bool {
        self.logical_range.minimum.0 < 0
    }

    /// Read the `idx`-th element of this field.
    pub fn get_value(&self, report: &[u8], idx: usize) -> Result<i64> {
        get_value(
            report,
            self.start_bit + self.size * idx,
            self.size,
            self.is_signed(),
        )
    }

    /// Read all `count` elements of this field.
    pub fn get_values(&self, report: &[u8]) -> Result<Vec<i64>> {
        (0..self.count).map(|idx| self.get_value(report, idx)).collect()
    }

    /// Write the `idx`-th element of this field. For signed fields the
    /// value is converted to its two's complement first.
    pub fn set_value(&self, report: &mut [u8], idx: usize, value: i64) -> Result<()> {
        let too_large = ReportError::ValueTooLarge {
            value,
            size: self.size,
        };
        let raw = if value < 0 {
            if !self.is_signed() || self.size == 0 {
                return Err(too_large);
            }
            if self.size < 64 && value < -(1i64 << (self.size - 1)) {
                return Err(too_large);
            }
            to_twos_comp(value, self.size)
        } else {
            value as u64
        };
        set_value(report, self.start_bit + self.size * idx, self.size, raw)
    }

    /// Write all `count` elements of this field.
    pub fn set_values(&self, report: &mut [u8], values: &[i64]) -> Result<()> {
        if values.len() != self.count {
            return Err(ReportError::CountMismatch {
                expected: self.count,
                actual: values.len(),
            });
        }
        for (idx, v) in values.iter().enumerate() {
            self.set_value(report, idx, *v)?;
        }
        Ok(())
    }

    /// Map one element value of an array field to its usage. Values
    /// outside the logical range are "no entry" and return `None`, as do
    /// values without a matching usage and non-array fields.
    pub fn resolve_array_value(&self, value: i64) -> Option<Usage> {
        let FieldKind::Array { usages } = &self.kind else {
            return None;
        };
        let minimum = i64::from(self.logical_range.minimum.0);
        let maximum = i64::from(self.logical_range.maximum.0);
        if value < minimum || value > maximum {
            return None;
        }
        usages.get(usize::try_from(value - minimum).ok()?).copied()
    }

    /// The usage of each element of an array field in the report, see
    /// [Field::resolve_array_value].
    pub fn array_usages(&self, report: &[u8]) -> Result<Vec<Option<Usage>>> {
        Ok(self
            .get_values(report)?
            .into_iter()
            .map(|v| self.resolve_array_value(v))
            .collect())
    }
}
