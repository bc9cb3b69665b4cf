// SPDX-License-Identifier: MIT

//! Standalone HID value types that exist for type safety only.
//! Most of these are simple wrappers around their underlying integer type,
//! [Usage] is the exception as it combines a [UsagePage] and a [UsageId].
//!
//! In this document and unless stated otherwise, a reference to "Section a.b.c" refers to the
//! [HID Device Class Definition for HID 1.11](https://www.usb.org/document-library/device-class-definition-hid-111).

/// Creates a `From<Foo> for u32` and `From<u32> for Foo` implementation for the given `Foo` type.
/// Use like this: `impl_from!(Foo, u32)`.
macro_rules! impl_from {
    ($tipo:ident, $to:ty) => {
        impl From<$tipo> for $to {
            fn from(f: $tipo) -> $to {
                f.0
            }
        }
        impl From<&$tipo> for $to {
            fn from(f: &$tipo) -> $to {
                f.0
            }
        }
        impl From<$to> for $tipo {
            fn from(f: $to) -> Self {
                $tipo(f)
            }
        }
    };
}

/// Creates a `impl Display for Foo` that just prints the underlying number.
macro_rules! impl_fmt {
    ($tipo:ty, $to:ty) => {
        impl std::fmt::Display for $tipo {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                let v: $to = self.into();
                write!(f, "{v}")
            }
        }
    };
}

// ---------- GLOBAL ITEMS ---------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UsagePage(pub u16);

impl_from!(UsagePage, u16);
impl_fmt!(UsagePage, u16);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogicalMinimum(pub i32);

impl_from!(LogicalMinimum, i32);
impl_fmt!(LogicalMinimum, i32);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogicalMaximum(pub i32);

impl_from!(LogicalMaximum, i32);
impl_fmt!(LogicalMaximum, i32);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhysicalMinimum(pub i32);

impl_from!(PhysicalMinimum, i32);
impl_fmt!(PhysicalMinimum, i32);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhysicalMaximum(pub i32);

impl_from!(PhysicalMaximum, i32);
impl_fmt!(PhysicalMaximum, i32);

/// The raw Unit item value, see Section 6.2.2.7. The low nibble is the
/// measuring system, each following nibble a signed exponent for one
/// base unit. See [crate::render::describe_unit] for the decoded form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Unit(pub u32);

impl_from!(Unit, u32);
impl_fmt!(Unit, u32);

/// The Unit Exponent, already converted from its 4-bit two's complement
/// nibble, i.e. in the range -8..=7 for compliant devices.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnitExponent(pub i32);

impl_from!(UnitExponent, i32);
impl_fmt!(UnitExponent, i32);

/// Report Size in bits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportSize(pub usize);

impl_from!(ReportSize, usize);
impl_fmt!(ReportSize, usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReportId(pub u8);

impl_from!(ReportId, u8);
impl_fmt!(ReportId, u8);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportCount(pub usize);

impl_from!(ReportCount, usize);
impl_fmt!(ReportCount, usize);

// ----------------- LOCAL ITEMS --------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UsageId(pub u16);

impl_from!(UsageId, u16);
impl_fmt!(UsageId, u16);

/// A full 32-bit HID Usage, i.e. the [UsagePage] in the upper 16 bits and
/// the [UsageId] in the lower 16 bits.
///
/// ```
/// # use hidtools::types::*;
/// let usage = Usage::from(0x0001_0030u32);
/// assert_eq!(usage.usage_page, UsagePage(0x1));
/// assert_eq!(usage.usage_id, UsageId(0x30));
/// assert_eq!(u32::from(usage), 0x0001_0030);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Usage {
    pub usage_page: UsagePage,
    pub usage_id: UsageId,
}

impl Usage {
    pub fn new(usage_page: u16, usage_id: u16) -> Usage {
        Usage {
            usage_page: UsagePage(usage_page),
            usage_id: UsageId(usage_id),
        }
    }
}

impl From<u32> for Usage {
    fn from(value: u32) -> Usage {
        Usage::new((value >> 16) as u16, (value & 0xffff) as u16)
    }
}

impl From<Usage> for u32 {
    fn from(usage: Usage) -> u32 {
        (u32::from(usage.usage_page.0) << 16) | u32::from(usage.usage_id.0)
    }
}

impl From<&Usage> for u32 {
    fn from(usage: &Usage) -> u32 {
        u32::from(*usage)
    }
}

impl std::fmt::Display for Usage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#010x}", u32::from(self))
    }
}

/// Usage Minimum, already combined with the Usage Page in effect
/// when the item was parsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UsageMinimum(pub u32);

impl_from!(UsageMinimum, u32);
impl_fmt!(UsageMinimum, u32);

/// Usage Maximum, already combined with the Usage Page in effect
/// when the item was parsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UsageMaximum(pub u32);

impl_from!(UsageMaximum, u32);
impl_fmt!(UsageMaximum, u32);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_conversion() {
        let usage = Usage::new(0xff00, 0xc5);
        assert_eq!(u32::from(usage), 0xff0000c5);
        assert_eq!(Usage::from(0xff0000c5u32), usage);
        assert_eq!(format!("{usage}"), "0xff0000c5");
    }

    #[test]
    fn usage_ordering() {
        // page first, then id
        assert!(Usage::new(0x1, 0xff) < Usage::new(0x2, 0x0));
        assert!(Usage::new(0x9, 0x1) < Usage::new(0x9, 0x2));
    }

    #[test]
    fn display() {
        assert_eq!(format!("{}", LogicalMinimum(-127)), "-127");
        assert_eq!(format!("{}", ReportId(3)), "3");
        assert_eq!(format!("{}", UnitExponent(-2)), "-2");
    }
}
