// SPDX-License-Identifier: MIT

//! The HID short item codec. This module handles splitting a report
//! descriptor byte stream into its individual [RawItem]s and encoding
//! a tag/value pair back into bytes. Interpretation of the items is left
//! to the [Parser](crate::Parser).
//!
//! In this document and unless stated otherwise, a reference to "Section a.b.c" refers to the
//! [HID Device Class Definition for HID 1.11](https://www.usb.org/document-library/device-class-definition-hid-111).
//!
//! An item is built incrementally, one byte at a time:
//!
//! ```
//! # use hidtools::item::*;
//! let mut item = RawItem::new(0x15).unwrap(); // Logical Minimum, 1 data byte
//! assert_eq!(item.tag(), ItemTag::LogicalMinimum);
//! assert!(!item.is_complete());
//! item.feed(0x81).unwrap();
//! assert!(item.is_complete());
//! assert_eq!(item.value(), -127);
//! ```

use crate::report::twos_comp;
use crate::types::UsagePage;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ItemError {
    #[error("Unknown item tag in prefix byte {byte:#04x}")]
    MalformedItem { byte: u8 },
    #[error("Zero item prefix byte {byte:#04x}")]
    ZeroPrefix { byte: u8 },
    #[error("{tag} item is already complete, cannot take byte {byte:#04x}")]
    ItemOverflow { tag: ItemTag, byte: u8 },
    #[error("{tag} item needs {needed} data bytes, only {available} available")]
    InsufficientData {
        tag: ItemTag,
        needed: usize,
        available: usize,
    },
}

type Result<T> = std::result::Result<T, ItemError>;

/// The class of an item, see Section 6.2.2.2. The class is encoded in
/// bits 2 and 3 of the prefix byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemClass {
    Main,
    Global,
    Local,
}

// One line per tag: variant, prefix byte with the size bits cleared,
// class and the name used in the human-readable form.
macro_rules! impl_item_tags {
    ($($variant:ident = $prefix:literal, $class:ident, $name:literal;)*) => {
        /// The tag of a short item, i.e. the upper 6 bits of the prefix byte.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum ItemTag {
            $($variant,)*
        }

        impl ItemTag {
            /// All tags, in the order of Section 6.2.2.4 to 6.2.2.8.
            pub const ALL: &'static [ItemTag] = &[$(ItemTag::$variant,)*];

            /// The prefix byte of this tag with the two size bits cleared.
            pub fn prefix(&self) -> u8 {
                match self {
                    $(ItemTag::$variant => $prefix,)*
                }
            }

            pub fn class(&self) -> ItemClass {
                match self {
                    $(ItemTag::$variant => ItemClass::$class,)*
                }
            }

            /// The name of this tag as used in the human-readable form,
            /// e.g. `"Usage Page"`.
            pub fn name(&self) -> &'static str {
                match self {
                    $(ItemTag::$variant => $name,)*
                }
            }
        }
    };
}

impl_item_tags! {
    Input            = 0b10000000, Main,   "Input";
    Output           = 0b10010000, Main,   "Output";
    Feature          = 0b10110000, Main,   "Feature";
    Collection       = 0b10100000, Main,   "Collection";
    EndCollection    = 0b11000000, Main,   "End Collection";
    UsagePage        = 0b00000100, Global, "Usage Page";
    LogicalMinimum   = 0b00010100, Global, "Logical Minimum";
    LogicalMaximum   = 0b00100100, Global, "Logical Maximum";
    PhysicalMinimum  = 0b00110100, Global, "Physical Minimum";
    PhysicalMaximum  = 0b01000100, Global, "Physical Maximum";
    UnitExponent     = 0b01010100, Global, "Unit Exponent";
    Unit             = 0b01100100, Global, "Unit";
    ReportSize       = 0b01110100, Global, "Report Size";
    ReportId         = 0b10000100, Global, "Report ID";
    ReportCount      = 0b10010100, Global, "Report Count";
    Push             = 0b10100100, Global, "Push";
    Pop              = 0b10110100, Global, "Pop";
    Usage            = 0b00001000, Local,  "Usage";
    UsageMinimum     = 0b00011000, Local,  "Usage Minimum";
    UsageMaximum     = 0b00101000, Local,  "Usage Maximum";
    DesignatorIndex  = 0b00111000, Local,  "Designator Index";
    DesignatorMinimum = 0b01001000, Local, "Designator Minimum";
    DesignatorMaximum = 0b01011000, Local, "Designator Maximum";
    StringIndex      = 0b01111000, Local,  "String Index";
    StringMinimum    = 0b10001000, Local,  "String Minimum";
    StringMaximum    = 0b10011000, Local,  "String Maximum";
    Delimiter        = 0b10101000, Local,  "Delimiter";
}

impl ItemTag {
    /// Look up the tag for the given prefix byte, ignoring the size bits.
    pub fn from_prefix(byte: u8) -> Option<ItemTag> {
        let prefix = byte & 0b11111100;
        ItemTag::ALL.iter().copied().find(|t| t.prefix() == prefix)
    }

    /// Look up the tag by its human-readable name, see [ItemTag::name].
    pub fn from_name(name: &str) -> Option<ItemTag> {
        ItemTag::ALL.iter().copied().find(|t| t.name() == name)
    }

    /// True for the items whose data is a two's complement value.
    /// The maximum values are deliberately treated as unsigned,
    /// see [RawItem::value].
    pub fn is_signed(&self) -> bool {
        matches!(self, ItemTag::LogicalMinimum | ItemTag::PhysicalMinimum)
    }

    /// True for Usage, Usage Minimum and Usage Maximum. With four data
    /// bytes their value carries its own usage page.
    pub fn is_usage(&self) -> bool {
        matches!(
            self,
            ItemTag::Usage | ItemTag::UsageMinimum | ItemTag::UsageMaximum
        )
    }

    /// True for the items that never carry data.
    pub fn has_payload(&self) -> bool {
        !matches!(self, ItemTag::EndCollection | ItemTag::Push | ItemTag::Pop)
    }
}

impl std::fmt::Display for ItemTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Decode the prefix byte of a short item into its tag and the number of
/// data bytes that follow (0, 1, 2 or 4), see Section 6.2.2.2.
///
/// A prefix byte of zero (or one of the size-only values `0x01..=0x03`)
/// returns [ItemError::ZeroPrefix] so callers can treat trailing padding
/// separately from a [ItemError::MalformedItem].
pub fn decode_item_header(byte: u8) -> Result<(ItemTag, usize)> {
    if byte & 0b11111100 == 0 {
        return Err(ItemError::ZeroPrefix { byte });
    }
    let tag = ItemTag::from_prefix(byte).ok_or(ItemError::MalformedItem { byte })?;
    let size = match byte & 0b11 {
        0 => 0,
        1 => 1,
        2 => 2,
        _ => 4,
    };
    Ok((tag, size))
}

/// The data bytes of a HID item, guaranteed to be of length
/// 0, 1, 2, or 4 bytes and in LE byte order.
///
/// This struct only exists for conversion from numbers to
/// a hid-compatible byte array of minimum length.
struct HidBytes(Vec<u8>);

impl HidBytes {
    fn take(self) -> Vec<u8> {
        self.0
    }

    /// The size bits of the prefix byte for these data bytes
    fn size_code(&self) -> u8 {
        match self.0.len() {
            0 => 0b00,
            1 => 0b01,
            2 => 0b10,
            _ => 0b11,
        }
    }
}

impl From<u32> for HidBytes {
    fn from(value: u32) -> HidBytes {
        let bytes = value.to_le_bytes();
        let cutoff = match value {
            0..=0xff => 1,
            0x100..=0xffff => 2,
            _ => 4,
        };
        HidBytes(bytes[0..cutoff].to_vec())
    }
}

impl From<i32> for HidBytes {
    fn from(value: i32) -> HidBytes {
        const MIN16: i32 = i16::MIN as i32;
        const MAX16: i32 = i16::MAX as i32;
        let bytes = match value {
            -128..=127 => (value as i8).to_le_bytes().to_vec(),
            MIN16..=MAX16 => (value as i16).to_le_bytes().to_vec(),
            _ => value.to_le_bytes().to_vec(),
        };
        HidBytes(bytes)
    }
}

/// One HID short item as found in (or destined for) a report descriptor.
///
/// A [RawItem] is created from its prefix byte and is complete once the
/// number of data bytes declared by the prefix have been [fed](RawItem::feed).
/// Once complete, [RawItem::value] holds the little endian value of those
/// bytes, sign-extended for [ItemTag::is_signed] items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawItem {
    tag: ItemTag,
    prefix: u8,
    declared_size: usize,
    data: Vec<u8>,
    value: i64,
    pub(crate) usage_page: UsagePage,
    pub(crate) offset: usize,
}

impl RawItem {
    /// Start a new item from its prefix byte. Items without data bytes
    /// are complete immediately.
    pub fn new(prefix: u8) -> Result<RawItem> {
        let (tag, declared_size) = decode_item_header(prefix)?;
        let mut item = RawItem {
            tag,
            prefix,
            declared_size,
            data: Vec::with_capacity(declared_size),
            value: 0,
            usage_page: UsagePage::default(),
            offset: 0,
        };
        if item.is_complete() {
            item.finish();
        }
        Ok(item)
    }

    /// Parse one complete item from the start of `bytes`. Any bytes
    /// beyond the item are ignored.
    pub fn from_bytes(bytes: &[u8]) -> Result<RawItem> {
        let (first, rest) = bytes.split_first().ok_or(ItemError::ZeroPrefix { byte: 0 })?;
        let mut item = RawItem::new(*first)?;
        if rest.len() < item.declared_size {
            return Err(ItemError::InsufficientData {
                tag: item.tag,
                needed: item.declared_size,
                available: rest.len(),
            });
        }
        for b in &rest[..item.declared_size] {
            item.feed(*b)?;
        }
        Ok(item)
    }

    /// Supply the next data byte. Feeding a complete item fails with
    /// [ItemError::ItemOverflow].
    pub fn feed(&mut self, byte: u8) -> Result<()> {
        if self.is_complete() {
            return Err(ItemError::ItemOverflow { tag: self.tag, byte });
        }
        self.data.push(byte);
        if self.is_complete() {
            self.finish();
        }
        Ok(())
    }

    /// True once all declared data bytes have been fed.
    pub fn is_complete(&self) -> bool {
        self.data.len() == self.declared_size
    }

    fn finish(&mut self) {
        let raw = self
            .data
            .iter()
            .enumerate()
            .fold(0u64, |acc, (i, b)| acc | (u64::from(*b) << (8 * i)));
        let nbits = self.data.len() * 8;
        self.value = match self.tag {
            _ if self.data.is_empty() => 0,
            t if t.is_signed() => twos_comp(raw, nbits),
            // The exponent is a 4-bit two's complement nibble. Anything
            // beyond a nibble is taken as a full-width signed value.
            ItemTag::UnitExponent if raw <= 0xf => twos_comp(raw, 4),
            ItemTag::UnitExponent => twos_comp(raw, nbits),
            _ => raw as i64,
        };
    }

    /// Encode the given value for the tag with the minimum number of
    /// data bytes. Items without payload ([ItemTag::has_payload]) and
    /// a `None` value are encoded without data bytes.
    ///
    /// ```
    /// # use hidtools::item::*;
    /// let item = RawItem::encode(ItemTag::LogicalMaximum, Some(255));
    /// assert_eq!(item.bytes(), [0x25, 0xff]);
    /// let item = RawItem::encode(ItemTag::LogicalMinimum, Some(200));
    /// assert_eq!(item.bytes(), [0x16, 0xc8, 0x00]);
    /// let item = RawItem::encode(ItemTag::UnitExponent, Some(-2));
    /// assert_eq!(item.bytes(), [0x55, 0x0e]);
    /// ```
    pub fn encode(tag: ItemTag, value: Option<i64>) -> RawItem {
        let data = match value {
            None => HidBytes(vec![]),
            Some(_) if !tag.has_payload() => HidBytes(vec![]),
            Some(v) if tag == ItemTag::UnitExponent && (-8..0).contains(&v) => {
                HidBytes(vec![(v + 16) as u8])
            }
            Some(v) if v < 0 || tag.is_signed() => HidBytes::from(v as i32),
            Some(v) => HidBytes::from(v as u32),
        };
        let prefix = tag.prefix() | data.size_code();
        let data = data.take();
        let mut item = RawItem {
            tag,
            prefix,
            declared_size: data.len(),
            data,
            value: 0,
            usage_page: UsagePage::default(),
            offset: 0,
        };
        item.finish();
        item
    }

    /// Encode a Usage, Usage Minimum or Usage Maximum with all four data
    /// bytes, the usage page in the upper 16 bits. Unlike a shorter
    /// usage, this one ignores the Usage Page in effect.
    ///
    /// ```
    /// # use hidtools::item::*;
    /// let item = RawItem::encode_extended_usage(ItemTag::Usage, 0x30);
    /// assert_eq!(item.bytes(), [0x0b, 0x30, 0x00, 0x00, 0x00]);
    /// ```
    pub fn encode_extended_usage(tag: ItemTag, usage: u32) -> RawItem {
        let data = usage.to_le_bytes().to_vec();
        let mut item = RawItem {
            tag,
            prefix: tag.prefix() | 0b11,
            declared_size: data.len(),
            data,
            value: 0,
            usage_page: UsagePage::default(),
            offset: 0,
        };
        item.finish();
        item
    }

    /// Re-encode this item with the minimum number of data bytes. A
    /// 4-byte usage stays 4 bytes wide.
    pub fn to_canonical(&self) -> RawItem {
        let mut item = if self.tag.is_usage() && self.declared_size == 4 {
            RawItem::encode_extended_usage(self.tag, self.value as u32)
        } else if self.tag.has_payload() {
            RawItem::encode(self.tag, Some(self.value))
        } else {
            RawItem::encode(self.tag, None)
        };
        item.usage_page = self.usage_page;
        item.offset = self.offset;
        item
    }

    pub fn tag(&self) -> ItemTag {
        self.tag
    }

    /// The prefix byte including the size bits.
    pub fn prefix(&self) -> u8 {
        self.prefix
    }

    /// The number of data bytes declared by the prefix byte.
    pub fn declared_size(&self) -> usize {
        self.declared_size
    }

    /// The data bytes as they appeared in the report descriptor.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// The prefix byte followed by the data bytes.
    pub fn bytes(&self) -> Vec<u8> {
        [vec![self.prefix], self.data.clone()].concat()
    }

    /// The length of this item in bytes, inclusive of the prefix byte.
    pub fn size(&self) -> usize {
        1 + self.data.len()
    }

    /// The value of the data bytes, zero for items without data.
    ///
    /// Logical and Physical Minimum are sign-extended over their
    /// declared width, the Unit Exponent nibble is converted to
    /// -8..=7. Everything else is unsigned, including the Logical and
    /// Physical Maximum: whether those are signed would depend on the
    /// matching minimum.
    pub fn value(&self) -> i64 {
        self.value
    }

    /// The Usage Page in effect when this item was parsed.
    pub fn usage_page(&self) -> UsagePage {
        self.usage_page
    }

    /// The offset of this item in the report descriptor.
    pub fn offset(&self) -> usize {
        self.offset
    }
}

impl std::fmt::Display for RawItem {
    /// Formats the item as space-separated hex bytes, e.g. `05 01`
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02x}", self.prefix)?;
        for b in &self.data {
            write!(f, " {b:02x}")?;
        }
        Ok(())
    }
}

/// The data flags of an Input, Output or Feature item, see Section 6.2.2.5.
///
/// These properties come in pairs (bit set or unset in the item data),
/// for readability in the caller, a function is provided for each state
/// where it matters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MainItemFlags(pub u32);

impl MainItemFlags {
    fn bit(&self, bit: u8) -> bool {
        self.0 & (1 << bit) != 0
    }

    /// True if the data is constant and never changes. This typically means the data
    /// can be ignored.
    pub fn is_constant(&self) -> bool {
        self.bit(0)
    }

    pub fn is_data(&self) -> bool {
        !self.is_constant()
    }

    /// True if the data is a variable field, false for an array field.
    pub fn is_variable(&self) -> bool {
        self.bit(1)
    }

    pub fn is_array(&self) -> bool {
        !self.is_variable()
    }

    /// True if the data is relative compared to a previous report
    pub fn is_relative(&self) -> bool {
        self.bit(2)
    }

    pub fn is_absolute(&self) -> bool {
        !self.is_relative()
    }

    /// True if the data wraps around at the logical
    /// minimum/maximum (e.g. a dial that can spin at 360 degrees).
    pub fn wraps(&self) -> bool {
        self.bit(3)
    }

    pub fn is_nonlinear(&self) -> bool {
        self.bit(4)
    }

    pub fn has_no_preferred_state(&self) -> bool {
        self.bit(5)
    }

    /// True if the control has a null state where it does not send
    /// meaningful data (e.g. a hat switch in neutral position)
    pub fn has_null_state(&self) -> bool {
        self.bit(6)
    }

    /// Only meaningful for Output and Feature items, reserved for Input items.
    pub fn is_volatile(&self) -> bool {
        self.bit(7)
    }

    /// True if the control emits a fixed size stream of bytes.
    pub fn is_buffered_bytes(&self) -> bool {
        self.bit(8)
    }
}

impl From<&RawItem> for MainItemFlags {
    fn from(item: &RawItem) -> MainItemFlags {
        MainItemFlags(item.value() as u32)
    }
}
