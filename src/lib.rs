// SPDX-License-Identifier: MIT

//! This crate provides parsing of HID Report Descriptors, bit-level access to
//! the reports they describe and a human-readable form of both.
//!
//! The entry point is usually [ReportDescriptor::from_bytes], the resulting
//! [ReportDescriptor] holds one [Report] per report ID and [Direction], each
//! made up of [Field]s at fixed bit offsets.
//!
//! ```
//! # use hidtools::*;
//! let bytes: &[u8] = &[
//!     0x05, 0x01, // Usage Page (Generic Desktop)
//!     0x09, 0x02, // Usage (Mouse)
//!     0xa1, 0x01, // Collection (Application)
//!     0x05, 0x09, //   Usage Page (Button)
//!     0x19, 0x01, //   Usage Minimum (1)
//!     0x29, 0x03, //   Usage Maximum (3)
//!     0x15, 0x00, //   Logical Minimum (0)
//!     0x25, 0x01, //   Logical Maximum (1)
//!     0x75, 0x01, //   Report Size (1)
//!     0x95, 0x03, //   Report Count (3)
//!     0x81, 0x02, //   Input (Data,Var,Abs)
//!     0x95, 0x05, //   Report Count (5)
//!     0x81, 0x03, //   Input (Cnst,Var,Abs)
//!     0xc0,       // End Collection
//! ];
//! let rdesc = ReportDescriptor::from_bytes(bytes).unwrap();
//! let report = rdesc.input_report(None).unwrap();
//! assert_eq!(report.size(), 1);
//! assert_eq!(report.fields().len(), 4);
//! assert_eq!(report.fields()[1].usage(), Some(Usage::new(0x09, 2)));
//! ```
//!
//! In this document and unless stated otherwise, a reference to "Section a.b.c" refers to the
//! [HID Device Class Definition for HID 1.11](https://www.usb.org/document-library/device-class-definition-hid-111).

use std::collections::BTreeMap;
use std::ops::Range;
use thiserror::Error;
use tracing::{debug, trace, warn};

pub mod format;
pub mod hut;
pub mod item;
pub mod recording;
pub mod render;
pub mod report;
pub mod types;

use item::{ItemError, ItemTag, MainItemFlags, RawItem};

pub use format::ReportValueSource;
pub use hut::UsageTable;
pub use render::DumpFormat;
pub use report::ReportError;
pub use types::*;

/// The vendor usage of the Feature report carrying the Microsoft
/// "Windows 8 certification blob".
pub const WIN8_BLOB_USAGE: u32 = 0xff0000c5;

/// The "direction" of a report, i.e. which of the three main data items
/// declared it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Input,
    Output,
    Feature,
}

impl Direction {
    fn from_tag(tag: ItemTag) -> Option<Direction> {
        match tag {
            ItemTag::Input => Some(Direction::Input),
            ItemTag::Output => Some(Direction::Output),
            ItemTag::Feature => Some(Direction::Feature),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LogicalRange {
    pub minimum: LogicalMinimum,
    pub maximum: LogicalMaximum,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PhysicalRange {
    pub minimum: PhysicalMinimum,
    pub maximum: PhysicalMaximum,
}

/// The type of a Collection item, see Section 6.2.2.6.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    Physical,
    Application,
    Logical,
    Report,
    NamedArray,
    UsageSwitch,
    UsageModifier,
    Reserved(u8),
    VendorDefined(u8),
}

impl From<u8> for CollectionKind {
    fn from(value: u8) -> CollectionKind {
        match value {
            0x00 => CollectionKind::Physical,
            0x01 => CollectionKind::Application,
            0x02 => CollectionKind::Logical,
            0x03 => CollectionKind::Report,
            0x04 => CollectionKind::NamedArray,
            0x05 => CollectionKind::UsageSwitch,
            0x06 => CollectionKind::UsageModifier,
            0x07..=0x7f => CollectionKind::Reserved(value),
            _ => CollectionKind::VendorDefined(value),
        }
    }
}

impl From<CollectionKind> for u8 {
    fn from(kind: CollectionKind) -> u8 {
        match kind {
            CollectionKind::Physical => 0x00,
            CollectionKind::Application => 0x01,
            CollectionKind::Logical => 0x02,
            CollectionKind::Report => 0x03,
            CollectionKind::NamedArray => 0x04,
            CollectionKind::UsageSwitch => 0x05,
            CollectionKind::UsageModifier => 0x06,
            CollectionKind::Reserved(v) => v,
            CollectionKind::VendorDefined(v) => v,
        }
    }
}

/// One collection that was open when a [Field] was emitted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Collection {
    pub kind: CollectionKind,
    /// The last Usage declared before the Collection item, if any
    pub usage: Option<Usage>,
    /// Sequential index of this collection in the report descriptor,
    /// unique across all collections.
    pub index: usize,
}

/// The number of open collections of each type. Any type other than
/// Application and Physical counts as logical.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CollectionDepth {
    pub application: usize,
    pub physical: usize,
    pub logical: usize,
}

impl CollectionDepth {
    fn counter(&mut self, kind: CollectionKind) -> &mut usize {
        match kind {
            CollectionKind::Application => &mut self.application,
            CollectionKind::Physical => &mut self.physical,
            _ => &mut self.logical,
        }
    }
}

/// The three shapes a [Field] can take, decided once when the field is emitted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldKind {
    /// Padding or constant data. Consecutive constant elements are merged
    /// into one field with a count of 1.
    Constant,
    /// A single value with one usage.
    Variable { usage: Usage },
    /// `count` elements, each holding an index into `usages`
    /// (offset by the logical minimum).
    Array { usages: Vec<Usage> },
}

/// One bit-addressable slot inside a [Report].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Field {
    pub kind: FieldKind,
    pub report_id: Option<ReportId>,
    pub direction: Direction,
    /// The bit offset of the first element within the report, inclusive
    /// of the report ID byte for numbered reports.
    pub start_bit: usize,
    /// Bits per element
    pub size: usize,
    /// Number of elements
    pub count: usize,
    pub flags: MainItemFlags,
    pub usage_page: UsagePage,
    pub logical_range: LogicalRange,
    pub physical_range: Option<PhysicalRange>,
    pub unit: Option<Unit>,
    pub unit_exponent: Option<UnitExponent>,
    pub application: Option<Usage>,
    pub physical: Option<Usage>,
    pub logical: Option<Usage>,
    /// The collections open at the time this field was emitted,
    /// outermost first.
    pub collections: Vec<Collection>,
    pub depth: CollectionDepth,
}

impl Field {
    /// The range of bits covered by this field.
    pub fn bits(&self) -> Range<usize> {
        self.start_bit..self.start_bit + self.size * self.count
    }

    pub fn is_constant(&self) -> bool {
        matches!(self.kind, FieldKind::Constant)
    }

    pub fn is_array(&self) -> bool {
        matches!(self.kind, FieldKind::Array { .. })
    }

    /// The usage of a variable field.
    pub fn usage(&self) -> Option<Usage> {
        match &self.kind {
            FieldKind::Variable { usage } => Some(*usage),
            _ => None,
        }
    }

    /// The usages of an array field, empty otherwise.
    pub fn usages(&self) -> &[Usage] {
        match &self.kind {
            FieldKind::Array { usages } => usages,
            _ => &[],
        }
    }

    /// The index of the innermost open collection.
    pub fn collection_index(&self) -> Option<usize> {
        self.collections.last().map(|c| c.index)
    }
}

/// An ordered sequence of [Field]s sharing one report ID and [Direction].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Report {
    /// The report ID, if any
    pub id: Option<ReportId>,
    /// The "direction" of this report
    pub direction: Direction,
    /// The application collection usage in effect when this report
    /// was first declared
    pub application: Option<Usage>,
    bitsize: usize,
    fields: Vec<Field>,
}

impl Report {
    fn new(id: Option<ReportId>, direction: Direction, application: Option<Usage>) -> Report {
        Report {
            id,
            direction,
            application,
            // numbered reports reserve the first byte for the ID
            bitsize: if id.is_some() { 8 } else { 0 },
            fields: vec![],
        }
    }

    /// Append the field at the end of the report. The caller has checked
    /// that the report stays within [MAX_REPORT_SIZE].
    fn push_field(&mut self, mut field: Field) {
        field.start_bit = self.bitsize;
        self.bitsize += field.size * field.count;
        debug!(
            "{:?} report {:?}: {:?} field at bit {}, {}x{} bits",
            self.direction, self.id, field.kind, field.start_bit, field.count, field.size
        );
        self.fields.push(field);
    }

    /// The fields of this report in the order they appear
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// The size of this report in bits, inclusive of the report ID byte
    pub fn bitsize(&self) -> usize {
        self.bitsize
    }

    /// The size of this report in bytes, inclusive of the report ID byte
    pub fn size(&self) -> usize {
        self.bitsize.div_ceil(8)
    }

    pub fn is_numbered(&self) -> bool {
        self.id.is_some()
    }
}

/// The errors of parsing a report descriptor, from bytes or from its
/// human-readable form.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParserError {
    #[error("Invalid item at offset {offset}: {source}")]
    Item {
        offset: usize,
        #[source]
        source: ItemError,
    },
    #[error("Pop at offset {offset} without a matching Push")]
    UnbalancedStack { offset: usize },
    #[error("Report descriptor ends inside the {tag} item at offset {offset}")]
    Truncated { offset: usize, tag: ItemTag },
    #[error(
        "Main item at offset {offset} makes its report larger than {max} bytes",
        max = MAX_REPORT_SIZE
    )]
    ReportTooLarge { offset: usize },
    #[error(
        "Main item at offset {offset} declares {count} usages or fields, at most {max} are supported",
        max = MAX_USAGES
    )]
    TooManyUsages { offset: usize, count: u64 },
    #[error("Line {line}: unknown symbol '{token}'")]
    UnresolvedSymbol { line: usize, token: String },
    #[error("Line {line}: {message}")]
    InvalidLine { line: usize, message: String },
    #[error("Line {line}: {source}")]
    AtLine {
        line: usize,
        #[source]
        source: Box<ParserError>,
    },
}

type Result<T> = std::result::Result<T, ParserError>;

/// The largest report, in bytes and inclusive of the report ID, a
/// descriptor may declare.
pub const MAX_REPORT_SIZE: usize = 16384;

/// The largest number of usages an array field may list, and of fields a
/// single variable main item may declare.
pub const MAX_USAGES: usize = 12288;

/// The global items in effect, see Section 6.2.2.7. A Push item pushes a
/// copy of these onto the stack, a Pop item restores them.
#[derive(Clone, Debug, Default)]
struct ParserGlobals {
    usage_page: UsagePage,
    logical_minimum: LogicalMinimum,
    logical_maximum: LogicalMaximum,
    physical_minimum: Option<PhysicalMinimum>,
    physical_maximum: Option<PhysicalMaximum>,
    unit: Option<Unit>,
    unit_exponent: Option<UnitExponent>,
    report_size: ReportSize,
    report_count: ReportCount,
    application: Option<Usage>,
    physical: Option<Usage>,
    logical: Option<Usage>,
}

/// The local items, reset after every main item.
#[derive(Clone, Debug, Default)]
struct Locals {
    usages: Vec<Usage>,
    usage_minimum: Option<UsageMinimum>,
    usage_maximum: Option<UsageMaximum>,
}

/// A streaming report descriptor parser.
///
/// Bytes are [consumed](Parser::consume) one at a time, each completed
/// item is applied to the parser state immediately. [Parser::finish]
/// returns the resulting [ReportDescriptor].
///
/// Most callers want [ReportDescriptor::from_bytes] instead.
#[derive(Debug, Default)]
pub struct Parser {
    rdesc: ReportDescriptor,
    globals: ParserGlobals,
    stack: Vec<ParserGlobals>,
    locals: Locals,
    collections: Vec<Collection>,
    depth: CollectionDepth,
    next_collection: usize,
    report_id: Option<ReportId>,
    current: Option<RawItem>,
    offset: usize,
}

impl Parser {
    pub fn new() -> Parser {
        Parser::default()
    }

    /// Feed the next byte of the report descriptor. Returns the item if
    /// this byte completed one.
    pub fn consume(&mut self, byte: u8) -> Result<Option<&RawItem>> {
        let offset = self.offset;
        self.offset += 1;
        let item = match self.current.take() {
            None => RawItem::new(byte),
            Some(mut item) => item.feed(byte).map(|_| item),
        };
        let item = item.map_err(|source| ParserError::Item { offset, source })?;
        if !item.is_complete() {
            self.current = Some(item);
            return Ok(None);
        }
        self.parse_item(item)?;
        Ok(self.rdesc.items.last())
    }

    /// True if the last consumed byte did not complete an item.
    pub fn is_mid_item(&self) -> bool {
        self.current.is_some()
    }

    /// The Usage Page currently in effect.
    pub fn usage_page(&self) -> UsagePage {
        self.globals.usage_page
    }

    /// Apply one complete item to the parser state and append it to the
    /// report descriptor's item list. The item's offset is the sum of the
    /// sizes of all items before it.
    pub fn parse_item(&mut self, mut item: RawItem) -> Result<()> {
        item.offset = self
            .rdesc
            .items
            .last()
            .map(|i| i.offset() + i.size())
            .unwrap_or(0);
        item.usage_page = self.globals.usage_page;
        let offset = item.offset;
        let value = item.value();

        trace!("{offset:4}: {} ({value}) [{item}]", item.tag());

        let page = u32::from(self.globals.usage_page.0);
        // A 4-byte local usage carries its own usage page
        let full_usage = |item: &RawItem| -> u32 {
            if item.declared_size() == 4 {
                value as u32
            } else {
                (value as u32 & 0xffff) | (page << 16)
            }
        };

        match item.tag() {
            ItemTag::ReportId => {
                if !(0..=0xff).contains(&value) {
                    warn!("Report ID {value:#x} at offset {offset} does not fit in a byte");
                }
                self.report_id = Some(ReportId(value as u8));
            }
            ItemTag::Push => {
                self.stack.push(self.globals.clone());
            }
            ItemTag::Pop => {
                self.globals = self
                    .stack
                    .pop()
                    .ok_or(ParserError::UnbalancedStack { offset })?;
            }
            ItemTag::UsagePage => {
                self.globals.usage_page = UsagePage(value as u16);
                self.locals = Locals::default();
            }
            ItemTag::Collection => {
                if !(0..=0xff).contains(&value) {
                    warn!("Collection type {value:#x} at offset {offset} does not fit in a byte");
                }
                let kind = CollectionKind::from(value as u8);
                let usage = self.locals.usages.last().copied();
                *self.depth.counter(kind) += 1;
                if usage.is_some() {
                    match kind {
                        CollectionKind::Application => self.globals.application = usage,
                        CollectionKind::Physical => self.globals.physical = usage,
                        _ => self.globals.logical = usage,
                    }
                }
                self.collections.push(Collection {
                    kind,
                    usage,
                    index: self.next_collection,
                });
                self.next_collection += 1;
                self.locals = Locals::default();
            }
            ItemTag::EndCollection => match self.collections.pop() {
                Some(c) => {
                    let counter = self.depth.counter(c.kind);
                    *counter = counter.saturating_sub(1);
                }
                None => warn!("End Collection at offset {offset} without an open collection"),
            },
            ItemTag::UsageMinimum => {
                self.locals.usage_minimum = Some(UsageMinimum(full_usage(&item)));
            }
            ItemTag::UsageMaximum => {
                self.locals.usage_maximum = Some(UsageMaximum(full_usage(&item)));
            }
            ItemTag::Usage => {
                self.locals.usages.push(Usage::from(full_usage(&item)));
            }
            ItemTag::LogicalMinimum => {
                self.globals.logical_minimum = LogicalMinimum(value as i32);
            }
            ItemTag::LogicalMaximum => {
                self.globals.logical_maximum = LogicalMaximum(value as i32);
            }
            ItemTag::PhysicalMinimum => {
                self.globals.physical_minimum = Some(PhysicalMinimum(value as i32));
            }
            ItemTag::PhysicalMaximum => {
                self.globals.physical_maximum = Some(PhysicalMaximum(value as i32));
            }
            ItemTag::Unit => {
                self.globals.unit = Some(Unit(value as u32));
            }
            ItemTag::UnitExponent => {
                self.globals.unit_exponent = Some(UnitExponent(value as i32));
            }
            ItemTag::ReportSize => {
                self.globals.report_size = ReportSize(value as usize);
            }
            ItemTag::ReportCount => {
                self.globals.report_count = ReportCount(value as usize);
            }
            ItemTag::Input | ItemTag::Output | ItemTag::Feature => {
                self.handle_main_item(&item)?;
                self.locals = Locals::default();
            }
            ItemTag::DesignatorIndex
            | ItemTag::DesignatorMinimum
            | ItemTag::DesignatorMaximum
            | ItemTag::StringIndex
            | ItemTag::StringMinimum
            | ItemTag::StringMaximum
            | ItemTag::Delimiter => {}
        }

        self.rdesc.items.push(item);
        Ok(())
    }

    fn handle_main_item(&mut self, item: &RawItem) -> Result<()> {
        let Some(direction) = Direction::from_tag(item.tag()) else {
            return Ok(());
        };
        let offset = item.offset();
        let flags = MainItemFlags::from(item);
        let globals = &self.globals;
        let locals = &self.locals;
        let size = usize::from(globals.report_size);
        let count = usize::from(globals.report_count);

        let physical_range = match (globals.physical_minimum, globals.physical_maximum) {
            (Some(minimum), Some(maximum)) => Some(PhysicalRange { minimum, maximum }),
            _ => None,
        };

        let template = Field {
            kind: FieldKind::Constant,
            report_id: self.report_id,
            direction,
            start_bit: 0,
            size,
            count: 1,
            flags,
            usage_page: globals.usage_page,
            logical_range: LogicalRange {
                minimum: globals.logical_minimum,
                maximum: globals.logical_maximum,
            },
            physical_range,
            unit: globals.unit,
            unit_exponent: globals.unit_exponent,
            application: globals.application,
            physical: globals.physical,
            logical: globals.logical,
            collections: self.collections.clone(),
            depth: self.depth,
        };

        let usage_range = match (locals.usage_minimum, locals.usage_maximum) {
            (Some(min), Some(max)) => Some((u32::from(min), u32::from(max))),
            _ => None,
        };

        let bits = size
            .checked_mul(count)
            .filter(|bits| *bits <= MAX_REPORT_SIZE * 8)
            .ok_or(ParserError::ReportTooLarge { offset })?;
        // variable items expand into one field per count, arrays into
        // one usage per value of the usage range
        let expanded = match usage_range {
            _ if flags.is_constant() => 0,
            _ if flags.is_variable() => count as u64,
            Some((min, max)) if max >= min => u64::from(max - min) + 1,
            _ => 0,
        };
        if expanded > MAX_USAGES as u64 {
            return Err(ParserError::TooManyUsages {
                offset,
                count: expanded,
            });
        }

        let fields: Vec<Field> = if flags.is_constant() {
            vec![Field {
                size: bits,
                ..template
            }]
        } else if flags.is_variable() {
            match usage_range {
                Some((min, max)) => {
                    let mut usage = min;
                    (0..count)
                        .map(|_| {
                            let field = Field {
                                kind: FieldKind::Variable {
                                    usage: Usage::from(usage),
                                },
                                ..template.clone()
                            };
                            // repeat the maximum if count exceeds the range
                            if usage < max {
                                usage += 1;
                            }
                            field
                        })
                        .collect()
                }
                None => {
                    let fallback = Usage::from(locals.usage_minimum.map(u32::from).unwrap_or(0));
                    (0..count)
                        .map(|i| {
                            let usage = locals
                                .usages
                                .get(i)
                                .or(locals.usages.last())
                                .copied()
                                .unwrap_or(fallback);
                            Field {
                                kind: FieldKind::Variable { usage },
                                ..template.clone()
                            }
                        })
                        .collect()
                }
            }
        } else {
            let usages = match usage_range {
                Some((min, max)) => (min..=max).map(Usage::from).collect(),
                None => locals.usages.clone(),
            };
            vec![Field {
                kind: FieldKind::Array { usages },
                count,
                ..template
            }]
        };

        if direction == Direction::Feature
            && locals.usages.last().map(u32::from) == Some(WIN8_BLOB_USAGE)
        {
            debug!("Found the Windows 8 certification blob");
            self.rdesc.win8 = true;
        }

        let report_id = self.report_id;
        let application = self.globals.application;
        let report = self
            .rdesc
            .reports_mut(direction)
            .entry(report_id)
            .or_insert_with(|| Report::new(report_id, direction, application));
        if report.bitsize + bits > MAX_REPORT_SIZE * 8 {
            return Err(ParserError::ReportTooLarge { offset });
        }
        for field in fields {
            report.push_field(field);
        }
        Ok(())
    }

    /// Finish parsing and return the report descriptor. Fails if the
    /// last item is incomplete.
    pub fn finish(self) -> Result<ReportDescriptor> {
        if let Some(item) = self.current {
            return Err(ParserError::Truncated {
                offset: self.offset - 1 - item.data().len(),
                tag: item.tag(),
            });
        }
        if !self.collections.is_empty() {
            warn!(
                "{} collections still open at the end of the report descriptor",
                self.collections.len()
            );
        }
        Ok(self.rdesc)
    }
}

/// A parsed report descriptor.
///
/// Reports are keyed by their report ID, `None` is the key of the report
/// of a device that does not use report IDs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReportDescriptor {
    input_reports: BTreeMap<Option<ReportId>, Report>,
    output_reports: BTreeMap<Option<ReportId>, Report>,
    feature_reports: BTreeMap<Option<ReportId>, Report>,
    items: Vec<RawItem>,
    win8: bool,
}

impl ReportDescriptor {
    /// Parse a report descriptor from its bytes. A single trailing zero
    /// byte is ignored.
    pub fn from_bytes(bytes: &[u8]) -> Result<ReportDescriptor> {
        let mut parser = Parser::new();
        for (idx, byte) in bytes.iter().enumerate() {
            if *byte == 0 && idx == bytes.len() - 1 && !parser.is_mid_item() {
                warn!("Ignoring trailing zero byte at offset {idx}");
                break;
            }
            parser.consume(*byte)?;
        }
        parser.finish()
    }

    pub fn input_reports(&self) -> &BTreeMap<Option<ReportId>, Report> {
        &self.input_reports
    }

    pub fn output_reports(&self) -> &BTreeMap<Option<ReportId>, Report> {
        &self.output_reports
    }

    pub fn feature_reports(&self) -> &BTreeMap<Option<ReportId>, Report> {
        &self.feature_reports
    }

    /// The reports of the given direction
    pub fn reports(&self, direction: Direction) -> &BTreeMap<Option<ReportId>, Report> {
        match direction {
            Direction::Input => &self.input_reports,
            Direction::Output => &self.output_reports,
            Direction::Feature => &self.feature_reports,
        }
    }

    fn reports_mut(&mut self, direction: Direction) -> &mut BTreeMap<Option<ReportId>, Report> {
        match direction {
            Direction::Input => &mut self.input_reports,
            Direction::Output => &mut self.output_reports,
            Direction::Feature => &mut self.feature_reports,
        }
    }

    pub fn input_report(&self, id: Option<ReportId>) -> Option<&Report> {
        self.input_reports.get(&id)
    }

    pub fn output_report(&self, id: Option<ReportId>) -> Option<&Report> {
        self.output_reports.get(&id)
    }

    pub fn feature_report(&self, id: Option<ReportId>) -> Option<&Report> {
        self.feature_reports.get(&id)
    }

    /// The items of this report descriptor in order.
    pub fn items(&self) -> &[RawItem] {
        &self.items
    }

    /// True if a Feature report carries the Windows 8 certification blob
    /// (see [WIN8_BLOB_USAGE]).
    pub fn is_win8(&self) -> bool {
        self.win8
    }

    /// The size of the report descriptor in bytes
    pub fn size(&self) -> usize {
        self.items.iter().map(|i| i.size()).sum()
    }

    /// The report descriptor bytes as parsed.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.items.iter().flat_map(|i| i.bytes()).collect()
    }

    /// The report descriptor bytes with every item re-encoded at its
    /// minimum width.
    pub fn to_canonical_bytes(&self) -> Vec<u8> {
        self.items
            .iter()
            .flat_map(|i| i.to_canonical().bytes())
            .collect()
    }

    /// Find the Input report that matches the given report bytes: by the
    /// first byte as report ID if the device uses report IDs, the
    /// unnumbered report otherwise. Returns `None` if the report is
    /// shorter than the data.
    pub fn report_for(&self, data: &[u8]) -> Option<&Report> {
        let first = *data.first()?;
        let report = self
            .input_reports
            .get(&Some(ReportId(first)))
            .or_else(|| self.input_reports.get(&None))?;
        if report.size() < data.len() {
            debug!(
                "Report of {} bytes is longer than the {} bytes of report {:?}",
                data.len(),
                report.size(),
                report.id
            );
            return None;
        }
        Some(report)
    }

    /// The first Input report declared in the given application collection.
    pub fn report_for_application(&self, usage: Usage) -> Option<&Report> {
        self.input_reports
            .values()
            .find(|r| r.application == Some(usage))
    }
}

impl TryFrom<&[u8]> for ReportDescriptor {
    type Error = ParserError;

    fn try_from(bytes: &[u8]) -> Result<ReportDescriptor> {
        ReportDescriptor::from_bytes(bytes)
    }
}
