// SPDX-License-Identifier: MIT

//! The human-readable form of a report descriptor, one item per line:
//!
//! ```text
//! Usage Page (Generic Desktop)
//! Usage (Mouse)
//! Collection (Application)
//!   Usage Page (Button)
//!   Usage Minimum (1)
//!   Usage Maximum (3)
//!   Report Size (1)
//!   Report Count (3)
//!   Input (Data,Var,Abs)
//! End Collection
//! ```
//!
//! [ReportDescriptor::to_text] and [ReportDescriptor::from_text] convert
//! between this form and a [ReportDescriptor]. Usage and usage page names
//! are resolved against a [UsageTable], anything that has no name in that
//! table is written as a number so the text always converts back to the
//! same items.
//!
//! ```
//! # use hidtools::*;
//! let table = UsageTable::builtin();
//! let text = "Usage Page (Generic Desktop)\nUsage (X)\nReport Size (8)\nReport Count (1)\nInput (Data,Var,Rel)\n";
//! let rdesc = ReportDescriptor::from_text(text, table).unwrap();
//! assert_eq!(rdesc.to_bytes(), [0x05, 0x01, 0x09, 0x30, 0x75, 0x08, 0x95, 0x01, 0x81, 0x06]);
//! assert_eq!(rdesc.to_text(table), text);
//! ```

use crate::hut::{UsageTable, SENSOR_PAGE};
use crate::item::{ItemTag, RawItem};
use crate::report::{to_twos_comp, twos_comp};
use crate::types::{Usage, UsagePage};
use crate::{CollectionKind, Parser, ParserError, ReportDescriptor};

/// The layout of [ReportDescriptor::dump].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DumpFormat {
    /// Raw bytes, the human-readable item and the item's offset:
    /// `0x05, 0x01,   // Usage Page (Generic Desktop)   0`
    #[default]
    Default,
    /// A C array body as used in the kernel's HID drivers:
    /// `\t0x05, 0x01,\t\t/* Usage Page (Generic Desktop) */`
    Kernel,
}

const INDENT: &str = "  ";

/// Bits 0 to 2 of a main item have a token for either state.
const FLAG_PAIRS: [(&str, &str); 3] = [("Data", "Cnst"), ("Arr", "Var"), ("Abs", "Rel")];
/// Bits 3 to 8 of a main item only have a token when set.
const FLAG_TOKENS: [&str; 6] = ["Wrap", "NonLin", "NoPref", "Null", "Vol", "Buff"];
const FLAG_MASK: i64 = 0x1ff;

const UNIT_SYSTEMS: [&str; 5] = ["None", "SILinear", "SIRotation", "EngLinear", "EngRotation"];

/// Unit names per nibble (length, mass, time, temperature, current,
/// luminous intensity), indexed by the unit system.
#[rustfmt::skip]
const UNIT_NAMES: [[&str; 5]; 6] = [
    ["None", "Centimeter", "Radians", "Inch", "Degrees"],
    ["None", "Gram", "Gram", "Slug", "Slug"],
    ["Seconds", "Seconds", "Seconds", "Seconds", "Seconds"],
    ["None", "Kelvin", "Kelvin", "Fahrenheit", "Fahrenheit"],
    ["Ampere", "Ampere", "Ampere", "Ampere", "Ampere"],
    ["Candela", "Candela", "Candela", "Candela", "Candela"],
];

/// Modifiers in the upper nibble of a Sensor page usage
const SENSOR_MODS: [&str; 16] = [
    "Mod None",
    "Mod Change Sensitivity Abs",
    "Mod Max",
    "Mod Min",
    "Mod Accuracy",
    "Mod Resolution",
    "Mod Threshold High",
    "Mod Threshold Low",
    "Mod Calibration Offset",
    "Mod Calibration Multiplier",
    "Mod Report Interval",
    "Mod Frequency Max",
    "Mod Period Max",
    "Mod Change Sensitivity Range Percent",
    "Mod Change Sensitivity Rel Percent",
    "Mod Vendor Reserved",
];

/// The tokens of an Input, Output or Feature item's flags, e.g.
/// `Data,Var,Abs`.
pub fn describe_flags(value: u32) -> String {
    let mut tokens: Vec<&str> = FLAG_PAIRS
        .iter()
        .enumerate()
        .map(|(bit, (unset, set))| if value & (1 << bit) != 0 { *set } else { *unset })
        .collect();
    tokens.extend(
        FLAG_TOKENS
            .iter()
            .enumerate()
            .filter(|(bit, _)| value & (1 << (bit + 3)) != 0)
            .map(|(_, token)| *token),
    );
    tokens.join(",")
}

/// The inverse of [describe_flags]. Tokens may appear in any order, on
/// failure the unknown token is returned.
pub fn parse_flags(s: &str) -> Result<u32, String> {
    let mut value = 0;
    for token in s.split(',').map(str::trim) {
        if let Some(bit) = FLAG_PAIRS.iter().position(|(_, set)| *set == token) {
            value |= 1 << bit;
        } else if let Some(bit) = FLAG_TOKENS.iter().position(|t| *t == token) {
            value |= 1 << (bit + 3);
        } else if !FLAG_PAIRS.iter().any(|(unset, _)| *unset == token) {
            return Err(token.to_string());
        }
    }
    Ok(value)
}

/// Decode a Unit item value, e.g. `0xf011` is `Seconds^-1,Centimeter,SILinear`.
///
/// Returns `None` for values that have no name: a unit system beyond
/// English Rotation, vendor defined nibbles or exponents without a system.
pub fn describe_unit(value: u32) -> Option<String> {
    if value == 0 {
        return Some(UNIT_SYSTEMS[0].to_string());
    }
    let system = (value & 0xf) as usize;
    if system == 0 || system >= UNIT_SYSTEMS.len() || value >> 28 != 0 {
        return None;
    }
    let mut components: Vec<String> = (1..=UNIT_NAMES.len())
        .rev()
        .filter_map(|i| {
            let exponent = twos_comp(u64::from((value >> (4 * i)) & 0xf), 4);
            let name = UNIT_NAMES[i - 1][system];
            match exponent {
                0 => None,
                1 => Some(name.to_string()),
                e => Some(format!("{name}^{e}")),
            }
        })
        .collect();
    components.push(UNIT_SYSTEMS[system].to_string());
    Some(components.join(","))
}

/// The inverse of [describe_unit].
pub fn parse_unit(s: &str) -> Option<u32> {
    let tokens: Vec<&str> = s.split(',').map(str::trim).collect();
    let (system_name, components) = tokens.split_last()?;
    let system = UNIT_SYSTEMS.iter().position(|n| n == system_name)?;
    if system == 0 {
        return components.is_empty().then_some(0);
    }

    let mut value = system as u32;
    for component in components {
        let (name, exponent) = match component.split_once('^') {
            Some((name, exp)) => (name, exp.parse::<i64>().ok()?),
            None => (*component, 1),
        };
        if !(-8..=7).contains(&exponent) || exponent == 0 {
            return None;
        }
        let idx = UNIT_NAMES.iter().position(|names| names[system] == name)?;
        value |= (to_twos_comp(exponent, 4) as u32) << (4 * (idx + 1));
    }
    Some(value)
}

fn collection_name(kind: CollectionKind) -> Option<&'static str> {
    match kind {
        CollectionKind::Physical => Some("Physical"),
        CollectionKind::Application => Some("Application"),
        CollectionKind::Logical => Some("Logical"),
        CollectionKind::Report => Some("Report"),
        CollectionKind::NamedArray => Some("Named Array"),
        CollectionKind::UsageSwitch => Some("Usage Switch"),
        CollectionKind::UsageModifier => Some("Usage Modifier"),
        CollectionKind::Reserved(_) | CollectionKind::VendorDefined(_) => None,
    }
}

fn collection_from_name(name: &str) -> Option<CollectionKind> {
    (0x00..=0x06)
        .map(CollectionKind::from)
        .find(|kind| collection_name(*kind) == Some(name))
}

/// The name of the usage, if that name resolves back to the same usage.
fn reversible_usage_name(table: &UsageTable, usage: Usage) -> Option<String> {
    let name = table.usage_name(usage)?;
    (table.usage_by_name(usage.usage_page, &name) == Some(usage)).then(|| name.into_owned())
}

fn describe_usage_page(value: i64, table: &UsageTable) -> String {
    let name = u16::try_from(value).ok().and_then(|page| {
        let page = UsagePage(page);
        let name = table.page_name(page)?;
        (table.page_by_name(&name) == Some(page)).then(|| name.into_owned())
    });
    name.unwrap_or_else(|| format!("Vendor Usage Page 0x{value:02x}"))
}

fn describe_usage(item: &RawItem, table: &UsageTable) -> String {
    let value = item.value();
    if item.declared_size() == 4 {
        return format!("0x{value:08x}");
    }
    let page = item.usage_page();
    let id = value as u16;
    if let Some(name) = reversible_usage_name(table, Usage::new(page.0, id)) {
        return name;
    }
    if page.0 == SENSOR_PAGE {
        let modifier = SENSOR_MODS[usize::from(id >> 12)];
        return match reversible_usage_name(table, Usage::new(page.0, id & 0x0fff)) {
            Some(name) => format!("{name} | {modifier}"),
            None => format!("Unknown Usage 0x{value:02x}"),
        };
    }
    format!("Vendor Usage 0x{value:02x}")
}

/// The human-readable form of one item, without indentation.
///
/// ```
/// # use hidtools::item::RawItem;
/// # use hidtools::render::describe_item;
/// # use hidtools::UsageTable;
/// let item = RawItem::from_bytes(&[0x81, 0x06]).unwrap();
/// assert_eq!(describe_item(&item, UsageTable::builtin()), "Input (Data,Var,Rel)");
/// ```
pub fn describe_item(item: &RawItem, table: &UsageTable) -> String {
    let value = item.value();
    let payload = match item.tag() {
        ItemTag::EndCollection | ItemTag::Push | ItemTag::Pop => None,
        ItemTag::Collection => Some(
            u8::try_from(value)
                .ok()
                .and_then(|v| collection_name(CollectionKind::from(v)))
                .map(String::from)
                .unwrap_or_else(|| format!("0x{value:02x}")),
        ),
        ItemTag::UsagePage => Some(describe_usage_page(value, table)),
        ItemTag::Usage => Some(describe_usage(item, table)),
        ItemTag::UsageMinimum | ItemTag::UsageMaximum if item.declared_size() == 4 => {
            Some(format!("0x{value:08x}"))
        }
        ItemTag::Input | ItemTag::Output | ItemTag::Feature => Some(if value & !FLAG_MASK == 0 {
            describe_flags(value as u32)
        } else {
            format!("0x{value:x}")
        }),
        ItemTag::Unit => {
            Some(describe_unit(value as u32).unwrap_or_else(|| format!("0x{value:x}")))
        }
        _ => Some(value.to_string()),
    };
    match payload {
        Some(payload) => format!("{} ({payload})", item.tag()),
        None => item.tag().name().to_string(),
    }
}

/// Decimal with an optional minus sign, or `0x`-prefixed hex.
fn parse_number(s: &str) -> Option<i64> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        return i64::from_str_radix(hex, 16).ok();
    }
    let digits = s.strip_prefix('-').unwrap_or(s);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

fn parse_usage(s: &str, page: UsagePage, table: &UsageTable) -> Option<i64> {
    if let Some(usage) = table.usage_by_name(page, s) {
        return Some(i64::from(usage.usage_id.0));
    }
    if page.0 == SENSOR_PAGE {
        if let Some((name, modifier)) = s.split_once(" | ") {
            let base = table.usage_by_name(page, name.trim())?;
            let modifier = SENSOR_MODS.iter().position(|m| *m == modifier.trim())?;
            return Some(i64::from(base.usage_id.0 & 0x0fff) | ((modifier as i64) << 12));
        }
    }
    s.strip_prefix("Vendor Usage ")
        .or_else(|| s.strip_prefix("Unknown Usage "))
        .and_then(parse_number)
}

/// A usage written as `0x` and eight hex digits is a 4-byte usage that
/// carries its own usage page.
fn parse_extended_usage(tag: ItemTag, payload: &str) -> Option<u32> {
    let hex = payload.strip_prefix("0x")?;
    if !tag.is_usage() || hex.len() != 8 {
        return None;
    }
    u32::from_str_radix(hex, 16).ok()
}

/// Resolve the payload of a line for the given tag. On failure the
/// unresolved token is returned.
fn parse_payload(
    tag: ItemTag,
    payload: &str,
    page: UsagePage,
    table: &UsageTable,
) -> Result<i64, String> {
    let symbol = match tag {
        ItemTag::UsagePage => table
            .page_by_name(payload)
            .map(|p| i64::from(p.0))
            .or_else(|| {
                payload
                    .strip_prefix("Vendor Usage Page ")
                    .and_then(parse_number)
            }),
        ItemTag::Usage => parse_usage(payload, page, table),
        ItemTag::Collection => collection_from_name(payload).map(|k| i64::from(u8::from(k))),
        ItemTag::Input | ItemTag::Output | ItemTag::Feature => match parse_flags(payload) {
            Ok(flags) => Some(i64::from(flags)),
            Err(token) => return parse_number(payload).ok_or(token),
        },
        ItemTag::Unit => parse_unit(payload).map(i64::from),
        _ => None,
    };
    symbol
        .or_else(|| parse_number(payload))
        .ok_or_else(|| payload.to_string())
}

/// Split `Name (payload)` into its two parts. The payload is everything
/// between the first ` (` and the final `)`, so it may contain
/// parentheses itself.
fn split_line(line: &str) -> (&str, Option<&str>) {
    let line = line.trim();
    match line.find(" (") {
        Some(open) if line.ends_with(')') && open + 2 < line.len() => {
            (&line[..open], Some(&line[open + 2..line.len() - 1]))
        }
        _ => (line, None),
    }
}

/// Convert one line of the human-readable form into an item. Usage names
/// are looked up in the given usage page. `lineno` is only used for
/// errors.
pub fn parse_item_line(
    line: &str,
    lineno: usize,
    page: UsagePage,
    table: &UsageTable,
) -> Result<RawItem, ParserError> {
    let (name, payload) = split_line(line);
    let tag = ItemTag::from_name(name).ok_or_else(|| ParserError::InvalidLine {
        line: lineno,
        message: format!("unknown item '{name}'"),
    })?;
    if let Some(usage) = payload.and_then(|p| parse_extended_usage(tag, p)) {
        return Ok(RawItem::encode_extended_usage(tag, usage));
    }
    let value = match payload {
        None => None,
        Some(payload) => Some(
            parse_payload(tag, payload, page, table)
                .map_err(|token| ParserError::UnresolvedSymbol {
                    line: lineno,
                    token,
                })?,
        ),
    };
    Ok(RawItem::encode(tag, value))
}

impl ReportDescriptor {
    /// Every item with its indented human-readable form.
    fn describe_items<'a>(&'a self, table: &UsageTable) -> Vec<(&'a RawItem, String)> {
        let mut indent = 0usize;
        self.items()
            .iter()
            .map(|item| {
                if item.tag() == ItemTag::EndCollection {
                    indent = indent.saturating_sub(1);
                }
                let text = format!("{}{}", INDENT.repeat(indent), describe_item(item, table));
                if item.tag() == ItemTag::Collection {
                    indent += 1;
                }
                (item, text)
            })
            .collect()
    }

    /// The human-readable form of this report descriptor, one item per
    /// line and indented by two spaces per open collection.
    pub fn to_text(&self, table: &UsageTable) -> String {
        self.describe_items(table)
            .into_iter()
            .map(|(_, text)| text + "\n")
            .collect()
    }

    /// Parse the human-readable form produced by [ReportDescriptor::to_text].
    /// Empty lines are ignored, leading whitespace is not significant.
    pub fn from_text(text: &str, table: &UsageTable) -> Result<ReportDescriptor, ParserError> {
        let mut parser = Parser::new();
        for (idx, line) in text.lines().enumerate() {
            let lineno = idx + 1;
            if line.trim().is_empty() {
                continue;
            }
            let item = parse_item_line(line, lineno, parser.usage_page(), table)?;
            parser
                .parse_item(item)
                .map_err(|e| ParserError::AtLine {
                    line: lineno,
                    source: Box::new(e),
                })?;
        }
        parser.finish()
    }

    /// The raw bytes of this report descriptor annotated with the
    /// human-readable form, see [DumpFormat].
    pub fn dump(&self, format: DumpFormat, table: &UsageTable) -> String {
        let mut output = String::new();
        for (item, descr) in self.describe_items(table) {
            let raw = item
                .bytes()
                .iter()
                .map(|b| format!("0x{b:02x},"))
                .collect::<Vec<_>>()
                .join(" ");
            let line = match format {
                DumpFormat::Default => format!("{raw:<30} // {descr:<35} {}\n", item.offset()),
                DumpFormat::Kernel => {
                    let tabs = "\t".repeat(40usize.saturating_sub(raw.len()) / 8);
                    let descr_tabs = "\t".repeat(52usize.saturating_sub(descr.len()) / 8);
                    format!("\t{raw}{tabs}/* {descr}{descr_tabs}*/\n")
                }
            };
            output.push_str(&line);
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn describe(bytes: &[u8], page: u16) -> String {
        let mut item = RawItem::from_bytes(bytes).unwrap();
        item.usage_page = UsagePage(page);
        describe_item(&item, UsageTable::builtin())
    }

    #[test]
    fn flags() {
        assert_eq!(describe_flags(0x00), "Data,Arr,Abs");
        assert_eq!(describe_flags(0x02), "Data,Var,Abs");
        assert_eq!(describe_flags(0x03), "Cnst,Var,Abs");
        assert_eq!(describe_flags(0x06), "Data,Var,Rel");
        assert_eq!(describe_flags(0x42), "Data,Var,Abs,Null");
        assert_eq!(
            describe_flags(0x1ff),
            "Cnst,Var,Rel,Wrap,NonLin,NoPref,Null,Vol,Buff"
        );
        for value in [0x00, 0x02, 0x03, 0x06, 0x42, 0x1ff, 0x102] {
            assert_eq!(parse_flags(&describe_flags(value)), Ok(value));
        }
        assert_eq!(parse_flags("Var, Data"), Ok(0x02));
        assert_eq!(parse_flags("Data,Var,Bogus"), Err("Bogus".to_string()));
    }

    #[test]
    fn units() {
        assert_eq!(describe_unit(0x00).as_deref(), Some("None"));
        assert_eq!(describe_unit(0x11).as_deref(), Some("Centimeter,SILinear"));
        assert_eq!(describe_unit(0x14).as_deref(), Some("Degrees,EngRotation"));
        assert_eq!(describe_unit(0x13).as_deref(), Some("Inch,EngLinear"));
        assert_eq!(
            describe_unit(0xf011).as_deref(),
            Some("Seconds^-1,Centimeter,SILinear")
        );
        assert_eq!(describe_unit(0x1001).as_deref(), Some("Seconds,SILinear"));
        assert_eq!(describe_unit(0x01).as_deref(), Some("SILinear"));
        assert_eq!(
            describe_unit(0x00e1_f011).as_deref(),
            Some("Ampere^-2,Kelvin,Seconds^-1,Centimeter,SILinear")
        );
        // no symbolic form
        assert_eq!(describe_unit(0x05), None);
        assert_eq!(describe_unit(0x10), None);
        assert_eq!(describe_unit(0xf000_0011), None);

        for value in [0x00, 0x01, 0x11, 0x14, 0x13, 0xf011, 0x1001, 0x00e1_f011, 0x0010_0002] {
            let text = describe_unit(value).unwrap();
            assert_eq!(parse_unit(&text), Some(value), "for {text}");
        }
        assert_eq!(parse_unit("Parsec,SILinear"), None);
        assert_eq!(parse_unit("Centimeter^9,SILinear"), None);
        assert_eq!(parse_unit("Centimeter,None"), None);
    }

    #[test]
    fn items() {
        assert_eq!(describe(&[0x05, 0x01], 0), "Usage Page (Generic Desktop)");
        assert_eq!(
            describe(&[0x06, 0x00, 0xff], 0),
            "Usage Page (Vendor Defined Page 1)"
        );
        assert_eq!(
            describe(&[0x06, 0x34, 0x12], 0),
            "Usage Page (Vendor Usage Page 0x1234)"
        );
        assert_eq!(describe(&[0x09, 0x30], 0x01), "Usage (X)");
        assert_eq!(describe(&[0x09, 0x05], 0x09), "Usage (Button 5)");
        assert_eq!(describe(&[0x09, 0x20], 0xff00), "Usage (Vendor Usage 0x20)");
        assert_eq!(
            describe(&[0x0b, 0xc5, 0x00, 0x00, 0xff], 0x01),
            "Usage (0xff0000c5)"
        );
        assert_eq!(describe(&[0xa1, 0x01], 0), "Collection (Application)");
        assert_eq!(describe(&[0xa1, 0x04], 0), "Collection (Named Array)");
        assert_eq!(describe(&[0xa1, 0x80], 0), "Collection (0x80)");
        assert_eq!(describe(&[0xc0], 0), "End Collection");
        assert_eq!(describe(&[0xa4], 0), "Push");
        assert_eq!(describe(&[0x15, 0x81], 0), "Logical Minimum (-127)");
        assert_eq!(describe(&[0x26, 0xff, 0x00], 0), "Logical Maximum (255)");
        assert_eq!(describe(&[0x55, 0x0e], 0), "Unit Exponent (-2)");
        assert_eq!(describe(&[0x65, 0x11], 0), "Unit (Centimeter,SILinear)");
        assert_eq!(describe(&[0x65, 0x05], 0), "Unit (0x5)");
        assert_eq!(describe(&[0x85, 0x02], 0), "Report ID (2)");
        assert_eq!(describe(&[0x79, 0x03], 0), "String Index (3)");
        assert_eq!(describe(&[0x82, 0x02, 0x02], 0), "Input (0x202)");
    }

    #[test]
    fn sensor_modifiers() {
        // Property: Report Interval with no modifier
        assert_eq!(describe(&[0x0a, 0x0e, 0x03], 0x20), "Usage (Property: Report Interval)");
        // Data Field: Acceleration with Mod Max
        assert_eq!(
            describe(&[0x0a, 0x52, 0x24], 0x20),
            "Usage (Data Field: Acceleration | Mod Max)"
        );
        assert_eq!(describe(&[0x0a, 0xff, 0x2f], 0x20), "Usage (Unknown Usage 0x2fff)");

        let table = UsageTable::builtin();
        let item = parse_item_line(
            "Usage (Data Field: Acceleration | Mod Max)",
            1,
            UsagePage(0x20),
            table,
        )
        .unwrap();
        assert_eq!(item.value(), 0x2452);
    }

    #[test]
    fn lines() {
        let table = UsageTable::builtin();
        let parse = |line: &str, page: u16| {
            parse_item_line(line, 1, UsagePage(page), table)
                .unwrap()
                .bytes()
        };
        assert_eq!(parse("Usage Page (Generic Desktop)", 0), [0x05, 0x01]);
        assert_eq!(parse("  Usage Page (Vendor Usage Page 0xff01)", 0), [0x06, 0x01, 0xff]);
        assert_eq!(parse("Usage (X)", 0x01), [0x09, 0x30]);
        assert_eq!(parse("Usage (Keyboard 9 and ()", 0x07), [0x09, 0x26]);
        assert_eq!(parse("Usage (Keyboard Return (ENTER))", 0x07), [0x09, 0x28]);
        assert_eq!(parse("Usage (Vendor Usage 0x20)", 0xff00), [0x09, 0x20]);
        assert_eq!(parse("Usage (0xff0000c5)", 0), [0x0b, 0xc5, 0x00, 0x00, 0xff]);
        assert_eq!(parse("Collection (Physical)", 0), [0xa1, 0x00]);
        assert_eq!(parse("End Collection", 0), [0xc0]);
        assert_eq!(parse("Logical Minimum (-127)", 0), [0x15, 0x81]);
        assert_eq!(parse("Logical Maximum (32767)", 0), [0x26, 0xff, 0x7f]);
        assert_eq!(parse("Unit Exponent (-2)", 0), [0x55, 0x0e]);
        assert_eq!(parse("Unit (Seconds^-1,Centimeter,SILinear)", 0), [0x66, 0x11, 0xf0]);
        assert_eq!(parse("Input (Cnst,Var,Abs)", 0), [0x81, 0x03]);
        assert_eq!(parse("Feature (0x202)", 0), [0xb2, 0x02, 0x02]);
        assert_eq!(parse("Pop", 0), [0xb4]);
    }

    #[test]
    fn extended_usages() {
        let table = UsageTable::builtin();
        #[rustfmt::skip]
        let bytes = [
            0x05, 0x01,                    // Usage Page (Generic Desktop)
            0x0b, 0x30, 0x00, 0x00, 0x00,  // Usage (0x00000030)
            0x1b, 0x01, 0x00, 0x00, 0x00,  // Usage Minimum (0x00000001)
            0x2b, 0x03, 0x00, 0x00, 0x00,  // Usage Maximum (0x00000003)
            0x75, 0x01,                    // Report Size (1)
            0x95, 0x03,                    // Report Count (3)
            0x81, 0x02,                    // Input (Data,Var,Abs)
        ];
        let rdesc = ReportDescriptor::from_bytes(&bytes).unwrap();
        let text = rdesc.to_text(table);
        assert!(text.contains("Usage (0x00000030)\n"));
        assert!(text.contains("Usage Minimum (0x00000001)\n"));
        assert!(text.contains("Usage Maximum (0x00000003)\n"));

        let parsed = ReportDescriptor::from_text(&text, table).unwrap();
        assert_eq!(parsed.to_bytes(), bytes);
        assert_eq!(rdesc.to_canonical_bytes(), bytes);
        assert_eq!(parsed.input_reports(), rdesc.input_reports());

        // a short usage minimum is still a plain number
        assert_eq!(
            parse_item_line("Usage Minimum (1)", 1, UsagePage(0x09), table)
                .unwrap()
                .bytes(),
            [0x19, 0x01]
        );
    }

    #[test]
    fn line_errors() {
        let table = UsageTable::builtin();
        assert_eq!(
            parse_item_line("Usage (Frobnicator)", 7, UsagePage(0x01), table).unwrap_err(),
            ParserError::UnresolvedSymbol {
                line: 7,
                token: "Frobnicator".to_string()
            }
        );
        assert_eq!(
            parse_item_line("Input (Data,Bogus)", 2, UsagePage(0x01), table).unwrap_err(),
            ParserError::UnresolvedSymbol {
                line: 2,
                token: "Bogus".to_string()
            }
        );
        assert!(matches!(
            parse_item_line("Frobnicate (3)", 3, UsagePage(0x01), table),
            Err(ParserError::InvalidLine { line: 3, .. })
        ));
        // usage names are scoped to the current usage page
        assert!(parse_item_line("Usage (Tip Switch)", 1, UsagePage(0x01), table).is_err());
    }

    #[test]
    fn from_text_errors() {
        let table = UsageTable::builtin();
        let err = ReportDescriptor::from_text("Usage Page (Button)\nPush\nPop\nPop\n", table)
            .unwrap_err();
        assert_eq!(
            err,
            ParserError::AtLine {
                line: 4,
                source: Box::new(ParserError::UnbalancedStack { offset: 4 })
            }
        );
    }

    #[test]
    fn dump_formats() {
        let table = UsageTable::builtin();
        let rdesc =
            ReportDescriptor::from_bytes(&[0x05, 0x01, 0x09, 0x02, 0xa1, 0x01, 0xc0]).unwrap();
        let dump = rdesc.dump(DumpFormat::Default, table);
        let lines: Vec<&str> = dump.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(
            lines[0],
            format!("{:<30} // {:<35} 0", "0x05, 0x01,", "Usage Page (Generic Desktop)")
        );
        assert!(lines[3].starts_with("0xc0,"));
        assert!(lines[3].ends_with(" 6"));
        assert!(lines[3].contains("// End Collection"));

        let dump = rdesc.dump(DumpFormat::Kernel, table);
        let lines: Vec<&str> = dump.lines().collect();
        assert_eq!(lines[0], "\t0x05, 0x01,\t\t\t/* Usage Page (Generic Desktop)\t\t\t*/");
        assert_eq!(lines[3], "\t0xc0,\t\t\t\t/* End Collection\t\t\t\t*/");
    }
}
