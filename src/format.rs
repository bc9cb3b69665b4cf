// SPDX-License-Identifier: MIT

//! Human-readable decoding of report bytes and the inverse, building report
//! bytes from named values.
//!
//! Values are addressed by the name of their usage with spaces removed and
//! lowercased, e.g. a field with the usage `Tip Switch` is looked up as
//! `tipswitch`. Button usages are named `B1`, `B2`, ... (`b1`, `b2`, ...).
//!
//! Multitouch devices often declare a second X/Y pair in the same
//! collection for the contact's center or size. When a field would repeat
//! an `X` or `Y` already seen in the current collection it is named `CX`
//! or `CY` instead.

use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

use crate::hut::{UsageTable, BUTTON_PAGE};
use crate::report::ReportError;
use crate::types::{ReportId, Usage};
use crate::{Field, FieldKind, Report, ReportDescriptor};

type Result<T> = std::result::Result<T, ReportError>;

/// A source of values for [Report::format_report], looked up by
/// [field key](field_key).
///
/// ```
/// # use hidtools::ReportValueSource;
/// struct Mouse {
///     x: i64,
///     y: i64,
/// }
///
/// impl ReportValueSource for Mouse {
///     fn get(&self, key: &str) -> Option<i64> {
///         match key {
///             "x" => Some(self.x),
///             "y" => Some(self.y),
///             _ => None,
///         }
///     }
/// }
/// ```
pub trait ReportValueSource {
    /// The value for the given field key, or `None` if this source does
    /// not provide one.
    fn get(&self, key: &str) -> Option<i64>;
}

impl<S: BuildHasher> ReportValueSource for HashMap<String, i64, S> {
    fn get(&self, key: &str) -> Option<i64> {
        self.get(key).copied()
    }
}

impl ReportValueSource for BTreeMap<String, i64> {
    fn get(&self, key: &str) -> Option<i64> {
        self.get(key).copied()
    }
}

impl<V: Copy + Into<i64>, const N: usize> ReportValueSource for [(&str, V); N] {
    fn get(&self, key: &str) -> Option<i64> {
        self.iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| (*v).into())
    }
}

/// The key a [ReportValueSource] is queried with for a usage name.
///
/// ```
/// # use hidtools::format::field_key;
/// assert_eq!(field_key("Tip Switch"), "tipswitch");
/// assert_eq!(field_key("B1"), "b1");
/// ```
pub fn field_key(name: &str) -> String {
    name.chars()
        .filter(|c| *c != ' ')
        .flat_map(char::to_lowercase)
        .collect()
}

/// The short name of a usage used in decoded reports.
pub fn usage_name(usage: Usage, table: &UsageTable) -> String {
    if usage.usage_page.0 == BUTTON_PAGE {
        return format!("B{}", usage.usage_id);
    }
    match table.usage_name(usage) {
        Some(name) => name.into_owned(),
        None => format!("0x{:04x}", u32::from(usage)),
    }
}

/// The usage names seen since the collection last changed.
#[derive(Debug, Default)]
struct SeenUsages {
    names: Vec<String>,
    collection: Option<usize>,
}

impl SeenUsages {
    fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    fn clear(&mut self) {
        self.names.clear();
    }

    /// True if this field is in a different collection than the previous one.
    fn collection_changed(&self, field: &Field) -> bool {
        self.collection.is_some() && self.collection != field.collection_index()
    }

    fn push(&mut self, field: &Field, name: String) {
        self.collection = field.collection_index();
        self.names.push(name);
    }

    /// Rename a repeated X/Y to CX/CY.
    fn disambiguate(&self, name: String) -> String {
        if !self.contains(&name) {
            return name;
        }
        match name.as_str() {
            "X" if !self.contains("Y") || self.contains("CY") => "CX".to_string(),
            "Y" if !self.contains("X") || self.contains("CX") => "CY".to_string(),
            _ => name,
        }
    }
}

/// The width of a right-aligned column that fits any value of the field.
fn column_width(size: usize) -> usize {
    (1u128 << size.min(127)).to_string().len() + 1
}

fn array_entry(field: &Field, value: i64, page_name: &str, table: &UsageTable) -> String {
    let range = &field.logical_range;
    if value < i64::from(range.minimum.0) || value > i64::from(range.maximum.0) {
        return String::new();
    }
    let vendor = page_name.to_lowercase().contains("vendor");
    match field.resolve_array_value(value) {
        Some(usage) if !vendor && value > 0 => {
            let name = usage_name(usage, table);
            if name.to_lowercase().contains("no event indicated") {
                String::new()
            } else {
                name
            }
        }
        _ => format!("{value:02x}"),
    }
}

impl Report {
    /// Decode the report bytes into a single human-readable string, e.g.
    /// ` B1: 1 | B2: 0 | B3: 1 | # | X:   -5 | Y:   10 `.
    ///
    /// Constant fields print as `#`, array fields as the usage page name
    /// followed by the usage of each element. Consecutive fields with the
    /// same usage share one label. If `split_lines` is true a newline is
    /// inserted whenever the innermost collection changes.
    pub fn describe(&self, data: &[u8], table: &UsageTable, split_lines: bool) -> Result<String> {
        let mut output = String::new();
        let mut seen = SeenUsages::default();
        let mut sep = "";

        if let Some(id) = self.id {
            let first = *data.first().ok_or(ReportError::OutOfData {
                start: 0,
                end: 8,
                len: 0,
            })?;
            if first != id.0 {
                return Err(ReportError::ReportIdMismatch {
                    expected: id,
                    actual: first,
                });
            }
            output.push_str(&format!("ReportID: {id} "));
            sep = "/";
        }

        let mut prev: Option<&Field> = None;
        for field in self.fields() {
            let values = match &field.kind {
                FieldKind::Constant => {
                    output.push_str(&format!("{sep} # "));
                    continue;
                }
                _ => field.get_values(data)?,
            };
            match &field.kind {
                FieldKind::Variable { usage } => {
                    let name = seen.disambiguate(usage_name(*usage, table));
                    let mut label = format!(" {name}:");
                    if split_lines && seen.collection_changed(field) {
                        seen.clear();
                        output.push('\n');
                    }
                    seen.push(field, name);

                    if prev.is_some_and(|p| {
                        p.direction == field.direction
                            && p.flags == field.flags
                            && p.usage() == field.usage()
                    }) {
                        sep = ",";
                        label.clear();
                    }
                    let value = values.first().copied().unwrap_or(0);
                    let width = if field.size > 1 { column_width(field.size) } else { 0 };
                    output.push_str(&format!("{sep}{label} {value:>width$} "));
                }
                FieldKind::Array { .. } => {
                    let page_name = table
                        .page_name(field.usage_page)
                        .map(|n| n.into_owned())
                        .unwrap_or_else(|| "Array".to_string());
                    let entries: Vec<String> = values
                        .iter()
                        .map(|v| array_entry(field, *v, &page_name, table))
                        .collect();
                    output.push_str(&format!("{sep}{page_name} [{}] ", entries.join(", ")));
                }
                FieldKind::Constant => {}
            }
            sep = "|";
            prev = Some(field);
        }
        Ok(output)
    }

    /// Build the bytes of this report from named values.
    ///
    /// Each variable field is looked up by its [field key](field_key) in the
    /// current slot, then in `global`, and is 0 if neither has a value.
    /// Devices that repeat the same usages in sibling collections (one
    /// collection per touch contact) advance to the next slot whenever an
    /// already seen usage appears in a new collection. Array fields are
    /// left zeroed.
    pub fn format_report(
        &self,
        slots: &[&dyn ReportValueSource],
        global: Option<&dyn ReportValueSource>,
        table: &UsageTable,
    ) -> Result<Vec<u8>> {
        let mut report = vec![0u8; self.size()];
        if let (Some(id), Some(first)) = (self.id, report.first_mut()) {
            *first = id.0;
        }

        let mut seen = SeenUsages::default();
        let mut slot = 0;
        for field in self.fields() {
            let FieldKind::Variable { usage } = field.kind else {
                continue;
            };
            let name = seen.disambiguate(usage_name(usage, table));
            if seen.collection_changed(field) && seen.contains(&name) {
                slot += 1;
                seen.clear();
            }

            let key = field_key(&name);
            let value = slots
                .get(slot)
                .and_then(|s| s.get(&key))
                .or_else(|| global.and_then(|g| g.get(&key)))
                .unwrap_or(0);
            field.set_value(&mut report, 0, value)?;
            seen.push(field, name);
        }
        Ok(report)
    }
}

impl ReportDescriptor {
    /// Decode an Input report, see [Report::describe]. The report is
    /// selected with [ReportDescriptor::report_for].
    pub fn describe_report(
        &self,
        data: &[u8],
        table: &UsageTable,
        split_lines: bool,
    ) -> Result<String> {
        let report = self
            .report_for(data)
            .ok_or(ReportError::NoSuchReport(data.first().map(|b| ReportId(*b))))?;
        report.describe(data, table, split_lines)
    }

    /// Build the Input report with the given report ID (`None` for a
    /// device without report IDs), see [Report::format_report].
    pub fn format_report(
        &self,
        id: Option<ReportId>,
        slots: &[&dyn ReportValueSource],
        global: Option<&dyn ReportValueSource>,
        table: &UsageTable,
    ) -> Result<Vec<u8>> {
        self.input_report(id)
            .ok_or(ReportError::NoSuchReport(id))?
            .format_report(slots, global, table)
    }

    /// Build the first Input report of the application collection with the
    /// given usage, see [Report::format_report].
    pub fn format_application_report(
        &self,
        application: Usage,
        slots: &[&dyn ReportValueSource],
        global: Option<&dyn ReportValueSource>,
        table: &UsageTable,
    ) -> Result<Vec<u8>> {
        self.report_for_application(application)
            .ok_or(ReportError::NoSuchReport(None))?
            .format_report(slots, global, table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MOUSE: [u8; 50] = [
        0x05, 0x01, 0x09, 0x02, 0xa1, 0x01, 0x09, 0x01, 0xa1, 0x00, 0x05, 0x09, 0x19, 0x01, 0x29,
        0x03, 0x15, 0x00, 0x25, 0x01, 0x95, 0x03, 0x75, 0x01, 0x81, 0x02, 0x95, 0x01, 0x75, 0x05,
        0x81, 0x03, 0x05, 0x01, 0x09, 0x30, 0x09, 0x31, 0x15, 0x81, 0x25, 0x7f, 0x75, 0x08, 0x95,
        0x02, 0x81, 0x06, 0xc0, 0xc0,
    ];

    #[rustfmt::skip]
    const FINGER: [u8; 44] = [
        0x05, 0x0d,             // Usage Page (Digitizers)
        0x09, 0x22,             // Usage (Finger)
        0xa1, 0x02,             // Collection (Logical)
        0x09, 0x42,             //   Usage (Tip Switch)
        0x15, 0x00,             //   Logical Minimum (0)
        0x25, 0x01,             //   Logical Maximum (1)
        0x75, 0x01,             //   Report Size (1)
        0x95, 0x01,             //   Report Count (1)
        0x81, 0x02,             //   Input (Data,Var,Abs)
        0x75, 0x07,             //   Report Size (7)
        0x81, 0x03,             //   Input (Cnst,Var,Abs)
        0x09, 0x51,             //   Usage (Contact Id)
        0x25, 0x7f,             //   Logical Maximum (127)
        0x75, 0x08,             //   Report Size (8)
        0x81, 0x02,             //   Input (Data,Var,Abs)
        0x05, 0x01,             //   Usage Page (Generic Desktop)
        0x09, 0x30,             //   Usage (X)
        0x09, 0x31,             //   Usage (Y)
        0x26, 0xff, 0x00,       //   Logical Maximum (255)
        0x95, 0x02,             //   Report Count (2)
        0x81, 0x02,             //   Input (Data,Var,Abs)
        0xc0,                   // End Collection
    ];

    fn touchscreen() -> ReportDescriptor {
        let mut bytes = vec![
            0x05, 0x0d, // Usage Page (Digitizers)
            0x09, 0x04, // Usage (Touch Screen)
            0xa1, 0x01, // Collection (Application)
            0x85, 0x01, // Report ID (1)
        ];
        bytes.extend(FINGER);
        bytes.extend(FINGER);
        bytes.extend([
            0x05, 0x0d, // Usage Page (Digitizers)
            0x09, 0x54, // Usage (Contact Count)
            0x25, 0x7f, // Logical Maximum (127)
            0x95, 0x01, // Report Count (1)
            0x75, 0x08, // Report Size (8)
            0x81, 0x02, // Input (Data,Var,Abs)
            0xc0, // End Collection
        ]);
        ReportDescriptor::from_bytes(&bytes).unwrap()
    }

    struct Mouse {
        buttons: [bool; 3],
        x: i64,
        y: i64,
    }

    impl ReportValueSource for Mouse {
        fn get(&self, key: &str) -> Option<i64> {
            match key {
                "b1" => Some(self.buttons[0] as i64),
                "b2" => Some(self.buttons[1] as i64),
                "b3" => Some(self.buttons[2] as i64),
                "x" => Some(self.x),
                "y" => Some(self.y),
                _ => None,
            }
        }
    }

    #[test]
    fn keys() {
        assert_eq!(field_key("Contact Count Maximum"), "contactcountmaximum");
        assert_eq!(field_key("X"), "x");
        let table = UsageTable::builtin();
        assert_eq!(usage_name(Usage::new(0x09, 2), table), "B2");
        assert_eq!(usage_name(Usage::new(0x0d, 0x42), table), "Tip Switch");
        assert_eq!(usage_name(Usage::new(0x1234, 0x01), table), "0x12340001");
    }

    #[test]
    fn disambiguate() {
        let mut seen = SeenUsages::default();
        seen.names.push("X".to_string());
        assert_eq!(seen.disambiguate("X".to_string()), "CX");
        assert_eq!(seen.disambiguate("Y".to_string()), "Y");
        seen.names.push("Y".to_string());
        assert_eq!(seen.disambiguate("X".to_string()), "X");
        seen.names.push("CX".to_string());
        assert_eq!(seen.disambiguate("Y".to_string()), "CY");
    }

    #[test]
    fn mouse() {
        let table = UsageTable::builtin();
        let rdesc = ReportDescriptor::from_bytes(&MOUSE).unwrap();
        let mouse = Mouse {
            buttons: [true, false, true],
            x: -5,
            y: 10,
        };
        let report = rdesc.format_report(None, &[&mouse], None, table).unwrap();
        assert_eq!(report, [0x05, 0xfb, 0x0a]);

        assert_eq!(
            rdesc.describe_report(&report, table, true).unwrap(),
            " B1: 1 | B2: 0 | B3: 1 | # | X:   -5 | Y:   10 "
        );
    }

    #[test]
    fn repeated_usage_label() {
        let table = UsageTable::builtin();
        #[rustfmt::skip]
        let bytes = [
            0x05, 0x01,  // Usage Page (Generic Desktop)
            0x09, 0x38,  // Usage (Wheel)
            0x75, 0x08,  // Report Size (8)
            0x95, 0x02,  // Report Count (2)
            0x81, 0x02,  // Input (Data,Var,Abs)
            0x09, 0x38,  // Usage (Wheel)
            0x95, 0x01,  // Report Count (1)
            0x81, 0x06,  // Input (Data,Var,Rel)
        ];
        let rdesc = ReportDescriptor::from_bytes(&bytes).unwrap();
        assert_eq!(
            rdesc.describe_report(&[1, 2, 3], table, true).unwrap(),
            " Wheel:    1 ,    2 | Wheel:    3 "
        );
    }

    #[test]
    fn global_values() {
        let table = UsageTable::builtin();
        let rdesc = ReportDescriptor::from_bytes(&MOUSE).unwrap();
        let slot: &dyn ReportValueSource = &[("x", 3)];
        let global: &dyn ReportValueSource = &[("x", 100), ("y", -1), ("b2", 1)];
        let report = rdesc
            .format_report(None, &[slot], Some(global), table)
            .unwrap();
        assert_eq!(report, [0x02, 0x03, 0xff]);
    }

    #[test]
    fn value_out_of_range() {
        let table = UsageTable::builtin();
        let rdesc = ReportDescriptor::from_bytes(&MOUSE).unwrap();
        let slot: &dyn ReportValueSource = &[("b1", 2)];
        assert!(matches!(
            rdesc.format_report(None, &[slot], None, table),
            Err(ReportError::ValueTooLarge { value: 2, size: 1 })
        ));
        assert_eq!(
            rdesc.format_report(Some(ReportId(1)), &[], None, table),
            Err(ReportError::NoSuchReport(Some(ReportId(1))))
        );
    }

    #[test]
    fn multitouch() {
        let table = UsageTable::builtin();
        let rdesc = touchscreen();
        let report = rdesc.input_report(Some(ReportId(1))).unwrap();
        assert_eq!(report.size(), 10);

        let mut first: HashMap<String, i64> = HashMap::new();
        first.insert("tipswitch".to_string(), 1);
        first.insert("contactid".to_string(), 0);
        first.insert("x".to_string(), 100);
        first.insert("y".to_string(), 200);
        let mut second: BTreeMap<String, i64> = BTreeMap::new();
        second.insert("tipswitch".to_string(), 1);
        second.insert("contactid".to_string(), 1);
        second.insert("x".to_string(), 50);
        second.insert("y".to_string(), 60);
        let global: &dyn ReportValueSource = &[("contactcount", 2)];

        let data = report
            .format_report(&[&first as &dyn ReportValueSource, &second], Some(global), table)
            .unwrap();
        assert_eq!(data, [1, 1, 0, 100, 200, 1, 1, 50, 60, 2]);

        assert_eq!(
            rdesc.describe_report(&data, table, true).unwrap(),
            "ReportID: 1 / Tip Switch: 1 | # | Contact Id:    0 | X:  100 | Y:  200 \n\
             | Tip Switch: 1 | # | Contact Id:    1 | X:   50 | Y:   60 \n\
             | Contact Count:    2 "
        );
        assert!(!rdesc
            .describe_report(&data, table, false)
            .unwrap()
            .contains('\n'));
    }

    #[test]
    fn center_coordinates() {
        let table = UsageTable::builtin();
        #[rustfmt::skip]
        let rdesc = ReportDescriptor::from_bytes(&[
            0x05, 0x01, 0x09, 0x02, 0xa1, 0x01,
            0x09, 0x30, 0x09, 0x30, 0x09, 0x31, 0x09, 0x31,
            0x15, 0x00, 0x25, 0x7f, 0x75, 0x08, 0x95, 0x04, 0x81, 0x02,
            0xc0,
        ])
        .unwrap();
        let values: &dyn ReportValueSource = &[("x", 1), ("cx", 2), ("y", 3), ("cy", 4)];
        let data = rdesc.format_report(None, &[values], None, table).unwrap();
        assert_eq!(data, [1, 2, 3, 4]);
    }

    #[test]
    fn keyboard_array() {
        let table = UsageTable::builtin();
        #[rustfmt::skip]
        let rdesc = ReportDescriptor::from_bytes(&[
            0x05, 0x07, 0x19, 0x00, 0x29, 0x65, 0x15, 0x00, 0x25, 0x65,
            0x75, 0x08, 0x95, 0x03, 0x81, 0x00,
        ])
        .unwrap();
        assert_eq!(
            rdesc.describe_report(&[0x04, 0x00, 0x70], table, true).unwrap(),
            "Keyboard [Keyboard a and A, 00, ] "
        );
        // arrays are never written
        let values: &dyn ReportValueSource = &[("keyboardaanda", 1)];
        let data = rdesc.format_report(None, &[values], None, table).unwrap();
        assert_eq!(data, [0, 0, 0]);
    }

    #[test]
    fn report_id_mismatch() {
        let table = UsageTable::builtin();
        let rdesc = touchscreen();
        let report = rdesc.input_report(Some(ReportId(1))).unwrap();
        assert_eq!(
            report.describe(&[2; 10], table, true),
            Err(ReportError::ReportIdMismatch {
                expected: ReportId(1),
                actual: 2
            })
        );
        assert_eq!(
            rdesc.describe_report(&[2; 10], table, true),
            Err(ReportError::NoSuchReport(Some(ReportId(2))))
        );
    }
}
