// SPDX-License-Identifier: MIT

//! The HID Usage Tables, i.e. the mapping between usage numbers and
//! their names.
//!
//! Tables are loaded from `.hut` definition files, one file per usage page:
//!
//! ```text
//! (01)	Generic Desktop
//! 00	Undefined
//! 01	Pointer
//! 30	X
//! 3A-3F	Reserved
//! ```
//!
//! The first line is the page number and name, every other line a usage
//! ID and its name, both in hex. Ranges and reserved usages are skipped.
//!
//! [UsageTable::builtin] returns a table covering the common pages. With
//! the `hut` feature enabled, name lookups that are not in the table fall
//! back to the [hut](https://docs.rs/hut) crate.
//!
//! ```
//! # use hidtools::hut::UsageTable;
//! # use hidtools::types::*;
//! let table = UsageTable::builtin();
//! assert_eq!(table.page_name(UsagePage(0x01)).as_deref(), Some("Generic Desktop"));
//! assert_eq!(table.usage_name(Usage::new(0x01, 0x30)).as_deref(), Some("X"));
//! assert_eq!(table.usage_by_name(UsagePage(0x09), "Button 3"), Some(Usage::new(0x09, 3)));
//! ```

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::OnceLock;

use thiserror::Error;
use tracing::{debug, error, warn};

use crate::types::{Usage, UsageId, UsagePage};

pub const GENERIC_DESKTOP_PAGE: u16 = 0x01;
pub const BUTTON_PAGE: u16 = 0x09;
pub const ORDINAL_PAGE: u16 = 0x0a;
pub const DIGITIZER_PAGE: u16 = 0x0d;
pub const SENSOR_PAGE: u16 = 0x20;

#[derive(Error, Debug)]
pub enum HutError {
    #[error("Failed to read usage table: {0}")]
    Io(#[from] std::io::Error),
    #[error("{file}:{line}: {message}")]
    InvalidLine {
        file: String,
        line: usize,
        message: String,
    },
    #[error("{file}: missing usage page header")]
    MissingHeader { file: String },
}

type Result<T> = std::result::Result<T, HutError>;

#[rustfmt::skip]
const BUILTIN: &[(&str, &str)] = &[
    ("01-generic-desktop.hut", include_str!("../data/01-generic-desktop.hut")),
    ("07-keyboard.hut", include_str!("../data/07-keyboard.hut")),
    ("08-leds.hut", include_str!("../data/08-leds.hut")),
    ("09-button.hut", include_str!("../data/09-button.hut")),
    ("0a-ordinals.hut", include_str!("../data/0a-ordinals.hut")),
    ("0c-consumer.hut", include_str!("../data/0c-consumer.hut")),
    ("0d-digitizers.hut", include_str!("../data/0d-digitizers.hut")),
    ("20-sensor.hut", include_str!("../data/20-sensor.hut")),
    ("ff00-vendor.hut", include_str!("../data/ff00-vendor.hut")),
    ("f1d0-fido.hut", include_str!("../data/f1d0-fido.hut")),
];

/// The usages of one usage page.
#[derive(Debug, Clone, Default)]
pub struct UsagePageTable {
    page: UsagePage,
    name: String,
    usages: BTreeMap<u16, String>,
    by_name: HashMap<String, u16>,
}

impl UsagePageTable {
    pub fn new(page: UsagePage, name: &str) -> UsagePageTable {
        UsagePageTable {
            page,
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Parse the contents of one `.hut` file. The `filename` is only
    /// used in error messages.
    pub fn parse(filename: &str, text: &str) -> Result<UsagePageTable> {
        let invalid = |line: usize, message: String| HutError::InvalidLine {
            file: filename.to_string(),
            line,
            message,
        };
        let parse_hex = |line: usize, s: &str| {
            u16::from_str_radix(s.trim(), 16)
                .map_err(|e| invalid(line, format!("invalid number '{s}': {e}")))
        };

        let mut table: Option<UsagePageTable> = None;
        for (idx, line) in text.lines().enumerate() {
            let lineno = idx + 1;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if let Some(header) = line.strip_prefix('(') {
                let (page, name) = header
                    .split_once(')')
                    .ok_or_else(|| invalid(lineno, "unterminated page number".into()))?;
                table = Some(UsagePageTable::new(
                    UsagePage(parse_hex(lineno, page)?),
                    name.trim(),
                ));
                continue;
            }

            let Some(table) = table.as_mut() else {
                return Err(HutError::MissingHeader {
                    file: filename.to_string(),
                });
            };
            let (usage, name) = line
                .split_once(|c: char| c.is_whitespace())
                .ok_or_else(|| invalid(lineno, format!("expected 'usage<TAB>name': '{line}'")))?;
            let name = name.trim();
            if usage.contains('-') {
                if !name.to_lowercase().contains("reserved") {
                    debug!("{filename}:{lineno}: skipping usage range {usage} ({name})");
                }
                continue;
            }
            if name.to_lowercase().contains("reserved") {
                continue;
            }
            table.insert(UsageId(parse_hex(lineno, usage)?), name);
        }

        table.ok_or(HutError::MissingHeader {
            file: filename.to_string(),
        })
    }

    /// Add a usage to this page. If the name is already taken by another
    /// usage, reverse lookups keep returning the first one.
    pub fn insert(&mut self, usage: UsageId, name: &str) {
        self.by_name.entry(name.to_string()).or_insert(usage.0);
        self.usages.insert(usage.0, name.to_string());
    }

    pub fn page(&self) -> UsagePage {
        self.page
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The number of named usages, not counting procedurally named ones.
    pub fn len(&self) -> usize {
        self.usages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.usages.is_empty()
    }

    /// Iterate over all named usages in ascending order
    pub fn iter(&self) -> impl Iterator<Item = (UsageId, &str)> {
        self.usages.iter().map(|(id, name)| (UsageId(*id), name.as_str()))
    }

    /// The name of the usage on this page. The Button and Ordinal pages
    /// name their usages procedurally, `Button 1` and `Instance 1`.
    pub fn usage_name(&self, usage: UsageId) -> Option<Cow<'_, str>> {
        if let Some(name) = self.usages.get(&usage.0) {
            return Some(Cow::Borrowed(name));
        }
        match (self.page.0, usage.0) {
            (_, 0) => None,
            (BUTTON_PAGE, id) => Some(Cow::Owned(format!("Button {id}"))),
            (ORDINAL_PAGE, id) => Some(Cow::Owned(format!("Instance {id}"))),
            _ => None,
        }
    }

    /// The usage with the given name on this page.
    pub fn usage_by_name(&self, name: &str) -> Option<UsageId> {
        if let Some(id) = self.by_name.get(name) {
            return Some(UsageId(*id));
        }
        let number = match self.page.0 {
            BUTTON_PAGE => name.strip_prefix("Button ")?,
            ORDINAL_PAGE => name.strip_prefix("Instance ")?,
            _ => return None,
        };
        match number.parse::<u16>() {
            Ok(id) if id > 0 => Some(UsageId(id)),
            _ => None,
        }
    }
}

/// A set of [UsagePageTable]s, see the module documentation.
#[derive(Debug, Clone, Default)]
pub struct UsageTable {
    pages: BTreeMap<u16, UsagePageTable>,
    by_name: HashMap<String, u16>,
}

impl UsageTable {
    /// An empty table
    pub fn new() -> UsageTable {
        UsageTable::default()
    }

    /// Add a page, replacing any previous page with the same number.
    pub fn insert(&mut self, page: UsagePageTable) {
        self.by_name.insert(page.name.clone(), page.page.0);
        self.pages.insert(page.page.0, page);
    }

    /// Load every `*.hut` file in the given directory.
    pub fn load_dir(path: impl AsRef<Path>) -> Result<UsageTable> {
        let path = path.as_ref();
        let mut files: Vec<_> = std::fs::read_dir(path)?
            .collect::<std::io::Result<Vec<_>>>()?
            .into_iter()
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "hut"))
            .collect();
        files.sort();

        let mut table = UsageTable::new();
        for file in files {
            let text = std::fs::read_to_string(&file)?;
            let page = UsagePageTable::parse(&file.to_string_lossy(), &text)?;
            debug!(
                "Loaded {} usages for page {:#06x} ({}) from {}",
                page.len(),
                page.page.0,
                page.name,
                file.display()
            );
            table.insert(page);
        }
        if table.pages.is_empty() {
            warn!("No usage tables found in {}", path.display());
        }
        Ok(table)
    }

    /// The table built into this crate, parsed once on first use.
    pub fn builtin() -> &'static UsageTable {
        static BUILTIN_TABLE: OnceLock<UsageTable> = OnceLock::new();
        BUILTIN_TABLE.get_or_init(|| {
            let mut table = UsageTable::new();
            for (filename, text) in BUILTIN {
                match UsagePageTable::parse(filename, text) {
                    Ok(page) => table.insert(page),
                    Err(e) => error!("Built-in usage table is broken: {e}"),
                }
            }
            table
        })
    }

    pub fn page(&self, page: UsagePage) -> Option<&UsagePageTable> {
        self.pages.get(&page.0)
    }

    /// Iterate over all pages in ascending order
    pub fn pages(&self) -> impl Iterator<Item = &UsagePageTable> {
        self.pages.values()
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// The name of the usage page, falling back to the `hut` crate if
    /// the page is not in this table.
    pub fn page_name(&self, page: UsagePage) -> Option<Cow<'_, str>> {
        match self.pages.get(&page.0) {
            Some(p) => Some(Cow::Borrowed(p.name())),
            None => fallback::page_name(page).map(Cow::Owned),
        }
    }

    /// The usage page with the given name. Only pages in this table are
    /// found.
    pub fn page_by_name(&self, name: &str) -> Option<UsagePage> {
        self.by_name.get(name).map(|p| UsagePage(*p))
    }

    /// The name of the usage, falling back to the `hut` crate if the
    /// usage is not in this table.
    pub fn usage_name(&self, usage: Usage) -> Option<Cow<'_, str>> {
        self.page(usage.usage_page)
            .and_then(|p| p.usage_name(usage.usage_id))
            .or_else(|| fallback::usage_name(usage).map(Cow::Owned))
    }

    /// The usage with the given name on the given page. Only usages in
    /// this table are found.
    pub fn usage_by_name(&self, page: UsagePage, name: &str) -> Option<Usage> {
        let id = self.page(page)?.usage_by_name(name)?;
        Some(Usage {
            usage_page: page,
            usage_id: id,
        })
    }
}

#[cfg(feature = "hut")]
mod fallback {
    use crate::types::{Usage, UsagePage};

    pub fn page_name(page: UsagePage) -> Option<String> {
        hut::UsagePage::from_usage_page_value(page.0)
            .ok()
            .map(|p| p.name())
    }

    pub fn usage_name(usage: Usage) -> Option<String> {
        hut::Usage::new_from_page_and_id(usage.usage_page.0, usage.usage_id.0)
            .ok()
            .map(|u| u.name())
    }
}

#[cfg(not(feature = "hut"))]
mod fallback {
    use crate::types::{Usage, UsagePage};

    pub fn page_name(_page: UsagePage) -> Option<String> {
        None
    }

    pub fn usage_name(_usage: Usage) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GENERIC_DESKTOP: &str = "(01)\tGeneric Desktop
00\tUndefined
01\tPointer
02\tMouse
03\tReserved
30\tX
3A-3F\tReserved
40\tVx
";

    #[test]
    fn parse_page() {
        let page = UsagePageTable::parse("gd.hut", GENERIC_DESKTOP).unwrap();
        assert_eq!(page.page(), UsagePage(0x01));
        assert_eq!(page.name(), "Generic Desktop");
        assert_eq!(page.len(), 5);
        assert_eq!(page.usage_name(UsageId(0x30)).as_deref(), Some("X"));
        assert_eq!(page.usage_name(UsageId(0x03)), None);
        assert_eq!(page.usage_by_name("Vx"), Some(UsageId(0x40)));
        assert_eq!(page.usage_by_name("Reserved"), None);
        let ids: Vec<u16> = page.iter().map(|(id, _)| id.0).collect();
        assert_eq!(ids, [0x00, 0x01, 0x02, 0x30, 0x40]);
    }

    #[test]
    fn parse_errors() {
        assert!(matches!(
            UsagePageTable::parse("x.hut", "01\tPointer\n"),
            Err(HutError::MissingHeader { .. })
        ));
        assert!(matches!(
            UsagePageTable::parse("x.hut", ""),
            Err(HutError::MissingHeader { .. })
        ));
        match UsagePageTable::parse("x.hut", "(01)\tGeneric Desktop\nzz\tFoo\n") {
            Err(HutError::InvalidLine { file, line, .. }) => {
                assert_eq!(file, "x.hut");
                assert_eq!(line, 2);
            }
            r => panic!("Unexpected result {r:?}"),
        }
    }

    #[test]
    fn procedural_names() {
        let button = UsagePageTable::new(UsagePage(BUTTON_PAGE), "Button");
        assert_eq!(button.usage_name(UsageId(3)).as_deref(), Some("Button 3"));
        assert_eq!(button.usage_name(UsageId(0)), None);
        assert_eq!(button.usage_by_name("Button 17"), Some(UsageId(17)));
        assert_eq!(button.usage_by_name("Button 0"), None);
        assert_eq!(button.usage_by_name("Button x"), None);

        let ordinal = UsagePageTable::new(UsagePage(ORDINAL_PAGE), "Ordinals");
        assert_eq!(ordinal.usage_name(UsageId(2)).as_deref(), Some("Instance 2"));
        assert_eq!(ordinal.usage_by_name("Instance 2"), Some(UsageId(2)));
        assert_eq!(ordinal.usage_by_name("Button 2"), None);
    }

    #[test]
    fn builtin() {
        let table = UsageTable::builtin();
        for (page, name) in [
            (0x01, "Generic Desktop"),
            (0x07, "Keyboard"),
            (0x08, "LEDs"),
            (0x09, "Button"),
            (0x0a, "Ordinals"),
            (0x0c, "Consumer Devices"),
            (0x0d, "Digitizers"),
            (0x20, "Sensor"),
            (0xff00, "Vendor Defined Page 1"),
            (0xf1d0, "FIDO Alliance"),
        ] {
            assert_eq!(table.page_name(UsagePage(page)).as_deref(), Some(name));
            assert_eq!(table.page_by_name(name), Some(UsagePage(page)));
        }
        assert_eq!(table.len(), 10);

        for (usage, name) in [
            (0x0001_0002, "Mouse"),
            (0x0001_0030, "X"),
            (0x0007_0004, "Keyboard a and A"),
            (0x0009_0001, "Button 1"),
            (0x000c_00e9, "Volume Increment"),
            (0x000d_0042, "Tip Switch"),
            (0x000d_0051, "Contact Id"),
        ] {
            let usage = Usage::from(usage as u32);
            assert_eq!(table.usage_name(usage).as_deref(), Some(name));
            assert_eq!(table.usage_by_name(usage.usage_page, name), Some(usage));
        }
        // names are scoped to their page
        assert_eq!(table.usage_by_name(UsagePage(0x0d), "X"), None);
    }

    #[cfg(feature = "hut")]
    #[test]
    fn hut_fallback() {
        let table = UsageTable::new();
        assert!(table.page_name(UsagePage(0x01)).is_some());
        assert!(table.usage_name(Usage::new(0x01, 0x30)).is_some());
        // forward only
        assert_eq!(table.page_by_name("Generic Desktop"), None);
    }
}
