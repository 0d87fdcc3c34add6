//! Scan code to LED grid position mapping.
//!
//! Scan codes are HID keyboard usage ids; vendor keys (the Fn key and the
//! analog profile keys) live in the `0x400` range. The standard layout is a
//! 6 x 17 tenkeyless envelope; keys without a physical LED cell are simply
//! absent from the map.

use std::sync::{Arc, OnceLock};

use crate::{
    error::{Error, Result},
    grid::GridSize,
};

/// Grid cell of a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct KeyPosition {
    pub row: u8,
    pub col: u8,
}

impl KeyPosition {
    pub const fn new(row: u8, col: u8) -> Self {
        Self { row, col }
    }

    pub const fn row(self) -> usize {
        self.row as usize
    }

    pub const fn col(self) -> usize {
        self.col as usize
    }

    /// Check whether the position fits in a grid of the given size
    pub const fn fits(self, size: GridSize) -> bool {
        size.contains(self.row(), self.col())
    }
}

/// One row of a layout table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEntry {
    pub code: u16,
    pub position: KeyPosition,
    pub label: &'static str,
}

const fn key(code: u16, row: u8, col: u8, label: &'static str) -> KeyEntry {
    KeyEntry {
        code,
        position: KeyPosition::new(row, col),
        label,
    }
}

/// Rows of the standard layout.
pub const STANDARD_ROWS: usize = 6;
/// Columns of the standard layout.
pub const STANDARD_COLS: usize = 17;

/// Vendor scan code of the Fn key.
pub const FN_KEY: u16 = 0x409;

/// Standard tenkeyless layout.
pub const STANDARD_LAYOUT: &[KeyEntry] = &[
    // Function row
    key(41, 0, 0, "Esc"),
    key(58, 0, 2, "F1"),
    key(59, 0, 3, "F2"),
    key(60, 0, 4, "F3"),
    key(61, 0, 5, "F4"),
    key(62, 0, 6, "F5"),
    key(63, 0, 7, "F6"),
    key(64, 0, 8, "F7"),
    key(65, 0, 9, "F8"),
    key(66, 0, 10, "F9"),
    key(67, 0, 11, "F10"),
    key(68, 0, 12, "F11"),
    key(69, 0, 13, "F12"),
    key(70, 0, 14, "PrtSc"),
    key(71, 0, 15, "ScrLk"),
    key(72, 0, 16, "Pause"),
    // Number row
    key(53, 1, 0, "`"),
    key(30, 1, 1, "1"),
    key(31, 1, 2, "2"),
    key(32, 1, 3, "3"),
    key(33, 1, 4, "4"),
    key(34, 1, 5, "5"),
    key(35, 1, 6, "6"),
    key(36, 1, 7, "7"),
    key(37, 1, 8, "8"),
    key(38, 1, 9, "9"),
    key(39, 1, 10, "0"),
    key(45, 1, 11, "-"),
    key(46, 1, 12, "="),
    key(42, 1, 13, "Backspace"),
    key(73, 1, 14, "Insert"),
    key(74, 1, 15, "Home"),
    key(75, 1, 16, "PgUp"),
    // Top letter row
    key(43, 2, 0, "Tab"),
    key(20, 2, 1, "Q"),
    key(26, 2, 2, "W"),
    key(8, 2, 3, "E"),
    key(21, 2, 4, "R"),
    key(23, 2, 5, "T"),
    key(28, 2, 6, "Y"),
    key(24, 2, 7, "U"),
    key(12, 2, 8, "I"),
    key(18, 2, 9, "O"),
    key(19, 2, 10, "P"),
    key(47, 2, 11, "["),
    key(48, 2, 12, "]"),
    key(49, 2, 13, "\\"),
    key(76, 2, 14, "Delete"),
    key(77, 2, 15, "End"),
    key(78, 2, 16, "PgDn"),
    // Home row
    key(57, 3, 0, "Caps"),
    key(4, 3, 1, "A"),
    key(22, 3, 2, "S"),
    key(7, 3, 3, "D"),
    key(9, 3, 4, "F"),
    key(10, 3, 5, "G"),
    key(11, 3, 6, "H"),
    key(13, 3, 7, "J"),
    key(14, 3, 8, "K"),
    key(15, 3, 9, "L"),
    key(51, 3, 10, ";"),
    key(52, 3, 11, "'"),
    key(40, 3, 12, "Enter"),
    // Bottom letter row
    key(225, 4, 0, "LShift"),
    key(29, 4, 1, "Z"),
    key(27, 4, 2, "X"),
    key(6, 4, 3, "C"),
    key(25, 4, 4, "V"),
    key(5, 4, 5, "B"),
    key(17, 4, 6, "N"),
    key(16, 4, 7, "M"),
    key(54, 4, 8, ","),
    key(55, 4, 9, "."),
    key(56, 4, 10, "/"),
    key(229, 4, 11, "RShift"),
    key(82, 4, 14, "Up"),
    // Modifier row
    key(224, 5, 0, "LCtrl"),
    key(227, 5, 1, "LGui"),
    key(226, 5, 2, "LAlt"),
    key(44, 5, 5, "Space"),
    key(230, 5, 9, "RAlt"),
    key(FN_KEY, 5, 10, "Fn"),
    key(101, 5, 11, "Menu"),
    key(228, 5, 12, "RCtrl"),
    key(80, 5, 13, "Left"),
    key(81, 5, 14, "Down"),
    key(79, 5, 15, "Right"),
];

/// Immutable scan code lookup table.
#[derive(Debug, Clone)]
pub struct KeyMap {
    /// Sorted by scan code
    entries: Vec<KeyEntry>,
}

impl KeyMap {
    /// Build a map from a layout table.
    ///
    /// Fails when a scan code or a grid position appears twice.
    pub fn from_layout(layout: &[KeyEntry]) -> Result<Self> {
        let mut entries = layout.to_vec();
        entries.sort_by_key(|entry| entry.code);
        if let Some(pair) = entries.windows(2).find(|pair| pair[0].code == pair[1].code) {
            return Err(Error::DuplicateScanCode(pair[0].code));
        }

        let mut positions: Vec<KeyPosition> = entries.iter().map(|e| e.position).collect();
        positions.sort_unstable();
        if let Some(pair) = positions.windows(2).find(|pair| pair[0] == pair[1]) {
            return Err(Error::DuplicatePosition {
                row: pair[0].row,
                col: pair[0].col,
            });
        }

        Ok(Self { entries })
    }

    /// The shared standard layout map, built on first use.
    pub fn standard() -> Arc<Self> {
        static STANDARD: OnceLock<Arc<KeyMap>> = OnceLock::new();
        Arc::clone(STANDARD.get_or_init(|| {
            let entries = {
                let mut entries = STANDARD_LAYOUT.to_vec();
                entries.sort_by_key(|entry| entry.code);
                entries
            };
            Arc::new(Self { entries })
        }))
    }

    /// Position of a scan code, `None` when the key has no LED cell
    pub fn lookup(&self, code: u16) -> Option<KeyPosition> {
        self.entry(code).map(|entry| entry.position)
    }

    pub fn entry(&self, code: u16) -> Option<&KeyEntry> {
        self.entries
            .binary_search_by_key(&code, |entry| entry.code)
            .ok()
            .map(|index| &self.entries[index])
    }

    /// Scan code assigned to a grid cell
    pub fn code_at(&self, position: KeyPosition) -> Option<u16> {
        self.entries
            .iter()
            .find(|entry| entry.position == position)
            .map(|entry| entry.code)
    }

    pub fn entries(&self) -> &[KeyEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
