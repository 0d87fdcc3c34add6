//! Data handed to configuration surfaces.

use heapless::Vec as BoundedVec;
use serde::Serialize;

use crate::{color::Rgb, param::ParameterInfo};

/// Capacity of [`RecentColors`].
pub const RECENT_COLORS: usize = 8;

/// Serializable summary of a registered effect.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EffectInfo {
    pub name: String,
    pub description: String,
    pub active: bool,
    pub parameters: Vec<ParameterInfo>,
}

/// Most recently picked colors, newest first, without duplicates.
///
/// Owned by whichever surface shows a color picker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecentColors {
    colors: BoundedVec<Rgb, RECENT_COLORS>,
}

impl RecentColors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move `color` to the front, evicting the oldest entry when full
    pub fn push(&mut self, color: Rgb) {
        if let Some(index) = self.colors.iter().position(|c| *c == color) {
            self.colors.remove(index);
        } else if self.colors.is_full() {
            self.colors.pop();
        }
        let _ = self.colors.insert(0, color);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rgb> {
        self.colors.iter()
    }

    pub fn as_slice(&self) -> &[Rgb] {
        &self.colors
    }

    pub fn clear(&mut self) {
        self.colors.clear();
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}
