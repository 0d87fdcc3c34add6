//! Tunable effect parameters.
//!
//! Each parameter stores its current value in a single atomic word so the
//! configuration surface can write while the scheduler thread reads, without
//! locking. A tick observes either the old or the new value.
//!
//! Assignments never fail. Out-of-range numbers are clamped, foreign values
//! for a color become white, foreign values for a range fall back to the
//! default, and anything else that does not fit is rejected.

mod set;
mod value;

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use serde_json::Value;
pub use set::{
    BoolParam, ChoiceParam, ColorParam, ParameterSet, ParameterSetBuilder, RangeParam,
};
pub use value::{ParameterKind, ParameterValue, format_hex_color, parse_hex_color};

use crate::color::{Rgb, WHITE, rgb_from_u32, rgb_to_u32};

/// Declared shape of a parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterSpec {
    Color {
        default: Rgb,
    },
    Range {
        min: f64,
        max: f64,
        default: f64,
    },
    Choice {
        options: &'static [&'static str],
        default: usize,
    },
    Bool {
        default: bool,
    },
}

/// Outcome of an assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assignment {
    /// Stored as given
    Applied,
    /// Stored after clamping into range
    Clamped,
    /// The value did not fit and a substitute was stored
    Substituted,
    /// The value did not fit and the parameter kept its previous value
    Rejected,
}

/// A named, atomically updated parameter.
#[derive(Debug)]
pub struct Parameter {
    name: &'static str,
    display_name: &'static str,
    spec: ParameterSpec,
    value: AtomicU64,
}

impl Parameter {
    pub(crate) fn new(name: &'static str, display_name: &'static str, spec: ParameterSpec) -> Self {
        let initial = encode_default(&spec);
        Self {
            name,
            display_name,
            spec,
            value: AtomicU64::new(initial),
        }
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }

    pub const fn display_name(&self) -> &'static str {
        self.display_name
    }

    pub const fn spec(&self) -> &ParameterSpec {
        &self.spec
    }

    pub const fn kind(&self) -> ParameterKind {
        match self.spec {
            ParameterSpec::Color { .. } => ParameterKind::Color,
            ParameterSpec::Range { .. } => ParameterKind::Range,
            ParameterSpec::Choice { .. } => ParameterKind::Choice,
            ParameterSpec::Bool { .. } => ParameterKind::Bool,
        }
    }

    /// Current value
    pub fn value(&self) -> ParameterValue {
        self.decode(self.raw())
    }

    pub fn default_value(&self) -> ParameterValue {
        self.decode(encode_default(&self.spec))
    }

    /// Assign a new value following the kind rules of this parameter
    pub fn assign(&self, value: &ParameterValue) -> Assignment {
        match (&self.spec, value) {
            (ParameterSpec::Color { .. }, ParameterValue::Color(color)) => {
                self.store(u64::from(rgb_to_u32(*color)));
                Assignment::Applied
            }
            (ParameterSpec::Color { .. }, _) => {
                self.store(u64::from(rgb_to_u32(WHITE)));
                Assignment::Substituted
            }
            (ParameterSpec::Range { min, max, default }, ParameterValue::Range(number)) => {
                if !number.is_finite() {
                    self.store(default.to_bits());
                    return Assignment::Substituted;
                }
                self.store(number.clamp(*min, *max).to_bits());
                if (*min..=*max).contains(number) {
                    Assignment::Applied
                } else {
                    Assignment::Clamped
                }
            }
            (ParameterSpec::Range { default, .. }, _) => {
                self.store(default.to_bits());
                Assignment::Substituted
            }
            (ParameterSpec::Choice { options, .. }, ParameterValue::Choice(label)) => {
                match options.iter().position(|option| *option == label.as_str()) {
                    Some(index) => {
                        self.store(index as u64);
                        Assignment::Applied
                    }
                    None => Assignment::Rejected,
                }
            }
            (ParameterSpec::Bool { .. }, ParameterValue::Bool(flag)) => {
                self.store(u64::from(*flag));
                Assignment::Applied
            }
            (ParameterSpec::Choice { .. } | ParameterSpec::Bool { .. }, _) => Assignment::Rejected,
        }
    }

    /// Assign from loosely typed JSON
    pub fn assign_json(&self, value: &Value) -> Assignment {
        match ParameterValue::from_json(self.kind(), value) {
            Some(value) => self.assign(&value),
            None => self.assign_foreign(),
        }
    }

    pub fn reset(&self) {
        self.store(encode_default(&self.spec));
    }

    /// Serializable snapshot for configuration surfaces
    pub fn info(&self) -> ParameterInfo {
        let (min, max, options) = match &self.spec {
            ParameterSpec::Range { min, max, .. } => (Some(*min), Some(*max), Vec::new()),
            ParameterSpec::Choice { options, .. } => (None, None, options.to_vec()),
            ParameterSpec::Color { .. } | ParameterSpec::Bool { .. } => (None, None, Vec::new()),
        };
        ParameterInfo {
            name: self.name,
            display_name: self.display_name,
            kind: self.kind(),
            value: self.value(),
            default: self.default_value(),
            min,
            max,
            options,
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    pub(crate) fn color_value(&self) -> Rgb {
        rgb_from_u32(self.raw() as u32)
    }

    pub(crate) fn range_value(&self) -> f64 {
        f64::from_bits(self.raw())
    }

    #[allow(clippy::cast_possible_truncation)]
    pub(crate) fn choice_index(&self) -> usize {
        self.raw() as usize
    }

    pub(crate) fn choice_label(&self) -> &'static str {
        match &self.spec {
            ParameterSpec::Choice { options, default } => options
                .get(self.choice_index())
                .or_else(|| options.get(*default))
                .copied()
                .unwrap_or(""),
            _ => "",
        }
    }

    pub(crate) fn flag_value(&self) -> bool {
        self.raw() != 0
    }

    fn assign_foreign(&self) -> Assignment {
        match &self.spec {
            ParameterSpec::Color { .. } => {
                self.store(u64::from(rgb_to_u32(WHITE)));
                Assignment::Substituted
            }
            ParameterSpec::Range { default, .. } => {
                self.store(default.to_bits());
                Assignment::Substituted
            }
            ParameterSpec::Choice { .. } | ParameterSpec::Bool { .. } => Assignment::Rejected,
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn decode(&self, raw: u64) -> ParameterValue {
        match &self.spec {
            ParameterSpec::Color { .. } => ParameterValue::Color(rgb_from_u32(raw as u32)),
            ParameterSpec::Range { .. } => ParameterValue::Range(f64::from_bits(raw)),
            ParameterSpec::Choice { options, .. } => {
                ParameterValue::Choice(options.get(raw as usize).copied().unwrap_or("").to_owned())
            }
            ParameterSpec::Bool { .. } => ParameterValue::Bool(raw != 0),
        }
    }

    #[inline]
    fn raw(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }

    #[inline]
    fn store(&self, raw: u64) {
        self.value.store(raw, Ordering::Relaxed);
    }
}

fn encode_default(spec: &ParameterSpec) -> u64 {
    match spec {
        ParameterSpec::Color { default } => u64::from(rgb_to_u32(*default)),
        ParameterSpec::Range { default, .. } => default.to_bits(),
        ParameterSpec::Choice { default, .. } => *default as u64,
        ParameterSpec::Bool { default } => u64::from(*default),
    }
}

/// Parameter metadata and current value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterInfo {
    pub name: &'static str,
    pub display_name: &'static str,
    pub kind: ParameterKind,
    pub value: ParameterValue,
    pub default: ParameterValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<&'static str>,
}
