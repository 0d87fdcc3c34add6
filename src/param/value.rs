use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::color::{Rgb, rgb_from_u32, rgb_to_u32};

/// Kind of a tunable parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterKind {
    Color,
    Range,
    Choice,
    Bool,
}

/// Parameter value as exchanged with configuration surfaces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ParameterValue {
    Color(#[serde(with = "hex_color")] Rgb),
    Range(f64),
    Choice(String),
    Bool(bool),
}

impl ParameterValue {
    pub const fn kind(&self) -> ParameterKind {
        match self {
            Self::Color(_) => ParameterKind::Color,
            Self::Range(_) => ParameterKind::Range,
            Self::Choice(_) => ParameterKind::Choice,
            Self::Bool(_) => ParameterKind::Bool,
        }
    }

    /// Interpret a loosely typed JSON value as a value of `kind`.
    ///
    /// Colors accept `"#RRGGBB"` strings and `[r, g, b]` arrays. Returns
    /// `None` when the JSON value does not fit the requested kind.
    pub fn from_json(kind: ParameterKind, value: &Value) -> Option<Self> {
        match (kind, value) {
            (ParameterKind::Color, Value::String(text)) => parse_hex_color(text).map(Self::Color),
            (ParameterKind::Color, Value::Array(channels)) => {
                color_from_channels(channels).map(Self::Color)
            }
            (ParameterKind::Range, Value::Number(number)) => number.as_f64().map(Self::Range),
            (ParameterKind::Choice, Value::String(text)) => Some(Self::Choice(text.clone())),
            (ParameterKind::Bool, Value::Bool(flag)) => Some(Self::Bool(*flag)),
            _ => None,
        }
    }
}

/// Parse `#RRGGBB` (the leading `#` is optional).
pub fn parse_hex_color(text: &str) -> Option<Rgb> {
    let hex = text.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(hex, 16).ok().map(rgb_from_u32)
}

/// Format a color as `#RRGGBB`.
pub fn format_hex_color(color: Rgb) -> String {
    format!("#{:06X}", rgb_to_u32(color))
}

fn color_from_channels(channels: &[Value]) -> Option<Rgb> {
    let [r, g, b] = channels else {
        return None;
    };
    let channel = |value: &Value| value.as_u64().and_then(|v| u8::try_from(v).ok());
    Some(Rgb {
        r: channel(r)?,
        g: channel(g)?,
        b: channel(b)?,
    })
}

mod hex_color {
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    use super::{format_hex_color, parse_hex_color};
    use crate::color::Rgb;

    pub(super) fn serialize<S: Serializer>(color: &Rgb, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_hex_color(*color))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Rgb, D::Error> {
        let text = String::deserialize(deserializer)?;
        parse_hex_color(&text).ok_or_else(|| D::Error::custom(format!("invalid color `{text}`")))
    }
}
