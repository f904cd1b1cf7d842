//! Tagged parameter-value variant parsed at the JSON boundary (§9).
//!
//! `set_device_parameter`'s `value` field can arrive as a plain number,
//! a percentage string, a dB string, the literals `"min"`/`"max"`, a
//! bare numeric string, or a quantized label. Parsing that union here
//! keeps `mcpbridge-core`'s normalization function a total function
//! over `ParamValue` instead of re-sniffing `serde_json::Value` itself.

use serde_json::Value;

/// A `set_device_parameter` value after boundary parsing, before
/// normalization against a specific parameter's range.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// A JSON number, passed through as-is.
    Number(f64),
    /// A string ending in `%`, e.g. `"50%"`.
    Percent(f64),
    /// A string ending in `dB` (case-insensitive), e.g. `"-6dB"`.
    Decibels(f64),
    /// The literal `"min"`.
    Min,
    /// The literal `"max"`.
    Max,
    /// A bare numeric string, e.g. `"0.5"`.
    BareNumeric(f64),
    /// Anything else: matched against a quantized parameter's
    /// `value_items` during normalization.
    Label(String),
}

impl ParamValue {
    /// Parse a JSON value into the tagged variant. Returns `None` for
    /// JSON shapes that can never denote a parameter value (`null`,
    /// `bool`, arrays, objects) — callers surface that as `BadValue`.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_f64().map(ParamValue::Number),
            Value::String(s) => Some(Self::from_str(s)),
            _ => None,
        }
    }

    fn from_str(s: &str) -> Self {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("min") {
            return ParamValue::Min;
        }
        if trimmed.eq_ignore_ascii_case("max") {
            return ParamValue::Max;
        }
        if let Some(prefix) = trimmed.strip_suffix('%') {
            if let Ok(n) = prefix.trim().parse::<f64>() {
                return ParamValue::Percent(n);
            }
        }
        if trimmed.len() > 2 && trimmed[trimmed.len() - 2..].eq_ignore_ascii_case("db") {
            let prefix = &trimmed[..trimmed.len() - 2];
            if let Ok(n) = prefix.trim().parse::<f64>() {
                return ParamValue::Decibels(n);
            }
        }
        if let Ok(n) = trimmed.parse::<f64>() {
            return ParamValue::BareNumeric(n);
        }
        ParamValue::Label(trimmed.to_string())
    }
}
