//! Backend wire shapes and the pure UI <-> wire mappings.
//!
//! Field names here are a compatibility boundary with the backend. The
//! mapping functions are total and side-effect free.

mod exercise;
mod meal;

use serde::{Deserialize, Deserializer, Serialize};

pub use exercise::{
    exercise_block_from_wire, exercise_block_to_wire, exercise_step_from_wire,
    exercise_step_to_wire, ExerciseBlockWire, ExerciseStepWire,
};
pub use meal::{
    meal_from_wire, meal_step_from_wire, meal_step_to_wire, meal_to_wire, MealStepWire, MealWire,
};

/// Entity id as sent by the backend: integer or string in, string out
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ScalarRepr", into = "String")]
pub struct WireId(String);

impl WireId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<WireId> for String {
    fn from(value: WireId) -> Self {
        value.0
    }
}

impl From<ScalarRepr> for WireId {
    fn from(value: ScalarRepr) -> Self {
        Self(value.into_text())
    }
}

/// A number the backend expects as a string; numbers are accepted in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ScalarRepr", into = "String")]
pub struct WireNumber(String);

impl WireNumber {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            Self::default()
        } else {
            Self(trimmed.to_string())
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whole-number reading, `0` when the text is not numeric
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn to_u32(&self) -> u32 {
        self.0.parse::<u32>().unwrap_or_else(|_| {
            self.0
                .parse::<f64>()
                .ok()
                .filter(|value| value.is_finite())
                .map_or(0, |value| value.max(0.0).round() as u32)
        })
    }
}

impl Default for WireNumber {
    fn default() -> Self {
        Self("0".to_string())
    }
}

impl From<WireNumber> for String {
    fn from(value: WireNumber) -> Self {
        value.0
    }
}

impl From<ScalarRepr> for WireNumber {
    fn from(value: ScalarRepr) -> Self {
        Self::new(value.into_text())
    }
}

/// A count the backend sends as a number, occasionally as numeric text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ScalarRepr", into = "u32")]
pub struct WireCount(u32);

impl WireCount {
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl From<WireCount> for u32 {
    fn from(value: WireCount) -> Self {
        value.0
    }
}

impl From<ScalarRepr> for WireCount {
    fn from(value: ScalarRepr) -> Self {
        Self(WireNumber::from(value).to_u32())
    }
}

/// Any JSON scalar the backend may use for an id or a number
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ScalarRepr {
    Int(i64),
    Float(f64),
    Text(String),
}

impl ScalarRepr {
    fn into_text(self) -> String {
        match self {
            Self::Int(value) => value.to_string(),
            Self::Float(value) => value.to_string(),
            Self::Text(value) => value,
        }
    }
}

/// `null` and missing both read as an empty string
fn nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Empty or whitespace-only optional text means "none"
fn non_empty(value: Option<String>) -> Option<String> {
    crate::util::normalize_text_option(value)
}

fn wire_id(id: Option<&str>) -> Option<WireId> {
    id.map(WireId::new)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_id_accepts_integers_and_strings() {
        let from_int: WireId = serde_json::from_str("17").unwrap();
        let from_text: WireId = serde_json::from_str("\"a1\"").unwrap();
        assert_eq!(from_int.as_str(), "17");
        assert_eq!(from_text.as_str(), "a1");
        assert_eq!(serde_json::to_string(&from_int).unwrap(), "\"17\"");
    }

    #[test]
    fn wire_number_normalizes_to_string() {
        let from_int: WireNumber = serde_json::from_str("1800").unwrap();
        let from_float: WireNumber = serde_json::from_str("2.5").unwrap();
        let from_blank: WireNumber = serde_json::from_str("\"  \"").unwrap();
        assert_eq!(from_int.as_str(), "1800");
        assert_eq!(from_float.as_str(), "2.5");
        assert_eq!(from_blank.as_str(), "0");
        assert_eq!(serde_json::to_string(&from_int).unwrap(), "\"1800\"");
    }

    #[test]
    fn wire_count_reads_numeric_text() {
        let count: WireCount = serde_json::from_str("\"30\"").unwrap();
        assert_eq!(count.get(), 30);
        let rounded: WireCount = serde_json::from_str("12.6").unwrap();
        assert_eq!(rounded.get(), 13);
        let garbage: WireCount = serde_json::from_str("\"soon\"").unwrap();
        assert_eq!(garbage.get(), 0);
        assert_eq!(serde_json::to_string(&WireCount::new(5)).unwrap(), "5");
    }
}
