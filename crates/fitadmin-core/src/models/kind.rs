//! Content kinds and meal types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The two peer content collections managed by the console
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Exercise,
    Meal,
}

impl ContentKind {
    pub const ALL: [Self; 2] = [Self::Exercise, Self::Meal];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Exercise => "exercise",
            Self::Meal => "meal",
        }
    }

    /// Human-readable label used in notifications
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Exercise => "exercise block",
            Self::Meal => "meal",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentKind {
    type Err = String;

    /// Accepts the canonical names and the legacy console slugs.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exercise" | "exercises" | "mashqlar" => Ok(Self::Exercise),
            "meal" | "meals" | "taomnnoma" | "taomnoma" => Ok(Self::Meal),
            other => Err(format!("unknown content kind '{other}'")),
        }
    }
}

/// When a meal is meant to be served
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    #[default]
    Breakfast,
    Lunch,
    Snack,
    Dinner,
}

impl MealType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Breakfast => "breakfast",
            Self::Lunch => "lunch",
            Self::Snack => "snack",
            Self::Dinner => "dinner",
        }
    }
}

impl fmt::Display for MealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
