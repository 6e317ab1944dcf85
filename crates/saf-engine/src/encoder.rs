//! Categorical encoding for tier, cabin and route
//!
//! Codes are assigned by sorting each vocabulary lexicographically, which is
//! the same rule the training-time label encoder applies. The declared lists
//! below are the training lists; their order does not matter, their contents
//! do.

use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Loyalty tiers known to the classifier
pub const TIERS: [&str; 3] = ["Gold", "Silver", "None"];

/// Cabins known to the classifier
pub const CABINS: [&str; 2] = ["Business", "Economy"];

/// Routes known to the classifier
pub const ROUTES: [&str; 5] = ["HKG-LHR", "HKG-SIN", "HKG-JFK", "HKG-SYD", "HKG-BKK"];

/// Categorical input columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Tier,
    Cabin,
    Route,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Tier, Category::Cabin, Category::Route];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Tier => "tier",
            Category::Cabin => "cabin",
            Category::Route => "route",
        }
    }

    /// Training-time vocabulary for this column
    pub fn declared_values(&self) -> &'static [&'static str] {
        match self {
            Category::Tier => &TIERS,
            Category::Cabin => &CABINS,
            Category::Route => &ROUTES,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Label encoder for a single categorical column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelEncoder {
    category: Category,
    classes: Vec<String>,
}

impl LabelEncoder {
    /// Fit an encoder on the given values (sorted, deduplicated)
    pub fn fit<I, S>(category: Category, values: I) -> Result<Self, EngineError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut classes: Vec<String> = values.into_iter().map(Into::into).collect();
        classes.sort();
        classes.dedup();

        if classes.is_empty() || classes.iter().any(|c| c.trim().is_empty()) {
            return Err(EngineError::MalformedVocabulary {
                category: category.to_string(),
            });
        }

        Ok(Self { category, classes })
    }

    /// Fitted classes in code order
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn encode(&self, value: &str) -> Result<u32, EngineError> {
        self.classes
            .binary_search_by(|c| c.as_str().cmp(value))
            .map(|idx| idx as u32)
            .map_err(|_| EngineError::UnknownCategoryValue {
                category: self.category.to_string(),
                value: value.to_string(),
            })
    }

    pub fn decode(&self, code: u32) -> Option<&str> {
        self.classes.get(code as usize).map(String::as_str)
    }
}

/// Encoders for all three categorical columns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabularies {
    tier: LabelEncoder,
    cabin: LabelEncoder,
    route: LabelEncoder,
}

impl Vocabularies {
    /// Build encoders from the training-time vocabularies
    pub fn fitted() -> Result<Self, EngineError> {
        Ok(Self {
            tier: LabelEncoder::fit(Category::Tier, TIERS)?,
            cabin: LabelEncoder::fit(Category::Cabin, CABINS)?,
            route: LabelEncoder::fit(Category::Route, ROUTES)?,
        })
    }

    pub fn encoder(&self, category: Category) -> &LabelEncoder {
        match category {
            Category::Tier => &self.tier,
            Category::Cabin => &self.cabin,
            Category::Route => &self.route,
        }
    }

    pub fn encode(&self, category: Category, value: &str) -> Result<u32, EngineError> {
        self.encoder(category).encode(value)
    }
}
