//! Claim form value tree

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Checkbox choices offered for `damagedParts`
pub const DAMAGED_PART_OPTIONS: [&str; 4] = ["roof", "front", "side", "rear"];

/// Witness array bounds
pub const MIN_WITNESSES: usize = 1;
pub const MAX_WITNESSES: usize = 5;

/// A single witness entry in the dynamic field array
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Witness {
    /// Stable identity of the entry, independent of its position
    #[serde(skip, default = "Uuid::new_v4")]
    pub key: Uuid,
    pub name: String,
    pub email: String,
}

impl Witness {
    pub fn new(name: &str, email: &str) -> Self {
        Self {
            key: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
        }
    }
}

impl Default for Witness {
    fn default() -> Self {
        Self::new("", "")
    }
}

impl PartialEq for Witness {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.email == other.email
    }
}

/// The whole form value tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormValue {
    pub amount: Option<f64>,
    pub allocation: Option<f64>,
    pub damaged_parts: Vec<String>,
    pub category: String,
    pub witnesses: Vec<Witness>,
}

impl FormValue {
    /// Values the form is seeded with at mount
    pub fn initial() -> Self {
        Self {
            amount: Some(250.0),
            allocation: Some(140.0),
            damaged_parts: vec!["side".to_string(), "rear".to_string()],
            category: "kitchen-accessories".to_string(),
            witnesses: vec![
                Witness::new("Marek", "marek@email.cz"),
                Witness::new("Emily", "emily.johnson@x.dummyjson.com"),
            ],
        }
    }

    /// Whether `amount` is set to a non-zero number
    pub fn has_amount(&self) -> bool {
        is_truthy(self.amount)
    }

    /// Position of the witness with the given key
    pub fn witness_index(&self, key: Uuid) -> Option<usize> {
        self.witnesses.iter().position(|w| w.key == key)
    }

    /// Set `damagedParts`, dropping duplicate choices but keeping first-seen order
    pub fn set_damaged_parts(&mut self, parts: Vec<String>) {
        let mut unique: Vec<String> = Vec::with_capacity(parts.len());
        for part in parts {
            if !unique.contains(&part) {
                unique.push(part);
            }
        }
        self.damaged_parts = unique;
    }
}

impl Default for FormValue {
    fn default() -> Self {
        Self::initial()
    }
}

/// Truthiness of an optional number: absent, zero and NaN are all falsy
pub fn is_truthy(value: Option<f64>) -> bool {
    matches!(value, Some(v) if v != 0.0 && !v.is_nan())
}

/// A selectable category, mapped from the remote catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryOption {
    pub value: String,
    pub label: String,
}
