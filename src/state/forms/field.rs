//! Form field value objects

use super::FormError;
use crate::state::field_path::{FieldPath, Segment};

/// Raw input handed to `set_field`
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Text typed into an input or picked from a select
    Text(String),
    /// Checked boxes of a multi-checkbox group
    Choices(Vec<String>),
}

impl FieldValue {
    pub fn choices(items: &[&str]) -> Self {
        FieldValue::Choices(items.iter().map(|s| s.to_string()).collect())
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(value: Vec<String>) -> Self {
        FieldValue::Choices(value)
    }
}

/// A declared, writable leaf of the form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Amount,
    Allocation,
    DamagedParts,
    Category,
    WitnessName(usize),
    WitnessEmail(usize),
}

impl FormField {
    /// Map a path onto a declared leaf. Witness indices are not range-checked.
    pub fn resolve(path: &FieldPath) -> Option<Self> {
        match path.segments() {
            [Segment::Key(k)] => match k.as_str() {
                "amount" => Some(Self::Amount),
                "allocation" => Some(Self::Allocation),
                "damagedParts" => Some(Self::DamagedParts),
                "category" => Some(Self::Category),
                _ => None,
            },
            [Segment::Key(root), Segment::Index(i), Segment::Key(leaf)] if root == "witnesses" => {
                match leaf.as_str() {
                    "name" => Some(Self::WitnessName(*i)),
                    "email" => Some(Self::WitnessEmail(*i)),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    pub fn path(&self) -> FieldPath {
        match self {
            Self::Amount => FieldPath::root("amount"),
            Self::Allocation => FieldPath::root("allocation"),
            Self::DamagedParts => FieldPath::root("damagedParts"),
            Self::Category => FieldPath::root("category"),
            Self::WitnessName(i) => FieldPath::root("witnesses").index(*i).key("name"),
            Self::WitnessEmail(i) => FieldPath::root("witnesses").index(*i).key("email"),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Amount => "Amount",
            Self::Allocation => "Allocation",
            Self::DamagedParts => "Damaged Parts",
            Self::Category => "Category",
            Self::WitnessName(_) => "Name",
            Self::WitnessEmail(_) => "Email",
        }
    }

    pub fn witness_index(&self) -> Option<usize> {
        match self {
            Self::WitnessName(i) | Self::WitnessEmail(i) => Some(*i),
            _ => None,
        }
    }

    /// Description of the input kind this field accepts
    pub fn expected_input(&self) -> &'static str {
        match self {
            Self::Amount | Self::Allocation => "a number",
            Self::DamagedParts => "a list of choices",
            _ => "text",
        }
    }
}

/// Numeric input coercion: blank means absent, never zero
pub fn parse_number(path: &FieldPath, input: &str) -> Result<Option<f64>, FormError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    match trimmed.parse::<f64>() {
        Ok(n) if n.is_finite() => Ok(Some(n)),
        _ => Err(FormError::NotANumber {
            path: path.to_string(),
            input: input.to_string(),
        }),
    }
}
