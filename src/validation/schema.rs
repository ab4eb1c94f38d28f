//! Declarative field → rule-list schema and its evaluator

use super::email_check::VerdictLookup;
use super::error_map::ErrorMap;
use super::rules::{Rule, RuleContext};
use crate::state::{FieldPath, FormValue, DAMAGED_PART_OPTIONS, MAX_WITNESSES, MIN_WITNESSES};
use serde_json::Value;

pub const AMOUNT_MIN: &str = "Minimum value is 0";
pub const AMOUNT_MAX: &str = "Maximum value is 300";
pub const PARTS_REQUIRED: &str = "Select at least one damaged part";
pub const PART_UNKNOWN: &str = "Must be one of: roof, front, side, rear";
pub const ALLOCATION_REQUIRED: &str = "Allocation is required";
pub const ALLOCATION_MAX: &str = "Maximum value is {bound}";
pub const CATEGORY_REQUIRED: &str = "Category is required";
pub const WITNESSES_MIN: &str = "At least one witness is required";
pub const WITNESSES_MAX: &str = "No more than 5 witnesses allowed";
pub const NAME_REQUIRED: &str = "Name is required";
pub const EMAIL_REQUIRED: &str = "Email is required";
pub const EMAIL_INVALID: &str = "Invalid email";
pub const EMAIL_TAKEN: &str = "Email already exists";
pub const EMAIL_CHECK_FAILED: &str = "Email check failed, retry";

/// One step of a field pattern
#[derive(Debug, Clone, PartialEq, Eq)]
enum PatternSegment {
    Key(String),
    /// `*`: every element of an array
    Each,
}

/// Rules attached to every path matching a pattern such as `witnesses.*.email`
#[derive(Debug, Clone)]
pub struct FieldSchema {
    pattern: Vec<PatternSegment>,
    rules: Vec<Rule>,
}

impl FieldSchema {
    pub fn new(pattern: &str, rules: Vec<Rule>) -> Self {
        let pattern = pattern
            .split('.')
            .map(|part| match part {
                "*" => PatternSegment::Each,
                key => PatternSegment::Key(key.to_string()),
            })
            .collect();
        Self { pattern, rules }
    }

    /// Concrete paths this pattern resolves to in `root`, with their values
    fn expand<'v>(&self, root: &'v Value) -> Vec<(FieldPath, &'v Value)> {
        let mut out = Vec::new();
        expand_into(&self.pattern, root, None, &mut out);
        out
    }
}

fn expand_into<'v>(
    pattern: &[PatternSegment],
    value: &'v Value,
    prefix: Option<FieldPath>,
    out: &mut Vec<(FieldPath, &'v Value)>,
) {
    let Some((head, rest)) = pattern.split_first() else {
        if let Some(path) = prefix {
            out.push((path, value));
        }
        return;
    };
    match head {
        PatternSegment::Key(key) => {
            let next = value.get(key.as_str()).unwrap_or(&Value::Null);
            let path = match prefix {
                Some(p) => p.key(key),
                None => FieldPath::root(key),
            };
            expand_into(rest, next, Some(path), out);
        }
        PatternSegment::Each => {
            let (Some(prefix), Some(items)) = (prefix, value.as_array()) else {
                return;
            };
            for (i, item) in items.iter().enumerate() {
                expand_into(rest, item, Some(prefix.clone().index(i)), out);
            }
        }
    }
}

/// An ordered list of field schemas evaluated by one interpreter
#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: Vec<FieldSchema>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, pattern: &str, rules: Vec<Rule>) -> Self {
        self.fields.push(FieldSchema::new(pattern, rules));
        self
    }

    /// Full error map for a snapshot. Each path gets the message of its
    /// first failing rule.
    pub fn validate(&self, snapshot: &FormValue, verdicts: &dyn VerdictLookup) -> ErrorMap {
        let root = match serde_json::to_value(snapshot) {
            Ok(root) => root,
            Err(e) => {
                tracing::error!("Failed to snapshot form value: {e}");
                Value::Null
            }
        };
        let ctx = RuleContext {
            snapshot: &root,
            verdicts,
        };

        let mut errors = ErrorMap::default();
        for field in &self.fields {
            for (path, value) in field.expand(&root) {
                if errors.get_path(&path).is_some() {
                    continue;
                }
                if let Some(message) = field.rules.iter().find_map(|r| r.check(value, &ctx)) {
                    errors.insert(path, message);
                }
            }
        }
        errors
    }

    /// Errors for `path` and everything beneath it
    pub fn validate_path(
        &self,
        snapshot: &FormValue,
        path: &FieldPath,
        verdicts: &dyn VerdictLookup,
    ) -> ErrorMap {
        self.validate(snapshot, verdicts)
            .filtered(|p| p.starts_with(path))
    }

    /// Rules for the damage claim form
    pub fn claim() -> Self {
        Schema::new()
            .field(
                "amount",
                vec![Rule::Range {
                    min: Some((0.0, AMOUNT_MIN)),
                    max: Some((300.0, AMOUNT_MAX)),
                }],
            )
            .field(
                "damagedParts",
                vec![Rule::Length {
                    min: Some((1, PARTS_REQUIRED)),
                    max: None,
                }],
            )
            .field(
                "damagedParts.*",
                vec![Rule::OneOf {
                    options: &DAMAGED_PART_OPTIONS,
                    message: PART_UNKNOWN,
                }],
            )
            .field(
                "allocation",
                vec![
                    Rule::Range {
                        min: Some((0.0, AMOUNT_MIN)),
                        max: None,
                    },
                    Rule::When {
                        field: "amount",
                        then: vec![
                            Rule::Required {
                                message: ALLOCATION_REQUIRED,
                            },
                            Rule::MaxOfField {
                                field: "amount",
                                message: ALLOCATION_MAX,
                            },
                        ],
                        otherwise: vec![],
                    },
                ],
            )
            .field(
                "category",
                vec![Rule::Required {
                    message: CATEGORY_REQUIRED,
                }],
            )
            .field(
                "witnesses",
                vec![Rule::Length {
                    min: Some((MIN_WITNESSES, WITNESSES_MIN)),
                    max: Some((MAX_WITNESSES, WITNESSES_MAX)),
                }],
            )
            .field(
                "witnesses.*.name",
                vec![Rule::Required {
                    message: NAME_REQUIRED,
                }],
            )
            .field(
                "witnesses.*.email",
                vec![
                    Rule::Required {
                        message: EMAIL_REQUIRED,
                    },
                    Rule::Email {
                        message: EMAIL_INVALID,
                    },
                    Rule::RemoteUnique {
                        taken_message: EMAIL_TAKEN,
                        failed_message: EMAIL_CHECK_FAILED,
                    },
                ],
            )
    }
}
