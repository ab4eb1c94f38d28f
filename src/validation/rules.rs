//! Rule variants interpreted by the schema evaluator

use super::email_check::{Verdict, VerdictLookup};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// Same shape HTML `type=email` inputs accept
static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
    )
    .expect("email pattern compiles")
});

pub const NOT_A_NUMBER: &str = "Must be a number";

/// Whether `email` is non-empty and syntactically valid
pub fn is_valid_email(email: &str) -> bool {
    !email.is_empty() && EMAIL_PATTERN.is_match(email)
}

/// A single declarative constraint on a field.
///
/// Rules other than `Required` treat an absent value (`null`, or an empty
/// string for text rules) as passing, so presence is always decided by an
/// explicit `Required`.
#[derive(Debug, Clone)]
pub enum Rule {
    /// Non-null; strings must also be non-empty
    Required { message: &'static str },
    /// Inclusive numeric bounds
    Range {
        min: Option<(f64, &'static str)>,
        max: Option<(f64, &'static str)>,
    },
    /// Picks a rule list depending on whether another field is truthy
    When {
        field: &'static str,
        then: Vec<Rule>,
        otherwise: Vec<Rule>,
    },
    /// Upper bound read from another field; `{bound}` in the message is
    /// replaced with that field's value
    MaxOfField {
        field: &'static str,
        message: &'static str,
    },
    /// String membership in a fixed option set
    OneOf {
        options: &'static [&'static str],
        message: &'static str,
    },
    /// Array length bounds
    Length {
        min: Option<(usize, &'static str)>,
        max: Option<(usize, &'static str)>,
    },
    Email { message: &'static str },
    /// Arbitrary predicate over the value and the whole snapshot
    Custom {
        predicate: fn(&Value, &Value) -> bool,
        message: &'static str,
    },
    /// Answer from an asynchronous lookup, read from committed verdicts.
    /// Only consulted for syntactically valid emails.
    RemoteUnique {
        taken_message: &'static str,
        failed_message: &'static str,
    },
}

/// What a rule may look at besides its own value
pub struct RuleContext<'a> {
    pub snapshot: &'a Value,
    pub verdicts: &'a dyn VerdictLookup,
}

impl Rule {
    /// First violation message, if the value breaks this rule
    pub fn check(&self, value: &Value, ctx: &RuleContext<'_>) -> Option<String> {
        match self {
            Rule::Required { message } => match value {
                Value::Null => Some(message.to_string()),
                Value::String(s) if s.is_empty() => Some(message.to_string()),
                _ => None,
            },
            Rule::Range { min, max } => {
                if value.is_null() {
                    return None;
                }
                let Some(n) = value.as_f64() else {
                    return Some(NOT_A_NUMBER.to_string());
                };
                if let Some((lo, message)) = min {
                    if n < *lo {
                        return Some(message.to_string());
                    }
                }
                if let Some((hi, message)) = max {
                    if n > *hi {
                        return Some(message.to_string());
                    }
                }
                None
            }
            Rule::When {
                field,
                then,
                otherwise,
            } => {
                let other = ctx.snapshot.get(*field).unwrap_or(&Value::Null);
                let branch = if truthy(other) { then } else { otherwise };
                branch.iter().find_map(|rule| rule.check(value, ctx))
            }
            Rule::MaxOfField { field, message } => {
                let bound = ctx.snapshot.get(*field).and_then(Value::as_f64)?;
                let n = value.as_f64()?;
                (n > bound).then(|| message.replace("{bound}", &bound.to_string()))
            }
            Rule::OneOf { options, message } => match value {
                Value::Null => None,
                Value::String(s) if options.contains(&s.as_str()) => None,
                _ => Some(message.to_string()),
            },
            Rule::Length { min, max } => {
                let len = value.as_array()?.len();
                if let Some((lo, message)) = min {
                    if len < *lo {
                        return Some(message.to_string());
                    }
                }
                if let Some((hi, message)) = max {
                    if len > *hi {
                        return Some(message.to_string());
                    }
                }
                None
            }
            Rule::Email { message } => match value.as_str() {
                Some(s) if !s.is_empty() && !is_valid_email(s) => Some(message.to_string()),
                _ => None,
            },
            Rule::Custom { predicate, message } => {
                (!predicate(value, ctx.snapshot)).then(|| message.to_string())
            }
            Rule::RemoteUnique {
                taken_message,
                failed_message,
            } => {
                let email = value.as_str().filter(|s| is_valid_email(s))?;
                match ctx.verdicts.verdict(email)? {
                    Verdict::Available => None,
                    Verdict::Taken => Some(taken_message.to_string()),
                    Verdict::Failed => Some(failed_message.to_string()),
                }
            }
        }
    }
}

/// Loose truthiness: null, false, 0, NaN and "" are falsy
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn check(rule: &Rule, value: Value, snapshot: Value) -> Option<String> {
        let verdicts: HashMap<String, Verdict> = HashMap::new();
        let ctx = RuleContext {
            snapshot: &snapshot,
            verdicts: &verdicts,
        };
        rule.check(&value, &ctx)
    }

    mod email_syntax {
        use super::*;

        #[test]
        fn test_accepts_common_addresses() {
            assert!(is_valid_email("marek@email.cz"));
            assert!(is_valid_email("emily.johnson@x.dummyjson.com"));
            assert!(is_valid_email("a+tag@sub-domain.example.org"));
        }

        #[test]
        fn test_rejects_malformed() {
            assert!(!is_valid_email(""));
            assert!(!is_valid_email("plainaddress"));
            assert!(!is_valid_email("@no-local.cz"));
            assert!(!is_valid_email("no-domain@"));
            assert!(!is_valid_email("two@@signs.cz"));
            assert!(!is_valid_email("space in@local.cz"));
        }
    }

    mod required {
        use super::*;

        #[test]
        fn test_null_and_empty_fail() {
            let rule = Rule::Required { message: "req" };
            assert_eq!(check(&rule, Value::Null, json!({})), Some("req".into()));
            assert_eq!(check(&rule, json!(""), json!({})), Some("req".into()));
        }

        #[test]
        fn test_present_passes() {
            let rule = Rule::Required { message: "req" };
            assert_eq!(check(&rule, json!("x"), json!({})), None);
            assert_eq!(check(&rule, json!(0), json!({})), None);
            assert_eq!(check(&rule, json!([]), json!({})), None);
        }
    }

    mod range {
        use super::*;

        fn rule() -> Rule {
            Rule::Range {
                min: Some((0.0, "min")),
                max: Some((300.0, "max")),
            }
        }

        #[test]
        fn test_bounds_are_inclusive() {
            assert_eq!(check(&rule(), json!(0), json!({})), None);
            assert_eq!(check(&rule(), json!(300), json!({})), None);
            assert_eq!(check(&rule(), json!(-0.01), json!({})), Some("min".into()));
            assert_eq!(check(&rule(), json!(300.5), json!({})), Some("max".into()));
        }

        #[test]
        fn test_absent_passes() {
            assert_eq!(check(&rule(), Value::Null, json!({})), None);
        }

        #[test]
        fn test_non_number_fails() {
            assert_eq!(
                check(&rule(), json!("abc"), json!({})),
                Some(NOT_A_NUMBER.into())
            );
        }
    }

    mod conditional {
        use super::*;

        fn rule() -> Rule {
            Rule::When {
                field: "amount",
                then: vec![
                    Rule::Required { message: "req" },
                    Rule::MaxOfField {
                        field: "amount",
                        message: "Maximum value is {bound}",
                    },
                ],
                otherwise: vec![],
            }
        }

        #[test]
        fn test_truthy_amount_bounds_value() {
            let snapshot = json!({ "amount": 100.0 });
            assert_eq!(
                check(&rule(), json!(150.0), snapshot.clone()),
                Some("Maximum value is 100".into())
            );
            assert_eq!(check(&rule(), json!(100.0), snapshot.clone()), None);
            assert_eq!(check(&rule(), Value::Null, snapshot), Some("req".into()));
        }

        #[test]
        fn test_fractional_bound_is_kept() {
            let snapshot = json!({ "amount": 12.5 });
            assert_eq!(
                check(&rule(), json!(13), snapshot),
                Some("Maximum value is 12.5".into())
            );
        }

        #[test]
        fn test_falsy_amount_skips_rules() {
            for amount in [Value::Null, json!(0)] {
                let snapshot = json!({ "amount": amount });
                assert_eq!(check(&rule(), Value::Null, snapshot.clone()), None);
                assert_eq!(check(&rule(), json!(10_000), snapshot), None);
            }
        }
    }

    mod membership_and_length {
        use super::*;

        #[test]
        fn test_one_of() {
            let rule = Rule::OneOf {
                options: &["roof", "rear"],
                message: "bad",
            };
            assert_eq!(check(&rule, json!("roof"), json!({})), None);
            assert_eq!(check(&rule, json!("door"), json!({})), Some("bad".into()));
            assert_eq!(check(&rule, json!(3), json!({})), Some("bad".into()));
        }

        #[test]
        fn test_length() {
            let rule = Rule::Length {
                min: Some((1, "few")),
                max: Some((2, "many")),
            };
            assert_eq!(check(&rule, json!([]), json!({})), Some("few".into()));
            assert_eq!(check(&rule, json!([1, 2]), json!({})), None);
            assert_eq!(check(&rule, json!([1, 2, 3]), json!({})), Some("many".into()));
            assert_eq!(check(&rule, Value::Null, json!({})), None);
        }
    }

    #[test]
    fn test_custom_predicate_sees_snapshot() {
        let rule = Rule::Custom {
            predicate: |value, snapshot| value != &snapshot["amount"],
            message: "must differ from amount",
        };
        let snapshot = json!({ "amount": 5.0 });
        assert_eq!(check(&rule, json!(4.0), snapshot.clone()), None);
        assert_eq!(
            check(&rule, json!(5.0), snapshot),
            Some("must differ from amount".into())
        );
    }

    mod remote {
        use super::*;

        fn rule() -> Rule {
            Rule::RemoteUnique {
                taken_message: "taken",
                failed_message: "failed",
            }
        }

        fn check_with(value: &str, verdicts: &HashMap<String, Verdict>) -> Option<String> {
            let snapshot = json!({});
            let ctx = RuleContext {
                snapshot: &snapshot,
                verdicts,
            };
            rule().check(&json!(value), &ctx)
        }

        #[test]
        fn test_reads_committed_verdicts() {
            let mut verdicts = HashMap::new();
            verdicts.insert("a@b.cz".to_string(), Verdict::Taken);
            verdicts.insert("c@d.cz".to_string(), Verdict::Available);
            verdicts.insert("e@f.cz".to_string(), Verdict::Failed);

            assert_eq!(check_with("a@b.cz", &verdicts), Some("taken".into()));
            assert_eq!(check_with("c@d.cz", &verdicts), None);
            assert_eq!(check_with("e@f.cz", &verdicts), Some("failed".into()));
        }

        #[test]
        fn test_unknown_empty_or_malformed_pass() {
            let mut verdicts = HashMap::new();
            verdicts.insert("broken".to_string(), Verdict::Taken);

            assert_eq!(check_with("new@b.cz", &verdicts), None);
            assert_eq!(check_with("", &verdicts), None);
            assert_eq!(check_with("broken", &verdicts), None);
        }
    }
}
