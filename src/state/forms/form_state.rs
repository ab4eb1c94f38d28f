//! Form state controller: value tree, field-array operations and
//! re-validation triggers

use super::field::{parse_number, FieldValue, FormField};
use super::FormError;
use crate::api::UserDirectory;
use crate::state::{FieldPath, FormValue, Witness, MAX_WITNESSES};
use crate::validation::{
    is_valid_email, CheckResolution, CheckTiming, EmailCheckScheduler, ErrorMap, Schema, Verdict,
    VerdictLookup,
};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::mpsc;

/// How much of the tree a validation trigger reveals
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reveal {
    /// Only messages on this exact path
    Exact,
    /// Messages on this path and everything beneath it
    Subtree,
}

/// Result of a submit attempt
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Submitted(FormValue),
    Blocked(ErrorMap),
}

/// Owns the authoritative form value and decides when errors are shown.
///
/// The displayed error map is always the full evaluator output filtered to
/// the paths a trigger has revealed (blur, trigger, field-array change,
/// submit), so it is recomputed on every trigger rather than patched.
pub struct FormController {
    value: FormValue,
    schema: Schema,
    checks: EmailCheckScheduler,
    errors: ErrorMap,
    revealed: BTreeMap<FieldPath, Reveal>,
    focused: Option<FieldPath>,
    submit_count: u32,
}

impl FormController {
    /// Controller seeded with the initial values. Resolutions of debounced
    /// email checks arrive on the returned receiver and must be handed back
    /// through [`FormController::apply_check`].
    pub fn new(
        directory: Arc<dyn UserDirectory>,
        timing: CheckTiming,
    ) -> (Self, mpsc::UnboundedReceiver<CheckResolution>) {
        let (checks, rx) = EmailCheckScheduler::new(directory, timing);
        let controller = Self {
            value: FormValue::initial(),
            schema: Schema::claim(),
            checks,
            errors: ErrorMap::default(),
            revealed: BTreeMap::new(),
            focused: None,
            submit_count: 0,
        };
        (controller, rx)
    }

    pub fn value(&self) -> &FormValue {
        &self.value
    }

    pub fn errors(&self) -> &ErrorMap {
        &self.errors
    }

    pub fn error(&self, path: &str) -> Option<&str> {
        self.errors.get(path)
    }

    pub fn focused(&self) -> Option<&FieldPath> {
        self.focused.as_ref()
    }

    pub fn submit_count(&self) -> u32 {
        self.submit_count
    }

    /// Whether the field at `path` currently refuses input
    pub fn is_disabled(&self, path: &str) -> bool {
        path.parse::<FieldPath>()
            .ok()
            .and_then(|p| FormField::resolve(&p))
            .is_some_and(|f| self.field_disabled(f))
    }

    /// Upper bound currently applied to `allocation`
    pub fn allocation_max(&self) -> Option<f64> {
        if self.value.has_amount() {
            self.value.amount
        } else {
            None
        }
    }

    pub fn can_append_witness(&self) -> bool {
        self.value.witnesses.len() < MAX_WITNESSES
    }

    /// Whether a debounced uniqueness check is outstanding for a witness
    pub fn is_email_check_pending(&self, index: usize) -> bool {
        self.value
            .witnesses
            .get(index)
            .is_some_and(|w| self.checks.is_pending(w.key))
    }

    /// Write user input to a declared leaf
    pub fn set_field(&mut self, path: &str, input: impl Into<FieldValue>) -> Result<(), FormError> {
        let path = parse_path(path)?;
        let field = self.resolve(&path)?;
        if self.field_disabled(field) {
            return Err(FormError::FieldDisabled(path.to_string()));
        }

        match (field, input.into()) {
            (FormField::Amount, FieldValue::Text(text)) => {
                let had_amount = self.value.has_amount();
                self.value.amount = parse_number(&path, &text)?;
                self.sync_allocation(had_amount);
            }
            (FormField::Allocation, FieldValue::Text(text)) => {
                self.value.allocation = parse_number(&path, &text)?;
            }
            (FormField::DamagedParts, FieldValue::Choices(parts)) => {
                self.value.set_damaged_parts(parts);
            }
            (FormField::Category, FieldValue::Text(text)) => {
                self.value.category = text;
            }
            (FormField::WitnessName(i), FieldValue::Text(text)) => {
                self.value.witnesses[i].name = text;
            }
            (FormField::WitnessEmail(i), FieldValue::Text(text)) => {
                let witness = &mut self.value.witnesses[i];
                witness.email = text;
                self.checks.schedule(witness.key, &witness.email);
            }
            (field, _) => {
                return Err(FormError::WrongKind {
                    path: path.to_string(),
                    expected: field.expected_input(),
                })
            }
        }

        // After the first submit attempt every change re-validates
        if self.submit_count > 0 {
            self.refresh();
        }
        Ok(())
    }

    pub fn focus(&mut self, path: &str) -> Result<(), FormError> {
        let path = parse_path(path)?;
        let field = self.resolve(&path)?;
        if self.field_disabled(field) {
            return Err(FormError::FieldDisabled(path.to_string()));
        }
        self.focused = Some(path);
        Ok(())
    }

    /// Field lost focus: validate it and show its messages
    pub fn blur(&mut self, path: &str) -> Result<(), FormError> {
        let path = parse_path(path)?;
        self.resolve(&path)?;
        if self.focused.as_ref() == Some(&path) {
            self.focused = None;
        }
        self.reveal(path, Reveal::Subtree);
        self.refresh();
        Ok(())
    }

    /// Validate any sub-tree on demand and show its messages
    pub fn trigger(&mut self, path: &str) -> Result<ErrorMap, FormError> {
        let path = parse_path(path)?;
        let scoped = self.schema.validate_path(&self.value, &path, &self.checks);
        self.reveal(path, Reveal::Subtree);
        self.refresh();
        Ok(scoped)
    }

    /// Append a witness unless the array is full. Returns its index.
    pub fn append_witness(&mut self, witness: Witness) -> Result<usize, FormError> {
        if !self.can_append_witness() {
            return Err(FormError::WitnessLimit(MAX_WITNESSES));
        }
        self.value.witnesses.push(witness);
        self.reveal(FieldPath::root("witnesses"), Reveal::Exact);
        self.refresh();
        Ok(self.value.witnesses.len() - 1)
    }

    /// Remove the witness at `index`; out-of-range indices are ignored.
    /// Shown messages follow the remaining witnesses to their new positions.
    pub fn remove_witness(&mut self, index: usize) -> Option<Witness> {
        if index >= self.value.witnesses.len() {
            return None;
        }
        let removed = self.value.witnesses.remove(index);
        self.checks.cancel(removed.key);

        let shift = |i: usize| match i.cmp(&index) {
            Ordering::Less => Some(i),
            Ordering::Equal => None,
            Ordering::Greater => Some(i - 1),
        };
        self.revealed = std::mem::take(&mut self.revealed)
            .into_iter()
            .filter_map(|(path, reveal)| Some((path.remap_witness_index(shift)?, reveal)))
            .collect();
        self.focused = self
            .focused
            .take()
            .and_then(|p| p.remap_witness_index(shift));

        self.reveal(FieldPath::root("witnesses"), Reveal::Exact);
        self.refresh();
        Some(removed)
    }

    /// Commit a debounced check result; stale ones are dropped
    pub fn apply_check(&mut self, resolution: CheckResolution) -> bool {
        if !self.checks.accept(&resolution) {
            return false;
        }
        if let Some(i) = self.value.witness_index(resolution.key) {
            self.reveal(FormField::WitnessEmail(i).path(), Reveal::Subtree);
            self.refresh();
        }
        true
    }

    /// The category options arrived; only `category` is affected
    pub fn on_categories_loaded(&mut self) {
        self.refresh();
    }

    /// Validate everything, resolving outstanding email checks first.
    /// The snapshot is only released when no errors remain.
    pub async fn submit(&mut self) -> SubmitOutcome {
        self.submit_count += 1;

        let mut unresolved: Vec<String> = self
            .value
            .witnesses
            .iter()
            .map(|w| w.email.clone())
            .filter(|email| {
                is_valid_email(email)
                    && !matches!(
                        self.checks.verdict(email),
                        Some(Verdict::Available | Verdict::Taken)
                    )
            })
            .collect();
        unresolved.sort();
        unresolved.dedup();
        for email in unresolved {
            self.checks.check_now(&email).await;
        }

        self.refresh();
        if self.errors.is_empty() {
            SubmitOutcome::Submitted(self.value.clone())
        } else {
            tracing::info!("Submit blocked by {} field errors", self.errors.len());
            SubmitOutcome::Blocked(self.errors.clone())
        }
    }

    /// Back to the initial values with nothing validated
    pub fn reset(&mut self) {
        self.checks.cancel_all();
        self.value = FormValue::initial();
        self.errors = ErrorMap::default();
        self.revealed.clear();
        self.focused = None;
        self.submit_count = 0;
    }

    fn resolve(&self, path: &FieldPath) -> Result<FormField, FormError> {
        let field =
            FormField::resolve(path).ok_or_else(|| FormError::UnknownField(path.to_string()))?;
        match field.witness_index() {
            Some(i) if i >= self.value.witnesses.len() => {
                Err(FormError::UnknownField(path.to_string()))
            }
            _ => Ok(field),
        }
    }

    fn field_disabled(&self, field: FormField) -> bool {
        field == FormField::Allocation && !self.value.has_amount()
    }

    /// A falsy amount clears and disables allocation
    fn sync_allocation(&mut self, had_amount: bool) {
        if self.value.has_amount() {
            return;
        }
        let cleared = self.value.allocation.take().is_some();
        if cleared || had_amount {
            tracing::debug!("Amount cleared, allocation disabled");
            self.refresh();
        }
    }

    fn reveal(&mut self, path: FieldPath, reveal: Reveal) {
        let entry = self.revealed.entry(path).or_insert(reveal);
        if reveal == Reveal::Subtree {
            *entry = Reveal::Subtree;
        }
    }

    fn is_revealed(&self, path: &FieldPath) -> bool {
        self.submit_count > 0
            || self.revealed.iter().any(|(shown, reveal)| match reveal {
                Reveal::Exact => path == shown,
                Reveal::Subtree => path.starts_with(shown),
            })
    }

    fn refresh(&mut self) {
        let errors = self.schema.validate(&self.value, &self.checks);
        self.errors = errors.filtered(|p| self.is_revealed(p));
    }
}

fn parse_path(path: &str) -> Result<FieldPath, FormError> {
    path.parse()
        .map_err(|_| FormError::UnknownField(path.to_string()))
}
