//! Derived mapping from field path to validation message

use crate::state::FieldPath;
use std::collections::BTreeMap;
use std::fmt;

/// Field path → message, ordered by path. Only produced by the evaluator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorMap(BTreeMap<FieldPath, String>);

impl ErrorMap {
    pub(crate) fn insert(&mut self, path: FieldPath, message: String) {
        self.0.insert(path, message);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Message for a path given as text, e.g. `"witnesses.0.email"`
    pub fn get(&self, path: &str) -> Option<&str> {
        let path: FieldPath = path.parse().ok()?;
        self.get_path(&path)
    }

    pub fn get_path(&self, path: &FieldPath) -> Option<&str> {
        self.0.get(path).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FieldPath, &str)> {
        self.0.iter().map(|(p, m)| (p, m.as_str()))
    }

    /// Keep only the entries whose path satisfies `keep`
    pub fn filtered(self, keep: impl Fn(&FieldPath) -> bool) -> Self {
        Self(self.0.into_iter().filter(|(p, _)| keep(p)).collect())
    }
}

impl fmt::Display for ErrorMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (path, message) in &self.0 {
            writeln!(f, "{path}: {message}")?;
        }
        Ok(())
    }
}
