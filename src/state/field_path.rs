//! Dotted/indexed addresses into the form value tree

use std::fmt;
use std::str::FromStr;

/// One step of a field path
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Segment {
    Key(String),
    Index(usize),
}

/// Address of a leaf or sub-tree, e.g. `witnesses.1.email`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldPath(Vec<Segment>);

impl FieldPath {
    /// Single-segment path for a top-level field
    pub fn root(key: &str) -> Self {
        Self(vec![Segment::Key(key.to_string())])
    }

    pub fn key(mut self, key: &str) -> Self {
        self.0.push(Segment::Key(key.to_string()));
        self
    }

    pub fn index(mut self, index: usize) -> Self {
        self.0.push(Segment::Index(index));
        self
    }

    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    pub fn starts_with(&self, prefix: &FieldPath) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// Witness position when this path points inside `witnesses.N`
    pub fn witness_index(&self) -> Option<usize> {
        match self.0.as_slice() {
            [Segment::Key(root), Segment::Index(i), ..] if root == "witnesses" => Some(*i),
            _ => None,
        }
    }

    /// Rewrite the index following `witnesses` through `f`; `None` drops the path
    pub fn remap_witness_index(&self, f: impl Fn(usize) -> Option<usize>) -> Option<FieldPath> {
        match self.witness_index() {
            Some(i) => {
                let mut segments = self.0.clone();
                segments[1] = Segment::Index(f(i)?);
                Some(Self(segments))
            }
            None => Some(self.clone()),
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            match segment {
                Segment::Key(k) => f.write_str(k)?,
                Segment::Index(n) => write!(f, "{n}")?,
            }
        }
        Ok(())
    }
}

/// Error returned for empty or malformed path text
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed field path `{0}`")]
pub struct PathParseError(pub String);

impl FromStr for FieldPath {
    type Err = PathParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(PathParseError(s.to_string()));
        }
        let mut segments = Vec::new();
        for (i, part) in s.split('.').enumerate() {
            if part.is_empty() {
                return Err(PathParseError(s.to_string()));
            }
            match part.parse::<usize>() {
                // A path never starts with an index
                Ok(_) if i == 0 => return Err(PathParseError(s.to_string())),
                Ok(n) => segments.push(Segment::Index(n)),
                Err(_) => segments.push(Segment::Key(part.to_string())),
            }
        }
        Ok(Self(segments))
    }
}
