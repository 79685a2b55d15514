use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Validation error raised at the exact point a value fails to match its description
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error(
    "Invalid value{}{}. Expected {} but got {}",
    key_text(.key),
    parent_text(.parent),
    .expected,
    value_text(.value)
)]
pub struct ValidationError {
    /// Rendered expected type, e.g. `an optional array of number`
    pub expected: String,
    /// Property key at the failure site, `None` at the root or inside arrays and unions
    pub key: Option<String>,
    /// Enclosing reference name, if one was resolved
    pub parent: Option<String>,
    /// Offending value; `None` when the value was missing
    pub value: Option<Value>,
    /// Full path to the failure site, array indices included
    pub path: PropertyPath,
}

fn key_text(key: &Option<String>) -> String {
    match key {
        Some(key) if !key.is_empty() => format!(" for key \"{}\"", key),
        _ => String::new(),
    }
}

fn parent_text(parent: &Option<String>) -> String {
    match parent {
        Some(parent) if !parent.is_empty() => format!(" on {}", parent),
        _ => String::new(),
    }
}

fn value_text(value: &Option<Value>) -> String {
    match value {
        Some(value) => value.to_string(),
        None => "undefined".to_string(),
    }
}

impl ValidationError {
    pub fn new(expected: impl Into<String>, value: Option<&Value>) -> Self {
        Self {
            expected: expected.into(),
            key: None,
            parent: None,
            value: value.cloned(),
            path: PropertyPath::root(),
        }
    }

    pub fn with_key(mut self, key: Option<&str>) -> Self {
        self.key = key.map(str::to_string);
        self
    }

    pub fn with_parent(mut self, parent: Option<&str>) -> Self {
        self.parent = parent.map(str::to_string);
        self
    }

    pub fn with_path(mut self, path: &PropertyPath) -> Self {
        self.path = path.clone();
        self
    }
}

/// One step from a parent value to a child value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// Location within a JSON document, rendered as `hits.hits[3]._source.url`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyPath {
    segments: Vec<PathSegment>,
}

impl PropertyPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn child_key(&self, key: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(PathSegment::Key(key.to_string()));
        Self { segments }
    }

    pub fn child_index(&self, index: usize) -> Self {
        let mut segments = self.segments.clone();
        segments.push(PathSegment::Index(index));
        Self { segments }
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("$");
        }
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::Key(key) if i == 0 => write!(f, "{}", key)?,
                PathSegment::Key(key) => write!(f, ".{}", key)?,
                PathSegment::Index(index) => write!(f, "[{}]", index)?,
            }
        }
        Ok(())
    }
}
