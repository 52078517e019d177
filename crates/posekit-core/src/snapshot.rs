//! Snapshot and pose record types.

use serde::{Deserialize, Serialize};

/// Name suffix marking a selection-only (partial) pose.
pub const PARTIAL_SUFFIX: &str = "__SelectionOnly";

/// Current on-disk record format version.
pub const RECORD_FORMAT: u32 = 1;

// =============================================================================
// Snapshots
// =============================================================================

/// One control's recorded attribute values.
///
/// `attributes` and `values` are index-aligned and always the same length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Snapshot {
    /// Control name within the rig instance (no namespace).
    pub control: String,
    /// Keyable, unlocked attribute names in capture order.
    pub attributes: Vec<String>,
    /// Values for `attributes`, same order.
    pub values: Vec<f64>,
}

impl Snapshot {
    /// Creates an empty snapshot for a control.
    pub fn new(control: impl Into<String>) -> Self {
        Self {
            control: control.into(),
            attributes: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Appends an attribute/value pair.
    pub fn with(mut self, attribute: impl Into<String>, value: f64) -> Self {
        self.push(attribute, value);
        self
    }

    /// Appends an attribute/value pair in place.
    pub fn push(&mut self, attribute: impl Into<String>, value: f64) {
        self.attributes.push(attribute.into());
        self.values.push(value);
    }

    /// Returns the recorded value for an attribute.
    pub fn value(&self, attribute: &str) -> Option<f64> {
        self.attributes
            .iter()
            .position(|a| a == attribute)
            .and_then(|i| self.values.get(i).copied())
    }

    /// Iterates over `(attribute, value)` pairs in recorded order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.attributes
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }

    /// Returns true if the attribute and value lists line up.
    pub fn is_aligned(&self) -> bool {
        self.attributes.len() == self.values.len()
    }
}

// =============================================================================
// Pose Records
// =============================================================================

/// Completeness contract of a stored pose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoseDialect {
    /// Every registered control was recorded.
    #[default]
    Full,
    /// Only the controls selected at save time were recorded.
    Partial,
}

impl PoseDialect {
    /// Returns the file-stem suffix for this dialect.
    pub fn suffix(&self) -> &'static str {
        match self {
            PoseDialect::Full => "",
            PoseDialect::Partial => PARTIAL_SUFFIX,
        }
    }

    /// Splits a stored file stem into pose name and dialect.
    pub fn from_stem(stem: &str) -> (&str, PoseDialect) {
        match stem.strip_suffix(PARTIAL_SUFFIX) {
            Some(name) => (name, PoseDialect::Partial),
            None => (stem, PoseDialect::Full),
        }
    }
}

/// A persisted, named pose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseRecord {
    /// Record format version.
    #[serde(default = "default_format")]
    pub format: u32,
    /// Pose name without dialect suffix.
    pub name: String,
    /// Project scope.
    pub project: String,
    /// Category within the project.
    pub category: String,
    /// Full or partial.
    #[serde(default)]
    pub dialect: PoseDialect,
    /// RFC 3339 timestamp of the save.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<String>,
    /// Recorded controls in capture order.
    pub snapshots: Vec<Snapshot>,
}

fn default_format() -> u32 {
    RECORD_FORMAT
}

impl PoseRecord {
    /// Creates a new record stamped with the current time.
    pub fn new(
        name: impl Into<String>,
        project: impl Into<String>,
        category: impl Into<String>,
        dialect: PoseDialect,
        snapshots: Vec<Snapshot>,
    ) -> Self {
        Self {
            format: RECORD_FORMAT,
            name: name.into(),
            project: project.into(),
            category: category.into(),
            dialect,
            saved_at: Some(chrono::Utc::now().to_rfc3339()),
            snapshots,
        }
    }

    /// Returns the snapshot recorded for a control.
    pub fn snapshot(&self, control: &str) -> Option<&Snapshot> {
        self.snapshots.iter().find(|s| s.control == control)
    }
}
