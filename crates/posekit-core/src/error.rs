//! Error types for pose storage, application and mirroring.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for pose operations.
pub type PoseResult<T> = Result<T, PoseError>;

/// Result type for rig host primitives.
pub type RigResult<T> = Result<T, RigError>;

/// File-level and operation-level failures.
///
/// Per-control and per-attribute problems never surface here; they are
/// recorded as outcomes in the operation reports instead.
#[derive(Debug, Error)]
pub enum PoseError {
    /// Pose record does not exist.
    #[error("Pose record not found: {path}")]
    NotFound { path: PathBuf },

    /// Pose record exists but its shape is invalid.
    #[error("Pose record at {path} is corrupt: {reason}")]
    CorruptData { path: PathBuf, reason: String },

    /// Storage refused a write or delete.
    #[error("Pose storage at {path} is read-only")]
    ReadOnly { path: PathBuf },

    /// A control required by the operation is missing on the live rig.
    #[error("Control '{control}' does not exist on the rig")]
    ControlNotFound { control: String },

    /// The caller declined an overwrite or read-only recovery.
    #[error("Operation cancelled")]
    Cancelled,

    /// Space switch nodes are not in their default spaces.
    #[error("Cannot save poses while controls are outside their default spaces: {}", attributes.join(", "))]
    NonDefaultSpace { attributes: Vec<String> },

    /// A mirror rule pattern failed to compile.
    #[error("Invalid mirror rule pattern '{pattern}': {source}")]
    InvalidRule {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// The rig has no skin-bound geometry to build a ghost from.
    #[error("Rig has no skinned geometry to build a ghost from")]
    NoSkinnedGeometry,

    /// A host primitive failed for a whole-operation step.
    #[error("Rig host error: {0}")]
    Rig(RigError),

    /// JSON (de)serialization failure outside of record validation.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error during file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PoseError {
    /// Creates a new corrupt data error.
    pub fn corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::CorruptData {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Returns the stable error code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            PoseError::NotFound { .. } => "POSE_001",
            PoseError::CorruptData { .. } => "POSE_002",
            PoseError::ReadOnly { .. } => "POSE_003",
            PoseError::ControlNotFound { .. } => "POSE_004",
            PoseError::Cancelled => "POSE_005",
            PoseError::NonDefaultSpace { .. } => "POSE_006",
            PoseError::InvalidRule { .. } => "POSE_007",
            PoseError::NoSkinnedGeometry => "POSE_008",
            PoseError::Rig(_) => "POSE_009",
            PoseError::Json(_) => "POSE_010",
            PoseError::Io(_) => "POSE_011",
        }
    }

    /// Returns true for failures the caller may recover from by checking out
    /// the file and retrying.
    pub fn is_read_only(&self) -> bool {
        matches!(self, PoseError::ReadOnly { .. })
    }
}

impl From<RigError> for PoseError {
    fn from(err: RigError) -> Self {
        match err {
            RigError::MissingControl(control) => PoseError::ControlNotFound { control },
            other => PoseError::Rig(other),
        }
    }
}

/// Failures reported by a [`crate::host::RigHost`] primitive.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RigError {
    #[error("control '{0}' does not exist")]
    MissingControl(String),
    #[error("attribute '{control}.{attribute}' does not exist")]
    MissingAttribute { control: String, attribute: String },
    #[error("attribute '{control}.{attribute}' is locked")]
    Locked { control: String, attribute: String },
    #[error("attribute '{control}.{attribute}' is not keyable")]
    NotKeyable { control: String, attribute: String },
    #[error("node '{0}' does not exist")]
    MissingNode(String),
    #[error("{0}")]
    Host(String),
}

impl RigError {
    /// Creates a missing attribute error.
    pub fn missing_attribute(control: &str, attribute: &str) -> Self {
        Self::MissingAttribute {
            control: control.to_string(),
            attribute: attribute.to_string(),
        }
    }
}
