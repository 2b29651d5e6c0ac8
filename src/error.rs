//! Error types for problem construction, parsing, training and model I/O.
//!
//! Every fallible operation in the crate returns [`LinearError`]. Callers that
//! only care about the broad category (bad arguments vs. malformed text vs.
//! use-after-destroy) can match on [`LinearError::kind`].

use std::fmt;
use std::io;

/// Result type alias for sparselin operations.
pub type Result<T> = std::result::Result<T, LinearError>;

/// A resource that can be explicitly released before it is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    /// A [`Problem`](crate::data::Problem) whose feature arena was released.
    Problem,
    /// A [`ModelView`](crate::model::ModelView) whose weights were released.
    Model,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Problem => write!(f, "problem"),
            Resource::Model => write!(f, "model"),
        }
    }
}

/// Broad error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller-supplied shape or parameter is invalid.
    Argument,
    /// Sparse text input violates the line grammar.
    MalformedInput,
    /// Operation on a problem or model after `destroy()`.
    ResourceDestroyed,
    /// Arena sizing bug: allocated and written sizes disagree.
    InternalConsistency,
    /// Underlying OS I/O failure.
    Io,
    /// A model file exists but could not be understood.
    Format,
}

/// Errors raised by sparselin.
#[derive(Debug, thiserror::Error)]
pub enum LinearError {
    #[error("samples and labels were of different length ({samples}, {labels})")]
    LengthMismatch { labels: usize, samples: usize },

    #[error("feature index {index} in sample {sample} is outside 1..={max}")]
    FeatureIndexInvalid { sample: usize, index: i32, max: i32 },

    #[error("sample {sample} is out of range for a problem with {l} samples")]
    SampleOutOfRange { sample: usize, l: usize },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("unsupported output: {0}")]
    UnsupportedOutput(&'static str),

    #[error("malformed input on line {line}: {message}")]
    MalformedInput { line: usize, message: String },

    #[error("{0} has been destroyed")]
    ResourceDestroyed(Resource),

    #[error("allocated {allocated} feature nodes but wrote {written}")]
    InternalConsistency { allocated: usize, written: usize },

    #[error("feature arena overflow: capacity is {capacity} nodes")]
    ArenaOverflow { capacity: usize },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid model file on line {line}: {message}")]
    ModelFormat { line: usize, message: String },

    #[error("invalid JSON model: {0}")]
    Json(#[from] serde_json::Error),
}

impl LinearError {
    /// The category this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            LinearError::LengthMismatch { .. }
            | LinearError::FeatureIndexInvalid { .. }
            | LinearError::SampleOutOfRange { .. }
            | LinearError::InvalidParameter(_)
            | LinearError::UnsupportedOutput(_) => ErrorKind::Argument,
            LinearError::MalformedInput { .. } => ErrorKind::MalformedInput,
            LinearError::ResourceDestroyed(_) => ErrorKind::ResourceDestroyed,
            LinearError::InternalConsistency { .. } | LinearError::ArenaOverflow { .. } => {
                ErrorKind::InternalConsistency
            }
            LinearError::Io(_) => ErrorKind::Io,
            LinearError::ModelFormat { .. } => ErrorKind::Format,
            // serde_json reports I/O failures through its own error type.
            LinearError::Json(e) if e.is_io() => ErrorKind::Io,
            LinearError::Json(_) => ErrorKind::Format,
        }
    }

    pub(crate) fn malformed(line: usize, message: impl Into<String>) -> Self {
        LinearError::MalformedInput {
            line,
            message: message.into(),
        }
    }

    pub(crate) fn model_format(line: usize, message: impl Into<String>) -> Self {
        LinearError::ModelFormat {
            line,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_taxonomy() {
        let err = LinearError::LengthMismatch {
            labels: 2,
            samples: 3,
        };
        assert_eq!(err.kind(), ErrorKind::Argument);
        assert_eq!(
            LinearError::malformed(4, "missing label").kind(),
            ErrorKind::MalformedInput
        );
        assert_eq!(
            LinearError::ResourceDestroyed(Resource::Model).kind(),
            ErrorKind::ResourceDestroyed
        );
        assert_eq!(
            LinearError::InternalConsistency {
                allocated: 4,
                written: 3
            }
            .kind(),
            ErrorKind::InternalConsistency
        );
        let io = io::Error::new(io::ErrorKind::NotFound, "gone");
        assert_eq!(LinearError::from(io).kind(), ErrorKind::Io);
    }

    #[test]
    fn messages_name_the_problem() {
        let err = LinearError::LengthMismatch {
            labels: 2,
            samples: 3,
        };
        assert_eq!(
            err.to_string(),
            "samples and labels were of different length (3, 2)"
        );
        assert_eq!(
            LinearError::ResourceDestroyed(Resource::Problem).to_string(),
            "problem has been destroyed"
        );
    }
}
