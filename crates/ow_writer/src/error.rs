use core::any::TypeId;

use thiserror::Error;

use crate::info::AnnotationKind;

/// Configuration errors raised while describing or building resource metadata.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum MetaError {
    #[error("type `{type_name}` declares property `{name}` more than once")]
    DuplicateProperty {
        type_name: &'static str,
        name: Box<str>,
    },
    #[error("property name must not be empty")]
    EmptyName,
    #[error("property name `{name}` cannot be encoded: {reason}")]
    InvalidName { name: Box<str>, reason: Box<str> },
    #[error("type `{type_name}` has a property at position {index} that was never named")]
    UnnamedProperty { type_name: &'static str, index: usize },
    #[error("property `{current}` is already encoded and cannot be renamed to `{requested}`")]
    NameAlreadyEncoded { current: Box<str>, requested: Box<str> },
    #[error("annotation `{annotation}` on `{owner}` has both a value accessor and a writer accessor")]
    ConflictingAnnotationAccessor {
        owner: Box<str>,
        annotation: AnnotationKind,
    },
    #[error("no resource metadata is registered for {0:?}")]
    UnregisteredType(TypeId),
    #[error("cached metadata for `{0}` describes a different type")]
    TypeMismatch(&'static str),
}

/// Errors reported by an [`OutputSink`](crate::sink::OutputSink).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SinkError {
    #[error("failed to write buffered output: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode value: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("unbalanced output structure: {0}")]
    Unbalanced(&'static str),
}

/// Errors raised by a write call.
///
/// Internal-consistency failures ([`is_fatal`](Self::is_fatal)) poison the
/// [`WriteState`](crate::WriteState); every other error leaves it untouched.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WriteError {
    #[error(transparent)]
    Meta(#[from] MetaError),
    #[error(transparent)]
    Sink(#[from] SinkError),
    #[error("frame at depth {depth} holds {found} progress but {expected} progress was expected")]
    FrameMismatch {
        depth: usize,
        expected: &'static str,
        found: &'static str,
    },
    #[error("no frame is stored at depth {0}")]
    MissingFrame(usize),
    #[error("frame at depth {0} does not fit the value being written")]
    StaleFrame(usize),
    #[error("value passed to the writer is not a `{expected}`")]
    ResourceTypeMismatch { expected: &'static str },
    #[error("container handler for `{expected}` received a different container type")]
    ContainerTypeMismatch { expected: &'static str },
    #[error("type `{type_name}` has no property named `{name}`")]
    UnknownProperty {
        type_name: &'static str,
        name: Box<str>,
    },
    #[error("no container handler is registered for the container of `{0}`")]
    NoHandler(&'static str),
    #[error("maximum nesting depth {0} exceeded")]
    DepthExceeded(usize),
    #[error("annotation `{kind}` cannot carry a {attempted} value")]
    AnnotationKindMismatch {
        kind: AnnotationKind,
        attempted: &'static str,
    },
    #[error("write state was poisoned by an earlier failure; reset it before reuse")]
    Poisoned,
    #[error("write was cancelled")]
    Cancelled,
}

impl WriteError {
    /// Returns `true` when the stored progress can no longer be trusted.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Sink(_)
                | Self::FrameMismatch { .. }
                | Self::MissingFrame(_)
                | Self::StaleFrame(_)
                | Self::ResourceTypeMismatch { .. }
                | Self::ContainerTypeMismatch { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fatal_classification() {
        let mismatch = WriteError::FrameMismatch {
            depth: 1,
            expected: "resource",
            found: "collection",
        };
        assert!(mismatch.is_fatal());
        assert!(WriteError::MissingFrame(0).is_fatal());

        let unknown = WriteError::UnknownProperty {
            type_name: "Order",
            name: "Missing".into(),
        };
        assert!(!unknown.is_fatal());
        assert!(!WriteError::NoHandler("Order").is_fatal());
        assert!(!WriteError::from(MetaError::EmptyName).is_fatal());
    }

    #[test]
    fn messages() {
        let err = MetaError::DuplicateProperty {
            type_name: "Order",
            name: "Id".into(),
        };
        assert_eq!(err.to_string(), "type `Order` declares property `Id` more than once");

        let err = WriteError::AnnotationKindMismatch {
            kind: AnnotationKind::ETag,
            attempted: "count",
        };
        assert_eq!(err.to_string(), "annotation `odata.etag` cannot carry a count value");
    }
}
