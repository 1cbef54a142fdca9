//! Engine errors and the error-reporter collaborator.

use crate::node::NodeId;
use thiserror::Error;

/// Errors produced by tree, range and snapshot operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// An operation would have produced an invalid tree.
    #[error("structural invariant violated: {0}")]
    StructuralInvariant(String),

    /// A boundary point refers to a node outside the editing root.
    #[error("range does not lie inside the document")]
    RangeNotInDocument,

    /// A query found nothing to act on.
    #[error("nothing to operate on")]
    EmptyQuery,

    /// An offset exceeds the length of its container.
    #[error("offset {offset} is out of bounds (length {length})")]
    InvalidOffset {
        /// Requested offset.
        offset: usize,
        /// Length of the container.
        length: usize,
    },

    /// A split was asked to stop at a node that does not contain the split point.
    #[error("stop node is not an ancestor of the split point")]
    StopNodeNotAncestor,

    /// A handle refers to a freed node.
    #[error("stale node handle #{}", .0.index())]
    StaleNode(NodeId),

    /// Snapshot markup could not be read.
    #[error("malformed markup at byte {position}: {message}")]
    Markup {
        /// Byte position in the input.
        position: usize,
        /// What went wrong.
        message: String,
    },

    /// The caller broke an operation contract.
    #[error("contract violation: {0}")]
    Contract(String),
}

/// Coarse error taxonomy handed to an [`ErrorReporter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The tree would have become invalid; the operation was abandoned.
    StructuralInvariantViolation,
    /// The selection pointed outside the document and was reset.
    RangeNotInDocument,
    /// Nothing to operate on.
    EmptyQuery,
    /// A precondition of an operation was violated.
    ContractViolation,
    /// Snapshot markup was malformed.
    Markup,
}

impl EngineError {
    /// Taxonomy bucket of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::StructuralInvariant(_) => ErrorKind::StructuralInvariantViolation,
            EngineError::RangeNotInDocument => ErrorKind::RangeNotInDocument,
            EngineError::EmptyQuery => ErrorKind::EmptyQuery,
            EngineError::InvalidOffset { .. }
            | EngineError::StopNodeNotAncestor
            | EngineError::StaleNode(_)
            | EngineError::Contract(_) => ErrorKind::ContractViolation,
            EngineError::Markup { .. } => ErrorKind::Markup,
        }
    }
}

/// Sink for recoverable errors.
pub trait ErrorReporter {
    /// Report an error of `kind` with a short description of where it happened.
    fn report(&self, kind: ErrorKind, context: &str);
}

/// Reporter that logs through `tracing` at error level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn report(&self, kind: ErrorKind, context: &str) {
        tracing::error!(?kind, context, "richtext engine error");
    }
}

/// Reporter that drops every report.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentReporter;

impl ErrorReporter for SilentReporter {
    fn report(&self, _kind: ErrorKind, _context: &str) {}
}
