//! Error types for quadpatch.
//!
//! This module defines all error types used throughout the library. Note that
//! "no pattern fits this cavity" is not an error: matchers report it as `None`.

use thiserror::Error;

/// Result type alias using [`PatternError`].
pub type Result<T> = std::result::Result<T, PatternError>;

/// Errors that can occur while building patterns or remeshing cavities.
#[derive(Error, Debug)]
pub enum PatternError {
    /// The pattern has no quads.
    #[error("pattern has no quads")]
    EmptyPattern,

    /// A quad repeats one of its vertices.
    #[error("quad {quad} is degenerate (has duplicate vertices)")]
    DegenerateQuad {
        /// The quad index.
        quad: usize,
    },

    /// Opposite-edge propagation reached a quad that does not contain the edge.
    #[error("chord propagation failed: quad {quad} does not contain edge {edge}")]
    ChordPropagation {
        /// The edge being propagated from.
        edge: usize,
        /// The quad that was expected to contain it.
        quad: usize,
    },

    /// The boundary walk found no continuation edge.
    #[error("boundary walk stuck at vertex {vertex}: no outgoing boundary edge")]
    BoundaryWalk {
        /// The vertex where the walk stopped.
        vertex: usize,
    },

    /// The pattern boundary has no corner vertex, so it has no sides.
    #[error("pattern boundary has no corner vertex")]
    NoCorner,

    /// A disk quadrangulation record could not be parsed.
    #[error("malformed disk quadrangulation record on line {line}: {reason}")]
    MalformedRecord {
        /// 1-based line number in the source text.
        line: usize,
        /// Description of the problem.
        reason: String,
    },

    /// The cavity and the pattern have a different number of sides.
    #[error("side count mismatch: pattern has {pattern} sides, cavity has {cavity}")]
    SideCountMismatch {
        /// Number of pattern sides.
        pattern: usize,
        /// Number of cavity sides.
        cavity: usize,
    },

    /// A cavity side does not have the vertex count the quantization requires.
    #[error("side {side} has {actual} vertices but the quantization requires {expected}")]
    SideLengthMismatch {
        /// The side index (after orientation).
        side: usize,
        /// Vertex count implied by the quantization.
        expected: usize,
        /// Vertex count of the cavity side.
        actual: usize,
    },

    /// No vertex run was built for a pattern edge.
    #[error("no vertex run for pattern edge ({v0}, {v1})")]
    MissingVertexRun {
        /// First pattern vertex of the edge.
        v0: usize,
        /// Second pattern vertex of the edge.
        v1: usize,
    },

    /// An internal consistency check failed.
    #[error("internal invariant violated: {0}")]
    InvariantViolation(String),

    /// The cavity boundary description is unusable.
    #[error("invalid cavity: {0}")]
    InvalidCavity(String),

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Unsupported output format.
    #[error("unsupported file format: {extension}")]
    UnsupportedFormat {
        /// The file extension.
        extension: String,
    },

    /// Invalid parameter value.
    #[error("invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// The invalid value (as string).
        value: String,
        /// Reason the value is invalid.
        reason: &'static str,
    },
}

impl PatternError {
    /// Create an invalid parameter error.
    pub fn invalid_param<T: std::fmt::Display>(
        name: &'static str,
        value: T,
        reason: &'static str,
    ) -> Self {
        PatternError::InvalidParameter {
            name,
            value: value.to_string(),
            reason,
        }
    }

    /// Whether this error describes a malformed catalog entry rather than a
    /// problem with the caller's cavity.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            PatternError::EmptyPattern
                | PatternError::DegenerateQuad { .. }
                | PatternError::ChordPropagation { .. }
                | PatternError::BoundaryWalk { .. }
                | PatternError::NoCorner
        )
    }
}
