//! Error types for tract configuration and processing.

use thiserror::Error;

/// Result type for tract operations.
pub type TractResult<T> = Result<T, TractError>;

/// Errors surfaced by configuration and block processing.
///
/// All of them are local validation failures raised before any wave state is
/// touched, so a rejected call always leaves the tract as it was.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TractError {
    /// A diameter, area or index that cannot describe a physical tube.
    #[error("invalid geometry at {what}: {value}")]
    InvalidGeometry {
        /// Which quantity was rejected.
        what: &'static str,
        /// The rejected value.
        value: f32,
    },

    /// A coefficient that would make the recurrence non-decaying.
    #[error("unstable configuration: {what} = {value} (magnitude must stay below 1)")]
    UnstableConfiguration {
        /// Which coefficient was rejected.
        what: &'static str,
        /// The rejected value.
        value: f32,
    },

    /// Input or output buffers that disagree in length.
    #[error(
        "buffer length mismatch: excitation {excitation}, noise {noise}, expected {expected}"
    )]
    BufferLengthMismatch {
        /// Length of the excitation buffer.
        excitation: usize,
        /// Length of the noise buffer.
        noise: usize,
        /// Length required by the call (block size or output length).
        expected: usize,
    },
}

impl TractError {
    /// Creates an invalid geometry error.
    pub(crate) fn geometry(what: &'static str, value: f32) -> Self {
        Self::InvalidGeometry { what, value }
    }

    /// Creates an unstable configuration error.
    pub(crate) fn unstable(what: &'static str, value: f32) -> Self {
        Self::UnstableConfiguration { what, value }
    }
}
