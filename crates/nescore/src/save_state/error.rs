//! Save state error types.

use thiserror::Error;

/// Save state operation error.
#[derive(Debug, Error)]
pub enum SaveStateError {
    /// Invalid magic bytes (expected [`super::SAVE_STATE_MAGIC`]).
    #[error("invalid save state magic bytes")]
    InvalidMagic,

    /// Unsupported format version.
    #[error("unsupported save state version: {0} (current: {})", super::SAVE_STATE_VERSION)]
    UnsupportedVersion(u32),

    /// Checksum mismatch, indicating corrupted or truncated data.
    #[error("checksum mismatch: expected {expected:08x}, got {actual:08x}")]
    ChecksumMismatch {
        /// Checksum recorded in the header.
        expected: u32,
        /// Checksum computed over the payload.
        actual: u32,
    },

    /// Buffer shorter than the header alone requires.
    #[error("insufficient data: need {needed} bytes, got {available}")]
    InsufficientData {
        /// Bytes needed.
        needed: usize,
        /// Bytes available.
        available: usize,
    },

    /// The payload failed to decode once the header and checksum checked out.
    #[error("save state payload could not be decoded")]
    Decode,
}
