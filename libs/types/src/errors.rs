//! Error types for identifier parsing and marking encoding

use thiserror::Error;

/// Errors raised while building identifiers or markings from external input
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentifierError {
    /// Input was not valid hexadecimal
    #[error("Invalid hex string '{input}': {reason}")]
    InvalidHex { input: String, reason: String },

    /// Decoded byte length does not match the identifier width
    #[error("Invalid identifier length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    /// Bucket id does not fit in the 12-bit marking field
    #[error("Bucket id {bucket} exceeds maximum {max}")]
    BucketOutOfRange { bucket: u16, max: u16 },
}
