//! Record decoding errors.
//!
//! A document read from the log either maps onto one of the known record
//! shapes or it does not. The two failure modes are treated differently by
//! readers: an unrecognized shape is skipped, while a corrupt payload inside
//! an otherwise valid encrypted record is still shown (as a sentinel).

use thiserror::Error;

/// Errors that can occur when decoding a stored record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// Document matches neither the encrypted nor the legacy shape
    #[error("unrecognized record shape")]
    UnrecognizedShape,

    /// An encrypted record's binary field is not valid base64
    #[error("invalid base64 in field {field}: {reason}")]
    Base64 {
        /// Field that failed to decode
        field: &'static str,
        /// Decoder error message
        reason: String,
    },

    /// Document is not valid JSON for the record schema
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl RecordError {
    /// Returns true if the record has an encrypted shape but a corrupt
    /// payload.
    ///
    /// Such records are surfaced with a failure placeholder rather than
    /// silently dropped, so a reader can see that a message existed.
    pub fn is_corrupt_payload(&self) -> bool {
        matches!(self, Self::Base64 { .. })
    }
}

impl From<serde_json::Error> for RecordError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base64_errors_are_corrupt_payloads() {
        let err = RecordError::Base64 { field: "iv", reason: "bad padding".to_string() };
        assert!(err.is_corrupt_payload());
    }

    #[test]
    fn unknown_shapes_are_not_corrupt_payloads() {
        assert!(!RecordError::UnrecognizedShape.is_corrupt_payload());
        assert!(!RecordError::Serialization("eof".to_string()).is_corrupt_payload());
    }

    #[test]
    fn error_display() {
        let err = RecordError::Base64 { field: "ciphertext", reason: "bad".to_string() };
        assert_eq!(err.to_string(), "invalid base64 in field ciphertext: bad");
    }
}
