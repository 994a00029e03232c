//! Message record shapes.
//!
//! Two layers:
//!
//! - [`RecordDocument`] mirrors what the backing store holds. Every field is
//!   optional because the store enforces no schema and old clients wrote a
//!   different shape.
//! - [`MessageRecord`] is the tagged union readers match on. Converting a
//!   document into it decides the shape once, up front, instead of probing
//!   fields at every use.
//!
//! Current writers only produce [`MessageRecord::Encrypted`]. The legacy
//! plaintext shape is accepted on read for old conversations.

use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};

use crate::{Identity, RecordError};

/// Id the log assigned to a stored record.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Wrap a log-assigned id.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Order key assigned by the log when a record is appended.
///
/// Opaque apart from ordering. Readers never compare it against a local
/// clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServerTimestamp(u64);

impl ServerTimestamp {
    /// Wrap a raw order key.
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw order key.
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Stored record document, as written to and read from the log.
///
/// Binary fields are base64 (standard alphabet, padded). The nonce is stored
/// under `iv`; `nonce` is accepted as an alias on read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordDocument {
    /// Author identity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    /// Recipient identity (encrypted records only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver: Option<String>,
    /// Base64 ciphertext including the GCM tag (encrypted records only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ciphertext: Option<String>,
    /// Base64 nonce (encrypted records only).
    #[serde(default, rename = "iv", alias = "nonce", skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
    /// Plaintext body (legacy records only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RecordDocument {
    /// Parse a JSON document.
    pub fn from_json(json: &str) -> Result<Self, RecordError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String, RecordError> {
        Ok(serde_json::to_string(self)?)
    }

    /// True if the fields required for an encrypted record are all present.
    fn has_encrypted_shape(&self) -> bool {
        [&self.ciphertext, &self.nonce, &self.sender, &self.receiver]
            .into_iter()
            .all(|field| field.as_deref().is_some_and(|value| !value.is_empty()))
    }
}

/// A current-format record: AES-GCM ciphertext for one identity pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedRecord {
    /// Author identity.
    pub sender: Identity,
    /// Recipient identity.
    pub receiver: Identity,
    /// Ciphertext including the GCM tag.
    pub ciphertext: Vec<u8>,
    /// Nonce the ciphertext was sealed under.
    pub nonce: Vec<u8>,
}

impl EncryptedRecord {
    /// Encode into a wire document.
    pub fn to_document(&self) -> RecordDocument {
        RecordDocument {
            sender: Some(self.sender.as_str().to_string()),
            receiver: Some(self.receiver.as_str().to_string()),
            ciphertext: Some(STANDARD.encode(&self.ciphertext)),
            nonce: Some(STANDARD.encode(&self.nonce)),
            message: None,
        }
    }
}

/// A legacy plaintext record. Read-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyRecord {
    /// Author identity, if the document carried one.
    pub sender: Option<Identity>,
    /// Message text, verbatim.
    pub message: String,
}

/// Tagged view of a stored record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageRecord {
    /// Current encrypted shape.
    Encrypted(EncryptedRecord),
    /// Legacy plaintext shape.
    LegacyPlaintext(LegacyRecord),
}

impl TryFrom<&RecordDocument> for MessageRecord {
    type Error = RecordError;

    /// Classify a document.
    ///
    /// The encrypted shape wins when both are present. Empty strings count
    /// as absent.
    fn try_from(doc: &RecordDocument) -> Result<Self, Self::Error> {
        if doc.has_encrypted_shape() {
            let ciphertext = decode_field("ciphertext", doc.ciphertext.as_deref())?;
            let nonce = decode_field("iv", doc.nonce.as_deref())?;

            return Ok(Self::Encrypted(EncryptedRecord {
                sender: verbatim_identity(doc.sender.as_deref()),
                receiver: verbatim_identity(doc.receiver.as_deref()),
                ciphertext,
                nonce,
            }));
        }

        match doc.message.as_deref() {
            Some(message) if !message.is_empty() => Ok(Self::LegacyPlaintext(LegacyRecord {
                sender: doc
                    .sender
                    .as_deref()
                    .filter(|sender| !sender.is_empty())
                    .map(|sender| verbatim_identity(Some(sender))),
                message: message.to_string(),
            })),
            _ => Err(RecordError::UnrecognizedShape),
        }
    }
}

impl From<&EncryptedRecord> for RecordDocument {
    fn from(record: &EncryptedRecord) -> Self {
        record.to_document()
    }
}

/// A record as delivered by the log: document plus log-assigned metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Log-assigned id.
    pub id: RecordId,
    /// Log-assigned order key.
    pub timestamp: ServerTimestamp,
    /// Stored document.
    pub document: RecordDocument,
}

impl LogEntry {
    /// Decode the document into its tagged shape.
    pub fn record(&self) -> Result<MessageRecord, RecordError> {
        MessageRecord::try_from(&self.document)
    }
}

fn decode_field(field: &'static str, value: Option<&str>) -> Result<Vec<u8>, RecordError> {
    STANDARD
        .decode(value.unwrap_or_default())
        .map_err(|e| RecordError::Base64 { field, reason: e.to_string() })
}

/// Stored identities are kept as written; they were normalized by the writer.
fn verbatim_identity(value: Option<&str>) -> Identity {
    Identity::verbatim(value.unwrap_or_default())
}
