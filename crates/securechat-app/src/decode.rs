//! Turning delivered log entries into display messages.
//!
//! Encrypted records are opened with the key of their own sender/receiver
//! pair, never the reading session's pair, so a batch decodes the same way
//! for both participants. Legacy records pass through without touching the
//! cipher.

use securechat_core::{Identity, LogEntry, MessageRecord, RecordError};
use securechat_crypto::{DECRYPTION_FAILED, open_text};

use crate::{ChatConfig, DecodedMessage, MessageId};

/// Decode a delivered batch, preserving its order.
///
/// Entries of unrecognized shape are dropped. Every other entry yields
/// exactly one message.
pub fn decode_batch(entries: &[LogEntry], config: &ChatConfig) -> Vec<DecodedMessage> {
    entries.iter().filter_map(|entry| decode_entry(entry, config)).collect()
}

/// Decode one entry. `None` if it matches no known record shape.
pub fn decode_entry(entry: &LogEntry, config: &ChatConfig) -> Option<DecodedMessage> {
    let (sender, text) = match entry.record() {
        Ok(MessageRecord::Encrypted(record)) => {
            let text = open_text(
                &record.ciphertext,
                &record.nonce,
                record.sender.as_str(),
                record.receiver.as_str(),
            );
            if text == DECRYPTION_FAILED {
                tracing::warn!(record = %entry.id, sender = %record.sender, "decryption failed");
            }
            (record.sender, text)
        },
        Ok(MessageRecord::LegacyPlaintext(record)) => {
            (record.sender.unwrap_or_else(|| config.unknown_sender.clone()), record.message)
        },
        Err(err @ RecordError::Base64 { .. }) => {
            tracing::warn!(record = %entry.id, error = %err, "corrupt encrypted payload");
            let sender = Identity::verbatim(entry.document.sender.clone().unwrap_or_default());
            (sender, DECRYPTION_FAILED.to_string())
        },
        Err(err) => {
            tracing::warn!(record = %entry.id, error = %err, "skipping record");
            return None;
        },
    };

    Some(DecodedMessage {
        id: MessageId::Record(entry.id.clone()),
        sender,
        text,
        timestamp: Some(entry.timestamp),
    })
}
