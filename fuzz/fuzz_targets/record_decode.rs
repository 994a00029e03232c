//! Fuzz target for stored record decoding
//!
//! Feeds arbitrary JSON through `RecordDocument::from_json` and the display
//! decoder with:
//! - Missing, empty, or non-string fields
//! - Invalid base64 in `ciphertext` and `iv`
//! - Encrypted and legacy fields mixed in one document
//!
//! The fuzzer should NEVER panic. Unknown shapes are skipped, corrupt
//! payloads render as a sentinel.

#![no_main]

use libfuzzer_sys::fuzz_target;
use securechat_app::{ChatConfig, decode_entry};
use securechat_core::{LogEntry, RecordDocument, RecordId, ServerTimestamp};

fuzz_target!(|data: &[u8]| {
    let Ok(json) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(document) = RecordDocument::from_json(json) else {
        return;
    };

    let entry = LogEntry { id: RecordId::new("fuzz"), timestamp: ServerTimestamp::new(1), document };
    let config = ChatConfig::default();

    if let Some(message) = decode_entry(&entry, &config) {
        assert_eq!(message.timestamp, Some(entry.timestamp));
        assert!(!message.is_local_only());
    }

    // Re-encoding a parsed document must parse back to the same document
    if let Ok(json) = entry.document.to_json() {
        assert_eq!(RecordDocument::from_json(&json).ok(), Some(entry.document));
    }
});
