//! Property-based tests for conversation ids and record classification.

use proptest::prelude::*;
use securechat_core::{
    ConversationId, EncryptedRecord, Identity, MessageRecord, RecordDocument, RecordError,
};

fn identity() -> impl Strategy<Value = Identity> {
    "[a-z0-9]{0,12}".prop_map(Identity::new)
}

proptest! {
    #[test]
    fn prop_conversation_id_is_symmetric(a in identity(), b in identity()) {
        prop_assert_eq!(ConversationId::between(&a, &b), ConversationId::between(&b, &a));
    }

    #[test]
    fn prop_conversation_id_is_injective(
        a in identity(),
        b in identity(),
        c in identity(),
        d in identity(),
    ) {
        // Identities without the separator never share a partition with a
        // different pair.
        let same_pair = (a == c && b == d) || (a == d && b == c);
        let id1 = ConversationId::between(&a, &b);
        let id2 = ConversationId::between(&c, &d);
        prop_assert_eq!(id1 == id2, same_pair);
    }

    #[test]
    fn prop_encrypted_record_survives_the_wire(
        sender in "[a-z]{1,8}",
        receiver in "[a-z]{1,8}",
        ciphertext in prop::collection::vec(any::<u8>(), 1..64),
        nonce in prop::collection::vec(any::<u8>(), 1..16),
    ) {
        let record = EncryptedRecord {
            sender: Identity::new(&sender),
            receiver: Identity::new(&receiver),
            ciphertext,
            nonce,
        };

        let json = record.to_document().to_json().unwrap();
        let doc = RecordDocument::from_json(&json).unwrap();
        prop_assert_eq!(MessageRecord::try_from(&doc), Ok(MessageRecord::Encrypted(record)));
    }

    #[test]
    fn prop_documents_without_body_are_unrecognized(
        sender in proptest::option::of("[a-z]{0,8}"),
        receiver in proptest::option::of("[a-z]{0,8}"),
    ) {
        let doc = RecordDocument { sender, receiver, ..RecordDocument::default() };
        prop_assert_eq!(MessageRecord::try_from(&doc), Err(RecordError::UnrecognizedShape));
    }
}
