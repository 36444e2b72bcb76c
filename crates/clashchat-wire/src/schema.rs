use serde::{Deserialize, Serialize};

/// How a field's bytes are interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldKind {
    /// Little-endian u16.
    U16,
    /// Little-endian u32.
    U32,
    /// Little-endian u64.
    U64,
    /// Fixed-width text span, NUL-padded on the wire.
    Text { len: usize },
    /// Little-endian u16 length prefix followed by that many text bytes.
    PrefixedText,
    /// Raw byte span.
    Bytes { len: usize },
}

/// One field inside a payload or record: where it starts and what it is.
///
/// Offsets are relative to the enclosing span: the payload for top-level
/// fields, the record for per-record fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub offset: usize,
    #[serde(flatten)]
    pub kind: FieldKind,
}

impl FieldSpec {
    /// Shorthand constructor.
    pub fn new(offset: usize, kind: FieldKind) -> Self {
        Self { offset, kind }
    }
}

/// Layout of a broadcast-chat frame.
///
/// The game server delivers chat as a counted batch (`count` records of
/// `record_len` bytes starting at `records_offset`); a schema with `count`
/// absent describes a single-record frame whose fields sit directly at
/// `records_offset`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatSchema {
    /// Frame discriminator for broadcast chat.
    pub message_id: u16,
    /// Record-count field, payload-relative. Absent means exactly one record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<FieldSpec>,
    /// Byte offset where records begin, payload-relative.
    pub records_offset: usize,
    /// Stride of one chat record in bytes.
    pub record_len: usize,
    /// Sender display name, record-relative.
    pub sender: FieldSpec,
    /// Numeric sender id, record-relative.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_id: Option<FieldSpec>,
    /// Message body, record-relative.
    pub text: FieldSpec,
    /// Server timestamp, record-relative, when the layout carries one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<FieldSpec>,
}

/// Handshake reply signatures.
///
/// The accept/reject message ids come from the same capture session as the
/// handshake template; a reply matching neither is classified as unexpected
/// rather than guessed at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplySchema {
    /// Message id of a handshake-acceptance reply.
    pub accept_id: u16,
    /// Message id of an active refusal, when one has been observed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reject_id: Option<u16>,
    /// Field within a refusal payload carrying the server's reason code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reject_reason: Option<FieldSpec>,
}

/// The complete externally supplied wire layout, versioned by game client
/// release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireSchema {
    /// Handshake reply signatures.
    pub reply: ReplySchema,
    /// Broadcast-chat frame layout.
    pub chat: ChatSchema,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_spec_json_shape() {
        let spec = FieldSpec::new(20, FieldKind::Text { len: 32 });
        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"offset": 20, "kind": "text", "len": 32})
        );

        let back: FieldSpec = serde_json::from_value(json).unwrap();
        assert_eq!(back, spec);
    }

    #[test]
    fn chat_schema_roundtrips_with_optional_fields_absent() {
        let schema = ChatSchema {
            message_id: 0x03f6,
            count: None,
            records_offset: 0,
            record_len: 64,
            sender: FieldSpec::new(0, FieldKind::Text { len: 32 }),
            sender_id: None,
            text: FieldSpec::new(32, FieldKind::Text { len: 32 }),
            timestamp: None,
        };

        let json = serde_json::to_string(&schema).unwrap();
        assert!(!json.contains("count"));
        assert!(!json.contains("timestamp"));

        let back: ChatSchema = serde_json::from_str(&json).unwrap();
        assert_eq!(back, schema);
    }

    #[test]
    fn wire_schema_parses_from_config_json() {
        let json = r#"{
            "reply": {"accept_id": 504},
            "chat": {
                "message_id": 1014,
                "count": {"offset": 4, "kind": "u64"},
                "records_offset": 12,
                "record_len": 184,
                "sender": {"offset": 20, "kind": "text", "len": 32},
                "sender_id": {"offset": 0, "kind": "u64"},
                "text": {"offset": 52, "kind": "text", "len": 128}
            }
        }"#;

        let schema: WireSchema = serde_json::from_str(json).unwrap();
        assert_eq!(schema.reply.accept_id, 0x01f8);
        assert_eq!(schema.reply.reject_id, None);
        assert_eq!(schema.chat.message_id, 0x03f6);
        assert_eq!(schema.chat.record_len, 184);
    }
}
