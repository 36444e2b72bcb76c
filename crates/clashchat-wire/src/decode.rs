use clashchat_frame::Frame;
use serde::Serialize;
use tracing::trace;

use crate::error::{Result, WireError};
use crate::schema::{ChatSchema, FieldKind};

/// A decoded broadcast chat message.
///
/// Produced by the decoder and handed straight to the dispatch callback; the
/// protocol core keeps no history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatEvent {
    /// Sender display name, encoding-normalized.
    pub sender: String,
    /// Numeric sender id, when the layout carries one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender_id: Option<u64>,
    /// Message body, encoding-normalized.
    pub text: String,
    /// Server timestamp, when the layout carries one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
}

/// Outcome of dispatching one frame through the wire schema.
///
/// Unknown discriminators are a variant, not an error: the captured protocol
/// surface is necessarily incomplete, and skipping what we cannot name keeps
/// the session alive without misinterpreting anything.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// A broadcast-chat frame and its messages.
    Chat(Vec<ChatEvent>),
    /// A frame whose discriminator matches nothing in the schema.
    Unrecognized { message_id: u16 },
}

/// Maps frame discriminators onto decode strategies.
#[derive(Debug, Clone)]
pub struct FrameDecoder {
    chat: ChatSchema,
}

impl FrameDecoder {
    /// Build a decoder over a chat layout.
    pub fn new(chat: ChatSchema) -> Self {
        Self { chat }
    }

    /// Decode one frame.
    ///
    /// Fails only with [`WireError`] on a recognized frame whose payload does
    /// not match its layout; callers treat that as one corrupt message, not a
    /// dead session.
    pub fn decode(&self, frame: &Frame) -> Result<Decoded> {
        if frame.message_id == self.chat.message_id {
            let events = decode_chat(frame.payload.as_ref(), &self.chat)?;
            return Ok(Decoded::Chat(events));
        }

        trace!(message_id = format_args!("{:#06x}", frame.message_id), "unrecognized frame");
        Ok(Decoded::Unrecognized {
            message_id: frame.message_id,
        })
    }

    /// The chat layout this decoder was built with.
    pub fn chat_schema(&self) -> &ChatSchema {
        &self.chat
    }
}

/// Decode a payload known to be broadcast chat.
///
/// Handles both single-record frames and the counted-batch form; a count
/// that implies records beyond the payload is malformed, decoded before any
/// record is touched.
pub fn decode_chat(payload: &[u8], schema: &ChatSchema) -> Result<Vec<ChatEvent>> {
    if schema.record_len == 0 {
        return Err(WireError::InvalidSchema {
            reason: "chat record_len must be non-zero".to_string(),
        });
    }

    let count = match &schema.count {
        None => 1,
        Some(spec) => {
            if !matches!(spec.kind, FieldKind::U16 | FieldKind::U32 | FieldKind::U64) {
                return Err(WireError::InvalidSchema {
                    reason: "chat count field must be an integer kind".to_string(),
                });
            }
            spec.read(payload, "count")?
                .as_uint()
                .unwrap_or(0) as usize
        }
    };

    // Bound the batch against the payload before allocating anything.
    let available = payload.len().saturating_sub(schema.records_offset);
    if count.checked_mul(schema.record_len).is_none_or(|total| total > available) {
        return Err(WireError::MalformedPayload {
            field: "records".to_string(),
            offset: schema.records_offset,
            len: count.saturating_mul(schema.record_len),
            payload_len: payload.len(),
        });
    }

    let mut events = Vec::with_capacity(count);
    for i in 0..count {
        let start = schema.records_offset + i * schema.record_len;
        let record = &payload[start..start + schema.record_len];

        let sender = schema
            .sender
            .read(record, "sender")?
            .into_text()
            .ok_or_else(|| WireError::InvalidSchema {
                reason: "chat sender field must be a text kind".to_string(),
            })?;
        let text = schema
            .text
            .read(record, "text")?
            .into_text()
            .ok_or_else(|| WireError::InvalidSchema {
                reason: "chat text field must be a text kind".to_string(),
            })?;
        let sender_id = match &schema.sender_id {
            Some(spec) => spec.read(record, "sender_id")?.as_uint(),
            None => None,
        };
        let timestamp = match &schema.timestamp {
            Some(spec) => spec.read(record, "timestamp")?.as_uint(),
            None => None,
        };

        events.push(ChatEvent {
            sender,
            sender_id,
            text,
            timestamp,
        });
    }

    Ok(events)
}
