/// Errors that can occur while decoding payload fields.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// A field's span falls outside the payload.
    ///
    /// Decoding never reads adjacent memory; an out-of-range offset is a
    /// corrupt message (or a stale schema), reported with enough context to
    /// tell which.
    #[error(
        "malformed payload: field `{field}` at offset {offset} (len {len}) out of bounds for {payload_len}-byte payload"
    )]
    MalformedPayload {
        field: String,
        offset: usize,
        len: usize,
        payload_len: usize,
    },

    /// The schema itself is unusable (wrong field kind, zero record stride).
    #[error("invalid wire schema: {reason}")]
    InvalidSchema { reason: String },
}

pub type Result<T> = std::result::Result<T, WireError>;
