use crate::error::{Result, WireError};
use crate::schema::{FieldKind, FieldSpec};

/// A decoded field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    UInt(u64),
    Text(String),
    Bytes(Vec<u8>),
}

impl FieldValue {
    /// The value as an unsigned integer, if it is one.
    pub fn as_uint(&self) -> Option<u64> {
        match self {
            FieldValue::UInt(v) => Some(*v),
            _ => None,
        }
    }

    /// Consume the value as text, if it is text.
    pub fn into_text(self) -> Option<String> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl FieldSpec {
    /// Read this field from `span`.
    ///
    /// `field` names the field in errors; `span` is the payload or record
    /// the offset is relative to. Every access is bounds-checked: a span
    /// that does not contain the field fails `MalformedPayload`, it never
    /// reads adjacent bytes.
    pub fn read(&self, span: &[u8], field: &str) -> Result<FieldValue> {
        match self.kind {
            FieldKind::U16 => Ok(FieldValue::UInt(u64::from(u16::from_le_bytes(
                take_array(span, self.offset, field)?,
            )))),
            FieldKind::U32 => Ok(FieldValue::UInt(u64::from(u32::from_le_bytes(
                take_array(span, self.offset, field)?,
            )))),
            FieldKind::U64 => Ok(FieldValue::UInt(u64::from_le_bytes(take_array(
                span,
                self.offset,
                field,
            )?))),
            FieldKind::Text { len } => {
                let raw = take_span(span, self.offset, len, field)?;
                Ok(FieldValue::Text(normalize_text(raw)))
            }
            FieldKind::PrefixedText => {
                let len =
                    u16::from_le_bytes(take_array(span, self.offset, field)?) as usize;
                let raw = take_span(span, self.offset + 2, len, field)?;
                Ok(FieldValue::Text(normalize_text(raw)))
            }
            FieldKind::Bytes { len } => {
                let raw = take_span(span, self.offset, len, field)?;
                Ok(FieldValue::Bytes(raw.to_vec()))
            }
        }
    }
}

fn take_array<const N: usize>(span: &[u8], offset: usize, field: &str) -> Result<[u8; N]> {
    let raw = take_span(span, offset, N, field)?;
    let mut out = [0u8; N];
    out.copy_from_slice(raw);
    Ok(out)
}

fn take_span<'a>(span: &'a [u8], offset: usize, len: usize, field: &str) -> Result<&'a [u8]> {
    let end = offset.checked_add(len).ok_or_else(|| out_of_bounds(span, offset, len, field))?;
    if end > span.len() {
        return Err(out_of_bounds(span, offset, len, field));
    }
    Ok(&span[offset..end])
}

fn out_of_bounds(span: &[u8], offset: usize, len: usize, field: &str) -> WireError {
    WireError::MalformedPayload {
        field: field.to_string(),
        offset,
        len,
        payload_len: span.len(),
    }
}

/// Trim at the first NUL and normalize to UTF-8.
///
/// Fixed-width text spans on the wire are NUL-padded; non-UTF-8 bytes are
/// replaced rather than rejected, since client locales vary.
fn normalize_text(raw: &[u8]) -> String {
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    String::from_utf8_lossy(&raw[..end]).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_little_endian_integers() {
        let span = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];

        let v = FieldSpec::new(0, FieldKind::U16).read(&span, "f").unwrap();
        assert_eq!(v.as_uint(), Some(0x0201));

        let v = FieldSpec::new(0, FieldKind::U32).read(&span, "f").unwrap();
        assert_eq!(v.as_uint(), Some(0x0403_0201));

        let v = FieldSpec::new(0, FieldKind::U64).read(&span, "f").unwrap();
        assert_eq!(v.as_uint(), Some(0x0807_0605_0403_0201));
    }

    #[test]
    fn text_is_nul_trimmed() {
        let mut span = [0u8; 16];
        span[..5].copy_from_slice(b"Alice");

        let v = FieldSpec::new(0, FieldKind::Text { len: 16 })
            .read(&span, "sender")
            .unwrap();
        assert_eq!(v.into_text().as_deref(), Some("Alice"));
    }

    #[test]
    fn text_without_padding_uses_full_span() {
        let v = FieldSpec::new(0, FieldKind::Text { len: 2 })
            .read(b"hi there", "text")
            .unwrap();
        assert_eq!(v.into_text().as_deref(), Some("hi"));
    }

    #[test]
    fn invalid_utf8_is_replaced_not_rejected() {
        let span = [0xC3, 0x28, 0x00, 0x00];
        let v = FieldSpec::new(0, FieldKind::Text { len: 4 })
            .read(&span, "text")
            .unwrap();
        assert_eq!(v.into_text().as_deref(), Some("\u{FFFD}("));
    }

    #[test]
    fn prefixed_text_reads_declared_length() {
        let mut span = vec![0x05, 0x00];
        span.extend_from_slice(b"hello-extra");

        let v = FieldSpec::new(0, FieldKind::PrefixedText)
            .read(&span, "text")
            .unwrap();
        assert_eq!(v.into_text().as_deref(), Some("hello"));
    }

    #[test]
    fn prefixed_text_length_beyond_span_is_malformed() {
        let span = [0xFF, 0x00, b'x'];
        let err = FieldSpec::new(0, FieldKind::PrefixedText)
            .read(&span, "text")
            .unwrap_err();
        assert!(matches!(
            err,
            WireError::MalformedPayload { field, offset: 2, len: 255, payload_len: 3 } if field == "text"
        ));
    }

    #[test]
    fn out_of_range_offset_is_malformed() {
        let span = [0u8; 4];
        let err = FieldSpec::new(2, FieldKind::U32).read(&span, "seq").unwrap_err();
        assert!(matches!(
            err,
            WireError::MalformedPayload { offset: 2, len: 4, payload_len: 4, .. }
        ));
    }

    #[test]
    fn huge_offset_does_not_overflow() {
        let span = [0u8; 4];
        let err = FieldSpec::new(usize::MAX, FieldKind::Bytes { len: 2 })
            .read(&span, "blob")
            .unwrap_err();
        assert!(matches!(err, WireError::MalformedPayload { .. }));
    }

    #[test]
    fn bytes_span_is_copied() {
        let span = [1u8, 2, 3, 4];
        let v = FieldSpec::new(1, FieldKind::Bytes { len: 2 })
            .read(&span, "blob")
            .unwrap();
        assert_eq!(v, FieldValue::Bytes(vec![2, 3]));
    }
}
