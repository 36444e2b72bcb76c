use std::fmt;

use serde::{Deserialize, Serialize};

use crate::credentials::Credentials;

/// Errors in handshake template construction or patching.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    /// A substitutable region does not lie within the template bytes.
    #[error("{region} region at {offset}..{end} lies outside the {template_len}-byte template")]
    RegionOutOfBounds {
        region: &'static str,
        offset: usize,
        end: usize,
        template_len: usize,
    },

    /// The user-id region has the wrong width for a u64.
    #[error("user id region must be 8 bytes, got {len}")]
    BadUserIdWidth { len: usize },

    /// The access key does not fit its region.
    #[error("access key is {key_len} bytes but its region is {region_len}")]
    AccessKeyTooLong { key_len: usize, region_len: usize },

    /// The template hex in config did not decode.
    #[error("invalid template hex: {0}")]
    Hex(#[from] hex::FromHexError),
}

/// A substitutable byte span within the template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub offset: usize,
    pub len: usize,
}

impl Region {
    fn end(&self) -> Option<usize> {
        self.offset.checked_add(self.len)
    }
}

/// A captured login packet used as the byte-level pattern for new login
/// requests.
///
/// This is the single most fragile assumption in the system: the capture's
/// binary layout is treated as versioned, opaque configuration, valid only
/// for the game client release it was taken from. The template is never
/// mutated; each attempt clones and patches it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TemplateSpec", into = "TemplateSpec")]
pub struct HandshakeTemplate {
    bytes: Vec<u8>,
    user_id: Region,
    access_key: Region,
}

impl HandshakeTemplate {
    /// Build a template, validating that both regions exist within it.
    pub fn new(
        bytes: Vec<u8>,
        user_id: Region,
        access_key: Region,
    ) -> Result<Self, TemplateError> {
        check_region("user id", &user_id, bytes.len())?;
        check_region("access key", &access_key, bytes.len())?;
        if user_id.len != 8 {
            return Err(TemplateError::BadUserIdWidth { len: user_id.len });
        }
        Ok(Self {
            bytes,
            user_id,
            access_key,
        })
    }

    /// Produce the login packet for `creds`: a clone of the capture with the
    /// user id written little-endian into its region and the access key
    /// NUL-padded into its region.
    ///
    /// Patching the same credentials twice yields byte-identical output.
    pub fn patch(&self, creds: &Credentials) -> Result<Vec<u8>, TemplateError> {
        let key = creds.access_key.as_bytes();
        if key.len() > self.access_key.len {
            return Err(TemplateError::AccessKeyTooLong {
                key_len: key.len(),
                region_len: self.access_key.len,
            });
        }

        let mut out = self.bytes.clone();
        out[self.user_id.offset..self.user_id.offset + 8]
            .copy_from_slice(&creds.user_id.to_le_bytes());

        let key_region =
            &mut out[self.access_key.offset..self.access_key.offset + self.access_key.len];
        key_region[..key.len()].copy_from_slice(key);
        key_region[key.len()..].fill(0);

        Ok(out)
    }

    /// Total length of the captured packet.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the capture is empty (never true for a validated template).
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

// The capture doubles as a login credential; don't leak it through logs.
impl fmt::Debug for HandshakeTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandshakeTemplate")
            .field("bytes", &format_args!("<redacted:{} bytes>", self.bytes.len()))
            .field("user_id", &self.user_id)
            .field("access_key", &self.access_key)
            .finish()
    }
}

fn check_region(name: &'static str, region: &Region, template_len: usize) -> Result<(), TemplateError> {
    let out_of_bounds = |end| TemplateError::RegionOutOfBounds {
        region: name,
        offset: region.offset,
        end,
        template_len,
    };
    match region.end() {
        Some(end) if end <= template_len && region.len > 0 => Ok(()),
        Some(end) => Err(out_of_bounds(end)),
        None => Err(out_of_bounds(usize::MAX)),
    }
}

/// Config-file form of the template: hex capture plus the two regions.
#[derive(Clone, Serialize, Deserialize)]
pub struct TemplateSpec {
    /// The captured login packet, hex-encoded.
    pub bytes: String,
    pub user_id: Region,
    pub access_key: Region,
}

impl TryFrom<TemplateSpec> for HandshakeTemplate {
    type Error = TemplateError;

    fn try_from(spec: TemplateSpec) -> Result<Self, TemplateError> {
        let bytes = hex::decode(spec.bytes.trim())?;
        HandshakeTemplate::new(bytes, spec.user_id, spec.access_key)
    }
}

impl From<HandshakeTemplate> for TemplateSpec {
    fn from(template: HandshakeTemplate) -> Self {
        TemplateSpec {
            bytes: hex::encode(&template.bytes),
            user_id: template.user_id,
            access_key: template.access_key,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds(user_id: u64, key: &str) -> Credentials {
        Credentials {
            user_id,
            access_key: key.to_string(),
        }
    }

    fn template() -> HandshakeTemplate {
        // 4-byte header + 8-byte user id + 16-byte key region + 4 trailing.
        let bytes = vec![0xEE; 32];
        HandshakeTemplate::new(
            bytes,
            Region { offset: 4, len: 8 },
            Region { offset: 12, len: 16 },
        )
        .unwrap()
    }

    #[test]
    fn patch_substitutes_both_regions() {
        let patched = template().patch(&creds(0x0102030405060708, "key")).unwrap();

        assert_eq!(&patched[..4], &[0xEE; 4]);
        assert_eq!(&patched[4..12], &0x0102030405060708u64.to_le_bytes());
        assert_eq!(&patched[12..15], b"key");
        assert_eq!(&patched[15..28], &[0u8; 13]);
        assert_eq!(&patched[28..], &[0xEE; 4]);
    }

    #[test]
    fn patch_is_idempotent_per_attempt() {
        let template = template();
        let c = creds(42, "same-key");
        assert_eq!(template.patch(&c).unwrap(), template.patch(&c).unwrap());
    }

    #[test]
    fn patch_does_not_mutate_the_template() {
        let template = template();
        let before = TemplateSpec::from(template.clone()).bytes;
        let _ = template.patch(&creds(1, "a")).unwrap();
        assert_eq!(TemplateSpec::from(template).bytes, before);
    }

    #[test]
    fn key_exactly_filling_region_is_accepted() {
        let patched = template().patch(&creds(1, "0123456789abcdef")).unwrap();
        assert_eq!(&patched[12..28], b"0123456789abcdef");
    }

    #[test]
    fn oversized_key_is_rejected() {
        let err = template()
            .patch(&creds(1, "0123456789abcdef!"))
            .unwrap_err();
        assert!(matches!(
            err,
            TemplateError::AccessKeyTooLong {
                key_len: 17,
                region_len: 16
            }
        ));
    }

    #[test]
    fn region_outside_template_is_rejected_at_construction() {
        let err = HandshakeTemplate::new(
            vec![0u8; 16],
            Region { offset: 4, len: 8 },
            Region { offset: 12, len: 16 },
        )
        .unwrap_err();
        assert!(matches!(
            err,
            TemplateError::RegionOutOfBounds {
                region: "access key",
                end: 28,
                template_len: 16,
                ..
            }
        ));
    }

    #[test]
    fn user_id_region_must_be_u64_wide() {
        let err = HandshakeTemplate::new(
            vec![0u8; 16],
            Region { offset: 0, len: 4 },
            Region { offset: 4, len: 8 },
        )
        .unwrap_err();
        assert!(matches!(err, TemplateError::BadUserIdWidth { len: 4 }));
    }

    #[test]
    fn serde_roundtrip_through_hex_spec() {
        let template = template();
        let json = serde_json::to_string(&template).unwrap();
        assert!(json.contains(&hex::encode(vec![0xEE; 4])));

        let back: HandshakeTemplate = serde_json::from_str(&json).unwrap();
        assert_eq!(back, template);
    }

    #[test]
    fn bad_hex_in_spec_fails_to_deserialize() {
        let result: Result<HandshakeTemplate, _> = serde_json::from_str(
            r#"{"bytes": "zz", "user_id": {"offset": 0, "len": 8}, "access_key": {"offset": 8, "len": 4}}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn debug_never_prints_capture_bytes() {
        let debug = format!("{:?}", template());
        assert!(!debug.contains("ee"));
        assert!(debug.contains("<redacted:32 bytes>"));
    }
}
