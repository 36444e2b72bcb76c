use std::fmt;

use serde::{Deserialize, Serialize};

/// Session credentials extracted from a captured login.
///
/// The protocol treats both values as opaque: the user id is echoed into the
/// handshake template's user-id region, the access key into its key region.
/// Immutable once loaded.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Numeric account identifier.
    pub user_id: u64,
    /// Opaque bearer token authenticating the session.
    /// Secret material: redacted in debug output, never logged.
    pub access_key: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user_id", &self.user_id)
            .field(
                "access_key",
                &format_args!("<redacted:{} bytes>", self.access_key.len()),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_access_key() {
        let creds = Credentials {
            user_id: 77,
            access_key: "super-secret-token".to_string(),
        };
        let debug = format!("{creds:?}");
        assert!(!debug.contains("super-secret-token"));
        assert!(debug.contains("<redacted:18 bytes>"));
        assert!(debug.contains("77"));
    }

    #[test]
    fn deserializes_from_config_json() {
        let creds: Credentials =
            serde_json::from_str(r#"{"user_id": 123456789, "access_key": "abc"}"#).unwrap();
        assert_eq!(creds.user_id, 123_456_789);
        assert_eq!(creds.access_key, "abc");
    }
}
