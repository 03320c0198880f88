//! Persisted identity credential

use serde::{Deserialize, Serialize};

/// Identity link persisted by the extension's key-value store
///
/// Field names on the wire match the storage keys the widget already uses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    #[serde(rename = "twitterId", default)]
    pub identity_id: String,
    #[serde(rename = "token", default)]
    pub access_token: String,
    #[serde(rename = "refreshToken", default)]
    pub refresh_token: String,
}

impl Credential {
    pub fn new(
        identity_id: impl Into<String>,
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
    ) -> Self {
        Self {
            identity_id: identity_id.into(),
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }

    /// No tokens at all: the user never logged in or the session was cleared
    pub fn is_empty(&self) -> bool {
        self.access_token.is_empty() && self.refresh_token.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_empty() {
        assert!(Credential::default().is_empty());
        assert!(!Credential::new("42", "", "r").is_empty());
    }

    #[test]
    fn test_storage_keys() {
        let json = serde_json::to_value(Credential::new("42", "a", "r")).unwrap();
        assert_eq!(json["twitterId"], "42");
        assert_eq!(json["token"], "a");
        assert_eq!(json["refreshToken"], "r");

        let partial: Credential = serde_json::from_str(r#"{"twitterId":"7"}"#).unwrap();
        assert_eq!(partial, Credential::new("7", "", ""));
    }
}
