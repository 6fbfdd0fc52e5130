use {
    chrono::{DateTime, Utc},
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// One bridged channel: a local channel and the remote channel it mirrors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelLink {
    pub local_team_id: String,
    pub local_channel_id: String,
    pub remote_team_id: String,
    pub remote_channel_id: String,
}

/// Authorization token for a remote user.
///
/// Serialized as the JSON object the host plugin has always written
/// (`access_token`, `token_type`, `refresh_token`, `expiry`), so rows left by
/// an earlier deployment still decode.
#[derive(Clone, Serialize, Deserialize)]
pub struct OAuthToken {
    #[serde(default = "empty_secret", serialize_with = "serialize_secret")]
    pub access_token: Secret<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    #[serde(
        default,
        serialize_with = "serialize_option_secret",
        skip_serializing_if = "Option::is_none"
    )]
    pub refresh_token: Option<Secret<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
}

impl OAuthToken {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: Secret::new(access_token.into()),
            token_type: None,
            refresh_token: None,
            expiry: None,
        }
    }

    #[must_use]
    pub fn with_token_type(mut self, token_type: impl Into<String>) -> Self {
        self.token_type = Some(token_type.into());
        self
    }

    #[must_use]
    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(Secret::new(refresh_token.into()));
        self
    }

    #[must_use]
    pub fn with_expiry(mut self, expiry: DateTime<Utc>) -> Self {
        self.expiry = Some(expiry);
        self
    }

    /// Encode for the `token` column.
    pub(crate) fn to_blob(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Decode a `token` column value. An empty blob means "no token".
    pub(crate) fn from_blob(blob: &str) -> crate::Result<Option<Self>> {
        if blob.is_empty() {
            return Ok(None);
        }
        serde_json::from_str(blob)
            .map(Some)
            .map_err(|source| crate::Error::TokenDecode { source })
    }
}

impl std::fmt::Debug for OAuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthToken")
            .field("access_token", &"[REDACTED]")
            .field("token_type", &self.token_type)
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("expiry", &self.expiry)
            .finish()
    }
}

impl PartialEq for OAuthToken {
    fn eq(&self, other: &Self) -> bool {
        self.access_token.expose_secret() == other.access_token.expose_secret()
            && self.token_type == other.token_type
            && self.refresh_token.as_ref().map(|s| s.expose_secret())
                == other.refresh_token.as_ref().map(|s| s.expose_secret())
            && self.expiry == other.expiry
    }
}

/// A bridged user and the token the bridge acts with on their behalf.
#[derive(Debug, Clone, PartialEq)]
pub struct UserIdentity {
    pub local_user_id: String,
    pub remote_user_id: String,
    pub token: Option<OAuthToken>,
}

fn empty_secret() -> Secret<String> {
    Secret::new(String::new())
}

fn serialize_secret<S: serde::Serializer>(
    secret: &Secret<String>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

fn serialize_option_secret<S: serde::Serializer>(
    secret: &Option<Secret<String>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match secret {
        Some(s) => serializer.serialize_some(s.expose_secret()),
        None => serializer.serialize_none(),
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, chrono::TimeZone};

    #[test]
    fn empty_blob_is_no_token() {
        assert!(OAuthToken::from_blob("").unwrap().is_none());
    }

    #[test]
    fn malformed_blob_is_decode_error() {
        let err = OAuthToken::from_blob("{not json").unwrap_err();
        assert!(matches!(err, crate::Error::TokenDecode { .. }));
    }

    #[test]
    fn decodes_legacy_go_token() {
        let blob = r#"{"access_token":"at-1","token_type":"Bearer","refresh_token":"rt-1","expiry":"2023-05-01T10:00:00.5+02:00"}"#;
        let token = OAuthToken::from_blob(blob).unwrap().unwrap();
        assert_eq!(token.access_token.expose_secret(), "at-1");
        assert_eq!(token.token_type.as_deref(), Some("Bearer"));
        assert_eq!(
            token.refresh_token.as_ref().map(|s| s.expose_secret().as_str()),
            Some("rt-1")
        );
        let expected = Utc.with_ymd_and_hms(2023, 5, 1, 8, 0, 0).unwrap()
            + chrono::Duration::milliseconds(500);
        assert_eq!(token.expiry, Some(expected));
    }

    #[test]
    fn decodes_zero_expiry() {
        let blob = r#"{"access_token":"at","expiry":"0001-01-01T00:00:00Z"}"#;
        let token = OAuthToken::from_blob(blob).unwrap().unwrap();
        assert!(token.expiry.is_some());
        assert!(token.refresh_token.is_none());
    }

    #[test]
    fn missing_access_token_decodes_as_empty() {
        let token = OAuthToken::from_blob(r#"{"token_type":"Bearer"}"#)
            .unwrap()
            .unwrap();
        assert_eq!(token.access_token.expose_secret(), "");
        assert_eq!(token.token_type.as_deref(), Some("Bearer"));
    }

    #[test]
    fn equality_compares_secret_values() {
        let a = OAuthToken::new("at").with_refresh_token("rt");
        assert_eq!(a, OAuthToken::new("at").with_refresh_token("rt"));
        assert_ne!(a, OAuthToken::new("at").with_refresh_token("other"));
        assert_ne!(a, OAuthToken::new("at"));
    }

    #[test]
    fn blob_omits_absent_fields() {
        let blob = OAuthToken::new("at").to_blob().unwrap();
        assert_eq!(blob, r#"{"access_token":"at"}"#);
    }

    #[test]
    fn debug_redacts_secrets() {
        let token = OAuthToken::new("super-secret").with_refresh_token("also-secret");
        let rendered = format!("{token:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(!rendered.contains("also-secret"));
        assert!(rendered.contains("[REDACTED]"));
    }
}
