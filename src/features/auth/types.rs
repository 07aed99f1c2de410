//! Session payloads from the Supabase SDK and the validated user record kept in
//! storage. Access tokens are wrapped so they never show up in `Debug` output.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Shown when neither a full name nor an email local part is available.
pub const FALLBACK_DISPLAY_NAME: &str = "User";

/// Validated subset of the session user that drives the UI.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, rename = "name", alias = "displayName")]
    pub display_name: String,
}

impl UserRecord {
    /// A record is only usable with both an id and an email.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.id.trim().is_empty() && !self.email.trim().is_empty()
    }

    /// First character of the display name, uppercased, for the avatar badge.
    #[must_use]
    pub fn initial(&self) -> String {
        self.display_name
            .chars()
            .next()
            .map(|c| c.to_uppercase().collect())
            .unwrap_or_default()
    }
}

/// Opaque access token, persisted alongside its `UserRecord`.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    /// Wraps a token, rejecting blank values.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            None
        } else {
            Some(Self(value))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("SessionToken(<redacted>)")
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct UserMetadata {
    #[serde(default)]
    pub full_name: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct SessionUser {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: Option<UserMetadata>,
}

impl SessionUser {
    /// Full name from provider metadata, else the email local part.
    #[must_use]
    pub fn display_name(&self) -> String {
        let full_name = self
            .user_metadata
            .as_ref()
            .and_then(|metadata| metadata.full_name.as_deref())
            .map(str::trim)
            .filter(|name| !name.is_empty());
        if let Some(name) = full_name {
            return name.to_string();
        }

        self.email
            .as_deref()
            .and_then(|email| email.split('@').next())
            .map(str::trim)
            .filter(|local| !local.is_empty())
            .unwrap_or(FALLBACK_DISPLAY_NAME)
            .to_string()
    }
}

/// Session as returned by `auth.getSession()` and auth state events.
#[derive(Clone, Default, Deserialize)]
pub struct Session {
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub user: Option<SessionUser>,
}

impl Session {
    /// The validated record for this session, if the user carries id and email.
    #[must_use]
    pub fn user_record(&self) -> Option<UserRecord> {
        let user = self.user.as_ref()?;
        let record = UserRecord {
            id: user.id.trim().to_string(),
            email: user.email.as_deref().unwrap_or_default().trim().to_string(),
            display_name: user.display_name(),
        };
        record.is_valid().then_some(record)
    }

    #[must_use]
    pub fn token(&self) -> Option<SessionToken> {
        SessionToken::new(self.access_token.clone())
    }

    /// Record and token together, or `None` if either is unusable.
    #[must_use]
    pub fn credentials(&self) -> Option<(UserRecord, SessionToken)> {
        Some((self.user_record()?, self.token()?))
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Session")
            .field("access_token", &"<redacted>")
            .field("user", &self.user)
            .finish()
    }
}

/// Auth state change reported by the SDK.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthEventKind {
    SignedIn,
    SignedOut,
    TokenRefreshed,
    UserUpdated,
}

impl AuthEventKind {
    /// Maps SDK event names; events the site does not react to return `None`.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "SIGNED_IN" => Some(Self::SignedIn),
            "SIGNED_OUT" => Some(Self::SignedOut),
            "TOKEN_REFRESHED" => Some(Self::TokenRefreshed),
            "USER_UPDATED" => Some(Self::UserUpdated),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct AuthEvent {
    pub kind: AuthEventKind,
    pub session: Option<Session>,
}

impl AuthEvent {
    #[must_use]
    pub fn new(kind: AuthEventKind, session: Option<Session>) -> Self {
        Self { kind, session }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(json: &str) -> Session {
        serde_json::from_str(json).expect("session json")
    }

    #[test]
    fn display_name_prefers_full_name() {
        let session = session(
            r#"{"access_token":"t","user":{"id":"u1","email":"a@b.com","user_metadata":{"full_name":"Alice"}}}"#,
        );
        let record = session.user_record().expect("valid record");
        assert_eq!(record.display_name, "Alice");
        assert_eq!(record.initial(), "A");
    }

    #[test]
    fn display_name_falls_back_to_email_local_part() {
        let session = session(
            r#"{"access_token":"t","user":{"id":"u1","email":"bob@example.com","user_metadata":{}}}"#,
        );
        assert_eq!(session.user_record().expect("record").display_name, "bob");
    }

    #[test]
    fn display_name_last_resort() {
        let user = SessionUser {
            id: "u1".to_string(),
            email: Some("@example.com".to_string()),
            user_metadata: None,
        };
        assert_eq!(user.display_name(), FALLBACK_DISPLAY_NAME);
    }

    #[test]
    fn session_without_email_has_no_record() {
        let session = session(r#"{"access_token":"t","user":{"id":"u1","email":null}}"#);
        assert!(session.user_record().is_none());
        assert!(session.credentials().is_none());
    }

    #[test]
    fn blank_token_is_rejected() {
        assert!(SessionToken::new("  ").is_none());
        let session = session(r#"{"access_token":"","user":{"id":"u1","email":"a@b.com"}}"#);
        assert!(session.user_record().is_some());
        assert!(session.credentials().is_none());
    }

    #[test]
    fn debug_output_hides_tokens() {
        let session = session(r#"{"access_token":"secret-token","user":null}"#);
        assert!(!format!("{session:?}").contains("secret-token"));
        let token = SessionToken::new("secret-token").expect("token");
        assert!(!format!("{token:?}").contains("secret-token"));
    }

    #[test]
    fn record_reads_legacy_and_camel_case_names() {
        let legacy: UserRecord =
            serde_json::from_str(r#"{"id":"u1","email":"a@b.com","name":"Alice"}"#).expect("json");
        let camel: UserRecord =
            serde_json::from_str(r#"{"id":"u1","email":"a@b.com","displayName":"Alice"}"#)
                .expect("json");
        assert_eq!(legacy, camel);
        assert!(serde_json::to_string(&legacy).expect("json").contains(r#""name":"Alice""#));
    }

    #[test]
    fn event_names() {
        assert_eq!(AuthEventKind::parse("SIGNED_IN"), Some(AuthEventKind::SignedIn));
        assert_eq!(AuthEventKind::parse("SIGNED_OUT"), Some(AuthEventKind::SignedOut));
        assert_eq!(
            AuthEventKind::parse("TOKEN_REFRESHED"),
            Some(AuthEventKind::TokenRefreshed)
        );
        assert_eq!(AuthEventKind::parse("USER_UPDATED"), Some(AuthEventKind::UserUpdated));
        assert_eq!(AuthEventKind::parse("INITIAL_SESSION"), None);
    }
}
