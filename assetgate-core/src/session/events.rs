//! Auth state change events

use super::{Identity, Session};
use crate::error::AuthError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of auth state change reported by the auth service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthEventKind {
    InitialSession,
    SignedIn,
    SignedOut,
    TokenRefreshed,
    UserUpdated,
    PasswordRecovery,
    SignedUp,
}

impl AuthEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthEventKind::InitialSession => "initial_session",
            AuthEventKind::SignedIn => "signed_in",
            AuthEventKind::SignedOut => "signed_out",
            AuthEventKind::TokenRefreshed => "token_refreshed",
            AuthEventKind::UserUpdated => "user_updated",
            AuthEventKind::PasswordRecovery => "password_recovery",
            AuthEventKind::SignedUp => "signed_up",
        }
    }
}

impl fmt::Display for AuthEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthEventKind {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "initial_session" => Ok(AuthEventKind::InitialSession),
            "signed_in" => Ok(AuthEventKind::SignedIn),
            "signed_out" => Ok(AuthEventKind::SignedOut),
            "token_refreshed" => Ok(AuthEventKind::TokenRefreshed),
            "user_updated" => Ok(AuthEventKind::UserUpdated),
            "password_recovery" => Ok(AuthEventKind::PasswordRecovery),
            "signed_up" => Ok(AuthEventKind::SignedUp),
            other => Err(AuthError::Config(format!("unknown auth event kind '{}'", other))),
        }
    }
}

/// Auth state change, with the session current after the change
#[derive(Debug, Clone, PartialEq)]
pub struct AuthEvent {
    pub kind: AuthEventKind,
    pub session: Option<Session>,
}

impl AuthEvent {
    pub fn new(kind: AuthEventKind, session: Option<Session>) -> Self {
        Self { kind, session }
    }

    pub fn signed_out() -> Self {
        Self::new(AuthEventKind::SignedOut, None)
    }

    /// Identity carried by the event's session
    pub fn identity(&self) -> Option<&Identity> {
        self.session.as_ref().map(|session| &session.identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_labels() {
        assert_eq!(AuthEventKind::SignedUp.to_string(), "signed_up");
        assert_eq!("signed-up".parse::<AuthEventKind>().unwrap(), AuthEventKind::SignedUp);
        assert_eq!("TOKEN_REFRESHED".parse::<AuthEventKind>().unwrap(), AuthEventKind::TokenRefreshed);
        assert!("mfa_challenge".parse::<AuthEventKind>().is_err());

        let json = serde_json::to_string(&AuthEventKind::PasswordRecovery).unwrap();
        assert_eq!(json, "\"password_recovery\"");
    }

    #[test]
    fn test_event_identity() {
        assert!(AuthEvent::signed_out().identity().is_none());

        let session = Session::new("t", Identity::new("user-1"), chrono::Duration::hours(1));
        let event = AuthEvent::new(AuthEventKind::SignedIn, Some(session));
        assert_eq!(event.identity().map(|i| i.id.as_str()), Some("user-1"));
    }
}
