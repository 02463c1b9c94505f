//! Identity records exchanged with the identity backend.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A user's account record as known to the identity backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Backend-unique user id (the sign-in identifier).
    pub id: String,
    /// Human readable name.
    pub display_name: String,
    /// Avatar image URL, if the account has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl Identity {
    /// Create an identity without an avatar.
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            avatar_url: None,
        }
    }

    /// Attach an avatar URL.
    pub fn with_avatar(mut self, url: impl Into<String>) -> Self {
        self.avatar_url = Some(url.into());
        self
    }
}

/// User-supplied sign-up form data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignUpProfile {
    /// Desired sign-in identifier.
    pub identifier: String,
    /// Display name.
    pub display_name: String,
    /// Optional email, used only to derive the avatar URL.
    pub email: Option<String>,
}

impl SignUpProfile {
    pub fn new(identifier: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            display_name: display_name.into(),
            email: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

/// A validated account record ready to be sent to `create_identity`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewIdentity {
    pub id: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl From<NewIdentity> for Identity {
    fn from(record: NewIdentity) -> Self {
        Self {
            id: record.id,
            display_name: record.display_name,
            avatar_url: record.avatar_url,
        }
    }
}

/// Opaque error description reported by the identity backend.
///
/// The session core never interprets the code; it is carried through to the
/// presentation layer for display and diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub message: String,
}

impl ErrorDescriptor {
    /// Unknown user id.
    pub const UID_NOT_FOUND: &'static str = "ERR_UID_NOT_FOUND";
    /// Auth key rejected.
    pub const AUTH_KEY: &'static str = "ERR_AUTH_KEY";
    /// User id already registered.
    pub const UID_ALREADY_EXISTS: &'static str = "ERR_UID_ALREADY_EXISTS";
    /// Backend call did not complete in time.
    pub const TIMEOUT: &'static str = "ERR_TIMEOUT";
    /// Operation abandoned by its caller before the backend answered.
    pub const CANCELLED: &'static str = "ERR_CANCELLED";
    /// Backend-side internal failure.
    pub const INTERNAL: &'static str = "ERR_INTERNAL";

    /// Descriptor without a code.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    /// Descriptor with a backend error code.
    pub fn with_code(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: message.into(),
        }
    }

    /// Check whether this descriptor carries the given code.
    pub fn has_code(&self, code: &str) -> bool {
        self.code.as_deref() == Some(code)
    }
}

impl fmt::Display for ErrorDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{} ({})", self.message, code),
            None => f.write_str(&self.message),
        }
    }
}
