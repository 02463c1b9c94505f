//! Input validation for sign-in and sign-up forms.
//!
//! Every check here runs before any backend call; a failure is reported to
//! the caller as [`SessionError::InvalidInput`](crate::SessionError::InvalidInput)
//! and leaves the session state untouched.

use thiserror::Error;

use crate::avatar::AvatarConfig;
use crate::identity::{NewIdentity, SignUpProfile};

/// Validation configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationConfig {
    /// Maximum identifier length in characters.
    pub max_identifier_length: usize,
    /// Maximum display name length in characters.
    pub max_display_name_length: usize,
    /// Maximum email length in characters.
    pub max_email_length: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_identifier_length: 100,
            max_display_name_length: 100,
            max_email_length: 254,
        }
    }
}

/// Validator for user-supplied credentials and profiles.
#[derive(Debug, Clone, Default)]
pub struct CredentialValidator {
    config: ValidationConfig,
}

impl CredentialValidator {
    /// Create a new validator with the given config.
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Validate a sign-in identifier and return it trimmed.
    pub fn validate_identifier<'a>(&self, identifier: &'a str) -> Result<&'a str, ValidationError> {
        let trimmed = identifier.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyField("identifier"));
        }

        let length = trimmed.chars().count();
        if length > self.config.max_identifier_length {
            return Err(ValidationError::TooLong {
                field: "identifier",
                length,
                max: self.config.max_identifier_length,
            });
        }

        if let Some(c) = trimmed
            .chars()
            .find(|c| c.is_whitespace() || c.is_control())
        {
            return Err(ValidationError::InvalidCharacter {
                field: "identifier",
                character: c,
            });
        }

        Ok(trimmed)
    }

    /// Validate a display name and return it trimmed.
    pub fn validate_display_name<'a>(&self, name: &'a str) -> Result<&'a str, ValidationError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyField("display_name"));
        }

        let length = trimmed.chars().count();
        if length > self.config.max_display_name_length {
            return Err(ValidationError::TooLong {
                field: "display_name",
                length,
                max: self.config.max_display_name_length,
            });
        }

        if let Some(c) = trimmed.chars().find(|c| c.is_control()) {
            return Err(ValidationError::InvalidCharacter {
                field: "display_name",
                character: c,
            });
        }

        Ok(trimmed)
    }

    /// Validate an optional email.
    ///
    /// A blank email is treated the same as no email.
    pub fn validate_email<'a>(
        &self,
        email: Option<&'a str>,
    ) -> Result<Option<&'a str>, ValidationError> {
        let Some(trimmed) = email.map(str::trim).filter(|e| !e.is_empty()) else {
            return Ok(None);
        };

        let length = trimmed.chars().count();
        if length > self.config.max_email_length {
            return Err(ValidationError::TooLong {
                field: "email",
                length,
                max: self.config.max_email_length,
            });
        }

        match trimmed.split_once('@') {
            Some((local, domain))
                if !local.is_empty()
                    && !domain.is_empty()
                    && !domain.contains('@')
                    && !trimmed.contains(char::is_whitespace) =>
            {
                Ok(Some(trimmed))
            }
            _ => Err(ValidationError::InvalidEmail(trimmed.to_string())),
        }
    }

    /// Validate a sign-up profile and build the record sent to the backend.
    pub fn validate_profile(
        &self,
        profile: &SignUpProfile,
        avatar: &AvatarConfig,
    ) -> Result<NewIdentity, ValidationError> {
        let id = self.validate_identifier(&profile.identifier)?;
        let display_name = self.validate_display_name(&profile.display_name)?;
        let email = self.validate_email(profile.email.as_deref())?;

        Ok(NewIdentity {
            id: id.to_string(),
            display_name: display_name.to_string(),
            avatar_url: email.and_then(|e| avatar.avatar_url(e)),
        })
    }
}

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Required field is empty.
    #[error("{0} cannot be empty")]
    EmptyField(&'static str),

    /// Field exceeds maximum length.
    #[error("{field} too long: {length} chars (max: {max})")]
    TooLong {
        field: &'static str,
        length: usize,
        max: usize,
    },

    /// Field contains a character it may not contain.
    #[error("{field} contains invalid character: {character:?}")]
    InvalidCharacter {
        field: &'static str,
        character: char,
    },

    /// Email is not of the form `local@domain`.
    #[error("invalid email address: {0}")]
    InvalidEmail(String),
}
