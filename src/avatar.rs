//! Deterministic avatar URLs derived from an email address.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Avatar service settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AvatarConfig {
    /// Base URL of the hash-addressed avatar service.
    pub base_url: String,
    /// Requested image size in pixels.
    pub size: u32,
}

impl Default for AvatarConfig {
    fn default() -> Self {
        Self {
            base_url: "https://secure.gravatar.com/avatar".to_string(),
            size: 500,
        }
    }
}

impl AvatarConfig {
    /// Build the avatar URL for an email.
    ///
    /// The email is trimmed and lowercased before hashing so that the same
    /// mailbox always maps to the same image. Returns `None` for a blank email.
    pub fn avatar_url(&self, email: &str) -> Option<String> {
        let normalized = email.trim().to_lowercase();
        if normalized.is_empty() {
            return None;
        }

        let hash = hex::encode(Sha256::digest(normalized.as_bytes()));
        Some(format!(
            "{}/{}?s={}&d=identicon",
            self.base_url.trim_end_matches('/'),
            hash,
            self.size
        ))
    }
}
