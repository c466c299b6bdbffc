//! Signed-in identity.
//!
//! How a user signs in is outside the core; operations that read or write
//! per-user documents only need the resulting user id.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::storage::AccountConfig;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    /// Returns `None` for blank ids.
    pub fn new(user_id: impl Into<String>) -> Option<Self> {
        let id = user_id.into();
        let trimmed = id.trim();
        (!trimmed.is_empty()).then(|| Self(trimmed.to_string()))
    }

    pub fn from_config(account: &AccountConfig) -> Option<Self> {
        account.user_id.as_deref().and_then(Self::new)
    }

    pub fn user_id(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fail fast with [`CoreError::Unauthenticated`] when nobody is signed in.
pub fn require(identity: Option<&Identity>) -> Result<&Identity> {
    identity.ok_or(CoreError::Unauthenticated)
}
