//! Authenticated identities and sign-in errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An authenticated end user, as reported by the identity provider.
///
/// Only the uid is required. It becomes the `ownerId` of every task the
/// user creates.
///
/// # Examples
///
/// ```
/// use taskdeck::Identity;
///
/// let alice = Identity::new("u1").with_display_name("Alice");
/// assert_eq!(alice.uid, "u1");
/// assert_eq!(alice.name(), "Alice");
/// assert_eq!(Identity::new("u2").name(), "u2");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Provider-assigned unique id.
    pub uid: String,
    /// Human-readable name, if the provider shares one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Email address, if the provider shares one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Identity {
    /// Creates an identity with only a uid.
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            display_name: None,
            email: None,
        }
    }

    /// Sets the display name.
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Sets the email address.
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Best name to show: display name, then email, then uid.
    pub fn name(&self) -> &str {
        self.display_name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or(self.uid.as_str())
    }
}

/// Failure reported by an [`IdentityProvider`](crate::IdentityProvider).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// The user dismissed the sign-in flow.
    #[error("sign-in cancelled by user")]
    Cancelled,

    /// The provider rejected the request.
    #[error("identity provider error: {message}")]
    Provider {
        /// Provider-supplied description.
        message: String,
    },

    /// The provider could not be reached.
    #[error("network error talking to identity provider: {message}")]
    Network {
        /// Description of the transport failure.
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_falls_back_to_email_then_uid() {
        let id = Identity::new("u1").with_email("a@example.com");
        assert_eq!(id.name(), "a@example.com");
        assert_eq!(id.clone().with_display_name("Alice").name(), "Alice");
        assert_eq!(Identity::new("u1").name(), "u1");
    }

    #[test]
    fn serializes_camel_case_without_empty_fields() {
        let json = serde_json::to_value(Identity::new("u1").with_display_name("Alice")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "uid": "u1", "displayName": "Alice" })
        );
    }
}
