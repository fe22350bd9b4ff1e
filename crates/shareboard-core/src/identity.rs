//! Authenticated user identity.

use serde::{Deserialize, Serialize};

/// The signed-in user, as reported by the host's auth provider.
///
/// The uid keys persistence and names the signaling room a call is hosted
/// under. The core never authenticates anyone itself; it only requires that
/// an identity be present for the operations that need one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub uid: String,
    pub email: Option<String>,
}

impl UserIdentity {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            email: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}
