//! Session context passed explicitly into the engine.

use serde::{Deserialize, Serialize};
use crate::id::UserId;
use crate::Time;

/// Everything the engine needs to know about the signed-in user.
///
/// The engine reads this and never reaches for ambient storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionContext {
    /// Owner of the milestone set
    pub user_id: UserId,

    /// When abstinence began, if known
    pub quit_anchor: Option<Time>,

    /// Bearer token for the remote source
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
}

impl SessionContext {
    /// Create a session for a new user with no known quit anchor.
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            quit_anchor: None,
            auth_token: None,
        }
    }

    /// Set the quit anchor.
    pub fn with_quit_anchor(mut self, anchor: Time) -> Self {
        self.quit_anchor = Some(anchor);
        self
    }

    /// Set the auth token.
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new(UserId::new())
    }
}
