//! Authenticated identity.
//!
//! The authentication provider itself is an external collaborator; the core
//! only consumes the identity it supplies. The tier is carried for gating
//! decisions made elsewhere (gating policy is out of scope here).

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Subscription tier of the signed-in user.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, Default,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Tier {
    #[default]
    Free,
    Pro,
}

/// The identity supplied by the authentication provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub email: String,
    #[serde(default)]
    pub tier: Tier,
}

/// Abstracts where the current identity comes from, so the directory and
/// synchronizer stay testable without a live auth backend.
pub trait IdentityProvider: Send + Sync {
    /// The currently signed-in user, or `None` when signed out.
    fn current_user(&self) -> Option<AuthenticatedUser>;
}

/// A fixed signed-in identity. Used in tests and single-user deployments.
#[derive(Debug, Clone)]
pub struct StaticIdentityProvider {
    user: AuthenticatedUser,
}

impl StaticIdentityProvider {
    pub fn new(user: AuthenticatedUser) -> Self {
        Self { user }
    }

    /// Convenience constructor for a free-tier user.
    pub fn signed_in(user_id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            user: AuthenticatedUser {
                user_id: user_id.into(),
                email: email.into(),
                tier: Tier::Free,
            },
        }
    }
}

impl IdentityProvider for StaticIdentityProvider {
    fn current_user(&self) -> Option<AuthenticatedUser> {
        Some(self.user.clone())
    }
}

/// A signed-out identity provider.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoIdentity;

impl IdentityProvider for NoIdentity {
    fn current_user(&self) -> Option<AuthenticatedUser> {
        None
    }
}
