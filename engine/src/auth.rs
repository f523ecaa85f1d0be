//! Authentication collaborator.
//!
//! Sign-in flows live outside the engine; it only asks who is signed in.

use crate::UserId;
use parking_lot::RwLock;
use std::sync::Arc;

/// An authenticated owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub email: String,
}

impl User {
    pub fn new(id: impl Into<UserId>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
        }
    }
}

/// Supplies the current session's user.
pub trait AuthProvider: Send + Sync {
    fn current_user(&self) -> Option<User>;
}

/// An auth provider whose session is set directly. Clones share the session.
#[derive(Debug, Clone, Default)]
pub struct StaticAuth {
    user: Arc<RwLock<Option<User>>>,
}

impl StaticAuth {
    /// A provider with nobody signed in.
    pub fn signed_out() -> Self {
        Self::default()
    }

    pub fn signed_in(user: User) -> Self {
        let auth = Self::default();
        auth.sign_in(user);
        auth
    }

    pub fn sign_in(&self, user: User) {
        *self.user.write() = Some(user);
    }

    pub fn sign_out(&self) {
        *self.user.write() = None;
    }
}

impl AuthProvider for StaticAuth {
    fn current_user(&self) -> Option<User> {
        self.user.read().clone()
    }
}
