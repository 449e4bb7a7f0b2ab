//! Current-user identity
//!
//! Signing in is handled by the hosted auth provider; this crate only reads
//! who is signed in.

use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::config::Config;

/// A signed-in user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Stable user id, stored on every bookmark as `userId`
    pub uid: String,
    /// ID token for authenticated database requests
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
}

impl User {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            id_token: None,
        }
    }

    pub fn with_id_token(mut self, token: impl Into<String>) -> Self {
        self.id_token = Some(token.into());
        self
    }
}

/// Source of the current user
pub trait AuthProvider: Send + Sync {
    /// The signed-in user, or `None`
    fn current_user(&self) -> Option<User>;
}

/// An [`AuthProvider`] whose user is set explicitly
#[derive(Debug, Default)]
pub struct StaticAuth {
    user: RwLock<Option<User>>,
}

impl StaticAuth {
    pub fn signed_in(user: User) -> Self {
        Self {
            user: RwLock::new(Some(user)),
        }
    }

    pub fn signed_out() -> Self {
        Self::default()
    }

    /// Build from the configured user id and token
    pub fn from_config(config: &Config) -> Self {
        match config.user_id.as_deref().filter(|u| !u.is_empty()) {
            Some(uid) => {
                let mut user = User::new(uid);
                user.id_token = config.id_token.clone();
                Self::signed_in(user)
            }
            None => Self::signed_out(),
        }
    }

    pub fn sign_in(&self, user: User) {
        *self.user.write().unwrap_or_else(|p| p.into_inner()) = Some(user);
    }

    pub fn sign_out(&self) {
        *self.user.write().unwrap_or_else(|p| p.into_inner()) = None;
    }
}

impl AuthProvider for StaticAuth {
    fn current_user(&self) -> Option<User> {
        self.user.read().unwrap_or_else(|p| p.into_inner()).clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_in_and_out() {
        let auth = StaticAuth::signed_out();
        assert!(auth.current_user().is_none());

        auth.sign_in(User::new("alice"));
        assert_eq!(auth.current_user().unwrap().uid, "alice");

        auth.sign_out();
        assert!(auth.current_user().is_none());
    }

    #[test]
    fn test_from_config() {
        let config = Config {
            user_id: Some("u-42".to_string()),
            id_token: Some("token".to_string()),
            ..Config::default()
        };
        let user = StaticAuth::from_config(&config).current_user().unwrap();
        assert_eq!(user, User::new("u-42").with_id_token("token"));

        let config = Config {
            user_id: Some(String::new()),
            ..Config::default()
        };
        assert!(StaticAuth::from_config(&config).current_user().is_none());
    }
}
