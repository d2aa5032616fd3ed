//! Where the bearer token lives between requests.
//!
//! The web dashboard kept the token in browser-wide storage and every API
//! call reached into it. Here the store is an explicit dependency handed to
//! whatever needs it.

use std::sync::{Arc, RwLock};

pub trait CredentialStore: Send + Sync {
    fn token(&self) -> Option<String>;
    fn store(&self, token: String);
    /// Drop the token, e.g. after the server rejected it.
    fn clear(&self);
}

impl<C: CredentialStore + ?Sized> CredentialStore for Arc<C> {
    fn token(&self) -> Option<String> {
        (**self).token()
    }

    fn store(&self, token: String) {
        (**self).store(token)
    }

    fn clear(&self) {
        (**self).clear()
    }
}

/// Process-local token storage.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    token: RwLock<Option<String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn token(&self) -> Option<String> {
        // A poisoned lock still holds a valid Option.
        match self.token.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn store(&self, token: String) {
        let mut guard = self.token.write().unwrap_or_else(|p| p.into_inner());
        *guard = Some(token);
    }

    fn clear(&self) {
        let mut guard = self.token.write().unwrap_or_else(|p| p.into_inner());
        *guard = None;
    }
}
