// 🔑 Token Store - Holder of the short-lived access token
//
// "At most one credential, replaced on every refresh, never persisted"
//
// - Handles are cheap to clone: every clone shares the same slot
// - Expiry is NOT tracked here, it is discovered reactively via a 401
// - Last write wins when two refreshes complete out of order

use std::sync::{Arc, RwLock};

/// In-memory access token cache owned by an [`crate::AppSession`]
#[derive(Debug, Clone, Default)]
pub struct TokenStore {
    token: Arc<RwLock<Option<String>>>,
}

impl TokenStore {
    /// Create an empty store (no credential)
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-loaded with a token
    pub fn with_token(token: impl Into<String>) -> Self {
        let store = Self::new();
        store.set_token(Some(token.into()));
        store
    }

    /// Replace the held credential (`None` = no credential)
    pub fn set_token(&self, token: Option<String>) {
        let mut slot = self.token.write().unwrap_or_else(|e| e.into_inner());
        *slot = token;
    }

    /// Current credential, if any
    pub fn get_token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn clear_token(&self) {
        self.set_token(None);
    }

    pub fn has_token(&self) -> bool {
        self.token
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }
}

// ============================================================================
// TESTS
// ============================================================================
