//! Shared types for the API layer.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use tokio::sync::broadcast;

use crate::api::error::ApiError;
use crate::api::stock_feed::StockEvent;
use crate::scope::ScopeDescriptor;

/// Broadcast capacity for the stock feed. Lagging subscribers miss events
/// rather than applying backpressure to the ledger path.
const STOCK_FEED_CAPACITY: usize = 256;

/// Shared context for all routes and middleware. Connections are opened
/// per request; sessions live in memory and die with the process.
#[derive(Clone)]
pub struct ApiContext {
    pub db_path: Arc<PathBuf>,
    pub sessions: Arc<Mutex<SessionStore>>,
    pub stock_tx: broadcast::Sender<StockEvent>,
}

impl ApiContext {
    pub fn new(db_path: PathBuf) -> Self {
        let (stock_tx, _) = broadcast::channel(STOCK_FEED_CAPACITY);
        Self {
            db_path: Arc::new(db_path),
            sessions: Arc::new(Mutex::new(SessionStore::new())),
            stock_tx,
        }
    }

    pub fn open_db(&self) -> Result<Connection, ApiError> {
        Ok(crate::db::open_database(&self.db_path)?)
    }

    /// Fire-and-forget stock feed publish. A send error only means there
    /// are no subscribers right now.
    pub fn publish_stock(&self, event: StockEvent) {
        let _ = self.stock_tx.send(event);
    }
}

/// In-memory bearer session store. Tokens are stored as SHA-256 hashes;
/// the plaintext token is returned to the client once, at login.
pub struct SessionStore {
    sessions: HashMap<[u8; 32], ScopeDescriptor>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            sessions: HashMap::new(),
        }
    }

    /// Issue a fresh token for the given scope. Returns the plaintext token.
    pub fn issue(&mut self, scope: ScopeDescriptor) -> String {
        let token = generate_token();
        self.sessions.insert(hash_token(&token), scope);
        token
    }

    pub fn validate(&self, token: &str) -> Option<ScopeDescriptor> {
        self.sessions.get(&hash_token(token)).cloned()
    }

    pub fn revoke(&mut self, token: &str) -> bool {
        self.sessions.remove(&hash_token(token)).is_some()
    }

    /// Drop every session belonging to a user, e.g. after the account is
    /// rejected or deleted.
    pub fn revoke_user(&mut self, user_id: &uuid::Uuid) {
        self.sessions.retain(|_, scope| scope.user_id != *user_id);
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Hash a bearer token string using SHA-256.
pub fn hash_token(token: &str) -> [u8; 32] {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.finalize().into()
}

/// Generate a random bearer token (URL-safe base64, 32 bytes of entropy).
pub fn generate_token() -> String {
    use base64::Engine;
    let bytes: [u8; 32] = rand::random();
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::enums::Role;
    use uuid::Uuid;

    fn scope() -> ScopeDescriptor {
        ScopeDescriptor {
            user_id: Uuid::new_v4(),
            role: Role::BasicVet,
            province: "South".into(),
            district: "Huye".into(),
            sector: "Ngoma".into(),
        }
    }

    #[test]
    fn issued_token_validates() {
        let mut store = SessionStore::new();
        let s = scope();
        let token = store.issue(s.clone());
        let found = store.validate(&token).unwrap();
        assert_eq!(found.user_id, s.user_id);
    }

    #[test]
    fn unknown_token_is_rejected() {
        let store = SessionStore::new();
        assert!(store.validate("not-a-token").is_none());
    }

    #[test]
    fn revoke_invalidates() {
        let mut store = SessionStore::new();
        let token = store.issue(scope());
        assert!(store.revoke(&token));
        assert!(store.validate(&token).is_none());
        assert!(!store.revoke(&token));
    }

    #[test]
    fn revoke_user_drops_all_their_sessions() {
        let mut store = SessionStore::new();
        let s = scope();
        let t1 = store.issue(s.clone());
        let t2 = store.issue(s.clone());
        let other = store.issue(scope());
        store.revoke_user(&s.user_id);
        assert!(store.validate(&t1).is_none());
        assert!(store.validate(&t2).is_none());
        assert!(store.validate(&other).is_some());
    }

    #[test]
    fn generate_token_is_unique() {
        assert_ne!(generate_token(), generate_token());
    }

    #[test]
    fn hash_token_is_deterministic() {
        assert_eq!(hash_token("t"), hash_token("t"));
        assert_ne!(hash_token("a"), hash_token("b"));
    }
}
