//! Login sessions: a pluggable store (Redis or in-process) behind a manager
//! that issues, resolves and expires opaque session tokens.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{Duration, Utc};
use redis::{aio::ConnectionManager, AsyncCommands, Client};
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;

use crate::{
    error::{AppError, AppResult},
    models::{auth::SessionData, Admin},
};

/// Random URL-safe token (256 bits of entropy)
pub fn generate_token() -> String {
    let bytes: [u8; 32] = rand::random();
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Hex SHA-256 digest under which a token is stored
pub fn token_digest(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Storage for session payloads keyed by token digest
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn put(&self, key: &str, session: &SessionData, ttl_seconds: u64) -> AppResult<()>;
    async fn get(&self, key: &str) -> AppResult<Option<SessionData>>;
    async fn remove(&self, key: &str) -> AppResult<()>;
}

/// Sessions kept in Redis with a key TTL
#[derive(Clone)]
pub struct RedisSessionStore {
    manager: ConnectionManager,
}

impl RedisSessionStore {
    /// Connect to Redis and check the connection
    pub async fn new(url: &str) -> AppResult<Self> {
        let client = Client::open(url)
            .map_err(|e| AppError::Internal(format!("Failed to create Redis client: {}", e)))?;

        let mut manager = ConnectionManager::new(client)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to connect to Redis: {}", e)))?;

        redis::cmd("PING")
            .query_async::<_, String>(&mut manager)
            .await
            .map_err(|e| AppError::Internal(format!("Redis connection test failed: {}", e)))?;

        Ok(Self { manager })
    }

    fn key(key: &str) -> String {
        format!("session:{}", key)
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn put(&self, key: &str, session: &SessionData, ttl_seconds: u64) -> AppResult<()> {
        let payload = serde_json::to_string(session)
            .map_err(|e| AppError::Internal(format!("Failed to encode session: {}", e)))?;
        let mut conn = self.manager.clone();
        conn.set_ex::<_, _, ()>(Self::key(key), payload, ttl_seconds)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to store session in Redis: {}", e)))
    }

    async fn get(&self, key: &str) -> AppResult<Option<SessionData>> {
        let mut conn = self.manager.clone();
        let payload: Option<String> = conn
            .get(Self::key(key))
            .await
            .map_err(|e| AppError::Internal(format!("Failed to read session from Redis: {}", e)))?;

        match payload {
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(session) => Ok(Some(session)),
                Err(e) => {
                    tracing::warn!("Discarding unreadable session payload: {}", e);
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    async fn remove(&self, key: &str) -> AppResult<()> {
        let mut conn = self.manager.clone();
        conn.del::<_, ()>(Self::key(key))
            .await
            .map_err(|e| AppError::Internal(format!("Failed to delete session from Redis: {}", e)))
    }
}

/// Sessions kept in process memory; lost on restart
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, SessionData>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn put(&self, key: &str, session: &SessionData, _ttl_seconds: u64) -> AppResult<()> {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, s| s.expires_at > now);
        sessions.insert(key.to_string(), session.clone());
        Ok(())
    }

    async fn get(&self, key: &str) -> AppResult<Option<SessionData>> {
        Ok(self.sessions.read().await.get(key).cloned())
    }

    async fn remove(&self, key: &str) -> AppResult<()> {
        self.sessions.write().await.remove(key);
        Ok(())
    }
}

/// Issues and resolves session tokens with a sliding idle timeout
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    ttl: Duration,
}

impl SessionManager {
    pub fn new(store: Arc<dyn SessionStore>, ttl_minutes: i64) -> Self {
        Self {
            store,
            ttl: Duration::minutes(ttl_minutes.max(1)),
        }
    }

    fn ttl_seconds(&self) -> u64 {
        self.ttl.num_seconds().max(1) as u64
    }

    /// Open a session for `admin`; returns the raw token and the payload
    pub async fn create(&self, admin: &Admin) -> AppResult<(String, SessionData)> {
        let now = Utc::now();
        let session = SessionData {
            admin_id: admin.id,
            username: admin.username.clone(),
            role: admin.role,
            permissions: admin.granted_permissions(),
            created_at: now,
            expires_at: now + self.ttl,
        };
        let token = generate_token();
        self.store
            .put(&token_digest(&token), &session, self.ttl_seconds())
            .await?;
        Ok((token, session))
    }

    /// Look up a token. Expired sessions are removed; live ones are extended.
    pub async fn resolve(&self, token: &str) -> AppResult<Option<SessionData>> {
        let key = token_digest(token);
        let Some(mut session) = self.store.get(&key).await? else {
            return Ok(None);
        };

        let now = Utc::now();
        if session.expires_at <= now {
            self.store.remove(&key).await?;
            return Ok(None);
        }

        session.expires_at = now + self.ttl;
        self.store.put(&key, &session, self.ttl_seconds()).await?;
        Ok(Some(session))
    }

    pub async fn destroy(&self, token: &str) -> AppResult<()> {
        self.store.remove(&token_digest(token)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AdminRole, Permission, RecordStatus};

    fn admin() -> Admin {
        Admin {
            id: 4,
            username: "stock.keeper".to_string(),
            email: "keeper@example.com".to_string(),
            password_hash: String::new(),
            full_name: None,
            role: AdminRole::Operator,
            permissions: vec!["materials.view".to_string()],
            status: RecordStatus::Active,
            remember_token_hash: None,
            remember_token_expires_at: None,
            last_login_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn session(expires_in: Duration) -> SessionData {
        let now = Utc::now();
        SessionData {
            admin_id: 4,
            username: "stock.keeper".to_string(),
            role: AdminRole::Operator,
            permissions: vec![Permission::ViewMaterials],
            created_at: now,
            expires_at: now + expires_in,
        }
    }

    #[test]
    fn test_tokens_are_random_and_digest_is_hex() {
        let a = generate_token();
        let b = generate_token();
        assert_ne!(a, b);
        assert_eq!(a.len(), 43);

        let digest = token_digest(&a);
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(digest, token_digest(&a));
    }

    #[tokio::test]
    async fn test_create_stores_session_under_digest() {
        let mut store = MockSessionStore::new();
        store
            .expect_put()
            .withf(|key, session, ttl| key.len() == 64 && session.admin_id == 4 && *ttl == 7200)
            .times(1)
            .returning(|_, _, _| Ok(()));

        let manager = SessionManager::new(Arc::new(store), 120);
        let (token, session) = manager.create(&admin()).await.unwrap();
        assert_eq!(token.len(), 43);
        assert_eq!(session.permissions, vec![Permission::ViewMaterials]);
    }

    #[tokio::test]
    async fn test_expired_session_is_removed() {
        let mut store = MockSessionStore::new();
        store
            .expect_get()
            .times(1)
            .returning(|_| Ok(Some(session(Duration::minutes(-1)))));
        store.expect_remove().times(1).returning(|_| Ok(()));
        store.expect_put().never();

        let manager = SessionManager::new(Arc::new(store), 120);
        assert!(manager.resolve("stale-token").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_live_session_is_extended() {
        let mut store = MockSessionStore::new();
        store
            .expect_get()
            .times(1)
            .returning(|_| Ok(Some(session(Duration::minutes(5)))));
        store.expect_put().times(1).returning(|_, _, _| Ok(()));

        let manager = SessionManager::new(Arc::new(store), 120);
        let resolved = manager.resolve("live-token").await.unwrap().unwrap();
        assert!(resolved.expires_at > Utc::now() + Duration::minutes(100));
    }

    #[tokio::test]
    async fn test_unknown_token_resolves_to_none() {
        let mut store = MockSessionStore::new();
        store.expect_get().times(1).returning(|_| Ok(None));

        let manager = SessionManager::new(Arc::new(store), 120);
        assert!(manager.resolve("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_memory_store_lifecycle() {
        let manager = SessionManager::new(Arc::new(MemorySessionStore::new()), 30);
        let (token, _) = manager.create(&admin()).await.unwrap();

        let resolved = manager.resolve(&token).await.unwrap().unwrap();
        assert_eq!(resolved.username, "stock.keeper");

        manager.destroy(&token).await.unwrap();
        assert!(manager.resolve(&token).await.unwrap().is_none());
    }
}
