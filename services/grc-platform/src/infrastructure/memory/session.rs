//! 内存会话存储

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use grc_auth_core::{SessionClaims, SessionId};
use grc_common::Clock;
use grc_errors::AppResult;
use tokio::sync::RwLock;

use crate::domain::session::SessionStore;

/// 默认空闲超时（分钟）
pub const DEFAULT_IDLE_TIMEOUT_MINUTES: i64 = 30;

#[derive(Debug, Clone)]
struct SessionEntry {
    claims: SessionClaims,
    last_seen: DateTime<Utc>,
}

/// 内存会话存储
///
/// 每次命中都会刷新 `last_seen`，空闲超过 `idle_timeout` 或超过令牌绝对过期时间即视为未登录
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<SessionId, SessionEntry>>,
    clock: Arc<dyn Clock>,
    idle_timeout: Duration,
}

impl InMemorySessionStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            clock,
            idle_timeout: Duration::minutes(DEFAULT_IDLE_TIMEOUT_MINUTES),
        }
    }

    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// 当前保存的会话数（含尚未清理的过期会话）
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    fn is_expired(&self, entry: &SessionEntry, now: DateTime<Utc>) -> bool {
        now - entry.last_seen >= self.idle_timeout || now.timestamp() >= entry.claims.exp
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn establish(&self, previous: Option<&SessionId>, claims: SessionClaims) -> AppResult<()> {
        let now = self.clock.now();
        let mut sessions = self.sessions.write().await;
        if let Some(prev) = previous {
            sessions.remove(prev);
        }
        // 顺带清理从未被再次读取的过期会话
        let before = sessions.len();
        sessions.retain(|_, entry| !self.is_expired(entry, now));
        let evicted = before - sessions.len();
        if evicted > 0 {
            tracing::debug!(evicted, "Evicted expired sessions");
        }
        sessions.insert(
            claims.sid,
            SessionEntry {
                claims,
                last_seen: now,
            },
        );
        Ok(())
    }

    async fn current_identity(&self, sid: &SessionId) -> AppResult<Option<SessionClaims>> {
        let now = self.clock.now();
        let mut sessions = self.sessions.write().await;

        let expired = match sessions.get(sid) {
            None => return Ok(None),
            Some(entry) => self.is_expired(entry, now),
        };

        if expired {
            sessions.remove(sid);
            tracing::debug!(session_id = %sid, "Session expired");
            return Ok(None);
        }

        Ok(sessions.get_mut(sid).map(|entry| {
            entry.last_seen = now;
            entry.claims.clone()
        }))
    }

    async fn destroy(&self, sid: &SessionId) -> AppResult<()> {
        self.sessions.write().await.remove(sid);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use grc_auth_core::Role;
    use grc_common::{ManualClock, UserId};

    fn setup() -> (ManualClock, InMemorySessionStore) {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2026, 5, 4, 8, 0, 0).unwrap());
        let store = InMemorySessionStore::new(Arc::new(clock.clone()));
        (clock, store)
    }

    fn claims(clock: &ManualClock) -> SessionClaims {
        SessionClaims::new(
            UserId(1),
            "alice",
            vec![Role::RiskManager],
            clock.now(),
            Duration::hours(12),
            "grc-platform",
        )
    }

    #[tokio::test]
    async fn test_activity_slides_expiry() {
        let (clock, store) = setup();
        let claims = claims(&clock);
        store.establish(None, claims.clone()).await.unwrap();

        clock.advance(Duration::minutes(20));
        assert!(store.current_identity(&claims.sid).await.unwrap().is_some());

        clock.advance(Duration::minutes(20));
        assert!(store.current_identity(&claims.sid).await.unwrap().is_some());

        clock.advance(Duration::minutes(30));
        assert!(store.current_identity(&claims.sid).await.unwrap().is_none());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_establish_clears_previous_session() {
        let (clock, store) = setup();
        let first = claims(&clock);
        let second = claims(&clock);

        store.establish(None, first.clone()).await.unwrap();
        store.establish(Some(&first.sid), second.clone()).await.unwrap();

        assert!(store.current_identity(&first.sid).await.unwrap().is_none());
        assert_eq!(store.current_identity(&second.sid).await.unwrap(), Some(second));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_absolute_lifetime_is_enforced() {
        let (clock, store) = setup();
        let claims = SessionClaims::new(
            UserId(1),
            "alice",
            vec![Role::Admin],
            clock.now(),
            Duration::minutes(45),
            "grc-platform",
        );
        store.establish(None, claims.clone()).await.unwrap();

        for _ in 0..2 {
            clock.advance(Duration::minutes(25));
            let _ = store.current_identity(&claims.sid).await.unwrap();
        }
        assert!(store.current_identity(&claims.sid).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_establish_evicts_abandoned_sessions() {
        let (clock, store) = setup();
        let abandoned = claims(&clock);
        let live = claims(&clock);
        store.establish(None, abandoned.clone()).await.unwrap();

        clock.advance(Duration::minutes(20));
        store.establish(None, live.clone()).await.unwrap();
        assert_eq!(store.len().await, 2);

        clock.advance(Duration::minutes(15));
        let newcomer = claims(&clock);
        store.establish(None, newcomer.clone()).await.unwrap();

        assert_eq!(store.len().await, 2);
        assert!(store.current_identity(&live.sid).await.unwrap().is_some());
        assert!(store.current_identity(&newcomer.sid).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_destroy_unknown_session_is_noop() {
        let (_, store) = setup();
        store.destroy(&SessionId::generate()).await.unwrap();
    }
}
