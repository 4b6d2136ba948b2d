//! Session registry
//! Tracks issued tokens by jti so logout can revoke them before expiry

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use uuid::Uuid;

/// State of a single issuance. Created when a token is minted, the only
/// mutation is setting `revoked` on logout.
#[derive(Debug, Clone)]
struct Session {
    user_id: Uuid,
    expires_at: DateTime<Utc>,
    revoked: bool,
}

/// In-memory registry of issued tokens, keyed by jti. Per-jti mutations
/// are atomic under the map's shard locks; there are no cross-record
/// transactions to protect.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<Uuid, Session>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    /// Record a fresh issuance
    pub fn register(&self, jti: Uuid, user_id: Uuid, expires_at: DateTime<Utc>) {
        self.sessions.insert(
            jti,
            Session {
                user_id,
                expires_at,
                revoked: false,
            },
        );
    }

    /// Revoke a session. Idempotent: revoking an already-revoked,
    /// expired or unknown jti is not an error. Returns whether the jti
    /// was known.
    pub fn revoke(&self, jti: Uuid) -> bool {
        match self.sessions.get_mut(&jti) {
            Some(mut session) => {
                if session.revoked {
                    tracing::debug!(%jti, "Session already revoked");
                } else {
                    session.revoked = true;
                    tracing::debug!(%jti, user_id = %session.user_id, "Session revoked");
                }
                true
            }
            None => {
                tracing::debug!(%jti, "Revoke for unknown jti");
                false
            }
        }
    }

    /// Whether a jti is currently valid. Expiry is checked lazily, so
    /// entries do not need active pruning to become invalid.
    pub fn is_valid(&self, jti: Uuid) -> bool {
        self.sessions
            .get(&jti)
            .map(|session| !session.revoked && session.expires_at > Utc::now())
            .unwrap_or(false)
    }

    /// Reclaim storage for sessions past expiry plus a grace window.
    /// Returns the number of removed entries.
    pub fn prune(&self, grace: Duration) -> usize {
        let cutoff = Utc::now() - grace;
        let before = self.sessions.len();
        self.sessions.retain(|_, session| session.expires_at > cutoff);
        before - self.sessions.len()
    }

    /// Number of tracked sessions (live and revoked)
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn future() -> DateTime<Utc> {
        Utc::now() + Duration::seconds(3600)
    }

    #[test]
    fn test_register_then_valid() {
        let registry = SessionRegistry::new();
        let jti = Uuid::new_v4();

        registry.register(jti, Uuid::new_v4(), future());
        assert!(registry.is_valid(jti));
    }

    #[test]
    fn test_unknown_jti_is_invalid() {
        let registry = SessionRegistry::new();
        assert!(!registry.is_valid(Uuid::new_v4()));
    }

    #[test]
    fn test_revoke_invalidates() {
        let registry = SessionRegistry::new();
        let jti = Uuid::new_v4();

        registry.register(jti, Uuid::new_v4(), future());
        assert!(registry.revoke(jti));
        assert!(!registry.is_valid(jti));
    }

    #[test]
    fn test_revoke_is_idempotent() {
        let registry = SessionRegistry::new();
        let jti = Uuid::new_v4();

        registry.register(jti, Uuid::new_v4(), future());
        assert!(registry.revoke(jti));
        // Second revoke has no further effect and is still not an error
        assert!(registry.revoke(jti));
        assert!(!registry.is_valid(jti));
    }

    #[test]
    fn test_revoke_unknown_jti_does_not_panic() {
        let registry = SessionRegistry::new();
        assert!(!registry.revoke(Uuid::new_v4()));
    }

    #[test]
    fn test_expired_session_is_invalid_without_pruning() {
        let registry = SessionRegistry::new();
        let jti = Uuid::new_v4();

        registry.register(jti, Uuid::new_v4(), Utc::now() - Duration::seconds(1));
        assert!(!registry.is_valid(jti));
        // Entry is still present until pruned
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_prune_respects_grace_window() {
        let registry = SessionRegistry::new();
        let now = Utc::now();

        // Expired long ago, past the grace window
        registry.register(Uuid::new_v4(), Uuid::new_v4(), now - Duration::seconds(700));
        // Expired recently, still inside the grace window
        let recent = Uuid::new_v4();
        registry.register(recent, Uuid::new_v4(), now - Duration::seconds(10));
        // Live
        let live = Uuid::new_v4();
        registry.register(live, Uuid::new_v4(), now + Duration::seconds(3600));

        let removed = registry.prune(Duration::seconds(600));
        assert_eq!(removed, 1);
        assert_eq!(registry.len(), 2);
        assert!(registry.is_valid(live));
        assert!(!registry.is_valid(recent));
    }

    #[test]
    fn test_revocation_survives_concurrent_access() {
        use std::sync::Arc;

        let registry = Arc::new(SessionRegistry::new());
        let jti = Uuid::new_v4();
        registry.register(jti, Uuid::new_v4(), future());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                std::thread::spawn(move || registry.revoke(jti))
            })
            .collect();

        for handle in handles {
            assert!(handle.join().unwrap());
        }
        assert!(!registry.is_valid(jti));
    }
}
