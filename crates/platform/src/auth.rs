//! Session management: opaque bearer tokens bound to an admin's role.
//!
//! Tokens are 32 random bytes from the OS generator, hex encoded. The table is
//! keyed by the SHA-256 of the token, so a dump of it cannot be replayed.
//! Validation never extends a session's lifetime.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use grievance_core::types::Role;
use grievance_core::{GrievanceError, GrievanceResult};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::directory::AdminAccount;

const TOKEN_PREFIX: &str = "gx_";
const TOKEN_BYTES: usize = 32;

/// A live session as seen by callers.
#[derive(Debug, Clone)]
pub struct Session {
    pub username: String,
    pub role: Role,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    started: Instant,
}

impl Session {
    fn is_expired(&self, ttl: Duration) -> bool {
        self.started.elapsed() >= ttl
    }
}

/// Issues, validates and revokes admin sessions. Safe to share across request handlers.
pub struct SessionManager {
    sessions: DashMap<String, Session>,
    ttl: Duration,
}

impl SessionManager {
    pub fn new(ttl: Duration) -> Self {
        info!(ttl_secs = ttl.as_secs(), "Session manager initialized");
        Self {
            sessions: DashMap::new(),
            ttl,
        }
    }

    /// Create a session for an authenticated account. Returns the token and the
    /// session it resolves to.
    pub fn issue(&self, account: &AdminAccount) -> (String, Session) {
        let token = generate_token();
        let now = Utc::now();
        let expires_at = chrono::Duration::from_std(self.ttl)
            .ok()
            .and_then(|ttl| now.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let session = Session {
            username: account.username.clone(),
            role: account.role,
            issued_at: now,
            expires_at,
            started: Instant::now(),
        };
        self.sessions.insert(token_key(&token), session.clone());
        info!(username = %account.username, role = %account.role, "Session issued");
        (token, session)
    }

    /// Resolve a token to its session. Absent, expired and revoked tokens all
    /// fail the same way.
    pub fn validate(&self, token: &str) -> GrievanceResult<Session> {
        let key = token_key(token);
        let session = self
            .sessions
            .get(&key)
            .map(|entry| entry.value().clone())
            .ok_or(GrievanceError::SessionInvalid)?;

        if session.is_expired(self.ttl) {
            let ttl = self.ttl;
            self.sessions.remove_if(&key, |_, s| s.is_expired(ttl));
            debug!(username = %session.username, "Expired session rejected");
            return Err(GrievanceError::SessionInvalid);
        }
        Ok(session)
    }

    /// Remove a session. Unknown tokens are a no-op.
    pub fn revoke(&self, token: &str) {
        if let Some((_, session)) = self.sessions.remove(&token_key(token)) {
            info!(username = %session.username, "Session revoked");
        }
    }

    /// Drop every expired session. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let ttl = self.ttl;
        let mut removed = 0;
        self.sessions.retain(|_, s| {
            let keep = !s.is_expired(ttl);
            if !keep {
                removed += 1;
            }
            keep
        });
        if removed > 0 {
            info!(removed, "Expired sessions purged");
        }
        removed
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }
}

fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    format!("{}{}", TOKEN_PREFIX, hex::encode(bytes))
}

fn token_key(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}
