//! Per-client session caches, keyed by the `sid` cookie.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use flashweb_auth::UserSession;
use flashweb_core::SessionId;

/// Cookie carrying the session id.
pub const SESSION_COOKIE: &str = "sid";

const DEFAULT_IDLE: Duration = Duration::from_secs(30 * 60);
const DEFAULT_CAPACITY: usize = 10_000;

struct Entry {
    session: Arc<UserSession>,
    last_seen: Instant,
    /// Key of this entry in `Sessions::by_recency`.
    stamp: u64,
}

#[derive(Default)]
struct Sessions {
    entries: HashMap<SessionId, Entry>,
    /// Least recently seen first.
    by_recency: BTreeMap<u64, SessionId>,
    next_stamp: u64,
}

impl Sessions {
    fn stamp(&mut self) -> u64 {
        let stamp = self.next_stamp;
        self.next_stamp += 1;
        stamp
    }

    fn evict_oldest(&mut self) {
        if let Some((_, id)) = self.by_recency.pop_first() {
            self.entries.remove(&id);
        }
    }

    /// Drop entries idle for `idle` or longer, oldest first.
    fn expire(&mut self, now: Instant, idle: Duration) {
        while let Some((_, id)) = self.by_recency.first_key_value() {
            let expired = self
                .entries
                .get(id)
                .is_none_or(|e| now.duration_since(e.last_seen) >= idle);
            if !expired {
                break;
            }
            self.evict_oldest();
        }
    }
}

/// Live sessions of this process. Lost on restart (the token cookie is not).
///
/// Bounded: at capacity the least recently seen session is evicted.
pub struct SessionRegistry {
    sessions: Mutex<Sessions>,
    idle_timeout: Duration,
    capacity: usize,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_IDLE, DEFAULT_CAPACITY)
    }
}

impl SessionRegistry {
    pub fn new(idle_timeout: Duration, capacity: usize) -> Self {
        Self {
            sessions: Mutex::new(Sessions::default()),
            idle_timeout,
            capacity: capacity.max(1),
        }
    }

    /// The session for `id`, or a brand new one under a fresh id.
    ///
    /// Unknown or idle-expired ids are never adopted; the bool is `true` when
    /// a new session was created.
    pub fn resolve(&self, id: Option<SessionId>) -> (SessionId, Arc<UserSession>, bool) {
        let now = Instant::now();
        let mut sessions = self.sessions.lock();
        sessions.expire(now, self.idle_timeout);

        if let Some(id) = id {
            let stamp = sessions.stamp();
            if let Some(entry) = sessions.entries.get_mut(&id) {
                let previous = std::mem::replace(&mut entry.stamp, stamp);
                entry.last_seen = now;
                let session = entry.session.clone();
                sessions.by_recency.remove(&previous);
                sessions.by_recency.insert(stamp, id);
                return (id, session, false);
            }
        }

        while sessions.entries.len() >= self.capacity {
            sessions.evict_oldest();
        }

        let id = SessionId::new();
        let session = Arc::new(UserSession::new());
        let stamp = sessions.stamp();
        sessions.by_recency.insert(stamp, id);
        sessions.entries.insert(
            id,
            Entry {
                session: session.clone(),
                last_seen: now,
                stamp,
            },
        );
        (id, session, true)
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
