use crate::fingerprint::Fingerprint;
use crate::model::Verdict;
use crate::storage::Store;
use rusqlite::{params, OptionalExtension};
use std::time::Duration;

/// Verdicts older than this are treated as misses.
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Fingerprint-keyed verdict store with time-based expiry.
///
/// Store failures never escape: `get` degrades to a miss and `put` to a
/// no-op, each logged at `warn`.
#[derive(Clone)]
pub struct VerdictCache {
    store: Store,
    ttl: Duration,
}

impl VerdictCache {
    pub fn new(store: Store) -> Self {
        Self::with_ttl(store, DEFAULT_TTL)
    }

    pub fn with_ttl(store: Store, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn get(&self, key: &Fingerprint) -> Option<Verdict> {
        match self.try_get(key) {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!(
                    event = "cache.unavailable",
                    op = "get",
                    key = %key,
                    error = %e,
                    "verdict cache read failed; treating as miss"
                );
                None
            }
        }
    }

    pub fn put(&self, key: &Fingerprint, verdict: &Verdict) {
        self.put_with_ttl(key, verdict, self.ttl)
    }

    pub fn put_with_ttl(&self, key: &Fingerprint, verdict: &Verdict, ttl: Duration) {
        if let Err(e) = self.try_put(key, verdict, ttl) {
            tracing::warn!(
                event = "cache.unavailable",
                op = "put",
                key = %key,
                error = %e,
                "verdict cache write failed; skipping"
            );
        }
    }

    fn try_get(&self, key: &Fingerprint) -> anyhow::Result<Option<Verdict>> {
        let conn = self.store.lock()?;
        let payload: Option<String> = conn
            .query_row(
                "SELECT payload_json FROM verdict_cache WHERE key=?1 AND expires_at_ms > ?2",
                params![key.as_str(), now_ms()],
                |r| r.get(0),
            )
            .optional()?;
        match payload {
            Some(s) => {
                let mut verdict: Verdict = serde_json::from_str(&s)?;
                verdict.cached = true;
                Ok(Some(verdict))
            }
            None => Ok(None),
        }
    }

    fn try_put(&self, key: &Fingerprint, verdict: &Verdict, ttl: Duration) -> anyhow::Result<()> {
        let mut to_store = verdict.clone();
        to_store.cached = false;
        let payload_json = serde_json::to_string(&to_store)?;
        let created = now_ms();
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        let expires = created.saturating_add(ttl_ms);

        let conn = self.store.lock()?;
        conn.execute(
            "INSERT INTO verdict_cache(key, payload_json, created_at_ms, expires_at_ms)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(key) DO UPDATE SET
                payload_json=excluded.payload_json,
                created_at_ms=excluded.created_at_ms,
                expires_at_ms=excluded.expires_at_ms",
            params![key.as_str(), payload_json, created, expires],
        )?;
        Ok(())
    }
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
