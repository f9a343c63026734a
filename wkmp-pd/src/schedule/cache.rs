//! Schedule Cache (C1): the lookahead-window snapshot of schedule entries.

use crate::db::queries;
use crate::model::ScheduleEntry;
use chrono::{DateTime, Duration, Utc};
use sqlx::SqlitePool;
use tokio::sync::RwLock;
use tracing::warn;

const REFRESH_INTERVAL: Duration = Duration::seconds(2);

struct Snapshot {
    entries: Vec<ScheduleEntry>,
    fetched_at: DateTime<Utc>,
    dirty: bool,
}

/// Holds the latest fetch of schedule entries relevant to the lookahead
/// window. Never blocks a tick on the store: on fetch failure the previous
/// snapshot is served and marked dirty so the next tick retries.
pub struct ScheduleCache {
    inner: RwLock<Option<Snapshot>>,
}

impl ScheduleCache {
    pub fn new() -> Self {
        ScheduleCache { inner: RwLock::new(None) }
    }

    /// Flag the cache dirty, forcing a refresh on the next `snapshot` call.
    /// Called by the schedule-update event subscriber.
    pub async fn mark_dirty(&self) {
        if let Some(snap) = self.inner.write().await.as_mut() {
            snap.dirty = true;
        }
    }

    /// Return the current snapshot, refreshing from the store first if the
    /// cache is empty, dirty, or older than the refresh interval.
    pub async fn snapshot(&self, db: &SqlitePool, now: DateTime<Utc>) -> Vec<ScheduleEntry> {
        let needs_refresh = {
            let guard = self.inner.read().await;
            match guard.as_ref() {
                None => true,
                Some(s) => s.dirty || now - s.fetched_at > REFRESH_INTERVAL,
            }
        };

        if needs_refresh {
            match queries::fetch_lookahead_entries(db, now).await {
                Ok(entries) => {
                    let mut guard = self.inner.write().await;
                    *guard = Some(Snapshot { entries: entries.clone(), fetched_at: now, dirty: false });
                    return entries;
                }
                Err(e) => {
                    warn!(error = %e, "schedule cache refresh failed, serving stale snapshot");
                    let mut guard = self.inner.write().await;
                    if let Some(s) = guard.as_mut() {
                        s.dirty = true;
                    }
                }
            }
        }

        self.inner
            .read()
            .await
            .as_ref()
            .map(|s| s.entries.clone())
            .unwrap_or_default()
    }
}

impl Default for ScheduleCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_cache_is_empty_snapshot_without_a_pool() {
        let cache = ScheduleCache::new();
        // No refresh attempted because guard is read directly after a
        // failed fetch would mark dirty; here we only check the
        // uninitialized-state default.
        let guard = cache.inner.read().await;
        assert!(guard.is_none());
    }

    #[tokio::test]
    async fn mark_dirty_on_empty_cache_is_a_no_op() {
        let cache = ScheduleCache::new();
        cache.mark_dirty().await;
        assert!(cache.inner.read().await.is_none());
    }
}
