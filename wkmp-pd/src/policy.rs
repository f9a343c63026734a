//! Policy Cache (C3): per-station settings with a 30 s TTL, and the
//! effective-crossfade override resolution rule.

use crate::model::{BoundaryMode, CrossfadeEnabled, EffectiveCrossfade, ScheduleEntry, StationPolicy};
use chrono::Duration;
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::time::Instant;
use tokio::sync::Mutex;
use uuid::Uuid;

const TTL: std::time::Duration = std::time::Duration::from_secs(30);

struct CacheEntry {
    policy: StationPolicy,
    fetched_at: Instant,
}

pub struct PolicyCache {
    inner: Mutex<HashMap<Uuid, CacheEntry>>,
}

impl PolicyCache {
    pub fn new() -> Self {
        PolicyCache { inner: Mutex::new(HashMap::new()) }
    }

    pub async fn get(&self, db: &SqlitePool, station_id: Uuid) -> crate::Result<StationPolicy> {
        {
            let guard = self.inner.lock().await;
            if let Some(entry) = guard.get(&station_id) {
                if entry.fetched_at.elapsed() < TTL {
                    return Ok(entry.policy);
                }
            }
        }

        let policy = crate::db::queries::fetch_station_policy(db, station_id).await?;
        let mut guard = self.inner.lock().await;
        guard.insert(station_id, CacheEntry { policy, fetched_at: Instant::now() });
        Ok(policy)
    }
}

impl Default for PolicyCache {
    fn default() -> Self {
        Self::new()
    }
}

/// The effective crossfade for an entry: the station policy, overridden by
/// `entry.metadata.crossfade` when `override=true`.
pub fn effective_crossfade(entry: &ScheduleEntry, policy: &StationPolicy) -> EffectiveCrossfade {
    let Some(ovr) = entry.crossfade_override() else {
        return EffectiveCrossfade {
            enabled: policy.crossfade_enabled,
            duration: policy.crossfade_duration,
        };
    };

    if !ovr.is_override {
        return EffectiveCrossfade {
            enabled: policy.crossfade_enabled,
            duration: policy.crossfade_duration,
        };
    }

    let enabled = match ovr.enabled {
        CrossfadeEnabled::On => true,
        CrossfadeEnabled::Off => false,
        CrossfadeEnabled::Inherit => policy.crossfade_enabled,
    };

    let duration_ms = ovr.duration_ms.clamp(0, 30_000);
    let duration = Duration::milliseconds(duration_ms as i64);

    // duration == 0 disables crossfade for transition purposes even if
    // enabled is true.
    let enabled = enabled && duration_ms > 0;

    EffectiveCrossfade { enabled, duration }
}

pub fn default_policy() -> StationPolicy {
    StationPolicy {
        boundary_mode: BoundaryMode::Hard,
        soft_overrun: Duration::zero(),
        crossfade_enabled: false,
        crossfade_duration: Duration::zero(),
        webrtc_rtp_port: 0,
    }
}
