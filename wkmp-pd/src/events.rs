//! Director-specific events broadcast on their own bus, following
//! `wkmp_common::events::EventBus`'s wrapper over `tokio::sync::broadcast`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Playing,
    Ended,
    EmergencyStop,
    SourceChange,
    Crossfade,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DirectorEvent {
    NowPlaying {
        entry_id: Uuid,
        station_id: Uuid,
        mount_id: Uuid,
        source_type: String,
        source_id: Uuid,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
        metadata: Value,
    },
    Health {
        station_id: Uuid,
        mount_id: Uuid,
        entry_id: Uuid,
        media_id: Option<Uuid>,
        started_at: DateTime<Utc>,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
        status: HealthStatus,
    },
    WebstreamHealth { webstream_id: Uuid, healthy: bool },
    WebstreamFailover { webstream_id: Uuid, from_index: usize, to_index: usize },
    WebstreamRecovered { webstream_id: Uuid },
    /// Published by the relational store's external change-notification
    /// path (§4.1 trigger (a)); the director only subscribes to this, it
    /// never emits it itself.
    ScheduleUpdate,
}

impl DirectorEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            DirectorEvent::NowPlaying { .. } => "now_playing",
            DirectorEvent::Health { .. } => "health",
            DirectorEvent::WebstreamHealth { .. } => "webstream_health",
            DirectorEvent::WebstreamFailover { .. } => "webstream_failover",
            DirectorEvent::WebstreamRecovered { .. } => "webstream_recovered",
            DirectorEvent::ScheduleUpdate => "schedule_update",
        }
    }
}

/// Broadcast wrapper around `tokio::sync::broadcast`, mirroring
/// `wkmp_common::events::EventBus`.
pub struct EventBus {
    tx: broadcast::Sender<DirectorEvent>,
    capacity: usize,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        EventBus { tx, capacity }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DirectorEvent> {
        self.tx.subscribe()
    }

    pub fn emit(&self, event: DirectorEvent) -> Result<usize, broadcast::error::SendError<DirectorEvent>> {
        self.tx.send(event)
    }

    /// Emit without caring whether anyone is listening.
    pub fn emit_lossy(&self, event: DirectorEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
