//! Data model shared by the schedule resolver, source materializer, and
//! mount state store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Audio output mount. Config/ownership lives in the relational store; the
/// director only reads it.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Mount {
    pub id: Uuid,
    pub station_id: Uuid,
    pub name: String,
    pub format: String,
    pub bitrate_kbps: i64,
    pub sample_rate_hz: i64,
    pub channels: i64,
}

impl Mount {
    pub fn default_for(id: Uuid, station_id: Uuid, name: impl Into<String>) -> Self {
        Mount {
            id,
            station_id,
            name: name.into(),
            format: "mp3".to_string(),
            bitrate_kbps: 128,
            sample_rate_hz: 44_100,
            channels: 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Media,
    Playlist,
    SmartBlock,
    ClockTemplate,
    Webstream,
    Live,
    /// A slot inside a clock template expanded to a smart block.
    Clock,
    /// A slot inside a clock template expanded to a playlist.
    ClockPlaylist,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Media => "media",
            SourceType::Playlist => "playlist",
            SourceType::SmartBlock => "smart_block",
            SourceType::ClockTemplate => "clock_template",
            SourceType::Webstream => "webstream",
            SourceType::Live => "live",
            SourceType::Clock => "clock",
            SourceType::ClockPlaylist => "clock_playlist",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecurrenceType {
    None,
    Daily,
    Weekdays,
    Weekly,
    Custom,
}

/// A crossfade override carried in `ScheduleEntry::metadata["crossfade"]`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CrossfadeOverride {
    #[serde(rename = "override")]
    pub is_override: bool,
    pub enabled: CrossfadeEnabled,
    pub duration_ms: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossfadeEnabled {
    On,
    Off,
    Inherit,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub id: Uuid,
    pub station_id: Uuid,
    pub mount_id: Uuid,
    pub source_type: SourceType,
    pub source_id: Uuid,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub recurrence_type: RecurrenceType,
    pub recurrence_days: Vec<u8>,
    pub recurrence_end_date: Option<DateTime<Utc>>,
    pub is_instance: bool,
    pub metadata: HashMap<String, serde_json::Value>,
}

impl ScheduleEntry {
    pub fn crossfade_override(&self) -> Option<CrossfadeOverride> {
        self.metadata
            .get("crossfade")
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    pub fn current_position(&self) -> Option<usize> {
        self.metadata
            .get("current_position")
            .and_then(|v| v.as_u64())
            .map(|v| v as usize)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnalysisState {
    Pending,
    Complete,
    Failed,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CuePoints {
    pub intro_end_sec: Option<f64>,
    pub outro_in_sec: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaItem {
    pub id: Uuid,
    pub station_id: Uuid,
    pub path: String,
    pub duration: f64,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub year: Option<i32>,
    pub genre: Option<String>,
    pub mood: Option<String>,
    pub language: Option<String>,
    pub bpm: Option<f64>,
    pub explicit: bool,
    pub cue_points: CuePoints,
    pub analysis_state: AnalysisState,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Playlist {
    pub id: Uuid,
    pub items: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmartBlock {
    pub id: Uuid,
    pub rules: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClockSlotType {
    SmartBlock,
    HardItem,
    Webstream,
    Playlist,
    Stopset,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClockSlot {
    pub position: i64,
    pub offset_in_hour: i64,
    #[serde(rename = "type")]
    pub kind: ClockSlotType,
    pub payload: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClockTemplate {
    pub id: Uuid,
    pub slots: Vec<ClockSlot>,
}

impl ClockTemplate {
    /// The slot whose `offset_in_hour` is the greatest not exceeding
    /// `minute_of_hour_seconds`, or `None` if every slot starts later.
    pub fn slot_for_offset(&self, minute_of_hour_seconds: i64) -> Option<&ClockSlot> {
        self.slots
            .iter()
            .filter(|s| s.offset_in_hour <= minute_of_hour_seconds)
            .max_by_key(|s| s.offset_in_hour)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebstreamHealth {
    Healthy,
    Degraded,
    Down,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Webstream {
    pub id: Uuid,
    pub urls: Vec<String>,
    pub current_index: usize,
    pub override_metadata: Option<String>,
    pub custom_metadata: Option<String>,
    pub buffer_ms: u32,
    pub passthrough_metadata: bool,
    pub health_status: WebstreamHealth,
}

impl Webstream {
    pub fn current_url(&self) -> Option<&str> {
        self.urls.get(self.current_index).map(|s| s.as_str())
    }
}

/// Per-mount runtime state, the in-memory portion of C5. Mirrors
/// `mount_playout_states` rows on transitions only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MountRuntimeState {
    pub mount_id: Uuid,
    pub station_id: Uuid,
    pub entry_id: Uuid,
    pub media_id: Option<Uuid>,
    pub source_type: SourceType,
    pub source_id: Uuid,
    pub position: usize,
    pub total_items: usize,
    pub items: Vec<Uuid>,
    pub started_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

impl MountRuntimeState {
    pub fn current_media(&self) -> Option<Uuid> {
        self.items.get(self.position).copied()
    }
}

/// `"<entry_id>@<occurrence_start_rfc3339nano>"`, the played-set key.
pub fn occurrence_key(entry_id: Uuid, occ_start: DateTime<Utc>) -> String {
    format!("{entry_id}@{}", occ_start.to_rfc3339_opts(chrono::SecondsFormat::Nanos, true))
}

#[derive(Debug, Clone, Copy)]
pub struct Occurrence {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryMode {
    Hard,
    Soft,
}

#[derive(Debug, Clone, Copy)]
pub struct StationPolicy {
    pub boundary_mode: BoundaryMode,
    pub soft_overrun: chrono::Duration,
    pub crossfade_enabled: bool,
    pub crossfade_duration: chrono::Duration,
    pub webrtc_rtp_port: u16,
}

#[derive(Debug, Clone, Copy)]
pub struct EffectiveCrossfade {
    pub enabled: bool,
    pub duration: chrono::Duration,
}
