//! Source Materializer (C4): expands a schedule entry's source type into a
//! deterministic, position-tracked sequence of media items.

use crate::db::queries;
use crate::error::MaterializeError;
use crate::model::{ClockSlotType, MountRuntimeState, ScheduleEntry, SourceType};
use chrono::{DateTime, Timelike, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

/// Result of materializing one schedule entry into a sequence, per the
/// design notes' `MaterializedSequence { items, total, position }` shape.
#[derive(Debug, Clone)]
pub struct MaterializedSequence {
    pub items: Vec<Uuid>,
    pub total: usize,
    pub position: usize,
    pub source_type: SourceType,
    pub source_id: Uuid,
}

impl MaterializedSequence {
    pub fn current_media(&self) -> Option<Uuid> {
        self.items.get(self.position).copied()
    }

    fn single(media_id: Uuid, source_type: SourceType, source_id: Uuid) -> Self {
        MaterializedSequence { items: vec![media_id], total: 1, position: 0, source_type, source_id }
    }
}

/// Entry point for §4.5: checks resume-from-state first, then dispatches
/// by `source_type`. Never re-rolls a non-deterministic source while the
/// same schedule entry is still the one active on the mount.
pub async fn materialize(
    db: &SqlitePool,
    entry: &ScheduleEntry,
    existing: Option<&MountRuntimeState>,
    now: DateTime<Utc>,
) -> crate::Result<MaterializedSequence> {
    if let Some(existing) = existing {
        if existing.entry_id == entry.id && !existing.items.is_empty() {
            return Ok(MaterializedSequence {
                items: existing.items.clone(),
                total: existing.total_items,
                position: existing.position,
                source_type: existing.source_type,
                source_id: existing.source_id,
            });
        }
    }

    match entry.source_type {
        SourceType::Media => materialize_media(entry).await,
        SourceType::Playlist => materialize_playlist(db, entry).await,
        SourceType::SmartBlock => materialize_smart_block(db, entry, now).await,
        SourceType::ClockTemplate => materialize_clock_template(db, entry, now).await,
        SourceType::Webstream => materialize_webstream(entry).await,
        SourceType::Live => Ok(MaterializedSequence { items: vec![], total: 0, position: 0, source_type: SourceType::Live, source_id: entry.source_id }),
        // Clock/ClockPlaylist are only produced internally by the clock
        // template handler, never as a top-level schedule entry type.
        SourceType::Clock | SourceType::ClockPlaylist => {
            Err(MaterializeError::EmptySequence("clock slot dispatched as top-level entry".into()).into())
        }
    }
}

async fn materialize_media(entry: &ScheduleEntry) -> crate::Result<MaterializedSequence> {
    Ok(MaterializedSequence::single(entry.source_id, SourceType::Media, entry.source_id))
}

async fn materialize_playlist(db: &SqlitePool, entry: &ScheduleEntry) -> crate::Result<MaterializedSequence> {
    let playlist = queries::fetch_playlist(db, entry.source_id).await?;
    if playlist.items.is_empty() {
        return Err(MaterializeError::EmptySequence("playlist".into()).into());
    }
    let position = entry
        .current_position()
        .map(|p| p % playlist.items.len())
        .unwrap_or(0);
    Ok(MaterializedSequence {
        total: playlist.items.len(),
        items: playlist.items,
        position,
        source_type: SourceType::Playlist,
        source_id: entry.source_id,
    })
}

/// Invoke the external smart-block rule engine; on failure or empty
/// result, fall back to one random analysis-complete media for the
/// station.
async fn materialize_smart_block(db: &SqlitePool, entry: &ScheduleEntry, now: DateTime<Utc>) -> crate::Result<MaterializedSequence> {
    let duration_ms = (entry.ends_at - entry.starts_at).num_milliseconds().max(0) as u64;
    let seed = now.timestamp_nanos_opt().unwrap_or_default();

    let items = match run_smart_block_rules(db, entry.source_id, seed, duration_ms, entry.station_id, entry.mount_id).await {
        Ok(items) if !items.is_empty() => items,
        _ => {
            let fallback = queries::fetch_random_analyzed_media(db, entry.station_id)
                .await?
                .ok_or_else(|| MaterializeError::EmptySequence("smart_block fallback".into()))?;
            vec![fallback]
        }
    };

    Ok(MaterializedSequence {
        total: items.len(),
        items,
        position: 0,
        source_type: SourceType::SmartBlock,
        source_id: entry.source_id,
    })
}

/// The smart-block rule engine is an external collaborator invoked as a
/// pure function; here it is reached through the relational store's
/// `smart_blocks.rules` payload alone, since this crate has no in-process
/// rule evaluator. A real deployment wires this to the external engine's
/// RPC surface; this function is the seam where that call would land.
async fn run_smart_block_rules(
    db: &SqlitePool,
    smart_block_id: Uuid,
    _seed: i64,
    _duration_ms: u64,
    _station_id: Uuid,
    _mount_id: Uuid,
) -> crate::Result<Vec<Uuid>> {
    let block = queries::fetch_smart_block(db, smart_block_id).await?;
    let explicit_items = block
        .rules
        .get("items")
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_str())
                .filter_map(|s| Uuid::parse_str(s).ok())
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();
    Ok(explicit_items)
}

async fn materialize_clock_template(db: &SqlitePool, entry: &ScheduleEntry, now: DateTime<Utc>) -> crate::Result<MaterializedSequence> {
    let clock = queries::fetch_clock_template(db, entry.source_id).await?;
    let minute_of_hour_seconds = (now.minute() as i64) * 60 + now.second() as i64;
    let slot = clock
        .slot_for_offset(minute_of_hour_seconds)
        .ok_or(MaterializeError::ClockTemplateGap(entry.source_id))?;

    match slot.kind {
        ClockSlotType::SmartBlock => {
            let smart_block_id = payload_uuid(&slot.payload, "smart_block_id")?;
            let mut sub_entry = entry.clone();
            sub_entry.source_id = smart_block_id;
            let mut seq = materialize_smart_block(db, &sub_entry, now).await?;
            seq.source_type = SourceType::Clock;
            Ok(seq)
        }
        ClockSlotType::HardItem => {
            let media_id = payload_uuid(&slot.payload, "media_id")?;
            Ok(MaterializedSequence::single(media_id, SourceType::ClockTemplate, entry.source_id))
        }
        ClockSlotType::Webstream => {
            let webstream_id = payload_uuid(&slot.payload, "webstream_id")?;
            let mut sub_entry = entry.clone();
            sub_entry.source_id = webstream_id;
            materialize_webstream(&sub_entry).await
        }
        ClockSlotType::Playlist => {
            let playlist_id = payload_uuid(&slot.payload, "playlist_id")?;
            let mut sub_entry = entry.clone();
            sub_entry.source_id = playlist_id;
            let mut seq = materialize_playlist(db, &sub_entry).await?;
            seq.source_type = SourceType::ClockPlaylist;
            Ok(seq)
        }
        ClockSlotType::Stopset => {
            if let Ok(playlist_id) = payload_uuid(&slot.payload, "playlist_id") {
                let mut sub_entry = entry.clone();
                sub_entry.source_id = playlist_id;
                return materialize_playlist(db, &sub_entry).await;
            }
            if let Ok(media_id) = payload_uuid(&slot.payload, "media_id") {
                return Ok(MaterializedSequence::single(media_id, SourceType::ClockTemplate, entry.source_id));
            }
            let fallback = queries::fetch_random_analyzed_media(db, entry.station_id)
                .await?
                .ok_or_else(|| MaterializeError::EmptySequence("stopset fallback".into()))?;
            Ok(MaterializedSequence::single(fallback, SourceType::ClockTemplate, entry.source_id))
        }
    }
}

fn payload_uuid(payload: &serde_json::Value, key: &str) -> crate::Result<Uuid> {
    payload
        .get(key)
        .and_then(|v| v.as_str())
        .and_then(|s| Uuid::parse_str(s).ok())
        .ok_or_else(|| MaterializeError::SmartBlockFailed(format!("missing/invalid {key} in slot payload")).into())
}

async fn materialize_webstream(entry: &ScheduleEntry) -> crate::Result<MaterializedSequence> {
    // The webstream's own current_index/url resolution is the pipeline
    // supervisor's concern (§4.5 "start the relay pipeline"); the
    // materializer only records that this entry's source is a webstream
    // with no discrete item sequence.
    Ok(MaterializedSequence { items: vec![], total: 0, position: 0, source_type: SourceType::Webstream, source_id: entry.source_id })
}

/// Resolve a stored playback offset against a media item's known duration,
/// per the contract named (but not fully specified) for this helper: clamp
/// any offset exceeding `duration - 1s`, and treat anything under ~2s as
/// "start from the top" rather than a fiddly near-zero resume.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResumeDecision {
    FromStart,
    FromOffsetMs(u64),
}

pub fn compute_playback_resume(stored_offset_ms: u64, duration_ms: u64) -> ResumeDecision {
    if stored_offset_ms < 2_000 {
        return ResumeDecision::FromStart;
    }
    let ceiling = duration_ms.saturating_sub(1_000);
    ResumeDecision::FromOffsetMs(stored_offset_ms.min(ceiling))
}
