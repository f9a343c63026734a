//! Read-mostly queries against the relational store, plus the one write
//! path that lives outside `mount_state` (play history insert, playlist
//! position advance).

use crate::error::StoreError;
use crate::model::{
    BoundaryMode, ClockSlot, ClockSlotType, ClockTemplate, CuePoints, Mount, MediaItem,
    Playlist, RecurrenceType, ScheduleEntry, SmartBlock, SourceType, StationPolicy, Webstream,
    WebstreamHealth,
};
use chrono::{DateTime, Duration, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

/// Row shape for `schedule_entries`, converted into [`ScheduleEntry`] below
/// the way `wkmp-ap`'s queue manager converts DB rows into runtime types.
#[derive(sqlx::FromRow)]
struct ScheduleEntryRow {
    id: String,
    station_id: String,
    mount_id: String,
    source_type: String,
    source_id: String,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    recurrence_type: String,
    recurrence_days: String,
    recurrence_end_date: Option<DateTime<Utc>>,
    is_instance: bool,
    metadata: String,
}

impl ScheduleEntryRow {
    fn into_model(self) -> crate::Result<ScheduleEntry> {
        let source_type = match self.source_type.as_str() {
            "media" => SourceType::Media,
            "playlist" => SourceType::Playlist,
            "smart_block" => SourceType::SmartBlock,
            "clock_template" => SourceType::ClockTemplate,
            "webstream" => SourceType::Webstream,
            "live" => SourceType::Live,
            other => {
                return Err(StoreError::MalformedRow(format!("unknown source_type {other}")).into())
            }
        };
        let recurrence_type = match self.recurrence_type.as_str() {
            "none" => RecurrenceType::None,
            "daily" => RecurrenceType::Daily,
            "weekdays" => RecurrenceType::Weekdays,
            "weekly" => RecurrenceType::Weekly,
            "custom" => RecurrenceType::Custom,
            other => {
                return Err(StoreError::MalformedRow(format!("unknown recurrence_type {other}")).into())
            }
        };
        let recurrence_days = if self.recurrence_days.is_empty() {
            vec![]
        } else {
            self.recurrence_days
                .split(',')
                .filter_map(|s| s.trim().parse::<u8>().ok())
                .collect()
        };
        let metadata = serde_json::from_str(&self.metadata).unwrap_or_default();

        Ok(ScheduleEntry {
            id: parse_uuid(&self.id)?,
            station_id: parse_uuid(&self.station_id)?,
            mount_id: parse_uuid(&self.mount_id)?,
            source_type,
            source_id: parse_uuid(&self.source_id)?,
            starts_at: self.starts_at,
            ends_at: self.ends_at,
            recurrence_type,
            recurrence_days,
            recurrence_end_date: self.recurrence_end_date,
            is_instance: self.is_instance,
            metadata,
        })
    }
}

fn parse_uuid(s: &str) -> crate::Result<Uuid> {
    Uuid::parse_str(s).map_err(|e| StoreError::MalformedRow(format!("invalid uuid {s}: {e}")).into())
}

/// Fetch schedule entries intersecting the lookahead window: non-recurring
/// entries whose `[starts_at-30s, ends_at+2s]` overlaps now, and recurring
/// templates whose `starts_at_template <= now+30s`, excluding entries whose
/// `recurrence_end_date` is set and before `today-1`.
pub async fn fetch_lookahead_entries(
    db: &SqlitePool,
    now: DateTime<Utc>,
) -> crate::Result<Vec<ScheduleEntry>> {
    let window_start = now - Duration::seconds(30);
    let window_end = now + Duration::seconds(2);
    let lookahead_floor = now + Duration::seconds(30);
    let floor = now - Duration::days(1);

    let rows: Vec<ScheduleEntryRow> = sqlx::query_as(
        r#"
        SELECT id, station_id, mount_id, source_type, source_id, starts_at, ends_at,
               recurrence_type, recurrence_days, recurrence_end_date, is_instance, metadata
        FROM schedule_entries
        WHERE
            (recurrence_type = 'none' AND starts_at <= ?2 AND ends_at >= ?1)
            OR (recurrence_type != 'none' AND starts_at <= ?3
                AND (recurrence_end_date IS NULL OR recurrence_end_date >= ?4))
        "#,
    )
    .bind(window_start)
    .bind(window_end)
    .bind(lookahead_floor)
    .bind(floor)
    .fetch_all(db)
    .await?;

    rows.into_iter().map(ScheduleEntryRow::into_model).collect()
}

pub async fn fetch_station_policy(db: &SqlitePool, station_id: Uuid) -> crate::Result<StationPolicy> {
    #[derive(sqlx::FromRow)]
    struct Row {
        boundary_mode: String,
        soft_overrun_ms: i64,
        crossfade_enabled: bool,
        crossfade_duration_ms: i64,
        webrtc_rtp_port: i64,
    }

    let row: Option<Row> = sqlx::query_as(
        "SELECT boundary_mode, soft_overrun_ms, crossfade_enabled, crossfade_duration_ms, webrtc_rtp_port \
         FROM stations WHERE id = ?",
    )
    .bind(station_id.to_string())
    .fetch_optional(db)
    .await?;

    let Some(row) = row else {
        return Ok(crate::policy::default_policy());
    };

    Ok(StationPolicy {
        boundary_mode: if row.boundary_mode == "soft" { BoundaryMode::Soft } else { BoundaryMode::Hard },
        soft_overrun: Duration::milliseconds(row.soft_overrun_ms),
        crossfade_enabled: row.crossfade_enabled,
        crossfade_duration: Duration::milliseconds(row.crossfade_duration_ms),
        webrtc_rtp_port: row.webrtc_rtp_port as u16,
    })
}

pub async fn fetch_mount(db: &SqlitePool, mount_id: Uuid) -> crate::Result<Mount> {
    sqlx::query_as("SELECT id, station_id, name, format, bitrate_kbps, sample_rate_hz, channels FROM mounts WHERE id = ?")
        .bind(mount_id.to_string())
        .fetch_optional(db)
        .await?
        .ok_or_else(|| StoreError::MountNotFound(mount_id).into())
}

pub async fn fetch_media_item(db: &SqlitePool, media_id: Uuid) -> crate::Result<MediaItem> {
    #[derive(sqlx::FromRow)]
    struct Row {
        id: String,
        station_id: String,
        path: String,
        duration: f64,
        title: Option<String>,
        artist: Option<String>,
        album: Option<String>,
        year: Option<i64>,
        genre: Option<String>,
        mood: Option<String>,
        language: Option<String>,
        bpm: Option<f64>,
        explicit: bool,
        intro_end_sec: Option<f64>,
        outro_in_sec: Option<f64>,
        analysis_state: String,
    }

    let row: Option<Row> = sqlx::query_as(
        "SELECT id, station_id, path, duration, title, artist, album, year, genre, mood, \
                language, bpm, explicit, intro_end_sec, outro_in_sec, analysis_state \
         FROM media_items WHERE id = ?",
    )
    .bind(media_id.to_string())
    .fetch_optional(db)
    .await?;

    let row = row.ok_or(StoreError::MediaItemNotFound(media_id))?;

    Ok(MediaItem {
        id: parse_uuid(&row.id)?,
        station_id: parse_uuid(&row.station_id)?,
        path: row.path,
        duration: row.duration,
        title: row.title,
        artist: row.artist,
        album: row.album,
        year: row.year.map(|y| y as i32),
        genre: row.genre,
        mood: row.mood,
        language: row.language,
        bpm: row.bpm,
        explicit: row.explicit,
        cue_points: CuePoints { intro_end_sec: row.intro_end_sec, outro_in_sec: row.outro_in_sec },
        analysis_state: match row.analysis_state.as_str() {
            "complete" => crate::model::AnalysisState::Complete,
            "failed" => crate::model::AnalysisState::Failed,
            _ => crate::model::AnalysisState::Pending,
        },
    })
}

/// One random analysis-complete media item for the station, the universal
/// fallback when a sequence is empty or exhausted.
pub async fn fetch_random_analyzed_media(db: &SqlitePool, station_id: Uuid) -> crate::Result<Option<Uuid>> {
    let row: Option<(String,)> = sqlx::query_as(
        "SELECT id FROM media_items WHERE station_id = ? AND analysis_state = 'complete' \
         ORDER BY RANDOM() LIMIT 1",
    )
    .bind(station_id.to_string())
    .fetch_optional(db)
    .await?;

    row.map(|(id,)| parse_uuid(&id)).transpose()
}

pub async fn fetch_playlist(db: &SqlitePool, playlist_id: Uuid) -> crate::Result<Playlist> {
    let rows: Vec<(String,)> = sqlx::query_as(
        "SELECT media_id FROM playlist_items WHERE playlist_id = ? ORDER BY position",
    )
    .bind(playlist_id.to_string())
    .fetch_all(db)
    .await?;

    let items = rows.into_iter().map(|(id,)| parse_uuid(&id)).collect::<crate::Result<Vec<_>>>()?;
    Ok(Playlist { id: playlist_id, items })
}

pub async fn fetch_smart_block(db: &SqlitePool, smart_block_id: Uuid) -> crate::Result<SmartBlock> {
    let row: (String,) = sqlx::query_as("SELECT rules FROM smart_blocks WHERE id = ?")
        .bind(smart_block_id.to_string())
        .fetch_one(db)
        .await?;
    let rules = serde_json::from_str(&row.0).unwrap_or(serde_json::Value::Null);
    Ok(SmartBlock { id: smart_block_id, rules })
}

pub async fn fetch_clock_template(db: &SqlitePool, clock_id: Uuid) -> crate::Result<ClockTemplate> {
    #[derive(sqlx::FromRow)]
    struct Row {
        position: i64,
        offset_in_hour: i64,
        slot_type: String,
        payload: String,
    }

    let rows: Vec<Row> = sqlx::query_as(
        "SELECT position, offset_in_hour, slot_type, payload FROM clock_slots \
         WHERE clock_id = ? ORDER BY position",
    )
    .bind(clock_id.to_string())
    .fetch_all(db)
    .await?;

    let slots = rows
        .into_iter()
        .map(|r| -> crate::Result<ClockSlot> {
            let kind = match r.slot_type.as_str() {
                "smart_block" => ClockSlotType::SmartBlock,
                "hard_item" => ClockSlotType::HardItem,
                "webstream" => ClockSlotType::Webstream,
                "playlist" => ClockSlotType::Playlist,
                "stopset" => ClockSlotType::Stopset,
                other => {
                    return Err(StoreError::MalformedRow(format!("unknown slot type {other}")).into())
                }
            };
            Ok(ClockSlot {
                position: r.position,
                offset_in_hour: r.offset_in_hour,
                kind,
                payload: serde_json::from_str(&r.payload).unwrap_or(serde_json::Value::Null),
            })
        })
        .collect::<crate::Result<Vec<_>>>()?;

    Ok(ClockTemplate { id: clock_id, slots })
}

pub async fn fetch_webstream(db: &SqlitePool, webstream_id: Uuid) -> crate::Result<Webstream> {
    #[derive(sqlx::FromRow)]
    struct Row {
        urls: String,
        current_index: i64,
        override_metadata: Option<String>,
        custom_metadata: Option<String>,
        buffer_ms: i64,
        passthrough_metadata: bool,
        health_status: String,
    }

    let row: Row = sqlx::query_as(
        "SELECT urls, current_index, override_metadata, custom_metadata, buffer_ms, \
                passthrough_metadata, health_status FROM webstreams WHERE id = ?",
    )
    .bind(webstream_id.to_string())
    .fetch_one(db)
    .await?;

    Ok(Webstream {
        id: webstream_id,
        urls: row.urls.split(',').map(|s| s.to_string()).collect(),
        current_index: row.current_index as usize,
        override_metadata: row.override_metadata,
        custom_metadata: row.custom_metadata,
        buffer_ms: row.buffer_ms as u32,
        passthrough_metadata: row.passthrough_metadata,
        health_status: match row.health_status.as_str() {
            "degraded" => WebstreamHealth::Degraded,
            "down" => WebstreamHealth::Down,
            _ => WebstreamHealth::Healthy,
        },
    })
}

/// Record one row per entry launch.
pub async fn insert_play_history(
    db: &SqlitePool,
    entry_id: Uuid,
    mount_id: Uuid,
    media_id: Option<Uuid>,
    started_at: DateTime<Utc>,
) -> crate::Result<()> {
    sqlx::query(
        "INSERT INTO play_history (entry_id, mount_id, media_id, started_at) VALUES (?, ?, ?, ?)",
    )
    .bind(entry_id.to_string())
    .bind(mount_id.to_string())
    .bind(media_id.map(|m| m.to_string()))
    .bind(started_at)
    .execute(db)
    .await?;
    Ok(())
}

/// Advance `schedule_entries.metadata.current_position` for a playlist entry.
pub async fn persist_playlist_position(db: &SqlitePool, entry_id: Uuid, position: usize) -> crate::Result<()> {
    let row: (String,) = sqlx::query_as("SELECT metadata FROM schedule_entries WHERE id = ?")
        .bind(entry_id.to_string())
        .fetch_one(db)
        .await?;

    let mut metadata: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(&row.0).unwrap_or_default();
    metadata.insert("current_position".to_string(), serde_json::json!(position));

    sqlx::query("UPDATE schedule_entries SET metadata = ? WHERE id = ?")
        .bind(serde_json::Value::Object(metadata).to_string())
        .bind(entry_id.to_string())
        .execute(db)
        .await?;
    Ok(())
}
