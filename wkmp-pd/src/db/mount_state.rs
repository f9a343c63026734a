//! Persistence for `mount_playout_states`: upsert on transition, delete on
//! stop, pruned at startup. The 4 Hz tick never writes here directly.

use crate::model::{MountRuntimeState, SourceType};
use chrono::{DateTime, Duration, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

pub async fn upsert(db: &SqlitePool, state: &MountRuntimeState) -> crate::Result<()> {
    let items = serde_json::to_string(&state.items).unwrap_or_default();
    sqlx::query(
        r#"
        INSERT INTO mount_playout_states
            (mount_id, station_id, entry_id, media_id, source_type, source_id,
             position, total_items, items, started_at, ends_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(mount_id) DO UPDATE SET
            station_id = excluded.station_id,
            entry_id = excluded.entry_id,
            media_id = excluded.media_id,
            source_type = excluded.source_type,
            source_id = excluded.source_id,
            position = excluded.position,
            total_items = excluded.total_items,
            items = excluded.items,
            started_at = excluded.started_at,
            ends_at = excluded.ends_at
        "#,
    )
    .bind(state.mount_id.to_string())
    .bind(state.station_id.to_string())
    .bind(state.entry_id.to_string())
    .bind(state.media_id.map(|m| m.to_string()))
    .bind(state.source_type.as_str())
    .bind(state.source_id.to_string())
    .bind(state.position as i64)
    .bind(state.total_items as i64)
    .bind(items)
    .bind(state.started_at)
    .bind(state.ends_at)
    .execute(db)
    .await?;
    Ok(())
}

pub async fn delete(db: &SqlitePool, mount_id: Uuid) -> crate::Result<()> {
    sqlx::query("DELETE FROM mount_playout_states WHERE mount_id = ?")
        .bind(mount_id.to_string())
        .execute(db)
        .await?;
    Ok(())
}

#[derive(sqlx::FromRow)]
struct Row {
    mount_id: String,
    station_id: String,
    entry_id: String,
    media_id: Option<String>,
    source_type: String,
    source_id: String,
    position: i64,
    total_items: i64,
    items: String,
    started_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
}

fn row_into_model(row: Row) -> MountRuntimeState {
    let items: Vec<Uuid> = serde_json::from_str::<Vec<String>>(&row.items)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|s| Uuid::parse_str(&s).ok())
        .collect();

    let source_type = match row.source_type.as_str() {
        "media" => SourceType::Media,
        "playlist" => SourceType::Playlist,
        "smart_block" => SourceType::SmartBlock,
        "clock_template" => SourceType::ClockTemplate,
        "webstream" => SourceType::Webstream,
        "live" => SourceType::Live,
        "clock" => SourceType::Clock,
        "clock_playlist" => SourceType::ClockPlaylist,
        _ => SourceType::Media,
    };

    MountRuntimeState {
        mount_id: Uuid::parse_str(&row.mount_id).unwrap_or_default(),
        station_id: Uuid::parse_str(&row.station_id).unwrap_or_default(),
        entry_id: Uuid::parse_str(&row.entry_id).unwrap_or_default(),
        media_id: row.media_id.and_then(|s| Uuid::parse_str(&s).ok()),
        source_type,
        source_id: Uuid::parse_str(&row.source_id).unwrap_or_default(),
        position: row.position as usize,
        total_items: row.total_items as usize,
        items,
        started_at: row.started_at,
        ends_at: row.ends_at,
    }
}

pub async fn load(db: &SqlitePool, mount_id: Uuid) -> crate::Result<Option<MountRuntimeState>> {
    let row: Option<Row> = sqlx::query_as(
        "SELECT mount_id, station_id, entry_id, media_id, source_type, source_id, \
                position, total_items, items, started_at, ends_at \
         FROM mount_playout_states WHERE mount_id = ?",
    )
    .bind(mount_id.to_string())
    .fetch_optional(db)
    .await?;

    Ok(row.map(row_into_model))
}

/// Load every surviving row, used once at startup to repopulate the
/// in-memory registry so a resumed sequence's position (§4.5 "resume")
/// survives a process restart.
pub async fn load_all(db: &SqlitePool) -> crate::Result<Vec<MountRuntimeState>> {
    let rows: Vec<Row> = sqlx::query_as(
        "SELECT mount_id, station_id, entry_id, media_id, source_type, source_id, \
                position, total_items, items, started_at, ends_at \
         FROM mount_playout_states",
    )
    .fetch_all(db)
    .await?;

    Ok(rows.into_iter().map(row_into_model).collect())
}

/// Startup pruning: drop rows whose `ends_at` is more than 6 hours in the past.
pub async fn prune_stale(db: &SqlitePool, now: DateTime<Utc>) -> crate::Result<u64> {
    let floor = now - Duration::hours(6);
    let result = sqlx::query("DELETE FROM mount_playout_states WHERE ends_at < ?")
        .bind(floor)
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}
