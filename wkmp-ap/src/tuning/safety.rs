//! Settings backup and restore for safety
//!
//! **Purpose:** Preserve user settings before tuning and restore on abort/failure.
//!
//! **Traceability:**
//! - TUNE-SAFE-010: Settings backup and restore
//! - TUNE-OUT-020: Database update with backup

use crate::db::settings::{load_clamped_setting, set_setting};
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Pool, Sqlite};
use std::path::PathBuf;

/// Backup of user settings before tuning
///
/// Captures mixer_check_interval_ms and audio_buffer_size values
/// for restoration if tuning is aborted or fails.
///
/// **Traceability:** TUNE-SAFE-010
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsBackup {
    /// Mixer check interval in milliseconds
    pub mixer_check_interval_ms: u64,

    /// Audio buffer size in frames
    pub audio_buffer_size: u32,

    /// When backup was created
    pub timestamp: DateTime<Utc>,
}

impl SettingsBackup {
    /// Get path to temporary backup file
    ///
    /// Uses system temp directory + predictable filename.
    ///
    /// # Returns
    /// PathBuf to backup file location
    fn backup_file_path() -> PathBuf {
        std::env::temp_dir().join("wkmp_tuning_backup.json")
    }
}

/// Backup current settings to memory and temp file
///
/// Reads both tuning-related parameters from database and stores them
/// in a SettingsBackup struct. Also writes to temp file as safety measure.
///
/// **Parameters Backed Up:**
/// - mixer_check_interval_ms (DBD-PARAM-111): Range 1-100ms, default 5ms
/// - audio_buffer_size (DBD-PARAM-110): Range 64-8192 frames, default 512
///
/// **Traceability:** TUNE-SAFE-010
///
/// # Arguments
/// - `db`: Database connection pool
///
/// # Returns
/// SettingsBackup with current parameter values
///
/// # Errors
/// Returns error if:
/// - Database read fails
/// - Temp file write fails (non-fatal - continues with in-memory backup)
pub async fn backup_settings(db: &Pool<Sqlite>) -> Result<SettingsBackup> {
    // Read current values from database (or use defaults)
    let mixer_check_interval_ms = load_clamped_setting(
        db,
        "mixer_check_interval_ms",
        1u64,
        100u64,
        5u64,
    )
    .await?;

    let audio_buffer_size = load_clamped_setting(
        db,
        "audio_buffer_size",
        64u32,
        8192u32,
        512u32,
    )
    .await?;

    let backup = SettingsBackup {
        mixer_check_interval_ms,
        audio_buffer_size,
        timestamp: Utc::now(),
    };

    // Write to temp file as safety measure (best effort - don't fail if this fails)
    if let Err(e) = write_backup_file(&backup) {
        tracing::warn!("Failed to write backup file (will use in-memory backup): {}", e);
    }

    Ok(backup)
}

/// Restore settings from backup
///
/// Writes backed-up parameter values back to database, overwriting any
/// values that may have been modified during tuning.
///
/// **Traceability:** TUNE-SAFE-010
///
/// # Arguments
/// - `db`: Database connection pool
/// - `backup`: SettingsBackup to restore from
///
/// # Returns
/// Ok(()) on success
///
/// # Errors
/// Returns error if database write fails
pub async fn restore_settings(db: &Pool<Sqlite>, backup: &SettingsBackup) -> Result<()> {
    // Restore both parameters
    set_setting(db, "mixer_check_interval_ms", backup.mixer_check_interval_ms).await?;
    set_setting(db, "audio_buffer_size", backup.audio_buffer_size).await?;

    // Clean up temp file
    cleanup_backup_file();

    Ok(())
}

/// Write backup to temporary file
///
/// Creates JSON file in system temp directory for recovery in case of
/// process crash or panic.
///
/// # Arguments
/// - `backup`: SettingsBackup to serialize
///
/// # Returns
/// Ok(()) on success
///
/// # Errors
/// Returns error if:
/// - JSON serialization fails
/// - File write fails (permissions, disk space, etc.)
fn write_backup_file(backup: &SettingsBackup) -> Result<()> {
    let path = SettingsBackup::backup_file_path();
    let json = serde_json::to_string_pretty(backup)
        .map_err(|e| crate::error::Error::Internal(format!("Failed to serialize backup: {}", e)))?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Clean up temporary backup file
///
/// Removes backup file from temp directory. Called after successful
/// completion or restoration.
///
/// Does not return error - cleanup is best-effort.
fn cleanup_backup_file() {
    let path = SettingsBackup::backup_file_path();
    if path.exists() {
        if let Err(e) = std::fs::remove_file(&path) {
            tracing::warn!("Failed to clean up backup file at {:?}: {}", path, e);
        }
    }
}

/// Load backup from temporary file
///
/// Attempts to recover backup from temp file in case of process crash.
/// Used for manual recovery or panic handlers.
///
/// # Returns
/// Some(SettingsBackup) if file exists and is valid, None otherwise
pub fn load_backup_from_file() -> Option<SettingsBackup> {
    let path = SettingsBackup::backup_file_path();
    if !path.exists() {
        return None;
    }

    match std::fs::read_to_string(&path) {
        Ok(json) => match serde_json::from_str::<SettingsBackup>(&json) {
            Ok(backup) => Some(backup),
            Err(e) => {
                tracing::error!("Failed to parse backup file: {}", e);
                None
            }
        },
        Err(e) => {
            tracing::error!("Failed to read backup file: {}", e);
            None
        }
    }
}
