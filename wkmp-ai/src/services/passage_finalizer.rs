//! Passage Finalization for Import Pipeline
//!
//! **Traceability:** [REQ-SPEC032-017] Finalization (Phase 10)
//!
//! Finalizes import by validating all passages are complete and marking file as 'INGEST COMPLETE'.

use sqlx::{Pool, Sqlite};
use uuid::Uuid;
use wkmp_common::Result;

/// Finalization result
#[derive(Debug, Clone)]
pub struct FinalizationResult {
    /// File GUID
    pub file_id: Uuid,
    /// Number of passages validated
    pub passages_validated: usize,
    /// Whether finalization succeeded
    pub success: bool,
    /// Validation errors (if any)
    pub errors: Vec<String>,
}

/// Passage Finalizer
///
/// **Traceability:** [REQ-SPEC032-017] (Phase 10: FINALIZATION)
pub struct PassageFinalizer {
    db: Pool<Sqlite>,
}

impl PassageFinalizer {
    /// Create new passage finalizer
    pub fn new(db: Pool<Sqlite>) -> Self {
        Self { db }
    }

    /// Finalize import for a file
    ///
    /// **Algorithm:**
    /// 1. Validate all passages have status = 'INGEST COMPLETE'
    /// 2. Validate all songs have status = 'FLAVOR READY' (or NULL for zero-song passages)
    /// 3. If validation passes:
    ///    a. Mark files.status = 'INGEST COMPLETE'
    ///    b. Update files.updated_at = CURRENT_TIMESTAMP
    /// 4. Return finalization result
    ///
    /// **Traceability:** [REQ-SPEC032-017]
    pub async fn finalize(&self, file_id: Uuid) -> Result<FinalizationResult> {
        tracing::debug!(
            file_id = %file_id,
            "Finalizing import"
        );

        let mut errors = Vec::new();

        // Validate all passages have status = 'INGEST COMPLETE'
        let pending_passages: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM passages WHERE file_id = ? AND status != 'INGEST COMPLETE'"
        )
        .bind(file_id.to_string())
        .fetch_one(&self.db)
        .await?;

        if pending_passages > 0 {
            let error_msg = format!(
                "Validation failed: {} passages do not have status = 'INGEST COMPLETE'",
                pending_passages
            );
            tracing::error!(file_id = %file_id, pending_passages, "{}", error_msg);
            errors.push(error_msg);
        }

        // Validate all songs have status = 'FLAVOR READY' (for passages with song_id)
        let pending_songs: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(DISTINCT songs.guid)
            FROM passages
            JOIN songs ON passages.song_id = songs.guid
            WHERE passages.file_id = ?
              AND songs.status != 'FLAVOR READY'
            "#
        )
        .bind(file_id.to_string())
        .fetch_one(&self.db)
        .await?;

        if pending_songs > 0 {
            let error_msg = format!(
                "Validation failed: {} songs do not have status = 'FLAVOR READY'",
                pending_songs
            );
            tracing::error!(file_id = %file_id, pending_songs, "{}", error_msg);
            errors.push(error_msg);
        }

        // Get total passage count for result
        let passages_validated: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM passages WHERE file_id = ?"
        )
        .bind(file_id.to_string())
        .fetch_one(&self.db)
        .await?;

        // If validation passed, mark file as complete
        let success = errors.is_empty();
        if success {
            sqlx::query(
                r#"
                UPDATE files
                SET status = 'INGEST COMPLETE',
                    updated_at = CURRENT_TIMESTAMP
                WHERE guid = ?
                "#
            )
            .bind(file_id.to_string())
            .execute(&self.db)
            .await?;

            tracing::info!(
                file_id = %file_id,
                passages = passages_validated,
                "Import finalization complete"
            );
        } else {
            tracing::error!(
                file_id = %file_id,
                error_count = errors.len(),
                "Import finalization failed"
            );
        }

        Ok(FinalizationResult {
            file_id,
            passages_validated: passages_validated as usize,
            success,
            errors,
        })
    }
}
