//! Filename Matching for Import Pipeline
//!
//! **Traceability:** [REQ-SPEC032-008] Filename Matching (Phase 1)
//!
//! Checks if a file path already exists in the database to determine whether
//! this is a new file, an existing file that should be updated, or a file that
//! has already been processed.

use sqlx::{Pool, Sqlite};
use std::path::Path;
use uuid::Uuid;
use wkmp_common::{Error, Result};

/// Filename matching result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchResult {
    /// File not found in database - create new fileId
    New,
    /// File exists with status INGEST COMPLETE - skip processing
    AlreadyProcessed(Uuid),
    /// File exists but not yet processed - reuse fileId and update metadata
    Reuse(Uuid),
}

/// Filename Matcher
///
/// **Traceability:** [REQ-SPEC032-008] (Phase 1: Filename Matching)
pub struct FilenameMatcher {
    db: Pool<Sqlite>,
}

impl FilenameMatcher {
    /// Create new filename matcher
    pub fn new(db: Pool<Sqlite>) -> Self {
        Self { db }
    }

    /// Check if file path exists in database
    ///
    /// **Algorithm:**
    /// 1. Query database for file by path
    /// 2. If not found: Return MatchResult::New
    /// 3. If found with status "INGEST COMPLETE": Return MatchResult::AlreadyProcessed(guid)
    /// 4. If found with other status: Return MatchResult::Reuse(guid)
    ///
    /// **Traceability:** [REQ-SPEC032-008]
    pub async fn check_file(&self, file_path: &Path) -> Result<MatchResult> {
        // Convert path to string (relative to root folder, forward slashes)
        let path_str = file_path
            .to_str()
            .ok_or_else(|| Error::InvalidInput("Invalid UTF-8 in file path".to_string()))?
            .replace('\\', "/");

        tracing::debug!(path = %path_str, "Checking if file exists in database");

        // Query database for file by path
        let row: Option<(String, String)> = sqlx::query_as(
            "SELECT guid, status FROM files WHERE path = ?",
        )
        .bind(&path_str)
        .fetch_optional(&self.db)
        .await?;

        match row {
            None => {
                tracing::debug!(path = %path_str, "File not found in database");
                Ok(MatchResult::New)
            }
            Some((guid_str, status)) => {
                let guid = Uuid::parse_str(&guid_str)
                    .map_err(|e| Error::Internal(format!("Invalid UUID in database: {}", e)))?;

                if status == "INGEST COMPLETE" {
                    tracing::debug!(
                        path = %path_str,
                        guid = %guid,
                        "File already processed (INGEST COMPLETE)"
                    );
                    Ok(MatchResult::AlreadyProcessed(guid))
                } else {
                    tracing::debug!(
                        path = %path_str,
                        guid = %guid,
                        status = %status,
                        "File exists, reusing fileId"
                    );
                    Ok(MatchResult::Reuse(guid))
                }
            }
        }
    }

    /// Create new file record in database
    ///
    /// **Parameters:**
    /// - `file_path`: File path relative to root folder
    /// - `modification_time`: File last modified timestamp (Unix timestamp)
    ///
    /// **Returns:** New file UUID
    ///
    /// **Traceability:** [REQ-SPEC032-008]
    pub async fn create_file_record(
        &self,
        file_path: &Path,
        modification_time: i64,
    ) -> Result<Uuid> {
        let guid = Uuid::new_v4();
        let path_str = file_path
            .to_str()
            .ok_or_else(|| Error::InvalidInput("Invalid UTF-8 in file path".to_string()))?
            .replace('\\', "/");

        // Create file record with PENDING status and temporary hash
        // Hash will be updated in Phase 2
        sqlx::query(
            r#"
            INSERT INTO files (guid, path, hash, modification_time, status)
            VALUES (?, ?, 'PENDING', datetime(?, 'unixepoch'), 'PENDING')
            "#,
        )
        .bind(guid.to_string())
        .bind(&path_str)
        .bind(modification_time)
        .execute(&self.db)
        .await?;

        tracing::debug!(
            path = %path_str,
            guid = %guid,
            "Created new file record"
        );

        Ok(guid)
    }

    /// Update file status
    ///
    /// **Traceability:** [REQ-SPEC032-008]
    pub async fn update_file_status(&self, guid: Uuid, status: &str) -> Result<()> {
        sqlx::query("UPDATE files SET status = ?, updated_at = CURRENT_TIMESTAMP WHERE guid = ?")
            .bind(status)
            .bind(guid.to_string())
            .execute(&self.db)
            .await?;

        tracing::debug!(guid = %guid, status = %status, "Updated file status");

        Ok(())
    }
}
