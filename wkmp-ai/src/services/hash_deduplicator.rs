//! Hash Deduplication for Import Pipeline
//!
//! **Traceability:** [REQ-SPEC032-009] Hash Deduplication (Phase 2)
//!
//! Calculates SHA-256 hash of file content, detects duplicate hashes,
//! and creates bidirectional links between duplicate files.

use sha2::{Digest, Sha256};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use uuid::Uuid;
use wkmp_common::{Error, Result};
use crate::utils::{retry_on_lock, begin_monitored};

/// Hash deduplication result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HashResult {
    /// Unique hash - continue processing
    Unique(String),
    /// Duplicate hash found - stop processing, link to original
    Duplicate {
        hash: String,
        original_file_id: Uuid,
    },
}

/// Hash Deduplicator
///
/// **Traceability:** [REQ-SPEC032-009] (Phase 2: Hash Deduplication)
pub struct HashDeduplicator {
    db: Pool<Sqlite>,
}

impl HashDeduplicator {
    /// Create new hash deduplicator
    pub fn new(db: Pool<Sqlite>) -> Self {
        Self { db }
    }

    /// Calculate SHA-256 hash of file
    ///
    /// **Algorithm:**
    /// 1. Read file content in chunks (1MB at a time for memory efficiency)
    /// 2. Calculate SHA-256 hash
    /// 3. Return hex-encoded hash string
    ///
    /// **Traceability:** [REQ-SPEC032-009]
    pub async fn calculate_hash(&self, file_path: &Path) -> Result<String> {
        let path_buf = file_path.to_path_buf();
        tracing::debug!(path = %path_buf.display(), "Calculating SHA-256 hash");

        // Use tokio::task::spawn_blocking for CPU-intensive hash calculation
        let file_path_clone = path_buf.clone();
        let hash = tokio::task::spawn_blocking(move || -> Result<String> {
            use std::fs::File;
            use std::io::Read;

            let mut file = File::open(&file_path_clone).map_err(|e| {
                Error::Io(std::io::Error::new(
                    e.kind(),
                    format!("Failed to open file for hashing: {}", e),
                ))
            })?;

            let mut hasher = Sha256::new();
            let mut buffer = vec![0u8; 1024 * 1024]; // 1MB chunks

            loop {
                let bytes_read = file.read(&mut buffer).map_err(|e| {
                    Error::Io(std::io::Error::new(
                        e.kind(),
                        format!("Failed to read file for hashing: {}", e),
                    ))
                })?;

                if bytes_read == 0 {
                    break;
                }

                hasher.update(&buffer[..bytes_read]);
            }

            let hash_bytes = hasher.finalize();
            let hash_hex = format!("{:x}", hash_bytes);

            Ok(hash_hex)
        })
        .await
        .map_err(|e| Error::Internal(format!("Hash calculation task failed: {}", e)))??;

        tracing::debug!(
            path = %path_buf.display(),
            hash_len = hash.len(),
            "Calculated hash"
        );

        Ok(hash)
    }

    /// Check for duplicate hash in database
    ///
    /// **Algorithm:**
    /// 1. Query database for other files with same hash
    /// 2. If no duplicates: Return HashResult::Unique(hash)
    /// 3. If duplicate found: Return HashResult::Duplicate with original file ID
    ///
    /// **Traceability:** [REQ-SPEC032-009]
    pub async fn check_duplicate(&self, hash: &str, current_file_id: Uuid) -> Result<HashResult> {
        tracing::debug!(hash = %hash, file_id = %current_file_id, "Checking for duplicate hash");

        // Query database for files with same hash (excluding current file)
        let row: Option<(String,)> = sqlx::query_as(
            "SELECT guid FROM files WHERE hash = ? AND guid != ? LIMIT 1",
        )
        .bind(hash)
        .bind(current_file_id.to_string())
        .fetch_optional(&self.db)
        .await?;

        match row {
            None => {
                tracing::debug!(hash = %hash, "No duplicate hash found");
                Ok(HashResult::Unique(hash.to_string()))
            }
            Some((original_guid_str,)) => {
                let original_file_id = Uuid::parse_str(&original_guid_str)
                    .map_err(|e| Error::Internal(format!("Invalid UUID in database: {}", e)))?;

                tracing::info!(
                    hash = %hash,
                    current_file_id = %current_file_id,
                    original_file_id = %original_file_id,
                    "Duplicate hash detected"
                );

                Ok(HashResult::Duplicate {
                    hash: hash.to_string(),
                    original_file_id,
                })
            }
        }
    }

    /// Update file hash in database
    ///
    /// **Traceability:** [REQ-SPEC032-009]
    pub async fn update_file_hash(&self, file_id: Uuid, hash: &str) -> Result<()> {
        sqlx::query(
            "UPDATE files SET hash = ?, updated_at = CURRENT_TIMESTAMP WHERE guid = ?",
        )
        .bind(hash)
        .bind(file_id.to_string())
        .execute(&self.db)
        .await?;

        tracing::debug!(file_id = %file_id, hash = %hash, "Updated file hash");

        Ok(())
    }

    /// Create bidirectional duplicate link
    ///
    /// **Algorithm:**
    /// 1. Read matching_hashes JSON arrays from both files
    /// 2. Add current_file_id to original's matching_hashes
    /// 3. Add original_file_id to current's matching_hashes
    /// 4. Update both files in database
    /// 5. Set current file status to DUPLICATE HASH
    ///
    /// **Traceability:** [REQ-SPEC032-009]
    pub async fn link_duplicates(
        &self,
        current_file_id: Uuid,
        original_file_id: Uuid,
    ) -> Result<()> {
        tracing::debug!(
            current = %current_file_id,
            original = %original_file_id,
            "Creating bidirectional duplicate link"
        );

        // Get max lock wait time from settings (default 5000ms)
        let max_wait_ms: i64 = sqlx::query_scalar(
            "SELECT CAST(value AS INTEGER) FROM settings WHERE key = 'ai_database_max_lock_wait_ms'"
        )
        .fetch_optional(&self.db)
        .await?
        .unwrap_or(5000);

        // Wrap in retry logic with unconstrained execution
        let db_ref = &self.db;
        tokio::task::unconstrained(
            retry_on_lock(
                "hash deduplicator link",
                max_wait_ms as u64,
                || async {
                    // Start monitored transaction
                    let mut tx = begin_monitored(db_ref, "hash_deduplicator::link_duplicates").await?;

        // Read original file's matching_hashes
        let original_matches: Option<String> = sqlx::query_scalar(
            "SELECT matching_hashes FROM files WHERE guid = ?",
        )
        .bind(original_file_id.to_string())
        .fetch_one(&mut **tx.inner_mut())
        .await?;

        let mut original_array: Vec<String> = match original_matches {
            Some(json) if !json.is_empty() => {
                serde_json::from_str(&json).unwrap_or_else(|_| Vec::new())
            }
            _ => Vec::new(),
        };

        // Add current file to original's array (if not already present)
        let current_str = current_file_id.to_string();
        if !original_array.contains(&current_str) {
            original_array.push(current_str.clone());
        }

        // Read current file's matching_hashes
        let current_matches: Option<String> = sqlx::query_scalar(
            "SELECT matching_hashes FROM files WHERE guid = ?",
        )
        .bind(current_file_id.to_string())
        .fetch_one(&mut **tx.inner_mut())
        .await?;

        let mut current_array: Vec<String> = match current_matches {
            Some(json) if !json.is_empty() => {
                serde_json::from_str(&json).unwrap_or_else(|_| Vec::new())
            }
            _ => Vec::new(),
        };

        // Add original file to current's array (if not already present)
        let original_str = original_file_id.to_string();
        if !current_array.contains(&original_str) {
            current_array.push(original_str.clone());
        }

        // Update original file
        let original_json = serde_json::to_string(&original_array)
            .map_err(|e| Error::Internal(format!("Failed to serialize JSON: {}", e)))?;

        sqlx::query(
            "UPDATE files SET matching_hashes = ?, updated_at = CURRENT_TIMESTAMP WHERE guid = ?",
        )
        .bind(&original_json)
        .bind(original_file_id.to_string())
        .execute(&mut **tx.inner_mut())
        .await?;

        // Update current file (set matching_hashes AND status to DUPLICATE HASH)
        let current_json = serde_json::to_string(&current_array)
            .map_err(|e| Error::Internal(format!("Failed to serialize JSON: {}", e)))?;

        sqlx::query(
            "UPDATE files SET matching_hashes = ?, status = 'DUPLICATE HASH', updated_at = CURRENT_TIMESTAMP WHERE guid = ?",
        )
        .bind(&current_json)
        .bind(current_file_id.to_string())
        .execute(&mut **tx.inner_mut())
        .await?;

        // Commit transaction (logs connection release timing)
        tx.commit().await?;

        tracing::info!(
            current = %current_file_id,
            original = %original_file_id,
            "Bidirectional duplicate link created"
        );

        Ok(())
                }
            )
        ).await // Close unconstrained() wrapper around retry_on_lock
    }

    /// Process file hash (calculate, check duplicate, update database)
    ///
    /// **Complete Phase 2 workflow:**
    /// 1. Calculate SHA-256 hash
    /// 2. Update file record with hash
    /// 3. Check for duplicate
    /// 4. If duplicate: Create bidirectional link, return Duplicate
    /// 5. If unique: Return Unique
    ///
    /// **Traceability:** [REQ-SPEC032-009]
    pub async fn process_file_hash(
        &self,
        file_id: Uuid,
        file_path: &Path,
    ) -> Result<HashResult> {
        // Calculate hash
        let hash = self.calculate_hash(file_path).await?;

        // Update file record with hash
        self.update_file_hash(file_id, &hash).await?;

        // Check for duplicate
        let result = self.check_duplicate(&hash, file_id).await?;

        // If duplicate, create bidirectional link
        if let HashResult::Duplicate {
            original_file_id, ..
        } = &result
        {
            self.link_duplicates(file_id, *original_file_id).await?;
        }

        Ok(result)
    }
}
