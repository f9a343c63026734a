//! Error types for the playout director

use thiserror::Error;

/// Top-level error type for the director
#[derive(Debug, Error)]
pub enum Error {
    /// IO errors from subprocess or file operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Database errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Errors reading schedule/media/policy rows from the store
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Errors launching or driving the external audio subprocess
    #[error("Subprocess error: {0}")]
    Subprocess(#[from] SubprocessError),

    /// Errors assembling a play sequence for a mount
    #[error("Materialize error: {0}")]
    Materialize(#[from] MaterializeError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic errors
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Errors reading the relational store (schedule, media, policy, play history)
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("mount {0} not found")]
    MountNotFound(uuid::Uuid),

    #[error("schedule entry {0} not found")]
    ScheduleEntryNotFound(uuid::Uuid),

    #[error("media item {0} not found")]
    MediaItemNotFound(uuid::Uuid),

    #[error("malformed row: {0}")]
    MalformedRow(String),
}

/// Errors from the external audio toolchain subprocess
#[derive(Debug, Error)]
pub enum SubprocessError {
    #[error("audio toolchain binary not found: {0}")]
    BinaryNotFound(String),

    #[error("failed to spawn subprocess: {0}")]
    SpawnFailed(String),

    #[error("subprocess exited with status {status}: {stderr}")]
    NonZeroExit { status: i32, stderr: String },

    #[error("subprocess stdout closed unexpectedly")]
    StreamClosed,

    #[error("subprocess did not exit within grace period, killed")]
    KilledAfterTimeout,
}

/// Errors assembling a source's play sequence
#[derive(Debug, Error)]
pub enum MaterializeError {
    #[error("source kind {0} has no items to play")]
    EmptySequence(String),

    #[error("smart block rule evaluation failed: {0}")]
    SmartBlockFailed(String),

    #[error("webstream {0} has no usable relay URL")]
    WebstreamUnresolvable(uuid::Uuid),

    #[error("clock template {0} has no slot covering the current hour")]
    ClockTemplateGap(uuid::Uuid),
}

/// Result type alias using the director's error type
pub type Result<T> = std::result::Result<T, Error>;

/// Error recovery strategies, matching the reaction taxonomy the director's
/// tick loop dispatches on: a tick never propagates an error upward, it
/// reacts according to the offending operation's strategy and continues.
#[derive(Debug, Clone, Copy)]
pub enum RecoveryStrategy {
    /// Retry the operation
    Retry { max_attempts: u32, delay_ms: u64 },

    /// Skip the current item and advance the sequence
    Skip,

    /// Log the error and continue this tick unchanged
    LogAndContinue,

    /// Stop the affected mount only
    StopMount,

    /// Unrecoverable for the whole process
    Fatal,
}

impl Error {
    /// Recommended recovery strategy for this error.
    pub fn recovery_strategy(&self) -> RecoveryStrategy {
        match self {
            Error::Io(_) => RecoveryStrategy::Retry {
                max_attempts: 3,
                delay_ms: 1000,
            },
            Error::Database(_) => RecoveryStrategy::Retry {
                max_attempts: 2,
                delay_ms: 500,
            },
            Error::Store(StoreError::MountNotFound(_)) => RecoveryStrategy::Fatal,
            Error::Store(_) => RecoveryStrategy::Skip,
            Error::Subprocess(SubprocessError::BinaryNotFound(_)) => RecoveryStrategy::StopMount,
            Error::Subprocess(SubprocessError::NonZeroExit { .. }) => RecoveryStrategy::Retry {
                max_attempts: 3,
                delay_ms: 2000,
            },
            Error::Subprocess(_) => RecoveryStrategy::StopMount,
            Error::Materialize(MaterializeError::EmptySequence(_)) => RecoveryStrategy::Skip,
            Error::Materialize(_) => RecoveryStrategy::Skip,
            Error::Config(_) => RecoveryStrategy::Fatal,
            Error::Other(_) => RecoveryStrategy::LogAndContinue,
        }
    }

    /// Stable error code for logs/events.
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Io(_) => "PD_IO_001",
            Error::Database(_) => "PD_DB_001",
            Error::Store(e) => match e {
                StoreError::MountNotFound(_) => "PD_ST_001",
                StoreError::ScheduleEntryNotFound(_) => "PD_ST_002",
                StoreError::MediaItemNotFound(_) => "PD_ST_003",
                StoreError::MalformedRow(_) => "PD_ST_004",
            },
            Error::Subprocess(e) => match e {
                SubprocessError::BinaryNotFound(_) => "PD_SP_001",
                SubprocessError::SpawnFailed(_) => "PD_SP_002",
                SubprocessError::NonZeroExit { .. } => "PD_SP_003",
                SubprocessError::StreamClosed => "PD_SP_004",
                SubprocessError::KilledAfterTimeout => "PD_SP_005",
            },
            Error::Materialize(e) => match e {
                MaterializeError::EmptySequence(_) => "PD_MZ_001",
                MaterializeError::SmartBlockFailed(_) => "PD_MZ_002",
                MaterializeError::WebstreamUnresolvable(_) => "PD_MZ_003",
                MaterializeError::ClockTemplateGap(_) => "PD_MZ_004",
            },
            Error::Config(_) => "PD_CF_001",
            Error::Other(_) => "PD_OT_001",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_are_unique() {
        use std::collections::HashSet;

        let errors = vec![
            Error::Store(StoreError::MountNotFound(uuid::Uuid::nil())),
            Error::Store(StoreError::ScheduleEntryNotFound(uuid::Uuid::nil())),
            Error::Subprocess(SubprocessError::StreamClosed),
            Error::Materialize(MaterializeError::EmptySequence("media".into())),
        ];

        let codes: HashSet<_> = errors.iter().map(|e| e.error_code()).collect();
        assert_eq!(codes.len(), errors.len(), "error codes must be unique");
    }

    #[test]
    fn mount_not_found_is_fatal() {
        let err = Error::Store(StoreError::MountNotFound(uuid::Uuid::nil()));
        assert!(matches!(err.recovery_strategy(), RecoveryStrategy::Fatal));
    }

    #[test]
    fn empty_sequence_is_skip() {
        let err = Error::Materialize(MaterializeError::EmptySequence("webstream".into()));
        assert!(matches!(err.recovery_strategy(), RecoveryStrategy::Skip));
    }
}
