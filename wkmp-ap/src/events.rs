//! Event system for wkmp-ap Audio Player
//!
//! Implements event-driven communication per SPEC011-event_system.md
//!
//! # Architecture
//!
//! WKMP uses hybrid communication:
//! - **EventBus** (tokio::broadcast): One-to-many event broadcasting
//! - **Command channels** (tokio::mpsc): Request → single handler
//! - **Shared state** (Arc<RwLock<T>>): Read-heavy access
//!
//! This module re-exports shared event types from wkmp-common and defines
//! wkmp-ap-specific internal event types.

use uuid::Uuid;

// ========================================
// Re-exports from wkmp-common
// ========================================

pub use wkmp_common::events::{
    BufferStatus, EnqueueSource, EventBus, PlaybackState, QueueChangeTrigger, UserActionType,
    WkmpEvent,
};

// ========================================
// Internal Events (wkmp-ap only)
// ========================================

/// Mixer state context for position events
///
/// Per SPEC011 EVT-CTX-010: Added in v1.4 specification update
#[derive(Debug, Clone)]
pub enum MixerStateContext {
    /// Single passage playing (no crossfade active)
    Immediate,

    /// Crossfade in progress
    Crossfading {
        /// Queue entry ID of incoming passage
        incoming_queue_entry_id: Uuid,
    },
}

/// Internal playback events (not exposed via SSE)
///
/// These events are private implementation details within wkmp-ap:
/// - NOT serialized or sent via SSE
/// - One-to-one MPSC pattern (mixer → handler)
/// - Non-blocking emission (`try_send()` to avoid blocking audio thread)
///
/// Per SPEC011: Used for event-driven position tracking without timer polling
#[derive(Debug, Clone)]
pub enum PlaybackEvent {
    /// Position update from mixer
    ///
    /// Emitted at configurable interval (database setting: position_event_interval_ms, default: 1000ms)
    /// Example: At 44.1kHz with 1000ms interval → every 44,100 frames (~1 second of audio)
    PositionUpdate {
        /// Queue entry ID of current passage
        queue_entry_id: Uuid,

        /// Frame position within buffer
        position_frames: usize,

        /// Sample rate (for ms conversion)
        sample_rate: u32,

        /// Mixer state context
        state: MixerStateContext,
    },

    /// Mixer state changed (e.g., started crossfade)
    StateChanged {
        queue_entry_id: Uuid,
        new_state: MixerStateContext,
    },
}

// ========================================
// Tests
// ========================================
