//! HTTP API and SSE endpoints
//!
//! Provides REST API for playback control and Server-Sent Events for real-time updates.
//!
//! **Traceability:** API Design - Audio Player API section

pub mod server;
pub mod handlers;
pub mod sse;
