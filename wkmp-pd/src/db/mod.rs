//! Relational store access. Read-mostly: schedule entries, media items,
//! playlists, smart blocks, clock templates, webstreams, stations. Writes:
//! play history, mount playout state, playlist position advance.

pub mod mount_state;
pub mod queries;
