//! Director Loop (C8): the 250 ms tick that resolves the schedule, decides
//! transitions, invokes the materializer, commands the supervisor/session,
//! and emits events.

use crate::db::{mount_state, queries};
use crate::events::{DirectorEvent, EventBus, HealthStatus};
use crate::materialize;
use crate::model::{BoundaryMode, MountRuntimeState, Occurrence, ScheduleEntry, SourceType};
use crate::pipeline::{self, PipelineHandle};
use crate::policy::{self, PolicyCache};
use crate::schedule::{resolve_occurrence, ScheduleCache};
use crate::state::MountRegistry;
use chrono::{DateTime, Duration, Utc};
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::interval;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Short-lived record of launched occurrences, pruned 30 min after the
/// occurrence ends, per spec's played-set invariant.
#[derive(Default)]
struct PlayedSet {
    entries: HashMap<String, DateTime<Utc>>,
}

impl PlayedSet {
    fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    fn insert(&mut self, key: String, ends_at: DateTime<Utc>) {
        self.entries.insert(key, ends_at);
    }

    fn prune(&mut self, now: DateTime<Utc>) {
        self.entries.retain(|_, ends_at| *ends_at + Duration::minutes(30) >= now);
    }
}

/// The director's owned resources: caches, the mount registry, and the
/// event bus. Cloneable so a control handle or stop-timer task can hold a
/// reference without the director itself being `Arc`-wrapped twice.
#[derive(Clone)]
pub struct Director {
    db: SqlitePool,
    media_root: std::path::PathBuf,
    gstreamer_bin: String,
    registry: MountRegistry,
    schedule_cache: Arc<ScheduleCache>,
    policy_cache: Arc<PolicyCache>,
    played_set: Arc<Mutex<PlayedSet>>,
    events: Arc<EventBus>,
}

impl Director {
    pub fn new(db: SqlitePool, media_root: std::path::PathBuf, gstreamer_bin: String, events: Arc<EventBus>) -> Self {
        Director {
            db,
            media_root,
            gstreamer_bin,
            registry: MountRegistry::new(),
            schedule_cache: Arc::new(ScheduleCache::new()),
            policy_cache: Arc::new(PolicyCache::new()),
            played_set: Arc::new(Mutex::new(PlayedSet::default())),
            events,
        }
    }

    pub fn events(&self) -> Arc<EventBus> {
        Arc::clone(&self.events)
    }

    pub fn registry(&self) -> &MountRegistry {
        &self.registry
    }

    /// Drop rows older than 6 hours, per spec's startup-pruning rule.
    pub async fn prune_stale_state(&self) {
        match mount_state::prune_stale(&self.db, Utc::now()).await {
            Ok(n) if n > 0 => info!(rows = n, "pruned stale mount_playout_states on startup"),
            Ok(_) => {}
            Err(e) => warn!(error = %e, "failed to prune stale mount_playout_states"),
        }
    }

    /// Repopulate the in-memory registry from surviving `mount_playout_states`
    /// rows, so the first tick after a restart sees the same runtime state it
    /// had before exiting and `materialize`'s resume check (§4.5) finds a
    /// match instead of re-rolling a non-deterministic source. No pipeline or
    /// crossfade session is restarted here — those were killed with the old
    /// process; the next tick's `launch` respawns them against the restored
    /// sequence/position.
    pub async fn restore_state(&self) {
        match mount_state::load_all(&self.db).await {
            Ok(states) => {
                let n = states.len();
                for state in states {
                    self.registry.set_runtime(state).await;
                }
                if n > 0 {
                    info!(rows = n, "restored mount runtime state from persisted rows");
                }
            }
            Err(e) => warn!(error = %e, "failed to restore mount runtime state on startup"),
        }
    }

    /// Mark the schedule cache dirty; called by the schedule-update
    /// subscriber task.
    pub async fn on_schedule_update(&self) {
        self.schedule_cache.mark_dirty().await;
    }

    /// Run the 250 ms tick loop until the process is cancelled.
    pub async fn run(self: Arc<Self>, tick_interval_ms: u64) {
        let mut ticker = interval(tokio::time::Duration::from_millis(tick_interval_ms));
        loop {
            ticker.tick().await;
            self.tick().await;
        }
    }

    /// One tick, per spec §4.4. Never propagates an error: every fallible
    /// step is matched and logged at the call site.
    async fn tick(&self) {
        let now = Utc::now();

        self.played_set.lock().await.prune(now);

        let entries = self.schedule_cache.snapshot(&self.db, now).await;
        debug!(count = entries.len(), "tick: resolving schedule snapshot");

        for entry in &entries {
            let Some(occ) = resolve_occurrence(entry, now) else { continue };
            let playback_key = crate::model::occurrence_key(entry.id, occ.start);

            if self.skip_for_soft_boundary(entry, now).await {
                continue;
            }
            if !self.crossfade_lookahead_allows(entry, &occ, now).await {
                continue;
            }
            if self.played_set.lock().await.contains(&playback_key) {
                continue;
            }

            match self.launch(entry, &occ, now).await {
                Ok(()) => {
                    self.played_set.lock().await.insert(playback_key, occ.end);
                }
                Err(e) => {
                    warn!(entry_id = %entry.id, error = %e, "failed to launch schedule entry");
                }
            }
        }

        self.emit_health_snapshots().await;
    }

    /// Step 4: an active entry under soft-boundary policy keeps running up
    /// to `ends_at + soft_overrun` even once a new candidate is due.
    async fn skip_for_soft_boundary(&self, entry: &ScheduleEntry, now: DateTime<Utc>) -> bool {
        let Some(active) = self.registry.get_runtime(entry.mount_id).await else { return false };
        if active.entry_id == entry.id {
            return false;
        }
        if active.station_id != entry.station_id || now >= active.ends_at {
            return false;
        }
        let policy = match self.policy_cache.get(&self.db, entry.station_id).await {
            Ok(p) => p,
            Err(_) => return false,
        };
        matches!(policy.boundary_mode, BoundaryMode::Soft)
    }

    /// Step 5: a future candidate is only considered inside the crossfade
    /// look-ahead window of an already-active entry on the same mount.
    async fn crossfade_lookahead_allows(&self, entry: &ScheduleEntry, occ: &Occurrence, now: DateTime<Utc>) -> bool {
        if occ.start <= now {
            return true;
        }
        if self.registry.get_runtime(entry.mount_id).await.is_none() {
            return false;
        }
        let policy = match self.policy_cache.get(&self.db, entry.station_id).await {
            Ok(p) => p,
            Err(_) => return false,
        };
        let eff = policy::effective_crossfade(entry, &policy);
        if !eff.enabled || eff.duration <= Duration::zero() {
            return false;
        }
        occ.start - now <= eff.duration
    }

    /// Step 7: dispatch by `source_type`, start audio, record runtime state.
    async fn launch(&self, entry: &ScheduleEntry, occ: &Occurrence, now: DateTime<Utc>) -> crate::Result<()> {
        let existing = self.registry.get_runtime(entry.mount_id).await;
        let seq = materialize::materialize(&self.db, entry, existing.as_ref(), now).await?;

        let media_id = seq.current_media();

        let runtime = MountRuntimeState {
            mount_id: entry.mount_id,
            station_id: entry.station_id,
            entry_id: entry.id,
            media_id,
            source_type: seq.source_type,
            source_id: seq.source_id,
            position: seq.position,
            total_items: seq.total,
            items: seq.items.clone(),
            started_at: now,
            ends_at: occ.end,
        };

        let policy = self.policy_cache.get(&self.db, entry.station_id).await?;
        let eff = policy::effective_crossfade(entry, &policy);
        self.start_audio(entry, &runtime, media_id, eff.enabled && eff.duration > Duration::zero(), eff.duration).await?;

        self.registry.set_runtime(runtime.clone()).await;
        mount_state::upsert(&self.db, &runtime).await?;
        queries::insert_play_history(&self.db, entry.id, entry.mount_id, media_id, now).await?;

        let metadata = self.now_playing_metadata(entry, &seq, media_id).await;
        self.events.emit_lossy(DirectorEvent::NowPlaying {
            entry_id: entry.id,
            station_id: entry.station_id,
            mount_id: entry.mount_id,
            source_type: seq.source_type.as_str().to_string(),
            source_id: seq.source_id,
            starts_at: occ.start,
            ends_at: occ.end,
            metadata,
        });

        self.schedule_stop_timer(entry.mount_id, entry.id, occ.end).await;

        Ok(())
    }

    /// Builds the `metadata` payload for a `NowPlaying` event: the
    /// schedule entry's generic `display` hint merged with the
    /// source-specific fields spec.md §6 lists (media_id/title/artist/
    /// album/position for any source resolving to a track, plus the
    /// playlist/smart-block/webstream/clock identifier for the active
    /// source and, for webstreams, the current URL and health status).
    async fn now_playing_metadata(&self, entry: &ScheduleEntry, seq: &materialize::MaterializedSequence, media_id: Option<Uuid>) -> serde_json::Value {
        let mut fields = serde_json::Map::new();
        if let Some(display) = entry.metadata.get("display") {
            fields.insert("display".to_string(), display.clone());
        }
        if let Some(media_id) = media_id {
            if let Ok(media) = queries::fetch_media_item(&self.db, media_id).await {
                fields.insert("media_id".to_string(), serde_json::json!(media.id));
                fields.insert("title".to_string(), serde_json::json!(media.title));
                fields.insert("artist".to_string(), serde_json::json!(media.artist));
                fields.insert("album".to_string(), serde_json::json!(media.album));
            }
        }
        fields.insert("position".to_string(), serde_json::json!(seq.position));
        match seq.source_type {
            SourceType::Playlist | SourceType::ClockPlaylist => {
                fields.insert("playlist_id".to_string(), serde_json::json!(seq.source_id));
            }
            SourceType::SmartBlock | SourceType::Clock => {
                fields.insert("smart_block_id".to_string(), serde_json::json!(seq.source_id));
            }
            SourceType::Webstream => {
                fields.insert("webstream_id".to_string(), serde_json::json!(seq.source_id));
                if let Ok(ws) = queries::fetch_webstream(&self.db, seq.source_id).await {
                    fields.insert("url".to_string(), serde_json::json!(ws.current_url()));
                    fields.insert("health_status".to_string(), serde_json::json!(ws.health_status));
                }
            }
            SourceType::ClockTemplate => {
                fields.insert("clock_id".to_string(), serde_json::json!(seq.source_id));
            }
            SourceType::Media | SourceType::Live => {}
        }
        serde_json::Value::Object(fields)
    }

    /// Start or hand off audio for the newly-materialized entry. If
    /// crossfade is effective for this entry, ensure the mount's
    /// persistent session exists (creating it on first use) and feed it
    /// the new media's decoder; otherwise start/replace a plain
    /// single-output pipeline.
    async fn start_audio(
        &self,
        entry: &ScheduleEntry,
        runtime: &MountRuntimeState,
        media_id: Option<Uuid>,
        crossfade_active: bool,
        fade_duration: Duration,
    ) -> crate::Result<()> {
        if runtime.source_type == SourceType::Live {
            return Ok(());
        }

        if crossfade_active {
            let session = match self.registry.session(entry.mount_id).await {
                Some(session) => session,
                None => self.start_crossfade_session(entry.mount_id, fade_duration).await?,
            };
            if let Some(media_id) = media_id {
                let (handle, source) = self.spawn_media_decoder(entry.mount_id, media_id).await?;
                session.play(handle, source).await?;
            }
            return Ok(());
        }

        if let Some(session) = self.registry.take_session(entry.mount_id).await {
            session.close().await;
        }
        if let Some(handle) = self.registry.take_pipeline(entry.mount_id).await {
            handle.stop().await.ok();
        }

        if let Some(media_id) = media_id {
            let media = queries::fetch_media_item(&self.db, media_id).await?;
            let mount = queries::fetch_mount(&self.db, entry.mount_id).await?;
            let pipeline_string = build_single_output_pipeline(&self.resolve_media_path(&media.path), &mount);
            let (handle, output) = pipeline::spawn_single(&self.gstreamer_bin, &pipeline_string).await?;
            self.registry.set_pipeline(entry.mount_id, handle).await;
            self.watch_single_output_eof(entry.mount_id, entry.id, output);
        }

        Ok(())
    }

    /// Non-crossfade path: drain the HQ feed's stdout until EOF, then run
    /// the same track-ended advancement (§4.8) the crossfade pump's
    /// `on_track_end` callback runs. The feed's bytes are an external
    /// broadcast server's concern, same as the dual-output FIFOs (see
    /// DESIGN.md's C6 entry) — this task only watches for the process-side
    /// signal that the track is done.
    fn watch_single_output_eof(&self, mount_id: Uuid, entry_id: Uuid, output: pipeline::Output) {
        let pipeline::Output::Single { mut reader } = output else {
            return;
        };
        let director = self.clone();
        tokio::spawn(async move {
            let mut buf = [0u8; 8192];
            loop {
                match tokio::io::AsyncReadExt::read(&mut reader, &mut buf).await {
                    Ok(0) | Err(_) => break,
                    Ok(_) => continue,
                }
            }
            director.on_track_end(mount_id, entry_id).await;
        });
    }

    /// Start the mount's persistent dual-output encoder fed by raw PCM on
    /// stdin, and the crossfade pump that writes to it. The HQ/LQ FIFOs
    /// are the broadcast server's concern to read from (external
    /// collaborator); the director only wires the pipe and hands off the
    /// session.
    async fn start_crossfade_session(&self, mount_id: Uuid, fade_duration: Duration) -> crate::Result<Arc<crate::crossfade::CrossfadeSession>> {
        let mount = queries::fetch_mount(&self.db, mount_id).await?;
        let fifo_base = std::env::temp_dir().join("wkmp-pd");
        let (hq_path, lq_path) = pipeline::dual_output_fifo_paths(&fifo_base, mount_id);
        let pipeline_string = build_dual_output_pipeline_from_stdin(&hq_path, &lq_path, &mount);

        let (handle, output) = pipeline::spawn_dual(&self.gstreamer_bin, &pipeline_string, &hq_path, &lq_path, true).await?;
        let crate::pipeline::Output::Dual { stdin, .. } = output else {
            unreachable!("spawn_dual always returns Output::Dual")
        };
        let encoder_stdin = stdin.ok_or(crate::error::SubprocessError::StreamClosed)?;

        let frame_size = crate::crossfade::frame_bytes(mount.sample_rate_hz as u32, mount.channels as u16);
        let director = self.clone();
        let session = crate::crossfade::CrossfadeSession::start(encoder_stdin, frame_size, fade_duration, move || {
            let director = director.clone();
            let mount_id = mount_id;
            tokio::spawn(async move {
                if let Some(state) = director.registry().get_runtime(mount_id).await {
                    director.on_track_end(mount_id, state.entry_id).await;
                }
            });
        });

        self.registry.set_pipeline(mount_id, handle).await;
        self.registry.set_session(mount_id, Arc::clone(&session)).await;
        Ok(session)
    }

    async fn spawn_media_decoder(&self, mount_id: Uuid, media_id: Uuid) -> crate::Result<(PipelineHandle, crate::crossfade::PcmSource)> {
        let media = queries::fetch_media_item(&self.db, media_id).await?;
        let mount = queries::fetch_mount(&self.db, mount_id).await?;
        let media_path = self.resolve_media_path(&media.path);
        crate::crossfade::spawn_decoder(&self.gstreamer_bin, &media_path, mount.sample_rate_hz as u32, mount.channels as u16).await
    }

    fn resolve_media_path(&self, path: &str) -> String {
        let p = std::path::Path::new(path);
        if p.is_absolute() {
            path.to_string()
        } else {
            self.media_root.join(p).to_string_lossy().into_owned()
        }
    }

    async fn emit_health_snapshots(&self) {
        for mount_id in self.registry.active_mounts().await {
            let Some(state) = self.registry.get_runtime(mount_id).await else { continue };
            self.events.emit_lossy(DirectorEvent::Health {
                station_id: state.station_id,
                mount_id: state.mount_id,
                entry_id: state.entry_id,
                media_id: state.media_id,
                started_at: state.started_at,
                starts_at: state.started_at,
                ends_at: state.ends_at,
                status: HealthStatus::Playing,
            });
        }
    }

    /// §4.9: one-shot timer firing at `ends_at + soft_overrun + 200ms`.
    /// A no-op if the mount has moved on to a different entry by then.
    async fn schedule_stop_timer(&self, mount_id: Uuid, entry_id: Uuid, ends_at: DateTime<Utc>) {
        let director = self.clone();
        let station_id = match self.registry.get_runtime(mount_id).await {
            Some(s) => s.station_id,
            None => return,
        };
        let soft_overrun = self.policy_cache.get(&self.db, station_id).await.map(|p| p.soft_overrun).unwrap_or(Duration::zero());

        tokio::spawn(async move {
            let fire_at = ends_at + soft_overrun + Duration::milliseconds(200);
            let delay = (fire_at - Utc::now()).to_std().unwrap_or(tokio::time::Duration::from_secs(0));
            tokio::time::sleep(delay).await;
            director.scheduled_stop(mount_id, entry_id, ends_at).await;
        });
    }

    async fn scheduled_stop(&self, mount_id: Uuid, entry_id: Uuid, expected_ends_at: DateTime<Utc>) {
        let Some(state) = self.registry.get_runtime(mount_id).await else { return };
        if state.entry_id != entry_id || state.ends_at != expected_ends_at {
            // Entry was superseded or its end slid; no-op per spec.
            return;
        }

        self.registry.clear_runtime(mount_id).await;
        mount_state::delete(&self.db, mount_id).await.ok();

        if self.registry.session(mount_id).await.is_none() {
            if let Some(handle) = self.registry.take_pipeline(mount_id).await {
                handle.stop().await.ok();
            }
        }

        self.events.emit_lossy(DirectorEvent::Health {
            station_id: state.station_id,
            mount_id,
            entry_id,
            media_id: state.media_id,
            started_at: state.started_at,
            starts_at: state.started_at,
            ends_at: state.ends_at,
            status: HealthStatus::Ended,
        });
    }

    /// §4.8: sequence advancement on track-end, invoked by the HQ feed
    /// handler (non-crossfade) or the pump's `on_track_end` callback.
    pub async fn on_track_end(&self, mount_id: Uuid, entry_id: Uuid) {
        let now = Utc::now();

        let Some(state) = self.registry.get_runtime(mount_id).await else { return };
        if state.entry_id != entry_id {
            return; // another entry has taken over
        }
        if now >= state.ends_at {
            return; // the scheduled stop timer will clean up
        }

        let mut position = state.position;
        let next_media = match state.source_type {
            SourceType::Playlist | SourceType::ClockPlaylist => {
                position = if state.total_items == 0 { 0 } else { (position + 1) % state.total_items };
                if state.source_type == SourceType::Playlist {
                    queries::persist_playlist_position(&self.db, entry_id, position).await.ok();
                }
                state.items.get(position).copied()
            }
            SourceType::SmartBlock | SourceType::Clock => {
                position += 1;
                if position >= state.total_items {
                    None
                } else {
                    state.items.get(position).copied()
                }
            }
            _ => match queries::fetch_random_analyzed_media(&self.db, state.station_id).await {
                Ok(media) => media,
                Err(_) => None,
            },
        };

        // Commit atomically against the live registry entry: a control RPC
        // (SkipStation/StopStation) may have superseded this mount while the
        // queries above were in flight, in which case the update is dropped.
        let updated_state = self
            .registry
            .with_runtime_mut(mount_id, |maybe| {
                let current = maybe?;
                if current.entry_id != entry_id {
                    return None;
                }
                current.position = position;
                current.media_id = next_media;
                Some(current.clone())
            })
            .await;

        let Some(updated_state) = updated_state else { return };
        mount_state::upsert(&self.db, &updated_state).await.ok();

        if let Some(media_id) = next_media {
            if let Some(session) = self.registry.session(mount_id).await {
                if let Ok((handle, source)) = self.spawn_media_decoder(mount_id, media_id).await {
                    session.play(handle, source).await.ok();
                }
            }
        }
    }

    /// §4.10: StopStation.
    pub async fn stop_station(&self, station_id: Uuid) {
        for mount_id in self.registry.active_mounts().await {
            let Some(state) = self.registry.get_runtime(mount_id).await else { continue };
            if state.station_id != station_id {
                continue;
            }
            if let Some(session) = self.registry.take_session(mount_id).await {
                session.close().await;
            }
            if let Some(handle) = self.registry.take_pipeline(mount_id).await {
                handle.stop().await.ok();
            }
            self.registry.clear_runtime(mount_id).await;
            mount_state::delete(&self.db, mount_id).await.ok();

            self.events.emit_lossy(DirectorEvent::Health {
                station_id,
                mount_id,
                entry_id: state.entry_id,
                media_id: state.media_id,
                started_at: state.started_at,
                starts_at: state.started_at,
                ends_at: state.ends_at,
                status: HealthStatus::EmergencyStop,
            });
        }
    }

    /// §4.10: SkipStation.
    pub async fn skip_station(&self, station_id: Uuid) {
        for mount_id in self.registry.active_mounts().await {
            let Some(state) = self.registry.get_runtime(mount_id).await else { continue };
            if state.station_id != station_id {
                continue;
            }
            if let Some(session) = self.registry.take_session(mount_id).await {
                session.close().await;
            }
            if let Some(handle) = self.registry.take_pipeline(mount_id).await {
                handle.stop().await.ok();
            }
            self.on_track_end(mount_id, state.entry_id).await;
        }
    }

    /// §4.10: ReloadStation.
    pub async fn reload_station(&self, station_id: Uuid) {
        for mount_id in self.registry.active_mounts().await {
            let Some(state) = self.registry.get_runtime(mount_id).await else { continue };
            if state.station_id != station_id {
                continue;
            }
            if let Some(handle) = self.registry.take_pipeline(mount_id).await {
                handle.stop().await.ok();
            }
            self.registry.clear_runtime(mount_id).await;
            mount_state::delete(&self.db, mount_id).await.ok();
        }
    }
}

fn build_single_output_pipeline(media_path: &str, mount: &crate::model::Mount) -> String {
    format!(
        "filesrc location=\"{media_path}\" ! decodebin ! audioconvert ! audioresample \
         ! audio/x-raw,rate={rate},channels={channels} ! lamemp3enc bitrate={bitrate} ! fdsink fd=1",
        rate = mount.sample_rate_hz,
        channels = mount.channels,
        bitrate = mount.bitrate_kbps,
    )
}

/// Raw S16LE PCM on stdin, split into an HQ encode and a resampled LQ
/// encode, each written to its own FIFO per §4.6's dual-output mode.
fn build_dual_output_pipeline_from_stdin(hq_path: &std::path::Path, lq_path: &std::path::Path, mount: &crate::model::Mount) -> String {
    format!(
        "fdsrc fd=0 ! audio/x-raw,format=S16LE,rate={rate},channels={channels},layout=interleaved \
         ! tee name=t \
         t. ! queue ! audioconvert ! lamemp3enc bitrate={bitrate} ! filesink location=\"{hq}\" \
         t. ! queue ! audioconvert ! audioresample ! audio/x-raw,rate=22050 ! lamemp3enc bitrate=64 ! filesink location=\"{lq}\"",
        rate = mount.sample_rate_hz,
        channels = mount.channels,
        bitrate = mount.bitrate_kbps,
        hq = hq_path.display(),
        lq = lq_path.display(),
    )
}
