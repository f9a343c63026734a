//! Mount Playout State Store (C5): the arena + IDs pattern from the design
//! notes — one registry owning all per-mount resources, indexed by
//! `mount_id`, with no cross-referential `Arc`s between state, pipeline
//! handle, and crossfade session.

use crate::crossfade::CrossfadeSession;
use crate::model::MountRuntimeState;
use crate::pipeline::PipelineHandle;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Per-mount resources, indexed by `mount_id`. Each map is independently
/// locked so a caller touching runtime state never blocks on pipeline or
/// crossfade-session access, matching the concurrency model's "one mutex
/// per shared structure, short critical sections" rule.
#[derive(Clone)]
pub struct MountRegistry {
    runtime: Arc<RwLock<HashMap<Uuid, MountRuntimeState>>>,
    pipelines: Arc<RwLock<HashMap<Uuid, PipelineHandle>>>,
    sessions: Arc<RwLock<HashMap<Uuid, Arc<CrossfadeSession>>>>,
}

impl MountRegistry {
    pub fn new() -> Self {
        MountRegistry {
            runtime: Arc::new(RwLock::new(HashMap::new())),
            pipelines: Arc::new(RwLock::new(HashMap::new())),
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn get_runtime(&self, mount_id: Uuid) -> Option<MountRuntimeState> {
        self.runtime.read().await.get(&mount_id).cloned()
    }

    pub async fn set_runtime(&self, state: MountRuntimeState) {
        self.runtime.write().await.insert(state.mount_id, state);
    }

    pub async fn clear_runtime(&self, mount_id: Uuid) -> Option<MountRuntimeState> {
        self.runtime.write().await.remove(&mount_id)
    }

    /// Mutate the runtime state for a mount in a single short critical
    /// section, returning whatever `f` returns. Callers needing to act on
    /// the result after the lock is released should copy out the fields
    /// they need inside `f` rather than holding a reference.
    pub async fn with_runtime_mut<R>(
        &self,
        mount_id: Uuid,
        f: impl FnOnce(Option<&mut MountRuntimeState>) -> R,
    ) -> R {
        let mut guard = self.runtime.write().await;
        f(guard.get_mut(&mount_id))
    }

    pub async fn active_mounts(&self) -> Vec<Uuid> {
        self.runtime.read().await.keys().copied().collect()
    }

    pub async fn set_pipeline(&self, mount_id: Uuid, handle: PipelineHandle) {
        self.pipelines.write().await.insert(mount_id, handle);
    }

    pub async fn take_pipeline(&self, mount_id: Uuid) -> Option<PipelineHandle> {
        self.pipelines.write().await.remove(&mount_id)
    }

    pub async fn session(&self, mount_id: Uuid) -> Option<Arc<CrossfadeSession>> {
        self.sessions.read().await.get(&mount_id).cloned()
    }

    pub async fn set_session(&self, mount_id: Uuid, session: Arc<CrossfadeSession>) {
        self.sessions.write().await.insert(mount_id, session);
    }

    pub async fn take_session(&self, mount_id: Uuid) -> Option<Arc<CrossfadeSession>> {
        self.sessions.write().await.remove(&mount_id)
    }
}

impl Default for MountRegistry {
    fn default() -> Self {
        Self::new()
    }
}
