//! Control surface (§4.10 + SPEC_FULL §8): the three station-level control
//! operations, exposed as a small command channel into the director rather
//! than a full RPC transport — wiring an actual gRPC/HTTP surface for these
//! is explicitly out of scope.

use crate::director::Director;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

#[derive(Debug)]
enum ControlCommand {
    StopStation { station_id: Uuid, ack: oneshot::Sender<()> },
    SkipStation { station_id: Uuid, ack: oneshot::Sender<()> },
    ReloadStation { station_id: Uuid, ack: oneshot::Sender<()> },
}

/// Cloneable handle accepted by the API layer (or tests) to issue control
/// operations without holding a reference to the director itself.
#[derive(Clone)]
pub struct ControlHandle {
    tx: mpsc::Sender<ControlCommand>,
}

impl ControlHandle {
    /// Spawn the command-processing task bound to `director` and return a
    /// handle for callers.
    pub fn spawn(director: Arc<Director>) -> Self {
        let (tx, mut rx) = mpsc::channel::<ControlCommand>(16);

        tokio::spawn(async move {
            while let Some(cmd) = rx.recv().await {
                match cmd {
                    ControlCommand::StopStation { station_id, ack } => {
                        director.stop_station(station_id).await;
                        let _ = ack.send(());
                    }
                    ControlCommand::SkipStation { station_id, ack } => {
                        director.skip_station(station_id).await;
                        let _ = ack.send(());
                    }
                    ControlCommand::ReloadStation { station_id, ack } => {
                        director.reload_station(station_id).await;
                        let _ = ack.send(());
                    }
                }
            }
        });

        ControlHandle { tx }
    }

    pub async fn stop_station(&self, station_id: Uuid) -> crate::Result<()> {
        self.dispatch(|ack| ControlCommand::StopStation { station_id, ack }).await
    }

    pub async fn skip_station(&self, station_id: Uuid) -> crate::Result<()> {
        self.dispatch(|ack| ControlCommand::SkipStation { station_id, ack }).await
    }

    pub async fn reload_station(&self, station_id: Uuid) -> crate::Result<()> {
        self.dispatch(|ack| ControlCommand::ReloadStation { station_id, ack }).await
    }

    async fn dispatch(&self, build: impl FnOnce(oneshot::Sender<()>) -> ControlCommand) -> crate::Result<()> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.tx
            .send(build(ack_tx))
            .await
            .map_err(|_| crate::error::SubprocessError::StreamClosed.into())?;
        ack_rx.await.map_err(|_| crate::error::SubprocessError::StreamClosed.into())
    }
}
