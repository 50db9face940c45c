//! Stage server entry point for either binding

use contracts::{Stage, TransportKind};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::{GrpcServer, JsonRpcServer, TrackedStage, TransportError};

/// Host `stage` on `listener` until `shutdown` resolves.
///
/// The stage is wrapped in a [`TrackedStage`] so every request carries the
/// server's own received/started/completed marks back to the caller.
pub async fn serve_stage<F>(
    transport: TransportKind,
    listener: TcpListener,
    stage: Arc<dyn Stage>,
    shutdown: F,
) -> Result<(), TransportError>
where
    F: Future<Output = ()>,
{
    let tracked: Arc<dyn Stage> = Arc::new(TrackedStage::new(stage));

    match transport {
        TransportKind::JsonRpc => {
            JsonRpcServer::new(tracked)
                .serve_with_shutdown(listener, shutdown)
                .await
        }
        TransportKind::Grpc => {
            GrpcServer::new(tracked)
                .serve_with_shutdown(listener, shutdown)
                .await
        }
        TransportKind::Local => Err(TransportError::NotRemote(transport)),
    }
}
