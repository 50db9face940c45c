//! GrpcServer - hosts one stage behind the PipelineService

use contracts::Stage;
use observability::{record_rpc_request, RpcOutcome};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::Server;
use tonic::{Request, Response, Status};
use tracing::{info, instrument, warn};

use crate::codec::{from_proto, to_proto};
use crate::handler::run_guarded;
use crate::proto::pipeline_service_server::{PipelineService, PipelineServiceServer};
use crate::proto::PipelineMessage;
use crate::TransportError;

const TRANSPORT: &str = "grpc";

/// PipelineService implementation delegating to a stage
pub struct GrpcStageService {
    stage: Arc<dyn Stage>,
}

impl GrpcStageService {
    pub fn new(stage: Arc<dyn Stage>) -> Self {
        Self { stage }
    }
}

#[tonic::async_trait]
impl PipelineService for GrpcStageService {
    async fn process(
        &self,
        request: Request<PipelineMessage>,
    ) -> Result<Response<PipelineMessage>, Status> {
        let message = from_proto(request.into_inner());

        match run_guarded(Arc::clone(&self.stage), message).await {
            Ok(out) => {
                record_rpc_request(TRANSPORT, RpcOutcome::Ok);
                Ok(Response::new(to_proto(&out)))
            }
            Err(message) => {
                warn!(stage = %self.stage.name(), error = %message, "Stage returned error");
                record_rpc_request(TRANSPORT, RpcOutcome::Error);
                Err(Status::internal(message))
            }
        }
    }
}

/// gRPC stage server
pub struct GrpcServer {
    stage: Arc<dyn Stage>,
}

impl GrpcServer {
    pub fn new(stage: Arc<dyn Stage>) -> Self {
        Self { stage }
    }

    /// Serve until the process exits
    pub async fn serve(self, listener: TcpListener) -> Result<(), TransportError> {
        self.serve_with_shutdown(listener, std::future::pending())
            .await
    }

    #[instrument(name = "grpc_serve", skip_all, fields(stage = %self.stage.name()))]
    pub async fn serve_with_shutdown<F>(
        self,
        listener: TcpListener,
        shutdown: F,
    ) -> Result<(), TransportError>
    where
        F: Future<Output = ()>,
    {
        let addr = listener.local_addr()?;
        info!(addr = %addr, "gRPC server listening");

        Server::builder()
            .add_service(PipelineServiceServer::new(GrpcStageService::new(self.stage)))
            .serve_with_incoming_shutdown(TcpListenerStream::new(listener), shutdown)
            .await?;

        info!(addr = %addr, "gRPC server stopped");
        Ok(())
    }
}
