//! gRPC-Server fuer Plauder

use std::future::Future;
use std::net::SocketAddr;

use anyhow::Result;
use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::Server;

use crate::auth::AuthInterceptor;
use crate::proto::chat_service_server::ChatServiceServer;
use crate::service::ChatServiceImpl;

pub struct RpcServer {
    service: ChatServiceImpl,
    interceptor: AuthInterceptor,
}

impl RpcServer {
    pub fn neu(service: ChatServiceImpl, interceptor: AuthInterceptor) -> Self {
        Self {
            service,
            interceptor,
        }
    }

    /// Bindet `addr` und bedient Anfragen bis `shutdown` ausloest
    pub async fn starten<F>(self, addr: SocketAddr, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send,
    {
        let listener = TcpListener::bind(addr).await?;
        self.mit_listener(listener, shutdown).await
    }

    /// Bedient Anfragen auf einem bereits gebundenen Listener
    pub async fn mit_listener<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send,
    {
        tracing::info!(addr = %listener.local_addr()?, "gRPC-Server gestartet");

        Server::builder()
            .add_service(ChatServiceServer::with_interceptor(
                self.service,
                self.interceptor,
            ))
            .serve_with_incoming_shutdown(TcpListenerStream::new(listener), shutdown)
            .await?;

        tracing::info!("gRPC-Server beendet");
        Ok(())
    }
}
