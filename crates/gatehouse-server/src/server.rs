//! WebSocket JSON-RPC server wrapping a [`Dispatcher`].

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::types::ErrorObjectOwned;
use tracing::{debug, info};

use gatehouse_confirm::ResolutionDecision;
use gatehouse_core::{Principal, ToolInvocation};
use gatehouse_dispatch::Dispatcher;

use crate::rpc::{
    GatehouseRpcServer, GatewayStatus, InvokeRequest, ResolutionRequest, ToolSummary,
    WirePrincipal,
};

/// The gateway's RPC frontend.
///
/// Owns a shared [`Dispatcher`] and serves it over WebSocket. The server
/// itself holds no policy: every request is handed to the dispatcher
/// unchanged, and every domain outcome rides back inside the result
/// envelope.
pub struct GatewayServer {
    dispatcher: Arc<Dispatcher>,
    started_at: Instant,
}

impl GatewayServer {
    /// Create a server frontend over the given dispatcher.
    #[must_use]
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            dispatcher,
            started_at: Instant::now(),
        }
    }

    /// Bind and start the RPC server.
    ///
    /// Returns the handle (for shutdown) and the bound address, which
    /// matters when the listen address requests port 0.
    ///
    /// # Errors
    ///
    /// Returns an error if the listen address cannot be bound.
    pub async fn start(&self, listen_addr: &str) -> std::io::Result<(ServerHandle, SocketAddr)> {
        let server = Server::builder().build(listen_addr).await?;
        let addr = server.local_addr()?;

        let rpc = RpcImpl {
            dispatcher: Arc::clone(&self.dispatcher),
            started_at: self.started_at,
        };

        let handle = server.start(rpc.into_rpc());
        info!(%addr, "gateway RPC server started");
        Ok((handle, addr))
    }

    /// Spawn the background loop that expires overdue confirmations.
    ///
    /// Lazy expiry already guards the read path; the sweep keeps records
    /// from lingering when nobody touches them.
    #[must_use]
    pub fn spawn_sweep_loop(&self, interval_secs: u64) -> tokio::task::JoinHandle<()> {
        let dispatcher = Arc::clone(&self.dispatcher);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
            loop {
                ticker.tick().await;
                let stats = dispatcher.expire_sweep().await;
                debug!(
                    expired = stats.expired_count(),
                    evicted = stats.evicted,
                    "confirmation sweep pass"
                );
            }
        })
    }
}

/// Server-side implementation of the RPC trait.
struct RpcImpl {
    /// Shared dispatcher, the single entry point into gateway policy.
    dispatcher: Arc<Dispatcher>,
    /// When the gateway came up, for uptime reporting.
    started_at: Instant,
}

#[jsonrpsee::core::async_trait]
impl GatehouseRpcServer for RpcImpl {
    async fn invoke(
        &self,
        principal: WirePrincipal,
        request: InvokeRequest,
    ) -> Result<gatehouse_core::ToolResult, ErrorObjectOwned> {
        let principal = Principal::from(principal);
        debug!(tool = %request.tool, principal = %principal.id, "rpc invoke");

        let invocation = ToolInvocation::new(request.tool, principal, request.parameters);
        Ok(self.dispatcher.invoke(invocation).await)
    }

    async fn resolve(
        &self,
        principal: WirePrincipal,
        resolution: ResolutionRequest,
    ) -> Result<gatehouse_core::ToolResult, ErrorObjectOwned> {
        let resolver = Principal::from(principal);
        let decision = ResolutionDecision::from_approved(resolution.approved);
        debug!(
            confirmation = %resolution.confirmation_id,
            resolver = %resolver.id,
            approved = resolution.approved,
            "rpc resolve"
        );

        Ok(self
            .dispatcher
            .resolve(
                resolution.confirmation_id,
                decision,
                &resolver,
                resolution.comments,
            )
            .await)
    }

    async fn list_tools(
        &self,
        principal: WirePrincipal,
    ) -> Result<Vec<ToolSummary>, ErrorObjectOwned> {
        let principal = Principal::from(principal);
        Ok(self
            .dispatcher
            .visible_tools(&principal)
            .into_iter()
            .map(ToolSummary::from)
            .collect())
    }

    async fn status(&self) -> Result<GatewayStatus, ErrorObjectOwned> {
        Ok(GatewayStatus {
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_secs: self.started_at.elapsed().as_secs(),
            tool_count: self.dispatcher.tool_count(),
            pending_confirmations: self.dispatcher.pending_confirmations(),
        })
    }
}
