//! JSON-RPC Server
//!
//! Serves either surface over HTTP. Both surfaces share one handler and so
//! one underlying store.

use crate::error::malformed_params;
use crate::handler::RpcHandler;
use jsonrpsee::server::{RegisterMethodError, Server, ServerHandle};
use jsonrpsee::types::ErrorObjectOwned;
use jsonrpsee::RpcModule;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

const DEFAULT_RPC_HOST: &str = "0.0.0.0";
const DEFAULT_DATA_PORT: u16 = 8080;
const DEFAULT_MANAGEMENT_PORT: u16 = 8888;

/// RPC Server Configuration
#[derive(Debug, Clone)]
pub struct RpcServerConfig {
    pub host: String,
    pub data_port: u16,
    pub management_port: u16,
}

impl Default for RpcServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_RPC_HOST.to_string(),
            data_port: DEFAULT_DATA_PORT,
            management_port: DEFAULT_MANAGEMENT_PORT,
        }
    }
}

/// Which listener to serve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Surface {
    /// Queue users: post, list, delete, clear, truncate, token
    Data,
    /// Administrators: install, users, queues
    Management,
}

impl fmt::Display for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Surface::Data => write!(f, "data"),
            Surface::Management => write!(f, "management"),
        }
    }
}

/// RPC Server
#[derive(Clone)]
pub struct RpcServer {
    config: RpcServerConfig,
    handler: Arc<RpcHandler>,
}

impl RpcServer {
    pub fn new(config: RpcServerConfig, handler: Arc<RpcHandler>) -> Self {
        Self { config, handler }
    }

    fn port(&self, surface: Surface) -> u16 {
        match surface {
            Surface::Data => self.config.data_port,
            Surface::Management => self.config.management_port,
        }
    }

    /// Start one surface
    ///
    /// Returns the bound address (port 0 resolves to the real port) and the
    /// handle that keeps the server alive.
    pub async fn start(&self, surface: Surface) -> Result<(SocketAddr, ServerHandle), String> {
        let addr = format!("{}:{}", self.config.host, self.port(surface));

        let server = Server::builder()
            .build(&addr)
            .await
            .map_err(|e| format!("Failed to build {} server on {}: {}", surface, addr, e))?;

        let local_addr = server
            .local_addr()
            .map_err(|e| format!("Failed to resolve {} server address: {}", surface, e))?;

        let module = match surface {
            Surface::Data => self.data_module(),
            Surface::Management => self.management_module(),
        }
        .map_err(|e| e.to_string())?;

        info!(surface = %surface, addr = %local_addr, "JSON-RPC server started");

        Ok((local_addr, server.start(module)))
    }

    fn data_module(&self) -> Result<RpcModule<()>, RegisterMethodError> {
        let mut module = RpcModule::new(());

        let handler = self.handler.clone();
        module.register_method("api.version.v1", move |_, _, _| {
            Ok::<_, ErrorObjectOwned>(handler.version())
        })?;

        register(&mut module, "api.token.v1", &self.handler, |h, req| async move {
            h.token(req).await
        })?;
        register(&mut module, "queue.post.v1", &self.handler, |h, req| async move {
            h.post(req).await
        })?;
        register(&mut module, "queue.list.v1", &self.handler, |h, req| async move {
            h.list(req).await
        })?;
        register(&mut module, "queue.clear.v1", &self.handler, |h, req| async move {
            h.clear(req).await
        })?;
        register(&mut module, "queue.truncate.v1", &self.handler, |h, req| async move {
            h.truncate(req).await
        })?;
        register(&mut module, "message.delete.v1", &self.handler, |h, req| async move {
            h.delete_message(req).await
        })?;

        Ok(module)
    }

    fn management_module(&self) -> Result<RpcModule<()>, RegisterMethodError> {
        let mut module = RpcModule::new(());

        register(&mut module, "admin.install.v1", &self.handler, |h, req| async move {
            h.install(req).await
        })?;
        register(&mut module, "admin.users.list.v1", &self.handler, |h, req| async move {
            h.list_users(req).await
        })?;
        register(&mut module, "admin.users.get.v1", &self.handler, |h, req| async move {
            h.get_user(req).await
        })?;
        register(&mut module, "admin.users.create.v1", &self.handler, |h, req| async move {
            h.create_user(req).await
        })?;
        register(&mut module, "admin.users.update.v1", &self.handler, |h, req| async move {
            h.update_user(req).await
        })?;
        register(&mut module, "admin.users.delete.v1", &self.handler, |h, req| async move {
            h.delete_user(req).await
        })?;
        register(&mut module, "admin.queues.v1", &self.handler, |h, req| async move {
            h.queues(req).await
        })?;

        Ok(module)
    }
}

/// Register an async method whose named params parse into `P`.
///
/// Params that do not decode are answered with `MalformedRequest`.
fn register<P, R, F, Fut>(
    module: &mut RpcModule<()>,
    name: &'static str,
    handler: &Arc<RpcHandler>,
    call: F,
) -> Result<(), RegisterMethodError>
where
    P: DeserializeOwned + Send + 'static,
    R: Serialize + Clone + Send + 'static,
    F: Fn(Arc<RpcHandler>, P) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = Result<R, ErrorObjectOwned>> + Send + 'static,
{
    let handler = handler.clone();
    module.register_async_method(name, move |params, _, _| {
        let handler = handler.clone();
        let call = call.clone();
        async move {
            let req: P = params.parse().map_err(malformed_params)?;
            call(handler, req).await
        }
    })?;
    Ok(())
}
