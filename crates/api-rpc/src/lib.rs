//! JSON-RPC API Layer
//!
//! Two JSON-RPC 2.0 surfaces over HTTP sharing one handler:
//! the data plane (queue users) and the management plane (administrators).

pub mod error;
pub mod handler;
pub mod server;
pub mod types;

pub use handler::RpcHandler;
pub use server::{RpcServer, RpcServerConfig, Surface};
