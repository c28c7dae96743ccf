//! qnd SDK - Rust Client Library
//!
//! Typed clients for both qnd surfaces: [`QndClient`] for the data plane
//! (queue users) and [`AdminClient`] for the management plane.
//!
//! # Example
//!
//! ```no_run
//! use qnd_sdk::{Auth, QndClient};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = QndClient::connect("http://127.0.0.1:8080")
//!         .await?
//!         .with_auth(Auth::password("alice", "secret"));
//!
//!     let posted = client.post("orders", json!({"sku": 42})).await?;
//!     println!("Message {} posted to {}", posted.id, posted.queue);
//!
//!     for message in client.list("orders").await?.messages {
//!         println!("{} {}", message.id, message.content);
//!     }
//!
//!     Ok(())
//! }
//! ```

mod client;
mod error;
mod types;

pub use client::{AdminClient, QndClient};
pub use error::{Result, SdkError};
pub use types::{
    Auth, ClearResponse, DeleteMessageResponse, DeleteUserResponse, InstallResponse,
    ListResponse, Message, OrphanedQueue, OwnedQueue, PostResponse, QueuesResponse,
    TokenResponse, TruncateResponse, UpdateUser, UserView, UsersResponse, VersionResponse,
};
