//! qnd daemon library
//!
//! Composition root shared by the `qnd-daemon` binary and the integration
//! tests: configuration, service wiring and the listener supervisor.

pub mod app;
pub mod config;
pub mod shutdown;
pub mod supervisor;

pub use app::{build_handler, open_store, ServiceSettings};
pub use config::DaemonConfig;
pub use shutdown::{shutdown_channel, ShutdownSender, ShutdownToken};
pub use supervisor::supervise;
