//! IPC module for daemon-client communication

mod engine;
mod framing;
mod protocol;
mod server;

pub use engine::RemoteEngine;
pub use protocol::{DaemonStatus, Notification};
pub use server::Server;
