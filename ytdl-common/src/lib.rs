//! # ytdl Common Library
//!
//! Shared code for the ytdl microservices:
//! - Error and result types
//! - TOML configuration loading and path resolution
//! - Tracing subscriber setup
//! - Shutdown handle, the `/kill` route and the serve loop
//! - Health check response type

pub mod config;
pub mod error;
pub mod health;
pub mod logging;
pub mod server;
pub mod shutdown;

pub use error::{Error, Result};
pub use shutdown::ShutdownHandle;
