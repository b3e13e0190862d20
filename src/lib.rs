//! # Socksgate - SOCKS5 Proxy Server
//!
//! Socksgate is a SOCKS5 proxy server (RFC 1928) that requires
//! username/password authentication (RFC 1929) when clients offer it, relays
//! TCP CONNECT sessions and forwards UDP ASSOCIATE datagrams.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use socksgate::config::load_config;
//! use socksgate::server::Server;
//! use std::sync::Arc;
//! use tokio::sync::broadcast;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = load_config("config.toml")?;
//!     let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);
//!
//!     Server::bind(Arc::new(config)).await?.serve(shutdown_rx).await
//! }
//! ```
//!
//! ## Architecture
//!
//! Every accepted connection gets its own task which negotiates the method,
//! authenticates, parses the request and then relays:
//!
//! ```text
//! Client -> Socksgate -> Target (TCP, both directions)
//! Client -> Socksgate UDP relay -> Target (UDP, forward only)
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod config;
pub mod error;
pub mod server;
pub mod socks;

// Re-export commonly used items
pub use config::{load_config, ServerConfig};
pub use error::{ProxyError, Socks5Error};
pub use server::Server;

/// Version of the Socksgate library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name of the application
pub const NAME: &str = env!("CARGO_PKG_NAME");
