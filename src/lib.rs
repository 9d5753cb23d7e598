//! mcp-host: aggregate Model Context Protocol tool servers behind one
//! generation endpoint.
//!
//! A [`SessionRegistry`] holds one live session per configured server. Each
//! request gets a [`HostToolRouter`] scoped by its tool configs, and an
//! [`Agent`] runs a bounded number of rounds against it.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use mcp_host::prelude::*;
//!
//! # async fn example() -> mcp_host::error::Result<()> {
//! let config = "![/srv/tools][math] ./math-server --stdio";
//! let registry = SessionRegistry::build(config, &McpConnector::default()).await?;
//! let host = Host::new(registry, Arc::new(EchoAgent));
//!
//! let reply = host
//!     .generate(&[Message::user("hello")], GenerateOptions::default())
//!     .await?;
//! println!("{}", reply.text());
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod catalog;
pub mod config;
pub mod error;
pub mod host;
pub mod mcp;
pub mod prelude;
pub mod registry;
pub mod router;
pub mod server;
pub mod types;

#[cfg(feature = "cli")]
pub mod cli;

pub use agent::Agent;
pub use host::{GenerateOptions, Host};
pub use registry::SessionRegistry;
pub use router::HostToolRouter;
