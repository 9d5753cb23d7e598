//! Core types shared by the registry, router, agents, and HTTP façade.

pub mod message;
pub mod tool;

pub use message::*;
pub use tool::*;
