//! Transport-agnostic RPC subsystem.
//!
//! The surrounding platform owns framing, wire encoding, authentication,
//! and handler registration; this module only understands decoded method
//! names and JSON argument objects.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     RPC Stack                            │
//! │                                                          │
//! │  ┌───────────┐   ┌──────────────────────────────────┐    │
//! │  │ Transport │──▶│  Engine (dispatcher)             │    │
//! │  │ (external)│   │  → ConfigService                 │    │
//! │  └───────────┘   └──────────────────────────────────┘    │
//! │       ▲                          │                       │
//! │       └──────── RpcResponse ◀────┘                       │
//! └──────────────────────────────────────────────────────────┘
//! ```

pub mod engine;
pub mod messages;

pub use engine::RpcEngine;
pub use messages::RpcResponse;
