//! Deterministic test harness for the Driftwire client.
//!
//! Stands in for the real transport collaborator: [`SimTransport`]
//! records every outbound wire text (with optional send-failure
//! injection), and [`Script`] replays scripted inbound frames to a
//! client from a spawned thread, modeling the transport delivery
//! context.
#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod script;
pub mod sim_transport;

pub use script::Script;
pub use sim_transport::SimTransport;
