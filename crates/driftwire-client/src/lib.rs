//! Driftwire protocol client core.
//!
//! Multiplexes two request kinds, remote method invocations and dataset
//! subscriptions, over one persistent message-oriented connection, and
//! exposes a synchronous wait-for-completion contract to callers even
//! though the underlying transport delivers responses asynchronously.
//!
//! # Architecture
//!
//! Two execution contexts touch the client: the caller context, which
//! issues [`Client::call`] / [`Client::subscribe`] and blocks, and the
//! transport delivery context, which feeds [`Client::handle_message`] one
//! inbound frame at a time and never blocks. They share exactly one
//! resource, the pending operation, guarded by a single monitor
//! (mutex + condvar) inside [`PendingTracker`].
//!
//! ```text
//! caller ──> Client ──encode──> Transport::send
//! Transport delivery ──decode──> dispatcher ──> PendingTracker ──wake──> caller
//! ```
//!
//! # Components
//!
//! - [`PendingTracker`]: the single in-flight-operation ledger
//! - [`Client`]: synchronous request facade and delivery entry points
//! - [`Transport`]: seam for the outbound half of the connection
//! - [`EventSink`]: observer for classified inbound events
#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod client;
mod dispatch;
pub mod error;
pub mod event;
pub mod tracker;
pub mod transport;

pub use client::{Client, ClientConfig, Completion};
pub use error::ClientError;
pub use event::{ClientEvent, CollectionChange, EventSink, NullSink};
pub use tracker::{OperationKind, PendingTracker, WaitOutcome};
pub use transport::{Transport, TransportError};
