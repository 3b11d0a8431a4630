//! Command-line front end for the Driftwire client.
//!
//! A thin shell over [`driftwire_client::Client`]: one line of input
//! becomes one synchronous `call` or `subscribe`, and the prompt only
//! returns once the server has fully acknowledged the request. All
//! protocol logic lives in the client core; this crate only parses
//! commands and moves text.
#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod commands;

pub use commands::Command;
