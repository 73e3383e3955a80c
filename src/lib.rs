//! Single-connection SSH local port forwarding.
//!
//! `ssh-relay` listens on a local TCP port, accepts exactly one inbound
//! connection, opens a direct-tcpip channel over an authenticated SSH session
//! and relays bytes in both directions until either side closes or the user
//! interrupts. One invocation serves one connection.

pub mod cancel;
pub mod cli;
pub mod error;
pub mod forward;
pub mod logging;
pub mod ssh;

pub use error::{RelayError, Result};
pub use forward::{CloseReason, ForwardSpec, TunnelOutcome};
