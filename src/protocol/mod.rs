//! Wire types for the Lokal daemon's JSON API.
//!
//! - [`TunnelRecord`] - Tunnel body sent to and returned by the daemon
//! - [`ApiResponse`] - `{success, message, data}` envelope around every reply
//!
//! Also provides a type-safe [`TunnelId`] wrapper.

mod ids;
mod messages;

pub use ids::*;
pub use messages::*;
