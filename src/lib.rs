//! Lokal client library.
//!
//! Talks to a locally running Lokal daemon over HTTP to start tunnels and
//! look up the addresses they were given.
//!
//! ```no_run
//! # async fn run() -> lokal::Result<()> {
//! let lokal = lokal::Lokal::new()?;
//! let mut tunnel = lokal
//!     .new_tunnel()
//!     .set_local_address("localhost:3000")
//!     .set_lan_address("myapp")
//!     .ignore_duplicate();
//!
//! tunnel.create().await?;
//! println!("{}", tunnel.get_lan_address()?);
//! # Ok(())
//! # }
//! ```

#![deny(clippy::correctness)]
#![warn(clippy::suspicious)]
#![warn(clippy::style)]
#![warn(clippy::complexity)]
#![warn(clippy::perf)]

pub mod client;
pub mod error;
pub mod protocol;
pub mod tunnel;

pub use client::{BasicAuth, Lokal, ResponseInterceptor, ServerVersionCheck};
pub use error::{ErrorKind, LokalError, Result};
pub use protocol::{ApiResponse, Options, TunnelId, TunnelRecord, TunnelType};
pub use tunnel::Tunnel;
