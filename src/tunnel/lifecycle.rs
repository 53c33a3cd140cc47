use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{banner, Tunnel};
use crate::client::Lokal;
use crate::error::{LokalError, Result};
use crate::protocol::{ApiResponse, TunnelId};

/// Message suffix the daemon uses when the requested address is taken.
/// Matched as text because the daemon has no error code for it.
const DUPLICATE_ADDRESS_SUFFIX: &str = "address is already being used";

fn is_duplicate_address(message: &str) -> bool {
    message.ends_with(DUPLICATE_ADDRESS_SUFFIX)
}

impl Tunnel {
    /// Ask the daemon to start this tunnel.
    ///
    /// On success the id and addresses assigned by the daemon replace the
    /// requested ones. With [`Tunnel::ignore_duplicate`], a tunnel that
    /// already holds the requested address is adopted instead of failing.
    pub async fn create(&mut self) -> Result<&mut Self> {
        if !self.has_requested_address() {
            return Err(LokalError::MissingAddress);
        }

        let record = self.to_record();
        let ApiResponse {
            success,
            message,
            data,
        } = self.lokal.start_tunnel(&record).await?;

        let Some(created) = data.into_iter().next() else {
            return Err(LokalError::CreationFailed);
        };

        if !success {
            if !(self.ignore_duplicate && is_duplicate_address(&message)) {
                return Err(LokalError::Daemon(message));
            }
            warn!("Reusing existing tunnel: {}", message);
        }

        self.adopt(&created);
        info!(
            "Tunnel created: id={} public={:?} lan={:?}",
            self.id.as_ref().map(|id| id.as_str()).unwrap_or_default(),
            self.stored_public_address(),
            self.address_mdns
        );

        if self.startup_banner {
            banner::print(self);
        }

        Ok(self)
    }

    /// Ask the daemon for the tunnel's assigned public port and store the
    /// resulting address.
    ///
    /// This is the awaited form of the refresh [`Tunnel::get_public_address`]
    /// schedules in the background.
    pub async fn refresh_public_port(&self) -> Result<String> {
        let address = fetch_assigned_address(&self.lokal, self.id.as_ref()).await?;
        *self.address_public.write() = address.clone();
        Ok(address)
    }

    /// Run [`Tunnel::refresh_public_port`] detached from the caller.
    ///
    /// The task only writes the shared public address slot; nothing waits
    /// for it and its errors are logged, not returned. Without a Tokio
    /// runtime on the current thread no task is started.
    pub(crate) fn spawn_refresh(&self) -> Option<JoinHandle<()>> {
        let Ok(handle) = Handle::try_current() else {
            warn!("No async runtime available, skipping public port refresh");
            return None;
        };

        let lokal = self.lokal.clone();
        let id = self.id.clone();
        let slot = Arc::clone(&self.address_public);

        Some(handle.spawn(async move {
            match fetch_assigned_address(&lokal, id.as_ref()).await {
                Ok(address) => {
                    debug!("Public port assigned: {}", address);
                    *slot.write() = address;
                }
                Err(e) => warn!("Public port refresh failed: {}", e),
            }
        }))
    }
}

async fn fetch_assigned_address(lokal: &Lokal, id: Option<&TunnelId>) -> Result<String> {
    // Never created, so there is nothing to look up
    let id = id.ok_or(LokalError::NoTunnelInfo)?;

    let response = lokal.tunnel_info(id).await?;
    if !response.success {
        return Err(LokalError::Daemon(response.message));
    }

    let record = response.first().ok_or(LokalError::NoTunnelInfo)?;
    if !record.address_public.contains(':') {
        return Err(LokalError::NoAssignedPort);
    }

    Ok(record.address_public.clone())
}
