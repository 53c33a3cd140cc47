//! Tunnel descriptor.
//!
//! A [`Tunnel`] is configured with chained setters, then handed to the
//! daemon with [`Tunnel::create`]. After creation it carries the id and
//! addresses the daemon assigned.

mod banner;
mod lifecycle;

use parking_lot::RwLock;
use std::sync::Arc;

use crate::client::Lokal;
use crate::error::{LokalError, Result};
use crate::protocol::{Options, TunnelId, TunnelRecord, TunnelType};

const LAN_SUFFIX: &str = ".local";

/// A tunnel to be created, or already created, through a [`Lokal`] session
#[derive(Debug)]
pub struct Tunnel {
    lokal: Lokal,
    id: Option<TunnelId>,
    name: String,
    /// Unset is sent as an empty type and treated as non-HTTP
    tunnel_type: Option<TunnelType>,
    local_address: String,
    server_id: String,
    address_tunnel: String,
    address_tunnel_port: i64,
    /// Written by the background port refresh as well as by `create`
    address_public: Arc<RwLock<String>>,
    /// Stored without the `.local` suffix
    address_mdns: String,
    inspect: bool,
    options: Options,
    ignore_duplicate: bool,
    startup_banner: bool,
}

impl Tunnel {
    pub(crate) fn new(lokal: Lokal) -> Self {
        Self {
            lokal,
            id: None,
            name: String::new(),
            tunnel_type: None,
            local_address: String::new(),
            server_id: String::new(),
            address_tunnel: String::new(),
            address_tunnel_port: 0,
            address_public: Arc::new(RwLock::new(String::new())),
            address_mdns: String::new(),
            inspect: false,
            options: Options::default(),
            ignore_duplicate: false,
            startup_banner: false,
        }
    }

    /// Address of the local service to expose, e.g. `localhost:3000`
    pub fn set_local_address(mut self, local_address: impl Into<String>) -> Self {
        self.local_address = local_address.into();
        self
    }

    pub fn set_tunnel_type(mut self, tunnel_type: TunnelType) -> Self {
        self.tunnel_type = Some(tunnel_type);
        self
    }

    pub fn set_inspection(mut self, inspect: bool) -> Self {
        self.inspect = inspect;
        self
    }

    /// Request a LAN (mDNS) address. A trailing `.local` is optional.
    pub fn set_lan_address(mut self, lan_address: &str) -> Self {
        self.address_mdns = lan_address
            .strip_suffix(LAN_SUFFIX)
            .unwrap_or(lan_address)
            .to_string();
        self
    }

    pub fn set_public_address(self, public_address: impl Into<String>) -> Self {
        *self.address_public.write() = public_address.into();
        self
    }

    pub fn set_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn set_server_id(mut self, server_id: impl Into<String>) -> Self {
        self.server_id = server_id.into();
        self
    }

    pub fn set_tunnel_address(mut self, address: impl Into<String>) -> Self {
        self.address_tunnel = address.into();
        self
    }

    pub fn set_tunnel_port(mut self, port: i64) -> Self {
        self.address_tunnel_port = port;
        self
    }

    pub fn set_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    /// Treat "address is already being used" from the daemon as success and
    /// adopt the existing tunnel
    pub fn ignore_duplicate(mut self) -> Self {
        self.ignore_duplicate = true;
        self
    }

    /// Print the startup banner once the tunnel is created
    pub fn show_startup_banner(mut self) -> Self {
        self.startup_banner = true;
        self
    }

    pub fn id(&self) -> Option<&TunnelId> {
        self.id.as_ref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tunnel_type(&self) -> Option<TunnelType> {
        self.tunnel_type
    }

    pub fn local_address(&self) -> &str {
        &self.local_address
    }

    pub fn is_inspect(&self) -> bool {
        self.inspect
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn session(&self) -> &Lokal {
        &self.lokal
    }

    /// Public address exactly as last stored, without any port resolution
    pub fn stored_public_address(&self) -> String {
        self.address_public.read().clone()
    }

    pub fn get_lan_address(&self) -> Result<String> {
        if self.address_mdns.is_empty() {
            return Err(LokalError::LanAddressNotSet);
        }

        if self.address_mdns.ends_with(LAN_SUFFIX) {
            return Ok(self.address_mdns.clone());
        }

        Ok(format!("{}{}", self.address_mdns, LAN_SUFFIX))
    }

    /// Public address of the tunnel.
    ///
    /// Tunnels not typed HTTP, untyped ones included, get a random port
    /// assigned by the daemon some time after creation. Until the stored address carries that port, this
    /// schedules one background refresh and fails with the retryable
    /// [`LokalError::PortNotAssigned`]; call again later to pick up the
    /// refreshed address. The refresh is not awaited and its failure is
    /// only logged.
    pub fn get_public_address(&self) -> Result<String> {
        let address = self.stored_public_address();
        if address.is_empty() {
            return Err(LokalError::PublicAddressNotRequested);
        }

        if self.tunnel_type != Some(TunnelType::Http) && !address.contains(':') {
            self.spawn_refresh();
            return Err(LokalError::PortNotAssigned);
        }

        Ok(address)
    }

    pub(crate) fn has_requested_address(&self) -> bool {
        !self.address_mdns.is_empty() || !self.address_public.read().is_empty()
    }

    /// Body sent to the daemon on creation
    pub fn to_record(&self) -> TunnelRecord {
        TunnelRecord {
            id: self.id.clone(),
            name: self.name.clone(),
            tunnel_type: self.tunnel_type,
            local_address: self.local_address.clone(),
            server_id: self.server_id.clone(),
            address_tunnel: self.address_tunnel.clone(),
            address_tunnel_port: self.address_tunnel_port,
            address_public: self.stored_public_address(),
            address_mdns: self.address_mdns.clone(),
            inspect: self.inspect,
            options: self.options.clone(),
        }
    }

    /// Take over the id and addresses the daemon reported
    pub(crate) fn adopt(&mut self, record: &TunnelRecord) {
        *self.address_public.write() = record.address_public.clone();
        self.address_mdns = record.address_mdns.clone();
        self.id = record.id.clone();
    }
}

/// Clones are independent descriptors: the copy gets its own public address
/// slot, so neither its setters nor a later refresh touch the original.
impl Clone for Tunnel {
    fn clone(&self) -> Self {
        Self {
            lokal: self.lokal.clone(),
            id: self.id.clone(),
            name: self.name.clone(),
            tunnel_type: self.tunnel_type,
            local_address: self.local_address.clone(),
            server_id: self.server_id.clone(),
            address_tunnel: self.address_tunnel.clone(),
            address_tunnel_port: self.address_tunnel_port,
            address_public: Arc::new(RwLock::new(self.stored_public_address())),
            address_mdns: self.address_mdns.clone(),
            inspect: self.inspect,
            options: self.options.clone(),
            ignore_duplicate: self.ignore_duplicate,
            startup_banner: self.startup_banner,
        }
    }
}
