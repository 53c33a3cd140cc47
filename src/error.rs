use thiserror::Error;

/// Broad classification of a [`LokalError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The descriptor is missing something required before any request is made.
    Configuration,
    /// The daemon did not advertise a compatible `Lokal-Server-Version`.
    Version,
    /// Network or HTTP level failure.
    Transport,
    /// The daemon answered but refused or returned nothing usable.
    Daemon,
    /// An address was queried before it was configured or assigned.
    State,
}

#[derive(Error, Debug)]
pub enum LokalError {
    #[error("please enable either lan address or random/custom public url")]
    MissingAddress,

    #[error("your local client might be outdated, please update")]
    UnknownServerVersion,

    #[error("your local client is outdated, please update to minimum version {minimum}")]
    OutdatedClient { server: String, minimum: String },

    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid response from daemon (HTTP {status}): {source}")]
    InvalidResponse {
        status: u16,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0}")]
    Daemon(String),

    #[error("tunnel creation failing")]
    CreationFailed,

    #[error("could not get tunnel info")]
    NoTunnelInfo,

    #[error("could not get assigned port")]
    NoAssignedPort,

    #[error("lan address is not being set")]
    LanAddressNotSet,

    #[error("public address is not requested by client")]
    PublicAddressNotRequested,

    #[error("tunnel is using a random port, but it has not been assigned yet. please try again later")]
    PortNotAssigned,

    #[error("interceptor rejected response: {0}")]
    Rejected(String),
}

impl LokalError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LokalError::MissingAddress => ErrorKind::Configuration,
            LokalError::UnknownServerVersion | LokalError::OutdatedClient { .. } => {
                ErrorKind::Version
            }
            LokalError::Transport(_)
            | LokalError::InvalidResponse { .. }
            | LokalError::Rejected(_) => ErrorKind::Transport,
            LokalError::Daemon(_)
            | LokalError::CreationFailed
            | LokalError::NoTunnelInfo
            | LokalError::NoAssignedPort => ErrorKind::Daemon,
            LokalError::LanAddressNotSet
            | LokalError::PublicAddressNotRequested
            | LokalError::PortNotAssigned => ErrorKind::State,
        }
    }

    /// Whether calling the same accessor again later may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LokalError::PortNotAssigned)
    }
}

pub type Result<T> = std::result::Result<T, LokalError>;
