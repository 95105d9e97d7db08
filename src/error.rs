use thiserror::Error;

/// Failure to get a reply out of the card at all.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request failed: {0}")]
    Request(String),

    #[error("unexpected HTTP {0}")]
    Status(u16),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout
        } else if err.is_connect() {
            TransportError::Connect(err.to_string())
        } else {
            TransportError::Request(err.to_string())
        }
    }
}

#[derive(Error, Debug)]
pub enum UPSError {
    #[error("UPS unreachable: {0}")]
    Connectivity(#[from] TransportError),

    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("unrecognised payload: {0}")]
    Parse(String),

    #[error("UPS rejected {command} (HTTP {status})")]
    CommandRejected { command: String, status: u16 },

    #[error("invalid base url {0:?}")]
    InvalidUrl(String),

    #[error("unknown {kind} {name:?}")]
    Unknown { kind: &'static str, name: String },

    #[error("configuration: {0}")]
    Config(String),

    #[error("mail: {0}")]
    Mail(String),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<figment::Error> for UPSError {
    fn from(err: figment::Error) -> UPSError {
        UPSError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, UPSError>;
