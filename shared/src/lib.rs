// shared/src/lib.rs

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("not found")]
    NotFound,
    #[error("storage: {0}")]
    Storage(String),
    #[error("serialization: {0}")]
    Serialization(String),
    #[error("server responded with {status}: {message}")]
    Remote { status: u16, message: String },
    #[error("transport: {0}")]
    Transport(String),
    #[error("config: {0}")]
    Config(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Time-to-live in milliseconds
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TtlMs(pub u64);

impl TtlMs {
    /// One hour, used whenever neither the caller nor the server declares a TTL
    pub const DEFAULT: TtlMs = TtlMs(3_600_000);
}

impl Default for TtlMs {
    fn default() -> Self {
        Self::DEFAULT
    }
}

pub mod config;
