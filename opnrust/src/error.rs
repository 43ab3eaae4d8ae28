//! High-level error types

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Core protocol error: {0}")]
    Core(#[from] opnrust_core::Error),

    #[error("Transport error: {0}")]
    Transport(#[from] opnrust_transport::Error),

    #[error("Type error: {0}")]
    Types(#[from] opnrust_types::Error),

    #[error("Scanner not connected")]
    NotConnected,

    #[error("Invalid response from scanner: {0}")]
    InvalidResponse(String),
}
