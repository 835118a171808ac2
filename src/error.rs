//! Crate-level error type

use crate::broadcast::BroadcastError;
use crate::delivery::DeliveryError;

/// Top-level error type
#[derive(Debug)]
pub enum Error {
    /// Broadcast pipe failure
    Broadcast(BroadcastError),
    /// Delivery queue failure (enqueue after shutdown)
    Delivery(DeliveryError),
    /// I/O failure outside the broadcast core
    Io(std::io::Error),
}

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Broadcast(e) => write!(f, "broadcast error: {}", e),
            Error::Delivery(e) => write!(f, "delivery error: {}", e),
            Error::Io(e) => write!(f, "io error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Broadcast(e) => Some(e),
            Error::Delivery(e) => Some(e),
            Error::Io(e) => Some(e),
        }
    }
}

impl From<BroadcastError> for Error {
    fn from(e: BroadcastError) -> Self {
        Error::Broadcast(e)
    }
}

impl From<DeliveryError> for Error {
    fn from(e: DeliveryError) -> Self {
        Error::Delivery(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}
