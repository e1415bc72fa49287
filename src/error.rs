//! Structured error taxonomy for the driver.
//!
//! One variant per failure kind named in the protocol design: validation and
//! media-support errors surface before a transport is ever opened; transport
//! and printer errors carry the underlying cause so callers can inspect it.

use crate::media::Media;
use crate::model::PrinterModel;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{media:?} is not supported on {model:?}")]
    UnsupportedMedia {
        model: PrinterModel,
        media: Media,
    },

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("USB device not found: {0}")]
    TransportNotFound(String),

    #[error("permission denied accessing transport: {0}")]
    TransportPermission(String),

    #[error("transport timed out: {0}")]
    TransportTimeout(String),

    #[error("network error: {0}")]
    TransportNetwork(#[source] std::io::Error),

    #[error("transport write failed: {0}")]
    TransportWrite(String),

    #[error("printer reported error code 0x{info1:02X}{info2:02X}")]
    PrinterError { info1: u8, info2: u8 },

    #[error("malformed status reply: {0}")]
    ProtocolError(String),
}

pub type Result<T> = std::result::Result<T, Error>;
