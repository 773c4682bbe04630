//! Error types for the face engine.

use ndn_common::ndn::{Marker, Name};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FaceError {
    #[error("Packet error: {0}")]
    Packet(#[from] ndn_common::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Interest timed out: {0}")]
    Timeout(Name),

    #[error("Control command failed with status {code}: {text}")]
    CommandFailed { code: u64, text: String },

    #[error("Cannot continue retrieval of {name} past a {marker:?} component")]
    UnexpectedMarker { name: Name, marker: Marker },

    #[error("Invalid control response: {0}")]
    InvalidControlResponse(String),

    #[error("Face is closed")]
    Closed,
}

pub type Result<T> = std::result::Result<T, FaceError>;
