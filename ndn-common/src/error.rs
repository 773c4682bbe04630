//! Error types for the NDN packet layer.

use thiserror::Error;

/// All possible errors raised by the codec, the packet model and the key subsystem.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed or truncated TLV, or a node carrying both a value and children.
    #[error("TLV error: {0}")]
    Tlv(String),

    /// A packet is missing a required field or has a malformed sub-structure.
    #[error("NDN packet error: {0}")]
    NdnPacket(String),

    /// The key cannot perform the requested operation (e.g. signing with a public key).
    #[error("unsupported key type")]
    UnsupportedKeyType,

    /// The signature parsed but does not match the digest.
    #[error("signature verification failed")]
    VerificationFailed,

    /// Key material could not be encoded or decoded.
    #[error("key error: {0}")]
    Key(String),

    /// Certificate body or armor could not be encoded or decoded.
    #[error("certificate error: {0}")]
    Certificate(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Other errors
    #[error("Other error: {0}")]
    Other(String),
}

impl From<der::Error> for Error {
    fn from(err: der::Error) -> Self {
        Error::Certificate(err.to_string())
    }
}
