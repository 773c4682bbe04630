//! Common types for the NDN face engine.
//!
//! This crate provides the TLV codec, the Interest/Data packet model, the
//! forwarder control packets and the key/signature subsystem used by
//! `ndn-face`.

pub mod control;
pub mod error;
pub mod key;
pub mod metrics;
pub mod ndn;
pub mod tlv;

/// Reexport of common types
pub use error::Error;
pub use key::Key;
pub use ndn::{Data, Interest, Name, NameComponent};
pub type Result<T> = std::result::Result<T, Error>;
