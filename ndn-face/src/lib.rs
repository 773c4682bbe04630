//! NDN face engine.
//!
//! This crate runs the consumer and producer side of an NDN face over any
//! ordered duplex byte stream: a Pending Interest Table that collapses
//! concurrent requests for one Name, a Content Store honouring
//! FreshnessPeriod, automatic continuation of segmented content and the
//! control commands used to register prefixes with a local forwarder.
//!
//! ```no_run
//! # async fn run() -> anyhow::Result<()> {
//! use ndn_face::{Face, FaceOptions};
//! use ndn_common::{Interest, Name};
//!
//! let (face, _inbound) = Face::connect(FaceOptions::default()).await?;
//! let data = face.express_interest(Interest::new(Name::from_string("/hello"))).await?;
//! println!("{} bytes", data.content.len());
//! # Ok(())
//! # }
//! ```

mod config;
mod cs;
mod error;
mod face;
mod packet;
mod pit;
mod retrieval;
mod table;
pub mod transport;

pub use config::FaceOptions;
pub use cs::ContentStore;
pub use error::{FaceError, Result};
pub use face::Face;
pub use packet::{read_frame, write_frame, NdnPacket};
pub use pit::{PendingData, Pit};
pub use retrieval::{next_name, Retrieval};
pub use table::SyncTable;
pub use transport::{connect_uri, Connector, TcpConnector, Transport};

/// Default lifetime of Interests built by the face
pub use ndn_common::ndn::DEFAULT_INTEREST_LIFETIME_MS;

/// Management prefix of a local forwarder
pub const DEFAULT_CONTROL_PREFIX: &str = ndn_common::control::LOCAL_FORWARDER_PREFIX;

/// Capacity of the inbound Interest channel
pub const DEFAULT_INBOUND_CAPACITY: usize = 64;

/// Default NDN port of a forwarder
pub const NDN_TCP_PORT: u16 = 6363;
