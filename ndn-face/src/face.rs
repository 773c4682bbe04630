//! NDN face over a duplex byte stream.
//!
//! A face owns the write half of its transport and one read task that parses
//! incoming packets. Data is matched against the face's Pending Interest
//! Table and cached in a Content Store; Interests are handed to the
//! application's inbound channel.

use anyhow::Context;
use log::{debug, info, trace, warn};
use ndn_common::{
    control::{ControlCommand, ControlResponse},
    key::decode_public_key,
    metrics::FaceMetrics,
    ndn::{Data, Interest, Name, SignatureType},
    Key,
};
use std::{
    fmt,
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc, OnceLock, Weak,
    },
    time::Duration,
};
use tokio::{
    io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufReader},
    sync::{mpsc, Mutex, RwLock},
    task::JoinHandle,
};

use crate::{
    cs::ContentStore,
    error::{FaceError, Result},
    packet::{read_frame, write_frame, NdnPacket},
    pit::{PendingData, Pit, SinkId},
    retrieval::{self, Retrieval},
    transport::{connect_uri, Transport},
    FaceOptions,
};

#[cfg(test)]
mod tests;

static NEXT_FACE_ID: AtomicU64 = AtomicU64::new(1);

type Writer = Box<dyn AsyncWrite + Send + Unpin>;

/// An NDN face. Cloning is cheap and every clone drives the same face.
#[derive(Clone)]
pub struct Face {
    inner: Arc<FaceInner>,
}

struct FaceInner {
    /// Identifier used in log lines
    id: String,

    options: FaceOptions,

    /// Write half of the transport; `None` once closed
    writer: Mutex<Option<Writer>>,

    /// Read task, aborted on close
    reader: OnceLock<JoinHandle<()>>,

    pit: Pit,

    cs: Arc<ContentStore>,

    /// Key signing control commands
    command_key: RwLock<Option<Arc<Key>>>,

    has_inbound: bool,

    closed: AtomicBool,

    metrics: Arc<FaceMetrics>,
}

impl fmt::Debug for Face {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Face")
            .field("id", &self.inner.id)
            .field("pending", &self.inner.pit.len())
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl Face {
    /// Opens a face over `transport`.
    ///
    /// Inbound Interests are delivered to `inbound`; with `None` they are
    /// dropped. Must be called from within a tokio runtime.
    pub fn open<T: Transport>(
        transport: T,
        options: FaceOptions,
        inbound: Option<mpsc::Sender<Interest>>,
    ) -> Self {
        let cs = if options.shared_content_store {
            ContentStore::global()
        } else {
            ContentStore::new()
        };
        Self::open_with_content_store(transport, options, cs, inbound)
    }

    /// Opens a face that caches into `cs` instead of the store picked by
    /// the options.
    pub fn open_with_content_store<T: Transport>(
        transport: T,
        options: FaceOptions,
        cs: Arc<ContentStore>,
        inbound: Option<mpsc::Sender<Interest>>,
    ) -> Self {
        let id = options
            .id
            .clone()
            .unwrap_or_else(|| format!("face-{}", NEXT_FACE_ID.fetch_add(1, Ordering::Relaxed)));
        let (reader, writer) = tokio::io::split(transport);

        let inner = Arc::new(FaceInner {
            id: id.clone(),
            options,
            writer: Mutex::new(Some(Box::new(writer))),
            reader: OnceLock::new(),
            pit: Pit::new(),
            cs,
            command_key: RwLock::new(None),
            has_inbound: inbound.is_some(),
            closed: AtomicBool::new(false),
            metrics: Arc::new(FaceMetrics::new()),
        });

        let handle = tokio::spawn(read_loop(
            Arc::downgrade(&inner),
            id,
            BufReader::new(reader),
            inbound,
        ));
        let _ = inner.reader.set(handle);

        Self { inner }
    }

    /// Connects to the forwarder named in the options and opens a face with
    /// an inbound Interest channel.
    pub async fn connect(options: FaceOptions) -> anyhow::Result<(Self, mpsc::Receiver<Interest>)> {
        let transport = connect_uri(&options.forwarder_uri, options.connect_timeout())
            .await
            .with_context(|| format!("Failed to connect to {}", options.forwarder_uri))?;
        let command_key = options.read_command_key()?;
        let uri = options.forwarder_uri.clone();

        let (sender, receiver) = mpsc::channel(options.inbound_capacity.max(1));
        let face = Self::open(transport, options, Some(sender));
        if let Some(key) = command_key {
            face.set_command_key(key).await;
        }

        info!("[Face {}] Connected to {}", face.id(), uri);
        Ok((face, receiver))
    }

    /// Get the face ID
    pub fn id(&self) -> &str {
        &self.inner.id
    }

    pub fn options(&self) -> &FaceOptions {
        &self.inner.options
    }

    pub fn metrics(&self) -> Arc<FaceMetrics> {
        Arc::clone(&self.inner.metrics)
    }

    pub fn content_store(&self) -> Arc<ContentStore> {
        Arc::clone(&self.inner.cs)
    }

    /// Number of Names with outstanding Interests.
    pub fn pending_interests(&self) -> usize {
        self.inner.pit.len()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    /// Sets the key that signs control commands.
    pub async fn set_command_key(&self, key: Key) {
        *self.inner.command_key.write().await = Some(Arc::new(key));
    }

    /// Sends an Interest, returning the sink its Data will arrive on.
    ///
    /// A fresh Content Store entry answers without touching the network.
    /// Otherwise the sink joins the PIT entry for the Name; only the call
    /// that creates the entry writes the Interest. The sink is closed when
    /// the Interest lifetime elapses.
    pub async fn send_interest(&self, interest: Interest) -> Result<PendingData> {
        self.inner.send_interest(interest).await
    }

    /// Sends an Interest and waits for its Data.
    pub async fn express_interest(&self, interest: Interest) -> Result<Data> {
        let name = interest.name.clone();
        self.send_interest(interest)
            .await?
            .await
            .ok_or(FaceError::Timeout(name))
    }

    /// Retrieves `interest`'s Name and every continuation of it, following
    /// segment, sequence and offset components until FinalBlockId.
    pub fn fetch(&self, interest: Interest) -> Retrieval {
        retrieval::spawn(self.clone(), interest)
    }

    /// Writes a Data packet (producer side).
    pub async fn put_data(&self, data: &Data) -> Result<()> {
        debug!("[Face {}] Send Data: {}", self.inner.id, data.name);
        let wire = data.encode()?;
        self.inner.write_packet(&wire).await?;
        self.inner.metrics.data_sent.increment();
        Ok(())
    }

    /// Writes an Interest without recording it in the PIT.
    pub async fn put_interest(&self, interest: &Interest) -> Result<()> {
        debug!("[Face {}] Send raw Interest: {}", self.inner.id, interest.name);
        let wire = interest.encode()?;
        self.inner.write_packet(&wire).await
    }

    /// Sends a control command to the forwarder and checks its status.
    pub async fn send_control_command(&self, command: &ControlCommand) -> Result<ControlResponse> {
        let options = &self.inner.options;
        let prefix = Name::from_string(&options.control_prefix);
        let key = self.inner.command_key.read().await.clone();
        let interest = command.to_interest(&prefix, key.as_deref(), options.control_lifetime_ms)?;

        debug!(
            "[Face {}] Control command {}/{}",
            self.inner.id, command.module, command.command
        );
        let data = self.express_interest(interest).await?;

        let response = ControlResponse::decode(data.content.clone())
            .map_err(|e| FaceError::InvalidControlResponse(e.to_string()))?;
        if !response.is_ok() {
            warn!(
                "[Face {}] Control command {}/{} failed: {} {}",
                self.inner.id, command.module, command.command, response.status_code, response.status_text
            );
            return Err(FaceError::CommandFailed {
                code: response.status_code,
                text: response.status_text,
            });
        }
        Ok(response)
    }

    /// Registers a route for `prefix` towards this face.
    pub async fn register(&self, prefix: &Name) -> Result<ControlResponse> {
        self.send_control_command(&ControlCommand::register(prefix, None)).await
    }

    /// Removes the route for `prefix`.
    pub async fn unregister(&self, prefix: &Name) -> Result<ControlResponse> {
        self.send_control_command(&ControlCommand::unregister(prefix, None)).await
    }

    /// Asks the forwarder to create a face towards `uri`.
    pub async fn create_face(&self, uri: &str) -> Result<ControlResponse> {
        self.send_control_command(&ControlCommand::create_face(uri)).await
    }

    /// Registers `prefix` so Interests under it reach the inbound channel.
    pub async fn listen(&self, prefix: &Name) -> Result<()> {
        if !self.inner.has_inbound {
            warn!(
                "[Face {}] Listening on {} without an inbound channel; Interests will be dropped",
                self.inner.id, prefix
            );
        }
        self.register(prefix).await?;
        info!("[Face {}] Listening on {}", self.inner.id, prefix);
        Ok(())
    }

    /// Checks the signature of `data`.
    ///
    /// Digest signatures are checked locally. Key signatures fetch the
    /// certificate named by the KeyLocator over this face and verify with
    /// the public key it carries.
    pub async fn verify(&self, data: &Data) -> Result<()> {
        let signature_type = data.signature_info.signature_type;
        if signature_type == SignatureType::DigestSha256 {
            return Ok(data.verify_digest()?);
        }

        let locator = data
            .signature_info
            .key_locator
            .as_ref()
            .ok_or(ndn_common::Error::VerificationFailed)?;
        let certificate = self
            .express_interest(Interest::new(locator.name.clone()).with_lifetime(self.inner.options.interest_lifetime_ms))
            .await?;
        let key = decode_public_key(&certificate.content)?;
        if key.signature_type() != signature_type {
            return Err(ndn_common::Error::VerificationFailed.into());
        }
        key.verify_data(data)?;
        trace!("[Face {}] Verified {} with {}", self.inner.id, data.name, locator.name);
        Ok(())
    }

    /// Closes the face: shuts the write half, stops the read task and
    /// closes every pending sink.
    pub async fn close(&self) {
        if self.inner.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        debug!("[Face {}] Closing", self.inner.id);

        if let Some(mut writer) = self.inner.writer.lock().await.take() {
            if let Err(e) = writer.shutdown().await {
                debug!("[Face {}] Shutdown of write half failed: {}", self.inner.id, e);
            }
        }
        if let Some(reader) = self.inner.reader.get() {
            reader.abort();
        }

        let closed = self.inner.pit.close_all();
        self.inner.metrics.pit_size.set(0);
        debug!("[Face {}] Closed {} pending Interests", self.inner.id, closed);
    }
}

impl FaceInner {
    async fn send_interest(self: &Arc<Self>, interest: Interest) -> Result<PendingData> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(FaceError::Closed);
        }
        self.metrics.interests_expressed.increment();

        if let Some(data) = self.cs.get(&interest.name) {
            trace!("[Face {}] Content Store hit: {}", self.id, interest.name);
            self.metrics.cs_hits.increment();
            return Ok(PendingData::ready(data));
        }
        self.metrics.cs_misses.increment();

        let wire = interest.encode()?;
        let registration = self.pit.register(&interest.name);
        self.metrics.pit_size.set(self.pit.len() as u64);

        if registration.is_new {
            // Data cached between the lookup above and the registration
            if self.satisfy_from_cache(&interest.name) {
                return Ok(registration.pending);
            }

            debug!("[Face {}] Express Interest: {}", self.id, interest.name);
            if let Err(e) = self.write_packet(&wire).await {
                warn!("[Face {}] Failed to send Interest {}: {}", self.id, interest.name, e);
                self.pit.remove(&interest.name);
                self.metrics.pit_size.set(self.pit.len() as u64);
                return Err(e);
            }
            self.metrics.interests_sent.increment();
        } else {
            debug!("[Face {}] Interest collapsed into pending entry: {}", self.id, interest.name);
            self.metrics.interests_collapsed.increment();
        }

        let lifetime = interest.lifetime();
        self.schedule_expiry(interest.name, registration.sink, lifetime);
        Ok(registration.pending)
    }

    /// Answers the PIT entry for `name` from the Content Store, if it holds
    /// the Data.
    fn satisfy_from_cache(&self, name: &Name) -> bool {
        let Some(data) = self.cs.get(name) else {
            return false;
        };
        trace!("[Face {}] Content Store hit after registration: {}", self.id, name);
        self.metrics.cs_hits.increment();
        self.pit.satisfy(&data);
        self.metrics.pit_size.set(self.pit.len() as u64);
        true
    }

    fn schedule_expiry(self: &Arc<Self>, name: Name, sink: SinkId, lifetime: Duration) {
        let face = Arc::downgrade(self);
        tokio::spawn(async move {
            tokio::time::sleep(lifetime).await;
            let Some(inner) = face.upgrade() else {
                return;
            };
            if inner.pit.expire(&name, sink) {
                debug!("[Face {}] Interest timed out: {}", inner.id, name);
                inner.metrics.interests_timed_out.increment();
                inner.metrics.pit_size.set(inner.pit.len() as u64);
            }
        });
    }

    fn recv_data(&self, data: Data) {
        self.metrics.data_received.increment();

        // Cached before consumers wake so a follow-up Interest hits the store
        if self.cs.insert(&data) {
            self.metrics.cs_inserts.increment();
        }

        match self.pit.satisfy(&data) {
            Some(satisfied) => {
                debug!(
                    "[Face {}] Received Data for {}, {} consumers, RTT: {}µs",
                    self.id,
                    data.name,
                    satisfied.sinks,
                    satisfied.elapsed.as_micros()
                );
                self.metrics.interests_satisfied.add(satisfied.sinks as u64);
                self.metrics.interest_rtt_us.observe_duration(satisfied.elapsed);
                self.metrics.pit_size.set(self.pit.len() as u64);
            }
            None => {
                trace!("[Face {}] Unsolicited Data: {}", self.id, data.name);
                self.metrics.data_unsolicited.increment();
            }
        }
    }

    async fn write_packet(&self, wire: &[u8]) -> Result<()> {
        let mut writer = self.writer.lock().await;
        let writer = writer.as_mut().ok_or(FaceError::Closed)?;
        write_frame(writer, wire).await?;
        self.metrics.bytes_sent.add(wire.len() as u64);
        Ok(())
    }
}

/// Reads packets until the transport ends or yields a packet that is neither
/// Data nor Interest, then closes the inbound channel and every pending sink.
async fn read_loop<R: AsyncRead + Unpin>(
    face: Weak<FaceInner>,
    id: String,
    mut reader: BufReader<R>,
    mut inbound: Option<mpsc::Sender<Interest>>,
) {
    debug!("[Face {}] Starting read loop", id);

    loop {
        let frame = match read_frame(&mut reader).await {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                debug!("[Face {}] Transport reached end of stream", id);
                break;
            }
            Err(e) => {
                warn!("[Face {}] Transport read failed: {}", id, e);
                break;
            }
        };
        let Some(inner) = face.upgrade() else {
            break;
        };
        inner.metrics.bytes_received.add(frame.len() as u64);

        match NdnPacket::from_bytes(frame) {
            Ok(NdnPacket::Data(data)) => inner.recv_data(data),
            Ok(NdnPacket::Interest(interest)) => {
                trace!("[Face {}] Received Interest: {}", id, interest.name);
                inner.metrics.interests_received.increment();
                let delivered = match &inbound {
                    Some(sender) => sender.send(interest).await.is_ok(),
                    None => false,
                };
                if !delivered {
                    inner.metrics.packets_dropped.increment();
                    inbound = None;
                }
            }
            Err(e) => {
                warn!("[Face {}] Undecodable packet, stopping: {}", id, e);
                break;
            }
        }
    }

    drop(inbound);
    if let Some(inner) = face.upgrade() {
        let closed = inner.pit.close_all();
        inner.metrics.pit_size.set(0);
        debug!("[Face {}] Read loop stopped, closed {} pending Interests", id, closed);
    }
}
