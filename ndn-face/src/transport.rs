//! Byte-stream transports a face can run over.
//!
//! A face needs nothing more than an ordered duplex byte stream. The
//! [`Connector`] trait produces one; TCP and Unix domain sockets are provided
//! and anything else (an in-memory `tokio::io::duplex` pair in tests, a TLS
//! stream) can be used directly with [`crate::Face::open`].

use crate::NDN_TCP_PORT;
use async_trait::async_trait;
use log::debug;
use std::{io, time::Duration};
use tokio::{
    io::{AsyncRead, AsyncWrite},
    net::TcpStream,
    time::timeout,
};

/// A duplex byte stream usable as a face transport.
pub trait Transport: AsyncRead + AsyncWrite + Send + Unpin + 'static {}

impl<T> Transport for T where T: AsyncRead + AsyncWrite + Send + Unpin + 'static {}

/// Boxed transport returned by [`connect_uri`].
pub type BoxedTransport = Box<dyn Transport>;

/// Something that can open a transport to a forwarder.
#[async_trait]
pub trait Connector: Send + Sync {
    type Stream: Transport;

    async fn connect(&self) -> io::Result<Self::Stream>;
}

/// Connects to a forwarder over TCP.
#[derive(Debug, Clone)]
pub struct TcpConnector {
    /// `host:port` of the forwarder
    pub addr: String,

    /// Connection establishment timeout
    pub connect_timeout: Duration,
}

impl TcpConnector {
    pub fn new(addr: impl Into<String>, connect_timeout: Duration) -> Self {
        Self {
            addr: addr.into(),
            connect_timeout,
        }
    }
}

#[async_trait]
impl Connector for TcpConnector {
    type Stream = TcpStream;

    async fn connect(&self) -> io::Result<TcpStream> {
        debug!("Connecting to tcp://{}", self.addr);
        let stream = timeout(self.connect_timeout, TcpStream::connect(&self.addr))
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "connect timed out"))??;
        stream.set_nodelay(true)?;
        Ok(stream)
    }
}

/// Connects to a local forwarder over a Unix domain socket.
#[cfg(unix)]
#[derive(Debug, Clone)]
pub struct UnixConnector {
    pub path: std::path::PathBuf,
    pub connect_timeout: Duration,
}

#[cfg(unix)]
impl UnixConnector {
    pub fn new(path: impl Into<std::path::PathBuf>, connect_timeout: Duration) -> Self {
        Self {
            path: path.into(),
            connect_timeout,
        }
    }
}

#[cfg(unix)]
#[async_trait]
impl Connector for UnixConnector {
    type Stream = tokio::net::UnixStream;

    async fn connect(&self) -> io::Result<tokio::net::UnixStream> {
        debug!("Connecting to unix://{}", self.path.display());
        timeout(self.connect_timeout, tokio::net::UnixStream::connect(&self.path))
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "connect timed out"))?
    }
}

/// Appends the NDN port to a `host`, `[v6]` or bare IPv6 address without one.
fn with_default_port(addr: &str) -> String {
    if let Some(rest) = addr.strip_prefix('[') {
        return match rest.split_once(']') {
            Some((_, port)) if port.starts_with(':') => addr.to_string(),
            _ => format!("{}:{}", addr, NDN_TCP_PORT),
        };
    }
    match addr.matches(':').count() {
        0 => format!("{}:{}", addr, NDN_TCP_PORT),
        1 => addr.to_string(),
        _ => format!("[{}]:{}", addr, NDN_TCP_PORT),
    }
}

/// Opens a transport from a `tcp://host[:port]` or `unix:///path` URI.
pub async fn connect_uri(uri: &str, connect_timeout: Duration) -> io::Result<BoxedTransport> {
    if let Some(addr) = uri.strip_prefix("tcp://") {
        let addr = with_default_port(addr);
        let stream = TcpConnector::new(addr, connect_timeout).connect().await?;
        return Ok(Box::new(stream));
    }

    #[cfg(unix)]
    if let Some(path) = uri.strip_prefix("unix://") {
        let stream = UnixConnector::new(path, connect_timeout).connect().await?;
        return Ok(Box::new(stream));
    }

    Err(io::Error::new(
        io::ErrorKind::InvalidInput,
        format!("Unsupported face URI: {}", uri),
    ))
}
