//! Framing of NDN packets on a byte stream.
//!
//! Packets are self-delimiting TLV elements, so a frame is exactly one
//! outer element: its type, its length and `length` value bytes.

use bytes::{BufMut, Bytes, BytesMut};
use ndn_common::{
    ndn::{Data, Interest, MAX_NDN_PACKET_SIZE},
    tlv, Error,
};
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// A packet read from the wire.
#[derive(Debug, Clone)]
pub enum NdnPacket {
    Interest(Interest),
    Data(Data),
}

impl NdnPacket {
    /// Parses a frame as Data first, then as Interest.
    pub fn from_bytes(frame: Bytes) -> Result<Self, Error> {
        match Data::decode(frame.clone()) {
            Ok(data) => Ok(NdnPacket::Data(data)),
            Err(_) => Interest::decode(frame).map(NdnPacket::Interest),
        }
    }

    pub fn to_bytes(&self) -> Result<Bytes, Error> {
        match self {
            NdnPacket::Interest(interest) => interest.encode(),
            NdnPacket::Data(data) => data.encode(),
        }
    }
}

async fn read_var_number<R: AsyncRead + Unpin>(reader: &mut R, first: u8) -> io::Result<u64> {
    Ok(match first {
        0..=252 => first as u64,
        253 => reader.read_u16().await? as u64,
        254 => reader.read_u32().await? as u64,
        255 => reader.read_u64().await?,
    })
}

/// Reads the next frame; `Ok(None)` on end of stream at a frame boundary.
pub async fn read_frame<R: AsyncRead + Unpin>(reader: &mut R) -> io::Result<Option<Bytes>> {
    let first = match reader.read_u8().await {
        Ok(byte) => byte,
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e),
    };
    let tlv_type = read_var_number(reader, first).await?;
    let first = reader.read_u8().await?;
    let length = read_var_number(reader, first).await?;

    let header_len = tlv::var_number_size(tlv_type) + tlv::var_number_size(length);
    let too_large = header_len >= MAX_NDN_PACKET_SIZE
        || length > (MAX_NDN_PACKET_SIZE - header_len) as u64;
    if too_large {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Packet of {} bytes exceeds the maximum packet size", length),
        ));
    }

    let mut frame = BytesMut::with_capacity(header_len + length as usize);
    tlv::encode_var_number(tlv_type, &mut frame);
    tlv::encode_var_number(length, &mut frame);
    let mut value = vec![0u8; length as usize];
    reader.read_exact(&mut value).await?;
    frame.put_slice(&value);
    Ok(Some(frame.freeze()))
}

/// Writes one encoded packet and flushes it.
pub async fn write_frame<W: AsyncWrite + Unpin>(writer: &mut W, frame: &[u8]) -> io::Result<()> {
    writer.write_all(frame).await?;
    writer.flush().await
}
