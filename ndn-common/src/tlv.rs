//! TLV (Type‑Length‑Value) encoding and decoding utilities.
//!
//! This module provides the NDN variable‑width number, the non‑negative
//! integer encoding and a generic [`TlvElement`] tree. Decoding is flat: an
//! element's value is kept as raw bytes and only re‑decoded into children by
//! the packet layer when the type demands structure.

use crate::error::Error;
use bytes::{Buf, BufMut, Bytes, BytesMut};

/* ---------------------------------------------------------------- *
 * TLV type constants (NDN packet format 0.1)
 * ---------------------------------------------------------------- */

pub const TLV_INTEREST: u64              = 0x05;
pub const TLV_DATA: u64                  = 0x06;
pub const TLV_NAME: u64                  = 0x07;
pub const TLV_COMPONENT: u64             = 0x08;
pub const TLV_SELECTORS: u64             = 0x09;
pub const TLV_NONCE: u64                 = 0x0A;
pub const TLV_SCOPE: u64                 = 0x0B;
pub const TLV_INTEREST_LIFETIME: u64     = 0x0C;
pub const TLV_MIN_SUFFIX_COMPONENTS: u64 = 0x0D;
pub const TLV_MAX_SUFFIX_COMPONENTS: u64 = 0x0E;
pub const TLV_EXCLUDE: u64               = 0x10;
pub const TLV_CHILD_SELECTOR: u64        = 0x11;
pub const TLV_MUST_BE_FRESH: u64         = 0x12;
pub const TLV_ANY: u64                   = 0x13;
pub const TLV_META_INFO: u64             = 0x14;
pub const TLV_CONTENT: u64               = 0x15;
pub const TLV_SIGNATURE_INFO: u64        = 0x16;
pub const TLV_SIGNATURE_VALUE: u64       = 0x17;
pub const TLV_CONTENT_TYPE: u64          = 0x18;
pub const TLV_FRESHNESS_PERIOD: u64      = 0x19;
pub const TLV_FINAL_BLOCK_ID: u64        = 0x1A;
pub const TLV_SIGNATURE_TYPE: u64        = 0x1B;
pub const TLV_KEY_LOCATOR: u64           = 0x1C;

// Forwarder management protocol
pub const TLV_CONTROL_RESPONSE: u64      = 0x65;
pub const TLV_STATUS_CODE: u64           = 0x66;
pub const TLV_STATUS_TEXT: u64           = 0x67;
pub const TLV_CONTROL_PARAMETERS: u64    = 0x68;
pub const TLV_FACE_ID: u64               = 0x69;
pub const TLV_COST: u64                  = 0x6A;
pub const TLV_FLAGS: u64                 = 0x6C;
pub const TLV_EXPIRATION_PERIOD: u64     = 0x6D;
pub const TLV_ORIGIN: u64                = 0x6F;
pub const TLV_URI: u64                   = 0x72;

/* ---------------------------------------------------------------- *
 * Variable‑width numbers
 * ---------------------------------------------------------------- */

/// Encode an NDN variable‑width number (used for both *type* and *length*).
///
/// * `≤ 252`          → 1 byte
/// * `≤ 65 535`       → marker 253 + 2‑byte value
/// * `≤ 4 294 967 295` → marker 254 + 4‑byte value
/// * otherwise        → marker 255 + 8‑byte value
pub fn encode_var_number(value: u64, buf: &mut BytesMut) {
    if value < 253 {
        buf.put_u8(value as u8);
    } else if value <= u16::MAX as u64 {
        buf.put_u8(253);
        buf.put_u16(value as u16);
    } else if value <= u32::MAX as u64 {
        buf.put_u8(254);
        buf.put_u32(value as u32);
    } else {
        buf.put_u8(255);
        buf.put_u64(value);
    }
}

/// Number of bytes required to encode `value` with the variable‑width scheme.
pub fn var_number_size(value: u64) -> usize {
    if value < 253 {
        1
    } else if value <= u16::MAX as u64 {
        3
    } else if value <= u32::MAX as u64 {
        5
    } else {
        9
    }
}

/// Decode a variable‑width number.
pub fn decode_var_number(buf: &mut impl Buf) -> Result<u64, Error> {
    if !buf.has_remaining() {
        return Err(Error::Tlv("Buffer underflow when decoding variable-width number".into()));
    }

    let first_byte = buf.get_u8();
    let width = match first_byte {
        0..=252 => return Ok(first_byte as u64),
        253 => 2,
        254 => 4,
        255 => 8,
    };

    if buf.remaining() < width {
        return Err(Error::Tlv(format!(
            "Buffer underflow when decoding {}-bit variable-width number",
            width * 8
        )));
    }

    Ok(match width {
        2 => buf.get_u16() as u64,
        4 => buf.get_u32() as u64,
        _ => buf.get_u64(),
    })
}

/* ---------------------------------------------------------------- *
 * Non‑negative integers
 * ---------------------------------------------------------------- */

/// Encode a non‑negative integer value in its shortest 1/2/4/8‑byte form.
pub fn encode_nonneg_integer(value: u64) -> Bytes {
    let mut buf = BytesMut::with_capacity(8);
    if value <= u8::MAX as u64 {
        buf.put_u8(value as u8);
    } else if value <= u16::MAX as u64 {
        buf.put_u16(value as u16);
    } else if value <= u32::MAX as u64 {
        buf.put_u32(value as u32);
    } else {
        buf.put_u64(value);
    }
    buf.freeze()
}

/// Decode a non‑negative integer value; only 1, 2, 4 and 8 byte forms are valid.
pub fn decode_nonneg_integer(mut value: &[u8]) -> Result<u64, Error> {
    match value.len() {
        1 => Ok(value.get_u8() as u64),
        2 => Ok(value.get_u16() as u64),
        4 => Ok(value.get_u32() as u64),
        8 => Ok(value.get_u64()),
        n => Err(Error::Tlv(format!("Invalid non-negative integer width: {}", n))),
    }
}

/* ---------------------------------------------------------------- *
 * TLV element tree
 * ---------------------------------------------------------------- */

/// A TLV node: a *type* and either a raw *value* or a list of *children*.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TlvElement {
    pub tlv_type: u64,
    pub value: Bytes,
    pub children: Vec<TlvElement>,
}

impl TlvElement {
    /// Create a leaf element from raw parts.
    pub fn new(tlv_type: u64, value: impl Into<Bytes>) -> Self {
        Self {
            tlv_type,
            value: value.into(),
            children: Vec::new(),
        }
    }

    /// Create an element whose value is made of nested elements.
    pub fn nested(tlv_type: u64, children: Vec<TlvElement>) -> Self {
        Self {
            tlv_type,
            value: Bytes::new(),
            children,
        }
    }

    /// Create a leaf holding a non‑negative integer.
    pub fn from_nonneg_integer(tlv_type: u64, value: u64) -> Self {
        Self::new(tlv_type, encode_nonneg_integer(value))
    }

    /// Append a child element.
    pub fn push(&mut self, child: TlvElement) {
        self.children.push(child);
    }

    /// Length of the value part when encoded.
    pub fn value_len(&self) -> usize {
        if !self.value.is_empty() {
            return self.value.len();
        }
        self.children
            .iter()
            .map(|child| {
                let len = child.value_len();
                var_number_size(child.tlv_type) + var_number_size(len as u64) + len
            })
            .sum()
    }

    /// Total number of bytes when this element is encoded.
    pub fn wire_len(&self) -> usize {
        let vlen = self.value_len();
        var_number_size(self.tlv_type) + var_number_size(vlen as u64) + vlen
    }

    /// Encode this element into `buf`.
    pub fn encode(&self, buf: &mut BytesMut) -> Result<(), Error> {
        if !self.value.is_empty() && !self.children.is_empty() {
            return Err(Error::Tlv(format!(
                "TLV type {} carries both a value and children",
                self.tlv_type
            )));
        }

        encode_var_number(self.tlv_type, buf);
        encode_var_number(self.value_len() as u64, buf);
        if self.children.is_empty() {
            buf.extend_from_slice(&self.value);
        } else {
            for child in &self.children {
                child.encode(buf)?;
            }
        }
        Ok(())
    }

    /// Encode this element into a fresh buffer.
    pub fn to_bytes(&self) -> Result<Bytes, Error> {
        let mut buf = BytesMut::with_capacity(self.wire_len());
        self.encode(&mut buf)?;
        Ok(buf.freeze())
    }

    /// Decode a single element from `buf` **in‑place**, leaving the remaining
    /// bytes in `buf`. The value is not decoded further.
    pub fn decode(buf: &mut impl Buf) -> Result<Self, Error> {
        if buf.remaining() < 2 {
            return Err(Error::Tlv("Buffer too small for TLV header".into()));
        }

        let tlv_type = decode_var_number(buf)?;
        let length   = decode_var_number(buf)?;

        if (buf.remaining() as u64) < length {
            return Err(Error::Tlv(format!(
                "Buffer underflow: TLV value requires {} bytes but only {} available",
                length,
                buf.remaining()
            )));
        }

        // bytes 1.*: cheap zero‑copy slice
        let value = buf.copy_to_bytes(length as usize);
        Ok(Self::new(tlv_type, value))
    }

    /// Decode a sequence of consecutive elements filling all of `bytes`.
    pub fn decode_all(mut bytes: Bytes) -> Result<Vec<Self>, Error> {
        let mut elements = Vec::new();
        while bytes.has_remaining() {
            elements.push(Self::decode(&mut bytes)?);
        }
        Ok(elements)
    }

    /// Re‑decode the value of this element as nested elements.
    pub fn children_of(&self) -> Result<Vec<Self>, Error> {
        if !self.children.is_empty() {
            return Ok(self.children.clone());
        }
        Self::decode_all(self.value.clone())
    }

    /// Interpret the value as a non‑negative integer.
    pub fn as_nonneg_integer(&self) -> Result<u64, Error> {
        decode_nonneg_integer(&self.value)
    }

    /// Fail unless this element has the expected type.
    pub fn expect_type(&self, tlv_type: u64) -> Result<&Self, Error> {
        if self.tlv_type != tlv_type {
            return Err(Error::NdnPacket(format!(
                "Expected TLV type {:#x}, got {:#x}",
                tlv_type, self.tlv_type
            )));
        }
        Ok(self)
    }
}
