//! NDN packet types and structures.
//!
//! This module provides the Name, Interest and Data packets and their
//! TLV wire encoding.

use crate::error::Error;
use crate::tlv::{self, TlvElement};
use bytes::{BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

#[cfg(test)]
mod tests;

/// Maximum size of an NDN packet.
pub const MAX_NDN_PACKET_SIZE: usize = 8800;

/// Default Interest lifetime when none is given.
pub const DEFAULT_INTEREST_LIFETIME_MS: u64 = 4000;

/// Content type of ordinary payloads.
pub const CONTENT_TYPE_BLOB: u64 = 0;
/// Content type of link objects.
pub const CONTENT_TYPE_LINK: u64 = 1;
/// Content type of public key / certificate objects.
pub const CONTENT_TYPE_KEY: u64 = 2;

/// Typed markers carried in the first byte of a numeric name component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Marker {
    Segment = 0x00,
    Offset = 0xFB,
    Timestamp = 0xFC,
    Version = 0xFD,
    Sequence = 0xFE,
}

impl Marker {
    /// Map a component's first byte to a marker.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(Marker::Segment),
            0xFB => Some(Marker::Offset),
            0xFC => Some(Marker::Timestamp),
            0xFD => Some(Marker::Version),
            0xFE => Some(Marker::Sequence),
            _ => None,
        }
    }
}

/// Represents an NDN name component.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NameComponent(pub Bytes);

impl NameComponent {
    /// Creates a new name component from a byte slice.
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    /// Creates a `marker || big-endian value` component.
    pub fn from_marker(marker: Marker, value: u64) -> Self {
        let number = tlv::encode_nonneg_integer(value);
        let mut buf = BytesMut::with_capacity(1 + number.len());
        buf.put_u8(marker as u8);
        buf.extend_from_slice(&number);
        Self(buf.freeze())
    }

    /// Creates a component holding a bare non-negative integer.
    pub fn from_number(value: u64) -> Self {
        Self(tlv::encode_nonneg_integer(value))
    }

    /// Returns the component as bytes.
    pub fn as_bytes(&self) -> &Bytes {
        &self.0
    }

    /// Interprets this component as a typed marker and its numeric value.
    ///
    /// Returns `None` when the first byte is not a known marker or the
    /// remainder is not a valid 1/2/4/8 byte number.
    pub fn marker(&self) -> Option<(Marker, u64)> {
        let (&first, rest) = self.0.split_first()?;
        let marker = Marker::from_byte(first)?;
        let value = tlv::decode_nonneg_integer(rest).ok()?;
        Some((marker, value))
    }

    /// Encodes this name component as a TLV element.
    pub fn to_tlv(&self) -> TlvElement {
        TlvElement::new(tlv::TLV_COMPONENT, self.0.clone())
    }

    /// Decodes a name component from a TLV element.
    pub fn from_tlv(element: &TlvElement) -> Result<Self, Error> {
        if element.tlv_type != tlv::TLV_COMPONENT {
            return Err(Error::NdnPacket(format!(
                "Expected name component TLV type {}, got {}",
                tlv::TLV_COMPONENT, element.tlv_type
            )));
        }
        Ok(Self(element.value.clone()))
    }
}

impl From<&str> for NameComponent {
    fn from(s: &str) -> Self {
        Self(Bytes::copy_from_slice(s.as_bytes()))
    }
}

impl fmt::Display for NameComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // NDN URI escaping: unreserved characters verbatim, everything else %XX
        for &b in self.0.iter() {
            if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~') {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "%{:02X}", b)?;
            }
        }
        Ok(())
    }
}

fn unescape_component(s: &str) -> Bytes {
    let raw = s.as_bytes();
    let mut out = BytesMut::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        if raw[i] == b'%' && i + 2 < raw.len() {
            let hex = std::str::from_utf8(&raw[i + 1..i + 3]).ok();
            if let Some(byte) = hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                out.put_u8(byte);
                i += 3;
                continue;
            }
        }
        out.put_u8(raw[i]);
        i += 1;
    }
    out.freeze()
}

/// Represents an NDN name, which is a sequence of name components.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Name {
    components: Vec<NameComponent>,
}

impl Name {
    /// Creates a new empty NDN name.
    pub fn new() -> Self {
        Self {
            components: Vec::new(),
        }
    }

    /// Creates a name from its URI representation (`/a/b%00`), with an
    /// optional `ndn:` scheme.
    pub fn from_string(s: &str) -> Self {
        let path = s.strip_prefix("ndn:").unwrap_or(s);
        let components = path
            .split('/')
            .filter(|comp| !comp.is_empty())
            .map(|comp| NameComponent(unescape_component(comp)))
            .collect();

        Self { components }
    }

    /// Creates a name from its components.
    pub fn from_components(components: Vec<NameComponent>) -> Self {
        Self { components }
    }

    /// Adds a component to the end of the name.
    pub fn push(&mut self, component: impl Into<NameComponent>) -> &mut Self {
        self.components.push(component.into());
        self
    }

    /// Adds a component to the front of the name.
    pub fn prepend(&mut self, component: impl Into<NameComponent>) -> &mut Self {
        self.components.insert(0, component.into());
        self
    }

    /// Appends every component of `suffix`.
    pub fn append(&mut self, suffix: &Name) -> &mut Self {
        self.components.extend(suffix.components.iter().cloned());
        self
    }

    /// Removes and returns the last component.
    pub fn pop(&mut self) -> Option<NameComponent> {
        self.components.pop()
    }

    /// Pushes a typed numeric component.
    pub fn push_marker(&mut self, marker: Marker, value: u64) -> &mut Self {
        self.components.push(NameComponent::from_marker(marker, value));
        self
    }

    /// Returns the number of components in the name.
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Returns true if the name has no components.
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Returns the name components.
    pub fn components(&self) -> &[NameComponent] {
        &self.components
    }

    /// Gets a component at the specified index.
    pub fn get(&self, index: usize) -> Option<&NameComponent> {
        self.components.get(index)
    }

    /// Gets the last component.
    pub fn last(&self) -> Option<&NameComponent> {
        self.components.last()
    }

    /// Returns a prefix of this name with the specified length.
    pub fn prefix(&self, len: usize) -> Self {
        Self {
            components: self.components.iter().take(len).cloned().collect(),
        }
    }

    /// Checks if this name is a prefix of another name.
    pub fn is_prefix_of(&self, other: &Self) -> bool {
        if self.len() > other.len() {
            return false;
        }

        self.components
            .iter()
            .zip(other.components.iter())
            .all(|(a, b)| a == b)
    }

    /// Encodes this name as a TLV element.
    pub fn to_tlv(&self) -> TlvElement {
        TlvElement::nested(
            tlv::TLV_NAME,
            self.components.iter().map(NameComponent::to_tlv).collect(),
        )
    }

    /// Encodes this name to its wire form.
    pub fn encode(&self) -> Result<Bytes, Error> {
        self.to_tlv().to_bytes()
    }

    /// Decodes a name from a TLV element.
    pub fn from_tlv(element: &TlvElement) -> Result<Self, Error> {
        if element.tlv_type != tlv::TLV_NAME {
            return Err(Error::NdnPacket(format!(
                "Expected name TLV type {}, got {}",
                tlv::TLV_NAME, element.tlv_type
            )));
        }

        let components = element
            .children_of()?
            .iter()
            .map(NameComponent::from_tlv)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { components })
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.components.is_empty() {
            return write!(f, "/");
        }

        for component in &self.components {
            write!(f, "/{}", component)?;
        }

        Ok(())
    }
}

impl FromStr for Name {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_string(s))
    }
}

impl From<&str> for Name {
    fn from(s: &str) -> Self {
        Self::from_string(s)
    }
}

impl Default for Name {
    fn default() -> Self {
        Self::new()
    }
}

/* ---------------------------------------------------------------- *
 * Interest
 * ---------------------------------------------------------------- */

/// One entry of an Exclude selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExcludeEntry {
    /// Excludes exactly this component.
    Component(NameComponent),
    /// Excludes the range between its neighbours.
    Any,
}

/// Interest selectors restricting which Data may satisfy the Interest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selectors {
    pub min_suffix_components: Option<u64>,
    pub max_suffix_components: Option<u64>,
    pub exclude: Vec<ExcludeEntry>,
    pub child_selector: Option<u64>,
    pub must_be_fresh: bool,
}

impl Selectors {
    fn to_tlv(&self) -> TlvElement {
        let mut element = TlvElement::nested(tlv::TLV_SELECTORS, Vec::new());
        if let Some(min) = self.min_suffix_components {
            element.push(TlvElement::from_nonneg_integer(tlv::TLV_MIN_SUFFIX_COMPONENTS, min));
        }
        if let Some(max) = self.max_suffix_components {
            element.push(TlvElement::from_nonneg_integer(tlv::TLV_MAX_SUFFIX_COMPONENTS, max));
        }
        if !self.exclude.is_empty() {
            let entries = self
                .exclude
                .iter()
                .map(|entry| match entry {
                    ExcludeEntry::Component(component) => component.to_tlv(),
                    ExcludeEntry::Any => TlvElement::new(tlv::TLV_ANY, Bytes::new()),
                })
                .collect();
            element.push(TlvElement::nested(tlv::TLV_EXCLUDE, entries));
        }
        if let Some(child) = self.child_selector {
            element.push(TlvElement::from_nonneg_integer(tlv::TLV_CHILD_SELECTOR, child));
        }
        if self.must_be_fresh {
            element.push(TlvElement::new(tlv::TLV_MUST_BE_FRESH, Bytes::new()));
        }
        element
    }

    fn from_tlv(element: &TlvElement) -> Result<Self, Error> {
        let mut selectors = Selectors::default();
        for child in element.children_of()? {
            match child.tlv_type {
                tlv::TLV_MIN_SUFFIX_COMPONENTS => {
                    selectors.min_suffix_components = Some(child.as_nonneg_integer()?)
                }
                tlv::TLV_MAX_SUFFIX_COMPONENTS => {
                    selectors.max_suffix_components = Some(child.as_nonneg_integer()?)
                }
                tlv::TLV_EXCLUDE => {
                    for entry in child.children_of()? {
                        selectors.exclude.push(match entry.tlv_type {
                            tlv::TLV_ANY => ExcludeEntry::Any,
                            _ => ExcludeEntry::Component(NameComponent::from_tlv(&entry)?),
                        });
                    }
                }
                tlv::TLV_CHILD_SELECTOR => selectors.child_selector = Some(child.as_nonneg_integer()?),
                tlv::TLV_MUST_BE_FRESH => selectors.must_be_fresh = true,
                _ => {}
            }
        }
        Ok(selectors)
    }
}

/// Represents an NDN Interest packet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interest {
    /// The name requested in the Interest.
    pub name: Name,

    /// Optional selectors.
    pub selectors: Option<Selectors>,

    /// A nonce value to prevent looping.
    pub nonce: Bytes,

    /// Propagation scope.
    pub scope: Option<u64>,

    /// Interest lifetime in milliseconds.
    pub lifetime_ms: u64,
}

impl Interest {
    /// Creates a new Interest packet with a random nonce.
    pub fn new(name: Name) -> Self {
        Self {
            name,
            selectors: None,
            nonce: Bytes::copy_from_slice(&rand::random::<[u8; 4]>()),
            scope: None,
            lifetime_ms: DEFAULT_INTEREST_LIFETIME_MS,
        }
    }

    /// Sets the Interest lifetime.
    pub fn with_lifetime(mut self, lifetime_ms: u64) -> Self {
        self.lifetime_ms = lifetime_ms;
        self
    }

    /// Sets the nonce value.
    pub fn with_nonce(mut self, nonce: impl Into<Bytes>) -> Self {
        self.nonce = nonce.into();
        self
    }

    /// Sets the scope.
    pub fn with_scope(mut self, scope: u64) -> Self {
        self.scope = Some(scope);
        self
    }

    /// Sets the selectors.
    pub fn with_selectors(mut self, selectors: Selectors) -> Self {
        self.selectors = Some(selectors);
        self
    }

    /// Sets the must_be_fresh selector.
    pub fn with_must_be_fresh(mut self, must_be_fresh: bool) -> Self {
        self.selectors.get_or_insert_with(Selectors::default).must_be_fresh = must_be_fresh;
        self
    }

    /// Interest lifetime as a duration.
    pub fn lifetime(&self) -> Duration {
        Duration::from_millis(self.lifetime_ms)
    }

    /// Encodes this Interest as a TLV element.
    pub fn to_tlv(&self) -> TlvElement {
        let mut element = TlvElement::nested(tlv::TLV_INTEREST, vec![self.name.to_tlv()]);
        if let Some(selectors) = &self.selectors {
            element.push(selectors.to_tlv());
        }
        element.push(TlvElement::new(tlv::TLV_NONCE, self.nonce.clone()));
        if let Some(scope) = self.scope {
            element.push(TlvElement::from_nonneg_integer(tlv::TLV_SCOPE, scope));
        }
        element.push(TlvElement::from_nonneg_integer(
            tlv::TLV_INTEREST_LIFETIME,
            self.lifetime_ms,
        ));
        element
    }

    /// Encodes this Interest to its wire form.
    pub fn encode(&self) -> Result<Bytes, Error> {
        self.to_tlv().to_bytes()
    }

    /// Decodes an Interest from its wire form.
    pub fn decode(mut wire: Bytes) -> Result<Self, Error> {
        let element = TlvElement::decode(&mut wire)?;
        Self::from_tlv(&element)
    }

    /// Decodes an Interest from a TLV element.
    pub fn from_tlv(element: &TlvElement) -> Result<Self, Error> {
        element.expect_type(tlv::TLV_INTEREST)?;

        let mut name = None;
        let mut interest = Interest {
            name: Name::new(),
            selectors: None,
            nonce: Bytes::new(),
            scope: None,
            lifetime_ms: DEFAULT_INTEREST_LIFETIME_MS,
        };

        for child in element.children_of()? {
            match child.tlv_type {
                tlv::TLV_NAME => name = Some(Name::from_tlv(&child)?),
                tlv::TLV_SELECTORS => interest.selectors = Some(Selectors::from_tlv(&child)?),
                tlv::TLV_NONCE => interest.nonce = child.value.clone(),
                tlv::TLV_SCOPE => interest.scope = Some(child.as_nonneg_integer()?),
                tlv::TLV_INTEREST_LIFETIME => interest.lifetime_ms = child.as_nonneg_integer()?,
                _ => {}
            }
        }

        interest.name = name.ok_or_else(|| Error::NdnPacket("Interest without Name".into()))?;
        Ok(interest)
    }
}

/* ---------------------------------------------------------------- *
 * Data
 * ---------------------------------------------------------------- */

/// Data packet metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaInfo {
    pub content_type: u64,
    pub freshness_period_ms: u64,
    pub final_block_id: Option<NameComponent>,
}

impl MetaInfo {
    fn to_tlv(&self) -> TlvElement {
        let mut element = TlvElement::nested(
            tlv::TLV_META_INFO,
            vec![TlvElement::from_nonneg_integer(tlv::TLV_CONTENT_TYPE, self.content_type)],
        );
        if self.freshness_period_ms > 0 {
            element.push(TlvElement::from_nonneg_integer(
                tlv::TLV_FRESHNESS_PERIOD,
                self.freshness_period_ms,
            ));
        }
        if let Some(final_block_id) = &self.final_block_id {
            element.push(TlvElement::nested(
                tlv::TLV_FINAL_BLOCK_ID,
                vec![final_block_id.to_tlv()],
            ));
        }
        element
    }

    fn from_tlv(element: &TlvElement) -> Result<Self, Error> {
        let mut meta_info = MetaInfo::default();
        for child in element.children_of()? {
            match child.tlv_type {
                tlv::TLV_CONTENT_TYPE => meta_info.content_type = child.as_nonneg_integer()?,
                tlv::TLV_FRESHNESS_PERIOD => {
                    meta_info.freshness_period_ms = child.as_nonneg_integer()?
                }
                tlv::TLV_FINAL_BLOCK_ID => {
                    let component = child
                        .children_of()?
                        .into_iter()
                        .next()
                        .ok_or_else(|| Error::NdnPacket("Empty FinalBlockId".into()))?;
                    meta_info.final_block_id = Some(NameComponent::from_tlv(&component)?);
                }
                _ => {}
            }
        }
        Ok(meta_info)
    }
}

/// Signature algorithm carried in SignatureInfo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignatureType {
    DigestSha256,
    Sha256WithRsa,
    Sha256WithEcdsa,
    Other(u64),
}

impl SignatureType {
    pub fn code(self) -> u64 {
        match self {
            SignatureType::DigestSha256 => 0,
            SignatureType::Sha256WithRsa => 1,
            SignatureType::Sha256WithEcdsa => 3,
            SignatureType::Other(code) => code,
        }
    }

    pub fn from_code(code: u64) -> Self {
        match code {
            0 => SignatureType::DigestSha256,
            1 => SignatureType::Sha256WithRsa,
            3 => SignatureType::Sha256WithEcdsa,
            other => SignatureType::Other(other),
        }
    }
}

/// Name of the key able to verify a signature.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyLocator {
    pub name: Name,
}

/// Signature metadata of a Data packet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureInfo {
    pub signature_type: SignatureType,
    pub key_locator: Option<KeyLocator>,
}

impl Default for SignatureInfo {
    fn default() -> Self {
        Self {
            signature_type: SignatureType::DigestSha256,
            key_locator: None,
        }
    }
}

impl SignatureInfo {
    pub fn to_tlv(&self) -> TlvElement {
        let mut element = TlvElement::nested(
            tlv::TLV_SIGNATURE_INFO,
            vec![TlvElement::from_nonneg_integer(
                tlv::TLV_SIGNATURE_TYPE,
                self.signature_type.code(),
            )],
        );
        if let Some(locator) = &self.key_locator {
            element.push(TlvElement::nested(tlv::TLV_KEY_LOCATOR, vec![locator.name.to_tlv()]));
        }
        element
    }

    pub fn from_tlv(element: &TlvElement) -> Result<Self, Error> {
        element.expect_type(tlv::TLV_SIGNATURE_INFO)?;
        let mut signature_type = None;
        let mut key_locator = None;
        for child in element.children_of()? {
            match child.tlv_type {
                tlv::TLV_SIGNATURE_TYPE => {
                    signature_type = Some(SignatureType::from_code(child.as_nonneg_integer()?))
                }
                tlv::TLV_KEY_LOCATOR => {
                    // Only the Name form of KeyLocator is understood; digests are skipped.
                    if let Some(name) = child
                        .children_of()?
                        .iter()
                        .find(|c| c.tlv_type == tlv::TLV_NAME)
                    {
                        key_locator = Some(KeyLocator {
                            name: Name::from_tlv(name)?,
                        });
                    }
                }
                _ => {}
            }
        }
        Ok(Self {
            signature_type: signature_type
                .ok_or_else(|| Error::NdnPacket("SignatureInfo without SignatureType".into()))?,
            key_locator,
        })
    }
}

/// Represents an NDN Data packet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Data {
    /// The name of the Data packet.
    pub name: Name,

    /// Content type, freshness and final block.
    pub meta_info: MetaInfo,

    /// The content of the Data packet.
    pub content: Bytes,

    /// Signature algorithm and key locator.
    pub signature_info: SignatureInfo,

    /// Raw signature bits.
    pub signature_value: Bytes,
}

impl Data {
    /// Creates a new Data packet, signed with a plain SHA-256 digest on encode.
    pub fn new(name: Name, content: impl Into<Bytes>) -> Self {
        Self {
            name,
            meta_info: MetaInfo::default(),
            content: content.into(),
            signature_info: SignatureInfo::default(),
            signature_value: Bytes::new(),
        }
    }

    /// Sets the freshness period.
    pub fn with_freshness(mut self, freshness_period_ms: u64) -> Self {
        self.meta_info.freshness_period_ms = freshness_period_ms;
        self
    }

    /// Sets the final block id.
    pub fn with_final_block_id(mut self, final_block_id: NameComponent) -> Self {
        self.meta_info.final_block_id = Some(final_block_id);
        self
    }

    /// Sets the content type.
    pub fn with_content_type(mut self, content_type: u64) -> Self {
        self.meta_info.content_type = content_type;
        self
    }

    /// Freshness period as a duration.
    pub fn freshness(&self) -> Duration {
        Duration::from_millis(self.meta_info.freshness_period_ms)
    }

    /// Bytes covered by the signature: every top-level field except the
    /// signature fields, in encoded form.
    pub fn signed_portion(&self) -> Result<Bytes, Error> {
        let mut buf = BytesMut::new();
        self.name.to_tlv().encode(&mut buf)?;
        self.meta_info.to_tlv().encode(&mut buf)?;
        TlvElement::new(tlv::TLV_CONTENT, self.content.clone()).encode(&mut buf)?;
        Ok(buf.freeze())
    }

    /// SHA-256 digest of the signed portion.
    pub fn digest(&self) -> Result<[u8; 32], Error> {
        Ok(Sha256::digest(self.signed_portion()?).into())
    }

    /// Checks a DigestSha256 signature.
    pub fn verify_digest(&self) -> Result<(), Error> {
        if self.signature_info.signature_type != SignatureType::DigestSha256 {
            return Err(Error::UnsupportedKeyType);
        }
        if self.digest()?.as_slice() != self.signature_value.as_ref() {
            return Err(Error::VerificationFailed);
        }
        Ok(())
    }

    /// Encodes this Data as a TLV element.
    pub fn to_tlv(&self) -> Result<TlvElement, Error> {
        let signature_value = if self.signature_value.is_empty()
            && self.signature_info.signature_type == SignatureType::DigestSha256
        {
            Bytes::copy_from_slice(&self.digest()?)
        } else {
            self.signature_value.clone()
        };

        Ok(TlvElement::nested(
            tlv::TLV_DATA,
            vec![
                self.name.to_tlv(),
                self.meta_info.to_tlv(),
                TlvElement::new(tlv::TLV_CONTENT, self.content.clone()),
                self.signature_info.to_tlv(),
                TlvElement::new(tlv::TLV_SIGNATURE_VALUE, signature_value),
            ],
        ))
    }

    /// Encodes this Data to its wire form.
    pub fn encode(&self) -> Result<Bytes, Error> {
        self.to_tlv()?.to_bytes()
    }

    /// Decodes a Data packet from its wire form.
    pub fn decode(mut wire: Bytes) -> Result<Self, Error> {
        let element = TlvElement::decode(&mut wire)?;
        Self::from_tlv(&element)
    }

    /// Decodes a Data packet from a TLV element.
    pub fn from_tlv(element: &TlvElement) -> Result<Self, Error> {
        element.expect_type(tlv::TLV_DATA)?;

        let mut name = None;
        let mut signature_info = None;
        let mut signature_value = None;
        let mut meta_info = MetaInfo::default();
        let mut content = Bytes::new();

        for child in element.children_of()? {
            match child.tlv_type {
                tlv::TLV_NAME => name = Some(Name::from_tlv(&child)?),
                tlv::TLV_META_INFO => meta_info = MetaInfo::from_tlv(&child)?,
                tlv::TLV_CONTENT => content = child.value.clone(),
                tlv::TLV_SIGNATURE_INFO => signature_info = Some(SignatureInfo::from_tlv(&child)?),
                tlv::TLV_SIGNATURE_VALUE => signature_value = Some(child.value.clone()),
                _ => {}
            }
        }

        Ok(Self {
            name: name.ok_or_else(|| Error::NdnPacket("Data without Name".into()))?,
            meta_info,
            content,
            signature_info: signature_info
                .ok_or_else(|| Error::NdnPacket("Data without SignatureInfo".into()))?,
            signature_value: signature_value
                .ok_or_else(|| Error::NdnPacket("Data without SignatureValue".into()))?,
        })
    }
}
