//! Forwarder control packets.
//!
//! Control commands are Interests named
//! `<prefix>/<module>/<command>/<ControlParameters>/<timestamp>/<nonce>`,
//! optionally followed by SignatureInfo and SignatureValue components when a
//! signing key is supplied. The reply is a Data whose content is a
//! ControlResponse.

use crate::error::Error;
use crate::key::Key;
use crate::ndn::{Interest, Name, NameComponent, SignatureInfo, KeyLocator};
use crate::tlv::{self, TlvElement};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::time::{SystemTime, UNIX_EPOCH};

/// Default management prefix of a local forwarder.
pub const LOCAL_FORWARDER_PREFIX: &str = "/localhost/nfd";

/// Status code of a successful command.
pub const STATUS_OK: u64 = 200;

/// Parameters block shared by commands and responses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlParameters {
    pub name: Option<Name>,
    pub face_id: Option<u64>,
    pub uri: Option<String>,
    pub origin: Option<u64>,
    pub cost: Option<u64>,
    pub flags: Option<u64>,
    pub expiration_period_ms: Option<u64>,
}

impl ControlParameters {
    pub fn to_tlv(&self) -> TlvElement {
        let mut element = TlvElement::nested(tlv::TLV_CONTROL_PARAMETERS, Vec::new());
        if let Some(name) = &self.name {
            element.push(name.to_tlv());
        }
        if let Some(face_id) = self.face_id {
            element.push(TlvElement::from_nonneg_integer(tlv::TLV_FACE_ID, face_id));
        }
        if let Some(uri) = &self.uri {
            element.push(TlvElement::new(tlv::TLV_URI, Bytes::copy_from_slice(uri.as_bytes())));
        }
        if let Some(origin) = self.origin {
            element.push(TlvElement::from_nonneg_integer(tlv::TLV_ORIGIN, origin));
        }
        if let Some(cost) = self.cost {
            element.push(TlvElement::from_nonneg_integer(tlv::TLV_COST, cost));
        }
        if let Some(flags) = self.flags {
            element.push(TlvElement::from_nonneg_integer(tlv::TLV_FLAGS, flags));
        }
        if let Some(expiration) = self.expiration_period_ms {
            element.push(TlvElement::from_nonneg_integer(tlv::TLV_EXPIRATION_PERIOD, expiration));
        }
        element
    }

    pub fn from_tlv(element: &TlvElement) -> Result<Self, Error> {
        element.expect_type(tlv::TLV_CONTROL_PARAMETERS)?;
        let mut parameters = ControlParameters::default();
        for child in element.children_of()? {
            match child.tlv_type {
                tlv::TLV_NAME => parameters.name = Some(Name::from_tlv(&child)?),
                tlv::TLV_FACE_ID => parameters.face_id = Some(child.as_nonneg_integer()?),
                tlv::TLV_URI => {
                    parameters.uri = Some(
                        String::from_utf8(child.value.to_vec())
                            .map_err(|_| Error::NdnPacket("Uri is not UTF-8".into()))?,
                    )
                }
                tlv::TLV_ORIGIN => parameters.origin = Some(child.as_nonneg_integer()?),
                tlv::TLV_COST => parameters.cost = Some(child.as_nonneg_integer()?),
                tlv::TLV_FLAGS => parameters.flags = Some(child.as_nonneg_integer()?),
                tlv::TLV_EXPIRATION_PERIOD => {
                    parameters.expiration_period_ms = Some(child.as_nonneg_integer()?)
                }
                _ => {}
            }
        }
        Ok(parameters)
    }
}

/// A management command addressed to `<module>/<command>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlCommand {
    pub module: String,
    pub command: String,
    pub parameters: ControlParameters,
}

impl ControlCommand {
    pub fn new(module: &str, command: &str, parameters: ControlParameters) -> Self {
        Self {
            module: module.to_string(),
            command: command.to_string(),
            parameters,
        }
    }

    /// `faces/create` for the given face URI.
    pub fn create_face(uri: &str) -> Self {
        Self::new(
            "faces",
            "create",
            ControlParameters {
                uri: Some(uri.to_string()),
                ..Default::default()
            },
        )
    }

    /// `rib/register` for `prefix`; face 0 means the requesting face.
    pub fn register(prefix: &Name, face_id: Option<u64>) -> Self {
        Self::new(
            "rib",
            "register",
            ControlParameters {
                name: Some(prefix.clone()),
                face_id,
                ..Default::default()
            },
        )
    }

    /// `rib/unregister` for `prefix`.
    pub fn unregister(prefix: &Name, face_id: Option<u64>) -> Self {
        Self::new(
            "rib",
            "unregister",
            ControlParameters {
                name: Some(prefix.clone()),
                face_id,
                ..Default::default()
            },
        )
    }

    /// Builds the command Interest name under `prefix`, signing it with `key`
    /// when one is given.
    pub fn to_name(&self, prefix: &Name, key: Option<&Key>) -> Result<Name, Error> {
        let mut name = prefix.clone();
        name.push(self.module.as_str()).push(self.command.as_str());
        name.push(NameComponent::new(self.parameters.to_tlv().to_bytes()?));

        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();
        name.push(NameComponent::from_number(timestamp));
        name.push(NameComponent::from_number(rand::random::<u64>()));

        if let Some(key) = key {
            let info = SignatureInfo {
                signature_type: key.signature_type(),
                key_locator: Some(KeyLocator {
                    name: key.locator_name(),
                }),
            };
            name.push(NameComponent::new(info.to_tlv().to_bytes()?));
            let digest = signed_command_digest(&name)?;
            let value = TlvElement::new(tlv::TLV_SIGNATURE_VALUE, key.sign(&digest)?);
            name.push(NameComponent::new(value.to_bytes()?));
        }
        Ok(name)
    }

    /// Builds the command Interest.
    pub fn to_interest(&self, prefix: &Name, key: Option<&Key>, lifetime_ms: u64) -> Result<Interest, Error> {
        Ok(Interest::new(self.to_name(prefix, key)?).with_lifetime(lifetime_ms))
    }
}

/// Digest over the encoded components of a signed command, excluding the
/// trailing SignatureValue component.
fn signed_command_digest(name: &Name) -> Result<[u8; 32], Error> {
    let mut hasher = Sha256::new();
    for component in name.components() {
        hasher.update(component.to_tlv().to_bytes()?);
    }
    Ok(hasher.finalize().into())
}

/// Checks the signature of a signed command Interest name.
pub fn verify_command(name: &Name, key: &Key) -> Result<(), Error> {
    let mut unsigned = name.clone();
    let value = unsigned
        .pop()
        .ok_or_else(|| Error::NdnPacket("Empty command name".into()))?;
    let mut raw = value.as_bytes().clone();
    let element = TlvElement::decode(&mut raw)?;
    element.expect_type(tlv::TLV_SIGNATURE_VALUE)?;
    key.verify(&signed_command_digest(&unsigned)?, &element.value)
}

/// Reply to a control command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlResponse {
    pub status_code: u64,
    pub status_text: String,
    pub parameters: Option<ControlParameters>,
}

impl ControlResponse {
    pub fn new(status_code: u64, status_text: &str) -> Self {
        Self {
            status_code,
            status_text: status_text.to_string(),
            parameters: None,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status_code == STATUS_OK
    }

    pub fn encode(&self) -> Result<Bytes, Error> {
        let mut element = TlvElement::nested(
            tlv::TLV_CONTROL_RESPONSE,
            vec![
                TlvElement::from_nonneg_integer(tlv::TLV_STATUS_CODE, self.status_code),
                TlvElement::new(
                    tlv::TLV_STATUS_TEXT,
                    Bytes::copy_from_slice(self.status_text.as_bytes()),
                ),
            ],
        );
        if let Some(parameters) = &self.parameters {
            element.push(parameters.to_tlv());
        }
        element.to_bytes()
    }

    pub fn decode(mut content: Bytes) -> Result<Self, Error> {
        let element = TlvElement::decode(&mut content)?;
        element.expect_type(tlv::TLV_CONTROL_RESPONSE)?;

        let mut status_code = None;
        let mut status_text = String::new();
        let mut parameters = None;
        for child in element.children_of()? {
            match child.tlv_type {
                tlv::TLV_STATUS_CODE => status_code = Some(child.as_nonneg_integer()?),
                tlv::TLV_STATUS_TEXT => {
                    status_text = String::from_utf8_lossy(&child.value).into_owned()
                }
                tlv::TLV_CONTROL_PARAMETERS => {
                    parameters = Some(ControlParameters::from_tlv(&child)?)
                }
                _ => {}
            }
        }

        Ok(Self {
            status_code: status_code
                .ok_or_else(|| Error::NdnPacket("ControlResponse without StatusCode".into()))?,
            status_text,
            parameters,
        })
    }
}
