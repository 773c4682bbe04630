//! Packet signing keys and self-signed certificates.
//!
//! A [`Key`] binds an identity [`Name`] to RSA or ECDSA (P-256) key material.
//! Private keys sign packet digests; public-only keys (rebuilt from a
//! certificate) can only verify.

use crate::error::Error;
use crate::ndn::{Data, KeyLocator, Name, SignatureInfo, SignatureType, CONTENT_TYPE_KEY};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use bytes::Bytes;
use der::asn1::{ObjectIdentifier, UtcTime};
use der::{DateTime, Decode, Encode, Sequence};
use log::debug;
use pem::{EncodeConfig, LineEnding, Pem};
use p256::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use p256::ecdsa::{Signature, SigningKey, VerifyingKey};
use rsa::pkcs1::{DecodeRsaPrivateKey, EncodeRsaPrivateKey};
use rsa::{Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;
use spki::{DecodePublicKey, EncodePublicKey, SubjectPublicKeyInfoOwned};
use std::time::SystemTime;

const RSA_LABEL: &str = "RSA PRIVATE KEY";
const ECDSA_LABEL: &str = "ECDSA PRIVATE KEY";
const CERTIFICATE_LABEL: &str = "NDN CERTIFICATE";
const NAME_HEADER: &str = "NAME";

const OID_RSA_ENCRYPTION: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1");
const OID_EC_PUBLIC_KEY: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.2.1");
const OID_AT_NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.41");

/// Key material, private or public-only.
#[derive(Debug, Clone)]
pub enum KeyMaterial {
    RsaPrivate(RsaPrivateKey),
    EcdsaPrivate(p256::SecretKey),
    RsaPublic(RsaPublicKey),
    EcdsaPublic(p256::PublicKey),
}

/// An identity name together with its key material.
#[derive(Debug, Clone)]
pub struct Key {
    pub name: Name,
    material: KeyMaterial,
}

impl Key {
    /// Wraps an RSA private key.
    pub fn from_rsa(name: Name, key: RsaPrivateKey) -> Self {
        Self {
            name,
            material: KeyMaterial::RsaPrivate(key),
        }
    }

    /// Wraps a P-256 private key.
    pub fn from_ecdsa(name: Name, key: p256::SecretKey) -> Self {
        Self {
            name,
            material: KeyMaterial::EcdsaPrivate(key),
        }
    }

    /// Generates a fresh RSA key of `bits` size.
    pub fn generate_rsa(name: Name, bits: usize) -> Result<Self, Error> {
        let key = RsaPrivateKey::new(&mut rand::thread_rng(), bits)
            .map_err(|e| Error::Key(e.to_string()))?;
        Ok(Self::from_rsa(name, key))
    }

    /// Generates a fresh P-256 key.
    pub fn generate_ecdsa(name: Name) -> Self {
        Self::from_ecdsa(name, p256::SecretKey::random(&mut rand::rngs::OsRng))
    }

    pub fn material(&self) -> &KeyMaterial {
        &self.material
    }

    /// Whether this key holds private material and can sign.
    pub fn is_private(&self) -> bool {
        matches!(
            self.material,
            KeyMaterial::RsaPrivate(_) | KeyMaterial::EcdsaPrivate(_)
        )
    }

    /// Certificate name: identity + `KEY` + `ID-CERT`.
    pub fn locator_name(&self) -> Name {
        let mut name = self.name.clone();
        name.push("KEY").push("ID-CERT");
        name
    }

    /// Signature type produced by this key.
    pub fn signature_type(&self) -> SignatureType {
        match self.material {
            KeyMaterial::RsaPrivate(_) | KeyMaterial::RsaPublic(_) => SignatureType::Sha256WithRsa,
            KeyMaterial::EcdsaPrivate(_) | KeyMaterial::EcdsaPublic(_) => {
                SignatureType::Sha256WithEcdsa
            }
        }
    }

    /// Signs a SHA-256 digest.
    ///
    /// RSA uses PKCS#1 v1.5; ECDSA returns the DER `SEQUENCE { r, s }`.
    pub fn sign(&self, digest: &[u8]) -> Result<Vec<u8>, Error> {
        match &self.material {
            KeyMaterial::RsaPrivate(key) => key
                .sign(Pkcs1v15Sign::new::<Sha256>(), digest)
                .map_err(|e| Error::Key(e.to_string())),
            KeyMaterial::EcdsaPrivate(key) => {
                let signing_key = SigningKey::from(key);
                let signature: Signature = signing_key
                    .sign_prehash(digest)
                    .map_err(|e| Error::Key(e.to_string()))?;
                Ok(signature.to_der().as_bytes().to_vec())
            }
            KeyMaterial::RsaPublic(_) | KeyMaterial::EcdsaPublic(_) => {
                Err(Error::UnsupportedKeyType)
            }
        }
    }

    /// Verifies a signature over a SHA-256 digest.
    pub fn verify(&self, digest: &[u8], signature: &[u8]) -> Result<(), Error> {
        match &self.material {
            KeyMaterial::RsaPrivate(key) => verify_rsa(&key.to_public_key(), digest, signature),
            KeyMaterial::RsaPublic(key) => verify_rsa(key, digest, signature),
            KeyMaterial::EcdsaPrivate(key) => verify_ecdsa(&key.public_key(), digest, signature),
            KeyMaterial::EcdsaPublic(key) => verify_ecdsa(key, digest, signature),
        }
    }

    /// Fills the signature fields of `data` with a signature by this key.
    pub fn sign_data(&self, data: &mut Data) -> Result<(), Error> {
        if !self.is_private() {
            return Err(Error::UnsupportedKeyType);
        }
        data.signature_info = SignatureInfo {
            signature_type: self.signature_type(),
            key_locator: Some(KeyLocator {
                name: self.locator_name(),
            }),
        };
        let digest = data.digest()?;
        data.signature_value = Bytes::from(self.sign(&digest)?);
        Ok(())
    }

    /// Checks the signature carried by `data`.
    pub fn verify_data(&self, data: &Data) -> Result<(), Error> {
        self.verify(&data.digest()?, &data.signature_value)
    }

    fn public_key_der(&self) -> Result<Vec<u8>, Error> {
        let document = match &self.material {
            KeyMaterial::RsaPrivate(key) => key.to_public_key().to_public_key_der(),
            KeyMaterial::RsaPublic(key) => key.to_public_key_der(),
            KeyMaterial::EcdsaPrivate(key) => key.public_key().to_public_key_der(),
            KeyMaterial::EcdsaPublic(key) => key.to_public_key_der(),
        }
        .map_err(|e| Error::Key(e.to_string()))?;
        Ok(document.as_bytes().to_vec())
    }
}

fn verify_rsa(key: &RsaPublicKey, digest: &[u8], signature: &[u8]) -> Result<(), Error> {
    key.verify(Pkcs1v15Sign::new::<Sha256>(), digest, signature)
        .map_err(|_| Error::VerificationFailed)
}

fn verify_ecdsa(key: &p256::PublicKey, digest: &[u8], signature: &[u8]) -> Result<(), Error> {
    let signature = Signature::from_der(signature)
        .map_err(|e| Error::Key(format!("malformed ECDSA signature: {}", e)))?;
    VerifyingKey::from(key)
        .verify_prehash(digest, &signature)
        .map_err(|_| Error::VerificationFailed)
}

/* ---------------------------------------------------------------- *
 * Text armor
 * ---------------------------------------------------------------- */

fn write_armor(block: &Pem) -> String {
    pem::encode_config(block, EncodeConfig::new().set_line_ending(LineEnding::LF))
}

/// Serializes a private key and its identity name into an armored text block.
///
/// The name travels as a `NAME:` header; the body is PKCS#1 (RSA) or SEC1
/// (ECDSA) DER.
pub fn encode_private_key(key: &Key) -> Result<String, Error> {
    let (label, der) = match &key.material {
        KeyMaterial::RsaPrivate(rsa) => (
            RSA_LABEL,
            rsa.to_pkcs1_der()
                .map_err(|e| Error::Key(e.to_string()))?
                .as_bytes()
                .to_vec(),
        ),
        KeyMaterial::EcdsaPrivate(ec) => (
            ECDSA_LABEL,
            ec.to_sec1_der()
                .map_err(|e| Error::Key(e.to_string()))?
                .to_vec(),
        ),
        KeyMaterial::RsaPublic(_) | KeyMaterial::EcdsaPublic(_) => {
            return Err(Error::UnsupportedKeyType)
        }
    };
    let mut block = Pem::new(label, der);
    block
        .headers_mut()
        .add(NAME_HEADER, &key.name.to_string())
        .map_err(|e| Error::Key(e.to_string()))?;
    Ok(write_armor(&block))
}

/// Parses a block written by [`encode_private_key`].
pub fn decode_private_key(text: &str) -> Result<Key, Error> {
    let block = pem::parse(text).map_err(|e| Error::Key(e.to_string()))?;
    let name = block
        .headers()
        .get(NAME_HEADER)
        .map(Name::from_string)
        .unwrap_or_default();

    let material = match block.tag() {
        RSA_LABEL => KeyMaterial::RsaPrivate(
            RsaPrivateKey::from_pkcs1_der(block.contents()).map_err(|e| Error::Key(e.to_string()))?,
        ),
        ECDSA_LABEL => KeyMaterial::EcdsaPrivate(
            p256::SecretKey::from_sec1_der(block.contents())
                .map_err(|e| Error::Key(e.to_string()))?,
        ),
        _ => return Err(Error::UnsupportedKeyType),
    };
    debug!("Decoded {} for {}", block.tag(), name);
    Ok(Key { name, material })
}

/* ---------------------------------------------------------------- *
 * Certificates
 * ---------------------------------------------------------------- */

#[derive(Sequence)]
struct Validity {
    not_before: UtcTime,
    not_after: UtcTime,
}

#[derive(Sequence)]
struct AttributeTypeAndValue {
    oid: ObjectIdentifier,
    value: String,
}

#[derive(Sequence)]
struct CertificateBody {
    validity: Validity,
    subject: Vec<AttributeTypeAndValue>,
    subject_public_key_info: SubjectPublicKeyInfoOwned,
}

/// Builds a self-signed certificate Data for `key`, armored as base64 text.
pub fn encode_certificate(key: &Key) -> Result<String, Error> {
    if !key.is_private() {
        return Err(Error::UnsupportedKeyType);
    }

    let spki_der = key.public_key_der()?;
    let body = CertificateBody {
        validity: Validity {
            not_before: UtcTime::from_date_time(DateTime::from_system_time(SystemTime::now())?)?,
            // last instant representable as UTCTime
            not_after: UtcTime::from_date_time(DateTime::new(2049, 12, 31, 23, 59, 59)?)?,
        },
        subject: vec![AttributeTypeAndValue {
            oid: OID_AT_NAME,
            value: key.name.to_string(),
        }],
        subject_public_key_info: SubjectPublicKeyInfoOwned::from_der(&spki_der)?,
    };

    let mut data = Data::new(key.locator_name(), body.to_der()?).with_content_type(CONTENT_TYPE_KEY);
    key.sign_data(&mut data)?;
    let wire = data.encode()?;
    Ok(write_armor(&Pem::new(CERTIFICATE_LABEL, wire.to_vec())))
}

/// Parses certificate text back into its Data packet.
///
/// Bare base64 without BEGIN/END markers is accepted as well.
pub fn decode_certificate(text: &str) -> Result<Data, Error> {
    let wire = if text.trim_start().starts_with("-----BEGIN ") {
        let block = pem::parse(text).map_err(|e| Error::Certificate(e.to_string()))?;
        if block.tag() != CERTIFICATE_LABEL {
            return Err(Error::Certificate(format!("unexpected block {}", block.tag())));
        }
        block.into_contents()
    } else {
        let joined: String = text.split_whitespace().collect();
        BASE64
            .decode(joined.as_bytes())
            .map_err(|e| Error::Certificate(e.to_string()))?
    };
    Data::decode(Bytes::from(wire))
}

/// Rebuilds a public-only key from a certificate's content.
pub fn decode_public_key(content: &[u8]) -> Result<Key, Error> {
    let body = CertificateBody::from_der(content)?;
    let name = body
        .subject
        .iter()
        .find(|attribute| attribute.oid == OID_AT_NAME)
        .map(|attribute| Name::from_string(&attribute.value))
        .unwrap_or_default();

    let spki = body.subject_public_key_info;
    let spki_der = spki.to_der()?;
    let material = if spki.algorithm.oid == OID_RSA_ENCRYPTION {
        KeyMaterial::RsaPublic(
            RsaPublicKey::from_public_key_der(&spki_der).map_err(|e| Error::Key(e.to_string()))?,
        )
    } else if spki.algorithm.oid == OID_EC_PUBLIC_KEY {
        KeyMaterial::EcdsaPublic(
            p256::PublicKey::from_public_key_der(&spki_der)
                .map_err(|e| Error::Key(e.to_string()))?,
        )
    } else {
        return Err(Error::UnsupportedKeyType);
    };

    Ok(Key { name, material })
}
