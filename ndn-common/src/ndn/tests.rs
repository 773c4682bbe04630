//! Unit tests for the NDN packet implementation

use super::*;
use bytes::{Bytes, BytesMut};

const INTEREST_WIRE: &[u8] = &[
    0x05, 0x2b, 0x07, 0x11, 0x08, 0x08, 0x66, 0x61, 0x63, 0x65, 0x62, 0x6f, 0x6f, 0x6b, 0x08,
    0x05, 0x75, 0x73, 0x65, 0x72, 0x73, 0x09, 0x0b, 0x0d, 0x01, 0x03, 0x0e, 0x01, 0x05, 0x11,
    0x01, 0x04, 0x12, 0x00, 0x0a, 0x03, 0x01, 0x02, 0x03, 0x0b, 0x01, 0x08, 0x0c, 0x01, 0x09,
];

const DATA_WIRE: &[u8] = &[
    0x06, 0x4f, 0x07, 0x10, 0x08, 0x06, 0x67, 0x6f, 0x6f, 0x67, 0x6c, 0x65, 0x08, 0x06, 0x73,
    0x65, 0x61, 0x72, 0x63, 0x68, 0x14, 0x0f, 0x18, 0x01, 0x02, 0x19, 0x01, 0x03, 0x1a, 0x07,
    0x08, 0x05, 0x68, 0x65, 0x6c, 0x6c, 0x6f, 0x15, 0x03, 0x01, 0x02, 0x03, 0x16, 0x03, 0x1b,
    0x01, 0x00, 0x17, 0x20, 0x29, 0x05, 0xa7, 0x90, 0x15, 0xfb, 0xd7, 0xe5, 0x66, 0xa1, 0x52,
    0x11, 0xf0, 0x2c, 0xbb, 0x4d, 0xb8, 0xc0, 0x8a, 0x9e, 0x05, 0xca, 0x47, 0x82, 0xee, 0x3b,
    0x2a, 0xbf, 0x20, 0xc0, 0x73, 0xdc,
];

#[test]
fn test_name_creation() {
    let name = Name::from_string("/test/data/1");

    assert_eq!(name.len(), 3);
    assert_eq!(name.components()[0].as_bytes().as_ref(), b"test");
    assert_eq!(name.components()[1].as_bytes().as_ref(), b"data");
    assert_eq!(name.components()[2].as_bytes().as_ref(), b"1");

    assert_eq!(name.to_string(), "/test/data/1");
    assert_eq!(Name::new().to_string(), "/");
    assert_eq!(Name::from_string("ndn:/a//b/"), Name::from_string("/a/b"));
}

#[test]
fn test_name_escaping() {
    let mut name = Name::from_string("/video");
    name.push_marker(Marker::Segment, 5);
    assert_eq!(name.to_string(), "/video/%00%05");
    assert_eq!(Name::from_string(&name.to_string()), name);

    let odd = Name::from_string("/a%2Fb/%zz");
    assert_eq!(odd.components()[0].as_bytes().as_ref(), b"a/b");
    assert_eq!(odd.components()[1].as_bytes().as_ref(), b"%zz");
}

#[test]
fn test_name_compare() {
    let name1 = Name::from_string("/a/b/c");
    let name2 = Name::from_string("/a/b/c");
    let name3 = Name::from_string("/a/b/d");
    let name4 = Name::from_string("/a/b");

    assert_eq!(name1, name2);
    assert_ne!(name1, name3);
    assert_ne!(name1, name4);

    assert!(name4.is_prefix_of(&name1));
    assert!(name1.is_prefix_of(&name1));
    assert!(!name1.is_prefix_of(&name4));
    assert!(!name3.is_prefix_of(&name1));
    assert!(Name::new().is_prefix_of(&name1));
}

#[test]
fn test_name_pop_push() {
    let mut name = Name::from_string("/b");
    name.prepend("a").push("c");
    assert_eq!(name.to_string(), "/a/b/c");

    let last = name.pop().unwrap();
    assert_eq!(last, NameComponent::from("c"));
    assert_eq!(name.to_string(), "/a/b");

    name.push_marker(Marker::Sequence, 300);
    let (marker, value) = name.last().unwrap().marker().unwrap();
    assert_eq!(marker, Marker::Sequence);
    assert_eq!(value, 300);
    assert_eq!(name.last().unwrap().as_bytes().as_ref(), &[0xFE, 0x01, 0x2C]);
}

#[test]
fn test_component_marker_rejects_plain_bytes() {
    assert_eq!(NameComponent::from("hello").marker(), None);
    // Known marker byte but an invalid number width
    assert_eq!(NameComponent::new(vec![0x00, 1, 2, 3]).marker(), None);
    assert_eq!(NameComponent::new(Vec::<u8>::new()).marker(), None);
    assert_eq!(
        NameComponent::from_marker(Marker::Offset, 1 << 40).marker(),
        Some((Marker::Offset, 1 << 40))
    );
}

#[test]
fn test_name_tlv() {
    let name = Name::from_string("/google/search");
    let wire = name.encode().unwrap();
    assert_eq!(&wire[..], &DATA_WIRE[2..20]);

    let element = crate::tlv::TlvElement::decode(&mut wire.clone()).unwrap();
    assert_eq!(Name::from_tlv(&element).unwrap(), name);
}

#[test]
fn test_interest_packet() {
    let interest = Interest::new(Name::from_string("/facebook/users"))
        .with_selectors(Selectors {
            min_suffix_components: Some(3),
            max_suffix_components: Some(5),
            child_selector: Some(4),
            must_be_fresh: true,
            ..Default::default()
        })
        .with_scope(8)
        .with_lifetime(9)
        .with_nonce(Bytes::from_static(&[1, 2, 3]));

    let wire = interest.encode().unwrap();
    assert_eq!(&wire[..], INTEREST_WIRE);

    let parsed = Interest::decode(wire).unwrap();
    assert_eq!(parsed, interest);
    assert_eq!(parsed.lifetime(), Duration::from_millis(9));
}

#[test]
fn test_interest_defaults() {
    let a = Interest::new(Name::from_string("/a"));
    assert_eq!(a.nonce.len(), 4);
    assert_eq!(a.lifetime_ms, DEFAULT_INTEREST_LIFETIME_MS);
    assert!(a.selectors.is_none());

    let parsed = Interest::decode(a.encode().unwrap()).unwrap();
    assert_eq!(parsed, a);
}

#[test]
fn test_interest_exclude() {
    let interest = Interest::new(Name::from_string("/x")).with_selectors(Selectors {
        exclude: vec![ExcludeEntry::Any, ExcludeEntry::Component("m".into())],
        ..Default::default()
    });
    let parsed = Interest::decode(interest.encode().unwrap()).unwrap();
    assert_eq!(parsed.selectors, interest.selectors);
}

#[test]
fn test_interest_without_name() {
    let wire = Bytes::from_static(&[0x05, 0x03, 0x0a, 0x01, 0x01]);
    assert!(matches!(Interest::decode(wire), Err(Error::NdnPacket(_))));
}

#[test]
fn test_data_reference_vector() {
    let data = Data::decode(Bytes::from_static(DATA_WIRE)).unwrap();

    assert_eq!(data.name, Name::from_string("/google/search"));
    assert_eq!(data.meta_info.content_type, CONTENT_TYPE_KEY);
    assert_eq!(data.meta_info.freshness_period_ms, 3);
    assert_eq!(data.meta_info.final_block_id, Some(NameComponent::from("hello")));
    assert_eq!(data.content.as_ref(), &[1, 2, 3]);
    assert_eq!(data.signature_info.signature_type, SignatureType::DigestSha256);
    assert_eq!(data.signature_value.len(), 32);

    assert_eq!(&data.encode().unwrap()[..], DATA_WIRE);
}

#[test]
fn test_data_packet() {
    let name = Name::from_string("/test/data");
    let content = Bytes::from_static(b"Hello, NDN!");
    let data = Data::new(name.clone(), content.clone())
        .with_freshness(10000)
        .with_final_block_id(NameComponent::from_marker(Marker::Segment, 0));

    let wire = data.encode().unwrap();
    let parsed = Data::decode(wire).unwrap();

    assert_eq!(parsed.name, name);
    assert_eq!(parsed.content, content);
    assert_eq!(parsed.meta_info, data.meta_info);
    assert_eq!(parsed.freshness(), Duration::from_secs(10));
    assert_eq!(parsed.signature_info.signature_type, SignatureType::DigestSha256);
    parsed.verify_digest().unwrap();
}

#[test]
fn test_data_digest_detects_tampering() {
    let data = Data::new(Name::from_string("/a/b"), &b"payload"[..]);
    let mut parsed = Data::decode(data.encode().unwrap()).unwrap();
    parsed.content = Bytes::from_static(b"payloaD");
    assert!(matches!(parsed.verify_digest(), Err(Error::VerificationFailed)));
}

#[test]
fn test_data_tolerates_unknown_types() {
    let data = Data::new(Name::from_string("/a"), &b"x"[..]);
    let mut element = data.to_tlv().unwrap();
    element.push(crate::tlv::TlvElement::new(0xF0, &b"future"[..]));
    let mut buf = BytesMut::new();
    element.encode(&mut buf).unwrap();

    let parsed = Data::decode(buf.freeze()).unwrap();
    assert_eq!(parsed.content.as_ref(), b"x");
}

#[test]
fn test_data_missing_signature() {
    // Data holding only a Name
    let wire = Bytes::from_static(&[0x06, 0x05, 0x07, 0x03, 0x08, 0x01, b'a']);
    assert!(matches!(Data::decode(wire), Err(Error::NdnPacket(_))));
}

#[test]
fn test_truncated_packet() {
    let wire = Bytes::copy_from_slice(&DATA_WIRE[..40]);
    assert!(matches!(Data::decode(wire), Err(Error::Tlv(_))));
}
