//! Face engine tests against an in-memory forwarder.

use super::*;
use futures::{future::join_all, StreamExt};
use ndn_common::{
    control::{verify_command, ControlParameters},
    key::{decode_certificate, encode_certificate},
    ndn::{Marker, NameComponent},
    tlv::TlvElement,
};
use tokio::{
    io::{duplex, split, DuplexStream, ReadHalf, WriteHalf},
    time::{sleep, timeout},
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// The far end of a face's transport.
struct Forwarder {
    reader: BufReader<ReadHalf<DuplexStream>>,
    writer: WriteHalf<DuplexStream>,
}

impl Forwarder {
    async fn next_packet(&mut self) -> Option<NdnPacket> {
        read_frame(&mut self.reader)
            .await
            .unwrap()
            .map(|frame| NdnPacket::from_bytes(frame).unwrap())
    }

    async fn next_interest(&mut self) -> Interest {
        match timeout(Duration::from_secs(2), self.next_packet()).await {
            Ok(Some(NdnPacket::Interest(interest))) => interest,
            other => panic!("expected an Interest, got {:?}", other),
        }
    }

    /// True when nothing arrives within `wait`.
    async fn is_silent(&mut self, wait: Duration) -> bool {
        timeout(wait, self.next_packet()).await.is_err()
    }

    async fn send(&mut self, data: &Data) {
        self.send_raw(&data.encode().unwrap()).await;
    }

    async fn send_raw(&mut self, wire: &[u8]) {
        write_frame(&mut self.writer, wire).await.unwrap();
    }
}

fn open_face_on(
    cs: Arc<ContentStore>,
    options: FaceOptions,
    inbound: Option<mpsc::Sender<Interest>>,
) -> (Face, Forwarder) {
    init_logging();
    let (local, remote) = duplex(64 * 1024);
    let face = Face::open_with_content_store(local, options, cs, inbound);
    let (reader, writer) = split(remote);
    (
        face,
        Forwarder {
            reader: BufReader::new(reader),
            writer,
        },
    )
}

fn open_face_with(options: FaceOptions, inbound: Option<mpsc::Sender<Interest>>) -> (Face, Forwarder) {
    open_face_on(ContentStore::new(), options, inbound)
}

fn open_face() -> (Face, Forwarder) {
    open_face_with(FaceOptions::default(), None)
}

fn segment_name(prefix: &str, segment: u64) -> Name {
    let mut name = Name::from_string(prefix);
    name.push_marker(Marker::Segment, segment);
    name
}

fn respond(interest: &Interest, response: &ControlResponse) -> Data {
    Data::new(interest.name.clone(), response.encode().unwrap())
}

#[tokio::test]
async fn test_concurrent_interests_collapse() {
    let (face, mut forwarder) = open_face();
    let name = Name::from_string("/collapse/me");

    let pending = join_all((0..5).map(|_| face.send_interest(Interest::new(name.clone())))).await;
    let pending: Vec<PendingData> = pending.into_iter().map(Result::unwrap).collect();

    let interest = forwarder.next_interest().await;
    assert_eq!(interest.name, name);
    forwarder.send(&Data::new(name.clone(), &b"shared"[..])).await;

    for data in join_all(pending).await {
        assert_eq!(data.unwrap().content.as_ref(), b"shared");
    }
    assert!(forwarder.is_silent(Duration::from_millis(100)).await);

    let metrics = face.metrics();
    assert_eq!(metrics.interests_sent.value(), 1);
    assert_eq!(metrics.interests_collapsed.value(), 4);
    assert_eq!(metrics.interests_satisfied.value(), 5);
    assert_eq!(face.pending_interests(), 0);
}

#[tokio::test]
async fn test_content_store_serves_until_fresh_period_ends() {
    let (face, mut forwarder) = open_face();
    let name = Name::from_string("/cache/item");

    let pending = face.send_interest(Interest::new(name.clone())).await.unwrap();
    forwarder.next_interest().await;
    forwarder
        .send(&Data::new(name.clone(), &b"fresh"[..]).with_freshness(500))
        .await;
    assert!(pending.await.is_some());

    // Answered from the Content Store without a wire Interest
    let mut cached = face.send_interest(Interest::new(name.clone())).await.unwrap();
    assert_eq!(cached.try_recv().unwrap().content.as_ref(), b"fresh");
    assert!(forwarder.is_silent(Duration::from_millis(50)).await);
    assert_eq!(face.metrics().cs_hits.value(), 1);

    sleep(Duration::from_millis(700)).await;
    assert!(face.content_store().get(&name).is_none());

    let pending = face.send_interest(Interest::new(name.clone())).await.unwrap();
    assert_eq!(forwarder.next_interest().await.name, name);
    forwarder.send(&Data::new(name.clone(), &b"refetched"[..])).await;
    assert_eq!(pending.await.unwrap().content.as_ref(), b"refetched");
}

#[tokio::test]
async fn test_content_store_shared_between_faces() {
    let cs = ContentStore::new();
    let (first, mut first_forwarder) = open_face_on(Arc::clone(&cs), FaceOptions::default(), None);
    let (second, mut second_forwarder) = open_face_on(Arc::clone(&cs), FaceOptions::default(), None);
    let name = Name::from_string("/shared/item");

    let pending = first.send_interest(Interest::new(name.clone())).await.unwrap();
    first_forwarder.next_interest().await;
    first_forwarder
        .send(&Data::new(name.clone(), &b"from first"[..]).with_freshness(5_000))
        .await;
    assert!(pending.await.is_some());

    let mut cached = second.send_interest(Interest::new(name.clone())).await.unwrap();
    assert_eq!(cached.try_recv().unwrap().content.as_ref(), b"from first");
    assert!(second_forwarder.is_silent(Duration::from_millis(100)).await);
    assert_eq!(second.metrics().cs_hits.value(), 1);
    assert_eq!(second.metrics().interests_sent.value(), 0);
    assert_eq!(second.pending_interests(), 0);
}

#[tokio::test]
async fn test_entry_created_after_data_was_cached() {
    let (face, mut forwarder) = open_face();
    let name = Name::from_string("/raced/item");
    let first = face.inner.pit.register(&name);
    let second = face.inner.pit.register(&name);
    assert!(first.is_new);
    assert!(!face.inner.satisfy_from_cache(&name));

    assert!(face
        .content_store()
        .insert(&Data::new(name.clone(), &b"cached"[..]).with_freshness(5_000)));
    assert!(face.inner.satisfy_from_cache(&name));

    assert_eq!(first.pending.await.unwrap().content.as_ref(), b"cached");
    assert_eq!(second.pending.await.unwrap().content.as_ref(), b"cached");
    assert_eq!(face.pending_interests(), 0);
    assert_eq!(face.metrics().cs_hits.value(), 1);
    assert!(forwarder.is_silent(Duration::from_millis(50)).await);
}

#[tokio::test]
async fn test_zero_freshness_is_never_cached() {
    let (face, mut forwarder) = open_face();
    let name = Name::from_string("/a/b");

    for _ in 0..2 {
        let pending = face.send_interest(Interest::new(name.clone())).await.unwrap();
        assert_eq!(forwarder.next_interest().await.name, name);
        forwarder.send(&Data::new(name.clone(), &b"volatile"[..])).await;
        assert!(pending.await.is_some());
        assert!(face.content_store().get(&name).is_none());
    }
    assert_eq!(face.metrics().cs_inserts.value(), 0);
}

#[tokio::test]
async fn test_interest_lifetime_closes_sink() {
    let (face, mut forwarder) = open_face();
    let name = Name::from_string("/slow");

    let pending = face
        .send_interest(Interest::new(name.clone()).with_lifetime(100))
        .await
        .unwrap();
    forwarder.next_interest().await;
    assert!(pending.await.is_none());
    assert_eq!(face.pending_interests(), 0);
    assert_eq!(face.metrics().interests_timed_out.value(), 1);

    let err = face
        .express_interest(Interest::new(name.clone()).with_lifetime(50))
        .await
        .unwrap_err();
    assert!(matches!(err, FaceError::Timeout(n) if n == name));
}

#[tokio::test]
async fn test_late_data_after_expiry_is_unsolicited() {
    let (face, mut forwarder) = open_face();
    let name = Name::from_string("/late");

    let pending = face
        .send_interest(Interest::new(name.clone()).with_lifetime(50))
        .await
        .unwrap();
    forwarder.next_interest().await;
    assert!(pending.await.is_none());

    forwarder.send(&Data::new(name.clone(), &b"too late"[..])).await;
    sleep(Duration::from_millis(50)).await;
    assert_eq!(face.metrics().data_unsolicited.value(), 1);
}

#[tokio::test]
async fn test_segmented_retrieval_stops_at_final_block() {
    let (face, mut forwarder) = open_face();
    let last = 3;

    let server = tokio::spawn(async move {
        for segment in 0..=last {
            let interest = forwarder.next_interest().await;
            assert_eq!(interest.name, segment_name("/video", segment));
            let data = Data::new(interest.name.clone(), format!("segment {}", segment).into_bytes())
                .with_final_block_id(NameComponent::from_marker(Marker::Segment, last));
            forwarder.send(&data).await;
        }
        forwarder
    });

    let segments: Vec<Data> = face
        .fetch(Interest::new(segment_name("/video", 0)))
        .map(Result::unwrap)
        .collect()
        .await;

    assert_eq!(segments.len(), 4);
    for (i, data) in segments.iter().enumerate() {
        assert_eq!(data.name, segment_name("/video", i as u64));
        assert_eq!(data.content, format!("segment {}", i).into_bytes());
    }

    let mut forwarder = server.await.unwrap();
    assert!(forwarder.is_silent(Duration::from_millis(200)).await);
}

#[tokio::test]
async fn test_retrieval_timeout_ends_stream() {
    let (face, mut forwarder) = open_face();

    let server = tokio::spawn(async move {
        let interest = forwarder.next_interest().await;
        forwarder
            .send(&Data::new(interest.name.clone(), &b"first"[..]))
            .await;
        // Second segment is never answered
        forwarder.next_interest().await;
        forwarder
    });

    let mut retrieval = face.fetch(Interest::new(segment_name("/stall", 0)).with_lifetime(100));
    assert!(retrieval.next().await.unwrap().is_ok());
    match retrieval.next().await {
        Some(Err(FaceError::Timeout(name))) => assert_eq!(name, segment_name("/stall", 1)),
        other => panic!("expected a timeout, got {:?}", other),
    }
    assert!(retrieval.next().await.is_none());
    server.await.unwrap();
}

#[tokio::test]
async fn test_register_prefix() {
    let (face, mut forwarder) = open_face();
    let prefix = Name::from_string("/app/service");

    let expected = prefix.clone();
    let server = tokio::spawn(async move {
        let interest = forwarder.next_interest().await;
        assert!(Name::from_string("/localhost/nfd/rib/register").is_prefix_of(&interest.name));

        let mut raw = interest.name.get(4).unwrap().as_bytes().clone();
        let parameters = ControlParameters::from_tlv(&TlvElement::decode(&mut raw).unwrap()).unwrap();
        assert_eq!(parameters.name.as_ref(), Some(&expected));

        let mut response = ControlResponse::new(200, "OK");
        response.parameters = Some(ControlParameters {
            face_id: Some(261),
            ..parameters
        });
        forwarder.send(&respond(&interest, &response)).await;
    });

    let response = face.register(&prefix).await.unwrap();
    assert_eq!(response.parameters.unwrap().face_id, Some(261));
    server.await.unwrap();
}

#[tokio::test]
async fn test_signed_control_command() {
    let (face, mut forwarder) = open_face();
    let key = Key::generate_ecdsa(Name::from_string("/operator"));
    face.set_command_key(key.clone()).await;

    let server = tokio::spawn(async move {
        let interest = forwarder.next_interest().await;
        verify_command(&interest.name, &key).unwrap();
        forwarder
            .send(&respond(&interest, &ControlResponse::new(200, "OK")))
            .await;
    });

    face.unregister(&Name::from_string("/gone")).await.unwrap();
    server.await.unwrap();
}

#[tokio::test]
async fn test_control_failure_and_timeout_are_distinct() {
    let options = FaceOptions {
        control_lifetime_ms: 100,
        ..Default::default()
    };
    let (face, mut forwarder) = open_face_with(options, None);

    let server = tokio::spawn(async move {
        let interest = forwarder.next_interest().await;
        forwarder
            .send(&respond(&interest, &ControlResponse::new(403, "Unauthorized")))
            .await;
        // The second command is left unanswered
        forwarder.next_interest().await;
        forwarder
    });

    match face.create_face("tcp://192.0.2.1:6363").await {
        Err(FaceError::CommandFailed { code, text }) => {
            assert_eq!(code, 403);
            assert_eq!(text, "Unauthorized");
        }
        other => panic!("expected CommandFailed, got {:?}", other),
    }

    let err = face.register(&Name::from_string("/unanswered")).await.unwrap_err();
    assert!(matches!(err, FaceError::Timeout(_)));
    server.await.unwrap();
}

#[tokio::test]
async fn test_invalid_control_response() {
    let (face, mut forwarder) = open_face();

    let server = tokio::spawn(async move {
        let interest = forwarder.next_interest().await;
        forwarder
            .send(&Data::new(interest.name.clone(), &b"not a response"[..]))
            .await;
    });

    let err = face.register(&Name::from_string("/x")).await.unwrap_err();
    assert!(matches!(err, FaceError::InvalidControlResponse(_)));
    server.await.unwrap();
}

#[tokio::test]
async fn test_inbound_interest_and_put_data() {
    let (sender, mut inbound) = mpsc::channel(4);
    let (face, mut forwarder) = open_face_with(FaceOptions::default(), Some(sender));

    let request = Interest::new(Name::from_string("/producer/item"));
    forwarder.send_raw(&request.encode().unwrap()).await;

    let received = timeout(Duration::from_secs(1), inbound.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(received, request);
    assert_eq!(face.metrics().interests_received.value(), 1);

    face.put_data(&Data::new(received.name.clone(), &b"produced"[..]))
        .await
        .unwrap();
    match forwarder.next_packet().await {
        Some(NdnPacket::Data(data)) => {
            assert_eq!(data.content.as_ref(), b"produced");
            data.verify_digest().unwrap();
        }
        other => panic!("expected Data, got {:?}", other),
    }
}

#[tokio::test]
async fn test_undecodable_packet_stops_read_loop() {
    let (sender, mut inbound) = mpsc::channel(4);
    let (face, mut forwarder) = open_face_with(FaceOptions::default(), Some(sender));

    let pending = face
        .send_interest(Interest::new(Name::from_string("/waiting")))
        .await
        .unwrap();
    forwarder.next_interest().await;

    forwarder.send_raw(&[0x64, 0x01, 0x00]).await;

    assert!(timeout(Duration::from_secs(1), pending).await.unwrap().is_none());
    assert!(timeout(Duration::from_secs(1), inbound.recv()).await.unwrap().is_none());

    // The write side stays usable
    let raw = Interest::new(Name::from_string("/still/writable"));
    face.put_interest(&raw).await.unwrap();
    assert_eq!(forwarder.next_interest().await.name, raw.name);
}

#[tokio::test]
async fn test_oversized_length_stops_read_loop() {
    let (face, mut forwarder) = open_face();
    let pending = face
        .send_interest(Interest::new(Name::from_string("/waiting/long")).with_lifetime(10_000))
        .await
        .unwrap();
    forwarder.next_interest().await;

    let mut wire = vec![0x06, 0xFF];
    wire.extend_from_slice(&u64::MAX.to_be_bytes());
    forwarder.send_raw(&wire).await;

    // Closed by the read loop, well before the Interest lifetime
    assert!(timeout(Duration::from_secs(1), pending).await.unwrap().is_none());
    assert_eq!(face.pending_interests(), 0);
}

#[tokio::test]
async fn test_close() {
    let (face, mut forwarder) = open_face();
    let pending = face
        .send_interest(Interest::new(Name::from_string("/pending")))
        .await
        .unwrap();
    forwarder.next_interest().await;

    face.close().await;
    face.close().await;
    assert!(face.is_closed());
    assert!(pending.await.is_none());
    assert!(forwarder.next_packet().await.is_none());

    let err = face
        .send_interest(Interest::new(Name::from_string("/after")))
        .await
        .unwrap_err();
    assert!(matches!(err, FaceError::Closed));
    assert!(matches!(
        face.put_data(&Data::new(Name::from_string("/after"), &b""[..])).await,
        Err(FaceError::Closed)
    ));
}

#[tokio::test]
async fn test_verify_fetches_certificate() {
    let (face, mut forwarder) = open_face();
    let key = Key::generate_ecdsa(Name::from_string("/producer"));
    let certificate = decode_certificate(&encode_certificate(&key).unwrap()).unwrap();

    let mut data = Data::new(Name::from_string("/producer/doc"), &b"signed"[..]);
    key.sign_data(&mut data).unwrap();
    let mut tampered = data.clone();
    tampered.content = bytes::Bytes::from_static(b"forged");

    let locator = key.locator_name();
    let server = tokio::spawn(async move {
        for _ in 0..2 {
            let interest = forwarder.next_interest().await;
            assert_eq!(interest.name, locator);
            forwarder.send(&certificate).await;
        }
    });

    face.verify(&data).await.unwrap();
    assert!(matches!(
        face.verify(&tampered).await,
        Err(FaceError::Packet(ndn_common::Error::VerificationFailed))
    ));
    server.await.unwrap();

    // Digest signatures need no network
    let digest_signed = Data::decode(Data::new(Name::from_string("/d"), &b"x"[..]).encode().unwrap()).unwrap();
    face.verify(&digest_signed).await.unwrap();
}
