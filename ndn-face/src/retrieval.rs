//! Automatic continuation of segmented and sequenced content.
//!
//! After each Data the last name component decides what comes next: the
//! FinalBlockId ends the retrieval, Segment and Sequence components advance
//! by one, Offset components advance by the content length. A component
//! without a marker ends a single-object fetch.

use futures::Stream;
use log::{debug, trace};
use ndn_common::ndn::{Data, Interest, Marker, Name};
use std::{
    pin::Pin,
    task::{Context, Poll},
};
use tokio::sync::mpsc;

use crate::{
    error::{FaceError, Result},
    Face,
};

/// Buffered Data not yet taken by the consumer.
const RETRIEVAL_BUFFER: usize = 16;

/// Stream of the Data of one retrieval, ending after the last one or after
/// the first error.
#[derive(Debug)]
pub struct Retrieval {
    receiver: mpsc::Receiver<Result<Data>>,
}

impl Stream for Retrieval {
    type Item = Result<Data>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

/// Name of the Interest following `data`, or `None` when the retrieval is
/// complete.
pub fn next_name(data: &Data) -> Result<Option<Name>> {
    let mut name = data.name.clone();
    let Some(last) = name.pop() else {
        return Ok(None);
    };
    if data.meta_info.final_block_id.as_ref() == Some(&last) {
        return Ok(None);
    }

    let next = match last.marker() {
        Some((marker @ (Marker::Segment | Marker::Sequence), value)) => {
            value.checked_add(1).map(|next| (marker, next))
        }
        Some((Marker::Offset, value)) if !data.content.is_empty() => value
            .checked_add(data.content.len() as u64)
            .map(|next| (Marker::Offset, next)),
        Some((Marker::Offset, _)) => None,
        Some((marker, _)) => {
            return Err(FaceError::UnexpectedMarker {
                name: data.name.clone(),
                marker,
            })
        }
        None => None,
    };

    Ok(next.map(|(marker, value)| {
        name.push_marker(marker, value);
        name
    }))
}

/// Follow-up Interest keeping the template's lifetime, scope and selectors.
fn continuation(template: &Interest, name: Name) -> Interest {
    let mut interest = Interest::new(name).with_lifetime(template.lifetime_ms);
    interest.selectors = template.selectors.clone();
    interest.scope = template.scope;
    interest
}

pub(crate) fn spawn(face: Face, first: Interest) -> Retrieval {
    let (sender, receiver) = mpsc::channel(RETRIEVAL_BUFFER);

    tokio::spawn(async move {
        let mut interest = first.clone();
        loop {
            let data = match face.express_interest(interest.clone()).await {
                Ok(data) => data,
                Err(e) => {
                    debug!("[Face {}] Retrieval of {} stopped: {}", face.id(), interest.name, e);
                    let _ = sender.send(Err(e)).await;
                    return;
                }
            };

            let next = next_name(&data);
            if sender.send(Ok(data)).await.is_err() {
                trace!("[Face {}] Retrieval consumer dropped", face.id());
                return;
            }

            match next {
                Ok(Some(name)) => interest = continuation(&first, name),
                Ok(None) => {
                    trace!("[Face {}] Retrieval of {} complete", face.id(), first.name);
                    return;
                }
                Err(e) => {
                    let _ = sender.send(Err(e)).await;
                    return;
                }
            }
        }
    });

    Retrieval { receiver }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndn_common::ndn::NameComponent;

    fn segment(prefix: &str, marker: Marker, value: u64) -> Name {
        let mut name = Name::from_string(prefix);
        name.push_marker(marker, value);
        name
    }

    #[test]
    fn test_segment_and_sequence_advance_by_one() {
        for marker in [Marker::Segment, Marker::Sequence] {
            let data = Data::new(segment("/video", marker, 7), &b"chunk"[..]);
            assert_eq!(next_name(&data).unwrap(), Some(segment("/video", marker, 8)));
        }
    }

    #[test]
    fn test_offset_advances_by_content_length() {
        let data = Data::new(segment("/file", Marker::Offset, 100), &b"0123456789"[..]);
        assert_eq!(next_name(&data).unwrap(), Some(segment("/file", Marker::Offset, 110)));

        let empty = Data::new(segment("/file", Marker::Offset, 100), &b""[..]);
        assert_eq!(next_name(&empty).unwrap(), None);
    }

    #[test]
    fn test_final_block_stops() {
        let data = Data::new(segment("/video", Marker::Segment, 3), &b"last"[..])
            .with_final_block_id(NameComponent::from_marker(Marker::Segment, 3));
        assert_eq!(next_name(&data).unwrap(), None);
    }

    #[test]
    fn test_unmarked_component_ends() {
        let data = Data::new(Name::from_string("/a/b"), &b"object"[..]);
        assert_eq!(next_name(&data).unwrap(), None);
        assert_eq!(next_name(&Data::new(Name::new(), &b""[..])).unwrap(), None);
    }

    #[test]
    fn test_version_marker_is_unexpected() {
        for marker in [Marker::Version, Marker::Timestamp] {
            let data = Data::new(segment("/doc", marker, 1), &b"v"[..]);
            match next_name(&data) {
                Err(FaceError::UnexpectedMarker { marker: found, .. }) => assert_eq!(found, marker),
                other => panic!("expected UnexpectedMarker, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_continuation_keeps_template() {
        let template = Interest::new(Name::from_string("/t"))
            .with_lifetime(1234)
            .with_scope(2)
            .with_must_be_fresh(true);
        let next = continuation(&template, Name::from_string("/t/next"));
        assert_eq!(next.lifetime_ms, 1234);
        assert_eq!(next.scope, Some(2));
        assert_eq!(next.selectors, template.selectors);
        assert_eq!(next.name, Name::from_string("/t/next"));
    }
}
