//! Pending Interest Table.
//!
//! One entry per outstanding Name, holding every consumer sink waiting for
//! that Name. The first sink for a Name is the one whose Interest goes on the
//! wire; later sinks join the entry without a re-send.

use crate::table::SyncTable;
use ndn_common::ndn::{Data, Name};
use std::{
    future::Future,
    pin::Pin,
    sync::atomic::{AtomicU64, Ordering},
    task::{Context, Poll},
    time::{Duration, Instant},
};
use tokio::sync::oneshot;

/// Identifies one sink inside a PIT entry.
pub type SinkId = u64;

#[derive(Debug)]
struct PitEntry {
    sinks: Vec<(SinkId, oneshot::Sender<Data>)>,
    created: Instant,
}

/// Result of adding a sink to the table.
#[derive(Debug)]
pub struct Registration {
    pub sink: SinkId,
    pub pending: PendingData,
    /// True when this call created the entry and must send the Interest.
    pub is_new: bool,
}

/// Outcome of delivering a Data to its entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Satisfied {
    pub sinks: usize,
    pub elapsed: Duration,
}

#[derive(Debug, Default)]
pub struct Pit {
    table: SyncTable<Name, PitEntry>,
    next_sink: AtomicU64,
}

impl Pit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a sink for `name`, creating the entry if there is none.
    pub fn register(&self, name: &Name) -> Registration {
        let sink = self.next_sink.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = oneshot::channel();

        let is_new = self.table.update_with(name.clone(), |current| {
            let is_new = current.is_none();
            let mut entry = current.unwrap_or_else(|| PitEntry {
                sinks: Vec::new(),
                created: Instant::now(),
            });
            entry.sinks.push((sink, sender));
            (Some(entry), is_new)
        });

        Registration {
            sink,
            pending: PendingData::new(name.clone(), receiver),
            is_new,
        }
    }

    /// Delivers `data` to every sink waiting on its exact name and deletes
    /// the entry.
    pub fn satisfy(&self, data: &Data) -> Option<Satisfied> {
        let entry = self.table.remove(&data.name)?;
        let elapsed = entry.created.elapsed();
        let sinks = entry.sinks.len();
        for (_, sender) in entry.sinks {
            // The consumer may have dropped its PendingData
            let _ = sender.send(data.clone());
        }
        Some(Satisfied { sinks, elapsed })
    }

    /// Drops one sink, closing it, and deletes the entry once it is empty.
    ///
    /// Returns false when the sink was already gone (satisfied or removed).
    pub fn expire(&self, name: &Name, sink: SinkId) -> bool {
        self.table.update_with(name.clone(), |current| {
            let Some(mut entry) = current else {
                return (None, false);
            };
            let before = entry.sinks.len();
            entry.sinks.retain(|(id, _)| *id != sink);
            let removed = entry.sinks.len() != before;
            if entry.sinks.is_empty() {
                (None, removed)
            } else {
                (Some(entry), removed)
            }
        })
    }

    /// Deletes the entry for `name`, closing all of its sinks.
    pub fn remove(&self, name: &Name) -> usize {
        self.table.remove(name).map_or(0, |entry| entry.sinks.len())
    }

    /// Closes every pending sink.
    pub fn close_all(&self) -> usize {
        self.table.drain().iter().map(|entry| entry.sinks.len()).sum()
    }

    pub fn contains(&self, name: &Name) -> bool {
        self.table.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

/// The consumer side of a sent Interest.
///
/// Resolves to the matching Data, or `None` once the sink is closed without
/// data (lifetime elapsed, face closed or write failure). Dropping it is safe.
#[derive(Debug)]
pub struct PendingData {
    name: Name,
    receiver: oneshot::Receiver<Data>,
}

impl PendingData {
    fn new(name: Name, receiver: oneshot::Receiver<Data>) -> Self {
        Self { name, receiver }
    }

    /// A sink already holding `data` and closed.
    pub fn ready(data: Data) -> Self {
        let (sender, receiver) = oneshot::channel();
        let name = data.name.clone();
        let _ = sender.send(data);
        Self::new(name, receiver)
    }

    /// A sink closed without data.
    pub fn closed(name: Name) -> Self {
        let (_, receiver) = oneshot::channel();
        Self::new(name, receiver)
    }

    /// Name the Interest was sent for.
    pub fn name(&self) -> &Name {
        &self.name
    }

    /// Waits for the Data.
    pub async fn recv(self) -> Option<Data> {
        self.await
    }

    /// Returns the Data if it has already arrived.
    pub fn try_recv(&mut self) -> Option<Data> {
        self.receiver.try_recv().ok()
    }
}

impl Future for PendingData {
    type Output = Option<Data>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver).poll(cx).map(Result::ok)
    }
}
