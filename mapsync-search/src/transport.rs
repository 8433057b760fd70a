use std::collections::VecDeque;
use std::sync::mpsc;

use crate::error::SearchError;
use crate::request::{SearchRequest, SearchResponse};
use crate::worker::{spawn_search_worker, QueryExecutor};

/// The asynchronous boundary to a search backend.
///
/// `dispatch` must not block on the round trip. Responses are collected with
/// `try_recv` from the event loop, in whatever order they arrive.
pub trait SearchTransport {
    fn dispatch(&mut self, request: SearchRequest) -> crate::Result<()>;

    fn try_recv(&mut self) -> Option<SearchResponse>;
}

/// Transport backed by a pair of channels, usually to a search worker thread.
pub struct ChannelTransport {
    tx: mpsc::Sender<SearchRequest>,
    rx: mpsc::Receiver<SearchResponse>,
}

impl ChannelTransport {
    pub fn new(tx: mpsc::Sender<SearchRequest>, rx: mpsc::Receiver<SearchResponse>) -> Self {
        Self { tx, rx }
    }

    /// Start a worker thread running `executor` and connect to it.
    pub fn spawn<E>(executor: E) -> Self
    where
        E: QueryExecutor + Send + 'static,
    {
        let (tx, rx) = spawn_search_worker(executor);
        Self::new(tx, rx)
    }
}

impl SearchTransport for ChannelTransport {
    fn dispatch(&mut self, request: SearchRequest) -> crate::Result<()> {
        self.tx
            .send(request)
            .map_err(|_| SearchError::TransportClosed)
    }

    fn try_recv(&mut self) -> Option<SearchResponse> {
        self.rx.try_recv().ok()
    }
}

/// Transport that runs the executor on the calling thread.
///
/// Responses are queued and handed out by `try_recv`, so the event loop
/// still sees them one tick later.
pub struct InlineTransport<E> {
    executor: E,
    inbox: VecDeque<SearchResponse>,
}

impl<E: QueryExecutor> InlineTransport<E> {
    pub fn new(executor: E) -> Self {
        Self {
            executor,
            inbox: VecDeque::new(),
        }
    }

    pub fn pending_responses(&self) -> usize {
        self.inbox.len()
    }
}

impl<E: QueryExecutor> SearchTransport for InlineTransport<E> {
    fn dispatch(&mut self, request: SearchRequest) -> crate::Result<()> {
        let entities = self.executor.execute(&request);
        self.inbox.push_back(request.respond(entities));
        Ok(())
    }

    fn try_recv(&mut self) -> Option<SearchResponse> {
        self.inbox.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use mapsync_core::{BoundingBox, LngLat};

    use super::*;
    use crate::index::InMemoryIndex;

    #[test]
    fn inline_transport_queues_responses_in_order() {
        let index = InMemoryIndex::demo_grid(LngLat::new(0.0, 0.0), 2, 2, 0.1);
        let mut t = InlineTransport::new(index);
        let bounds = BoundingBox::around(LngLat::new(0.0, 0.0), 1.0, 1.0).unwrap();
        for sequence in 1..=2 {
            t.dispatch(SearchRequest {
                sequence,
                bounds,
                zoom: 10.0,
                query: String::new(),
            })
            .unwrap();
        }
        assert_eq!(t.pending_responses(), 2);
        assert_eq!(t.try_recv().unwrap().sequence, 1);
        let second = t.try_recv().unwrap();
        assert_eq!(second.sequence, 2);
        assert_eq!(second.entities.len(), 4);
        assert!(t.try_recv().is_none());
    }
}
