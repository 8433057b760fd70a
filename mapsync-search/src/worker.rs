use std::sync::mpsc;

use tracing::{debug, warn};

use mapsync_core::Entity;

use crate::request::{SearchRequest, SearchResponse};

/// Executes one query synchronously on the worker thread.
pub trait QueryExecutor {
    fn execute(&self, request: &SearchRequest) -> Vec<Entity>;
}

/// Spawn a dedicated search worker thread.
///
/// Returns the send-side for requests and the receive-side for responses.
/// Every request is answered; superseded ones are not skipped here, the
/// reconciler discards their responses. The thread runs until the request
/// sender is dropped.
pub fn spawn_search_worker<E>(executor: E) -> (mpsc::Sender<SearchRequest>, mpsc::Receiver<SearchResponse>)
where
    E: QueryExecutor + Send + 'static,
{
    let (req_tx, req_rx) = mpsc::channel::<SearchRequest>();
    let (resp_tx, resp_rx) = mpsc::channel::<SearchResponse>();

    std::thread::Builder::new()
        .name("search-worker".into())
        .spawn(move || {
            debug!("Search worker thread started");
            while let Ok(request) = req_rx.recv() {
                let entities = executor.execute(&request);
                debug!(
                    sequence = request.sequence,
                    count = entities.len(),
                    "Search worker: query complete"
                );
                if resp_tx.send(request.respond(entities)).is_err() {
                    warn!("Search worker: response receiver dropped");
                    break;
                }
            }
            debug!("Search worker thread exiting");
        })
        .expect("Failed to spawn search worker thread");

    (req_tx, resp_rx)
}
