pub mod dispatcher;
pub mod error;
pub mod index;
pub mod reconciler;
pub mod request;
pub mod transport;
pub mod worker;

pub use dispatcher::{DispatcherConfig, Notified, QueryDispatcher};
pub use error::SearchError;
pub use index::InMemoryIndex;
pub use reconciler::{ResultReconciler, ResultSet, StalePolicy};
pub use request::{SearchRequest, SearchResponse, Trigger};
pub use transport::{ChannelTransport, InlineTransport, SearchTransport};
pub use worker::{spawn_search_worker, QueryExecutor};

/// Convenience result type for the search crate.
pub type Result<T> = std::result::Result<T, SearchError>;
