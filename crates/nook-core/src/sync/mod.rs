//! Sync engine: conflict resolution, transports, and the orchestrator that
//! drives push → pull → merge passes.

mod document;
mod http;
mod orchestrator;
mod resolver;
mod transport;
pub mod wire;

pub use document::DocumentStoreTransport;
pub use http::HttpSyncTransport;
pub use orchestrator::{SyncOrchestrator, SyncOutcome, SyncReport};
pub use resolver::{merge_incoming, merge_incoming_in, resolve, MergeSummary, Resolution};
pub use transport::{PulledNotes, SyncTransport, TransportError, TransportResult};
