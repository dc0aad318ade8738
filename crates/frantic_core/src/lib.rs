pub mod cards;
pub mod error;
pub mod loader;
pub mod search;
pub mod worker;

// Re-export the engine surface for easy access from the binary
pub use search::{
    NodeError, SearchEngine, SearchResult, TreeNode,
};

// Re-export the columnar containers and payload types
pub use cards::{
    CardColumns, CardPayload, ColorSet, Format, PrintingColumns, PrintingPayload, SCHEMA_VERSION,
};

// Re-export worker plumbing
pub use worker::{SearchRequest, SearchWorker, Status, WorkerMessage, WorkerTask};

pub use error::LoadError;
