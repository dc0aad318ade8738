//! The search worker.
//!
//! The engine lives on its own task, apart from whatever drives it. Tasks
//! arrive over an mpsc channel and are processed one at a time to
//! completion, so responses always leave in request order; a client that
//! tracks the newest `query_id` can simply discard superseded results.
//! There is no mid-evaluation cancellation.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::cards::PrintingColumns;
use crate::search::{SearchEngine, SearchResult};

/// One search request. `query_id` must increase monotonically per client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query_id: u64,
    pub query: String,
}

#[derive(Debug)]
pub enum WorkerTask {
    Search(SearchRequest),
    /// Deferred printings payload, attachable while queries are already
    /// being answered.
    AttachPrintings(Box<PrintingColumns>),
}

/// Loading-lifecycle states for `status` messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    Loading,
    Progress,
    Ready,
    PrintingsReady,
    Error,
}

/// Worker-to-client wire messages.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum WorkerMessage {
    #[serde(rename = "status")]
    Status {
        status: Status,
        #[serde(skip_serializing_if = "Option::is_none")]
        progress: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        cause: Option<String>,
    },
    #[serde(rename = "result")]
    Result {
        query_id: u64,
        #[serde(flatten)]
        result: SearchResult,
    },
}

impl WorkerMessage {
    pub fn status(status: Status) -> WorkerMessage {
        WorkerMessage::Status {
            status,
            progress: None,
            cause: None,
        }
    }

    pub fn progress(fraction: f64) -> WorkerMessage {
        WorkerMessage::Status {
            status: Status::Progress,
            progress: Some(fraction),
            cause: None,
        }
    }

    pub fn error(cause: &str) -> WorkerMessage {
        WorkerMessage::Status {
            status: Status::Error,
            progress: None,
            cause: Some(cause.to_string()),
        }
    }
}

pub struct SearchWorker {
    engine: SearchEngine,
    receiver: mpsc::Receiver<WorkerTask>,
    sender: mpsc::UnboundedSender<WorkerMessage>,
}

impl SearchWorker {
    pub fn new(
        engine: SearchEngine,
        receiver: mpsc::Receiver<WorkerTask>,
        sender: mpsc::UnboundedSender<WorkerMessage>,
    ) -> SearchWorker {
        SearchWorker {
            engine,
            receiver,
            sender,
        }
    }

    pub async fn run(mut self) {
        if self.send(WorkerMessage::status(Status::Ready)).is_err() {
            return;
        }

        while let Some(task) = self.receiver.recv().await {
            let message = match task {
                WorkerTask::Search(request) => {
                    log::debug!("query {}: {:?}", request.query_id, request.query);
                    let result = self.engine.search(&request.query);
                    WorkerMessage::Result {
                        query_id: request.query_id,
                        result,
                    }
                }
                WorkerTask::AttachPrintings(columns) => {
                    self.engine.attach_printings(*columns);
                    WorkerMessage::status(Status::PrintingsReady)
                }
            };
            if self.send(message).is_err() {
                break;
            }
        }
    }

    fn send(&self, message: WorkerMessage) -> Result<(), ()> {
        self.sender.send(message).map_err(|_| {
            log::warn!("worker client went away, shutting down");
        })
    }
}

/// Spawn a worker over `engine`, returning the request handle and the
/// response stream.
pub fn spawn(
    engine: SearchEngine,
) -> (
    mpsc::Sender<WorkerTask>,
    mpsc::UnboundedReceiver<WorkerMessage>,
    JoinHandle<()>,
) {
    let (task_tx, task_rx) = mpsc::channel(64);
    let (message_tx, message_rx) = mpsc::unbounded_channel();
    let worker = SearchWorker::new(engine, task_rx, message_tx);
    let handle = tokio::spawn(worker.run());
    (task_tx, message_rx, handle)
}
