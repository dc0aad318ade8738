use crate::prelude::*;
use frantic_core::{SearchRequest, Status, WorkerMessage, WorkerTask};
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Debug, clap::Parser)]
#[command(name = "watch")]
#[command(about = "Read queries line-by-line and answer through the search worker")]
pub struct App {
    /// Number of top rows to display per query
    #[clap(short, long, default_value = "5")]
    pub limit: usize,
}

/// Drives the worker exactly the way the UI does: monotonically increasing
/// query ids, with any response for a superseded id discarded.
pub async fn run(app: App, global: crate::Global) -> Result<()> {
    let engine = global.load_engine().await?;
    let combined_names = engine.cards().columns.combined_name.clone();

    let (tasks, mut messages, handle) = frantic_core::worker::spawn(engine);

    // The worker announces readiness before accepting queries.
    match messages.recv().await {
        Some(WorkerMessage::Status { status, .. }) if status == Status::Ready => {}
        other => return Err(eyre!("worker failed to start: {other:?}")),
    }

    aprintln!("Type a query per line (ctrl-d to exit):");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut latest_query_id = 0u64;

    while let Some(line) = lines.next_line().await? {
        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        latest_query_id += 1;
        tasks
            .send(WorkerTask::Search(SearchRequest {
                query_id: latest_query_id,
                query: query.to_string(),
            }))
            .await
            .map_err(|_| eyre!("worker stopped"))?;

        // Drain messages until the current query's response arrives.
        loop {
            let Some(message) = messages.recv().await else {
                return Err(eyre!("worker stopped"));
            };
            match message {
                WorkerMessage::Result { query_id, result } => {
                    if query_id != latest_query_id {
                        log::debug!("discarding stale response {query_id}");
                        continue;
                    }
                    aprintln!("{} cards", result.indices.len());
                    for face in result.indices.iter().take(app.limit) {
                        aprintln!("  {}", combined_names[*face as usize]);
                    }
                    break;
                }
                WorkerMessage::Status { status, cause, .. } => {
                    aeprintln!("status: {status:?} {}", cause.unwrap_or_default());
                }
            }
        }
    }

    drop(tasks);
    handle.await?;
    Ok(())
}
