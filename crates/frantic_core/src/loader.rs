//! Payload loading.
//!
//! The face payload is the only thing the engine needs to start answering
//! queries; the printings payload is optional and may be attached later.
//! HTTP loads stream the body and report fractional progress as bytes
//! arrive.

use std::path::Path;

use futures::StreamExt;

use crate::cards::{CardColumns, CardPayload, PrintingColumns, PrintingPayload};
use crate::error::LoadError;

pub fn parse_cards(bytes: &[u8]) -> Result<CardColumns, LoadError> {
    let payload: CardPayload = serde_json::from_slice(bytes)?;
    let columns = CardColumns::from_payload(payload)?;
    log::info!("loaded {} card faces", columns.face_count());
    Ok(columns)
}

pub fn parse_printings(
    bytes: &[u8],
    cards: &CardColumns,
) -> Result<PrintingColumns, LoadError> {
    let payload: PrintingPayload = serde_json::from_slice(bytes)?;
    let columns = PrintingColumns::from_payload(payload, cards)?;
    log::info!("loaded {} printings", columns.printing_count());
    Ok(columns)
}

pub async fn load_cards_from_path(path: impl AsRef<Path>) -> Result<CardColumns, LoadError> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path).await.map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_cards(&bytes)
}

pub async fn load_printings_from_path(
    path: impl AsRef<Path>,
    cards: &CardColumns,
) -> Result<PrintingColumns, LoadError> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path).await.map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_printings(&bytes, cards)
}

pub async fn fetch_cards(
    url: &str,
    progress: impl FnMut(f64),
) -> Result<CardColumns, LoadError> {
    let bytes = fetch_with_progress(url, progress).await?;
    parse_cards(&bytes)
}

pub async fn fetch_printings(
    url: &str,
    cards: &CardColumns,
    progress: impl FnMut(f64),
) -> Result<PrintingColumns, LoadError> {
    let bytes = fetch_with_progress(url, progress).await?;
    parse_printings(&bytes, cards)
}

/// Download a payload, reporting `downloaded / content_length` after each
/// chunk. Servers that omit the length get a single 1.0 at the end.
pub async fn fetch_with_progress(
    url: &str,
    mut progress: impl FnMut(f64),
) -> Result<Vec<u8>, LoadError> {
    log::debug!("fetching {url}");
    let response = reqwest::get(url).await?.error_for_status()?;
    let total = response.content_length();

    let mut buffer = Vec::with_capacity(total.unwrap_or(0) as usize);
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        buffer.extend_from_slice(&chunk);
        if let Some(total) = total.filter(|t| *t > 0) {
            progress(buffer.len() as f64 / total as f64);
        }
    }
    progress(1.0);
    Ok(buffer)
}
