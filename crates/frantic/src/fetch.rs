use std::path::PathBuf;

use crate::prelude::*;
use frantic_core::loader;

#[derive(Debug, clap::Parser)]
#[command(name = "fetch")]
#[command(about = "Download the columnar payloads")]
pub struct App {
    /// URL of the face-level payload
    #[clap(value_name = "CARDS_URL")]
    pub cards_url: String,

    /// URL of the printing-level payload
    #[clap(long, value_name = "URL")]
    pub printings_url: Option<String>,

    /// Directory to write the payloads into
    #[clap(short, long)]
    pub output: Option<PathBuf>,
}

pub async fn run(app: App, _global: crate::Global) -> Result<()> {
    let output = app.output.unwrap_or_else(crate::Global::data_dir);
    std::fs::create_dir_all(&output)?;

    let cards_bytes = download(&app.cards_url, "cards").await?;
    // Validate before writing so a bad download never clobbers a good file.
    let columns = loader::parse_cards(&cards_bytes)?;
    let cards_path = output.join("cards.json");
    tokio::fs::write(&cards_path, &cards_bytes).await?;
    aprintln!(
        "Wrote {} faces to {}",
        columns.face_count(),
        cards_path.display()
    );

    if let Some(printings_url) = &app.printings_url {
        let printing_bytes = download(printings_url, "printings").await?;
        let printings = loader::parse_printings(&printing_bytes, &columns)?;
        let printings_path = output.join("printings.json");
        tokio::fs::write(&printings_path, &printing_bytes).await?;
        aprintln!(
            "Wrote {} printings to {}",
            printings.printing_count(),
            printings_path.display()
        );
    }

    Ok(())
}

async fn download(url: &str, what: &str) -> Result<Vec<u8>> {
    let mut last_percent = 0u32;
    let bytes = loader::fetch_with_progress(url, |fraction| {
        let percent = (fraction * 100.0) as u32;
        if percent / 10 > last_percent / 10 {
            aeprintln!("{what}: {percent}%");
        }
        last_percent = percent;
    })
    .await?;
    Ok(bytes)
}
