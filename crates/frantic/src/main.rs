#![allow(clippy::uninlined_format_args)]

use std::path::PathBuf;

use crate::prelude::*;
use clap::Parser;

mod completions;
mod fetch;
mod prelude;
mod search;
mod watch;

#[derive(Debug, clap::Parser)]
#[command(author, version, about, long_about = "Client-side card search engine")]
pub struct App {
    #[command(subcommand)]
    pub command: SubCommands,

    #[clap(flatten)]
    global: Global,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    /// Path to the face-level columnar payload
    #[clap(long, env = "FRANTIC_CARDS_PATH", global = true)]
    pub cards: Option<PathBuf>,

    /// Path to the printing-level columnar payload
    #[clap(long, env = "FRANTIC_PRINTINGS_PATH", global = true)]
    pub printings: Option<PathBuf>,

    /// Whether to display additional information
    #[clap(long, env = "FRANTIC_VERBOSE", global = true, default_value = "false")]
    pub verbose: bool,
}

impl Global {
    /// Directory payload downloads land in when no explicit path is given.
    pub fn data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("frantic-search")
    }

    pub fn cards_path(&self) -> PathBuf {
        self.cards
            .clone()
            .unwrap_or_else(|| Self::data_dir().join("cards.json"))
    }

    /// Explicit printings path, or the default one when it exists on disk.
    pub fn printings_path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.printings {
            return Some(path.clone());
        }
        let default = Self::data_dir().join("printings.json");
        default.exists().then_some(default)
    }

    /// Build an engine from the configured payloads.
    pub async fn load_engine(&self) -> Result<frantic_core::SearchEngine> {
        let cards_path = self.cards_path();
        let columns = frantic_core::loader::load_cards_from_path(&cards_path)
            .await
            .map_err(|err| {
                eyre!("{err}\nhint: run `frantic fetch` or pass --cards <PATH>")
            })?;
        let mut engine = frantic_core::SearchEngine::new(columns);

        if let Some(printings_path) = self.printings_path() {
            let printings = frantic_core::loader::load_printings_from_path(
                &printings_path,
                &engine.cards().columns,
            )
            .await?;
            engine.attach_printings(printings);
        } else if self.verbose {
            aeprintln!("No printings payload; set/rarity/price queries will report errors.");
        }

        Ok(engine)
    }
}

#[derive(Debug, clap::Parser)]
pub enum SubCommands {
    /// Run a query against the local card catalog
    Search(crate::search::App),

    /// Read queries line-by-line and answer through the search worker
    Watch(crate::watch::App),

    /// Download the columnar payloads
    Fetch(crate::fetch::App),

    /// Generate shell completions
    Completions(crate::completions::App),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_cards_path_wins() {
        let global = Global {
            cards: Some(PathBuf::from("/tmp/cards.json")),
            printings: None,
            verbose: false,
        };
        assert_eq!(global.cards_path(), PathBuf::from("/tmp/cards.json"));
    }

    #[test]
    fn test_default_cards_path_lives_under_data_dir() {
        let global = Global {
            cards: None,
            printings: None,
            verbose: false,
        };
        assert!(global.cards_path().ends_with("frantic-search/cards.json"));
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    color_eyre::install()?;

    let app = App::parse();

    match app.command {
        SubCommands::Search(sub_app) => crate::search::run(sub_app, app.global).await,
        SubCommands::Watch(sub_app) => crate::watch::run(sub_app, app.global).await,
        SubCommands::Fetch(sub_app) => crate::fetch::run(sub_app, app.global).await,
        SubCommands::Completions(sub_app) => crate::completions::run(sub_app, app.global).await,
    }
}
