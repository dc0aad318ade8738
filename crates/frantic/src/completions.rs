use crate::prelude::*;
use clap::CommandFactory;
use clap_complete::{generate, Shell};
use std::io;

#[derive(Debug, clap::Parser)]
#[command(name = "completions")]
#[command(about = "Generate shell completions")]
pub struct App {
    /// The shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

pub async fn run(app: App, _global: crate::Global) -> Result<()> {
    let mut cmd = crate::App::command();
    generate(app.shell, &mut cmd, "frantic", &mut io::stdout());
    Ok(())
}
