//! ontodocs CLI: batch HTML documentation for a tree of ontology files.
//!
//! Finds every `.owl`/`.ttl`/`.rdf` file under the ontology root, runs WIDOCO
//! on each one and mirrors the `<module>/<version>` layout under the docs root.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
