//! The `odata-sql` command line: translate OData query parameters into SQL for a
//! configured table.

pub mod cli;
pub mod commands;

use std::path::Path;

use cli::Commands;

/// Run one command against the configuration in `configuration_dir`, returning what
/// should be printed.
pub async fn run(command: Commands, configuration_dir: &Path) -> anyhow::Result<String> {
    match command {
        Commands::Translate(args) => commands::translate(configuration_dir, &args).await,
        Commands::PrintSchema => commands::print_schema(),
        Commands::Initialize { dir } => commands::initialize(&dir).await,
    }
}
