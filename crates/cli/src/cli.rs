use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(name = "odata-sql")]
#[command(about = "Translate OData query parameters into parameterized SQL")]
#[command(version)]
pub struct Cli {
    /// Directory holding configuration.json
    #[arg(short, long, global = true, env = "ODATA_SQL_CONFIGURATION", default_value = ".")]
    pub configuration: PathBuf,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the SQL a query would run against a table
    Translate(TranslateArgs),
    /// Print the JSON schema of the configuration file
    PrintSchema,
    /// Write an initial configuration into a directory
    Initialize {
        dir: PathBuf,
    },
}

#[derive(Debug, Clone, Default, Args)]
pub struct TranslateArgs {
    /// Name of a configured table
    pub table: String,

    #[arg(long)]
    pub filter: Option<String>,

    #[arg(long)]
    pub orderby: Option<String>,

    #[arg(long)]
    pub skip: Option<String>,

    #[arg(long)]
    pub top: Option<String>,

    #[arg(long, value_enum)]
    pub inlinecount: Option<InlineCountArg>,

    /// A raw query string such as `$filter=Id eq 1&$top=10`, instead of the options above
    #[arg(long, conflicts_with_all = ["filter", "orderby", "skip", "top", "inlinecount"])]
    pub query_string: Option<String>,

    /// Format the generated SQL
    #[arg(long)]
    pub pretty: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "lowercase")]
pub enum InlineCountArg {
    None,
    AllPages,
}

impl InlineCountArg {
    pub fn as_str(self) -> &'static str {
        match self {
            InlineCountArg::None => "none",
            InlineCountArg::AllPages => "allpages",
        }
    }
}
