use odata_sql_cli::cli::Cli;

const CONFIGURATION: &str = r#"{
  "version": "1",
  "dialect": "postgres",
  "metadata": {
    "recordShapes": {
      "Item": {
        "properties": {
          "Id": { "type": "integer", "nullable": "NonNullable" },
          "Text": { "column": "text_value", "type": "string" }
        }
      }
    }
  },
  "tables": {
    "items": { "sql": "public.items", "shape": "Item", "fallbackOrdering": ["Id"] }
  }
}
"#;

/// A configuration directory with a single Postgres table, `items`.
pub async fn configuration_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    tokio::fs::write(dir.path().join("configuration.json"), CONFIGURATION)
        .await
        .unwrap();
    dir
}

/// Parse `args` as a command line and run it against the configuration in `dir`.
pub async fn run(dir: &tempfile::TempDir, args: &[&str]) -> anyhow::Result<String> {
    let dir = dir.path().to_str().unwrap();
    let cli = <Cli as clap::Parser>::try_parse_from(
        ["odata-sql", "--configuration", dir].iter().chain(args),
    )?;
    odata_sql_cli::run(cli.command, &cli.configuration).await
}
