use std::path::Path;

/// A configuration with a derived shape, a renamed column and a paging fallback.
pub const CONFIGURATION: &str = r#"{
  "version": "1",
  "dialect": "postgres",
  "metadata": {
    "recordShapes": {
      "Item": {
        "properties": {
          "Id": { "type": "integer", "nullable": "NonNullable" },
          "Text": { "column": "text_value", "type": "string" }
        }
      },
      "SpecialItem": {
        "base": "Item",
        "properties": {
          "Rank": { "type": "double" }
        }
      }
    }
  },
  "tables": {
    "items": { "sql": "public.items", "shape": "Item", "fallbackOrdering": ["Id"] },
    "special": { "sql": "SELECT * FROM public.special_items", "shape": "SpecialItem" }
  }
}
"#;

/// Write `contents` as the configuration file of a fresh directory.
pub async fn configuration_dir(contents: &str) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), contents).await;
    dir
}

pub async fn write(dir: &Path, contents: &str) {
    tokio::fs::write(
        dir.join(odata_sql_configuration::version1::CONFIGURATION_FILENAME),
        contents,
    )
    .await
    .unwrap();
}
