//! The implementation of each command.

use std::fmt::Write;
use std::path::Path;

use anyhow::{anyhow, bail, Context};

use odata_sql_configuration::version1::CONFIGURATION_FILENAME;
use odata_sql_configuration::{
    generate_configuration_schema, make_runtime_configuration, parse_configuration,
    write_parsed_configuration, ParsedConfiguration,
};
use query_engine_ir::ir::ast::InlineCount;
use query_engine_parser::parser::{self, QueryParameter};
use query_engine_sql::sql::string::SQL;
use query_engine_translation::translation;

use crate::cli::TranslateArgs;

/// Translate a query against a configured table, printing the rows SQL and, when an
/// inline count is requested, the count SQL.
pub async fn translate(configuration_dir: &Path, args: &TranslateArgs) -> anyhow::Result<String> {
    let parsed = parse_configuration(configuration_dir).await?;
    let configuration = make_runtime_configuration(parsed)?;
    let table = configuration
        .table(&args.table)
        .ok_or_else(|| anyhow!("unknown table '{}'", args.table))?;

    let query = match &args.query_string {
        Some(query_string) => parser::parse_query_string(&table.schema, query_string)?,
        None => parser::parse(&table.schema, parameters(args))?,
    };
    let plan = translation::query::translate(&table.settings, &table.base_sql, &query)
        .with_context(|| format!("translating a query over table '{}'", args.table))?;

    let mut output = render("rows", &plan.rows_sql(), args.pretty);
    if query.inline_count() == InlineCount::AllPages {
        output.push('\n');
        output.push_str(&render("count", &plan.count_sql(), args.pretty));
    }
    Ok(output)
}

fn parameters(args: &TranslateArgs) -> Vec<(QueryParameter, String)> {
    [
        (QueryParameter::Filter, args.filter.clone()),
        (QueryParameter::OrderBy, args.orderby.clone()),
        (QueryParameter::Skip, args.skip.clone()),
        (QueryParameter::Top, args.top.clone()),
        (
            QueryParameter::InlineCount,
            args.inlinecount.map(|count| count.as_str().to_string()),
        ),
    ]
    .into_iter()
    .filter_map(|(parameter, value)| value.map(|value| (parameter, value)))
    .collect()
}

/// `-- label`, the SQL, then one `-- name = value` line per parameter.
fn render(label: &str, sql: &SQL, pretty: bool) -> String {
    let text = if pretty {
        sqlformat::format(
            &sql.sql,
            &sqlformat::QueryParams::None,
            sqlformat::FormatOptions::default(),
        )
    } else {
        sql.sql.clone()
    };
    let mut output = format!("-- {label}\n{text}\n");
    for param in &sql.params {
        // writing to a String cannot fail.
        let _ = writeln!(output, "-- {} = {}", param.name, param.value);
    }
    output
}

pub fn print_schema() -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(
        &generate_configuration_schema(),
    )?)
}

/// Write an initial configuration, refusing to overwrite an existing one.
pub async fn initialize(dir: &Path) -> anyhow::Result<String> {
    if tokio::fs::try_exists(dir.join(CONFIGURATION_FILENAME)).await? {
        bail!("{} already holds a configuration", dir.display());
    }
    write_parsed_configuration(ParsedConfiguration::initial(), dir).await?;
    tracing::info!(dir = %dir.display(), "wrote initial configuration");
    Ok(format!("Wrote an initial configuration to {}.", dir.display()))
}
