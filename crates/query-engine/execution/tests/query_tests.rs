pub mod common;

mod materialization {
    use std::collections::BTreeMap;

    use query_engine_execution::query::{DeferredQuery, Error};
    use query_engine_ir::ir::ast::{Expression, Function};
    use query_engine_ir::ir::helpers::{call, literal, property};
    use query_engine_ir::ir::pipeline::{PipelineError, QueryResult};
    use query_engine_metadata::metadata::{Nullable, PropertyInfo, RecordSchema, ScalarType};
    use query_engine_sql::sql::dialect::SqlDialectProfile;
    use query_engine_sql::sql::execution_plan::ExpectedShape;
    use query_engine_translation::translation::helpers::Settings;

    use super::common::{Behaviour, FakeExecutor, Unavailable};

    fn schema() -> RecordSchema {
        RecordSchema::new(
            "A",
            BTreeMap::from([
                (
                    "Id".to_string(),
                    PropertyInfo::new(ScalarType::Integer, Nullable::NonNullable),
                ),
                (
                    "Text".to_string(),
                    PropertyInfo::new(ScalarType::String, Nullable::Nullable),
                ),
            ]),
        )
    }

    fn settings() -> Settings {
        Settings::for_schema(SqlDialectProfile::sqlite(), &schema())
    }

    fn starts_with_ab() -> Expression {
        call(Function::StartsWith, vec![property("Text"), literal("AB")])
    }

    #[tokio::test]
    async fn rows_are_fetched_once_per_materialization() {
        let executor = FakeExecutor::new(vec![1, 2], 0);
        let (settings, schema) = (settings(), schema());
        let query = DeferredQuery::new(&executor, &settings, &schema, "items")
            .filter(starts_with_ab())
            .order_by("Id")
            .take(2);

        assert!(executor.calls().is_empty());
        assert_eq!(query.execute().await.unwrap(), QueryResult::Rows(vec![1, 2]));
        assert_eq!(query.execute().await.unwrap(), QueryResult::Rows(vec![1, 2]));

        let calls = executor.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], calls[1]);
        assert_eq!(calls[0].shape, ExpectedShape::Rows);
        insta::assert_snapshot!(calls[0].sql, @r#"SELECT "q".* FROM items AS "q" WHERE ("q"."Text" LIKE ? ESCAPE '\') ORDER BY "q"."Id" ASC LIMIT 2"#);
        assert_eq!(calls[0].params, vec!["p1 = 'AB%'".to_string()]);
    }

    #[tokio::test]
    async fn inline_counts_run_the_count_variant() {
        let executor = FakeExecutor::new(vec![], 7);
        let (settings, schema) = (settings(), schema());
        let descriptor = query_engine_parser::parser::parse(
            &schema,
            [
                ("$filter", "Id gt 1"),
                ("$orderby", "Id"),
                ("$top", "2"),
                ("$inlinecount", "allpages"),
            ],
        )
        .unwrap();
        let query =
            DeferredQuery::from_descriptor(&executor, &settings, &schema, "items", descriptor);

        assert_eq!(query.execute().await.unwrap(), QueryResult::Count(7));
        let calls = executor.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].shape, ExpectedShape::Count);
        insta::assert_snapshot!(calls[0].sql, @r#"SELECT COUNT(*) AS "count" FROM (SELECT "q".* FROM items AS "q" WHERE ("q"."Id" > ?)) AS "q_count""#);
    }

    #[tokio::test]
    async fn terminal_operations_project_rows() {
        let executor = FakeExecutor::new(vec![3], 0);
        let (settings, schema) = (settings(), schema());
        let items = DeferredQuery::new(&executor, &settings, &schema, "items").order_by("Id");

        assert_eq!(
            items.first().execute().await.unwrap(),
            QueryResult::First(Some(3))
        );
        assert_eq!(items.any().execute().await.unwrap(), QueryResult::Any(true));
        assert!(executor
            .calls()
            .iter()
            .all(|call| call.sql.ends_with("LIMIT 1")));
    }

    #[tokio::test]
    async fn untranslatable_queries_never_reach_the_executor() {
        let executor = FakeExecutor::new(vec![1], 0);
        let (settings, schema) = (settings(), schema());
        let query = DeferredQuery::new(&executor, &settings, &schema, "items")
            .take(1)
            .order_by("Id");

        let result = query.execute().await;
        assert!(matches!(
            result,
            Err(Error::Pipeline(PipelineError::UnsupportedOperation { index: 1, .. }))
        ));

        // paging without an ordering, and no fallback configured.
        let result = DeferredQuery::new(&executor, &settings, &schema, "items")
            .take(1)
            .execute()
            .await;
        assert!(matches!(result, Err(Error::Translation(_))));

        assert!(executor.calls().is_empty());
    }

    #[tokio::test]
    async fn executor_errors_pass_through() {
        let executor = FakeExecutor::new(vec![], 0).with_behaviour(Behaviour::Fail);
        let (settings, schema) = (settings(), schema());
        let result = DeferredQuery::new(&executor, &settings, &schema, "items")
            .execute()
            .await;
        assert!(matches!(result, Err(Error::Executor(Unavailable))));
        assert_eq!(executor.calls().len(), 1);
    }

    #[tokio::test]
    async fn results_must_have_the_requested_shape() {
        let executor = FakeExecutor::new(vec![1], 0).with_behaviour(Behaviour::AlwaysRows);
        let (settings, schema) = (settings(), schema());
        let result = DeferredQuery::new(&executor, &settings, &schema, "items")
            .count()
            .execute()
            .await;
        assert!(matches!(
            result,
            Err(Error::UnexpectedShape {
                expected: ExpectedShape::Count,
                found: ExpectedShape::Rows,
            })
        ));
    }
}

mod description {
    use std::collections::BTreeMap;

    use query_engine_execution::query::DeferredQuery;
    use query_engine_ir::ir::ast::Function;
    use query_engine_ir::ir::helpers::{call, literal, property};
    use query_engine_metadata::metadata::{Nullable, PropertyInfo, RecordSchema, ScalarType};
    use query_engine_sql::sql::dialect::SqlDialectProfile;
    use query_engine_translation::translation::helpers::Settings;

    use super::common::FakeExecutor;

    fn schema() -> RecordSchema {
        RecordSchema::new(
            "A",
            BTreeMap::from([(
                "Text".to_string(),
                PropertyInfo::new(ScalarType::String, Nullable::Nullable),
            )]),
        )
    }

    #[test]
    fn queries_describe_their_sql() {
        let executor = FakeExecutor::new(vec![], 0);
        let schema = schema();
        let settings = Settings::for_schema(SqlDialectProfile::sql_server(), &schema);
        let query = DeferredQuery::new(&executor, &settings, &schema, "dbo.Items")
            .filter(call(
                Function::SubstringOf,
                vec![literal("C"), property("Text")],
            ))
            .count();

        insta::assert_snapshot!(query.to_string(), @r"
/*
 * Materialize as a count
 * p1 = '%C%'
 */
SELECT COUNT(*) AS [count] FROM (SELECT [q].* FROM dbo.Items AS [q] WHERE ([q].[Text] LIKE @p1 ESCAPE '\')) AS [q_count]
");
        assert!(executor.calls().is_empty());
    }

    #[test]
    fn untranslatable_queries_say_why() {
        let executor = FakeExecutor::new(vec![], 0);
        let schema = schema();
        let settings = Settings::for_schema(SqlDialectProfile::sql_server(), &schema);
        let query = DeferredQuery::new(&executor, &settings, &schema, "dbo.Items")
            .take(1)
            .order_by("Text");

        assert_eq!(
            query.to_string(),
            "Query could not be translated to SQL: Unsupported operation 'orderBy' at position 1: it cannot be expressed after paging has been applied."
        );
    }
}
