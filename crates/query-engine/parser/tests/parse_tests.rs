pub mod common;

mod descriptors {
    use query_engine_ir::ir::ast::InlineCount;
    use query_engine_ir::ir::helpers::*;
    use query_engine_parser::parser;
    use similar_asserts::assert_eq;

    use super::common::schema;

    #[test]
    fn absent_parameters_leave_the_descriptor_empty() {
        let query = parser::parse(&schema("A"), Vec::<(&str, &str)>::new()).unwrap();
        assert_eq!(query.filter(), None);
        assert!(query.order_by().is_empty());
        assert_eq!(query.skip(), None);
        assert_eq!(query.top(), None);
        assert_eq!(query.inline_count(), InlineCount::None);
    }

    #[test]
    fn every_parameter_is_parsed() {
        let query = parser::parse(
            &schema("A"),
            [
                ("$filter", "Id eq 1 or Id eq 2 or Id eq 3"),
                ("$orderby", "Id desc"),
                ("$skip", "1"),
                ("$top", "2"),
                ("$inlinecount", "allpages"),
                ("$format", "json"),
            ],
        )
        .unwrap();
        assert_eq!(
            query.filter(),
            Some(&or(
                or(eq(property("Id"), literal(1)), eq(property("Id"), literal(2))),
                eq(property("Id"), literal(3))
            ))
        );
        assert_eq!(query.order_by(), &[descending("Id")]);
        assert_eq!(query.skip(), Some(1));
        assert_eq!(query.top(), Some(2));
        assert_eq!(query.inline_count(), InlineCount::AllPages);
    }

    #[test]
    fn query_strings_are_decoded() {
        let query = parser::parse_query_string(
            &schema("A"),
            "?$filter=startswith(Text,%27AB%27)&$orderby=Text,Id+desc",
        )
        .unwrap();
        assert_eq!(
            query.filter().map(ToString::to_string),
            Some("startswith(Text, 'AB')".to_string())
        );
        assert_eq!(query.order_by(), &[ascending("Text"), descending("Id")]);
    }

    #[test]
    fn derived_shapes_see_inherited_properties() {
        let query = parser::parse(&schema("B"), [("$filter", "Id eq 1 and BId eq 2")]).unwrap();
        assert_eq!(
            query.filter(),
            Some(&and(
                eq(property("Id"), literal(1)),
                eq(property("BId"), literal(2))
            ))
        );
    }
}

mod errors {
    use query_engine_parser::parser::{self, ParseErrorKind, QueryParameter};

    use super::common::schema;

    #[test]
    fn unknown_filter_property() {
        let error = parser::parse(&schema("A"), [("$filter", "BId eq 1")]).unwrap_err();
        assert_eq!(error.kind, ParseErrorKind::UnknownProperty);
        assert_eq!(error.parameter, QueryParameter::Filter);
        assert_eq!(error.position, 0);
    }

    #[test]
    fn unknown_orderby_property() {
        let error = parser::parse(&schema("A"), [("$orderby", "Id, Name")]).unwrap_err();
        assert_eq!(error.kind, ParseErrorKind::UnknownProperty);
        assert_eq!(error.parameter, QueryParameter::OrderBy);
        assert_eq!(error.position, 4);
    }

    #[test]
    fn negative_skip() {
        let error = parser::parse(&schema("A"), [("$skip", "-1")]).unwrap_err();
        assert_eq!(error.kind, ParseErrorKind::InvalidPaging);
        assert_eq!(error.parameter, QueryParameter::Skip);
    }

    #[test]
    fn non_integer_top() {
        let error = parser::parse(&schema("A"), [("$top", "2.5")]).unwrap_err();
        assert_eq!(error.kind, ParseErrorKind::InvalidPaging);
        assert_eq!(error.parameter, QueryParameter::Top);
    }

    #[test]
    fn unknown_inline_count_mode() {
        let error = parser::parse(&schema("A"), [("$inlinecount", "some")]).unwrap_err();
        assert_eq!(error.kind, ParseErrorKind::SyntaxError);
        assert_eq!(error.parameter, QueryParameter::InlineCount);
    }

    #[test]
    fn type_mismatch() {
        let error = parser::parse(&schema("A"), [("$filter", "length(Id) eq 0")]).unwrap_err();
        assert_eq!(error.kind, ParseErrorKind::TypeMismatch);
        assert_eq!(
            error.to_string(),
            "Type mismatch in $filter at position 7: argument 1 of 'length' must be a string, found integer"
        );
    }
}
