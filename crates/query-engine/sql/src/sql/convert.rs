//! Convert a SQL AST to a low-level SQL string.

use super::ast::*;
use super::dialect::{FunctionStyle, PagingSyntax};
use super::helpers;
use super::string::SQL;

// Convert to SQL strings

impl SelectList {
    pub fn to_sql(&self, sql: &mut SQL) {
        match self {
            SelectList::SelectList(select_list) => {
                for (index, (col, expr)) in select_list.iter().enumerate() {
                    expr.to_sql(sql);
                    sql.append_syntax(" AS ");
                    col.to_sql(sql);
                    if index < (select_list.len() - 1) {
                        sql.append_syntax(", ");
                    }
                }
            }
            SelectList::SelectStar => {
                sql.append_syntax("*");
            }
            SelectList::SelectStarFrom(table_reference) => {
                table_reference.to_sql(sql);
                sql.append_syntax(".*");
            }
            SelectList::SelectListComposite(select_list1, select_list2) => {
                select_list1.to_sql(sql);
                sql.append_syntax(", ");
                select_list2.to_sql(sql);
            }
        }
    }
}

impl Select {
    pub fn to_sql(&self, sql: &mut SQL) {
        sql.append_syntax("SELECT ");

        self.select_list.to_sql(sql);

        if let Some(from) = &self.from {
            sql.append_syntax(" ");
            from.to_sql(sql);
        }

        self.where_.to_sql(sql);

        self.order_by.to_sql(sql);

        self.limit.to_sql(sql);
    }
}

impl From {
    pub fn to_sql(&self, sql: &mut SQL) {
        sql.append_syntax("FROM ");
        match &self {
            From::Table { reference, alias } => {
                reference.to_sql(sql);
                sql.append_syntax(" AS ");
                alias.to_sql(sql);
            }
            From::Select { select, alias } => {
                sql.append_syntax("(");
                select.to_sql(sql);
                sql.append_syntax(")");
                sql.append_syntax(" AS ");
                alias.to_sql(sql);
            }
            From::RawSelect { sql: raw, alias } => {
                sql.append_syntax("(");
                raw.to_sql(sql);
                sql.append_syntax(")");
                sql.append_syntax(" AS ");
                alias.to_sql(sql);
            }
        }
    }
}

impl RawSql {
    pub fn to_sql(&self, sql: &mut SQL) {
        sql.append_syntax(&self.0);
    }
}

impl Where {
    pub fn to_sql(&self, sql: &mut SQL) {
        let Where(expression) = self;
        if *expression != helpers::true_expr() {
            sql.append_syntax(" WHERE ");
            expression.to_sql(sql);
        }
    }
}

// scalars
impl Expression {
    pub fn to_sql(&self, sql: &mut SQL) {
        match &self {
            Expression::ColumnReference(column_reference) => column_reference.to_sql(sql),
            Expression::Value(value) => value.to_sql(sql),
            Expression::And { left, right } => {
                sql.append_syntax("(");
                left.to_sql(sql);
                sql.append_syntax(" AND ");
                right.to_sql(sql);
                sql.append_syntax(")");
            }
            Expression::Or { left, right } => {
                sql.append_syntax("(");
                left.to_sql(sql);
                sql.append_syntax(" OR ");
                right.to_sql(sql);
                sql.append_syntax(")");
            }
            Expression::Not(expr) => {
                sql.append_syntax("NOT ");
                expr.to_sql(sql);
            }
            Expression::BinaryOperation {
                left,
                operator,
                right,
            } => {
                sql.append_syntax("(");
                left.to_sql(sql);
                operator.to_sql(sql);
                right.to_sql(sql);
                sql.append_syntax(")");
            }
            Expression::UnaryOperation {
                expression,
                operator,
            } => {
                sql.append_syntax("(");
                expression.to_sql(sql);
                operator.to_sql(sql);
                sql.append_syntax(")");
            }
            Expression::Like {
                expression,
                pattern,
                escape,
            } => {
                sql.append_syntax("(");
                expression.to_sql(sql);
                sql.append_syntax(" LIKE ");
                pattern.to_sql(sql);
                sql.append_syntax(&format!(" ESCAPE '{escape}'"));
                sql.append_syntax(")");
            }
            Expression::FunctionCall { function, args } => function.to_sql(args, sql),
            Expression::DatePart { part, expression } => part.to_sql(expression, sql),
            Expression::Count(count_type) => {
                sql.append_syntax("COUNT");
                sql.append_syntax("(");
                count_type.to_sql(sql);
                sql.append_syntax(")");
            }
            Expression::RowNumber(order_by) => {
                sql.append_syntax("ROW_NUMBER() OVER (");
                order_by.elements_to_sql(sql);
                sql.append_syntax(")");
            }
        }
    }
}

impl BinaryOperator {
    pub fn to_sql(&self, sql: &mut SQL) {
        sql.append_syntax(" ");
        sql.append_syntax(&self.0);
        sql.append_syntax(" ");
    }
}

impl UnaryOperator {
    pub fn to_sql(&self, sql: &mut SQL) {
        match self {
            UnaryOperator::IsNull => sql.append_syntax(" IS NULL"),
            UnaryOperator::IsNotNull => sql.append_syntax(" IS NOT NULL"),
        }
    }
}

fn arguments_to_sql(args: &[Expression], sql: &mut SQL) {
    sql.append_syntax("(");
    for (index, arg) in args.iter().enumerate() {
        arg.to_sql(sql);
        if index < (args.len() - 1) {
            sql.append_syntax(", ");
        }
    }
    sql.append_syntax(")");
}

impl Function {
    /// Functions are spelled per dialect, so the call is rendered here as a whole.
    pub fn to_sql(&self, args: &[Expression], sql: &mut SQL) {
        let style = sql.dialect().functions;
        match (self, style) {
            (Function::Length, FunctionStyle::TransactSql) => {
                sql.append_syntax("LEN");
                arguments_to_sql(args, sql);
            }
            (Function::Length, FunctionStyle::Postgres | FunctionStyle::Sqlite) => {
                sql.append_syntax("LENGTH");
                arguments_to_sql(args, sql);
            }
            (Function::Lower, _) => {
                sql.append_syntax("LOWER");
                arguments_to_sql(args, sql);
            }
            (Function::Upper, _) => {
                sql.append_syntax("UPPER");
                arguments_to_sql(args, sql);
            }
            (Function::Trim, FunctionStyle::TransactSql) => {
                sql.append_syntax("LTRIM(RTRIM");
                arguments_to_sql(args, sql);
                sql.append_syntax(")");
            }
            (Function::Trim, FunctionStyle::Postgres | FunctionStyle::Sqlite) => {
                sql.append_syntax("TRIM");
                arguments_to_sql(args, sql);
            }
            (Function::Round, FunctionStyle::TransactSql) => {
                // T-SQL requires the precision argument.
                sql.append_syntax("ROUND(");
                for arg in args {
                    arg.to_sql(sql);
                    sql.append_syntax(", ");
                }
                sql.append_syntax("0)");
            }
            (Function::Round, FunctionStyle::Postgres | FunctionStyle::Sqlite) => {
                sql.append_syntax("ROUND");
                arguments_to_sql(args, sql);
            }
            (Function::Floor, _) => {
                sql.append_syntax("FLOOR");
                arguments_to_sql(args, sql);
            }
            (Function::Ceiling, _) => {
                sql.append_syntax("CEILING");
                arguments_to_sql(args, sql);
            }
        }
    }
}

impl DatePart {
    pub fn to_sql(&self, expression: &Expression, sql: &mut SQL) {
        match sql.dialect().functions {
            FunctionStyle::TransactSql => {
                sql.append_syntax("DATEPART(");
                sql.append_syntax(match self {
                    DatePart::Year => "year",
                    DatePart::Month => "month",
                    DatePart::Day => "day",
                    DatePart::Hour => "hour",
                    DatePart::Minute => "minute",
                    DatePart::Second => "second",
                });
                sql.append_syntax(", ");
                expression.to_sql(sql);
                sql.append_syntax(")");
            }
            FunctionStyle::Postgres => {
                // EXTRACT(SECOND ...) includes the fractional part.
                let truncate = *self == DatePart::Second;
                if truncate {
                    sql.append_syntax("FLOOR(");
                }
                sql.append_syntax("EXTRACT(");
                sql.append_syntax(match self {
                    DatePart::Year => "YEAR",
                    DatePart::Month => "MONTH",
                    DatePart::Day => "DAY",
                    DatePart::Hour => "HOUR",
                    DatePart::Minute => "MINUTE",
                    DatePart::Second => "SECOND",
                });
                sql.append_syntax(" FROM ");
                expression.to_sql(sql);
                sql.append_syntax(")");
                if truncate {
                    sql.append_syntax(")");
                }
            }
            FunctionStyle::Sqlite => {
                sql.append_syntax("CAST(STRFTIME('");
                sql.append_syntax(match self {
                    DatePart::Year => "%Y",
                    DatePart::Month => "%m",
                    DatePart::Day => "%d",
                    DatePart::Hour => "%H",
                    DatePart::Minute => "%M",
                    DatePart::Second => "%S",
                });
                sql.append_syntax("', ");
                expression.to_sql(sql);
                sql.append_syntax(") AS INTEGER)");
            }
        }
    }
}

impl CountType {
    pub fn to_sql(&self, sql: &mut SQL) {
        match self {
            CountType::Star => sql.append_syntax("*"),
        }
    }
}

impl Value {
    pub fn to_sql(&self, sql: &mut SQL) {
        match &self {
            Value::Bool(true) => sql.append_syntax("(1 = 1)"),
            Value::Bool(false) => sql.append_syntax("(1 = 0)"),
            Value::Int8(i) => sql.append_syntax(&i.to_string()),
            Value::Parameter(value) => sql.append_param(value.clone()),
        }
    }
}

impl Limit {
    pub fn to_sql(&self, sql: &mut SQL) {
        match sql.dialect().paging {
            PagingSyntax::LimitOffset {
                offset_requires_limit,
            } => {
                match (self.limit, self.offset) {
                    (Some(limit), _) => {
                        sql.append_syntax(" LIMIT ");
                        sql.append_syntax(&limit.to_string());
                    }
                    (None, Some(_)) if offset_requires_limit => {
                        sql.append_syntax(" LIMIT -1");
                    }
                    (None, _) => (),
                }
                if let Some(offset) = self.offset {
                    sql.append_syntax(" OFFSET ");
                    sql.append_syntax(&offset.to_string());
                }
            }
            // row number paging is expanded into a filter on the row number column during
            // translation, so a limit only gets here if it was built by hand.
            PagingSyntax::OffsetFetch | PagingSyntax::RowNumber => {
                if self.limit.is_none() && self.offset.is_none() {
                    return;
                }
                sql.append_syntax(" OFFSET ");
                sql.append_syntax(&self.offset.unwrap_or(0).to_string());
                sql.append_syntax(" ROWS");
                if let Some(limit) = self.limit {
                    sql.append_syntax(" FETCH NEXT ");
                    sql.append_syntax(&limit.to_string());
                    sql.append_syntax(" ROWS ONLY");
                }
            }
        }
    }
}

// names
impl TableName {
    pub fn to_sql(&self, sql: &mut SQL) {
        sql.append_syntax(&self.0);
    }
}

impl TableReference {
    pub fn to_sql(&self, sql: &mut SQL) {
        match self {
            TableReference::DBTable(table) => table.to_sql(sql),
            TableReference::AliasedTable(alias) => alias.to_sql(sql),
        };
    }
}

impl TableAlias {
    pub fn to_sql(&self, sql: &mut SQL) {
        sql.append_identifier(&self.name);
    }
}

impl ColumnReference {
    pub fn to_sql(&self, sql: &mut SQL) {
        match self {
            ColumnReference::TableColumn { table, name } => {
                table.to_sql(sql);
                sql.append_syntax(".");
                sql.append_identifier(&name.0);
            }
            ColumnReference::AliasedColumn { table, column } => {
                table.to_sql(sql);
                sql.append_syntax(".");
                column.to_sql(sql);
            }
        };
    }
}

impl ColumnAlias {
    pub fn to_sql(&self, sql: &mut SQL) {
        sql.append_identifier(&self.name);
    }
}

impl OrderBy {
    pub fn to_sql(&self, sql: &mut SQL) {
        if !self.elements.is_empty() {
            sql.append_syntax(" ");
            self.elements_to_sql(sql);
        }
    }

    /// `ORDER BY a ASC, b DESC`, without a leading space.
    pub fn elements_to_sql(&self, sql: &mut SQL) {
        sql.append_syntax("ORDER BY ");
        for (index, order_by_item) in self.elements.iter().enumerate() {
            order_by_item.to_sql(sql);
            if index < (self.elements.len() - 1) {
                sql.append_syntax(", ");
            }
        }
    }
}

impl OrderByElement {
    pub fn to_sql(&self, sql: &mut SQL) {
        self.target.to_sql(sql);
        self.direction.to_sql(sql);
    }
}

impl OrderByDirection {
    pub fn to_sql(&self, sql: &mut SQL) {
        match self {
            OrderByDirection::Asc => sql.append_syntax(" ASC"),
            OrderByDirection::Desc => sql.append_syntax(" DESC"),
        }
    }
}
