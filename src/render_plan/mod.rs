use serde::Serialize;

pub mod and_or_expression;

pub use and_or_expression::AndOrExpression;

/// An aggregate wrapper applied to a projected expression.
#[derive(Debug, PartialEq, Eq, Clone, Serialize)]
pub struct SqlFunction {
    pub name: String,
    pub distinct: bool,
}

impl SqlFunction {
    pub fn count(distinct: bool) -> Self {
        SqlFunction {
            name: "COUNT".to_string(),
            distinct,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize)]
pub struct SqlProjection {
    pub expression: String,
    pub alias: Option<String>,
    pub function: Option<SqlFunction>,
}

impl SqlProjection {
    pub fn column(expression: impl Into<String>) -> Self {
        SqlProjection {
            expression: expression.into(),
            alias: None,
            function: None,
        }
    }

    pub fn aggregate(expression: impl Into<String>, function: SqlFunction) -> Self {
        SqlProjection {
            expression: expression.into(),
            alias: None,
            function: Some(function),
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }
}

/// A nested query embedded in a FROM list as `(<sql>) AS <alias>`.
#[derive(Debug, PartialEq, Clone, Serialize)]
pub struct SqlInnerStructure {
    pub structure: Box<SqlStructure>,
    pub alias: String,
}

#[derive(Debug, PartialEq, Clone, Serialize)]
pub enum SqlFrom {
    Table { name: String, alias: Option<String> },
    Nested(SqlInnerStructure),
}

impl SqlFrom {
    pub fn table(name: impl Into<String>, alias: impl Into<String>) -> Self {
        SqlFrom::Table {
            name: name.into(),
            alias: Some(alias.into()),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize)]
pub struct SqlJoin {
    pub table: String,
    pub alias: String,
    pub on: String,
    /// Emitted as `FORCE INDEX FOR JOIN (<index>)`.
    pub index_hint: Option<String>,
}

/// Description of one relational query before it is turned into text.
///
/// `joins` holds alternative join lists. Each alternative yields its own
/// branch, so more than one alternative always produces a union.
#[derive(Debug, PartialEq, Clone, Serialize)]
pub struct SqlStructure {
    pub distinct: bool,
    pub projections: Vec<SqlProjection>,
    pub from: Vec<SqlFrom>,
    pub joins: Vec<Vec<SqlJoin>>,
    pub where_expression: AndOrExpression,
    /// Indices into `projections`.
    pub group_by: Vec<usize>,
    /// Some projection aggregates, possibly inside a larger expression.
    pub aggregated: bool,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl Default for SqlStructure {
    fn default() -> Self {
        SqlStructure {
            distinct: false,
            projections: vec![],
            from: vec![],
            joins: vec![],
            where_expression: AndOrExpression::always(),
            group_by: vec![],
            aggregated: false,
            limit: None,
            offset: None,
        }
    }
}

impl SqlStructure {
    /// True when the projections must be re-aggregated once branches are
    /// unioned together.
    pub fn is_aggregated(&self) -> bool {
        self.aggregated
            || !self.group_by.is_empty()
            || self.projections.iter().any(|p| p.function.is_some())
    }
}
