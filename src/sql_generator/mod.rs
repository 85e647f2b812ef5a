use crate::render_plan::SqlStructure;

mod errors;
pub mod expression;
mod to_sql_query;

pub use errors::SqlGeneratorError;
pub use expression::{CompiledExpression, ExpressionCompiler};
pub use to_sql_query::ToSql;
pub(crate) use to_sql_query::SQL_IDENTIFIER;

pub fn generate_sql(structure: &SqlStructure) -> Result<String, SqlGeneratorError> {
    structure.to_sql()
}
