use nom::{combinator::cut, error::context, IResult, Parser};

use super::{
    ast::Expression,
    common::{keyword, ws},
    errors::OpenCypherParsingError,
    expression::parse_expression,
};

/// `WHERE <expression>`. Anything after the keyword that is not an
/// expression is a hard failure.
pub fn parse_where_clause(input: &str) -> IResult<&str, Expression<'_>, OpenCypherParsingError<'_>> {
    let (input, _) = ws(keyword("WHERE")).parse(input)?;
    context("where clause", cut(parse_expression)).parse(input)
}
