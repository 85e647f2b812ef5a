use nom::{combinator::opt, error::context, IResult, Parser};

use super::{
    ast::WithClause,
    common::{keyword, ws},
    errors::OpenCypherParsingError,
    return_clause::parse_projection_items,
    where_clause::parse_where_clause,
};

/// `WITH items [WHERE expression]`.
pub fn parse_with_clause(input: &str) -> IResult<&str, WithClause<'_>, OpenCypherParsingError<'_>> {
    let (input, _) = ws(keyword("WITH")).parse(input)?;
    let (input, items) = context("with clause", parse_projection_items).parse(input)?;
    let (input, where_clause) = opt(parse_where_clause).parse(input)?;
    Ok((input, WithClause { items, where_clause }))
}
