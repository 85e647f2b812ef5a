//! Front end for the read-only Cypher subset the translator understands:
//! `MATCH` and `WITH` clauses in any order, then one `RETURN`.

use nom::branch::alt;
use nom::bytes::complete::tag;
use nom::character::complete::multispace0;
use nom::combinator::{cut, map, opt};
use nom::error::context;
use nom::multi::many0;
use nom::{IResult, Parser};

use ast::{Expression, MatchClause, Query, WithClause};
use common::ws;
pub use errors::OpenCypherParsingError;

pub mod ast;
mod common;
mod errors;
mod expression;
mod match_clause;
mod path_pattern;
mod return_clause;
mod where_clause;
mod with_clause;

enum ReadingClause<'a> {
    Match(MatchClause<'a>),
    With(WithClause<'a>),
}

fn parse_reading_clause(input: &str) -> IResult<&str, ReadingClause<'_>, OpenCypherParsingError<'_>> {
    alt((
        map(match_clause::parse_match_clause, ReadingClause::Match),
        map(with_clause::parse_with_clause, ReadingClause::With),
    ))
    .parse(input)
}

fn parse_query_with_nom(input: &str) -> IResult<&str, Query<'_>, OpenCypherParsingError<'_>> {
    let (input, _) = multispace0.parse(input)?;
    let (input, clauses) = many0(parse_reading_clause).parse(input)?;
    let (input, return_clause) = context("RETURN clause", cut(return_clause::parse_return_clause)).parse(input)?;
    let (input, _) = opt(ws(tag(";"))).parse(input)?;

    let mut match_clauses = vec![];
    let mut with_clauses = vec![];
    for clause in clauses {
        match clause {
            ReadingClause::Match(clause) => match_clauses.push(clause),
            ReadingClause::With(clause) => with_clauses.push(clause),
        }
    }

    Ok((
        input,
        Query {
            match_clauses,
            with_clauses,
            return_clause,
        },
    ))
}

/// Parses a whole query. Input left over after the RETURN clause (and an
/// optional `;`) is an error.
pub fn parse_query(input: &str) -> Result<Query<'_>, OpenCypherParsingError<'_>> {
    let query = finish(input, parse_query_with_nom(input))?;
    log::debug!(
        "parsed query: {} MATCH, {} WITH, {} RETURN items",
        query.match_clauses.len(),
        query.with_clauses.len(),
        query.return_clause.items.len()
    );
    Ok(query)
}

/// Parses a standalone expression, such as a WHERE predicate.
pub fn parse_expression(input: &str) -> Result<Expression<'_>, OpenCypherParsingError<'_>> {
    let parsed = ws(expression::parse_expression).parse(input);
    finish(input, parsed)
}

fn finish<'a, T>(
    input: &'a str,
    parsed: IResult<&'a str, T, OpenCypherParsingError<'a>>,
) -> Result<T, OpenCypherParsingError<'a>> {
    match parsed {
        Ok((rest, value)) if rest.trim().is_empty() => Ok(value),
        Ok((rest, _)) => Err(OpenCypherParsingError::new(rest, "unexpected input")),
        Err(nom::Err::Error(error)) | Err(nom::Err::Failure(error)) => Err(error),
        Err(nom::Err::Incomplete(_)) => Err(OpenCypherParsingError::new(input, "incomplete input")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::open_cypher_parser::ast::{Atom, Literal};

    #[test]
    fn test_parse_simple_query() {
        let query = parse_query("MATCH (n:ip) RETURN n").unwrap();
        assert_eq!(query.match_clauses.len(), 1);
        assert!(query.with_clauses.is_empty());
        assert_eq!(query.return_clause.items.len(), 1);
    }

    #[test]
    fn test_parse_query_with_every_clause() {
        let query = parse_query(
            "
            MATCH (v:variable)-[:has]->(n)
            WHERE n.value STARTS WITH 'tmp'
            MATCH (n)<-[r]-(:function)
            WITH v, COUNT(r) AS uses
            RETURN DISTINCT v.value, uses SKIP 10 LIMIT 5;
            ",
        )
        .unwrap();
        assert_eq!(query.match_clauses.len(), 2);
        assert!(query.match_clauses[0].where_clause.is_some());
        assert_eq!(query.with_clauses.len(), 1);
        assert!(query.return_clause.distinct);
        assert!(query.return_clause.skip.is_some());
        assert!(query.return_clause.limit.is_some());
    }

    #[test]
    fn test_return_is_required() {
        let error = parse_query("MATCH (n)").unwrap_err();
        assert!(error.errors.iter().any(|(_, ctx)| *ctx == "RETURN clause"));
    }

    #[test]
    fn test_trailing_input_is_rejected() {
        let error = parse_query("MATCH (n) RETURN n ORDER BY n.value").unwrap_err();
        assert_eq!(error.errors, vec![("ORDER BY n.value", "unexpected input")]);
    }

    #[test]
    fn test_parse_expression_entry_point() {
        let expression = parse_expression("  42 ").unwrap();
        assert_eq!(
            expression.as_term().unwrap().atom,
            Atom::Literal(Literal::Integer(42))
        );
        assert!(parse_expression("a.value =").is_err());
    }
}
