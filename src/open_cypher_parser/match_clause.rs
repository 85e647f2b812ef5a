use nom::{
    character::complete::char,
    combinator::{cut, opt},
    error::context,
    multi::separated_list1,
    IResult, Parser,
};

use super::ast::MatchClause;
use super::common::{keyword, ws};
use super::errors::OpenCypherParsingError;
use super::path_pattern::parse_pattern_element;
use super::where_clause::parse_where_clause;

pub fn parse_match_clause(input: &str) -> IResult<&str, MatchClause<'_>, OpenCypherParsingError<'_>> {
    let (input, _) = ws(keyword("MATCH")).parse(input)?;

    let (input, pattern_elements) = context(
        "match clause",
        separated_list1(ws(char(',')), cut(parse_pattern_element)),
    )
    .parse(input)?;

    let (input, where_clause) = opt(parse_where_clause).parse(input)?;

    Ok((
        input,
        MatchClause {
            pattern_elements,
            where_clause,
        },
    ))
}
