use nom::{
    character::complete::char,
    combinator::{cut, opt},
    error::context,
    multi::separated_list1,
    sequence::preceded,
    IResult, Parser,
};

use super::{
    ast::{ProjectionBody, ProjectionItem},
    common::{keyword, parse_variable, ws},
    errors::OpenCypherParsingError,
    expression::parse_expression,
};

fn parse_projection_item(input: &str) -> IResult<&str, ProjectionItem<'_>, OpenCypherParsingError<'_>> {
    let (input, expression) = parse_expression(input)?;
    let (input, alias) = opt(preceded(
        ws(keyword("AS")),
        context("projection alias", cut(ws(parse_variable))),
    ))
    .parse(input)?;
    Ok((input, ProjectionItem { expression, alias }))
}

/// Comma-separated `<expression> [AS <name>]` items shared by RETURN and
/// WITH.
pub fn parse_projection_items(
    input: &str,
) -> IResult<&str, Vec<ProjectionItem<'_>>, OpenCypherParsingError<'_>> {
    separated_list1(ws(char(',')), cut(parse_projection_item)).parse(input)
}

/// `RETURN [DISTINCT] items [SKIP n] [LIMIT n]`.
pub fn parse_return_clause(input: &str) -> IResult<&str, ProjectionBody<'_>, OpenCypherParsingError<'_>> {
    let (input, _) = ws(keyword("RETURN")).parse(input)?;
    let (input, distinct) = opt(ws(keyword("DISTINCT"))).parse(input)?;
    let (input, items) = context("return clause", parse_projection_items).parse(input)?;

    let (input, skip) = opt(preceded(
        ws(keyword("SKIP")),
        context("skip clause", cut(parse_expression)),
    ))
    .parse(input)?;
    let (input, limit) = opt(preceded(
        ws(keyword("LIMIT")),
        context("limit clause", cut(parse_expression)),
    ))
    .parse(input)?;

    Ok((
        input,
        ProjectionBody {
            distinct: distinct.is_some(),
            items,
            skip,
            limit,
        },
    ))
}
