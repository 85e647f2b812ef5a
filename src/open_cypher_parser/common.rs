use nom::{
    branch::alt,
    bytes::complete::{tag_no_case, take_while, take_while1},
    character::complete::{char, multispace0, satisfy},
    combinator::{not, recognize, verify},
    error::ParseError,
    sequence::{delimited, pair, terminated},
    IResult, Parser,
};

use super::errors::OpenCypherParsingError;

/// Words that cannot be used as variable names.
const RESERVED: &[&str] = &[
    "AND", "AS", "CONTAINS", "DISTINCT", "ENDS", "FALSE", "LIMIT", "MATCH", "NOT", "NULL", "OR",
    "RETURN", "SKIP", "STARTS", "TRUE", "WHERE", "WITH", "XOR",
];

pub fn ws<'a, O, E: ParseError<&'a str>, F>(inner: F) -> impl Parser<&'a str, Output = O, Error = E>
where
    F: Parser<&'a str, Output = O, Error = E>,
{
    delimited(multispace0, inner, multispace0)
}

/// Case-insensitive keyword that must not run into a following identifier
/// character, so `ORDER` never matches `OR`.
pub fn keyword<'a>(
    word: &'static str,
) -> impl Parser<&'a str, Output = &'a str, Error = OpenCypherParsingError<'a>> {
    terminated(tag_no_case(word), not(satisfy(is_identifier_char)))
}

fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

pub fn is_reserved(name: &str) -> bool {
    RESERVED.iter().any(|word| word.eq_ignore_ascii_case(name))
}

/// A plain or backquoted name, used for labels, property keys and function
/// names.
pub fn parse_symbolic_name(input: &str) -> IResult<&str, &str, OpenCypherParsingError<'_>> {
    alt((
        delimited(char('`'), take_while1(|c| c != '`'), char('`')),
        recognize(pair(satisfy(is_identifier_start), take_while(is_identifier_char))),
    ))
    .parse(input)
}

pub fn parse_variable(input: &str) -> IResult<&str, &str, OpenCypherParsingError<'_>> {
    verify(parse_symbolic_name, |name: &str| !is_reserved(name)).parse(input)
}
