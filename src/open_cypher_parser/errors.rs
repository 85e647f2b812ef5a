use nom::error::{ContextError, ErrorKind, FromExternalError, ParseError};
use std::fmt;

/// Error produced by the Cypher front end. Each entry pairs the remaining
/// input at the failure point with what was being parsed there.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenCypherParsingError<'a> {
    pub errors: Vec<(&'a str, &'static str)>,
}

impl<'a> OpenCypherParsingError<'a> {
    pub fn new(input: &'a str, context: &'static str) -> Self {
        OpenCypherParsingError {
            errors: vec![(input, context)],
        }
    }
}

impl<'a> ParseError<&'a str> for OpenCypherParsingError<'a> {
    fn from_error_kind(input: &'a str, _kind: ErrorKind) -> Self {
        OpenCypherParsingError::new(input, "unexpected input")
    }

    fn append(_input: &'a str, _kind: ErrorKind, other: Self) -> Self {
        other
    }
}

impl<'a> ContextError<&'a str> for OpenCypherParsingError<'a> {
    fn add_context(input: &'a str, ctx: &'static str, mut other: Self) -> Self {
        other.errors.push((input, ctx));
        other
    }
}

impl<'a, E> FromExternalError<&'a str, E> for OpenCypherParsingError<'a> {
    fn from_external_error(input: &'a str, _kind: ErrorKind, _e: E) -> Self {
        OpenCypherParsingError::new(input, "invalid literal")
    }
}

impl fmt::Display for OpenCypherParsingError<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (input, ctx)) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{} at: {:?}", ctx, truncate(input))?;
        }
        Ok(())
    }
}

impl std::error::Error for OpenCypherParsingError<'_> {}

fn truncate(input: &str) -> &str {
    match input.char_indices().nth(40) {
        Some((end, _)) => &input[..end],
        None => input,
    }
}
