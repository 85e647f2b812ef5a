//! Expression grammar, one parser per precedence level:
//! OR, XOR, AND, NOT, comparison, `+ -`, `* / %`, `^`, unary sign, string
//! operators, property lookup, atom.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while},
    character::complete::{char, digit1, multispace1},
    combinator::{map, map_res, opt, recognize, value, verify},
    multi::{many0, many0_count, separated_list0, separated_list1},
    sequence::{delimited, preceded},
    IResult, Parser,
};

use super::ast::{
    AddSubExpression, AndExpression, ArithmeticOperator, Atom, ComparisonExpression,
    ComparisonOperator, Expression, FunctionInvocation, Literal, MultiplyDivideExpression,
    NotExpression, PatternElement, PowerExpression, PropertyOrLabels, StringOperator,
    StringOperatorExpression, UnaryExpression, XorExpression,
};
use super::common::{keyword, parse_symbolic_name, parse_variable, ws};
use super::errors::OpenCypherParsingError;
use super::path_pattern::parse_pattern_element;

pub fn parse_expression(input: &str) -> IResult<&str, Expression<'_>, OpenCypherParsingError<'_>> {
    map(
        separated_list1(ws(keyword("OR")), parse_xor_expression),
        |xors| Expression { xors },
    )
    .parse(input)
}

fn parse_xor_expression(input: &str) -> IResult<&str, XorExpression<'_>, OpenCypherParsingError<'_>> {
    map(
        separated_list1(ws(keyword("XOR")), parse_and_expression),
        |ands| XorExpression { ands },
    )
    .parse(input)
}

fn parse_and_expression(input: &str) -> IResult<&str, AndExpression<'_>, OpenCypherParsingError<'_>> {
    map(
        separated_list1(ws(keyword("AND")), parse_not_expression),
        |nots| AndExpression { nots },
    )
    .parse(input)
}

fn parse_not_expression(input: &str) -> IResult<&str, NotExpression<'_>, OpenCypherParsingError<'_>> {
    let (input, count) = many0_count(ws(keyword("NOT"))).parse(input)?;
    let (input, comparison) = parse_comparison_expression(input)?;
    Ok((
        input,
        NotExpression {
            negated: count % 2 == 1,
            comparison,
        },
    ))
}

fn parse_comparison_operator(input: &str) -> IResult<&str, ComparisonOperator, OpenCypherParsingError<'_>> {
    alt((
        value(ComparisonOperator::NotEqual, tag("<>")),
        value(ComparisonOperator::LessThanEqual, tag("<=")),
        value(ComparisonOperator::GreaterThanEqual, tag(">=")),
        value(ComparisonOperator::Equal, tag("=")),
        value(ComparisonOperator::LessThan, tag("<")),
        value(ComparisonOperator::GreaterThan, tag(">")),
    ))
    .parse(input)
}

fn parse_comparison_expression(
    input: &str,
) -> IResult<&str, ComparisonExpression<'_>, OpenCypherParsingError<'_>> {
    let (input, lhs) = parse_add_sub_expression(input)?;
    let (input, partials) = many0((ws(parse_comparison_operator), parse_add_sub_expression)).parse(input)?;
    Ok((input, ComparisonExpression { lhs, partials }))
}

fn parse_add_sub_expression(input: &str) -> IResult<&str, AddSubExpression<'_>, OpenCypherParsingError<'_>> {
    let operator = alt((
        value(ArithmeticOperator::Add, char('+')),
        value(ArithmeticOperator::Subtract, char('-')),
    ));
    let (input, first) = parse_multiply_divide_expression(input)?;
    let (input, rest) = many0((ws(operator), parse_multiply_divide_expression)).parse(input)?;
    Ok((input, AddSubExpression { first, rest }))
}

fn parse_multiply_divide_expression(
    input: &str,
) -> IResult<&str, MultiplyDivideExpression<'_>, OpenCypherParsingError<'_>> {
    let operator = alt((
        value(ArithmeticOperator::Multiply, char('*')),
        value(ArithmeticOperator::Divide, char('/')),
        value(ArithmeticOperator::Modulo, char('%')),
    ));
    let (input, first) = parse_power_expression(input)?;
    let (input, rest) = many0((ws(operator), parse_power_expression)).parse(input)?;
    Ok((input, MultiplyDivideExpression { first, rest }))
}

fn parse_power_expression(input: &str) -> IResult<&str, PowerExpression<'_>, OpenCypherParsingError<'_>> {
    map(
        separated_list1(ws(char('^')), parse_unary_expression),
        |operands| PowerExpression { operands },
    )
    .parse(input)
}

fn parse_unary_expression(input: &str) -> IResult<&str, UnaryExpression<'_>, OpenCypherParsingError<'_>> {
    let (input, sign) = opt(ws(alt((char('-'), char('+'))))).parse(input)?;
    let (input, operand) = parse_string_operator_expression(input)?;
    Ok((
        input,
        UnaryExpression {
            negative: sign == Some('-'),
            operand,
        },
    ))
}

fn parse_string_operator(input: &str) -> IResult<&str, StringOperator, OpenCypherParsingError<'_>> {
    alt((
        value(
            StringOperator::StartsWith,
            (keyword("STARTS"), multispace1, keyword("WITH")),
        ),
        value(
            StringOperator::EndsWith,
            (keyword("ENDS"), multispace1, keyword("WITH")),
        ),
        value(StringOperator::Contains, keyword("CONTAINS")),
    ))
    .parse(input)
}

fn parse_string_operator_expression(
    input: &str,
) -> IResult<&str, StringOperatorExpression<'_>, OpenCypherParsingError<'_>> {
    let (input, lhs) = parse_property_or_labels(input)?;
    let (input, operations) = many0((ws(parse_string_operator), parse_property_or_labels)).parse(input)?;
    Ok((input, StringOperatorExpression { lhs, operations }))
}

fn parse_property_or_labels(input: &str) -> IResult<&str, PropertyOrLabels<'_>, OpenCypherParsingError<'_>> {
    let (input, atom) = ws(parse_atom).parse(input)?;
    let (input, property_path) = many0(ws(preceded(char('.'), parse_symbolic_name))).parse(input)?;
    Ok((input, PropertyOrLabels { atom, property_path }))
}

fn parse_atom(input: &str) -> IResult<&str, Atom<'_>, OpenCypherParsingError<'_>> {
    alt((
        map(parse_literal, Atom::Literal),
        parse_count_all,
        map(parse_function_invocation, Atom::FunctionInvocation),
        // A parenthesized lone variable is not a pattern: at least one hop
        // is required.
        map(
            verify(parse_pattern_element, |pattern: &PatternElement<'_>| {
                !pattern.chain.is_empty()
            }),
            Atom::RelationshipsPattern,
        ),
        map(
            delimited(ws(char('(')), parse_expression, ws(char(')'))),
            |inner| Atom::Parenthesized(Box::new(inner)),
        ),
        map(parse_variable, Atom::Variable),
    ))
    .parse(input)
}

fn parse_count_all(input: &str) -> IResult<&str, Atom<'_>, OpenCypherParsingError<'_>> {
    value(
        Atom::CountAll,
        (keyword("COUNT"), ws(char('(')), ws(char('*')), char(')')),
    )
    .parse(input)
}

fn parse_function_invocation(
    input: &str,
) -> IResult<&str, FunctionInvocation<'_>, OpenCypherParsingError<'_>> {
    let (input, name) = parse_symbolic_name(input)?;
    let (input, _) = ws(char('(')).parse(input)?;
    let (input, distinct) = opt(ws(keyword("DISTINCT"))).parse(input)?;
    let (input, arguments) = separated_list0(ws(char(',')), parse_expression).parse(input)?;
    let (input, _) = char(')').parse(input)?;
    Ok((
        input,
        FunctionInvocation {
            name,
            distinct: distinct.is_some(),
            arguments,
        },
    ))
}

pub fn parse_literal(input: &str) -> IResult<&str, Literal<'_>, OpenCypherParsingError<'_>> {
    alt((
        value(Literal::Boolean(true), keyword("TRUE")),
        value(Literal::Boolean(false), keyword("FALSE")),
        value(Literal::Null, keyword("NULL")),
        map_res(recognize((digit1, char('.'), digit1)), |text: &str| {
            text.parse::<f64>().map(Literal::Float)
        }),
        map_res(digit1, |text: &str| text.parse::<i64>().map(Literal::Integer)),
        map(
            delimited(char('\''), take_while(|c| c != '\''), char('\'')),
            Literal::String,
        ),
        map(
            delimited(char('"'), take_while(|c| c != '"'), char('"')),
            Literal::String,
        ),
    ))
    .parse(input)
}
