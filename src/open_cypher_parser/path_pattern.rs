use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{char, multispace0},
    combinator::opt,
    error::context,
    multi::{many0, separated_list1},
    sequence::{delimited, preceded},
    IResult, Parser,
};

use super::ast::{NodePattern, PatternElement, PatternElementChain, RelationshipPattern};
use super::common::{parse_symbolic_name, parse_variable, ws};
use super::errors::OpenCypherParsingError;

/// `(a:ip)-[:resolves]->(b)<--(c)`: a node followed by any number of hops.
pub fn parse_pattern_element(input: &str) -> IResult<&str, PatternElement<'_>, OpenCypherParsingError<'_>> {
    let (input, node) = ws(parse_node_pattern).parse(input)?;
    let (input, chain) = many0(parse_chain).parse(input)?;
    Ok((input, PatternElement { node, chain }))
}

fn parse_chain(input: &str) -> IResult<&str, PatternElementChain<'_>, OpenCypherParsingError<'_>> {
    let (input, relationship) = ws(parse_relationship_pattern).parse(input)?;
    let (input, node) = context("node pattern", ws(parse_node_pattern)).parse(input)?;
    Ok((input, PatternElementChain { relationship, node }))
}

pub fn parse_node_pattern(input: &str) -> IResult<&str, NodePattern<'_>, OpenCypherParsingError<'_>> {
    let (input, _) = char('(').parse(input)?;
    let (input, variable) = opt(ws(parse_variable)).parse(input)?;
    let (input, labels) = many0(preceded(ws(char(':')), ws(parse_symbolic_name))).parse(input)?;
    let (input, _) = ws(char(')')).parse(input)?;
    Ok((input, NodePattern { variable, labels }))
}

/// `-[r:a|b]->`, `<-[]-`, `--`, `-->` and `<-->`. The bracketed detail is
/// optional.
pub fn parse_relationship_pattern(
    input: &str,
) -> IResult<&str, RelationshipPattern<'_>, OpenCypherParsingError<'_>> {
    let (input, left_arrow) = opt(char('<')).parse(input)?;
    let (input, _) = preceded(multispace0, char('-')).parse(input)?;
    let (input, detail) = opt(delimited(
        ws(char('[')),
        (opt(ws(parse_variable)), opt(parse_relationship_types)),
        ws(char(']')),
    ))
    .parse(input)?;
    let (input, _) = preceded(multispace0, char('-')).parse(input)?;
    let (input, right_arrow) = opt(preceded(multispace0, char('>'))).parse(input)?;

    let (variable, labels) = detail.unwrap_or_default();
    Ok((
        input,
        RelationshipPattern {
            variable,
            labels: labels.unwrap_or_default(),
            left_arrow: left_arrow.is_some(),
            right_arrow: right_arrow.is_some(),
        },
    ))
}

fn parse_relationship_types(input: &str) -> IResult<&str, Vec<&str>, OpenCypherParsingError<'_>> {
    preceded(
        ws(char(':')),
        separated_list1(
            ws(alt((tag("|:"), tag("|")))),
            ws(parse_symbolic_name),
        ),
    )
    .parse(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_node_patterns() {
        assert_eq!(
            parse_node_pattern("()"),
            Ok(("", NodePattern::default()))
        );
        assert_eq!(
            parse_node_pattern("(n:ip)"),
            Ok((
                "",
                NodePattern {
                    variable: Some("n"),
                    labels: vec!["ip"]
                }
            ))
        );
        assert_eq!(
            parse_node_pattern("( :ip : domain )"),
            Ok((
                "",
                NodePattern {
                    variable: None,
                    labels: vec!["ip", "domain"]
                }
            ))
        );
        assert!(parse_node_pattern("(n.value)").is_err());
    }

    #[test]
    fn test_parse_relationship_directions() {
        let arrows = |input: &str| {
            let (rest, rel) = parse_relationship_pattern(input).unwrap();
            assert_eq!(rest, "");
            (rel.left_arrow, rel.right_arrow)
        };
        assert_eq!(arrows("--"), (false, false));
        assert_eq!(arrows("-->"), (false, true));
        assert_eq!(arrows("<--"), (true, false));
        assert_eq!(arrows("<-->"), (true, true));
        assert_eq!(arrows("-[]-"), (false, false));
        assert_eq!(arrows("<-[r]->"), (true, true));
    }

    #[test]
    fn test_parse_relationship_detail() {
        assert_eq!(
            parse_relationship_pattern("-[r:has|:owns|uses]->"),
            Ok((
                "",
                RelationshipPattern {
                    variable: Some("r"),
                    labels: vec!["has", "owns", "uses"],
                    left_arrow: false,
                    right_arrow: true,
                }
            ))
        );
        assert_eq!(
            parse_relationship_pattern("<-[:has]-"),
            Ok((
                "",
                RelationshipPattern {
                    variable: None,
                    labels: vec!["has"],
                    left_arrow: true,
                    right_arrow: false,
                }
            ))
        );
    }

    #[test]
    fn test_parse_pattern_element_chain() {
        let (rest, element) =
            parse_pattern_element("(a:ip)-[:resolves]->(d:domain)<--(o) RETURN").unwrap();
        assert_eq!(rest, "RETURN");
        assert_eq!(element.node.variable, Some("a"));
        assert_eq!(element.chain.len(), 2);
        assert_eq!(element.chain[0].relationship.labels, vec!["resolves"]);
        assert_eq!(element.chain[1].node.variable, Some("o"));
        assert!(element.chain[1].relationship.left_arrow);
    }

    #[test]
    fn test_single_node_has_empty_chain() {
        let (rest, element) = parse_pattern_element("(n) WHERE").unwrap();
        assert_eq!(rest, "WHERE");
        assert!(element.chain.is_empty());
    }
}
