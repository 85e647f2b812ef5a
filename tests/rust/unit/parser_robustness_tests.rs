//! Unit tests for query parsing edge cases and error handling
//!
//! Malformed queries must come back as errors, never as panics or as
//! partially parsed queries.

use graphkb::open_cypher_parser::parse_query;

#[test]
fn test_malformed_queries_are_rejected() {
    let malformed_queries = vec![
        "",
        "MATCH",
        "MATCH (",
        "MATCH )",
        "MATCH (n",
        "MATCH n)",
        "MATCH (n-",
        "MATCH (n)-[]",
        "MATCH (n)-[]-",
        "RETURN",
        "WHERE",
        "MATCH (n) RETURN n WHERE",
        "MATCH (n) INVALID_CLAUSE",
        "MATCH (n) RETURN n INVALID_KEYWORD",
        "MATCH (n:) RETURN n",
        "MATCH (n)-[:]->(m) RETURN n",
        "MATCH (n) WHERE RETURN n",
        "MATCH (n) RETURN n LIMIT",
        "MATCH (n) RETURN n AS",
        "MATCH (n) RETURN n,",
        "MATCH (n) RETURN 'unterminated",
        "MATCH (n) RETURN n ORDER BY n.value",
        "CREATE (n:ip) RETURN n",
    ];

    for query in malformed_queries {
        assert!(parse_query(query).is_err(), "expected an error for {:?}", query);
    }
}

#[test]
fn test_errors_point_at_the_problem() {
    let error = parse_query("MATCH (n) RETURN n garbage").unwrap_err();
    assert_eq!(error.errors.last().map(|(rest, _)| *rest), Some("garbage"));
    assert!(!error.to_string().is_empty());
}

#[test]
fn test_whitespace_and_case_variants() {
    let queries = vec![
        "MATCH (n) RETURN n",
        "match (n) return n",
        "  MATCH   (n)\n\tRETURN\n n  ",
        "MATCH (n) RETURN n;",
        "MATCH(n)RETURN n",
        "MATCH (`weird name`:ip) RETURN `weird name`",
    ];

    for query in queries {
        assert!(parse_query(query).is_ok(), "expected {:?} to parse", query);
    }
}

#[test]
fn test_keywords_need_word_boundaries() {
    // `RETURNn` is not RETURN followed by `n`
    assert!(parse_query("MATCH (n) RETURNn").is_err());
    // property names may share a prefix with a keyword
    assert!(parse_query("MATCH (n) WHERE n.limit_value = 1 RETURN n").is_ok());
}

#[test]
fn test_reserved_words_are_not_variables() {
    assert!(parse_query("MATCH (return) RETURN return").is_err());
    assert!(parse_query("MATCH (n) RETURN match").is_err());
    assert!(parse_query("MATCH (returned) RETURN returned").is_ok());
}

#[test]
fn test_deeply_nested_expressions() {
    let depth = 50;
    let predicate = format!("{}n.value = 'x'{}", "(".repeat(depth), ")".repeat(depth));
    let query = format!("MATCH (n) WHERE {} RETURN n", predicate);
    assert!(parse_query(&query).is_ok());
}

#[test]
fn test_long_pattern_chain() {
    let mut pattern = String::from("(n0)");
    for i in 1..30 {
        pattern.push_str(&format!("-[:next]->(n{})", i));
    }
    let query = format!("MATCH {} RETURN n29", pattern);
    let parsed = parse_query(&query).unwrap();
    assert_eq!(parsed.match_clauses.len(), 1);
}
