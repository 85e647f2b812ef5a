//! Cypher to SQL golden translations through the public entry point.

use graphkb::config::TranslatorConfig;
use graphkb::query_planner::{QueryGraphError, TranslationError};
use graphkb::sql_generator::SqlGeneratorError;
use graphkb::{translate, Error};
use test_case::test_case;

fn sql(cypher: &str) -> String {
    translate(cypher, &TranslatorConfig::default())
        .unwrap_or_else(|e| panic!("{} failed to translate: {}", cypher, e))
        .query
}

#[test_case(
    "MATCH (n:ip) RETURN n",
    "SELECT a0.id, a0.value, a0.type\nFROM (assets a0)\nWHERE a0.type = 'ip'"
    ; "typed node"
)]
#[test_case(
    "MATCH (n:ip) WHERE n.value CONTAINS '10.' RETURN n.value LIMIT 5",
    "SELECT a0.value\nFROM (assets a0)\nWHERE a0.type = 'ip' AND a0.value LIKE '%10.%'\nLIMIT 5"
    ; "contains filter with limit"
)]
#[test_case(
    "MATCH (n:ip) RETURN COUNT(*)",
    "SELECT COUNT(*)\nFROM (assets a0)\nWHERE a0.type = 'ip'"
    ; "count star"
)]
#[test_case(
    "MATCH (:variable)<-[:has]-(n:name) RETURN n.value",
    "SELECT a1.value\nFROM (assets a0, assets a1, relations r0)\n\
     WHERE a0.type = 'variable' AND a1.type = 'name' AND r0.type = 'has' \
     AND r0.from_id = a1.id AND r0.to_id = a0.id"
    ; "incoming typed relation"
)]
#[test_case(
    "MATCH (a)--(b) RETURN a",
    "SELECT a0.id, a0.value, a0.type\nFROM (assets a0, assets a1, relations r0)\n\
     WHERE r0.from_id = a0.id AND r0.to_id = a1.id"
    ; "unconstrained either direction"
)]
#[test_case(
    "MATCH (n:ip:domain) RETURN n.value",
    "(SELECT a0.value\nFROM (assets a0)\nWHERE a0.type = 'ip')\n\
     UNION ALL\n\
     (SELECT a0.value\nFROM (assets a0)\nWHERE a0.type = 'domain')"
    ; "label alternatives become a union"
)]
#[test_case(
    "MATCH (n:ip:domain) RETURN DISTINCT n.value",
    "(SELECT a0.value\nFROM (assets a0)\nWHERE a0.type = 'ip')\n\
     UNION\n\
     (SELECT a0.value\nFROM (assets a0)\nWHERE a0.type = 'domain')"
    ; "distinct union"
)]
#[test_case(
    "MATCH (a:ip)<-[r]->(b:ip) RETURN r.id",
    "SELECT r0.id\nFROM (assets a0, assets a1, relations r0)\n\
     WHERE a0.type = 'ip' AND a1.type = 'ip' \
     AND r0.from_id = a0.id AND r0.to_id = a1.id \
     AND r0.from_id = a1.id AND r0.to_id = a0.id"
    ; "both directions at once"
)]
fn translates_to(cypher: &str, expected: &str) {
    assert_eq!(sql(cypher), expected);
}

#[test]
fn count_across_label_union_is_summed() {
    assert_eq!(
        sql("MATCH (n:ip:domain) RETURN count(n)"),
        "SELECT SUM(star_COUNT)\nFROM\n(\
         (SELECT COUNT(*) AS star_COUNT\nFROM (assets a0)\nWHERE a0.type = 'ip')\n\
         UNION ALL\n\
         (SELECT COUNT(*) AS star_COUNT\nFROM (assets a0)\nWHERE a0.type = 'domain')) AS x"
    );
}

/// Both orientations of `(v:variable)--(n)`, as one branch each.
fn either_branches(select: &str, group_by: &str) -> (String, String) {
    let branch = |join: &str| {
        format!(
            "(SELECT {}\nFROM (assets a0, assets a1, relations r0)\n\
             WHERE a0.type = 'variable' AND {}{})",
            select, join, group_by
        )
    };
    (
        branch("r0.from_id = a0.id AND r0.to_id = a1.id"),
        branch("r0.from_id = a1.id AND r0.to_id = a0.id"),
    )
}

#[test]
fn distinct_count_of_a_node_counts_ids_across_union() {
    let (first, second) = either_branches(
        "a0.value AS a0_value, COUNT(DISTINCT a1.id) AS a1_id_COUNT",
        "\nGROUP BY a0_value",
    );
    assert_eq!(
        sql("MATCH (v:variable)--(n) RETURN v.value, COUNT(DISTINCT n)"),
        format!(
            "SELECT a0_value, SUM(a1_id_COUNT)\nFROM\n({}\nUNION ALL\n{}) AS x\nGROUP BY x.a0_value",
            first, second
        )
    );
}

#[test]
fn return_aliases_name_union_columns() {
    let (first, second) = either_branches(
        "'x' AS label, COUNT(*) AS total",
        "\nGROUP BY label",
    );
    assert_eq!(
        sql("MATCH (v:variable)--(n) RETURN 'x' AS label, COUNT(n) AS total"),
        format!(
            "SELECT label, SUM(total)\nFROM\n({}\nUNION ALL\n{}) AS x\nGROUP BY x.label",
            first, second
        )
    );
}

#[test]
fn return_aliases_are_kept_in_single_select() {
    let translation = translate(
        "MATCH (n:ip) RETURN n.value AS address, n",
        &TranslatorConfig::default(),
    )
    .unwrap();
    assert_eq!(
        translation.query,
        "SELECT a0.value AS address, a0.id, a0.value, a0.type\nFROM (assets a0)\nWHERE a0.type = 'ip'"
    );
    assert_eq!(translation.projections[0].alias, "address");
}

#[test]
fn embedded_aggregate_cannot_span_union_branches() {
    for cypher in [
        "MATCH (v:variable)--(n) RETURN COUNT(n) + 1",
        "MATCH (v:variable)--(n) RETURN v.value, COUNT(n) + 1",
    ] {
        assert!(
            matches!(
                translate(cypher, &TranslatorConfig::default()),
                Err(Error::Translation(TranslationError::Generator(
                    SqlGeneratorError::UnmergeableAggregate(_)
                )))
            ),
            "{}",
            cypher
        );
    }
    assert_eq!(
        sql("MATCH (v:variable)-->(n) RETURN COUNT(n) + 1"),
        "SELECT COUNT(*) + 1\nFROM (assets a0, assets a1, relations r0)\n\
         WHERE a0.type = 'variable' AND r0.from_id = a0.id AND r0.to_id = a1.id"
    );
}

#[test]
fn existential_pattern_correlates_outer_relation() {
    assert_eq!(
        sql("MATCH (a:ip)-[r]->(b:domain) WHERE (a)-[r]->() RETURN b.value"),
        "SELECT a1.value\nFROM (assets a0, assets a1, relations r0)\n\
         WHERE a0.type = 'ip' AND a1.type = 'domain' AND r0.from_id = a0.id AND r0.to_id = a1.id \
         AND EXISTS (SELECT 1\nFROM (assets aw0, assets aw1, relations rw0)\n\
         WHERE aw0.id = a0.id AND rw0.id = r0.id AND rw0.from_id = aw0.id AND rw0.to_id = aw1.id)"
    );
}

#[test_case("MATCH (n:ip), (n:name) RETURN n" ; "node relabelled")]
#[test_case("MATCH (a)-[r:x]->(b), (c)-[r:y]->(d) RETURN r" ; "relation relabelled")]
#[test_case("MATCH (a)-[r:x]->(b) WHERE (a)-[r:y]->(b) RETURN a" ; "relation relabelled in existential")]
#[test_case("MATCH (n:ip) WHERE (n:name)-->() RETURN n" ; "node relabelled in existential")]
fn rejects_conflicting_labels(cypher: &str) {
    assert!(matches!(
        translate(cypher, &TranslatorConfig::default()),
        Err(Error::Translation(TranslationError::Binding(
            QueryGraphError::VariableTypeConflict { .. }
        )))
    ));
}

#[test]
fn rejects_unknown_variables() {
    let error = translate("MATCH (n) RETURN m.value", &TranslatorConfig::default()).unwrap_err();
    assert!(error.to_string().contains("`m`"), "{}", error);
}

#[test]
fn rejects_skip_without_limit() {
    assert!(matches!(
        translate("MATCH (n) RETURN n SKIP 3", &TranslatorConfig::default()),
        Err(Error::Translation(TranslationError::SkipWithoutLimit))
    ));
}

#[test]
fn parse_failures_are_reported_as_parse_errors() {
    assert!(matches!(
        translate("MATCH (n RETURN n", &TranslatorConfig::default()),
        Err(Error::Parse(_))
    ));
}

#[test]
fn translation_is_deterministic() {
    let cypher = "MATCH (a:ip)-[:resolves]->(d:domain)<-[:owns]-(o) WHERE o.value STARTS WITH 'acme' RETURN a, d.value";
    assert_eq!(sql(cypher), sql(cypher));
}
