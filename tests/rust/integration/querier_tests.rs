//! End-to-end querying against an in-memory executor that answers known
//! SQL texts with fixed rows.

use std::collections::HashMap;

use graphkb::config::TranslatorConfig;
use graphkb::querier::{
    Asset, Cursor, Querier, QuerierError, Relation, ResultValue, Row, SqlExecutor,
};
use graphkb::query_planner::{ProjectionKind, SqlTranslation};
use serde_json::{json, Value};

#[derive(Default)]
struct FixtureExecutor {
    answers: HashMap<String, Vec<Row>>,
}

impl FixtureExecutor {
    fn answer(mut self, sql: &str, rows: Vec<Row>) -> Self {
        self.answers.insert(sql.to_string(), rows);
        self
    }
}

impl SqlExecutor for FixtureExecutor {
    fn execute(&self, translation: &SqlTranslation) -> Result<Cursor<'_>, QuerierError> {
        let rows = self
            .answers
            .get(&translation.query)
            .ok_or_else(|| QuerierError::Execution(format!("no fixture for:\n{}", translation.query)))?;
        Ok(Box::new(rows.iter().cloned().map(Ok::<Row, QuerierError>)))
    }
}

const RESOLVES_SQL: &str = "SELECT a0.id, a0.value, a0.type, r0.id, r0.from_id, r0.to_id, r0.type, a1.value\n\
                            FROM (assets a0, assets a1, relations r0)\n\
                            WHERE a1.type = 'ip' AND r0.type = 'resolves' \
                            AND r0.from_id = a0.id AND r0.to_id = a1.id";

fn resolves_querier() -> Querier<FixtureExecutor> {
    let executor = FixtureExecutor::default().answer(
        RESOLVES_SQL,
        vec![
            vec![
                json!(1),
                json!("example.org"),
                json!("domain"),
                json!(10),
                json!(1),
                json!(2),
                json!("resolves"),
                json!("93.184.216.34"),
            ],
            vec![
                json!(3),
                json!("example.net"),
                json!("domain"),
                json!(11),
                json!(3),
                json!(2),
                json!("resolves"),
                json!("93.184.216.34"),
            ],
        ],
    );
    Querier::new(TranslatorConfig::default(), executor)
}

#[test]
fn test_rows_are_decoded_per_projection() {
    let result = resolves_querier()
        .query("MATCH (d)-[r:resolves]->(ip:ip) RETURN d, r, ip.value")
        .unwrap();

    let kinds: Vec<ProjectionKind> = result.projections.iter().map(|p| p.kind).collect();
    assert_eq!(
        kinds,
        vec![
            ProjectionKind::Node,
            ProjectionKind::Relationship,
            ProjectionKind::Scalar
        ]
    );
    assert_eq!(result.rows.len(), 2);
    assert_eq!(
        result.rows[0],
        vec![
            ResultValue::Asset(Asset {
                id: json!(1),
                value: json!("example.org"),
                asset_type: "domain".to_string(),
            }),
            ResultValue::Relation(Relation {
                id: json!(10),
                from_id: json!(1),
                to_id: json!(2),
                relation_type: "resolves".to_string(),
            }),
            ResultValue::Scalar(json!("93.184.216.34")),
        ]
    );
}

#[test]
fn test_results_serialize_as_plain_json() {
    let result = resolves_querier()
        .query("MATCH (d)-[r:resolves]->(ip:ip) RETURN d, r, ip.value")
        .unwrap();
    let rows = serde_json::to_value(&result.rows).unwrap();

    assert_eq!(
        rows[1],
        json!([
            {"id": 3, "value": "example.net", "type": "domain"},
            {"id": 11, "from_id": 3, "to_id": 2, "type": "resolves"},
            "93.184.216.34"
        ])
    );
    let projections = serde_json::to_value(&result.projections).unwrap();
    assert_eq!(projections[0], json!({"alias": "d", "kind": "node"}));
}

#[test]
fn test_executor_failures_propagate() {
    let result = resolves_querier().query("MATCH (n:org) RETURN n");
    assert!(matches!(result, Err(QuerierError::Execution(_))));
}

#[test]
fn test_short_rows_are_rejected() {
    let executor = FixtureExecutor::default().answer(
        "SELECT a0.id, a0.value, a0.type\nFROM (assets a0)\nWHERE a0.type = 'org'",
        vec![vec![json!(5), Value::Null]],
    );
    let querier = Querier::new(TranslatorConfig::default(), executor);

    assert_eq!(
        querier.query("MATCH (n:org) RETURN n").unwrap_err(),
        QuerierError::RowShape {
            expected: 3,
            found: 2
        }
    );
}

#[test]
fn test_translator_uses_querier_config() {
    let config = TranslatorConfig {
        assets_table: "kb_assets".to_string(),
        ..Default::default()
    };
    let querier = Querier::new(config, FixtureExecutor::default());
    assert_eq!(querier.translator().config().assets_table, "kb_assets");
}
