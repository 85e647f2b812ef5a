//! Runs translated queries through a caller-supplied SQL executor and turns
//! the flat result rows back into assets, relations and scalars.

use std::time::{Duration, Instant};

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::config::TranslatorConfig;
use crate::open_cypher_parser::parse_query;
use crate::query_planner::{Projection, ProjectionKind, SqlTranslation, TranslationError, Translator};

pub type Row = Vec<Value>;

/// Rows produced by an executor, in the column order of the SQL it ran.
pub type Cursor<'a> = Box<dyn Iterator<Item = Result<Row, QuerierError>> + 'a>;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum QuerierError {
    #[error("failed to parse query: {0}")]
    Parse(String),

    #[error(transparent)]
    Translation(#[from] TranslationError),

    #[error("query execution failed: {0}")]
    Execution(String),

    #[error("row has {found} cells, projections need {expected}")]
    RowShape { expected: usize, found: usize },

    #[error("cell {index} should hold a type name, found {found}")]
    InvalidTypeCell { index: usize, found: String },
}

/// The database boundary. Implementations run the SQL text of a
/// translation and stream back its rows.
pub trait SqlExecutor {
    fn execute(&self, translation: &SqlTranslation) -> Result<Cursor<'_>, QuerierError>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Asset {
    pub id: Value,
    pub value: Value,
    #[serde(rename = "type")]
    pub asset_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Relation {
    pub id: Value,
    pub from_id: Value,
    pub to_id: Value,
    #[serde(rename = "type")]
    pub relation_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResultValue {
    Asset(Asset),
    Relation(Relation),
    Scalar(Value),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Statistics {
    pub parsing: Duration,
    pub translation: Duration,
    pub execution: Duration,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    pub projections: Vec<Projection>,
    pub rows: Vec<Vec<ResultValue>>,
    pub statistics: Statistics,
}

/// Splits one flat row into one value per projection. Nodes take three
/// cells, relationships four, scalars one.
pub fn decode_row(projections: &[Projection], cells: Row) -> Result<Vec<ResultValue>, QuerierError> {
    let expected: usize = projections.iter().map(|p| p.kind.width()).sum();
    if cells.len() != expected {
        return Err(QuerierError::RowShape {
            expected,
            found: cells.len(),
        });
    }

    let mut cells = cells.into_iter().enumerate();
    let mut next = move || cells.next().ok_or(QuerierError::RowShape { expected, found: 0 });

    let mut decoded = Vec::with_capacity(projections.len());
    for projection in projections {
        let value = match projection.kind {
            ProjectionKind::Node => ResultValue::Asset(Asset {
                id: next()?.1,
                value: next()?.1,
                asset_type: type_name(next()?)?,
            }),
            ProjectionKind::Relationship => ResultValue::Relation(Relation {
                id: next()?.1,
                from_id: next()?.1,
                to_id: next()?.1,
                relation_type: type_name(next()?)?,
            }),
            ProjectionKind::Scalar => ResultValue::Scalar(next()?.1),
        };
        decoded.push(value);
    }
    Ok(decoded)
}

fn type_name((index, cell): (usize, Value)) -> Result<String, QuerierError> {
    match cell {
        Value::String(name) => Ok(name),
        other => Err(QuerierError::InvalidTypeCell {
            index,
            found: other.to_string(),
        }),
    }
}

pub struct Querier<E> {
    translator: Translator,
    executor: E,
}

impl<E: SqlExecutor> Querier<E> {
    pub fn new(config: TranslatorConfig, executor: E) -> Self {
        Querier {
            translator: Translator::new(config),
            executor,
        }
    }

    pub fn translator(&self) -> &Translator {
        &self.translator
    }

    /// Parses, translates and executes `cypher`, decoding every row.
    pub fn query(&self, cypher: &str) -> Result<QueryResult, QuerierError> {
        let started = Instant::now();
        let query = parse_query(cypher).map_err(|e| QuerierError::Parse(e.to_string()))?;
        let parsing = started.elapsed();

        let started = Instant::now();
        let translation = self.translator.translate(&query)?;
        let translation_time = started.elapsed();

        let started = Instant::now();
        let rows = self
            .executor
            .execute(&translation)?
            .map(|row| row.and_then(|cells| decode_row(&translation.projections, cells)))
            .collect::<Result<Vec<_>, _>>()?;
        let execution = started.elapsed();

        let statistics = Statistics {
            parsing,
            translation: translation_time,
            execution,
        };
        log::info!(
            "query returned {} rows (parsing {:?}, translation {:?}, execution {:?})",
            rows.len(),
            statistics.parsing,
            statistics.translation,
            statistics.execution
        );

        Ok(QueryResult {
            projections: translation.projections,
            rows,
            statistics,
        })
    }
}
