//! Query planning: builds the query graph for a parsed query and drives the
//! expression compiler and SQL assembler to produce one SQL statement.

use serde::{Deserialize, Serialize};

use crate::config::TranslatorConfig;
use crate::open_cypher_parser::ast::Query;

pub mod constraints;
pub mod errors;
pub mod query_graph;
mod translator;

pub use errors::{QueryGraphError, TranslationError};
pub use translator::Translator;

/// What a projected expression yields per row, and so how many columns it
/// occupies: three for a node, four for a relationship, one otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionKind {
    Node,
    Relationship,
    Scalar,
}

impl ProjectionKind {
    pub fn width(self) -> usize {
        match self {
            ProjectionKind::Node => 3,
            ProjectionKind::Relationship => 4,
            ProjectionKind::Scalar => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Projection {
    pub alias: String,
    pub kind: ProjectionKind,
}

/// The generated statement plus what each RETURN item maps to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqlTranslation {
    pub query: String,
    pub projections: Vec<Projection>,
}

pub fn translate_query(
    query: &Query<'_>,
    config: &TranslatorConfig,
) -> Result<SqlTranslation, TranslationError> {
    Translator::new(config.clone()).translate(query)
}
