//! graphkb - Cypher to SQL translation for a graph knowledge base
//!
//! The knowledge base keeps its graph in two tables: assets (the nodes) and
//! relations (the edges). This crate provides:
//! - A parser for a read-only Cypher subset
//! - A query graph binding pattern variables to table aliases
//! - Expression compilation and WHERE normalization
//! - SQL assembly, including UNION expansion of disjunctive filters
//! - An executor boundary that decodes rows back into graph values

pub mod config;
pub mod open_cypher_parser;
pub mod querier;
pub mod query_planner;
pub mod render_plan;
pub mod sql_generator;

use config::TranslatorConfig;
use query_planner::SqlTranslation;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to parse query: {0}")]
    Parse(String),

    #[error(transparent)]
    Translation(#[from] query_planner::TranslationError),
}

/// Parses and translates `cypher` in one step.
pub fn translate(cypher: &str, config: &TranslatorConfig) -> Result<SqlTranslation, Error> {
    let query = open_cypher_parser::parse_query(cypher).map_err(|e| Error::Parse(e.to_string()))?;
    Ok(query_planner::translate_query(&query, config)?)
}
