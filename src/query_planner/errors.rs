//! Error types for query graph construction and translation.

use thiserror::Error;

use crate::sql_generator::SqlGeneratorError;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum QueryGraphError {
    #[error("Redefinition of variable {variable} with different type")]
    VariableTypeConflict { variable: String },

    #[error("Variable {variable} is already bound to a {bound_as}")]
    VariableKindConflict {
        variable: String,
        bound_as: &'static str,
    },

    #[error("Variable `{0}` not found")]
    VariableNotFound(String),

    #[error("Relation endpoint {index} does not exist (graph has {node_count} nodes)")]
    DanglingEndpoint { index: usize, node_count: usize },

    #[error("Asset type `{0}` does not exist")]
    UnknownAssetType(String),

    #[error("Relation type `{0}` does not exist")]
    UnknownRelationType(String),
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum TranslationError {
    #[error("SKIP must be used together with LIMIT")]
    SkipWithoutLimit,

    #[error("{clause} expects a non-negative integer literal")]
    InvalidPagination { clause: &'static str },

    #[error(transparent)]
    Binding(#[from] QueryGraphError),

    #[error(transparent)]
    Generator(SqlGeneratorError),
}

/// Binding failures surface as [`TranslationError::Binding`] whether they
/// come from a MATCH pattern or from a pattern compiled inside an expression.
impl From<SqlGeneratorError> for TranslationError {
    fn from(error: SqlGeneratorError) -> Self {
        match error {
            SqlGeneratorError::Binding(binding) => TranslationError::Binding(binding),
            other => TranslationError::Generator(other),
        }
    }
}
