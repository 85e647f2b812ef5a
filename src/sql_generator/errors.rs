use thiserror::Error;

use crate::query_planner::errors::QueryGraphError;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SqlGeneratorError {
    #[error("Function `{0}` is not supported (only COUNT is)")]
    UnsupportedFunction(String),

    #[error("String operators expect a string literal on the right-hand side, got `{0}`")]
    InvalidStringOperatorOperand(String),

    #[error("Malformed expression: {0}")]
    MalformedExpression(String),

    #[error("Projection `{0}` needs an alias to be grouped across union branches")]
    MissingProjectionAlias(String),

    #[error("Aggregate inside `{0}` cannot be combined across union branches")]
    UnmergeableAggregate(String),

    #[error(transparent)]
    Binding(#[from] QueryGraphError),
}
