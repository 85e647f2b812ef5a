//! Structural constraints derived from the query graph: label checks and
//! relation endpoint joins. Shared by the top-level translation and the
//! EXISTS sub-selects built while compiling WHERE predicates.

use crate::render_plan::AndOrExpression;

use super::query_graph::Direction;

/// `alias.type = 'l1' OR alias.type = 'l2' ...`, or nothing for an untyped slot.
pub fn label_constraint(alias: &str, labels: &[String]) -> Option<AndOrExpression> {
    if labels.is_empty() {
        return None;
    }
    Some(AndOrExpression::Or(
        labels
            .iter()
            .map(|label| AndOrExpression::leaf(format!("{}.type = '{}'", alias, label)))
            .collect(),
    ))
}

/// Joins relation `relation` to its endpoints according to `direction`.
pub fn direction_constraint(
    relation: &str,
    left: &str,
    right: &str,
    direction: Direction,
) -> AndOrExpression {
    match direction {
        Direction::Right => outgoing(relation, left, right),
        Direction::Left => outgoing(relation, right, left),
        Direction::Either => AndOrExpression::Or(vec![
            outgoing(relation, left, right),
            outgoing(relation, right, left),
        ]),
        Direction::Both => AndOrExpression::And(vec![
            outgoing(relation, left, right),
            outgoing(relation, right, left),
        ]),
    }
}

/// The relation goes from `from` to `to`.
pub fn outgoing(relation: &str, from: &str, to: &str) -> AndOrExpression {
    AndOrExpression::And(vec![
        AndOrExpression::leaf(format!("{}.from_id = {}.id", relation, from)),
        AndOrExpression::leaf(format!("{}.to_id = {}.id", relation, to)),
    ])
}
