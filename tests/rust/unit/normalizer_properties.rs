//! Property tests for WHERE normalization over boolean-valued leaves.

use graphkb::render_plan::AndOrExpression;
use proptest::prelude::*;

fn expression_tree() -> impl Strategy<Value = AndOrExpression> {
    let leaf = prop_oneof![
        Just(AndOrExpression::leaf("true")),
        Just(AndOrExpression::leaf("false")),
    ];
    leaf.prop_recursive(4, 24, 3, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(AndOrExpression::And),
            prop::collection::vec(inner, 0..4).prop_map(AndOrExpression::Or),
        ]
    })
}

/// An empty conjunction holds, an empty disjunction does not.
fn evaluate(expression: &AndOrExpression) -> bool {
    match expression {
        AndOrExpression::Leaf(fragment) => fragment == "true",
        AndOrExpression::And(children) => children.iter().all(evaluate),
        AndOrExpression::Or(children) => children.iter().any(evaluate),
    }
}

fn contains_or(expression: &AndOrExpression) -> bool {
    match expression {
        AndOrExpression::Leaf(_) => false,
        AndOrExpression::And(children) => children.iter().any(contains_or),
        AndOrExpression::Or(_) => true,
    }
}

proptest! {
    #[test]
    fn flatten_is_idempotent(expression in expression_tree()) {
        let once = expression.flatten();
        prop_assert_eq!(once.flatten(), once);
    }

    #[test]
    fn flatten_preserves_truth(expression in expression_tree()) {
        prop_assert_eq!(evaluate(&expression.flatten()), evaluate(&expression));
    }

    #[test]
    fn unwound_clauses_are_conjunctions(expression in expression_tree()) {
        for clause in expression.unwind_or() {
            prop_assert!(!contains_or(&clause), "clause still has a disjunction: {:?}", clause);
        }
    }

    #[test]
    fn unwinding_is_an_equivalent_disjunction(expression in expression_tree()) {
        let clauses = expression.unwind_or();
        prop_assert_eq!(clauses.iter().any(evaluate), evaluate(&expression));
    }
}
