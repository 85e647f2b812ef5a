//! Boolean constraint trees and their normalization.
//!
//! Every constraint the translator produces (label checks, relation
//! endpoint joins, compiled WHERE predicates) ends up as a leaf of an
//! [`AndOrExpression`]. Before assembly the tree is unwound into a list of
//! purely conjunctive clauses: one SQL branch per clause, unioned together.

use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum AndOrExpression {
    /// A literal SQL fragment.
    Leaf(String),
    And(Vec<AndOrExpression>),
    Or(Vec<AndOrExpression>),
}

impl AndOrExpression {
    pub fn leaf(fragment: impl Into<String>) -> Self {
        AndOrExpression::Leaf(fragment.into())
    }

    /// Conjunction with no children: holds for every row.
    pub fn always() -> Self {
        AndOrExpression::And(vec![])
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, AndOrExpression::Leaf(_))
    }

    /// Distributes OR over AND.
    ///
    /// The result is a list of AND-only trees whose disjunction is equivalent
    /// to `self`. A leaf becomes a single AND-wrapped clause, an OR
    /// concatenates the clauses of its children and an AND folds the cross
    /// product of its children's clauses from left to right.
    pub fn unwind_or(&self) -> Vec<AndOrExpression> {
        match self {
            AndOrExpression::Leaf(_) => vec![AndOrExpression::And(vec![self.clone()])],
            AndOrExpression::Or(children) => {
                children.iter().flat_map(|child| child.unwind_or()).collect()
            }
            AndOrExpression::And(children) => {
                let mut acc: Option<Vec<AndOrExpression>> = None;
                for child in children {
                    let unwound = child.unwind_or();
                    acc = Some(match acc {
                        None => unwound,
                        Some(previous) => cross_product(&previous, &unwound),
                    });
                }
                let clauses = acc.unwrap_or_else(|| vec![AndOrExpression::always()]);
                log::trace!("unwound AND node into {} clause(s)", clauses.len());
                clauses
            }
        }
    }

    /// Merges nested nodes carrying the same operator and collapses
    /// single-child nodes into their child. Idempotent.
    pub fn flatten(&self) -> AndOrExpression {
        match self {
            AndOrExpression::Leaf(_) => self.clone(),
            AndOrExpression::And(children) => {
                let mut merged = Vec::with_capacity(children.len());
                for child in children {
                    match child.flatten() {
                        AndOrExpression::And(grand_children) => merged.extend(grand_children),
                        other => merged.push(other),
                    }
                }
                collapse(merged, AndOrExpression::And)
            }
            AndOrExpression::Or(children) => {
                let mut merged = Vec::with_capacity(children.len());
                for child in children {
                    match child.flatten() {
                        AndOrExpression::Or(grand_children) => merged.extend(grand_children),
                        other => merged.push(other),
                    }
                }
                collapse(merged, AndOrExpression::Or)
            }
        }
    }

    /// Renders the tree as if it were nested inside another operator, i.e.
    /// multi-child nodes come back parenthesized.
    pub fn to_nested_sql(&self) -> String {
        self.render(false)
    }

    fn render(&self, outermost: bool) -> String {
        let (children, separator) = match self {
            AndOrExpression::Leaf(fragment) => return fragment.clone(),
            AndOrExpression::And(children) => (children, " AND "),
            AndOrExpression::Or(children) => (children, " OR "),
        };

        let non_empty: Vec<&AndOrExpression> = children
            .iter()
            .filter(|child| !child.renders_empty())
            .collect();

        match non_empty.as_slice() {
            [] => String::new(),
            [only] => only.render(outermost),
            many => {
                let joined = many
                    .iter()
                    .map(|child| child.render(false))
                    .collect::<Vec<_>>()
                    .join(separator);
                if outermost {
                    joined
                } else {
                    format!("({})", joined)
                }
            }
        }
    }

    fn renders_empty(&self) -> bool {
        match self {
            AndOrExpression::Leaf(fragment) => fragment.is_empty(),
            AndOrExpression::And(children) | AndOrExpression::Or(children) => {
                children.iter().all(|child| child.renders_empty())
            }
        }
    }
}

impl fmt::Display for AndOrExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render(true))
    }
}

fn cross_product(left: &[AndOrExpression], right: &[AndOrExpression]) -> Vec<AndOrExpression> {
    let mut out = Vec::with_capacity(left.len() * right.len());
    for l in left {
        for r in right {
            out.push(AndOrExpression::And(vec![l.clone(), r.clone()]));
        }
    }
    out
}

fn collapse(
    mut children: Vec<AndOrExpression>,
    make: fn(Vec<AndOrExpression>) -> AndOrExpression,
) -> AndOrExpression {
    if children.len() == 1 {
        if let Some(only) = children.pop() {
            return only;
        }
    }
    make(children)
}
