//! The query graph: every node and relation slot referenced by the MATCH
//! clauses of one query, plus the index resolving variable names to slots.
//!
//! Slots are identified by their position of first creation. Node `i` is
//! rendered with the SQL alias `a<i>` and relation `j` with `r<j>`.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::errors::QueryGraphError;

/// The clause that referenced a slot. `Where` carries the id of the
/// existential pattern that mentioned it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Scope {
    Match,
    Where(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Direction {
    Left,
    Right,
    Either,
    Both,
}

impl Direction {
    pub fn from_arrows(left_arrow: bool, right_arrow: bool) -> Self {
        match (left_arrow, right_arrow) {
            (false, false) => Direction::Either,
            (true, true) => Direction::Both,
            (true, false) => Direction::Left,
            (false, true) => Direction::Right,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum VariableKind {
    Node,
    Relation,
}

impl VariableKind {
    fn describe(self) -> &'static str {
        match self {
            VariableKind::Node => "node",
            VariableKind::Relation => "relation",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryNode {
    pub id: usize,
    pub labels: Vec<String>,
    pub scopes: BTreeSet<Scope>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryRelation {
    pub id: usize,
    pub labels: Vec<String>,
    pub left: usize,
    pub right: usize,
    pub direction: Direction,
    pub scopes: BTreeSet<Scope>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryGraph {
    nodes: Vec<QueryNode>,
    relations: Vec<QueryRelation>,
    variables: BTreeMap<String, (VariableKind, usize)>,
}

impl QueryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nodes(&self) -> &[QueryNode] {
        &self.nodes
    }

    pub fn relations(&self) -> &[QueryRelation] {
        &self.relations
    }

    /// Adds a node, or returns the existing one when `variable` is already
    /// bound to a node with a compatible label set.
    pub fn push_node(
        &mut self,
        labels: &[&str],
        variable: Option<&str>,
        scope: Scope,
    ) -> Result<usize, QueryGraphError> {
        let variable = variable.filter(|v| !v.is_empty());

        if let Some(name) = variable {
            if let Some(index) = self.rebind(name, VariableKind::Node, labels, scope)? {
                return Ok(index);
            }
        }

        let index = self.nodes.len();
        self.nodes.push(QueryNode {
            id: index,
            labels: labels.iter().map(|l| l.to_string()).collect(),
            scopes: BTreeSet::from([scope]),
        });
        if let Some(name) = variable {
            self.variables
                .insert(name.to_string(), (VariableKind::Node, index));
        }
        log::debug!("pushed node a{} labels={:?} variable={:?}", index, labels, variable);
        Ok(index)
    }

    /// Adds a relation between two existing nodes, deduplicating on the
    /// variable name the same way [`QueryGraph::push_node`] does.
    pub fn push_relation(
        &mut self,
        labels: &[&str],
        variable: Option<&str>,
        left: usize,
        right: usize,
        direction: Direction,
        scope: Scope,
    ) -> Result<usize, QueryGraphError> {
        for endpoint in [left, right] {
            if endpoint >= self.nodes.len() {
                return Err(QueryGraphError::DanglingEndpoint {
                    index: endpoint,
                    node_count: self.nodes.len(),
                });
            }
        }

        let variable = variable.filter(|v| !v.is_empty());

        if let Some(name) = variable {
            if let Some(index) = self.rebind(name, VariableKind::Relation, labels, scope)? {
                return Ok(index);
            }
        }

        let index = self.relations.len();
        self.relations.push(QueryRelation {
            id: index,
            labels: labels.iter().map(|l| l.to_string()).collect(),
            left,
            right,
            direction,
            scopes: BTreeSet::from([scope]),
        });
        if let Some(name) = variable {
            self.variables
                .insert(name.to_string(), (VariableKind::Relation, index));
        }
        log::debug!(
            "pushed relation r{} labels={:?} a{} -> a{} ({:?})",
            index,
            labels,
            left,
            right,
            direction
        );
        Ok(index)
    }

    pub fn find_variable(&self, name: &str) -> Result<(VariableKind, usize), QueryGraphError> {
        self.variables
            .get(name)
            .copied()
            .ok_or_else(|| QueryGraphError::VariableNotFound(name.to_string()))
    }

    /// References an already bound variable again from `scope`.
    ///
    /// Returns `None` when `name` is unbound. The variable must have been
    /// bound with the same kind, and `labels`, when given, must match the
    /// labels it was bound with.
    pub fn rebind(
        &mut self,
        name: &str,
        kind: VariableKind,
        labels: &[&str],
        scope: Scope,
    ) -> Result<Option<usize>, QueryGraphError> {
        let Some(index) = self.existing_slot(name, kind)? else {
            return Ok(None);
        };
        let (existing, scopes) = match kind {
            VariableKind::Node => {
                let node = &mut self.nodes[index];
                (&node.labels, &mut node.scopes)
            }
            VariableKind::Relation => {
                let relation = &mut self.relations[index];
                (&relation.labels, &mut relation.scopes)
            }
        };
        check_labels(name, existing, labels)?;
        scopes.insert(scope);
        Ok(Some(index))
    }

    fn existing_slot(
        &self,
        name: &str,
        expected: VariableKind,
    ) -> Result<Option<usize>, QueryGraphError> {
        match self.variables.get(name) {
            None => Ok(None),
            Some((kind, index)) if *kind == expected => Ok(Some(*index)),
            Some((kind, _)) => Err(QueryGraphError::VariableKindConflict {
                variable: name.to_string(),
                bound_as: kind.describe(),
            }),
        }
    }
}

fn check_labels(variable: &str, existing: &[String], requested: &[&str]) -> Result<(), QueryGraphError> {
    if requested.is_empty() {
        return Ok(());
    }
    let existing: BTreeSet<&str> = existing.iter().map(String::as_str).collect();
    let requested: BTreeSet<&str> = requested.iter().copied().collect();
    if existing != requested {
        return Err(QueryGraphError::VariableTypeConflict {
            variable: variable.to_string(),
        });
    }
    Ok(())
}
