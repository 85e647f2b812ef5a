//! Compiles Cypher expressions into SQL fragments.
//!
//! Each level of the expression tree returns a [`CompiledExpression`]
//! describing the fragment it produced; parents only combine what their
//! children return. Variables resolve through the query graph: node `i`
//! reads from alias `a<i>`, relation `j` from `r<j>`.

use std::collections::{BTreeMap, BTreeSet};

use crate::config::TranslatorConfig;
use crate::open_cypher_parser::ast::{
    AddSubExpression, AndExpression, Atom, ComparisonExpression, Expression, FunctionInvocation,
    Literal, MultiplyDivideExpression, NodePattern, NotExpression, PatternElement,
    PowerExpression, PropertyOrLabels, RelationshipPattern, StringOperator,
    StringOperatorExpression, UnaryExpression, XorExpression,
};
use crate::query_planner::constraints::{direction_constraint, label_constraint};
use crate::query_planner::query_graph::{Direction, QueryGraph, Scope, VariableKind};
use crate::query_planner::ProjectionKind;
use crate::render_plan::{AndOrExpression, SqlFrom, SqlFunction, SqlProjection, SqlStructure};

use super::errors::SqlGeneratorError;
use super::to_sql_query::ToSql;

/// Result of compiling one expression node.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledExpression {
    pub sql: String,
    pub kind: ProjectionKind,
    /// Output columns when projected. Several for whole nodes and relations.
    pub columns: Vec<String>,
    /// The slot this expression denotes when it is a bare variable.
    pub slot: Option<(VariableKind, usize)>,
    /// Set when the whole expression is one aggregate call: the wrapper
    /// and the argument it applies to.
    pub aggregate: Option<(SqlFunction, String)>,
    pub uses_aggregation: bool,
    /// Every graph slot the expression reads.
    pub variables: BTreeSet<(VariableKind, usize)>,
    /// The fragment is an OR at its top level and needs parentheses before
    /// being AND-ed with anything else.
    pub disjunctive: bool,
}

impl CompiledExpression {
    fn scalar(sql: String) -> Self {
        CompiledExpression {
            columns: vec![sql.clone()],
            sql,
            kind: ProjectionKind::Scalar,
            slot: None,
            aggregate: None,
            uses_aggregation: false,
            variables: BTreeSet::new(),
            disjunctive: false,
        }
    }

    /// A scalar built out of `parts`, inheriting what they read.
    fn combine(sql: String, parts: &[CompiledExpression]) -> Self {
        let mut combined = CompiledExpression::scalar(sql);
        for part in parts {
            combined.uses_aggregation |= part.uses_aggregation;
            combined.variables.extend(part.variables.iter().copied());
        }
        combined
    }

    /// The fragment to use as an operator operand. Whole nodes and
    /// relations are compared by id.
    fn operand(&self) -> &str {
        match self.slot {
            Some(_) => &self.columns[0],
            None => &self.sql,
        }
    }
}

/// Stateful only in the WITH aliases it has been given and the counter
/// numbering existential patterns.
pub struct ExpressionCompiler<'c> {
    config: &'c TranslatorConfig,
    aliases: BTreeMap<String, CompiledExpression>,
    next_pattern_id: usize,
}

impl<'c> ExpressionCompiler<'c> {
    pub fn new(config: &'c TranslatorConfig) -> Self {
        ExpressionCompiler {
            config,
            aliases: BTreeMap::new(),
            next_pattern_id: 0,
        }
    }

    /// Makes `name` resolve to `compiled` wherever it is not a graph variable.
    pub fn bind_alias(&mut self, name: &str, compiled: CompiledExpression) {
        self.aliases.insert(name.to_string(), compiled);
    }

    /// Compiles a top-level expression. A fully parenthesized expression is
    /// returned without its outer parentheses.
    pub fn compile(
        &mut self,
        graph: &mut QueryGraph,
        expression: &Expression<'_>,
    ) -> Result<CompiledExpression, SqlGeneratorError> {
        if let Some(term) = expression.as_term() {
            if let (Atom::Parenthesized(inner), true) = (&term.atom, term.property_path.is_empty()) {
                return self.compile(graph, inner);
            }
        }
        self.compile_or(graph, expression)
    }

    fn compile_or(
        &mut self,
        graph: &mut QueryGraph,
        expression: &Expression<'_>,
    ) -> Result<CompiledExpression, SqlGeneratorError> {
        let mut parts = expression
            .xors
            .iter()
            .map(|xor| self.compile_xor(graph, xor))
            .collect::<Result<Vec<_>, _>>()?;
        match parts.len() {
            0 => Err(malformed("empty expression")),
            1 => Ok(parts.remove(0)),
            _ => {
                let sql = join_sql(&parts, " OR ");
                let mut combined = CompiledExpression::combine(sql, &parts);
                combined.disjunctive = true;
                Ok(combined)
            }
        }
    }

    fn compile_xor(
        &mut self,
        graph: &mut QueryGraph,
        xor: &XorExpression<'_>,
    ) -> Result<CompiledExpression, SqlGeneratorError> {
        match xor.ands.as_slice() {
            [] => Err(malformed("empty XOR operand list")),
            [and] => self.compile_and(graph, and),
            _ => Err(malformed("XOR is not supported")),
        }
    }

    fn compile_and(
        &mut self,
        graph: &mut QueryGraph,
        and: &AndExpression<'_>,
    ) -> Result<CompiledExpression, SqlGeneratorError> {
        let mut parts = and
            .nots
            .iter()
            .map(|not| self.compile_not(graph, not))
            .collect::<Result<Vec<_>, _>>()?;
        match parts.len() {
            0 => Err(malformed("empty AND operand list")),
            1 => Ok(parts.remove(0)),
            _ => Ok(CompiledExpression::combine(join_sql(&parts, " AND "), &parts)),
        }
    }

    fn compile_not(
        &mut self,
        graph: &mut QueryGraph,
        not: &NotExpression<'_>,
    ) -> Result<CompiledExpression, SqlGeneratorError> {
        let inner = self.compile_comparison(graph, &not.comparison)?;
        if !not.negated {
            return Ok(inner);
        }
        let sql = format!("NOT {}", inner.operand());
        Ok(CompiledExpression::combine(sql, &[inner]))
    }

    fn compile_comparison(
        &mut self,
        graph: &mut QueryGraph,
        comparison: &ComparisonExpression<'_>,
    ) -> Result<CompiledExpression, SqlGeneratorError> {
        let lhs = self.compile_add_sub(graph, &comparison.lhs)?;
        match comparison.partials.as_slice() {
            [] => Ok(lhs),
            [(operator, rhs)] => {
                let rhs = self.compile_add_sub(graph, rhs)?;
                let sql = format!("{} {} {}", lhs.operand(), operator, rhs.operand());
                Ok(CompiledExpression::combine(sql, &[lhs, rhs]))
            }
            _ => Err(malformed("chained comparisons are not supported")),
        }
    }

    fn compile_add_sub(
        &mut self,
        graph: &mut QueryGraph,
        expression: &AddSubExpression<'_>,
    ) -> Result<CompiledExpression, SqlGeneratorError> {
        let first = self.compile_multiply_divide(graph, &expression.first)?;
        if expression.rest.is_empty() {
            return Ok(first);
        }
        let mut sql = first.operand().to_string();
        let mut parts = vec![first];
        for (operator, operand) in &expression.rest {
            let operand = self.compile_multiply_divide(graph, operand)?;
            sql = format!("{} {} {}", sql, operator, operand.operand());
            parts.push(operand);
        }
        Ok(CompiledExpression::combine(sql, &parts))
    }

    fn compile_multiply_divide(
        &mut self,
        graph: &mut QueryGraph,
        expression: &MultiplyDivideExpression<'_>,
    ) -> Result<CompiledExpression, SqlGeneratorError> {
        let first = self.compile_power(graph, &expression.first)?;
        if expression.rest.is_empty() {
            return Ok(first);
        }
        let mut sql = first.operand().to_string();
        let mut parts = vec![first];
        for (operator, operand) in &expression.rest {
            let operand = self.compile_power(graph, operand)?;
            sql = format!("{} {} {}", sql, operator, operand.operand());
            parts.push(operand);
        }
        Ok(CompiledExpression::combine(sql, &parts))
    }

    fn compile_power(
        &mut self,
        graph: &mut QueryGraph,
        expression: &PowerExpression<'_>,
    ) -> Result<CompiledExpression, SqlGeneratorError> {
        let mut parts = expression
            .operands
            .iter()
            .map(|operand| self.compile_unary(graph, operand))
            .collect::<Result<Vec<_>, _>>()?;
        if parts.len() == 1 {
            return Ok(parts.remove(0));
        }
        let mut operands = parts.iter().map(CompiledExpression::operand);
        let first = operands
            .next()
            .ok_or_else(|| malformed("empty power expression"))?;
        let sql = operands.fold(first.to_string(), |base, exponent| {
            format!("POWER({}, {})", base, exponent)
        });
        Ok(CompiledExpression::combine(sql, &parts))
    }

    fn compile_unary(
        &mut self,
        graph: &mut QueryGraph,
        expression: &UnaryExpression<'_>,
    ) -> Result<CompiledExpression, SqlGeneratorError> {
        let operand = self.compile_string_operator(graph, &expression.operand)?;
        if !expression.negative {
            return Ok(operand);
        }
        let sql = format!("-{}", operand.operand());
        Ok(CompiledExpression::combine(sql, &[operand]))
    }

    fn compile_string_operator(
        &mut self,
        graph: &mut QueryGraph,
        expression: &StringOperatorExpression<'_>,
    ) -> Result<CompiledExpression, SqlGeneratorError> {
        let lhs = self.compile_term(graph, &expression.lhs)?;
        let (operator, rhs) = match expression.operations.as_slice() {
            [] => return Ok(lhs),
            [operation] => operation,
            _ => return Err(malformed("only one string operator may apply to an operand")),
        };

        let text = match (&rhs.atom, rhs.property_path.is_empty()) {
            (Atom::Literal(Literal::String(text)), true) => text,
            _ => {
                return Err(SqlGeneratorError::InvalidStringOperatorOperand(
                    rhs.to_string(),
                ))
            }
        };
        let pattern = match operator {
            StringOperator::StartsWith => format!("{}%", text),
            StringOperator::EndsWith => format!("%{}", text),
            StringOperator::Contains => format!("%{}%", text),
        };
        let sql = format!("{} LIKE '{}'", lhs.operand(), pattern);
        Ok(CompiledExpression::combine(sql, &[lhs]))
    }

    fn compile_term(
        &mut self,
        graph: &mut QueryGraph,
        term: &PropertyOrLabels<'_>,
    ) -> Result<CompiledExpression, SqlGeneratorError> {
        let path = &term.property_path;
        match &term.atom {
            Atom::Variable(name) => self.compile_variable(graph, name, path),
            Atom::Literal(literal) => {
                reject_property_path(term)?;
                Ok(CompiledExpression::scalar(literal_sql(literal)))
            }
            Atom::FunctionInvocation(function) => {
                reject_property_path(term)?;
                self.compile_function(graph, function)
            }
            Atom::CountAll => {
                reject_property_path(term)?;
                let mut compiled = CompiledExpression::scalar("COUNT(*)".to_string());
                compiled.aggregate = Some((SqlFunction::count(false), "*".to_string()));
                compiled.uses_aggregation = true;
                Ok(compiled)
            }
            Atom::Parenthesized(inner) => {
                reject_property_path(term)?;
                let inner = self.compile(graph, inner)?;
                if inner.slot.is_some() {
                    return Ok(inner);
                }
                let sql = format!("({})", inner.sql);
                Ok(CompiledExpression::combine(sql, &[inner]))
            }
            Atom::RelationshipsPattern(pattern) => {
                reject_property_path(term)?;
                self.compile_existential(graph, pattern)
            }
        }
    }

    fn compile_variable(
        &self,
        graph: &QueryGraph,
        name: &str,
        path: &[&str],
    ) -> Result<CompiledExpression, SqlGeneratorError> {
        let slot = match graph.find_variable(name) {
            Ok(slot) => slot,
            Err(not_found) => {
                let Some(alias) = self.aliases.get(name) else {
                    if path.is_empty() {
                        // Not a graph variable: emitted as a bare column name.
                        return Ok(CompiledExpression::scalar(name.to_string()));
                    }
                    return Err(not_found.into());
                };
                if path.is_empty() {
                    return Ok(alias.clone());
                }
                alias.slot.ok_or(not_found)?
            }
        };

        let (kind, index) = slot;
        let alias = slot_alias(kind, index);
        let mut compiled = if path.is_empty() {
            let columns: Vec<String> = slot_columns(kind)
                .iter()
                .map(|column| format!("{}.{}", alias, column))
                .collect();
            CompiledExpression {
                sql: columns.join(", "),
                kind: match kind {
                    VariableKind::Node => ProjectionKind::Node,
                    VariableKind::Relation => ProjectionKind::Relationship,
                },
                columns,
                slot: Some(slot),
                aggregate: None,
                uses_aggregation: false,
                variables: BTreeSet::new(),
                disjunctive: false,
            }
        } else {
            CompiledExpression::scalar(format!("{}.{}", alias, path.join(".")))
        };
        compiled.variables.insert(slot);
        Ok(compiled)
    }

    fn compile_function(
        &mut self,
        graph: &mut QueryGraph,
        function: &FunctionInvocation<'_>,
    ) -> Result<CompiledExpression, SqlGeneratorError> {
        if !function.name.eq_ignore_ascii_case("COUNT") {
            return Err(SqlGeneratorError::UnsupportedFunction(
                function.name.to_string(),
            ));
        }
        let [argument] = function.arguments.as_slice() else {
            return Err(malformed("COUNT expects exactly one argument"));
        };

        let argument = self.compile(graph, argument)?;
        if argument.uses_aggregation {
            return Err(malformed("aggregate functions cannot be nested"));
        }

        // Whole variables are counted by row, or by id when DISTINCT.
        let counted = match (argument.slot, function.distinct) {
            (Some(_), false) => "*".to_string(),
            (Some(_), true) => argument.operand().to_string(),
            (None, _) => argument.sql.clone(),
        };
        let sql = format!(
            "COUNT({}{})",
            if function.distinct { "DISTINCT " } else { "" },
            counted
        );
        let mut compiled = CompiledExpression::combine(sql, &[argument]);
        compiled.aggregate = Some((SqlFunction::count(function.distinct), counted));
        compiled.uses_aggregation = true;
        Ok(compiled)
    }

    /// `EXISTS (SELECT 1 ...)` over the pattern. Pattern slots get their own
    /// `aw`/`rw` aliases; slots bound in the outer query are tied to it by id.
    fn compile_existential(
        &mut self,
        graph: &mut QueryGraph,
        pattern: &PatternElement<'_>,
    ) -> Result<CompiledExpression, SqlGeneratorError> {
        let scope = Scope::Where(self.next_pattern_id);
        self.next_pattern_id += 1;

        let mut sub = ExistentialPattern {
            outer: graph,
            inner: QueryGraph::new(),
            scope,
            correlations: vec![],
            correlated: BTreeSet::new(),
            touched: BTreeSet::new(),
        };
        let mut previous = sub.push_node(&pattern.node)?;
        for hop in &pattern.chain {
            let next = sub.push_node(&hop.node)?;
            sub.push_relation(&hop.relationship, previous, next)?;
            previous = next;
        }

        let ExistentialPattern {
            inner,
            correlations,
            touched,
            ..
        } = sub;

        let mut from = vec![];
        let mut constraints = correlations;
        for node in inner.nodes() {
            let alias = format!("aw{}", node.id);
            constraints.extend(label_constraint(&alias, &node.labels));
            from.push(SqlFrom::table(self.config.assets_table.clone(), alias));
        }
        for relation in inner.relations() {
            let alias = format!("rw{}", relation.id);
            constraints.extend(label_constraint(&alias, &relation.labels));
            constraints.push(direction_constraint(
                &alias,
                &format!("aw{}", relation.left),
                &format!("aw{}", relation.right),
                relation.direction,
            ));
            from.push(SqlFrom::table(self.config.relations_table.clone(), alias));
        }

        // A single conjunctive leaf keeps the sub-select a plain SELECT.
        let condition = AndOrExpression::And(constraints).flatten().to_string();
        let structure = SqlStructure {
            projections: vec![SqlProjection::column("1")],
            from,
            where_expression: AndOrExpression::leaf(condition),
            ..Default::default()
        };
        let sql = format!("EXISTS ({})", structure.to_sql()?);
        log::debug!("compiled existential pattern: {}", sql);

        let mut compiled = CompiledExpression::scalar(sql);
        compiled.variables = touched;
        Ok(compiled)
    }
}

struct ExistentialPattern<'g> {
    outer: &'g mut QueryGraph,
    inner: QueryGraph,
    scope: Scope,
    correlations: Vec<AndOrExpression>,
    correlated: BTreeSet<(VariableKind, usize)>,
    touched: BTreeSet<(VariableKind, usize)>,
}

impl ExistentialPattern<'_> {
    fn push_node(&mut self, node: &NodePattern<'_>) -> Result<usize, SqlGeneratorError> {
        let index = self
            .inner
            .push_node(&node.labels, node.variable, Scope::Match)?;
        if let Some(name) = node.variable {
            if let Some(outer) =
                self.outer
                    .rebind(name, VariableKind::Node, &node.labels, self.scope)?
            {
                self.correlate(VariableKind::Node, index, outer);
            }
        }
        Ok(index)
    }

    fn push_relation(
        &mut self,
        relationship: &RelationshipPattern<'_>,
        left: usize,
        right: usize,
    ) -> Result<(), SqlGeneratorError> {
        let direction = Direction::from_arrows(relationship.left_arrow, relationship.right_arrow);
        let index = self.inner.push_relation(
            &relationship.labels,
            relationship.variable,
            left,
            right,
            direction,
            Scope::Match,
        )?;
        if let Some(name) = relationship.variable {
            if let Some(outer) = self.outer.rebind(
                name,
                VariableKind::Relation,
                &relationship.labels,
                self.scope,
            )? {
                self.correlate(VariableKind::Relation, index, outer);
            }
        }
        Ok(())
    }

    fn correlate(&mut self, kind: VariableKind, inner: usize, outer: usize) {
        self.touched.insert((kind, outer));
        if self.correlated.insert((kind, inner)) {
            let (inner_alias, outer_alias) = match kind {
                VariableKind::Node => (format!("aw{}", inner), format!("a{}", outer)),
                VariableKind::Relation => (format!("rw{}", inner), format!("r{}", outer)),
            };
            self.correlations.push(AndOrExpression::leaf(format!(
                "{}.id = {}.id",
                inner_alias, outer_alias
            )));
        }
    }
}

pub fn slot_alias(kind: VariableKind, index: usize) -> String {
    match kind {
        VariableKind::Node => format!("a{}", index),
        VariableKind::Relation => format!("r{}", index),
    }
}

fn slot_columns(kind: VariableKind) -> &'static [&'static str] {
    match kind {
        VariableKind::Node => &["id", "value", "type"],
        VariableKind::Relation => &["id", "from_id", "to_id", "type"],
    }
}

fn literal_sql(literal: &Literal<'_>) -> String {
    match literal {
        Literal::String(text) => format!("'{}'", text),
        Literal::Integer(value) => value.to_string(),
        Literal::Float(value) => format!("{:.6}", value),
        Literal::Boolean(value) => value.to_string(),
        Literal::Null => "NULL".to_string(),
    }
}

fn join_sql(parts: &[CompiledExpression], separator: &str) -> String {
    parts
        .iter()
        .map(CompiledExpression::operand)
        .collect::<Vec<_>>()
        .join(separator)
}

fn reject_property_path(term: &PropertyOrLabels<'_>) -> Result<(), SqlGeneratorError> {
    if term.property_path.is_empty() {
        Ok(())
    } else {
        Err(malformed(&format!(
            "property access is only supported on variables: `{}`",
            term
        )))
    }
}

fn malformed(message: &str) -> SqlGeneratorError {
    SqlGeneratorError::MalformedExpression(message.to_string())
}
