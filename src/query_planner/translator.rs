use std::collections::BTreeSet;

use crate::config::TranslatorConfig;
use crate::open_cypher_parser::ast::{
    Atom, Expression, Literal, PatternElement, ProjectionBody, Query, WithClause,
};
use crate::render_plan::{AndOrExpression, SqlFrom, SqlProjection, SqlStructure};
use crate::sql_generator::{
    generate_sql, CompiledExpression, ExpressionCompiler, SqlGeneratorError, SQL_IDENTIFIER,
};

use super::constraints::{direction_constraint, label_constraint};
use super::errors::{QueryGraphError, TranslationError};
use super::query_graph::{Direction, QueryGraph, Scope, VariableKind};
use super::{Projection, SqlTranslation};

pub struct Translator {
    config: TranslatorConfig,
}

/// WHERE predicates gathered across clauses, and the nodes they mention.
#[derive(Default)]
struct Filters {
    predicates: Vec<AndOrExpression>,
    constrained_nodes: BTreeSet<usize>,
}

impl Filters {
    fn add(&mut self, compiled: CompiledExpression) {
        for (kind, index) in &compiled.variables {
            if *kind == VariableKind::Node {
                self.constrained_nodes.insert(*index);
            }
        }
        let fragment = if compiled.disjunctive {
            format!("({})", compiled.sql)
        } else {
            compiled.sql
        };
        self.predicates.push(AndOrExpression::leaf(fragment));
    }
}

struct ProjectionPlan {
    columns: Vec<SqlProjection>,
    group_by: Vec<usize>,
    aggregated: bool,
    projections: Vec<Projection>,
}

impl Translator {
    pub fn new(config: TranslatorConfig) -> Self {
        Translator { config }
    }

    pub fn config(&self) -> &TranslatorConfig {
        &self.config
    }

    pub fn translate(&self, query: &Query<'_>) -> Result<SqlTranslation, TranslationError> {
        let mut graph = QueryGraph::new();
        let mut compiler = ExpressionCompiler::new(&self.config);
        let mut filters = Filters::default();

        for clause in &query.match_clauses {
            for element in &clause.pattern_elements {
                push_pattern_element(&mut graph, element)?;
            }
            if let Some(predicate) = &clause.where_clause {
                filters.add(compiler.compile(&mut graph, predicate)?);
            }
        }

        for clause in &query.with_clauses {
            self.bind_with_clause(&mut graph, &mut compiler, &mut filters, clause)?;
        }

        self.check_known_types(&graph)?;

        let plan = plan_projections(&mut graph, &mut compiler, &query.return_clause)?;
        let (limit, offset) = pagination(&query.return_clause)?;

        let structure = SqlStructure {
            distinct: query.return_clause.distinct,
            projections: plan.columns,
            from: self.from_entries(&graph),
            joins: vec![],
            where_expression: self.where_expression(&graph, filters),
            group_by: plan.group_by,
            aggregated: plan.aggregated,
            limit,
            offset,
        };

        let sql = generate_sql(&structure)?;
        log::debug!("translated query:\n{}", sql);

        Ok(SqlTranslation {
            query: sql,
            projections: plan.projections,
        })
    }

    fn bind_with_clause(
        &self,
        graph: &mut QueryGraph,
        compiler: &mut ExpressionCompiler<'_>,
        filters: &mut Filters,
        clause: &WithClause<'_>,
    ) -> Result<(), TranslationError> {
        for item in &clause.items {
            let compiled = compiler.compile(graph, &item.expression)?;
            match item.alias {
                Some(alias) => compiler.bind_alias(alias, compiled),
                None if is_bare_variable(&item.expression) => {}
                None => {
                    return Err(malformed(format!(
                        "expression in WITH must be aliased: `{}`",
                        item.expression
                    )))
                }
            }
        }

        if let Some(predicate) = &clause.where_clause {
            let compiled = compiler.compile(graph, predicate)?;
            if compiled.uses_aggregation {
                return Err(malformed(format!(
                    "aggregates cannot be filtered in WITH ... WHERE: `{}`",
                    predicate
                )));
            }
            filters.add(compiled);
        }
        Ok(())
    }

    fn check_known_types(&self, graph: &QueryGraph) -> Result<(), QueryGraphError> {
        if let Some(known) = &self.config.known_asset_types {
            for label in graph.nodes().iter().flat_map(|node| &node.labels) {
                if !known.contains(label) {
                    return Err(QueryGraphError::UnknownAssetType(label.clone()));
                }
            }
        }
        if let Some(known) = &self.config.known_relation_types {
            for label in graph.relations().iter().flat_map(|relation| &relation.labels) {
                if !known.contains(label) {
                    return Err(QueryGraphError::UnknownRelationType(label.clone()));
                }
            }
        }
        Ok(())
    }

    fn from_entries(&self, graph: &QueryGraph) -> Vec<SqlFrom> {
        let nodes = graph
            .nodes()
            .iter()
            .map(|node| SqlFrom::table(self.config.assets_table.clone(), format!("a{}", node.id)));
        let relations = graph.relations().iter().map(|relation| {
            SqlFrom::table(
                self.config.relations_table.clone(),
                format!("r{}", relation.id),
            )
        });
        nodes.chain(relations).collect()
    }

    /// Label checks for every slot, then relation joins, then the WHERE
    /// predicates, all AND-ed together.
    fn where_expression(&self, graph: &QueryGraph, filters: Filters) -> AndOrExpression {
        let mut constraints = vec![];
        for node in graph.nodes() {
            constraints.extend(label_constraint(&format!("a{}", node.id), &node.labels));
        }
        for relation in graph.relations() {
            constraints.extend(label_constraint(&format!("r{}", relation.id), &relation.labels));
        }

        let single_relation = graph.relations().len() == 1;
        for relation in graph.relations() {
            let unconstrained = |index: usize| {
                graph.nodes()[index].labels.is_empty() && !filters.constrained_nodes.contains(&index)
            };
            // Direction cannot change which pairs match when nothing pins
            // either endpoint down, so one orientation is scanned.
            let direction = if relation.direction == Direction::Either
                && self.config.optimize_either_direction
                && single_relation
                && unconstrained(relation.left)
                && unconstrained(relation.right)
            {
                log::debug!("scanning either-direction relation r{} one way", relation.id);
                Direction::Right
            } else {
                relation.direction
            };
            constraints.push(direction_constraint(
                &format!("r{}", relation.id),
                &format!("a{}", relation.left),
                &format!("a{}", relation.right),
                direction,
            ));
        }

        constraints.extend(filters.predicates);
        AndOrExpression::And(constraints)
    }
}

fn push_pattern_element(
    graph: &mut QueryGraph,
    element: &PatternElement<'_>,
) -> Result<(), QueryGraphError> {
    let mut previous = graph.push_node(&element.node.labels, element.node.variable, Scope::Match)?;
    for hop in &element.chain {
        let next = graph.push_node(&hop.node.labels, hop.node.variable, Scope::Match)?;
        let relationship = &hop.relationship;
        graph.push_relation(
            &relationship.labels,
            relationship.variable,
            previous,
            next,
            Direction::from_arrows(relationship.left_arrow, relationship.right_arrow),
            Scope::Match,
        )?;
        previous = next;
    }
    Ok(())
}

/// Expands RETURN items into SQL columns. Grouping columns are the
/// non-aggregated ones, used only when some item aggregates.
fn plan_projections(
    graph: &mut QueryGraph,
    compiler: &mut ExpressionCompiler<'_>,
    body: &ProjectionBody<'_>,
) -> Result<ProjectionPlan, TranslationError> {
    let mut columns = vec![];
    let mut grouping = vec![];
    let mut projections = vec![];
    let mut aggregated = false;

    for item in &body.items {
        let compiled = compiler.compile(graph, &item.expression)?;
        aggregated |= compiled.uses_aggregation;

        // Only single-column items can carry the RETURN alias into SQL.
        let sql_alias = item.alias.filter(|alias| SQL_IDENTIFIER.is_match(alias));
        let aliased = |projection: SqlProjection| match sql_alias {
            Some(alias) => projection.with_alias(alias),
            None => projection,
        };

        match &compiled.aggregate {
            Some((function, argument)) => {
                columns.push(aliased(SqlProjection::aggregate(
                    argument.clone(),
                    function.clone(),
                )));
            }
            None if compiled.uses_aggregation => {
                columns.push(aliased(SqlProjection::column(compiled.sql.clone())));
            }
            None => match compiled.columns.as_slice() {
                [column] => {
                    grouping.push(columns.len());
                    columns.push(aliased(SqlProjection::column(column.clone())));
                }
                many => {
                    for column in many {
                        grouping.push(columns.len());
                        columns.push(SqlProjection::column(column.clone()));
                    }
                }
            },
        }

        projections.push(Projection {
            alias: item
                .alias
                .map(str::to_string)
                .unwrap_or_else(|| item.expression.to_string()),
            kind: compiled.kind,
        });
    }

    Ok(ProjectionPlan {
        columns,
        group_by: if aggregated { grouping } else { vec![] },
        aggregated,
        projections,
    })
}

fn pagination(body: &ProjectionBody<'_>) -> Result<(Option<u64>, Option<u64>), TranslationError> {
    if body.skip.is_some() && body.limit.is_none() {
        return Err(TranslationError::SkipWithoutLimit);
    }
    let limit = body
        .limit
        .as_ref()
        .map(|expression| integer_literal(expression, "LIMIT"))
        .transpose()?;
    let offset = body
        .skip
        .as_ref()
        .map(|expression| integer_literal(expression, "SKIP"))
        .transpose()?;
    Ok((limit, offset))
}

fn integer_literal(expression: &Expression<'_>, clause: &'static str) -> Result<u64, TranslationError> {
    match expression.as_term() {
        Some(term) if term.property_path.is_empty() => match term.atom {
            Atom::Literal(Literal::Integer(value)) => {
                u64::try_from(value).map_err(|_| TranslationError::InvalidPagination { clause })
            }
            _ => Err(TranslationError::InvalidPagination { clause }),
        },
        _ => Err(TranslationError::InvalidPagination { clause }),
    }
}

fn is_bare_variable(expression: &Expression<'_>) -> bool {
    matches!(
        expression.as_term(),
        Some(term) if term.property_path.is_empty() && matches!(term.atom, Atom::Variable(_))
    )
}

fn malformed(message: String) -> TranslationError {
    SqlGeneratorError::MalformedExpression(message).into()
}
