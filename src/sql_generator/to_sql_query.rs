//! Turns an [`SqlStructure`] into SQL text.
//!
//! A structure whose WHERE tree unwinds to a single conjunctive clause (and
//! that has at most one join alternative) becomes one SELECT. Anything else
//! becomes a UNION of parenthesized branches, one per (clause, join
//! alternative) pair. Aggregated unions are wrapped in an outer query that
//! re-aggregates the per-branch results.

use std::collections::BTreeSet;

use lazy_static::lazy_static;
use regex::Regex;

use crate::render_plan::{
    AndOrExpression, SqlFrom, SqlJoin, SqlProjection, SqlStructure,
};

use super::errors::SqlGeneratorError;

lazy_static! {
    pub(crate) static ref SQL_IDENTIFIER: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
}

pub trait ToSql {
    fn to_sql(&self) -> Result<String, SqlGeneratorError>;
}

impl ToSql for SqlProjection {
    fn to_sql(&self) -> Result<String, SqlGeneratorError> {
        let mut sql = match &self.function {
            Some(function) => format!(
                "{}({}{})",
                function.name,
                if function.distinct { "DISTINCT " } else { "" },
                self.expression
            ),
            None => self.expression.clone(),
        };
        if let Some(alias) = &self.alias {
            sql.push_str(" AS ");
            sql.push_str(alias);
        }
        Ok(sql)
    }
}

impl ToSql for SqlFrom {
    fn to_sql(&self) -> Result<String, SqlGeneratorError> {
        match self {
            SqlFrom::Table { name, alias: Some(alias) } => Ok(format!("{} {}", name, alias)),
            SqlFrom::Table { name, alias: None } => Ok(name.clone()),
            SqlFrom::Nested(inner) => Ok(format!("({}) AS {}", inner.structure.to_sql()?, inner.alias)),
        }
    }
}

impl ToSql for SqlJoin {
    fn to_sql(&self) -> Result<String, SqlGeneratorError> {
        let hint = match &self.index_hint {
            Some(index) => format!("FORCE INDEX FOR JOIN ({}) ", index),
            None => String::new(),
        };
        Ok(format!("JOIN {} {} {}ON {}", self.table, self.alias, hint, self.on))
    }
}

impl ToSql for SqlStructure {
    fn to_sql(&self) -> Result<String, SqlGeneratorError> {
        if self.projections.is_empty() {
            return Err(SqlGeneratorError::MalformedExpression(
                "a query must project at least one column".to_string(),
            ));
        }

        let mut clauses = self.where_expression.unwind_or();
        if clauses.is_empty() {
            // An empty disjunction never holds.
            clauses.push(AndOrExpression::leaf("FALSE"));
        }

        let no_joins: &[SqlJoin] = &[];
        let join_alternatives: Vec<&[SqlJoin]> = if self.joins.is_empty() {
            vec![no_joins]
        } else {
            self.joins.iter().map(Vec::as_slice).collect()
        };

        if let ([clause], [joins]) = (clauses.as_slice(), join_alternatives.as_slice()) {
            let sql = SelectParts {
                distinct: self.distinct,
                projections: &self.projections,
                from: &self.from,
                joins: *joins,
                clause,
                group_by: &self.group_by,
                limit: self.limit,
                offset: self.offset,
            }
            .render()?;
            log::debug!("assembled single select:\n{}", sql);
            return Ok(sql);
        }

        self.union_to_sql(&clauses, &join_alternatives)
    }
}

impl SqlStructure {
    fn union_to_sql(
        &self,
        clauses: &[AndOrExpression],
        join_alternatives: &[&[SqlJoin]],
    ) -> Result<String, SqlGeneratorError> {
        let aggregated = self.is_aggregated();
        let projections = if aggregated {
            self.check_mergeable()?;
            with_derived_aliases(&self.projections)?
        } else {
            self.projections.clone()
        };

        let mut branches = Vec::with_capacity(clauses.len() * join_alternatives.len());
        for clause in clauses {
            for joins in join_alternatives {
                let branch = SelectParts {
                    distinct: false,
                    projections: &projections,
                    from: &self.from,
                    joins: *joins,
                    clause,
                    group_by: &self.group_by,
                    limit: None,
                    offset: None,
                }
                .render()?;
                branches.push(format!("({})", branch));
            }
        }
        log::debug!("assembling union of {} branches", branches.len());

        let separator = if self.distinct { "\nUNION\n" } else { "\nUNION ALL\n" };
        let union = branches.join(separator);

        let mut sql = if aggregated {
            let columns = projections
                .iter()
                .map(outer_column)
                .collect::<Result<Vec<_>, _>>()?
                .join(", ");
            let mut outer = format!("SELECT {}\nFROM\n({}) AS x", columns, union);
            if !self.group_by.is_empty() {
                let keys = self
                    .group_by
                    .iter()
                    .map(|index| {
                        projection_at(&projections, *index)
                            .and_then(|p| alias_of(p).map(|alias| format!("x.{}", alias)))
                    })
                    .collect::<Result<Vec<_>, _>>()?
                    .join(", ");
                outer.push_str("\nGROUP BY ");
                outer.push_str(&keys);
            }
            outer
        } else {
            union
        };

        push_pagination(&mut sql, self.limit, self.offset);
        Ok(sql)
    }
}

impl SqlStructure {
    /// Every projection of an aggregated union must be either a grouping
    /// column or a bare aggregate, otherwise branch results cannot be merged.
    fn check_mergeable(&self) -> Result<(), SqlGeneratorError> {
        for (index, projection) in self.projections.iter().enumerate() {
            if projection.function.is_none() && !self.group_by.contains(&index) {
                return Err(SqlGeneratorError::UnmergeableAggregate(
                    projection.expression.clone(),
                ));
            }
        }
        Ok(())
    }
}

struct SelectParts<'s> {
    distinct: bool,
    projections: &'s [SqlProjection],
    from: &'s [SqlFrom],
    joins: &'s [SqlJoin],
    clause: &'s AndOrExpression,
    group_by: &'s [usize],
    limit: Option<u64>,
    offset: Option<u64>,
}

impl SelectParts<'_> {
    fn render(&self) -> Result<String, SqlGeneratorError> {
        let columns = self
            .projections
            .iter()
            .map(ToSql::to_sql)
            .collect::<Result<Vec<_>, _>>()?
            .join(", ");
        let mut sql = format!(
            "SELECT {}{}",
            if self.distinct { "DISTINCT " } else { "" },
            columns
        );

        if !self.from.is_empty() {
            let from = self
                .from
                .iter()
                .map(ToSql::to_sql)
                .collect::<Result<Vec<_>, _>>()?
                .join(", ");
            sql.push_str(&format!("\nFROM ({})", from));
        }

        for join in self.joins {
            sql.push('\n');
            sql.push_str(&join.to_sql()?);
        }

        let filter = self.clause.flatten().to_string();
        if !filter.is_empty() {
            sql.push_str("\nWHERE ");
            sql.push_str(&filter);
        }

        if !self.group_by.is_empty() {
            let keys = self
                .group_by
                .iter()
                .map(|index| projection_at(self.projections, *index).and_then(group_key))
                .collect::<Result<Vec<_>, _>>()?
                .join(", ");
            sql.push_str("\nGROUP BY ");
            sql.push_str(&keys);
        }

        push_pagination(&mut sql, self.limit, self.offset);
        Ok(sql)
    }
}

fn push_pagination(sql: &mut String, limit: Option<u64>, offset: Option<u64>) {
    if let Some(limit) = limit {
        sql.push_str(&format!("\nLIMIT {}", limit));
    }
    if let Some(offset) = offset {
        sql.push_str(&format!("\nOFFSET {}", offset));
    }
}

fn projection_at(projections: &[SqlProjection], index: usize) -> Result<&SqlProjection, SqlGeneratorError> {
    projections.get(index).ok_or_else(|| {
        SqlGeneratorError::MalformedExpression(format!(
            "GROUP BY refers to projection {} but only {} exist",
            index,
            projections.len()
        ))
    })
}

fn group_key(projection: &SqlProjection) -> Result<String, SqlGeneratorError> {
    match (&projection.alias, &projection.function) {
        (Some(alias), _) => Ok(alias.clone()),
        (None, None) => Ok(projection.expression.clone()),
        (None, Some(_)) => Err(SqlGeneratorError::MissingProjectionAlias(
            projection.expression.clone(),
        )),
    }
}

fn alias_of(projection: &SqlProjection) -> Result<&str, SqlGeneratorError> {
    projection
        .alias
        .as_deref()
        .ok_or_else(|| SqlGeneratorError::MissingProjectionAlias(projection.expression.clone()))
}

/// The column the outer query of an aggregated union selects for one
/// projection. Counts are summed, other aggregates are re-applied.
fn outer_column(projection: &SqlProjection) -> Result<String, SqlGeneratorError> {
    let alias = alias_of(projection)?;
    Ok(match &projection.function {
        Some(function) if function.name == "COUNT" => format!("SUM({})", alias),
        Some(function) => format!("{}({})", function.name, alias),
        None => alias.to_string(),
    })
}

/// Assigns an alias to every projection lacking one: `a0.value` becomes
/// `a0_value` and `COUNT(a1.value)` becomes `a1_value_COUNT`.
fn with_derived_aliases(projections: &[SqlProjection]) -> Result<Vec<SqlProjection>, SqlGeneratorError> {
    let mut taken: BTreeSet<String> = projections.iter().filter_map(|p| p.alias.clone()).collect();
    let mut out = Vec::with_capacity(projections.len());

    for projection in projections {
        let mut projection = projection.clone();
        if projection.alias.is_none() {
            let mut alias = if projection.expression == "*" {
                "star".to_string()
            } else {
                projection.expression.replace('.', "_")
            };
            if let Some(function) = &projection.function {
                alias = format!("{}_{}", alias, function.name);
            }
            if !SQL_IDENTIFIER.is_match(&alias) {
                return Err(SqlGeneratorError::MissingProjectionAlias(projection.expression));
            }
            let mut unique = alias.clone();
            let mut suffix = 1;
            while taken.contains(&unique) {
                unique = format!("{}_{}", alias, suffix);
                suffix += 1;
            }
            taken.insert(unique.clone());
            projection.alias = Some(unique);
        }
        out.push(projection);
    }
    Ok(out)
}
