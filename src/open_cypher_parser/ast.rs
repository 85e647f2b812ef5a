use std::fmt;

/// A complete read query: any number of MATCH and WITH clauses followed by
/// a RETURN.
#[derive(Debug, PartialEq, Clone)]
pub struct Query<'a> {
    pub match_clauses: Vec<MatchClause<'a>>,
    pub with_clauses: Vec<WithClause<'a>>,
    pub return_clause: ProjectionBody<'a>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct MatchClause<'a> {
    pub pattern_elements: Vec<PatternElement<'a>>,
    pub where_clause: Option<Expression<'a>>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct WithClause<'a> {
    pub items: Vec<ProjectionItem<'a>>,
    pub where_clause: Option<Expression<'a>>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct ProjectionBody<'a> {
    pub distinct: bool,
    pub items: Vec<ProjectionItem<'a>>,
    pub skip: Option<Expression<'a>>,
    pub limit: Option<Expression<'a>>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct ProjectionItem<'a> {
    pub expression: Expression<'a>,
    pub alias: Option<&'a str>,
}

/// A node followed by zero or more (relationship, node) hops.
#[derive(Debug, PartialEq, Clone)]
pub struct PatternElement<'a> {
    pub node: NodePattern<'a>,
    pub chain: Vec<PatternElementChain<'a>>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct PatternElementChain<'a> {
    pub relationship: RelationshipPattern<'a>,
    pub node: NodePattern<'a>,
}

#[derive(Debug, PartialEq, Clone, Default)]
pub struct NodePattern<'a> {
    pub variable: Option<&'a str>,
    pub labels: Vec<&'a str>,
}

#[derive(Debug, PartialEq, Clone, Default)]
pub struct RelationshipPattern<'a> {
    pub variable: Option<&'a str>,
    pub labels: Vec<&'a str>,
    pub left_arrow: bool,
    pub right_arrow: bool,
}

#[derive(Debug, PartialEq, Clone)]
pub struct Expression<'a> {
    pub xors: Vec<XorExpression<'a>>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct XorExpression<'a> {
    pub ands: Vec<AndExpression<'a>>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct AndExpression<'a> {
    pub nots: Vec<NotExpression<'a>>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct NotExpression<'a> {
    /// Set when an odd number of NOT tokens preceded the comparison.
    pub negated: bool,
    pub comparison: ComparisonExpression<'a>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct ComparisonExpression<'a> {
    pub lhs: AddSubExpression<'a>,
    pub partials: Vec<(ComparisonOperator, AddSubExpression<'a>)>,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ComparisonOperator {
    Equal,
    NotEqual,
    LessThan,
    LessThanEqual,
    GreaterThan,
    GreaterThanEqual,
}

#[derive(Debug, PartialEq, Clone)]
pub struct AddSubExpression<'a> {
    pub first: MultiplyDivideExpression<'a>,
    pub rest: Vec<(ArithmeticOperator, MultiplyDivideExpression<'a>)>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct MultiplyDivideExpression<'a> {
    pub first: PowerExpression<'a>,
    pub rest: Vec<(ArithmeticOperator, PowerExpression<'a>)>,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ArithmeticOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
}

#[derive(Debug, PartialEq, Clone)]
pub struct PowerExpression<'a> {
    pub operands: Vec<UnaryExpression<'a>>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct UnaryExpression<'a> {
    pub negative: bool,
    pub operand: StringOperatorExpression<'a>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct StringOperatorExpression<'a> {
    pub lhs: PropertyOrLabels<'a>,
    pub operations: Vec<(StringOperator, PropertyOrLabels<'a>)>,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum StringOperator {
    StartsWith,
    EndsWith,
    Contains,
}

#[derive(Debug, PartialEq, Clone)]
pub struct PropertyOrLabels<'a> {
    pub atom: Atom<'a>,
    pub property_path: Vec<&'a str>,
}

#[derive(Debug, PartialEq, Clone)]
pub enum Atom<'a> {
    Variable(&'a str),
    Literal(Literal<'a>),
    FunctionInvocation(FunctionInvocation<'a>),
    /// `COUNT(*)`
    CountAll,
    Parenthesized(Box<Expression<'a>>),
    RelationshipsPattern(PatternElement<'a>),
}

#[derive(Debug, PartialEq, Clone)]
pub struct FunctionInvocation<'a> {
    pub name: &'a str,
    pub distinct: bool,
    pub arguments: Vec<Expression<'a>>,
}

#[derive(Debug, PartialEq, Clone)]
pub enum Literal<'a> {
    String(&'a str),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Null,
}

impl<'a> Expression<'a> {
    /// Returns the single property-or-labels term when the expression is
    /// nothing but that term, with no operator applied at any level.
    pub fn as_term(&self) -> Option<&PropertyOrLabels<'a>> {
        let [xor] = self.xors.as_slice() else {
            return None;
        };
        let [and] = xor.ands.as_slice() else {
            return None;
        };
        let [not] = and.nots.as_slice() else {
            return None;
        };
        if not.negated || !not.comparison.partials.is_empty() {
            return None;
        }
        let add_sub = &not.comparison.lhs;
        if !add_sub.rest.is_empty() || !add_sub.first.rest.is_empty() {
            return None;
        }
        let [unary] = add_sub.first.first.operands.as_slice() else {
            return None;
        };
        if unary.negative || !unary.operand.operations.is_empty() {
            return None;
        }
        Some(&unary.operand.lhs)
    }
}

impl fmt::Display for Expression<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_joined(f, &self.xors, " OR ")
    }
}

impl fmt::Display for XorExpression<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_joined(f, &self.ands, " XOR ")
    }
}

impl fmt::Display for AndExpression<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_joined(f, &self.nots, " AND ")
    }
}

impl fmt::Display for NotExpression<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negated {
            write!(f, "NOT ")?;
        }
        write!(f, "{}", self.comparison)
    }
}

impl fmt::Display for ComparisonExpression<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.lhs)?;
        for (op, rhs) in &self.partials {
            write!(f, " {} {}", op, rhs)?;
        }
        Ok(())
    }
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            ComparisonOperator::Equal => "=",
            ComparisonOperator::NotEqual => "<>",
            ComparisonOperator::LessThan => "<",
            ComparisonOperator::LessThanEqual => "<=",
            ComparisonOperator::GreaterThan => ">",
            ComparisonOperator::GreaterThanEqual => ">=",
        };
        write!(f, "{}", symbol)
    }
}

impl fmt::Display for ArithmeticOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            ArithmeticOperator::Add => "+",
            ArithmeticOperator::Subtract => "-",
            ArithmeticOperator::Multiply => "*",
            ArithmeticOperator::Divide => "/",
            ArithmeticOperator::Modulo => "%",
        };
        write!(f, "{}", symbol)
    }
}

impl fmt::Display for AddSubExpression<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.first)?;
        for (op, rhs) in &self.rest {
            write!(f, " {} {}", op, rhs)?;
        }
        Ok(())
    }
}

impl fmt::Display for MultiplyDivideExpression<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.first)?;
        for (op, rhs) in &self.rest {
            write!(f, " {} {}", op, rhs)?;
        }
        Ok(())
    }
}

impl fmt::Display for PowerExpression<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_joined(f, &self.operands, " ^ ")
    }
}

impl fmt::Display for UnaryExpression<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negative {
            write!(f, "-")?;
        }
        write!(f, "{}", self.operand)
    }
}

impl fmt::Display for StringOperatorExpression<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.lhs)?;
        for (op, rhs) in &self.operations {
            let keyword = match op {
                StringOperator::StartsWith => "STARTS WITH",
                StringOperator::EndsWith => "ENDS WITH",
                StringOperator::Contains => "CONTAINS",
            };
            write!(f, " {} {}", keyword, rhs)?;
        }
        Ok(())
    }
}

impl fmt::Display for PropertyOrLabels<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.atom)?;
        for key in &self.property_path {
            write!(f, ".{}", key)?;
        }
        Ok(())
    }
}

impl fmt::Display for Atom<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Atom::Variable(name) => write!(f, "{}", name),
            Atom::Literal(literal) => write!(f, "{}", literal),
            Atom::FunctionInvocation(function) => {
                write!(f, "{}(", function.name)?;
                if function.distinct {
                    write!(f, "DISTINCT ")?;
                }
                write_joined(f, &function.arguments, ", ")?;
                write!(f, ")")
            }
            Atom::CountAll => write!(f, "COUNT(*)"),
            Atom::Parenthesized(inner) => write!(f, "({})", inner),
            Atom::RelationshipsPattern(pattern) => write!(f, "{}", pattern),
        }
    }
}

impl fmt::Display for Literal<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::String(s) => write!(f, "'{}'", s),
            Literal::Integer(i) => write!(f, "{}", i),
            Literal::Float(d) => write!(f, "{}", d),
            Literal::Boolean(b) => write!(f, "{}", b),
            Literal::Null => write!(f, "null"),
        }
    }
}

impl fmt::Display for PatternElement<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.node)?;
        for hop in &self.chain {
            write!(f, "{}{}", hop.relationship, hop.node)?;
        }
        Ok(())
    }
}

impl fmt::Display for NodePattern<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}", self.variable.unwrap_or(""))?;
        for label in &self.labels {
            write!(f, ":{}", label)?;
        }
        write!(f, ")")
    }
}

impl fmt::Display for RelationshipPattern<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.left_arrow {
            write!(f, "<")?;
        }
        write!(f, "-[{}", self.variable.unwrap_or(""))?;
        for (i, label) in self.labels.iter().enumerate() {
            write!(f, "{}{}", if i == 0 { ":" } else { "|" }, label)?;
        }
        write!(f, "]-")?;
        if self.right_arrow {
            write!(f, ">")?;
        }
        Ok(())
    }
}

fn write_joined<T: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    items: &[T],
    separator: &str,
) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, "{}", separator)?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}
