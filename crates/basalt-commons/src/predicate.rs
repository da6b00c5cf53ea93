//! Read-predicate model consumed by index selection.

use std::fmt;

use crate::models::column::ColumnName;

/// Comparison operator of a single predicate expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    Lt,
    Lte,
    Gt,
    Gte,
    Ne,
    In,
    Contains,
    ContainsKey,
    Like,
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Operator::Eq => "=",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::Ne => "!=",
            Operator::In => "IN",
            Operator::Contains => "CONTAINS",
            Operator::ContainsKey => "CONTAINS KEY",
            Operator::Like => "LIKE",
        };
        write!(f, "{}", s)
    }
}

/// One `column <op> value` term of a read predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expression {
    pub column: ColumnName,
    pub operator: Operator,
    pub value: Vec<u8>,
}

impl Expression {
    pub fn new(
        column: impl Into<ColumnName>,
        operator: Operator,
        value: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            column: column.into(),
            operator,
            value: value.into(),
        }
    }
}

/// The conjunction of expressions a read carries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowFilter {
    pub expressions: Vec<Expression>,
}

impl RowFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, expression: Expression) -> Self {
        self.expressions.push(expression);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.expressions.is_empty()
    }
}
