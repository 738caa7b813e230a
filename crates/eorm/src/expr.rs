//! Column references and predicates.
//!
//! Expressions are immutable values; every combinator returns a new node. Rendering lives in
//! [`crate::builder`], where column references are resolved against a [`TableMeta`](crate::TableMeta).
//!
//! ```ignore
//! use eorm::{C, not};
//!
//! let p = C("Id").lt(3).and(not(C("Name").eq("bob")).or(C("Deleted").is_null()));
//! ```

use crate::value::Value;

/// Comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl Op {
    pub fn as_sql(self) -> &'static str {
        match self {
            Op::Eq => "=",
            Op::Neq => "<>",
            Op::Lt => "<",
            Op::Lte => "<=",
            Op::Gt => ">",
            Op::Gte => ">=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

impl LogicalOp {
    pub fn as_sql(self) -> &'static str {
        match self {
            LogicalOp::And => " AND ",
            LogicalOp::Or => " OR ",
        }
    }
}

/// A node of the expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Reference to an entity field (or column) by name.
    Column(String),
    /// A literal, always bound as a parameter.
    Value(Value),
    /// `left op right`
    Binary {
        op: Op,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Children joined by AND / OR.
    Logical { op: LogicalOp, children: Vec<Expr> },
    /// `NOT (inner)`
    Not(Box<Expr>),
    /// `col IS NULL` / `col IS NOT NULL`
    NullCheck { column: String, negated: bool },
    /// `col IN (...)`; an empty list is always false.
    InList { column: String, values: Vec<Value> },
    /// SQL fragment with `?` placeholders, renumbered on render.
    Raw { sql: String, args: Vec<Value> },
}

/// A column reference, the starting point of most predicates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    name: String,
}

/// Reference a column by entity field name (or column name).
#[allow(non_snake_case)]
pub fn C(name: impl Into<String>) -> Column {
    col(name)
}

/// Lowercase alias of [`C`].
pub fn col(name: impl Into<String>) -> Column {
    Column { name: name.into() }
}

macro_rules! comparisons {
    ($($(#[$doc:meta])* $name:ident, $col_name:ident => $op:ident;)*) => {
        $(
            $(#[$doc])*
            pub fn $name(self, value: impl Into<Value>) -> Predicate {
                self.compare(Op::$op, Expr::Value(value.into()))
            }

            /// Compare against another column.
            pub fn $col_name(self, other: Column) -> Predicate {
                self.compare(Op::$op, other.into_expr())
            }
        )*
    };
}

impl Column {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn into_expr(self) -> Expr {
        Expr::Column(self.name)
    }

    fn compare(self, op: Op, right: Expr) -> Predicate {
        Predicate(Expr::Binary {
            op,
            left: Box::new(self.into_expr()),
            right: Box::new(right),
        })
    }

    comparisons! {
        /// `col = value`
        eq, eq_col => Eq;
        /// `col <> value`
        neq, neq_col => Neq;
        /// `col < value`
        lt, lt_col => Lt;
        /// `col <= value`
        lte, lte_col => Lte;
        /// `col > value`
        gt, gt_col => Gt;
        /// `col >= value`
        gte, gte_col => Gte;
    }

    pub fn is_null(self) -> Predicate {
        Predicate(Expr::NullCheck {
            column: self.name,
            negated: false,
        })
    }

    pub fn is_not_null(self) -> Predicate {
        Predicate(Expr::NullCheck {
            column: self.name,
            negated: true,
        })
    }

    /// `col IN (v1, v2, ...)`. An empty list matches nothing.
    pub fn in_values<V: Into<Value>>(self, values: impl IntoIterator<Item = V>) -> Predicate {
        Predicate(Expr::InList {
            column: self.name,
            values: values.into_iter().map(Into::into).collect(),
        })
    }
}

/// A boolean expression usable in a WHERE clause.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate(Expr);

impl Predicate {
    pub fn expr(&self) -> &Expr {
        &self.0
    }

    pub fn into_expr(self) -> Expr {
        self.0
    }

    pub fn and(self, other: Predicate) -> Predicate {
        self.combine(LogicalOp::And, other)
    }

    pub fn or(self, other: Predicate) -> Predicate {
        self.combine(LogicalOp::Or, other)
    }

    // Same-operator chains flatten into one node: `a.and(b).and(c)` has three children.
    fn combine(self, op: LogicalOp, other: Predicate) -> Predicate {
        let mut children = match self.0 {
            Expr::Logical { op: lop, children } if lop == op => children,
            expr => vec![expr],
        };
        match other.0 {
            Expr::Logical { op: rop, children: rest } if rop == op => children.extend(rest),
            expr => children.push(expr),
        }
        Predicate(Expr::Logical { op, children })
    }

    /// AND all predicates together; `None` when there are none.
    pub fn all(predicates: impl IntoIterator<Item = Predicate>) -> Option<Predicate> {
        predicates.into_iter().reduce(Predicate::and)
    }
}

impl std::ops::Not for Predicate {
    type Output = Predicate;

    fn not(self) -> Predicate {
        Predicate(Expr::Not(Box::new(self.0)))
    }
}

/// `NOT (p)`
pub fn not(p: Predicate) -> Predicate {
    !p
}

/// A raw SQL predicate; each `?` consumes one of `args`, in order.
///
/// A `?` inside a quoted literal or identifier is left alone. Write `??` for a bare `?`, such
/// as the PostgreSQL jsonb key operator.
///
/// Column names inside `sql` are emitted verbatim, so they are neither resolved nor quoted.
pub fn raw<V: Into<Value>>(sql: impl Into<String>, args: impl IntoIterator<Item = V>) -> Predicate {
    Predicate(Expr::Raw {
        sql: sql.into(),
        args: args.into_iter().map(Into::into).collect(),
    })
}
