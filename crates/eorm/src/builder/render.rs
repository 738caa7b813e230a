use super::CompiledStatement;
use crate::dialect::Dialect;
use crate::error::{OrmError, OrmResult};
use crate::expr::{Expr, LogicalOp};
use crate::meta::{ColumnMeta, TableMeta};
use crate::value::Value;

/// Accumulates SQL text and parameters for one statement.
///
/// Parameters are numbered in the order they are pushed, so the text and the argument list can
/// never disagree.
pub(crate) struct Renderer<'a> {
    dialect: Dialect,
    meta: &'a TableMeta,
    sql: String,
    args: Vec<Value>,
}

impl<'a> Renderer<'a> {
    pub(crate) fn new(dialect: Dialect, meta: &'a TableMeta) -> Self {
        Self {
            dialect,
            meta,
            sql: String::with_capacity(128),
            args: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, sql: &str) {
        self.sql.push_str(sql);
    }

    pub(crate) fn push_ident(&mut self, ident: &str) {
        self.dialect.write_ident(&mut self.sql, ident);
    }

    pub(crate) fn push_param(&mut self, value: Value) {
        self.args.push(value);
        self.dialect.write_placeholder(&mut self.sql, self.args.len());
    }

    /// Resolve `name` against the table and return its metadata.
    pub(crate) fn resolve(&self, name: &str) -> OrmResult<&'a ColumnMeta> {
        self.meta.resolve(name).ok_or_else(|| {
            OrmError::compile(format!(
                "unknown column '{name}' on table '{}'",
                self.meta.table_name
            ))
        })
    }

    pub(crate) fn push_column(&mut self, name: &str) -> OrmResult<()> {
        let column = self.resolve(name)?;
        self.push_ident(&column.column_name);
        Ok(())
    }

    /// Comma-separated list of quoted column names.
    pub(crate) fn push_column_list<'c>(&mut self, columns: impl IntoIterator<Item = &'c ColumnMeta>) {
        for (i, column) in columns.into_iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.push_ident(&column.column_name);
        }
    }

    pub(crate) fn push_expr(&mut self, expr: &Expr) -> OrmResult<()> {
        match expr {
            Expr::Column(name) => self.push_column(name)?,
            Expr::Value(value) => self.push_param(value.clone()),
            Expr::Binary { op, left, right } => {
                self.push_operand(left)?;
                self.push(" ");
                self.push(op.as_sql());
                self.push(" ");
                self.push_operand(right)?;
            }
            Expr::Logical { op, children } => {
                if children.is_empty() {
                    self.push(match op {
                        LogicalOp::And => "1=1",
                        LogicalOp::Or => "1=0",
                    });
                    return Ok(());
                }
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        self.push(op.as_sql());
                    }
                    let grouped = match child {
                        Expr::Logical { op: inner, .. } => inner != op,
                        Expr::Raw { .. } => true,
                        _ => false,
                    };
                    if grouped {
                        self.push("(");
                        self.push_expr(child)?;
                        self.push(")");
                    } else {
                        self.push_expr(child)?;
                    }
                }
            }
            Expr::Not(inner) => {
                self.push("NOT (");
                self.push_expr(inner)?;
                self.push(")");
            }
            Expr::NullCheck { column, negated } => {
                self.push_column(column)?;
                self.push(if *negated { " IS NOT NULL" } else { " IS NULL" });
            }
            Expr::InList { column, values } => {
                if values.is_empty() {
                    // Still resolve the column so typos fail the same way everywhere.
                    self.resolve(column)?;
                    self.push("1=0");
                    return Ok(());
                }
                self.push_column(column)?;
                self.push(" IN (");
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        self.push(", ");
                    }
                    self.push_param(value.clone());
                }
                self.push(")");
            }
            Expr::Raw { sql, args } => self.push_raw(sql, args)?,
        }
        Ok(())
    }

    fn push_operand(&mut self, expr: &Expr) -> OrmResult<()> {
        match expr {
            Expr::Column(_) | Expr::Value(_) => self.push_expr(expr),
            _ => {
                self.push("(");
                self.push_expr(expr)?;
                self.push(")");
                Ok(())
            }
        }
    }

    /// Copy `sql`, replacing each `?` with the dialect placeholder for the next argument.
    ///
    /// `?` inside single- or double-quoted text is copied as is, and `??` emits a literal `?`.
    fn push_raw(&mut self, sql: &str, args: &[Value]) -> OrmResult<()> {
        let mut args = args.iter();
        let mut quote = None;
        let mut chars = sql.chars().peekable();
        while let Some(ch) = chars.next() {
            if let Some(open) = quote {
                if ch == open {
                    quote = None;
                }
                self.sql.push(ch);
                continue;
            }
            match ch {
                '\'' | '"' => {
                    quote = Some(ch);
                    self.sql.push(ch);
                }
                '?' if chars.peek() == Some(&'?') => {
                    chars.next();
                    self.sql.push('?');
                }
                '?' => {
                    let value = args.next().ok_or_else(|| {
                        OrmError::compile(format!(
                            "raw fragment '{sql}' has more placeholders than arguments"
                        ))
                    })?;
                    self.push_param(value.clone());
                }
                _ => self.sql.push(ch),
            }
        }
        if quote.is_some() {
            return Err(OrmError::compile(format!(
                "raw fragment '{sql}' has an unterminated quote"
            )));
        }
        if args.next().is_some() {
            return Err(OrmError::compile(format!(
                "raw fragment '{sql}' has more arguments than placeholders"
            )));
        }
        Ok(())
    }

    pub(crate) fn finish(self) -> CompiledStatement {
        CompiledStatement {
            sql: self.sql,
            args: self.args,
        }
    }
}
