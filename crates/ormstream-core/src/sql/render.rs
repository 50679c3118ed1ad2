//! SQL WHERE rendering.

use super::DbmsType;
use crate::config::{ColumnIdentifier, ScalarType};
use crate::error::{Error, Result};
use crate::predicate::{escape_like, find_unpushable, FieldPredicate, Predicate, PredicateType};
use crate::value::Value;
use tracing::trace;

/// SQL text with placeholders and the values to bind, in placeholder order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RenderResult {
    /// SQL fragment.
    pub sql: String,
    /// Bind values, one per placeholder, left to right.
    pub values: Vec<Value>,
}

impl RenderResult {
    /// Whether nothing was rendered.
    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }
}

/// Render predicates as the body of a WHERE clause.
///
/// Top-level predicates are joined with ` AND `; every field predicate and
/// composite is parenthesized. Column names come from `column_namer` and
/// operands are coerced to the type reported by `column_type`; errors from
/// either are returned unchanged.
///
/// Every predicate must be pushable. A tree containing an opaque closure is
/// rejected with [`Error::UnpushablePredicate`] and nothing is rendered.
pub fn render_where<E, N, T>(
    dbms_type: DbmsType,
    column_namer: N,
    column_type: T,
    predicates: &[Predicate<E>],
) -> Result<RenderResult>
where
    N: Fn(&ColumnIdentifier) -> Result<String>,
    T: Fn(&ColumnIdentifier) -> Result<ScalarType>,
{
    for (index, predicate) in predicates.iter().enumerate() {
        if let Some(reason) = find_unpushable(predicate) {
            return Err(Error::UnpushablePredicate { index, reason });
        }
    }

    let mut renderer = Renderer {
        dbms_type,
        column_namer,
        column_type,
        values: Vec::new(),
    };
    let clauses = predicates
        .iter()
        .map(|predicate| renderer.render(predicate))
        .collect::<Result<Vec<_>>>()?;

    let result = RenderResult {
        sql: clauses.join(" AND "),
        values: renderer.values,
    };
    trace!(sql = %result.sql, values = result.values.len(), "Rendered WHERE clause");
    Ok(result)
}

struct Renderer<N, T> {
    dbms_type: DbmsType,
    column_namer: N,
    column_type: T,
    values: Vec<Value>,
}

impl<N, T> Renderer<N, T>
where
    N: Fn(&ColumnIdentifier) -> Result<String>,
    T: Fn(&ColumnIdentifier) -> Result<ScalarType>,
{
    fn render<E>(&mut self, predicate: &Predicate<E>) -> Result<String> {
        match predicate {
            Predicate::Field(p) => self.render_field(p),
            Predicate::And(left, right) => {
                let left = self.render(left)?;
                let right = self.render(right)?;
                Ok(format!("({} AND {})", left, right))
            }
            Predicate::Or(left, right) => {
                let left = self.render(left)?;
                let right = self.render(right)?;
                Ok(format!("({} OR {})", left, right))
            }
            Predicate::Not(inner) => Ok(format!("(NOT {})", self.render(inner)?)),
            Predicate::Opaque(_) => Err(Error::UnpushablePredicate {
                index: 0,
                reason: "opaque".to_string(),
            }),
        }
    }

    fn render_field<E>(&mut self, p: &FieldPredicate<E>) -> Result<String> {
        use PredicateType::*;
        let id = p.identifier();

        let col = (self.column_namer)(id)?;
        let sql = match p.predicate_type() {
            AlwaysTrue => "(1=1)".to_string(),
            AlwaysFalse => "(1=0)".to_string(),
            Equal => format!("({} = {})", col, self.bind_operand(p, 0)?),
            NotEqual => format!("(NOT ({} = {}))", col, self.bind_operand(p, 0)?),
            GreaterThan => format!("({} > {})", col, self.bind_operand(p, 0)?),
            GreaterOrEqual => format!("({} >= {})", col, self.bind_operand(p, 0)?),
            LessThan => format!("({} < {})", col, self.bind_operand(p, 0)?),
            LessOrEqual => format!("({} <= {})", col, self.bind_operand(p, 0)?),
            Between => self.between(p, &col)?,
            NotBetween => format!("(NOT {})", self.between(p, &col)?),
            In => self.in_list(p, &col)?,
            NotIn => format!("(NOT {})", self.in_list(p, &col)?),
            IsNull => format!("({} IS NULL)", col),
            IsNotNull => format!("({} IS NOT NULL)", col),
            StartsWith | EndsWith | Contains | Like => self.like(p, &col)?,
            NotStartsWith | NotEndsWith | NotContains => format!("(NOT {})", self.like(p, &col)?),
            IsEmpty => format!("({} = '')", col),
            IsNotEmpty => format!("(NOT ({} = ''))", col),
        };
        Ok(sql)
    }

    fn between<E>(&mut self, p: &FieldPredicate<E>, col: &str) -> Result<String> {
        let inclusion = p.inclusion();
        let start_op = if inclusion.is_start_inclusive() { ">=" } else { ">" };
        let end_op = if inclusion.is_end_inclusive() { "<=" } else { "<" };
        let start = self.bind_operand(p, 0)?;
        let end = self.bind_operand(p, 1)?;
        Ok(format!(
            "({} {} {} AND {} {} {})",
            col, start_op, start, col, end_op, end
        ))
    }

    fn in_list<E>(&mut self, p: &FieldPredicate<E>, col: &str) -> Result<String> {
        let placeholders = (0..p.operands().len())
            .map(|i| self.bind_operand(p, i))
            .collect::<Result<Vec<_>>>()?;
        Ok(format!("({} IN ({}))", col, placeholders.join(",")))
    }

    fn like<E>(&mut self, p: &FieldPredicate<E>, col: &str) -> Result<String> {
        let text = p
            .first_operand()
            .and_then(Value::as_str)
            .ok_or_else(|| missing_operand(p))?;
        let pattern = match p.predicate_type() {
            PredicateType::StartsWith | PredicateType::NotStartsWith => {
                format!("{}%", escape_like(text))
            }
            PredicateType::EndsWith | PredicateType::NotEndsWith => {
                format!("%{}", escape_like(text))
            }
            PredicateType::Contains | PredicateType::NotContains => {
                format!("%{}%", escape_like(text))
            }
            _ => text.to_string(),
        };
        let placeholder = self.bind(p.identifier(), Value::String(pattern))?;
        Ok(format!(
            "({} LIKE {}{})",
            col,
            placeholder,
            self.dbms_type.like_escape_clause()
        ))
    }

    fn bind_operand<E>(&mut self, p: &FieldPredicate<E>, index: usize) -> Result<String> {
        let value = p
            .operands()
            .get(index)
            .cloned()
            .ok_or_else(|| missing_operand(p))?;
        self.bind(p.identifier(), value)
    }

    fn bind(&mut self, id: &ColumnIdentifier, value: Value) -> Result<String> {
        let expected = (self.column_type)(id)?;
        let coerced = value
            .coerce_to(&expected)
            .ok_or_else(|| Error::TypeMismatch {
                column: id.clone(),
                expected,
                found: format!("{:?}", value),
            })?;
        self.values.push(coerced);
        Ok(self.dbms_type.placeholder(self.values.len()))
    }
}

fn missing_operand<E>(p: &FieldPredicate<E>) -> Error {
    Error::InvalidOperand(format!(
        "{:?} on {} is missing an operand",
        p.predicate_type(),
        p.identifier()
    ))
}
