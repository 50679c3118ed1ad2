//! Compiles parsed conditions into predicates over dynamic rows.
//!
//! Column names resolve against one configured table, by database name or
//! alias. Literals are checked against the column type so that a compiled
//! predicate always renders.

use crate::ast::*;
use crate::error::CompileError;
use crate::span::Span;
use ormstream_core::{
    column_field, Column, Field, Inclusion, Predicate, PredicateType, Project, Row, Table,
    TableIdentifier, Value,
};

/// Resolves conditions against a configured table.
#[derive(Debug)]
pub struct FilterCompiler<'a> {
    id: TableIdentifier,
    table: &'a Table,
}

impl<'a> FilterCompiler<'a> {
    /// Compiler for `table` of `project`.
    pub fn new(project: &'a Project, id: &TableIdentifier) -> Result<Self, CompileError> {
        let table = project
            .find_table(id)
            .ok_or_else(|| CompileError::unknown_table(&id.to_string()))?;
        Ok(Self {
            id: id.clone(),
            table,
        })
    }

    /// The table conditions resolve against.
    pub fn table(&self) -> &TableIdentifier {
        &self.id
    }

    /// Compile a condition into a pushable predicate.
    pub fn compile(&self, condition: &Condition) -> Result<Predicate<Row>, CompileError> {
        match condition {
            Condition::Comparison { field, op, value } => {
                let (column, row_field) = self.resolve(&field.value, field.span)?;
                if value.value == Literal::Null {
                    return match op {
                        ComparisonOp::Eq => {
                            Ok(row_field.predicate(PredicateType::IsNull, Vec::new()))
                        }
                        ComparisonOp::Ne => {
                            Ok(row_field.predicate(PredicateType::IsNotNull, Vec::new()))
                        }
                        _ => Err(CompileError::invalid_literal(
                            format!("null cannot be compared with '{}'", op),
                            value.span,
                        )),
                    };
                }
                let operand = self.operand(column, &value.value, value.span)?;
                let predicate_type = match op {
                    ComparisonOp::Eq => PredicateType::Equal,
                    ComparisonOp::Ne => PredicateType::NotEqual,
                    ComparisonOp::Lt => PredicateType::LessThan,
                    ComparisonOp::Le => PredicateType::LessOrEqual,
                    ComparisonOp::Gt => PredicateType::GreaterThan,
                    ComparisonOp::Ge => PredicateType::GreaterOrEqual,
                };
                Ok(row_field.predicate(predicate_type, vec![operand]))
            }

            Condition::IsNull { field, negated } => {
                let (_, row_field) = self.resolve(&field.value, field.span)?;
                let predicate_type = if *negated {
                    PredicateType::IsNotNull
                } else {
                    PredicateType::IsNull
                };
                Ok(row_field.predicate(predicate_type, Vec::new()))
            }

            Condition::In {
                field,
                values,
                negated,
            } => {
                let (column, row_field) = self.resolve(&field.value, field.span)?;
                let operands = values
                    .iter()
                    .map(|v| self.non_null_operand(column, &v.value, v.span))
                    .collect::<Result<Vec<_>, _>>()?;
                let predicate_type = if *negated {
                    PredicateType::NotIn
                } else {
                    PredicateType::In
                };
                Ok(row_field.predicate(predicate_type, operands))
            }

            Condition::Between {
                field,
                low,
                high,
                negated,
            } => {
                let (column, row_field) = self.resolve(&field.value, field.span)?;
                let operands = vec![
                    self.non_null_operand(column, &low.value, low.span)?,
                    self.non_null_operand(column, &high.value, high.span)?,
                ];
                let predicate_type = if *negated {
                    PredicateType::NotBetween
                } else {
                    PredicateType::Between
                };
                Ok(row_field.predicate_with(
                    predicate_type,
                    operands,
                    Inclusion::StartInclusiveEndInclusive,
                ))
            }

            Condition::Text {
                field,
                op,
                pattern,
                negated,
            } => {
                let (column, row_field) = self.resolve(&field.value, field.span)?;
                self.require_string(column, field.span, &op.to_string())?;
                let operand = vec![Value::String(pattern.value.clone())];
                let predicate_type = match (op, negated) {
                    (TextOp::StartsWith, false) => PredicateType::StartsWith,
                    (TextOp::StartsWith, true) => PredicateType::NotStartsWith,
                    (TextOp::EndsWith, false) => PredicateType::EndsWith,
                    (TextOp::EndsWith, true) => PredicateType::NotEndsWith,
                    (TextOp::Contains, false) => PredicateType::Contains,
                    (TextOp::Contains, true) => PredicateType::NotContains,
                    (TextOp::Like, _) => PredicateType::Like,
                };
                let predicate = row_field.predicate(predicate_type, operand);
                // LIKE has no complement operator
                if matches!((op, negated), (TextOp::Like, true)) {
                    Ok(predicate.negate())
                } else {
                    Ok(predicate)
                }
            }

            Condition::Empty { field, negated } => {
                let (column, row_field) = self.resolve(&field.value, field.span)?;
                let keyword = if *negated { "isNotEmpty" } else { "isEmpty" };
                self.require_string(column, field.span, keyword)?;
                let predicate_type = if *negated {
                    PredicateType::IsNotEmpty
                } else {
                    PredicateType::IsEmpty
                };
                Ok(row_field.predicate(predicate_type, Vec::new()))
            }

            Condition::Not(inner) => Ok(self.compile(inner)?.negate()),

            Condition::And(conditions) => self.fold(conditions, |a, b| a.and(b)),
            Condition::Or(conditions) => self.fold(conditions, |a, b| a.or(b)),
        }
    }

    fn fold(
        &self,
        conditions: &[Condition],
        combine: fn(Predicate<Row>, Predicate<Row>) -> Predicate<Row>,
    ) -> Result<Predicate<Row>, CompileError> {
        let mut compiled = conditions.iter().map(|c| self.compile(c));
        let first = match compiled.next() {
            Some(first) => first?,
            None => {
                return Err(CompileError::invalid_literal(
                    "empty condition list",
                    Span::default(),
                ))
            }
        };
        compiled.try_fold(first, |acc, next| Ok(combine(acc, next?)))
    }

    fn resolve(
        &self,
        name: &str,
        span: Span,
    ) -> Result<(&'a Column, Field<Row>), CompileError> {
        let column = self
            .table
            .find_column(name)
            .ok_or_else(|| CompileError::unknown_column(&self.table.name, name, span))?;
        Ok((column, column_field(self.id.column(&column.name))))
    }

    fn operand(
        &self,
        column: &Column,
        literal: &Literal,
        span: Span,
    ) -> Result<Value, CompileError> {
        let value = match literal {
            Literal::Null => Value::Null,
            Literal::Bool(b) => Value::Bool(*b),
            Literal::Int(i) => match i32::try_from(*i) {
                Ok(small) => Value::Int32(small),
                Err(_) => Value::Int64(*i),
            },
            Literal::Float(f) => Value::Float64(*f),
            Literal::String(s) => Value::String(s.clone()),
        };
        value.coerce_to(&column.column_type).ok_or_else(|| {
            CompileError::type_mismatch(
                &column.name,
                &column.column_type.to_string(),
                literal.type_name(),
                span,
            )
        })
    }

    fn non_null_operand(
        &self,
        column: &Column,
        literal: &Literal,
        span: Span,
    ) -> Result<Value, CompileError> {
        if *literal == Literal::Null {
            return Err(CompileError::invalid_literal(
                "null is not allowed here; use 'is null'",
                span,
            ));
        }
        self.operand(column, literal, span)
    }

    fn require_string(
        &self,
        column: &Column,
        span: Span,
        operator: &str,
    ) -> Result<(), CompileError> {
        if column.column_type.is_string_like() {
            Ok(())
        } else {
            Err(CompileError::type_mismatch(
                &column.name,
                "string",
                &format!("{} column for '{}'", column.column_type, operator),
                span,
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CompileErrorKind;
    use crate::parser::parse;
    use ormstream_core::{render_where, ColumnIdentifier, DbmsType, Dbms, ScalarType, Schema};
    use pretty_assertions::assert_eq;

    fn project() -> Project {
        let film = Table::new("film")
            .with_column(Column::new("film_id", ScalarType::Int32).with_alias("id"))
            .with_column(Column::new("title", ScalarType::String))
            .with_column(Column::nullable("rating", ScalarType::String))
            .with_column(Column::new("length", ScalarType::Int32))
            .with_column(Column::new("rental_rate", ScalarType::Float64))
            .with_column(Column::new("legacy", ScalarType::String).disabled());
        Project::new("sakila").with_dbms(
            Dbms::new("db", DbmsType::Generic).with_schema(Schema::new("sakila").with_table(film)),
        )
    }

    fn film() -> TableIdentifier {
        TableIdentifier::new("db", "sakila", "film")
    }

    fn compile(source: &str) -> Result<Predicate<Row>, CompileError> {
        let project = project();
        let compiler = FilterCompiler::new(&project, &film())?;
        compiler.compile(&parse(source).expect("parse"))
    }

    fn sql(source: &str) -> (String, Vec<Value>) {
        let predicate = compile(source).unwrap();
        let project = project();
        let result = render_where(
            DbmsType::Generic,
            |id: &ColumnIdentifier| Ok(id.column.clone()),
            |id: &ColumnIdentifier| {
                project
                    .find_column(id)
                    .map(|c| c.column_type.clone())
                    .ok_or_else(|| ormstream_core::Error::UnknownColumn(id.clone()))
            },
            &[predicate],
        )
        .unwrap();
        (result.sql, result.values)
    }

    #[test]
    fn test_comparison_by_name_and_alias() {
        assert_eq!(
            sql("id >= 10 && film_id < 20"),
            (
                "((film_id >= ?) AND (film_id < ?))".to_string(),
                vec![Value::Int32(10), Value::Int32(20)]
            )
        );
    }

    #[test]
    fn test_negation_uses_complements() {
        assert_eq!(
            sql("!(length > 60 && rating == 'G')").0,
            "((length <= ?) OR (NOT (rating = ?)))"
        );
        assert_eq!(sql("title not like 'A%'").0, "(NOT (title LIKE ? ESCAPE '\\'))");
    }

    #[test]
    fn test_text_operators() {
        let cases = [
            ("title startsWith 'AC'", PredicateType::StartsWith),
            ("title not startsWith 'AC'", PredicateType::NotStartsWith),
            ("title endsWith 'UR'", PredicateType::EndsWith),
            ("title not contains 'DINO'", PredicateType::NotContains),
            ("title like 'A_E%'", PredicateType::Like),
        ];
        for (source, expected) in cases {
            match compile(source).unwrap() {
                Predicate::Field(p) => assert_eq!(p.predicate_type(), expected, "{}", source),
                other => panic!("expected a field predicate for {}, got {:?}", source, other),
            }
        }
        assert!(matches!(compile("title not like 'A%'").unwrap(), Predicate::Not(_)));
    }

    #[test]
    fn test_null_comparisons() {
        assert_eq!(sql("rating == null").0, "(rating IS NULL)");
        assert_eq!(sql("rating != null").0, "(rating IS NOT NULL)");
        assert_eq!(
            compile("rating > null").unwrap_err().kind,
            CompileErrorKind::InvalidLiteral
        );
        assert_eq!(
            compile("id in [1, null]").unwrap_err().kind,
            CompileErrorKind::InvalidLiteral
        );
    }

    #[test]
    fn test_between_is_inclusive() {
        let (sql, values) = sql("length between 60 and 120");
        assert_eq!(sql, "(length >= ? AND length <= ?)");
        assert_eq!(values, vec![Value::Int32(60), Value::Int32(120)]);
    }

    #[test]
    fn test_literals_coerced_to_column_type() {
        assert_eq!(sql("rental_rate > 2").1, vec![Value::Float64(2.0)]);
        assert_eq!(
            compile("length == 'long'").unwrap_err().kind,
            CompileErrorKind::TypeMismatch
        );
        assert_eq!(
            compile("length startsWith '1'").unwrap_err().kind,
            CompileErrorKind::TypeMismatch
        );
    }

    #[test]
    fn test_unknown_and_disabled_columns() {
        let err = compile("legacy == 'x'").unwrap_err();
        assert_eq!(err.kind, CompileErrorKind::UnknownColumn);
        assert_eq!(err.span, Span::new(0, 6));

        let project = project();
        let missing = FilterCompiler::new(&project, &TableIdentifier::new("db", "sakila", "actor"));
        assert_eq!(missing.unwrap_err().kind, CompileErrorKind::UnknownTable);
    }

    #[test]
    fn test_compiled_predicate_evaluates_rows() {
        let predicate =
            compile("title startsWith 'AC' && (rating is null || length > 100)").unwrap();
        assert!(predicate.is_pushable());

        let row = |title: &str, rating: Option<&str>, length: i32| {
            Row::new()
                .with("title", title)
                .with("rating", rating)
                .with("length", length)
        };
        assert!(predicate.test(&row("ACE GOLDFINGER", None, 48)));
        assert!(predicate.test(&row("ACADEMY DINOSAUR", Some("PG"), 186)));
        assert!(!predicate.test(&row("ACADEMY DINOSAUR", Some("PG"), 86)));
        assert!(!predicate.test(&row("BABY HALL", None, 153)));
    }
}
