//! Predicates over a single field.

use crate::config::ColumnIdentifier;
use crate::field::Field;
use crate::value::Value;
use std::fmt;

/// Operator tag of a field predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PredicateType {
    /// Matches everything.
    AlwaysTrue,
    /// Matches nothing.
    AlwaysFalse,
    /// `field = a`
    Equal,
    /// `field <> a`
    NotEqual,
    /// `field > a`
    GreaterThan,
    /// `field >= a`
    GreaterOrEqual,
    /// `field < a`
    LessThan,
    /// `field <= a`
    LessOrEqual,
    /// `a <= field < b`, bounds per [`Inclusion`].
    Between,
    /// Complement of [`PredicateType::Between`].
    NotBetween,
    /// `field IN (a, b, ...)`
    In,
    /// `field NOT IN (a, b, ...)`
    NotIn,
    /// `field IS NULL`
    IsNull,
    /// `field IS NOT NULL`
    IsNotNull,
    /// String prefix match.
    StartsWith,
    /// Complement of [`PredicateType::StartsWith`].
    NotStartsWith,
    /// String suffix match.
    EndsWith,
    /// Complement of [`PredicateType::EndsWith`].
    NotEndsWith,
    /// String infix match.
    Contains,
    /// Complement of [`PredicateType::Contains`].
    NotContains,
    /// `field = ''`
    IsEmpty,
    /// Complement of [`PredicateType::IsEmpty`].
    IsNotEmpty,
    /// Raw SQL LIKE pattern. Has no complement operator.
    Like,
}

impl PredicateType {
    /// The logically complementary operator, if there is one.
    pub fn complement(&self) -> Option<PredicateType> {
        use PredicateType::*;
        let complement = match self {
            AlwaysTrue => AlwaysFalse,
            AlwaysFalse => AlwaysTrue,
            Equal => NotEqual,
            NotEqual => Equal,
            GreaterThan => LessOrEqual,
            LessOrEqual => GreaterThan,
            GreaterOrEqual => LessThan,
            LessThan => GreaterOrEqual,
            Between => NotBetween,
            NotBetween => Between,
            In => NotIn,
            NotIn => In,
            IsNull => IsNotNull,
            IsNotNull => IsNull,
            StartsWith => NotStartsWith,
            NotStartsWith => StartsWith,
            EndsWith => NotEndsWith,
            NotEndsWith => EndsWith,
            Contains => NotContains,
            NotContains => Contains,
            IsEmpty => IsNotEmpty,
            IsNotEmpty => IsEmpty,
            Like => return None,
        };
        Some(complement)
    }

    /// Number of operands the operator takes, `None` for a list.
    pub fn operand_count(&self) -> Option<usize> {
        use PredicateType::*;
        match self {
            AlwaysTrue | AlwaysFalse | IsNull | IsNotNull | IsEmpty | IsNotEmpty => Some(0),
            Between | NotBetween => Some(2),
            In | NotIn => None,
            _ => Some(1),
        }
    }
}

/// Bound inclusion of a BETWEEN predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Inclusion {
    /// `start <= field <= end`
    StartInclusiveEndInclusive,
    /// `start <= field < end`
    #[default]
    StartInclusiveEndExclusive,
    /// `start < field <= end`
    StartExclusiveEndInclusive,
    /// `start < field < end`
    StartExclusiveEndExclusive,
}

impl Inclusion {
    /// Whether the start bound is included.
    pub fn is_start_inclusive(&self) -> bool {
        matches!(
            self,
            Inclusion::StartInclusiveEndInclusive | Inclusion::StartInclusiveEndExclusive
        )
    }

    /// Whether the end bound is included.
    pub fn is_end_inclusive(&self) -> bool {
        matches!(
            self,
            Inclusion::StartInclusiveEndInclusive | Inclusion::StartExclusiveEndInclusive
        )
    }
}

/// An immutable predicate on one field: operator, operands and, for BETWEEN,
/// bound inclusion.
pub struct FieldPredicate<E> {
    field: Field<E>,
    predicate_type: PredicateType,
    operands: Vec<Value>,
    inclusion: Inclusion,
}

impl<E> FieldPredicate<E> {
    pub(crate) fn new(
        field: Field<E>,
        predicate_type: PredicateType,
        operands: Vec<Value>,
        inclusion: Inclusion,
    ) -> Self {
        Self {
            field,
            predicate_type,
            operands,
            inclusion,
        }
    }

    /// The field this predicate tests.
    pub fn field(&self) -> &Field<E> {
        &self.field
    }

    /// The identifier of the tested column.
    pub fn identifier(&self) -> &ColumnIdentifier {
        self.field.identifier()
    }

    /// Operator tag.
    pub fn predicate_type(&self) -> PredicateType {
        self.predicate_type
    }

    /// All operands in declaration order.
    pub fn operands(&self) -> &[Value] {
        &self.operands
    }

    /// First operand, if any.
    pub fn first_operand(&self) -> Option<&Value> {
        self.operands.first()
    }

    /// Second operand, if any.
    pub fn second_operand(&self) -> Option<&Value> {
        self.operands.get(1)
    }

    /// BETWEEN bound inclusion.
    pub fn inclusion(&self) -> Inclusion {
        self.inclusion
    }

    /// The predicate with the complementary operator, or `None` when the
    /// operator has no complement.
    pub fn complement(&self) -> Option<FieldPredicate<E>> {
        let predicate_type = self.predicate_type.complement()?;
        Some(Self {
            predicate_type,
            ..self.clone()
        })
    }

    /// Evaluate against an entity.
    ///
    /// A null field value only satisfies IS NULL, so it fails both an
    /// operator and its complement, as in SQL.
    pub fn test(&self, entity: &E) -> bool {
        use PredicateType::*;
        let value = self.field.get(entity);
        let null = Value::Null;
        let operand = self.first_operand().unwrap_or(&null);

        match self.predicate_type {
            AlwaysTrue => true,
            AlwaysFalse => false,
            IsNull => value.is_null(),
            IsNotNull => !value.is_null(),
            _ if value.is_null() => false,
            Equal => value.sql_eq(operand),
            NotEqual => !operand.is_null() && !value.sql_eq(operand),
            GreaterThan => value.partial_compare(operand).is_some_and(|o| o.is_gt()),
            GreaterOrEqual => value.partial_compare(operand).is_some_and(|o| o.is_ge()),
            LessThan => value.partial_compare(operand).is_some_and(|o| o.is_lt()),
            LessOrEqual => value.partial_compare(operand).is_some_and(|o| o.is_le()),
            Between => self.in_range(&value).unwrap_or(false),
            NotBetween => self.in_range(&value).is_some_and(|inside| !inside),
            In => self.operands.iter().any(|o| value.sql_eq(o)),
            NotIn => !self.operands.iter().any(|o| value.sql_eq(o)),
            StartsWith | NotStartsWith | EndsWith | NotEndsWith | Contains | NotContains => {
                match (value.as_str(), operand.as_str()) {
                    (Some(s), Some(needle)) => {
                        let hit = match self.predicate_type {
                            StartsWith | NotStartsWith => s.starts_with(needle),
                            EndsWith | NotEndsWith => s.ends_with(needle),
                            _ => s.contains(needle),
                        };
                        hit == matches!(self.predicate_type, StartsWith | EndsWith | Contains)
                    }
                    _ => false,
                }
            }
            IsEmpty => value.as_str().is_some_and(str::is_empty),
            IsNotEmpty => value.as_str().is_some_and(|s| !s.is_empty()),
            Like => match (value.as_str(), operand.as_str()) {
                (Some(s), Some(pattern)) => like_match(s, pattern),
                _ => false,
            },
        }
    }

    /// Evaluate with SQL's three-valued logic.
    ///
    /// Returns `None` (unknown) when an operator meets a null field value.
    pub fn evaluate(&self, entity: &E) -> Option<bool> {
        use PredicateType::*;
        match self.predicate_type {
            AlwaysTrue | AlwaysFalse | IsNull | IsNotNull => Some(self.test(entity)),
            _ if self.field.get(entity).is_null() => None,
            _ => Some(self.test(entity)),
        }
    }

    fn in_range(&self, value: &Value) -> Option<bool> {
        let start = value.partial_compare(self.first_operand()?)?;
        let end = value.partial_compare(self.second_operand()?)?;

        let after_start = if self.inclusion.is_start_inclusive() {
            start.is_ge()
        } else {
            start.is_gt()
        };
        let before_end = if self.inclusion.is_end_inclusive() {
            end.is_le()
        } else {
            end.is_lt()
        };
        Some(after_start && before_end)
    }
}

impl<E> Clone for FieldPredicate<E> {
    fn clone(&self) -> Self {
        Self {
            field: self.field.clone(),
            predicate_type: self.predicate_type,
            operands: self.operands.clone(),
            inclusion: self.inclusion,
        }
    }
}

impl<E> fmt::Debug for FieldPredicate<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("FieldPredicate");
        debug
            .field("column", &self.identifier().to_string())
            .field("type", &self.predicate_type)
            .field("operands", &self.operands);
        if matches!(
            self.predicate_type,
            PredicateType::Between | PredicateType::NotBetween
        ) {
            debug.field("inclusion", &self.inclusion);
        }
        debug.finish()
    }
}

/// Match a string against a SQL LIKE pattern.
///
/// `%` matches any run of characters, `_` exactly one, and `\` escapes the
/// next pattern character.
pub fn like_match(value: &str, pattern: &str) -> bool {
    let value: Vec<char> = value.chars().collect();
    let pattern: Vec<char> = pattern.chars().collect();
    like_match_from(&value, &pattern)
}

fn like_match_from(value: &[char], pattern: &[char]) -> bool {
    match pattern.split_first() {
        None => value.is_empty(),
        Some((&'%', rest)) => {
            if rest.is_empty() {
                return true;
            }
            (0..=value.len()).any(|skip| like_match_from(&value[skip..], rest))
        }
        Some((&'_', rest)) => !value.is_empty() && like_match_from(&value[1..], rest),
        Some((&'\\', rest)) => match rest.split_first() {
            Some((literal, rest)) => {
                value.first() == Some(literal) && like_match_from(&value[1..], rest)
            }
            // A trailing backslash matches itself.
            None => value == ['\\'],
        },
        Some((c, rest)) => value.first() == Some(c) && like_match_from(&value[1..], rest),
    }
}

/// Escape `%`, `_` and `\` so `text` matches literally inside a LIKE pattern.
pub fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complements_are_involutions() {
        use PredicateType::*;
        let all = [
            AlwaysTrue, AlwaysFalse, Equal, NotEqual, GreaterThan, GreaterOrEqual, LessThan,
            LessOrEqual, Between, NotBetween, In, NotIn, IsNull, IsNotNull, StartsWith,
            NotStartsWith, EndsWith, NotEndsWith, Contains, NotContains, IsEmpty, IsNotEmpty,
        ];
        for ty in all {
            let complement = ty.complement().unwrap();
            assert_ne!(complement, ty);
            assert_eq!(complement.complement(), Some(ty));
        }
        assert_eq!(GreaterThan.complement(), Some(LessOrEqual));
        assert_eq!(GreaterOrEqual.complement(), Some(LessThan));
        assert_eq!(Like.complement(), None);
    }

    #[test]
    fn test_inclusion_flags() {
        assert!(Inclusion::default().is_start_inclusive());
        assert!(!Inclusion::default().is_end_inclusive());
        assert!(!Inclusion::StartExclusiveEndInclusive.is_start_inclusive());
        assert!(Inclusion::StartExclusiveEndInclusive.is_end_inclusive());
    }

    #[test]
    fn test_like_match() {
        assert!(like_match("hello", "hello"));
        assert!(like_match("hello", "h%"));
        assert!(like_match("hello", "%llo"));
        assert!(like_match("hello", "%ll%"));
        assert!(like_match("hello", "h_llo"));
        assert!(!like_match("hello", "h_lo"));
        assert!(like_match("", "%"));
        assert!(!like_match("", "_"));
        assert!(like_match("50%", "50\\%"));
        assert!(!like_match("500", "50\\%"));
        assert!(like_match("a_b", "a\\_b"));
        assert!(!like_match("axb", "a\\_b"));
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert!(like_match("50%_off\\x", &format!("{}%", escape_like("50%_off\\"))));
        assert_eq!(escape_like("plain"), "plain");
    }
}
