//! Typed field accessors.
//!
//! A field bundles the identity of a configured column with a getter that
//! reads the column's value from an entity. Predicates and comparators are
//! built from fields, which keeps them inspectable for SQL push-down.

mod comparator;

pub use comparator::{Comparator, SortKey, SortOrder};

use crate::config::ColumnIdentifier;
use crate::predicate::{FieldPredicate, Inclusion, Predicate, PredicateType};
use crate::value::Value;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Shared getter reading a column value from an entity.
pub type Getter<E> = Arc<dyn Fn(&E) -> Value + Send + Sync>;

/// Untyped field: a column identifier plus a value getter.
pub struct Field<E> {
    identifier: ColumnIdentifier,
    getter: Getter<E>,
}

impl<E> Field<E> {
    /// Create a field from an identifier and a getter.
    pub fn new<G, R>(identifier: ColumnIdentifier, getter: G) -> Self
    where
        G: Fn(&E) -> R + Send + Sync + 'static,
        R: Into<Value>,
    {
        Self {
            identifier,
            getter: Arc::new(move |entity: &E| getter(entity).into()),
        }
    }

    /// The identifier of the underlying column.
    pub fn identifier(&self) -> &ColumnIdentifier {
        &self.identifier
    }

    /// Read this field's value from an entity.
    pub fn get(&self, entity: &E) -> Value {
        (self.getter)(entity)
    }

    /// Sort key ordering by this field, ascending.
    pub fn ascending(&self) -> SortKey<E> {
        SortKey::field(self.clone(), SortOrder::Ascending)
    }

    /// Sort key ordering by this field, descending.
    pub fn descending(&self) -> SortKey<E> {
        SortKey::field(self.clone(), SortOrder::Descending)
    }

    /// Build a predicate on this field from an operator and its operands.
    ///
    /// IN over an empty list becomes [`PredicateType::AlwaysFalse`] and
    /// NOT IN over an empty list [`PredicateType::AlwaysTrue`].
    pub fn predicate(&self, predicate_type: PredicateType, operands: Vec<Value>) -> Predicate<E> {
        self.predicate_with(predicate_type, operands, Inclusion::default())
    }

    /// Like [`Field::predicate`], with explicit BETWEEN bound inclusion.
    pub fn predicate_with(
        &self,
        predicate_type: PredicateType,
        operands: Vec<Value>,
        inclusion: Inclusion,
    ) -> Predicate<E> {
        let predicate_type = match predicate_type {
            PredicateType::In if operands.is_empty() => PredicateType::AlwaysFalse,
            PredicateType::NotIn if operands.is_empty() => PredicateType::AlwaysTrue,
            other => other,
        };
        Predicate::Field(FieldPredicate::new(
            self.clone(),
            predicate_type,
            operands,
            inclusion,
        ))
    }
}

impl<E> Clone for Field<E> {
    fn clone(&self) -> Self {
        Self {
            identifier: self.identifier.clone(),
            getter: Arc::clone(&self.getter),
        }
    }
}

impl<E> fmt::Debug for Field<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Field").field(&self.identifier.to_string()).finish()
    }
}

/// A field whose values are of type `V`.
///
/// The type parameter only constrains the operands accepted by the predicate
/// builders; evaluation and rendering work on [`Value`]s.
pub struct ComparableField<E, V> {
    field: Field<E>,
    _marker: PhantomData<fn() -> V>,
}

/// A field holding strings, with the string-specific predicate builders.
pub type StringField<E> = ComparableField<E, String>;

impl<E, V: Into<Value>> ComparableField<E, V> {
    /// Create a typed field from an identifier and a getter.
    pub fn new<G>(identifier: ColumnIdentifier, getter: G) -> Self
    where
        G: Fn(&E) -> V + Send + Sync + 'static,
    {
        Self {
            field: Field::new(identifier, getter),
            _marker: PhantomData,
        }
    }

    /// Create a typed field over a nullable column; `None` reads as null.
    pub fn nullable<G>(identifier: ColumnIdentifier, getter: G) -> Self
    where
        G: Fn(&E) -> Option<V> + Send + Sync + 'static,
    {
        Self {
            field: Field::new(identifier, getter),
            _marker: PhantomData,
        }
    }

    /// The untyped field.
    pub fn field(&self) -> &Field<E> {
        &self.field
    }

    /// The identifier of the underlying column.
    pub fn identifier(&self) -> &ColumnIdentifier {
        self.field.identifier()
    }

    /// Read this field's value from an entity.
    pub fn get(&self, entity: &E) -> Value {
        self.field.get(entity)
    }

    /// `field == value`
    pub fn equal(&self, value: impl Into<V>) -> Predicate<E> {
        self.compare(PredicateType::Equal, value)
    }

    /// `field != value`
    pub fn not_equal(&self, value: impl Into<V>) -> Predicate<E> {
        self.compare(PredicateType::NotEqual, value)
    }

    /// `field > value`
    pub fn greater_than(&self, value: impl Into<V>) -> Predicate<E> {
        self.compare(PredicateType::GreaterThan, value)
    }

    /// `field >= value`
    pub fn greater_or_equal(&self, value: impl Into<V>) -> Predicate<E> {
        self.compare(PredicateType::GreaterOrEqual, value)
    }

    /// `field < value`
    pub fn less_than(&self, value: impl Into<V>) -> Predicate<E> {
        self.compare(PredicateType::LessThan, value)
    }

    /// `field <= value`
    pub fn less_or_equal(&self, value: impl Into<V>) -> Predicate<E> {
        self.compare(PredicateType::LessOrEqual, value)
    }

    /// `start <= field < end`
    pub fn between(&self, start: impl Into<V>, end: impl Into<V>) -> Predicate<E> {
        self.between_with(start, end, Inclusion::default())
    }

    /// Range check with explicit bound inclusion.
    pub fn between_with(
        &self,
        start: impl Into<V>,
        end: impl Into<V>,
        inclusion: Inclusion,
    ) -> Predicate<E> {
        self.field.predicate_with(
            PredicateType::Between,
            vec![start.into().into(), end.into().into()],
            inclusion,
        )
    }

    /// Membership in a set of values. An empty set matches nothing.
    pub fn in_values<I, T>(&self, values: I) -> Predicate<E>
    where
        I: IntoIterator<Item = T>,
        T: Into<V>,
    {
        let values = values.into_iter().map(|v| v.into().into()).collect();
        self.field.predicate(PredicateType::In, values)
    }

    /// Non-membership in a set of values. An empty set matches everything.
    pub fn not_in<I, T>(&self, values: I) -> Predicate<E>
    where
        I: IntoIterator<Item = T>,
        T: Into<V>,
    {
        let values = values.into_iter().map(|v| v.into().into()).collect();
        self.field.predicate(PredicateType::NotIn, values)
    }

    /// `field IS NULL`
    pub fn is_null(&self) -> Predicate<E> {
        self.field.predicate(PredicateType::IsNull, Vec::new())
    }

    /// `field IS NOT NULL`
    pub fn is_not_null(&self) -> Predicate<E> {
        self.field.predicate(PredicateType::IsNotNull, Vec::new())
    }

    /// Sort key ordering by this field, ascending.
    pub fn ascending(&self) -> SortKey<E> {
        self.field.ascending()
    }

    /// Sort key ordering by this field, descending.
    pub fn descending(&self) -> SortKey<E> {
        self.field.descending()
    }

    /// Ascending comparator on this field.
    pub fn comparator(&self) -> Comparator<E> {
        Comparator::new(self.ascending())
    }

    fn compare(&self, predicate_type: PredicateType, value: impl Into<V>) -> Predicate<E> {
        self.field
            .predicate(predicate_type, vec![value.into().into()])
    }
}

impl<E> ComparableField<E, String> {
    /// Value starts with `prefix`.
    pub fn starts_with(&self, prefix: impl Into<String>) -> Predicate<E> {
        self.text(PredicateType::StartsWith, prefix)
    }

    /// Value ends with `suffix`.
    pub fn ends_with(&self, suffix: impl Into<String>) -> Predicate<E> {
        self.text(PredicateType::EndsWith, suffix)
    }

    /// Value contains `infix`.
    pub fn contains(&self, infix: impl Into<String>) -> Predicate<E> {
        self.text(PredicateType::Contains, infix)
    }

    /// Value is the empty string.
    pub fn is_empty(&self) -> Predicate<E> {
        self.field.predicate(PredicateType::IsEmpty, Vec::new())
    }

    /// Value is a non-empty string.
    pub fn is_not_empty(&self) -> Predicate<E> {
        self.field.predicate(PredicateType::IsNotEmpty, Vec::new())
    }

    /// Raw SQL LIKE pattern (`%`, `_`, `\` escapes).
    pub fn like(&self, pattern: impl Into<String>) -> Predicate<E> {
        self.text(PredicateType::Like, pattern)
    }

    fn text(&self, predicate_type: PredicateType, operand: impl Into<String>) -> Predicate<E> {
        self.field
            .predicate(predicate_type, vec![Value::String(operand.into())])
    }
}

impl<E, V> Clone for ComparableField<E, V> {
    fn clone(&self) -> Self {
        Self {
            field: self.field.clone(),
            _marker: PhantomData,
        }
    }
}

impl<E, V> fmt::Debug for ComparableField<E, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.field.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct User {
        id: i64,
        name: String,
        nick: Option<String>,
    }

    fn id() -> ComparableField<User, i64> {
        ComparableField::new(ColumnIdentifier::new("db", "s", "user", "id"), |u: &User| u.id)
    }

    fn name() -> StringField<User> {
        ComparableField::new(ColumnIdentifier::new("db", "s", "user", "name"), |u: &User| {
            u.name.clone()
        })
    }

    fn user(id: i64, name: &str) -> User {
        User {
            id,
            name: name.to_string(),
            nick: None,
        }
    }

    #[test]
    fn test_field_getter() {
        let nick: ComparableField<User, Option<String>> =
            ComparableField::new(ColumnIdentifier::new("db", "s", "user", "nick"), |u: &User| {
                u.nick.clone()
            });

        let u = user(7, "ann");
        assert_eq!(id().get(&u), Value::Int64(7));
        assert_eq!(name().get(&u), Value::from("ann"));
        assert_eq!(nick.get(&u), Value::Null);
        assert!(nick.is_null().test(&u));
    }

    #[test]
    fn test_comparison_builders() {
        let u = user(5, "ann");

        assert!(id().equal(5).test(&u));
        assert!(id().not_equal(4).test(&u));
        assert!(id().greater_than(4).test(&u));
        assert!(!id().greater_than(5).test(&u));
        assert!(id().greater_or_equal(5).test(&u));
        assert!(id().less_than(6).test(&u));
        assert!(id().less_or_equal(5).test(&u));
        assert!(id().is_not_null().test(&u));
    }

    #[test]
    fn test_between_inclusion() {
        let u = user(5, "ann");

        assert!(id().between(5, 6).test(&u));
        assert!(!id().between(4, 5).test(&u));
        assert!(id()
            .between_with(4, 5, Inclusion::StartExclusiveEndInclusive)
            .test(&u));
        assert!(!id()
            .between_with(5, 6, Inclusion::StartExclusiveEndExclusive)
            .test(&u));
    }

    #[test]
    fn test_empty_in_collapses() {
        let empty: Vec<i64> = Vec::new();

        match id().in_values(empty.clone()) {
            Predicate::Field(p) => assert_eq!(p.predicate_type(), PredicateType::AlwaysFalse),
            other => panic!("unexpected predicate {:?}", other),
        }
        match id().not_in(empty) {
            Predicate::Field(p) => assert_eq!(p.predicate_type(), PredicateType::AlwaysTrue),
            other => panic!("unexpected predicate {:?}", other),
        }
        assert!(id().in_values([1, 5]).test(&user(5, "x")));
        assert!(id().not_in([1, 2]).test(&user(5, "x")));
    }

    #[test]
    fn test_string_builders() {
        let u = user(1, "100%_sure");

        assert!(name().starts_with("100%").test(&u));
        assert!(name().ends_with("_sure").test(&u));
        assert!(name().contains("%_").test(&u));
        assert!(!name().contains("x").test(&u));
        assert!(name().is_not_empty().test(&u));
        assert!(name().is_empty().test(&user(1, "")));
        assert!(name().like("1__\\%%").test(&u));
        assert!(!name().like("2%").test(&u));
    }
}
