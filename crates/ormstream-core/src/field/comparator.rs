//! Sort comparators built from fields or closures.

use super::Field;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Ascending order.
    #[default]
    Ascending,
    /// Descending order.
    Descending,
}

impl SortOrder {
    /// SQL keyword for the direction.
    pub fn sql(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "ASC",
            SortOrder::Descending => "DESC",
        }
    }

    /// The opposite direction.
    pub fn reversed(&self) -> SortOrder {
        match self {
            SortOrder::Ascending => SortOrder::Descending,
            SortOrder::Descending => SortOrder::Ascending,
        }
    }
}

/// Shared comparison closure.
pub type CompareFn<E> = Arc<dyn Fn(&E, &E) -> Ordering + Send + Sync>;

/// One key of a comparator.
pub enum SortKey<E> {
    /// Order by a field's value. Can be rendered as `ORDER BY`.
    Field {
        /// Field to order by.
        field: Field<E>,
        /// Direction.
        order: SortOrder,
    },
    /// Opaque comparison; only evaluable in memory.
    Custom {
        /// Comparison closure.
        compare: CompareFn<E>,
        /// Whether the closure's result is flipped.
        reversed: bool,
    },
}

impl<E> SortKey<E> {
    /// Key ordering by a field.
    pub fn field(field: Field<E>, order: SortOrder) -> Self {
        SortKey::Field { field, order }
    }

    /// Key from a comparison closure.
    pub fn from_fn<F>(compare: F) -> Self
    where
        F: Fn(&E, &E) -> Ordering + Send + Sync + 'static,
    {
        SortKey::Custom {
            compare: Arc::new(compare),
            reversed: false,
        }
    }

    /// Whether the key can be expressed in SQL.
    pub fn is_pushable(&self) -> bool {
        matches!(self, SortKey::Field { .. })
    }

    /// Compare two entities on this key.
    pub fn compare(&self, a: &E, b: &E) -> Ordering {
        match self {
            SortKey::Field { field, order } => {
                let ordering = field.get(a).sort_cmp(&field.get(b));
                match order {
                    SortOrder::Ascending => ordering,
                    SortOrder::Descending => ordering.reverse(),
                }
            }
            SortKey::Custom { compare, reversed } => {
                let ordering = compare(a, b);
                if *reversed {
                    ordering.reverse()
                } else {
                    ordering
                }
            }
        }
    }

    fn reversed(&self) -> Self {
        match self {
            SortKey::Field { field, order } => SortKey::Field {
                field: field.clone(),
                order: order.reversed(),
            },
            SortKey::Custom { compare, reversed } => SortKey::Custom {
                compare: Arc::clone(compare),
                reversed: !reversed,
            },
        }
    }
}

impl<E> Clone for SortKey<E> {
    fn clone(&self) -> Self {
        match self {
            SortKey::Field { field, order } => SortKey::Field {
                field: field.clone(),
                order: *order,
            },
            SortKey::Custom { compare, reversed } => SortKey::Custom {
                compare: Arc::clone(compare),
                reversed: *reversed,
            },
        }
    }
}

impl<E> fmt::Debug for SortKey<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortKey::Field { field, order } => write!(f, "{} {}", field.identifier(), order.sql()),
            SortKey::Custom { reversed: false, .. } => f.write_str("<closure>"),
            SortKey::Custom { reversed: true, .. } => f.write_str("<closure> reversed"),
        }
    }
}

/// Ordered list of sort keys; later keys break ties of earlier ones.
pub struct Comparator<E> {
    keys: Vec<SortKey<E>>,
}

impl<E> Comparator<E> {
    /// Comparator with a single key.
    pub fn new(key: SortKey<E>) -> Self {
        Self { keys: vec![key] }
    }

    /// Comparator from a closure.
    pub fn from_fn<F>(compare: F) -> Self
    where
        F: Fn(&E, &E) -> Ordering + Send + Sync + 'static,
    {
        Self::new(SortKey::from_fn(compare))
    }

    /// Append a tie-breaking key.
    pub fn then(mut self, key: SortKey<E>) -> Self {
        self.keys.push(key);
        self
    }

    /// Append all keys of another comparator.
    pub fn then_comparing(mut self, other: Comparator<E>) -> Self {
        self.keys.extend(other.keys);
        self
    }

    /// Comparator with every key reversed.
    pub fn reversed(&self) -> Self {
        Self {
            keys: self.keys.iter().map(SortKey::reversed).collect(),
        }
    }

    /// The sort keys.
    pub fn keys(&self) -> &[SortKey<E>] {
        &self.keys
    }

    /// Whether every key can be expressed in `ORDER BY`.
    pub fn is_pushable(&self) -> bool {
        self.keys.iter().all(SortKey::is_pushable)
    }

    /// Compare two entities.
    pub fn compare(&self, a: &E, b: &E) -> Ordering {
        self.keys
            .iter()
            .map(|key| key.compare(a, b))
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

impl<E> From<SortKey<E>> for Comparator<E> {
    fn from(key: SortKey<E>) -> Self {
        Comparator::new(key)
    }
}

impl<E> Clone for Comparator<E> {
    fn clone(&self) -> Self {
        Self {
            keys: self.keys.clone(),
        }
    }
}

impl<E> fmt::Debug for Comparator<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.keys).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ColumnIdentifier;

    type Pair = (i32, &'static str);

    fn age() -> Field<Pair> {
        Field::new(ColumnIdentifier::new("db", "s", "t", "age"), |r: &Pair| r.0)
    }

    fn name() -> Field<Pair> {
        Field::new(ColumnIdentifier::new("db", "s", "t", "name"), |r: &Pair| r.1)
    }

    #[test]
    fn test_multi_key_compare() {
        let comparator = Comparator::new(age().descending()).then(name().ascending());
        let mut rows: Vec<Pair> = vec![(1, "b"), (2, "z"), (1, "a")];
        rows.sort_by(|a, b| comparator.compare(a, b));

        assert_eq!(rows, vec![(2, "z"), (1, "a"), (1, "b")]);
        assert!(comparator.is_pushable());
    }

    #[test]
    fn test_custom_key_not_pushable() {
        let by_len = SortKey::from_fn(|a: &Pair, b: &Pair| a.1.len().cmp(&b.1.len()));
        let comparator = Comparator::new(age().ascending()).then(by_len);

        assert!(!comparator.is_pushable());
    }

    #[test]
    fn test_reversed() {
        let comparator = Comparator::from_fn(|a: &Pair, b: &Pair| a.0.cmp(&b.0))
            .then(name().ascending())
            .reversed();
        let mut rows: Vec<Pair> = vec![(1, "a"), (3, "c"), (1, "b")];
        rows.sort_by(|a, b| comparator.compare(a, b));

        assert_eq!(rows, vec![(3, "c"), (1, "b"), (1, "a")]);
    }

    #[test]
    fn test_reversing_twice_restores_custom_order() {
        let by_name = Comparator::from_fn(|a: &Pair, b: &Pair| a.1.cmp(b.1));
        let twice = by_name.reversed().reversed();

        assert_eq!(twice.compare(&(0, "a"), &(0, "b")), Ordering::Less);
        assert_eq!(by_name.reversed().compare(&(0, "a"), &(0, "b")), Ordering::Greater);
        assert_eq!(format!("{:?}", by_name.reversed()), "[<closure> reversed]");
    }
}
