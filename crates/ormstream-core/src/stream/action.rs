//! Recorded stream stages.

use crate::field::Comparator;
use crate::predicate::Predicate;
use std::fmt;
use std::sync::Arc;

/// Element transformation.
pub type MapFn<E> = Arc<dyn Fn(E) -> E + Send + Sync>;
/// One-to-many element transformation.
pub type FlatMapFn<E> = Arc<dyn Fn(E) -> Vec<E> + Send + Sync>;
/// Side-effecting observer.
pub type PeekFn<E> = Arc<dyn Fn(&E) + Send + Sync>;
/// Equality used to drop duplicates.
pub type EqFn<E> = Arc<dyn Fn(&E, &E) -> bool + Send + Sync>;

/// One stage of a stream pipeline.
pub enum Action<E> {
    /// Keep elements matching the predicate.
    Filter(Predicate<E>),
    /// Transform each element.
    Map(MapFn<E>),
    /// Replace each element with zero or more elements.
    FlatMap(FlatMapFn<E>),
    /// Observe each element.
    Peek(PeekFn<E>),
    /// Stable sort.
    Sorted(Comparator<E>),
    /// Drop elements equal to an earlier one.
    Distinct(EqFn<E>),
    /// Drop the first `n` elements.
    Skip(u64),
    /// Keep at most `n` elements.
    Limit(u64),
}

impl<E> Action<E> {
    /// Stage name, as shown by `explain`.
    pub fn name(&self) -> &'static str {
        match self {
            Action::Filter(_) => "filter",
            Action::Map(_) => "map",
            Action::FlatMap(_) => "flat_map",
            Action::Peek(_) => "peek",
            Action::Sorted(_) => "sorted",
            Action::Distinct(_) => "distinct",
            Action::Skip(_) => "skip",
            Action::Limit(_) => "limit",
        }
    }

    /// Whether the stage can, in principle, be expressed in SQL.
    pub fn is_pushable(&self) -> bool {
        match self {
            Action::Filter(predicate) => predicate.is_pushable(),
            Action::Sorted(comparator) => comparator.is_pushable(),
            Action::Skip(_) | Action::Limit(_) => true,
            Action::Map(_) | Action::FlatMap(_) | Action::Peek(_) | Action::Distinct(_) => false,
        }
    }

    /// Apply the stage to a materialized sequence.
    pub fn apply(&self, elements: Vec<E>) -> Vec<E> {
        match self {
            Action::Filter(predicate) => elements
                .into_iter()
                .filter(|e| predicate.test(e))
                .collect(),
            Action::Map(map) => elements.into_iter().map(|e| map(e)).collect(),
            Action::FlatMap(flat_map) => elements.into_iter().flat_map(|e| flat_map(e)).collect(),
            Action::Peek(peek) => {
                elements.iter().for_each(|e| peek(e));
                elements
            }
            Action::Sorted(comparator) => {
                let mut elements = elements;
                elements.sort_by(|a, b| comparator.compare(a, b));
                elements
            }
            Action::Distinct(eq) => {
                let mut kept: Vec<E> = Vec::with_capacity(elements.len());
                for element in elements {
                    if !kept.iter().any(|k| eq(k, &element)) {
                        kept.push(element);
                    }
                }
                kept
            }
            Action::Skip(n) => elements.into_iter().skip(saturating_usize(*n)).collect(),
            Action::Limit(n) => elements.into_iter().take(saturating_usize(*n)).collect(),
        }
    }
}

fn saturating_usize(n: u64) -> usize {
    usize::try_from(n).unwrap_or(usize::MAX)
}

impl<E> Clone for Action<E> {
    fn clone(&self) -> Self {
        match self {
            Action::Filter(p) => Action::Filter(p.clone()),
            Action::Map(f) => Action::Map(Arc::clone(f)),
            Action::FlatMap(f) => Action::FlatMap(Arc::clone(f)),
            Action::Peek(f) => Action::Peek(Arc::clone(f)),
            Action::Sorted(c) => Action::Sorted(c.clone()),
            Action::Distinct(f) => Action::Distinct(Arc::clone(f)),
            Action::Skip(n) => Action::Skip(*n),
            Action::Limit(n) => Action::Limit(*n),
        }
    }
}

impl<E> fmt::Debug for Action<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Filter(p) => f.debug_tuple("Filter").field(p).finish(),
            Action::Sorted(c) => f.debug_tuple("Sorted").field(c).finish(),
            Action::Skip(n) => f.debug_tuple("Skip").field(n).finish(),
            Action::Limit(n) => f.debug_tuple("Limit").field(n).finish(),
            other => write!(f, "{}(<closure>)", other.name()),
        }
    }
}
