//! Predicate trees.
//!
//! A [`Predicate`] is either a recognizable field predicate, a boolean
//! composition of predicates, or an opaque closure. Only trees made entirely
//! of recognizable nodes can be rendered to SQL; see [`is_pushable`].

mod classify;
mod field_predicate;

pub use classify::{find_unpushable, is_pushable};
pub use field_predicate::{escape_like, like_match, FieldPredicate, Inclusion, PredicateType};

use std::fmt;
use std::sync::Arc;

/// Shared opaque test closure.
pub type TestFn<E> = Arc<dyn Fn(&E) -> bool + Send + Sync>;

/// A boolean test over entities.
pub enum Predicate<E> {
    /// Operator applied to a single field.
    Field(FieldPredicate<E>),
    /// Both sides hold.
    And(Box<Predicate<E>>, Box<Predicate<E>>),
    /// Either side holds.
    Or(Box<Predicate<E>>, Box<Predicate<E>>),
    /// Explicit negation of a predicate without a complement.
    Not(Box<Predicate<E>>),
    /// Arbitrary closure; never pushable.
    Opaque(TestFn<E>),
}

impl<E> Predicate<E> {
    /// Predicate from an arbitrary closure.
    pub fn from_fn<F>(test: F) -> Self
    where
        F: Fn(&E) -> bool + Send + Sync + 'static,
    {
        Predicate::Opaque(Arc::new(test))
    }

    /// Conjunction with another predicate.
    pub fn and(self, other: impl Into<Predicate<E>>) -> Self {
        Predicate::And(Box::new(self), Box::new(other.into()))
    }

    /// Disjunction with another predicate.
    pub fn or(self, other: impl Into<Predicate<E>>) -> Self {
        Predicate::Or(Box::new(self), Box::new(other.into()))
    }

    /// Conjunction with a closure.
    pub fn and_fn<F>(self, test: F) -> Self
    where
        F: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.and(Predicate::from_fn(test))
    }

    /// Logical negation.
    ///
    /// Field predicates take their complement operator when one exists and
    /// are wrapped in [`Predicate::Not`] otherwise. AND and OR are expanded
    /// with De Morgan's laws, a NOT wrapper is removed, and opaque closures
    /// are wrapped.
    pub fn negate(&self) -> Self {
        match self {
            Predicate::Field(p) => match p.complement() {
                Some(complement) => Predicate::Field(complement),
                None => Predicate::Not(Box::new(self.clone())),
            },
            Predicate::And(left, right) => {
                Predicate::Or(Box::new(left.negate()), Box::new(right.negate()))
            }
            Predicate::Or(left, right) => {
                Predicate::And(Box::new(left.negate()), Box::new(right.negate()))
            }
            Predicate::Not(inner) => (**inner).clone(),
            Predicate::Opaque(_) => Predicate::Not(Box::new(self.clone())),
        }
    }

    /// Evaluate against an entity.
    ///
    /// An entity passes only when the predicate is definitely true, so a
    /// NOT over an operator on a null field fails just like the operator.
    pub fn test(&self, entity: &E) -> bool {
        self.evaluate(entity) == Some(true)
    }

    /// Evaluate with SQL's three-valued logic, `None` being unknown.
    pub fn evaluate(&self, entity: &E) -> Option<bool> {
        match self {
            Predicate::Field(p) => p.evaluate(entity),
            Predicate::And(left, right) => {
                match (left.evaluate(entity), right.evaluate(entity)) {
                    (Some(false), _) | (_, Some(false)) => Some(false),
                    (Some(true), Some(true)) => Some(true),
                    _ => None,
                }
            }
            Predicate::Or(left, right) => {
                match (left.evaluate(entity), right.evaluate(entity)) {
                    (Some(true), _) | (_, Some(true)) => Some(true),
                    (Some(false), Some(false)) => Some(false),
                    _ => None,
                }
            }
            Predicate::Not(inner) => inner.evaluate(entity).map(|b| !b),
            Predicate::Opaque(test) => Some(test(entity)),
        }
    }

    /// Whether the whole tree can be rendered to SQL.
    pub fn is_pushable(&self) -> bool {
        is_pushable(self)
    }
}

impl<E> From<FieldPredicate<E>> for Predicate<E> {
    fn from(predicate: FieldPredicate<E>) -> Self {
        Predicate::Field(predicate)
    }
}

impl<E> std::ops::Not for Predicate<E> {
    type Output = Predicate<E>;

    fn not(self) -> Self::Output {
        self.negate()
    }
}

impl<E> Clone for Predicate<E> {
    fn clone(&self) -> Self {
        match self {
            Predicate::Field(p) => Predicate::Field(p.clone()),
            Predicate::And(l, r) => Predicate::And(l.clone(), r.clone()),
            Predicate::Or(l, r) => Predicate::Or(l.clone(), r.clone()),
            Predicate::Not(inner) => Predicate::Not(inner.clone()),
            Predicate::Opaque(test) => Predicate::Opaque(Arc::clone(test)),
        }
    }
}

impl<E> fmt::Debug for Predicate<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Field(p) => p.fmt(f),
            Predicate::And(l, r) => f.debug_tuple("And").field(l).field(r).finish(),
            Predicate::Or(l, r) => f.debug_tuple("Or").field(l).field(r).finish(),
            Predicate::Not(inner) => f.debug_tuple("Not").field(inner).finish(),
            Predicate::Opaque(_) => f.write_str("Opaque(<closure>)"),
        }
    }
}
