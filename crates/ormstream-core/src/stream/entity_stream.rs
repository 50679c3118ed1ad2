//! Fluent stream builder and terminal operations.

use super::terminator::{self, Explain};
use super::{Action, Pipeline, Source};
use crate::error::{Error, Result};
use crate::field::Comparator;
use crate::predicate::Predicate;
use std::cmp::Ordering;
use std::sync::Arc;

/// A lazily described stream of entities.
///
/// Intermediate operations only record actions; nothing runs until a
/// terminal operation consumes the stream. Against a table source the
/// leading pushable stages are executed as a single SELECT and the rest
/// replay in memory.
///
/// ```
/// use ormstream_core::EntityStream;
///
/// let evens = EntityStream::of(vec![1, 2, 3, 4, 5, 6])
///     .filter_fn(|n| n % 2 == 0)
///     .map(|n| n * 10)
///     .limit(2)
///     .collect()
///     .unwrap();
/// assert_eq!(evens, vec![20, 40]);
/// ```
#[derive(Debug)]
pub struct EntityStream<E> {
    pipeline: Pipeline<E>,
}

impl<E> EntityStream<E> {
    /// Stream over an arbitrary source.
    pub fn from_source(source: Source<E>) -> Self {
        Self {
            pipeline: Pipeline::new(source),
        }
    }

    /// Stream over an existing pipeline. Fails if it was already consumed.
    pub fn from_pipeline(pipeline: Pipeline<E>) -> Result<Self> {
        if pipeline.is_consumed() {
            return Err(Error::PipelineConsumed);
        }
        Ok(Self { pipeline })
    }

    /// Stream over in-memory elements.
    pub fn of(elements: Vec<E>) -> Self
    where
        E: Send + 'static,
    {
        Self::from_source(Source::from_vec(elements))
    }

    /// Stream over elements produced on demand.
    pub fn from_fn<F>(supplier: F) -> Self
    where
        F: FnOnce() -> Result<Vec<E>> + Send + 'static,
    {
        Self::from_source(Source::Supplier(Box::new(supplier)))
    }

    /// The recorded pipeline.
    pub fn pipeline(&self) -> &Pipeline<E> {
        &self.pipeline
    }

    /// Take the pipeline out, e.g. to rearrange actions by hand.
    pub fn into_pipeline(self) -> Pipeline<E> {
        self.pipeline
    }

    fn with(mut self, action: Action<E>) -> Self {
        self.pipeline.push_action(action);
        self
    }

    /// Keep elements matching `predicate`.
    pub fn filter(self, predicate: impl Into<Predicate<E>>) -> Self {
        self.with(Action::Filter(predicate.into()))
    }

    /// Keep elements matching a closure. Never pushed down.
    pub fn filter_fn<F>(self, test: F) -> Self
    where
        F: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.filter(Predicate::from_fn(test))
    }

    /// Transform each element.
    pub fn map<F>(self, map: F) -> Self
    where
        F: Fn(E) -> E + Send + Sync + 'static,
    {
        self.with(Action::Map(Arc::new(map)))
    }

    /// Replace each element with zero or more elements.
    pub fn flat_map<F>(self, flat_map: F) -> Self
    where
        F: Fn(E) -> Vec<E> + Send + Sync + 'static,
    {
        self.with(Action::FlatMap(Arc::new(flat_map)))
    }

    /// Observe each element as it passes.
    pub fn peek<F>(self, peek: F) -> Self
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        self.with(Action::Peek(Arc::new(peek)))
    }

    /// Stable sort by a comparator.
    pub fn sorted(self, comparator: impl Into<Comparator<E>>) -> Self {
        self.with(Action::Sorted(comparator.into()))
    }

    /// Stable sort by a closure. Never pushed down.
    pub fn sorted_by<F>(self, compare: F) -> Self
    where
        F: Fn(&E, &E) -> Ordering + Send + Sync + 'static,
    {
        self.sorted(Comparator::from_fn(compare))
    }

    /// Drop elements equal to an earlier element.
    pub fn distinct(self) -> Self
    where
        E: PartialEq,
    {
        self.distinct_by(|a: &E, b: &E| a == b)
    }

    /// Drop elements `eq` to an earlier element.
    pub fn distinct_by<F>(self, eq: F) -> Self
    where
        F: Fn(&E, &E) -> bool + Send + Sync + 'static,
    {
        self.with(Action::Distinct(Arc::new(eq)))
    }

    /// Drop the first `n` elements.
    pub fn skip(self, n: u64) -> Self {
        self.with(Action::Skip(n))
    }

    /// Keep at most `n` elements.
    pub fn limit(self, n: u64) -> Self {
        self.with(Action::Limit(n))
    }

    /// Request parallel execution. Recorded only; stages run sequentially.
    pub fn parallel(mut self) -> Self {
        self.pipeline.mark_parallel(true);
        self
    }

    /// Request sequential execution.
    pub fn sequential(mut self) -> Self {
        self.pipeline.mark_parallel(false);
        self
    }

    /// Drop the encounter-order requirement.
    pub fn unordered(mut self) -> Self {
        self.pipeline.mark_unordered();
        self
    }

    /// Run the stream and collect every element.
    pub fn collect(mut self) -> Result<Vec<E>> {
        terminator::collect(self.pipeline.consume()?)
    }

    /// Run the stream, handing each element to `action`.
    pub fn for_each<F>(self, action: F) -> Result<()>
    where
        F: FnMut(E),
    {
        self.collect()?.into_iter().for_each(action);
        Ok(())
    }

    /// Number of elements.
    pub fn count(mut self) -> Result<u64> {
        self.relax_order()?;
        terminator::count(self.pipeline.consume()?)
    }

    /// The first element in encounter order.
    pub fn find_first(self) -> Result<Option<E>> {
        Ok(self.limit(1).collect()?.into_iter().next())
    }

    /// Any element.
    pub fn find_any(mut self) -> Result<Option<E>> {
        self.relax_order()?;
        Ok(self.limit(1).collect()?.into_iter().next())
    }

    /// Whether some element matches `predicate`.
    pub fn any_match(mut self, predicate: impl Into<Predicate<E>>) -> Result<bool> {
        self.relax_order()?;
        let matches = self.filter(predicate).limit(1).collect()?;
        Ok(!matches.is_empty())
    }

    /// Whether every element matches `predicate`; true for an empty stream.
    ///
    /// An element whose predicate evaluates to unknown (an operator over a
    /// null column) does not match. Against a table with a pushable
    /// predicate this compares two `COUNT(*)` queries, with and without the
    /// predicate; otherwise the elements are tested in memory.
    pub fn all_match(mut self, predicate: impl Into<Predicate<E>>) -> Result<bool> {
        let predicate = predicate.into();
        self.relax_order()?;

        if predicate.is_pushable() {
            if let Some(Source::Table(table)) = self.pipeline.source() {
                let mut matching = Pipeline::new(Source::Table(Arc::clone(table)));
                for action in self.pipeline.iter() {
                    matching.push_action(action.clone());
                }
                let matching = Self { pipeline: matching }.filter(predicate).count()?;
                let total = self.count()?;
                return Ok(matching == total);
            }
        }

        let elements = self.collect()?;
        Ok(elements.iter().all(|e| predicate.test(e)))
    }

    /// Whether no element matches `predicate`.
    pub fn none_match(self, predicate: impl Into<Predicate<E>>) -> Result<bool> {
        Ok(!self.any_match(predicate)?)
    }

    /// Describe how the stream would run, without running it.
    pub fn explain(&self) -> Result<Explain> {
        let source = self.pipeline.source().ok_or(Error::PipelineConsumed)?;
        let actions: Vec<Action<E>> = self.pipeline.iter().cloned().collect();
        terminator::explain(source, &actions)
    }

    /// Mark the stream unordered and drop sorts whose order nothing observes.
    fn relax_order(&mut self) -> Result<()> {
        self.pipeline.mark_unordered();

        let observed_until = self
            .pipeline
            .iter()
            .enumerate()
            .filter(|(_, action)| matches!(action, Action::Skip(_) | Action::Limit(_)))
            .map(|(index, _)| index + 1)
            .last()
            .unwrap_or(0);
        let unobserved: Vec<usize> = self
            .pipeline
            .iter()
            .enumerate()
            .filter(|(index, action)| {
                *index >= observed_until && matches!(action, Action::Sorted(_))
            })
            .map(|(index, _)| index)
            .collect();

        for index in unobserved.into_iter().rev() {
            self.pipeline.remove(index)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn test_intermediate_operations_are_lazy() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let stream = EntityStream::of(vec![3, 1, 2]).peek(move |n: &i32| sink.lock().push(*n));

        assert!(seen.lock().is_empty());
        assert_eq!(stream.pipeline().len(), 1);

        assert_eq!(stream.collect().unwrap(), vec![3, 1, 2]);
        assert_eq!(*seen.lock(), vec![3, 1, 2]);
    }

    #[test]
    fn test_in_memory_pipeline() {
        let result = EntityStream::of(vec![5, 3, 8, 3, 1, 9])
            .distinct()
            .sorted_by(|a: &i32, b: &i32| a.cmp(b))
            .skip(1)
            .flat_map(|n: i32| vec![n, -n])
            .filter_fn(|n: &i32| *n > 0)
            .collect()
            .unwrap();
        assert_eq!(result, vec![3, 5, 8, 9]);
    }

    #[test]
    fn test_find_first_and_any() {
        assert_eq!(
            EntityStream::of(vec![4, 2, 7])
                .sorted_by(|a: &i32, b: &i32| a.cmp(b))
                .find_first()
                .unwrap(),
            Some(2)
        );
        assert_eq!(EntityStream::of(Vec::<i32>::new()).find_any().unwrap(), None);
    }

    #[test]
    fn test_count_drops_unobserved_sort() {
        let mut stream = EntityStream::of(vec![1, 2, 3])
            .sorted_by(|a: &i32, b: &i32| b.cmp(a))
            .limit(2)
            .sorted_by(|a: &i32, b: &i32| a.cmp(b));
        stream.relax_order().unwrap();

        let names: Vec<_> = stream.pipeline().iter().map(Action::name).collect();
        assert_eq!(names, vec!["sorted", "limit"]);
        assert!(!stream.pipeline().is_ordered());
        assert_eq!(stream.count().unwrap(), 2);
    }

    #[test]
    fn test_matches() {
        let numbers = || EntityStream::of(vec![2, 4, 6]);

        assert!(numbers().any_match(Predicate::from_fn(|n: &i32| *n == 4)).unwrap());
        assert!(numbers().all_match(Predicate::from_fn(|n: &i32| n % 2 == 0)).unwrap());
        assert!(!numbers().all_match(Predicate::from_fn(|n: &i32| *n > 2)).unwrap());
        assert!(numbers().none_match(Predicate::from_fn(|n: &i32| *n > 6)).unwrap());
        assert!(EntityStream::of(Vec::<i32>::new())
            .all_match(Predicate::from_fn(|_: &i32| false))
            .unwrap());
    }

    #[test]
    fn test_all_match_fails_on_unknown() {
        #[derive(Debug)]
        struct Person {
            age: Option<i32>,
        }

        let age = crate::field::ComparableField::new(
            crate::config::ColumnIdentifier::new("db", "s", "people", "age"),
            |p: &Person| p.age,
        );
        let people = || EntityStream::of(vec![Person { age: Some(40) }, Person { age: None }]);

        assert!(!people().all_match(age.greater_than(3)).unwrap());
        assert!(!people().all_match(age.less_or_equal(3)).unwrap());
        assert!(people().all_match(age.greater_than(3).or(age.is_null())).unwrap());
        assert!(!people().none_match(age.greater_than(3)).unwrap());
    }

    #[test]
    fn test_flags() {
        let stream = EntityStream::of(vec![1]).parallel().unordered();
        assert!(stream.pipeline().is_parallel());
        assert!(!stream.pipeline().is_ordered());
        assert!(!stream.sequential().pipeline().is_parallel());
    }

    #[test]
    fn test_supplier_errors_propagate() {
        let result =
            EntityStream::<i32>::from_fn(|| Err(Error::Executor("offline".into()))).collect();
        assert!(matches!(result, Err(Error::Executor(_))));
    }

    #[test]
    fn test_from_consumed_pipeline() {
        let mut pipeline = EntityStream::of(vec![1]).into_pipeline();
        pipeline.consume().unwrap();
        assert!(matches!(
            EntityStream::from_pipeline(pipeline),
            Err(Error::PipelineConsumed)
        ));
    }
}
