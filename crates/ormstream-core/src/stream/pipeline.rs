//! Ordered, single-use record of stream stages.

use super::{Action, Source};
use crate::error::{Error, Result};
use std::collections::VecDeque;
use std::fmt;

/// The stages of a stream, its data source and its execution flags.
///
/// A pipeline is built up by stream operations and consumed exactly once by
/// a terminal operation. Every mutation after consumption fails with
/// [`Error::PipelineConsumed`]. The pipeline never interprets its actions.
pub struct Pipeline<E> {
    actions: VecDeque<Action<E>>,
    source: Option<Source<E>>,
    parallel: bool,
    ordered: bool,
}

/// Everything a terminal operation takes out of a consumed pipeline.
#[derive(Debug)]
pub struct PipelineParts<E> {
    /// Initial data source.
    pub source: Source<E>,
    /// Stages in insertion order.
    pub actions: Vec<Action<E>>,
    /// Parallel execution was requested.
    pub parallel: bool,
    /// Encounter order must be preserved.
    pub ordered: bool,
}

impl<E> Pipeline<E> {
    /// Open, sequential, ordered pipeline over `source`.
    pub fn new(source: Source<E>) -> Self {
        Self {
            actions: VecDeque::new(),
            source: Some(source),
            parallel: false,
            ordered: true,
        }
    }

    /// Whether a terminal operation has consumed the pipeline.
    pub fn is_consumed(&self) -> bool {
        self.source.is_none()
    }

    /// The data source, `None` once consumed.
    pub fn source(&self) -> Option<&Source<E>> {
        self.source.as_ref()
    }

    /// Insert an action before all others.
    pub fn add_first(&mut self, action: Action<E>) -> Result<()> {
        self.ensure_open()?;
        self.actions.push_front(action);
        Ok(())
    }

    /// Append an action.
    pub fn add_last(&mut self, action: Action<E>) -> Result<()> {
        self.ensure_open()?;
        self.actions.push_back(action);
        Ok(())
    }

    /// Insert an action at `index`, shifting later actions back.
    pub fn add(&mut self, index: usize, action: Action<E>) -> Result<()> {
        self.ensure_open()?;
        if index > self.actions.len() {
            return Err(Error::PipelineIndex {
                index,
                len: self.actions.len(),
            });
        }
        self.actions.insert(index, action);
        Ok(())
    }

    /// Remove and return the action at `index`.
    pub fn remove(&mut self, index: usize) -> Result<Action<E>> {
        self.ensure_open()?;
        let len = self.actions.len();
        self.actions
            .remove(index)
            .ok_or(Error::PipelineIndex { index, len })
    }

    /// Remove every action matching `condition`; returns how many were removed.
    pub fn remove_if<F>(&mut self, mut condition: F) -> Result<usize>
    where
        F: FnMut(&Action<E>) -> bool,
    {
        self.ensure_open()?;
        let before = self.actions.len();
        self.actions.retain(|action| !condition(action));
        Ok(before - self.actions.len())
    }

    /// Remove all actions.
    pub fn clear(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.actions.clear();
        Ok(())
    }

    /// Number of actions.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Whether there are no actions.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// The action at `index`.
    pub fn get(&self, index: usize) -> Option<&Action<E>> {
        self.actions.get(index)
    }

    /// Actions in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Action<E>> {
        self.actions.iter()
    }

    /// Whether parallel execution was requested.
    pub fn is_parallel(&self) -> bool {
        self.parallel
    }

    /// Request parallel or sequential execution.
    pub fn set_parallel(&mut self, parallel: bool) -> Result<()> {
        self.ensure_open()?;
        self.parallel = parallel;
        Ok(())
    }

    /// Whether encounter order must be preserved.
    pub fn is_ordered(&self) -> bool {
        self.ordered
    }

    /// Set the ordering requirement. Terminal operations only ever relax it.
    pub fn set_ordered(&mut self, ordered: bool) -> Result<()> {
        self.ensure_open()?;
        self.ordered = ordered;
        Ok(())
    }

    /// Mark the pipeline consumed and hand its contents to the caller.
    pub fn consume(&mut self) -> Result<PipelineParts<E>> {
        let source = self.source.take().ok_or(Error::PipelineConsumed)?;
        Ok(PipelineParts {
            source,
            actions: self.actions.drain(..).collect(),
            parallel: self.parallel,
            ordered: self.ordered,
        })
    }

    pub(crate) fn push_action(&mut self, action: Action<E>) {
        self.actions.push_back(action);
    }

    pub(crate) fn mark_parallel(&mut self, parallel: bool) {
        self.parallel = parallel;
    }

    pub(crate) fn mark_unordered(&mut self) {
        self.ordered = false;
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_consumed() {
            Err(Error::PipelineConsumed)
        } else {
            Ok(())
        }
    }
}

impl<E> fmt::Debug for Pipeline<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("source", &self.source)
            .field("actions", &self.actions)
            .field("parallel", &self.parallel)
            .field("ordered", &self.ordered)
            .finish()
    }
}
