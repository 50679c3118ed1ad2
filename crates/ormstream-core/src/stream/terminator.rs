//! Terminal execution: push-down planning and in-memory replay.
//!
//! A table-backed pipeline is split into the longest prefix expressible in
//! one SELECT (pushable filters, then one field-based sort, then skip and
//! limit) and the remaining stages, which replay in memory over the rows the
//! query returns. In-memory sources replay every stage.

use super::{Action, PipelineParts, Source, TableSource};
use crate::error::Result;
use crate::field::{Comparator, SortKey};
use crate::predicate::Predicate;
use crate::sql::{render_where, SelectBuilder, SqlQuery};
use std::fmt;
use tracing::debug;

/// How a pipeline would run.
#[derive(Debug, Clone, PartialEq)]
pub struct Explain {
    /// Description of the data source.
    pub source: String,
    /// Statement sent to the database, if any.
    pub query: Option<SqlQuery>,
    /// Stages absorbed into the statement.
    pub pushed_down: Vec<&'static str>,
    /// Stages replayed in memory.
    pub in_memory: Vec<&'static str>,
}

impl fmt::Display for Explain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "source: {}", self.source)?;
        if let Some(query) = &self.query {
            writeln!(f, "query: {}", query)?;
        }
        writeln!(f, "pushed down: [{}]", self.pushed_down.join(", "))?;
        write!(f, "in memory: [{}]", self.in_memory.join(", "))
    }
}

/// The part of a pipeline absorbed into SQL.
struct PushDown<'a, E> {
    filters: Vec<Predicate<E>>,
    sort: Option<&'a Comparator<E>>,
    skip: Option<u64>,
    limit: Option<u64>,
    absorbed: usize,
}

fn analyze<'a, E>(table: &TableSource<E>, actions: &'a [Action<E>]) -> PushDown<'a, E> {
    let config = table.config();
    let mut index = 0;

    let mut filters = Vec::new();
    if config.push_down_filters {
        while let Some(Action::Filter(predicate)) = actions.get(index) {
            if !predicate.is_pushable() {
                break;
            }
            filters.push(predicate.clone());
            index += 1;
        }
    }

    let mut sort = None;
    if config.push_down_sort {
        if let Some(Action::Sorted(comparator)) = actions.get(index) {
            if comparator.is_pushable() {
                sort = Some(comparator);
                index += 1;
            }
        }
    }

    let (mut skip, mut limit) = (None, None);
    if config.push_down_limit {
        match (actions.get(index), actions.get(index + 1)) {
            (Some(Action::Skip(s)), Some(Action::Limit(l))) => {
                skip = Some(*s);
                limit = Some(*l);
                index += 2;
            }
            (Some(Action::Skip(s)), _) if table.dbms_type().supports_offset_without_limit() => {
                skip = Some(*s);
                index += 1;
            }
            (Some(Action::Limit(l)), _) => {
                limit = Some(*l);
                index += 1;
            }
            _ => {}
        }
    }

    PushDown {
        filters,
        sort,
        skip,
        limit,
        absorbed: index,
    }
}

fn select<E>(table: &TableSource<E>, push: &PushDown<'_, E>) -> Result<SelectBuilder> {
    let filter = render_where(
        table.dbms_type(),
        |id| table.column_name(id),
        |id| table.column_type(id),
        &push.filters,
    )?;

    let mut builder = SelectBuilder::new(table.dbms_type(), table.qualified_table())
        .columns(table.select_list())
        .filter(filter);

    if let Some(comparator) = push.sort {
        for key in comparator.keys() {
            if let SortKey::Field { field, order } = key {
                builder = builder.order_by(table.column_name(field.identifier())?, *order);
            }
        }
    }
    if let Some(skip) = push.skip {
        builder = builder.offset(skip);
    }
    if let Some(limit) = push.limit {
        builder = builder.limit(limit);
    }
    Ok(builder)
}

fn replay<E>(elements: Vec<E>, actions: &[Action<E>]) -> Vec<E> {
    actions
        .iter()
        .fold(elements, |elements, action| action.apply(elements))
}

/// Run a pipeline and collect its elements.
pub(crate) fn collect<E>(parts: PipelineParts<E>) -> Result<Vec<E>> {
    match parts.source {
        Source::Supplier(supplier) => {
            let elements = supplier()?;
            Ok(replay(elements, &parts.actions))
        }
        Source::Table(table) => {
            table.ensure_running()?;
            let push = analyze(&table, &parts.actions);
            let query = select(&table, &push)?.build()?;
            let remaining = &parts.actions[push.absorbed..];

            if push.absorbed == 0 && !parts.actions.is_empty() {
                debug!(
                    table = %table.table(),
                    stages = parts.actions.len(),
                    "No pushable leading stage, replaying over full table"
                );
            } else {
                debug!(
                    table = %table.table(),
                    absorbed = push.absorbed,
                    in_memory = remaining.len(),
                    sql = %query.sql,
                    "Pushing stream stages down"
                );
            }

            let rows = table.executor().query(&query)?;
            Ok(replay(rows, remaining))
        }
    }
}

/// Count a pipeline's elements, using `COUNT(*)` when every stage was
/// absorbed into SQL.
pub(crate) fn count<E>(parts: PipelineParts<E>) -> Result<u64> {
    if let Source::Table(table) = &parts.source {
        let push = analyze(table, &parts.actions);
        if table.config().use_count_query && push.absorbed == parts.actions.len() {
            table.ensure_running()?;
            let query = select(table, &push)?.build_count()?;
            debug!(table = %table.table(), sql = %query.sql, "Counting with SQL");
            return table.executor().count(&query);
        }
    }
    Ok(collect(parts)?.len() as u64)
}

/// Describe how a pipeline would run without running it.
pub(crate) fn explain<E>(source: &Source<E>, actions: &[Action<E>]) -> Result<Explain> {
    let names = |actions: &[Action<E>]| actions.iter().map(Action::name).collect::<Vec<_>>();

    match source {
        Source::Supplier(_) => Ok(Explain {
            source: "in-memory".to_string(),
            query: None,
            pushed_down: Vec::new(),
            in_memory: names(actions),
        }),
        Source::Table(table) => {
            let push = analyze(table, actions);
            let query = select(table, &push)?.build()?;
            Ok(Explain {
                source: format!("table {}", table.table()),
                query: Some(query),
                pushed_down: names(&actions[..push.absorbed]),
                in_memory: names(&actions[push.absorbed..]),
            })
        }
    }
}
