//! Push-down classification.

use super::Predicate;

/// Whether a predicate tree can be rendered to SQL.
///
/// Field predicates are pushable, AND/OR nodes are pushable when both
/// children are, a NOT wrapper when its inner predicate is, and opaque
/// closures never are. Trees are never split: one opaque leaf anywhere
/// makes the whole tree unpushable.
pub fn is_pushable<E>(predicate: &Predicate<E>) -> bool {
    match predicate {
        Predicate::Field(_) => true,
        Predicate::And(left, right) | Predicate::Or(left, right) => {
            is_pushable(left) && is_pushable(right)
        }
        Predicate::Not(inner) => is_pushable(inner),
        Predicate::Opaque(_) => false,
    }
}

/// Path to the first node that prevents push-down, e.g. `and.right.opaque`.
pub fn find_unpushable<E>(predicate: &Predicate<E>) -> Option<String> {
    match predicate {
        Predicate::Field(_) => None,
        Predicate::And(left, right) => child_path("and", left, right),
        Predicate::Or(left, right) => child_path("or", left, right),
        Predicate::Not(inner) => find_unpushable(inner).map(|path| format!("not.{}", path)),
        Predicate::Opaque(_) => Some("opaque".to_string()),
    }
}

fn child_path<E>(node: &str, left: &Predicate<E>, right: &Predicate<E>) -> Option<String> {
    if let Some(path) = find_unpushable(left) {
        return Some(format!("{}.left.{}", node, path));
    }
    find_unpushable(right).map(|path| format!("{}.right.{}", node, path))
}
