//! Priority-based combination of statuses.
//!
//! The same algorithm serves both domains; it only looks at the position of
//! each kind in the supplied priority order.

use crate::status::{Kind, Status};
use crate::values::StatusMap;

/// Combine statuses into one using a dominance order.
///
/// The first status whose kind is `priority[0]` is returned immediately.
/// Otherwise the most dominant status wins, the earliest one among equals,
/// and `neutral` is returned when nothing outranks it (including the empty
/// input and an input made only of least-dominant kinds).
pub fn combine_with_priority<K, I>(priority: &[K], neutral: Status<K>, statuses: I) -> Status<K>
where
    K: Kind,
    I: IntoIterator<Item = Status<K>>,
{
    let rank = |kind: K| {
        priority
            .iter()
            .position(|k| *k == kind)
            .unwrap_or(priority.len())
    };
    let top = priority.first().copied();

    let mut best = neutral;
    let mut best_rank = rank(best.kind());
    for status in statuses {
        if Some(status.kind()) == top {
            return status;
        }
        let r = rank(status.kind());
        if r < best_rank {
            best_rank = r;
            best = status;
        }
    }
    best
}

impl<K: Kind> Status<K> {
    /// Combine using the domain's own priority and neutral status.
    pub fn combine<I>(statuses: I) -> Self
    where
        I: IntoIterator<Item = Self>,
    {
        combine_with_priority(K::PRIORITY, Self::neutral(), statuses)
    }
}

/// Merge several field→status maps, combining per field.
///
/// Proposals for one field are combined in map order, so earlier maps win
/// ties. Fields nobody proposed a status for are absent.
pub fn merge_status_maps<K, I>(maps: I) -> StatusMap<K>
where
    K: Kind,
    I: IntoIterator<Item = StatusMap<K>>,
{
    let mut proposals: std::collections::BTreeMap<String, Vec<Status<K>>> =
        std::collections::BTreeMap::new();
    for map in maps {
        for (field, status) in map {
            proposals.entry(field).or_default().push(status);
        }
    }
    proposals
        .into_iter()
        .map(|(field, statuses)| (field, Status::combine(statuses)))
        .collect()
}
