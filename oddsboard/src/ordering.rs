//! Deterministic group/event ordering.
//!
//! Pure functions over the current snapshot plus the stored preference
//! lists. Both return positions into the input slice so callers can walk
//! the snapshot in visual order without cloning it. Missing or empty
//! preference lists degrade to snapshot order.

use crate::types::{Group, OrderingPrefs, ViewContext, ViewKind};
use std::cmp::Ordering;

/// Rank of a league in the stored league-order list, `None` if absent.
fn league_rank(prefs: &OrderingPrefs, league_id: u64) -> Option<usize> {
    prefs.league_order.iter().position(|entry| entry.id == league_id)
}

/// Order groups for display.
///
/// Sport and custom-display views honor the league-order list, either as
/// a pure partition ("today" boards, or date ordering disabled) or as a
/// tie-breaker within equal dates. Plain category views follow the stored
/// group-order list instead. Unmatched groups always keep their snapshot
/// order relative to each other.
pub fn order_groups(groups: &[Group], view: &ViewContext, prefs: &OrderingPrefs) -> Vec<usize> {
    match view.kind {
        ViewKind::Sport | ViewKind::CustomDisplay => {
            if view.is_today() || !view.order_by_date {
                order_by_league_partition(groups, prefs)
            } else {
                order_by_date_then_league(groups, prefs)
            }
        }
        ViewKind::Category => order_by_group_list(groups, prefs),
    }
}

/// Rule 1: walk the enabled league-order entries, pulling every matching
/// group in snapshot order, then append the rest unchanged.
fn order_by_league_partition(groups: &[Group], prefs: &OrderingPrefs) -> Vec<usize> {
    let mut ordered = Vec::with_capacity(groups.len());
    let mut taken = vec![false; groups.len()];

    for entry in &prefs.league_order {
        if !entry.enabled {
            continue;
        }
        for (idx, group) in groups.iter().enumerate() {
            if !taken[idx] && group.league_id == entry.id {
                taken[idx] = true;
                ordered.push(idx);
            }
        }
    }
    for (idx, flag) in taken.iter().enumerate() {
        if !flag {
            ordered.push(idx);
        }
    }
    ordered
}

/// Rule 2: date first (missing dates last), then league-order rank within
/// equal dates; two unmatched leagues compare by numeric league id.
fn order_by_date_then_league(groups: &[Group], prefs: &OrderingPrefs) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..groups.len()).collect();
    indices.sort_by(|&a, &b| {
        let (ga, gb) = (&groups[a], &groups[b]);
        let date_cmp = match (ga.date_key(), gb.date_key()) {
            (Some(da), Some(db)) => da.cmp(db),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        if date_cmp != Ordering::Equal {
            return date_cmp;
        }
        match (league_rank(prefs, ga.league_id), league_rank(prefs, gb.league_id)) {
            (Some(ra), Some(rb)) => ra.cmp(&rb),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => ga.league_id.cmp(&gb.league_id),
        }
    });
    indices
}

/// Rule 3: stored category-id order; unmatched categories sort after the
/// matched ones, preserving snapshot order among themselves.
fn order_by_group_list(groups: &[Group], prefs: &OrderingPrefs) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..groups.len()).collect();
    indices.sort_by_key(|&idx| {
        prefs
            .group_order
            .iter()
            .position(|&id| id == groups[idx].category_id)
            .unwrap_or(usize::MAX)
    });
    indices
}

/// Order events within a group by the stored event-id list: listed events
/// first in list order, unlisted events after in snapshot order. A stable
/// partition, so absent entries are never reordered among themselves.
pub fn order_events(group: &Group, prefs: &OrderingPrefs) -> Vec<usize> {
    let Some(order) = prefs.event_order.get(&group.category_id) else {
        return (0..group.events.len()).collect();
    };
    let mut indices: Vec<usize> = (0..group.events.len()).collect();
    indices.sort_by_key(|&idx| {
        order
            .iter()
            .position(|&id| id == group.events[idx].event_id)
            .unwrap_or(usize::MAX)
    });
    indices
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Event, LeagueOrderEntry};

    fn group(category_id: u64, league_id: u64, date: Option<&str>) -> Group {
        Group {
            category_id,
            league_id,
            group_date: date.map(str::to_string),
            ..Default::default()
        }
    }

    fn sport_view(view_id: i64, order_by_date: bool) -> ViewContext {
        ViewContext {
            kind: ViewKind::Sport,
            view_id,
            order_by_date,
            ..Default::default()
        }
    }

    fn league_prefs(ids: &[(u64, bool)]) -> OrderingPrefs {
        OrderingPrefs {
            league_order: ids
                .iter()
                .map(|&(id, enabled)| LeagueOrderEntry { id, enabled })
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_prefs_keep_snapshot_order() {
        let groups = vec![group(1, 10, None), group(2, 20, None), group(3, 30, None)];
        let prefs = OrderingPrefs::default();
        assert_eq!(order_groups(&groups, &sport_view(0, true), &prefs), vec![0, 1, 2]);
        assert_eq!(
            order_groups(
                &groups,
                &ViewContext { kind: ViewKind::Category, ..Default::default() },
                &prefs
            ),
            vec![0, 1, 2]
        );
    }

    #[test]
    fn test_today_league_partition() {
        let groups = vec![group(1, 10, None), group(2, 20, None), group(3, 10, None), group(4, 5, None)];
        let prefs = league_prefs(&[(20, true), (10, true)]);
        // League 20 first, then both league-10 groups in snapshot order,
        // then the unmatched one.
        assert_eq!(order_groups(&groups, &sport_view(0, true), &prefs), vec![1, 0, 2, 3]);
    }

    #[test]
    fn test_disabled_league_entries_are_skipped() {
        let groups = vec![group(1, 10, None), group(2, 20, None)];
        let prefs = league_prefs(&[(20, false), (10, true)]);
        // League 20 is disabled so its group falls into the trailing
        // unmatched partition, in snapshot order.
        assert_eq!(order_groups(&groups, &sport_view(0, true), &prefs), vec![0, 1]);
    }

    #[test]
    fn test_league_partition_when_date_ordering_disabled() {
        let groups = vec![group(1, 10, Some("2026-03-02")), group(2, 20, Some("2026-03-01"))];
        let prefs = league_prefs(&[(10, true), (20, true)]);
        // Non-today view, but date ordering is off: league order wins.
        assert_eq!(order_groups(&groups, &sport_view(4, false), &prefs), vec![0, 1]);
    }

    #[test]
    fn test_date_then_league_rank() {
        let groups = vec![
            group(1, 30, Some("2026-03-02")),
            group(2, 20, Some("2026-03-01")),
            group(3, 10, Some("2026-03-01")),
        ];
        let prefs = league_prefs(&[(10, true), (20, true)]);
        // 03-01 before 03-02; within 03-01 league 10 ranks ahead of 20.
        assert_eq!(order_groups(&groups, &sport_view(4, true), &prefs), vec![2, 1, 0]);
    }

    #[test]
    fn test_missing_dates_sort_last() {
        let groups = vec![group(1, 10, None), group(2, 20, Some("2026-03-01"))];
        let prefs = OrderingPrefs::default();
        assert_eq!(order_groups(&groups, &sport_view(4, true), &prefs), vec![1, 0]);
    }

    #[test]
    fn test_unmatched_leagues_fall_back_to_numeric_id() {
        let groups = vec![group(1, 44, Some("d")), group(2, 33, Some("d"))];
        let prefs = league_prefs(&[(99, true)]);
        assert_eq!(order_groups(&groups, &sport_view(4, true), &prefs), vec![1, 0]);
    }

    #[test]
    fn test_category_view_group_list() {
        let groups = vec![group(1, 0, None), group(2, 0, None), group(3, 0, None), group(4, 0, None)];
        let view = ViewContext { kind: ViewKind::Category, ..Default::default() };
        let prefs = OrderingPrefs {
            group_order: vec![3, 1],
            ..Default::default()
        };
        // Listed categories first in list order; 2 and 4 keep snapshot order.
        assert_eq!(order_groups(&groups, &view, &prefs), vec![2, 0, 1, 3]);
    }

    #[test]
    fn test_event_order_stable_partition() {
        let mut g = group(7, 0, None);
        g.events = (1..=5u64)
            .map(|id| Event { event_id: id, ..Default::default() })
            .collect();
        let mut prefs = OrderingPrefs::default();
        prefs.event_order.insert(7, vec![4, 2]);
        // 4 then 2 first; 1, 3, 5 keep their snapshot order.
        assert_eq!(order_events(&g, &prefs), vec![3, 1, 0, 2, 4]);
    }

    #[test]
    fn test_event_order_absent_list_is_identity() {
        let mut g = group(7, 0, None);
        g.events = (1..=3u64)
            .map(|id| Event { event_id: id, ..Default::default() })
            .collect();
        assert_eq!(order_events(&g, &OrderingPrefs::default()), vec![0, 1, 2]);
    }
}
