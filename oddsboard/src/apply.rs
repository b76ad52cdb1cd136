//! Incremental update application.
//!
//! Patches individually addressed cells in place instead of re-rendering
//! the table. Each record is self-contained (address, value, age) and
//! applied independently; an unaddressable record is skipped without
//! aborting its batch. Large line batches are processed in slices with a
//! cooperative yield between them so a bulk snapshot does not starve the
//! event loop.

use crate::aging::AgingScheduler;
use crate::render::{
    build_set_cells, classify_row, is_cancelled_or_postponed, CellValue, RowClass, ScoreCell,
    BoardTable, NBSP,
};
use crate::types::{LineRecord, ScoreFields, PLACEHOLDER};
use crate::winner::{determine_winner, ScoreView};
use chrono::{DateTime, Utc};
use tracing::{debug, trace};

/// Records applied per slice before yielding back to the scheduler.
pub const LINE_SLICE_SIZE: usize = 200;

/// Result of applying one score update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreOutcome {
    Applied,
    /// The row's score cell was a cancelled/postponed replacement and the
    /// update is live again; its substructure is unrecoverable, only a
    /// full re-render can restore it.
    RebuildRequired,
    /// No row for the event in the current table.
    Skipped,
}

/// Apply a batch of line records in array order, slice by slice. Returns
/// how many records addressed an existing cell.
pub async fn apply_line_batch(
    table: &mut BoardTable,
    aging: &mut AgingScheduler,
    records: &[LineRecord],
    now: DateTime<Utc>,
) -> usize {
    let mut applied = 0;
    for (slice_idx, slice) in records.chunks(LINE_SLICE_SIZE).enumerate() {
        if slice_idx > 0 {
            tokio::task::yield_now().await;
        }
        for record in slice {
            if apply_line_record(table, aging, record, now) {
                applied += 1;
            }
        }
    }
    trace!(total = records.len(), applied, "line batch applied");
    applied
}

/// Apply one line record. Returns false when the record carried no usable
/// address; such records are skipped per-record.
pub fn apply_line_record(
    table: &mut BoardTable,
    aging: &mut AgingScheduler,
    record: &LineRecord,
    now: DateTime<Utc>,
) -> bool {
    if record.id.is_empty() {
        return false;
    }
    let Some(cell) = table.cell_mut(&record.id) else {
        debug!(address = %record.id, "line record for unknown cell, skipped");
        return false;
    };

    let value = record.display_value();
    if value == PLACEHOLDER {
        // A cleared line loses its emphasis along with its value.
        cell.text = value;
        cell.tier = None;
        aging.clear(&record.id);
    } else {
        cell.text = value;
        cell.tier = aging.touch(&record.id, record.age_seconds(), now);
    }
    true
}

/// Apply one score update to the event's row.
pub fn apply_score_update(
    table: &mut BoardTable,
    aging: &mut AgingScheduler,
    event_id: u64,
    fields: &ScoreFields,
    now: DateTime<Utc>,
) -> ScoreOutcome {
    if table.row_by_event(event_id).is_none() {
        debug!(event_id, "score update for unknown event, skipped");
        return ScoreOutcome::Skipped;
    }

    if is_cancelled_or_postponed(fields.status0.as_deref(), fields.status2.as_deref()) {
        apply_cancelled(table, aging, event_id, fields);
        return ScoreOutcome::Applied;
    }

    let was_cancelled = matches!(
        table.row_by_event(event_id).map(|row| &row.score),
        Some(ScoreCell::Status(_))
    );
    if was_cancelled {
        return ScoreOutcome::RebuildRequired;
    }

    let view = ScoreView::from_fields(fields);
    let winner = determine_winner(&view);

    let marker = |v: Option<&str>| v.is_some_and(|s| s == "Winner" || s.contains("WIN"));
    let has_winner_text =
        marker(fields.away_score.as_deref()) || marker(fields.home_score.as_deref());

    if has_winner_text {
        apply_winner_text(table, aging, event_id, fields);
    } else if matches!(
        table.row_by_event(event_id).map(|row| &row.score),
        Some(ScoreCell::Sets { .. })
    ) {
        apply_set_scores(table, aging, event_id, fields, now);
    } else {
        apply_score_grid(table, aging, event_id, fields, winner.away, winner.home, now);
    }

    if let Some(row) = table.row_mut_by_event(event_id) {
        row.away.winner = winner.away;
        row.home.winner = winner.home;
        row.row_class = classify_row(&view, fields.status0.as_deref());
    }
    ScoreOutcome::Applied
}

/// Replace the score cell with the centered status text and finalize the
/// row. The destroyed sub-cells lose their aging entries with them.
fn apply_cancelled(
    table: &mut BoardTable,
    aging: &mut AgingScheduler,
    event_id: u64,
    fields: &ScoreFields,
) {
    let text = fields
        .status0
        .as_deref()
        .or(fields.status2.as_deref())
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(NBSP);
    if let Some(row) = table.row_mut_by_event(event_id) {
        row.score = ScoreCell::Status(CellValue::text(text));
        row.row_class = RowClass::Final;
    }
    clear_score_aging(aging, event_id);
}

fn apply_winner_text(
    table: &mut BoardTable,
    aging: &mut AgingScheduler,
    event_id: u64,
    fields: &ScoreFields,
) {
    let marker = |v: Option<&str>| v.is_some_and(|s| s == "Winner" || s.contains("WIN"));
    let away = marker(fields.away_score.as_deref()) || fields.status1.as_deref() == Some("Winner");
    let home = marker(fields.home_score.as_deref()) || fields.status2.as_deref() == Some("Winner");
    let value = |is_winner: bool| CellValue {
        text: if is_winner { "Winner" } else { NBSP }.to_string(),
        tier: None,
        strong: is_winner,
    };
    if let Some(row) = table.row_mut_by_event(event_id) {
        row.score = ScoreCell::WinnerText {
            away: value(away),
            home: value(home),
        };
    }
    // The status sub-cells are gone from this shape.
    clear_score_aging(aging, event_id);
}

/// Patch each set slot from the rebuilt addenda, re-entering the aging
/// state machine at the record's status timestamp when one is provided.
fn apply_set_scores(
    table: &mut BoardTable,
    aging: &mut AgingScheduler,
    event_id: u64,
    fields: &ScoreFields,
    now: DateTime<Utc>,
) {
    let ScoreCell::Sets { away, home } = build_set_cells(
        fields.away_addendum.as_deref(),
        fields.home_addendum.as_deref(),
    ) else {
        return;
    };
    for (side, slots) in [(0u8, away), (1u8, home)] {
        for (i, fresh) in slots.into_iter().enumerate() {
            let address = format!("{event_id}-{side}-{}", i + 1);
            patch_cell(table, aging, &address, fresh, fields.status0_timestamp, now);
        }
    }
}

fn apply_score_grid(
    table: &mut BoardTable,
    aging: &mut AgingScheduler,
    event_id: u64,
    fields: &ScoreFields,
    away_winner: bool,
    home_winner: bool,
    now: DateTime<Utc>,
) {
    let value = |v: Option<&str>, strong: bool| CellValue {
        text: v
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(NBSP)
            .to_string(),
        tier: None,
        strong,
    };
    let patches = [
        (1u8, value(fields.away_score.as_deref(), away_winner), fields.away_score_timestamp),
        (2, value(fields.home_score.as_deref(), home_winner), fields.home_score_timestamp),
        (3, value(fields.status1.as_deref(), false), fields.status1_timestamp),
        (4, value(fields.status2.as_deref(), false), fields.status2_timestamp),
    ];
    for (slot, fresh, timestamp) in patches {
        let address = format!("{event_id}-{slot}");
        patch_cell(table, aging, &address, fresh, timestamp, now);
    }
}

/// Write a fresh value into an addressed cell. With a timestamp the cell
/// re-enters the aging state machine at that age; without one its current
/// tier is left as is.
fn patch_cell(
    table: &mut BoardTable,
    aging: &mut AgingScheduler,
    address: &str,
    fresh: CellValue,
    timestamp: Option<i64>,
    now: DateTime<Utc>,
) {
    let Some(cell) = table.cell_mut(address) else {
        return;
    };
    cell.text = fresh.text;
    cell.strong = fresh.strong;
    if let Some(age) = timestamp {
        cell.tier = aging.touch(address, age, now);
    }
}

/// Cancel aging for every score sub-cell address an event can carry.
fn clear_score_aging(aging: &mut AgingScheduler, event_id: u64) {
    for slot in 1..=4u8 {
        aging.clear(&format!("{event_id}-{slot}"));
    }
    for side in 0..=1u8 {
        for set in 1..=5u8 {
            aging.clear(&format!("{event_id}-{side}-{set}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aging::Tier;
    use crate::render::{render, RenderContext};
    use crate::types::{Event, Group, OrderingPrefs, ViewContext, SET_SCORED_SPORT_ID};
    use std::collections::HashMap;

    fn now() -> DateTime<Utc> {
        "2026-03-01T18:00:00Z".parse().unwrap()
    }

    fn line(id: &str, value: &str, seconds: i64) -> LineRecord {
        LineRecord {
            id: id.to_string(),
            value: Some(serde_json::Value::String(value.to_string())),
            seconds: Some(seconds),
        }
    }

    fn board(sport_id: u32) -> BoardTable {
        let groups = vec![Group {
            category_id: 1,
            sport_id,
            events: vec![Event {
                event_id: 100,
                away_team: Some("Away".into()),
                home_team: Some("Home".into()),
                ..Default::default()
            }],
            ..Default::default()
        }];
        let view = ViewContext::default();
        let prefs = OrderingPrefs {
            sportsbook_order: vec!["26".into()],
            ..Default::default()
        };
        let labels = HashMap::new();
        let table = render(
            &groups,
            &RenderContext {
                view: &view,
                prefs: &prefs,
                labels: &labels,
                headers_on_top: false,
            },
        );
        assert!(table.error.is_none());
        table
    }

    #[test]
    fn test_line_record_patches_cell_and_ages_it() {
        let mut table = board(1);
        let mut aging = AgingScheduler::new();

        assert!(apply_line_record(&mut table, &mut aging, &line("100-0-26-0-0", "-110", 30), now()));
        let cell = table.cell("100-0-26-0-0").unwrap();
        assert_eq!(cell.text, "-110");
        assert_eq!(cell.tier, Some(Tier::Recent));
        assert_eq!(aging.len(), 1);
    }

    #[test]
    fn test_placeholder_clears_emphasis() {
        let mut table = board(1);
        let mut aging = AgingScheduler::new();
        apply_line_record(&mut table, &mut aging, &line("100-1-26-0-0", "+105", 5), now());

        apply_line_record(&mut table, &mut aging, &line("100-1-26-0-0", "  ", 0), now());
        let cell = table.cell("100-1-26-0-0").unwrap();
        assert_eq!(cell.text, PLACEHOLDER);
        assert_eq!(cell.tier, None);
        assert!(aging.is_empty(), "placeholder must cancel the pending timer");
    }

    #[test]
    fn test_unknown_address_is_skipped() {
        let mut table = board(1);
        let mut aging = AgingScheduler::new();
        assert!(!apply_line_record(&mut table, &mut aging, &line("999-0-26-0-0", "-110", 0), now()));
        assert!(aging.is_empty());
    }

    #[tokio::test]
    async fn test_batch_applies_all_slices() {
        let mut table = board(1);
        let mut aging = AgingScheduler::new();
        // Three slices worth of records, alternating known and unknown
        // addresses; the unknown ones must not abort the batch.
        let records: Vec<LineRecord> = (0..450)
            .map(|i| {
                if i % 2 == 0 {
                    line("100-0-26-0-0", &format!("-1{i}"), 10)
                } else {
                    line("999-0-26-0-0", "x", 10)
                }
            })
            .collect();
        let applied = apply_line_batch(&mut table, &mut aging, &records, now()).await;
        assert_eq!(applied, 225);
        assert_eq!(table.cell("100-0-26-0-0").unwrap().text, "-1448");
    }

    #[test]
    fn test_cancelled_update_replaces_score_cell() {
        let mut table = board(1);
        let mut aging = AgingScheduler::new();
        aging.touch("100-1", 10, now());

        let fields = ScoreFields {
            status0: Some("Cancelled".into()),
            ..Default::default()
        };
        let outcome = apply_score_update(&mut table, &mut aging, 100, &fields, now());
        assert_eq!(outcome, ScoreOutcome::Applied);

        let row = table.row_by_event(100).unwrap();
        assert_eq!(row.score, ScoreCell::Status(CellValue::text("Cancelled")));
        assert_eq!(row.row_class, RowClass::Final);
        assert!(aging.is_empty(), "destroyed sub-cells must lose their timers");
    }

    #[test]
    fn test_cancelled_reversal_requires_rebuild() {
        let mut table = board(1);
        let mut aging = AgingScheduler::new();
        let cancelled = ScoreFields {
            status0: Some("Postponed".into()),
            ..Default::default()
        };
        apply_score_update(&mut table, &mut aging, 100, &cancelled, now());

        let live = ScoreFields {
            away_score: Some("3".into()),
            home_score: Some("0".into()),
            status1: Some("Q1".into()),
            ..Default::default()
        };
        assert_eq!(
            apply_score_update(&mut table, &mut aging, 100, &live, now()),
            ScoreOutcome::RebuildRequired
        );
    }

    #[test]
    fn test_grid_update_patches_sub_cells() {
        let mut table = board(1);
        let mut aging = AgingScheduler::new();
        let fields = ScoreFields {
            away_score: Some("3".into()),
            home_score: Some("7".into()),
            status1: Some("Q4".into()),
            status2: Some("Final".into()),
            away_score_timestamp: Some(20),
            home_score_timestamp: Some(20),
            ..Default::default()
        };
        assert_eq!(
            apply_score_update(&mut table, &mut aging, 100, &fields, now()),
            ScoreOutcome::Applied
        );

        assert_eq!(table.cell("100-1").unwrap().text, "3");
        assert_eq!(table.cell("100-1").unwrap().tier, Some(Tier::Recent));
        assert_eq!(table.cell("100-2").unwrap().text, "7");
        assert!(table.cell("100-2").unwrap().strong, "winning score is bolded");
        assert_eq!(table.cell("100-4").unwrap().text, "Final");
        // No timestamp on the status fields, so no aging entries for them.
        assert_eq!(aging.len(), 2);

        let row = table.row_by_event(100).unwrap();
        assert!(!row.away.winner);
        assert!(row.home.winner);
        assert_eq!(row.row_class, RowClass::Final);
    }

    #[test]
    fn test_missing_fields_blank_their_cells() {
        let mut table = board(1);
        let mut aging = AgingScheduler::new();
        apply_score_update(
            &mut table,
            &mut aging,
            100,
            &ScoreFields {
                away_score: Some("1".into()),
                status1: Some("Q2".into()),
                ..Default::default()
            },
            now(),
        );

        let fields = ScoreFields {
            away_score: Some("1".into()),
            ..Default::default()
        };
        apply_score_update(&mut table, &mut aging, 100, &fields, now());
        assert_eq!(table.cell("100-3").unwrap().text, NBSP);
    }

    #[test]
    fn test_winner_text_update_replaces_grid() {
        let mut table = board(1);
        let mut aging = AgingScheduler::new();
        let fields = ScoreFields {
            away_score: Some("Winner".into()),
            ..Default::default()
        };
        apply_score_update(&mut table, &mut aging, 100, &fields, now());

        match &table.row_by_event(100).unwrap().score {
            ScoreCell::WinnerText { away, home } => {
                assert_eq!(away.text, "Winner");
                assert!(home.is_blank());
            }
            other => panic!("expected winner text cell, got {:?}", other),
        }
        // The status sub-cells no longer resolve in this shape.
        assert!(table.cell("100-3").is_none());
    }

    #[test]
    fn test_set_update_patches_slots() {
        let mut table = board(SET_SCORED_SPORT_ID);
        let mut aging = AgingScheduler::new();
        let fields = ScoreFields {
            away_addendum: Some("6,4,7(10)".into()),
            home_addendum: Some("4,6,6".into()),
            status0_timestamp: Some(15),
            ..Default::default()
        };
        assert_eq!(
            apply_score_update(&mut table, &mut aging, 100, &fields, now()),
            ScoreOutcome::Applied
        );

        let third = table.cell("100-0-3").unwrap();
        assert_eq!(third.text, "7¹⁰");
        assert!(third.strong);
        assert_eq!(third.tier, Some(Tier::Recent));
        assert!(table.cell("100-1-4").unwrap().is_blank());
        // Backward set scan decides the match for the away side.
        assert!(table.row_by_event(100).unwrap().away.winner);
    }

    #[test]
    fn test_unknown_event_is_skipped() {
        let mut table = board(1);
        let mut aging = AgingScheduler::new();
        assert_eq!(
            apply_score_update(&mut table, &mut aging, 999, &ScoreFields::default(), now()),
            ScoreOutcome::Skipped
        );
    }
}
