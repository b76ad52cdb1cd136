//! Full-table rendering.
//!
//! Builds a structural [`BoardTable`] from the ordered snapshot: one block
//! per group, one row per event, every mutable cell registered in the
//! address index under its encoded [`CellAddress`]. The incremental
//! applier patches cells through that index, so the renderer is the only
//! producer of addresses and must register each exactly once.

use crate::address::{CellAddress, ScoreSlot};
use crate::aging::Tier;
use crate::error::BoardError;
use crate::ordering::{order_events, order_groups};
use crate::types::{
    Event, Group, OrderingPrefs, Side, ViewContext, PLACEHOLDER, SET_SCORED_SPORT_ID,
};
use crate::winner::{determine_winner, ScoreView, WinnerFlags};
use std::collections::HashMap;
use tracing::error;

/// Rendered in place of missing text so rows keep their height.
pub const NBSP: &str = "\u{00a0}";

/// One displayed value with its live visual attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellValue {
    pub text: String,
    pub tier: Option<Tier>,
    pub strong: bool,
}

impl CellValue {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tier: None,
            strong: false,
        }
    }

    pub fn blank() -> Self {
        Self::text(NBSP)
    }

    /// Text, falling back to the non-breaking space when empty.
    fn text_or_blank(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if !v.is_empty() => Self::text(v),
            _ => Self::blank(),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.text == NBSP
    }
}

/// Row emphasis derived from status/score presence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowClass {
    Final,
    Active,
    Neutral,
}

/// One side of the matchup column: a name line, an optional pitcher line
/// underneath, and the winner attribute toggled by score updates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SideLine {
    pub name: String,
    pub pitcher: Option<String>,
    pub winner: bool,
}

impl SideLine {
    fn build(
        team: Option<&str>,
        abbr: Option<&str>,
        pitcher: Option<&str>,
        left_handed: Option<&str>,
        winner: bool,
    ) -> Self {
        match pitcher.map(str::trim).filter(|p| !p.is_empty()) {
            // Pitcher layout shows the abbreviation above the pitcher name.
            Some(p) => {
                let mut line = p.to_string();
                if left_handed == Some("1") {
                    line.push_str(" (L)");
                }
                Self {
                    name: abbr
                        .map(str::trim)
                        .filter(|a| !a.is_empty())
                        .unwrap_or(NBSP)
                        .to_string(),
                    pitcher: Some(line),
                    winner,
                }
            }
            None => Self {
                name: team
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .unwrap_or(NBSP)
                    .to_string(),
                pitcher: None,
                winner,
            },
        }
    }
}

/// Shape of an event's score cell. The variant is part of the cell's
/// structure: a cancelled replacement destroys the sub-cells, which is why
/// reverting to a live shape needs a full re-render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScoreCell {
    /// Single centered status line for cancelled/postponed events. Carries
    /// no addressable sub-cells.
    Status(CellValue),
    /// Literal "Winner" text rows replacing the numeric grid.
    WinnerText { away: CellValue, home: CellValue },
    /// Five set slots per side for set-scored sports.
    Sets {
        away: [CellValue; 5],
        home: [CellValue; 5],
    },
    /// Standard two-column score/status grid.
    Grid {
        away: CellValue,
        home: CellValue,
        status1: CellValue,
        status2: CellValue,
    },
}

/// One sportsbook column of a row: away odds over home odds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OddsCell {
    pub sportsbook_id: String,
    pub away: CellValue,
    pub home: CellValue,
    pub highlighted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRow {
    pub event_id: u64,
    pub rotation_number: u32,
    pub time: String,
    pub row_class: RowClass,
    pub away: SideLine,
    pub home: SideLine,
    pub score: ScoreCell,
    pub odds: Vec<OddsCell>,
    pub highlighted: bool,
}

/// One group of rows under a league/date header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupBlock {
    pub category_id: u64,
    pub header: String,
    pub rows: Vec<EventRow>,
}

/// Position of one addressable cell inside the table structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRef {
    pub group: usize,
    pub row: usize,
    pub slot: CellSlot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellSlot {
    Odds { column: usize, side: Side },
    Score(ScoreSlot),
    Set { side: Side, set: u8 },
}

/// The complete rendered board: group blocks in visual order plus the
/// address index joining inbound deltas to cells.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BoardTable {
    /// Column headings: the fixed leading columns plus one per sportsbook.
    pub columns: Vec<String>,
    pub headers_on_top: bool,
    pub groups: Vec<GroupBlock>,
    index: HashMap<String, CellRef>,
    event_rows: HashMap<u64, (usize, usize)>,
    /// Set when generation failed; shown in place of the table.
    pub error: Option<String>,
}

impl BoardTable {
    /// Error board shown when generation fails.
    pub fn from_error(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn address_count(&self) -> usize {
        self.index.len()
    }

    pub fn contains_address(&self, address: &str) -> bool {
        self.index.contains_key(address)
    }

    /// Look up a cell's displayed value by encoded address.
    pub fn cell(&self, address: &str) -> Option<&CellValue> {
        let cell_ref = *self.index.get(address)?;
        let row = self
            .groups
            .get(cell_ref.group)?
            .rows
            .get(cell_ref.row)?;
        Self::resolve_slot(row, cell_ref.slot)
    }

    /// Mutable cell lookup used by the incremental applier. `None` when the
    /// address is unknown or its sub-cell no longer exists in the row's
    /// current score-cell shape.
    pub fn cell_mut(&mut self, address: &str) -> Option<&mut CellValue> {
        let cell_ref = *self.index.get(address)?;
        let row = self
            .groups
            .get_mut(cell_ref.group)?
            .rows
            .get_mut(cell_ref.row)?;
        Self::resolve_slot_mut(row, cell_ref.slot)
    }

    pub fn row_by_event(&self, event_id: u64) -> Option<&EventRow> {
        let (group, row) = *self.event_rows.get(&event_id)?;
        self.groups.get(group)?.rows.get(row)
    }

    pub fn row_mut_by_event(&mut self, event_id: u64) -> Option<&mut EventRow> {
        let (group, row) = *self.event_rows.get(&event_id)?;
        self.groups.get_mut(group)?.rows.get_mut(row)
    }

    fn resolve_slot(row: &EventRow, slot: CellSlot) -> Option<&CellValue> {
        match slot {
            CellSlot::Odds { column, side } => {
                let cell = row.odds.get(column)?;
                Some(match side {
                    Side::Away => &cell.away,
                    Side::Home => &cell.home,
                })
            }
            CellSlot::Score(score_slot) => match (&row.score, score_slot) {
                (ScoreCell::Grid { away, .. }, ScoreSlot::AwayScore) => Some(away),
                (ScoreCell::Grid { home, .. }, ScoreSlot::HomeScore) => Some(home),
                (ScoreCell::Grid { status1, .. }, ScoreSlot::Status1) => Some(status1),
                (ScoreCell::Grid { status2, .. }, ScoreSlot::Status2) => Some(status2),
                (ScoreCell::WinnerText { away, .. }, ScoreSlot::AwayScore) => Some(away),
                (ScoreCell::WinnerText { home, .. }, ScoreSlot::HomeScore) => Some(home),
                _ => None,
            },
            CellSlot::Set { side, set } => match &row.score {
                ScoreCell::Sets { away, home } => {
                    let slots = match side {
                        Side::Away => away,
                        Side::Home => home,
                    };
                    slots.get(usize::from(set).checked_sub(1)?)
                }
                _ => None,
            },
        }
    }

    fn resolve_slot_mut(row: &mut EventRow, slot: CellSlot) -> Option<&mut CellValue> {
        match slot {
            CellSlot::Odds { column, side } => {
                let cell = row.odds.get_mut(column)?;
                Some(match side {
                    Side::Away => &mut cell.away,
                    Side::Home => &mut cell.home,
                })
            }
            CellSlot::Score(score_slot) => match (&mut row.score, score_slot) {
                (ScoreCell::Grid { away, .. }, ScoreSlot::AwayScore) => Some(away),
                (ScoreCell::Grid { home, .. }, ScoreSlot::HomeScore) => Some(home),
                (ScoreCell::Grid { status1, .. }, ScoreSlot::Status1) => Some(status1),
                (ScoreCell::Grid { status2, .. }, ScoreSlot::Status2) => Some(status2),
                (ScoreCell::WinnerText { away, .. }, ScoreSlot::AwayScore) => Some(away),
                (ScoreCell::WinnerText { home, .. }, ScoreSlot::HomeScore) => Some(home),
                _ => None,
            },
            CellSlot::Set { side, set } => match &mut row.score {
                ScoreCell::Sets { away, home } => {
                    let slots = match side {
                        Side::Away => away,
                        Side::Home => home,
                    };
                    slots.get_mut(usize::from(set).checked_sub(1)?)
                }
                _ => None,
            },
        }
    }
}

/// Read-only inputs to a render besides the snapshot itself.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub view: &'a ViewContext,
    pub prefs: &'a OrderingPrefs,
    /// Sportsbook id to column heading label.
    pub labels: &'a HashMap<String, String>,
    pub headers_on_top: bool,
}

/// Whether an event has been pulled from play entirely.
pub fn is_cancelled_or_postponed(status0: Option<&str>, status2: Option<&str>) -> bool {
    let pulled = |s: Option<&str>| matches!(s, Some("Cancelled") | Some("Postponed"));
    pulled(status0) || pulled(status2)
}

/// Row classification from status/score presence, shared with the
/// incremental score applier.
pub fn classify_row(view: &ScoreView<'_>, status0: Option<&str>) -> RowClass {
    let present = |s: Option<&str>| s.map(str::trim).is_some_and(|s| !s.is_empty());
    if is_cancelled_or_postponed(status0, view.status2) || view.status2 == Some("Final") {
        return RowClass::Final;
    }
    if present(view.away_score)
        || present(view.home_score)
        || present(status0)
        || present(view.status1)
        || present(view.status2)
    {
        RowClass::Active
    } else {
        RowClass::Neutral
    }
}

/// Render the snapshot into a board, replacing any generation failure with
/// an error board so the caller always has something displayable.
pub fn render(groups: &[Group], ctx: &RenderContext<'_>) -> BoardTable {
    match render_inner(groups, ctx) {
        Ok(table) => table,
        Err(err) => {
            error!(%err, "table generation failed");
            BoardTable::from_error(format!("Error processing game data: {err}"))
        }
    }
}

fn render_inner(groups: &[Group], ctx: &RenderContext<'_>) -> Result<BoardTable, BoardError> {
    let mut table = BoardTable {
        columns: heading_columns(ctx),
        headers_on_top: ctx.headers_on_top,
        ..Default::default()
    };

    for group_idx in order_groups(groups, ctx.view, ctx.prefs) {
        let group = &groups[group_idx];
        let block_idx = table.groups.len();
        let mut block = GroupBlock {
            category_id: group.category_id,
            header: group.header.clone(),
            rows: Vec::with_capacity(group.events.len()),
        };

        for event_idx in order_events(group, ctx.prefs) {
            let event = &group.events[event_idx];
            let row_idx = block.rows.len();
            let row = build_event_row(event, group, ctx);
            register_row(&mut table.index, &row, block_idx, row_idx, ctx.view)?;
            if table
                .event_rows
                .insert(event.event_id, (block_idx, row_idx))
                .is_some()
            {
                return Err(BoardError::DuplicateAddress(event.event_id.to_string()));
            }
            block.rows.push(row);
        }
        table.groups.push(block);
    }
    Ok(table)
}

fn heading_columns(ctx: &RenderContext<'_>) -> Vec<String> {
    let mut columns: Vec<String> = ["Time", "ROT", "Matchup", "SCORES"]
        .into_iter()
        .map(str::to_string)
        .collect();
    for id in &ctx.prefs.sportsbook_order {
        columns.push(ctx.labels.get(id).cloned().unwrap_or_else(|| id.clone()));
    }
    columns
}

fn build_event_row(event: &Event, group: &Group, ctx: &RenderContext<'_>) -> EventRow {
    let score_view = ScoreView::from_event(event);
    let winner = determine_winner(&score_view);

    let odds = ctx
        .prefs
        .sportsbook_order
        .iter()
        .map(|id| OddsCell {
            sportsbook_id: id.clone(),
            away: CellValue::text(PLACEHOLDER),
            home: CellValue::text(PLACEHOLDER),
            highlighted: ctx.prefs.sportsbook_highlighted(id, ctx.view),
        })
        .collect();

    EventRow {
        event_id: event.event_id,
        rotation_number: event.rotation_number,
        time: event.time.clone(),
        row_class: classify_row(&score_view, event.status0.as_deref()),
        away: SideLine::build(
            event.away_team.as_deref(),
            event.away_abbr.as_deref(),
            event.away_pitcher.as_deref(),
            event.away_pitcher_left_handed.as_deref(),
            winner.away,
        ),
        home: SideLine::build(
            event.home_team.as_deref(),
            event.home_abbr.as_deref(),
            event.home_pitcher.as_deref(),
            event.home_pitcher_left_handed.as_deref(),
            winner.home,
        ),
        score: build_score_cell(event, group.sport_id, winner),
        odds,
        highlighted: ctx.prefs.highlighted_events.contains(&event.event_id),
    }
}

fn build_score_cell(event: &Event, sport_id: u32, winner: WinnerFlags) -> ScoreCell {
    if is_cancelled_or_postponed(event.status0.as_deref(), event.status2.as_deref()) {
        return ScoreCell::Status(CellValue::text_or_blank(event.status0.as_deref()));
    }

    if sport_id == SET_SCORED_SPORT_ID {
        return build_set_cells(
            event.away_addendum.as_deref(),
            event.home_addendum.as_deref(),
        );
    }

    // The feed sometimes sends the literal string "null" for no score.
    let scrub = |v: Option<&str>| -> Option<String> {
        v.filter(|s| *s != "null").map(str::to_string)
    };
    let away_score = scrub(event.away_score.as_deref());
    let home_score = scrub(event.home_score.as_deref());

    let marker = |v: Option<&str>| v.is_some_and(|s| s == "Winner" || s.contains("WIN"));
    let away_text = marker(away_score.as_deref()) || event.status1.as_deref() == Some("Winner");
    let home_text = marker(home_score.as_deref()) || event.status2.as_deref() == Some("Winner");
    if away_text || home_text {
        let value = |is_winner: bool| CellValue {
            text: if is_winner { "Winner" } else { NBSP }.to_string(),
            tier: None,
            strong: is_winner,
        };
        return ScoreCell::WinnerText {
            away: value(away_text),
            home: value(home_text),
        };
    }

    let score_value = |v: Option<&str>, strong: bool| CellValue {
        strong,
        ..CellValue::text_or_blank(v)
    };
    ScoreCell::Grid {
        away: score_value(away_score.as_deref(), winner.away),
        home: score_value(home_score.as_deref(), winner.home),
        status1: CellValue::text_or_blank(event.status1.as_deref()),
        status2: CellValue::text_or_blank(event.status2.as_deref()),
    }
}

/// Build the five-slot-per-side set grid from the comma-delimited addenda.
pub fn build_set_cells(away_addendum: Option<&str>, home_addendum: Option<&str>) -> ScoreCell {
    let away_sets: Vec<&str> = away_addendum.unwrap_or("").split(',').collect();
    let home_sets: Vec<&str> = home_addendum.unwrap_or("").split(',').collect();
    let slot = |own: &[&str], other: &[&str], i: usize| {
        format_set_score(
            own.get(i).map(|s| s.trim()).unwrap_or(""),
            other.get(i).map(|s| s.trim()).unwrap_or(""),
        )
    };
    ScoreCell::Sets {
        away: std::array::from_fn(|i| slot(&away_sets, &home_sets, i)),
        home: std::array::from_fn(|i| slot(&home_sets, &away_sets, i)),
    }
}

const SUPERSCRIPT_DIGITS: [char; 10] = ['⁰', '¹', '²', '³', '⁴', '⁵', '⁶', '⁷', '⁸', '⁹'];

/// Rewrite trailing tiebreak points "7(10)" as superscripts "7¹⁰".
fn superscript_tiebreaks(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = String::with_capacity(s.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'('
            && i > 0
            && bytes[i - 1].is_ascii_digit()
        {
            if let Some(close) = s[i + 1..].find(')') {
                let inner = &s[i + 1..i + 1 + close];
                if !inner.is_empty() && inner.bytes().all(|b| b.is_ascii_digit()) {
                    for d in inner.bytes() {
                        out.push(SUPERSCRIPT_DIGITS[usize::from(d - b'0')]);
                    }
                    i += close + 2;
                    continue;
                }
            }
        }
        out.push(bytes[i] as char);
        i += 1;
    }
    out
}

/// Format one set score for display: tiebreak points become superscripts,
/// a won set is bolded, and an "x" serving marker becomes the leading ball
/// glyph. Empty input renders as the blank spacer.
pub fn format_set_score(score: &str, other_score: &str) -> CellValue {
    let score = score.trim();
    if score.is_empty() {
        return CellValue::blank();
    }

    let serving = score.contains(['x', 'X']);
    let cleaned: String = score.chars().filter(|c| !matches!(c, 'x' | 'X')).collect();
    let mut text = superscript_tiebreaks(cleaned.trim());
    if serving {
        text.insert(0, '●');
    }
    if text.is_empty() {
        return CellValue::blank();
    }

    // Won-set rule from the first game digit of each side: 7 always wins
    // the set, 6 only with a two-game margin.
    let first_digit = |s: &str| s.chars().next().and_then(|c| c.to_digit(10));
    let own = first_digit(score);
    let opp = first_digit(other_score.trim());
    let strong = own == Some(7)
        || (own == Some(6) && opp.is_some_and(|o| 6 - i64::from(o) >= 2));

    CellValue {
        text,
        tier: None,
        strong,
    }
}

fn register_row(
    index: &mut HashMap<String, CellRef>,
    row: &EventRow,
    group: usize,
    row_idx: usize,
    view: &ViewContext,
) -> Result<(), BoardError> {
    let mut insert = |address: CellAddress, slot: CellSlot| -> Result<(), BoardError> {
        let encoded = address.encode();
        if index
            .insert(encoded.clone(), CellRef { group, row: row_idx, slot })
            .is_some()
        {
            return Err(BoardError::DuplicateAddress(encoded));
        }
        Ok(())
    };

    match &row.score {
        ScoreCell::Status(_) => {}
        ScoreCell::WinnerText { .. } => {
            insert(
                CellAddress::score(row.event_id, ScoreSlot::AwayScore),
                CellSlot::Score(ScoreSlot::AwayScore),
            )?;
            insert(
                CellAddress::score(row.event_id, ScoreSlot::HomeScore),
                CellSlot::Score(ScoreSlot::HomeScore),
            )?;
        }
        ScoreCell::Sets { .. } => {
            for side in [Side::Away, Side::Home] {
                for set in 1..=5u8 {
                    insert(
                        CellAddress::set(row.event_id, side, set),
                        CellSlot::Set { side, set },
                    )?;
                }
            }
        }
        ScoreCell::Grid { .. } => {
            for slot in [
                ScoreSlot::AwayScore,
                ScoreSlot::HomeScore,
                ScoreSlot::Status1,
                ScoreSlot::Status2,
            ] {
                insert(
                    CellAddress::score(row.event_id, slot),
                    CellSlot::Score(slot),
                )?;
            }
        }
    }

    for (column, odds) in row.odds.iter().enumerate() {
        for side in [Side::Away, Side::Home] {
            insert(
                CellAddress::odds(
                    row.event_id,
                    side,
                    &odds.sportsbook_id,
                    view.period_id,
                    view.display_type,
                ),
                CellSlot::Odds { column, side },
            )?;
        }
    }
    Ok(())
}
