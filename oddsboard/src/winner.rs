//! Winner determination.
//!
//! Used both at full-render time and by the incremental score applier, so
//! the same flags drive the matchup-cell emphasis and the score-cell
//! bolding from either path.

use crate::types::{Event, ScoreFields};

/// Winner flags for the two sides of an event. Never both true.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WinnerFlags {
    pub away: bool,
    pub home: bool,
}

impl WinnerFlags {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn decided(&self) -> bool {
        self.away || self.home
    }
}

/// Borrowed view over the score fields winner determination reads,
/// constructible from both the snapshot event and an inbound score record.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoreView<'a> {
    pub away_score: Option<&'a str>,
    pub home_score: Option<&'a str>,
    pub status1: Option<&'a str>,
    pub status2: Option<&'a str>,
    pub away_addendum: Option<&'a str>,
    pub home_addendum: Option<&'a str>,
}

impl<'a> ScoreView<'a> {
    pub fn from_event(event: &'a Event) -> Self {
        Self {
            away_score: event.away_score.as_deref(),
            home_score: event.home_score.as_deref(),
            status1: event.status1.as_deref(),
            status2: event.status2.as_deref(),
            away_addendum: event.away_addendum.as_deref(),
            home_addendum: event.home_addendum.as_deref(),
        }
    }

    pub fn from_fields(fields: &'a ScoreFields) -> Self {
        Self {
            away_score: fields.away_score.as_deref(),
            home_score: fields.home_score.as_deref(),
            status1: fields.status1.as_deref(),
            status2: fields.status2.as_deref(),
            away_addendum: fields.away_addendum.as_deref(),
            home_addendum: fields.home_addendum.as_deref(),
        }
    }
}

/// Explicit winner marker in a score field: the literal token or the
/// marker substring.
fn score_marker(value: Option<&str>) -> bool {
    match value {
        Some(v) => v == "Winner" || v.contains("WIN"),
        None => false,
    }
}

fn status_marker(value: Option<&str>) -> bool {
    value == Some("Winner")
}

/// Leading-integer parse: accepts an optional sign followed by digits,
/// ignoring any trailing text, the way score fields arrive ("3", "3 OT").
fn parse_leading_int(value: Option<&str>) -> Option<i64> {
    let s = value?.trim();
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => (-1i64, rest),
        None => (1i64, s.strip_prefix('+').unwrap_or(s)),
    };
    let end = digits.find(|c: char| !c.is_ascii_digit()).unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    digits[..end].parse::<i64>().ok().map(|n| sign * n)
}

/// Decide which side (if any) has won.
///
/// Precedence, first match wins:
/// 1. Explicit "Winner"/"WIN" marker in a score field, or a "Winner" token
///    in the side's status line. Definitive regardless of sport.
/// 2. Terminal "Final" status: numeric score comparison.
/// 3. Comma-delimited per-set addenda on both sides: scan sets from the
///    last backward; a "Winner" marker or the first unequal pair decides.
/// 4. A "Winner" marker anywhere in one side's addendum adds that side's
///    flag, but never overturns a decision already made for the other side.
pub fn determine_winner(view: &ScoreView<'_>) -> WinnerFlags {
    let mut flags = WinnerFlags::none();

    if score_marker(view.away_score) || status_marker(view.status1) {
        flags.away = true;
    }
    if score_marker(view.home_score) || status_marker(view.status2) {
        flags.home = true;
    }
    if flags.decided() {
        return flags;
    }

    if view.status2 == Some("Final") {
        if let (Some(away), Some(home)) =
            (parse_leading_int(view.away_score), parse_leading_int(view.home_score))
        {
            if away > home {
                flags.away = true;
            }
            if home > away {
                flags.home = true;
            }
        }
    }

    if !flags.decided() {
        if let (Some(away_add), Some(home_add)) = (view.away_addendum, view.home_addendum) {
            let away_sets: Vec<&str> = away_add.split(',').collect();
            let home_sets: Vec<&str> = home_add.split(',').collect();
            for i in (0..away_sets.len()).rev() {
                let away_set = away_sets[i].trim();
                let home_set = home_sets.get(i).map(|s| s.trim()).unwrap_or("");
                if away_set == "Winner" {
                    flags.away = true;
                    break;
                }
                if home_set == "Winner" {
                    flags.home = true;
                    break;
                }
                if let (Some(a), Some(h)) =
                    (parse_leading_int(Some(away_set)), parse_leading_int(Some(home_set)))
                {
                    if a > h {
                        flags.away = true;
                        break;
                    }
                    if h > a {
                        flags.home = true;
                        break;
                    }
                }
            }
        }
    }

    // An addendum marker may add a flag the steps above did not set, but a
    // decision for the opposite side stands.
    if view.away_addendum.is_some_and(|a| a.contains("Winner")) && !flags.home {
        flags.away = true;
    }
    if view.home_addendum.is_some_and(|a| a.contains("Winner")) && !flags.away {
        flags.home = true;
    }

    flags
}
