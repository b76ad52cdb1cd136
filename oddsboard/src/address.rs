//! Deterministic cell addressing.
//!
//! The address string is the sole join key between inbound delta records
//! and on-screen cells, so the renderer and every delta consumer must
//! produce it through this one encoding. Within one rendered table each
//! address maps to exactly one cell.
//!
//! Encodings:
//! - odds cell:  `<event>-<side>-<sportsbook>-<period>-<displayType>`
//! - score cell: `<event>-<slot>` with slot 1/2 = away/home score and
//!   3/4 = the two status lines
//! - set cell:   `<event>-<side>-<setIndex+1>` for set-based sports

use crate::error::BoardError;
use crate::types::Side;
use std::fmt;
use std::str::FromStr;

/// Sub-cell of the standard two-column score grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScoreSlot {
    AwayScore,
    HomeScore,
    Status1,
    Status2,
}

impl ScoreSlot {
    pub fn as_digit(&self) -> u8 {
        match self {
            ScoreSlot::AwayScore => 1,
            ScoreSlot::HomeScore => 2,
            ScoreSlot::Status1 => 3,
            ScoreSlot::Status2 => 4,
        }
    }

    pub fn from_digit(digit: u8) -> Option<Self> {
        match digit {
            1 => Some(ScoreSlot::AwayScore),
            2 => Some(ScoreSlot::HomeScore),
            3 => Some(ScoreSlot::Status1),
            4 => Some(ScoreSlot::Status2),
            _ => None,
        }
    }
}

/// Typed form of a cell address. `Display` produces the wire string and
/// `FromStr` parses it back; the two are inverses for every valid address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CellAddress {
    /// One addressable odds value (away or home) in a sportsbook column.
    Odds {
        event_id: u64,
        side: Side,
        sportsbook_id: String,
        period_id: u32,
        display_type: u32,
    },
    /// One sub-cell of the standard score/status grid.
    Score { event_id: u64, slot: ScoreSlot },
    /// One set slot (1-based) of a set-based score grid.
    Set { event_id: u64, side: Side, set: u8 },
}

impl CellAddress {
    pub fn odds(
        event_id: u64,
        side: Side,
        sportsbook_id: &str,
        period_id: u32,
        display_type: u32,
    ) -> Self {
        CellAddress::Odds {
            event_id,
            side,
            sportsbook_id: sportsbook_id.to_string(),
            period_id,
            display_type,
        }
    }

    pub fn score(event_id: u64, slot: ScoreSlot) -> Self {
        CellAddress::Score { event_id, slot }
    }

    pub fn set(event_id: u64, side: Side, set: u8) -> Self {
        CellAddress::Set { event_id, side, set }
    }

    pub fn event_id(&self) -> u64 {
        match self {
            CellAddress::Odds { event_id, .. }
            | CellAddress::Score { event_id, .. }
            | CellAddress::Set { event_id, .. } => *event_id,
        }
    }

    /// Encoded wire form.
    pub fn encode(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellAddress::Odds {
                event_id,
                side,
                sportsbook_id,
                period_id,
                display_type,
            } => write!(
                f,
                "{}-{}-{}-{}-{}",
                event_id, side, sportsbook_id, period_id, display_type
            ),
            CellAddress::Score { event_id, slot } => {
                write!(f, "{}-{}", event_id, slot.as_digit())
            }
            CellAddress::Set { event_id, side, set } => {
                write!(f, "{}-{}-{}", event_id, side, set)
            }
        }
    }
}

impl FromStr for CellAddress {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || BoardError::Address(s.to_string());
        let parts: Vec<&str> = s.split('-').collect();
        match parts.len() {
            2 => {
                let event_id = parts[0].parse().map_err(|_| malformed())?;
                let digit: u8 = parts[1].parse().map_err(|_| malformed())?;
                let slot = ScoreSlot::from_digit(digit).ok_or_else(malformed)?;
                Ok(CellAddress::Score { event_id, slot })
            }
            3 => {
                let event_id = parts[0].parse().map_err(|_| malformed())?;
                let side_digit: u8 = parts[1].parse().map_err(|_| malformed())?;
                let side = Side::from_digit(side_digit).ok_or_else(malformed)?;
                let set: u8 = parts[2].parse().map_err(|_| malformed())?;
                if !(1..=5).contains(&set) {
                    return Err(malformed());
                }
                Ok(CellAddress::Set { event_id, side, set })
            }
            5 => {
                let event_id = parts[0].parse().map_err(|_| malformed())?;
                let side_digit: u8 = parts[1].parse().map_err(|_| malformed())?;
                let side = Side::from_digit(side_digit).ok_or_else(malformed)?;
                let period_id = parts[3].parse().map_err(|_| malformed())?;
                let display_type = parts[4].parse().map_err(|_| malformed())?;
                Ok(CellAddress::Odds {
                    event_id,
                    side,
                    sportsbook_id: parts[2].to_string(),
                    period_id,
                    display_type,
                })
            }
            _ => Err(malformed()),
        }
    }
}
