/// Core data types for the odds board
///
/// These types match the JSON message format of the schedule/lines/scores
/// feed: one object per message, discriminated by a `type` field.
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Display text for a cell with no value.
pub const PLACEHOLDER: &str = "-";

/// Sport id carrying set-based (per-set grid) scoring.
pub const SET_SCORED_SPORT_ID: u32 = 8;

/// Away/Home side of an event, encoded as 0/1 in cell addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum Side {
    Away,
    Home,
}

impl Side {
    /// Wire digit used in cell addresses
    pub fn as_digit(&self) -> u8 {
        match self {
            Side::Away => 0,
            Side::Home => 1,
        }
    }

    pub fn from_digit(digit: u8) -> Option<Self> {
        match digit {
            0 => Some(Side::Away),
            1 => Some(Side::Home),
            _ => None,
        }
    }

    pub fn is_away(&self) -> bool {
        matches!(self, Side::Away)
    }

    pub fn is_home(&self) -> bool {
        matches!(self, Side::Home)
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_digit())
    }
}

/// A collection of events sharing a league/date header, the unit of visual
/// grouping. Replaced wholesale on each SCHEDULE snapshot; events mutate in
/// place between snapshots.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Group {
    pub category_id: u64,
    #[serde(default)]
    pub header: String,
    #[serde(default)]
    pub league_id: u64,
    #[serde(default)]
    pub sport_id: u32,
    #[serde(default, rename = "group-date")]
    pub group_date: Option<String>,
    #[serde(default, rename = "category-date")]
    pub category_date: Option<String>,
    #[serde(default)]
    pub events: Vec<Event>,
}

impl Group {
    /// ISO-comparable date used for date-ordered views, group-level date
    /// falling back to the category-level one.
    pub fn date_key(&self) -> Option<&str> {
        self.group_date
            .as_deref()
            .filter(|d| !d.is_empty())
            .or_else(|| self.category_date.as_deref().filter(|d| !d.is_empty()))
    }
}

/// A single game/match with two sides. Identity = `event_id`, stable across
/// deltas referencing the same id.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Event {
    pub event_id: u64,
    #[serde(default)]
    pub rotation_number: u32,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub time: String,
    #[serde(default, rename = "awayTeam")]
    pub away_team: Option<String>,
    #[serde(default, rename = "homeTeam")]
    pub home_team: Option<String>,
    #[serde(default, rename = "awayAbbr")]
    pub away_abbr: Option<String>,
    #[serde(default, rename = "homeAbbr")]
    pub home_abbr: Option<String>,
    #[serde(default, rename = "awayPitcher")]
    pub away_pitcher: Option<String>,
    #[serde(default, rename = "homePitcher")]
    pub home_pitcher: Option<String>,
    #[serde(default, rename = "awayPitcherLeftHanded")]
    pub away_pitcher_left_handed: Option<String>,
    #[serde(default, rename = "homePitcherLeftHanded")]
    pub home_pitcher_left_handed: Option<String>,
    #[serde(default, rename = "awayScore")]
    pub away_score: Option<String>,
    #[serde(default, rename = "homeScore")]
    pub home_score: Option<String>,
    #[serde(default)]
    pub status0: Option<String>,
    #[serde(default)]
    pub status1: Option<String>,
    #[serde(default)]
    pub status2: Option<String>,
    #[serde(default)]
    pub away_addendum: Option<String>,
    #[serde(default)]
    pub home_addendum: Option<String>,
}

impl Event {
    /// Overwrite the score-bearing fields from an inbound score record.
    pub fn apply_score_fields(&mut self, fields: &ScoreFields) {
        self.away_score = fields.away_score.clone();
        self.home_score = fields.home_score.clone();
        self.status0 = fields.status0.clone();
        self.status1 = fields.status1.clone();
        self.status2 = fields.status2.clone();
        self.away_addendum = fields.away_addendum.clone();
        self.home_addendum = fields.home_addendum.clone();
    }
}

/// Score-bearing fields of a SCORES / SCORES_CHANGES record. The
/// `*_timestamp` fields are per-field ages in seconds, consumed by the
/// aging scheduler.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ScoreFields {
    #[serde(default, alias = "awayScore")]
    pub away_score: Option<String>,
    #[serde(default, alias = "homeScore")]
    pub home_score: Option<String>,
    #[serde(default)]
    pub status0: Option<String>,
    #[serde(default)]
    pub status1: Option<String>,
    #[serde(default)]
    pub status2: Option<String>,
    #[serde(default)]
    pub away_addendum: Option<String>,
    #[serde(default)]
    pub home_addendum: Option<String>,
    #[serde(default)]
    pub away_score_timestamp: Option<i64>,
    #[serde(default)]
    pub home_score_timestamp: Option<i64>,
    #[serde(default)]
    pub status0_timestamp: Option<i64>,
    #[serde(default)]
    pub status1_timestamp: Option<i64>,
    #[serde(default)]
    pub status2_timestamp: Option<i64>,
}

/// One SCORES record: an event id plus its score fields.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScoreRecord {
    pub event_id: u64,
    #[serde(flatten)]
    pub fields: ScoreFields,
}

/// One SCORES_CHANGES entry.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScoreChange {
    pub event_id: u64,
    pub data: ScoreFields,
}

/// One line (odds) update record. `id` is the encoded odds-cell address,
/// `seconds` the age of the value.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LineRecord {
    pub id: String,
    #[serde(default)]
    pub value: Option<serde_json::Value>,
    #[serde(default)]
    pub seconds: Option<i64>,
}

impl LineRecord {
    /// Display value: the provided value if non-empty after trimming,
    /// else the placeholder dash. Numbers pass through unquoted.
    pub fn display_value(&self) -> String {
        let text = match &self.value {
            Some(serde_json::Value::String(s)) => s.trim().to_string(),
            Some(serde_json::Value::Number(n)) => n.to_string(),
            Some(other) if !other.is_null() => other.to_string(),
            _ => String::new(),
        };
        if text.is_empty() {
            PLACEHOLDER.to_string()
        } else {
            text
        }
    }

    pub fn age_seconds(&self) -> i64 {
        self.seconds.unwrap_or(0)
    }
}

/// Structural changes to the current snapshot. Applied to state and then
/// followed by a full re-render.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ScheduleChange {
    /// Groups added or replaced wholesale.
    #[serde(default)]
    pub upserts: Vec<Group>,
    /// Groups removed from the snapshot.
    #[serde(default)]
    pub removed_category_ids: Vec<u64>,
}

/// A bookmaker column in the odds grid.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Sportsbook {
    pub id: serde_json::Value,
    pub name: String,
    #[serde(default)]
    pub abbr: Option<String>,
}

impl Sportsbook {
    /// Column ids are strings in addresses and preference lists, whatever
    /// the feed sends.
    pub fn id_string(&self) -> String {
        match &self.id {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    /// Heading label: full name when short, abbreviation fallback otherwise.
    pub fn heading_label(&self) -> String {
        if self.name.len() < 10 {
            self.name.clone()
        } else {
            self.abbr.clone().unwrap_or_else(|| self.name.clone())
        }
    }
}

/// Inbound message envelope from the transport collaborator, discriminated
/// by the `type` field.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type")]
pub enum Inbound {
    #[serde(rename = "SCHEDULE")]
    Schedule { data: Vec<Group> },
    #[serde(rename = "LINES_RAW")]
    LinesRaw { data: Vec<LineRecord> },
    #[serde(rename = "LINES_CHANGES")]
    LinesChanges { data: Vec<LineRecord> },
    #[serde(rename = "SCORES")]
    Scores { data: Vec<ScoreRecord> },
    #[serde(rename = "SCORES_CHANGES")]
    ScoresChanges { changes: Vec<ScoreChange> },
    #[serde(rename = "SCHEDULE_CHANGES")]
    ScheduleChanges {
        #[serde(default)]
        data: ScheduleChange,
    },
    #[serde(rename = "SPORTSBOOKS")]
    Sportsbooks { data: Vec<Sportsbook> },
}

/// Which kind of view is on screen. Sport and custom-display views honor
/// the league-order preference; plain category views honor the group-order
/// list instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum ViewKind {
    Sport,
    CustomDisplay,
    Category,
}

/// Current view parameters consumed by ordering and rendering.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ViewContext {
    pub kind: ViewKind,
    /// Sport id, custom-display id, or 0 for the "today" board.
    pub view_id: i64,
    /// When false, sport/custom views keep pure league ordering even for
    /// multi-day boards.
    pub order_by_date: bool,
    /// Selected market period, part of every odds-cell address.
    pub period_id: u32,
    /// Selected odds display type, part of every odds-cell address.
    pub display_type: u32,
}

impl ViewContext {
    pub fn is_today(&self) -> bool {
        self.view_id == 0
    }
}

impl Default for ViewContext {
    fn default() -> Self {
        Self {
            kind: ViewKind::Sport,
            view_id: 0,
            order_by_date: true,
            period_id: 0,
            display_type: 0,
        }
    }
}

/// One entry of the stored league-order list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LeagueOrderEntry {
    pub id: u64,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

/// Scope of a user sportsbook-column highlight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum HighlightScope {
    AllSports,
    ThisSport(i64),
}

/// Ordering and highlight preferences, owned by the storage collaborator
/// and consumed read-only. Empty lists degrade to snapshot order.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OrderingPrefs {
    /// Per-view league order (already resolved for the current view).
    pub league_order: Vec<LeagueOrderEntry>,
    /// Category-id order for plain category views.
    pub group_order: Vec<u64>,
    /// Per-group event-id order.
    pub event_order: HashMap<u64, Vec<u64>>,
    /// Global sportsbook column order.
    pub sportsbook_order: Vec<String>,
    /// User-pinned event rows.
    pub highlighted_events: HashSet<u64>,
    /// User-highlighted sportsbook columns with their scope.
    pub highlighted_sportsbooks: HashMap<String, HighlightScope>,
}

impl OrderingPrefs {
    /// Whether a sportsbook column is highlighted under the given view.
    pub fn sportsbook_highlighted(&self, sportsbook_id: &str, view: &ViewContext) -> bool {
        match self.highlighted_sportsbooks.get(sportsbook_id) {
            Some(HighlightScope::AllSports) => true,
            Some(HighlightScope::ThisSport(sport_id)) => *sport_id == view.view_id,
            None => false,
        }
    }
}
