//! Display-synchronization engine for a live sports-odds board.
//!
//! Provides:
//! - Deterministic group/event ordering honoring stored preferences
//! - Full-table rendering with an address index over every mutable cell
//! - Incremental application of line and score deltas by cell address
//! - Recency/aging tier state machine fading changed values over time
//! - Winner determination shared by full render and incremental updates

pub mod address;
pub mod aging;
pub mod apply;
pub mod error;
pub mod ordering;
pub mod render;
pub mod store;
pub mod types;
pub mod winner;

pub use address::{CellAddress, ScoreSlot};
pub use aging::{classify, AgingScheduler, Tier};
pub use apply::{apply_line_batch, apply_line_record, apply_score_update, ScoreOutcome};
pub use error::BoardError;
pub use ordering::{order_events, order_groups};
pub use render::{render, BoardTable, CellValue, EventRow, GroupBlock, RenderContext, RowClass, ScoreCell};
pub use store::{BoardEngine, BoardSettings, BoardStore};
pub use types::{Event, Group, Inbound, LineRecord, OrderingPrefs, Side, ViewContext, ViewKind};
pub use winner::{determine_winner, ScoreView, WinnerFlags};
