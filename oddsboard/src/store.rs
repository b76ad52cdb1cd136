//! Owned board state and the message-driven engine around it.
//!
//! [`BoardStore`] is the single owner of the current snapshot and all
//! display preferences; every mutation goes through [`BoardEngine`], which
//! routes inbound feed messages to the renderer and the incremental
//! applier and keeps the aging scheduler in step with the table. Single
//! threaded by construction: a full re-render never interleaves with an
//! in-flight incremental update because both run inside one `handle` call.

use crate::aging::AgingScheduler;
use crate::apply::{apply_line_batch, apply_score_update, ScoreOutcome};
use crate::render::{render, BoardTable, RenderContext};
use crate::types::{
    Event, Group, Inbound, LineRecord, OrderingPrefs, ScheduleChange, Sportsbook, ViewContext,
};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::{debug, info};

/// Layout and display toggles outside the ordering preferences.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoardSettings {
    /// One sticky header row above all groups instead of one per group.
    pub column_headers_on_top: bool,
}

/// The in-memory snapshot plus everything rendering reads alongside it.
#[derive(Debug, Default)]
pub struct BoardStore {
    pub groups: Vec<Group>,
    pub prefs: OrderingPrefs,
    pub view: ViewContext,
    pub settings: BoardSettings,
    /// Sportsbook id to column heading label.
    pub labels: HashMap<String, String>,
    /// Last full line snapshot, replayed after every full render so odds
    /// survive a table rebuild.
    lines_raw: Vec<LineRecord>,
}

impl BoardStore {
    fn event_mut(&mut self, event_id: u64) -> Option<&mut Event> {
        self.groups
            .iter_mut()
            .flat_map(|group| group.events.iter_mut())
            .find(|event| event.event_id == event_id)
    }

    fn apply_schedule_change(&mut self, change: &ScheduleChange) {
        for group in &change.upserts {
            match self
                .groups
                .iter_mut()
                .find(|g| g.category_id == group.category_id)
            {
                Some(existing) => *existing = group.clone(),
                None => self.groups.push(group.clone()),
            }
        }
        self.groups
            .retain(|g| !change.removed_category_ids.contains(&g.category_id));
    }

    fn register_sportsbooks(&mut self, books: &[Sportsbook]) {
        for book in books {
            self.labels.insert(book.id_string(), book.heading_label());
        }
        if self.prefs.sportsbook_order.is_empty() {
            self.prefs.sportsbook_order = books.iter().map(Sportsbook::id_string).collect();
        }
    }
}

/// The display-synchronization engine: feed messages in, a current
/// [`BoardTable`] out.
#[derive(Debug, Default)]
pub struct BoardEngine {
    store: BoardStore,
    table: BoardTable,
    aging: AgingScheduler,
}

impl BoardEngine {
    pub fn new(view: ViewContext, prefs: OrderingPrefs, settings: BoardSettings) -> Self {
        Self {
            store: BoardStore {
                view,
                prefs,
                settings,
                ..Default::default()
            },
            table: BoardTable::default(),
            aging: AgingScheduler::new(),
        }
    }

    pub fn table(&self) -> &BoardTable {
        &self.table
    }

    pub fn store(&self) -> &BoardStore {
        &self.store
    }

    /// Route one inbound message.
    pub async fn handle(&mut self, message: Inbound, now: DateTime<Utc>) {
        match message {
            Inbound::Schedule { data } => {
                info!(groups = data.len(), "schedule snapshot");
                self.store.groups = data;
                self.refresh(now).await;
            }
            Inbound::LinesRaw { data } => {
                apply_line_batch(&mut self.table, &mut self.aging, &data, now).await;
                self.store.lines_raw = data;
            }
            Inbound::LinesChanges { data } => {
                apply_line_batch(&mut self.table, &mut self.aging, &data, now).await;
            }
            Inbound::Scores { data } => {
                for record in data {
                    if let Some(event) = self.store.event_mut(record.event_id) {
                        event.apply_score_fields(&record.fields);
                    }
                    self.apply_score(record.event_id, &record.fields, now).await;
                }
            }
            Inbound::ScoresChanges { changes } => {
                for change in changes {
                    self.apply_score(change.event_id, &change.data, now).await;
                }
            }
            Inbound::ScheduleChanges { data } => {
                self.store.apply_schedule_change(&data);
                self.refresh(now).await;
            }
            Inbound::Sportsbooks { data } => {
                self.store.register_sportsbooks(&data);
            }
        }
    }

    async fn apply_score(
        &mut self,
        event_id: u64,
        fields: &crate::types::ScoreFields,
        now: DateTime<Utc>,
    ) {
        let outcome = apply_score_update(&mut self.table, &mut self.aging, event_id, fields, now);
        if outcome == ScoreOutcome::RebuildRequired {
            debug!(event_id, "cancelled row went live, full re-render");
            self.refresh(now).await;
        }
    }

    /// Replace the current view and re-render.
    pub async fn set_view(&mut self, view: ViewContext, now: DateTime<Utc>) {
        self.store.view = view;
        self.refresh(now).await;
    }

    /// Mutate the stored preferences and re-render.
    pub async fn update_prefs(
        &mut self,
        mutate: impl FnOnce(&mut OrderingPrefs),
        now: DateTime<Utc>,
    ) {
        mutate(&mut self.store.prefs);
        self.refresh(now).await;
    }

    pub async fn set_settings(&mut self, settings: BoardSettings, now: DateTime<Utc>) {
        self.store.settings = settings;
        self.refresh(now).await;
    }

    /// Full re-render: discard the table, its address index and every
    /// aging entry, rebuild from the store, then replay the retained line
    /// snapshot so odds cells are repopulated.
    async fn refresh(&mut self, now: DateTime<Utc>) {
        self.aging.clear_all();
        self.table = render(
            &self.store.groups,
            &RenderContext {
                view: &self.store.view,
                prefs: &self.store.prefs,
                labels: &self.store.labels,
                headers_on_top: self.store.settings.column_headers_on_top,
            },
        );
        let lines = std::mem::take(&mut self.store.lines_raw);
        apply_line_batch(&mut self.table, &mut self.aging, &lines, now).await;
        self.store.lines_raw = lines;
    }

    /// Fire due aging transitions and paint the new tiers into their
    /// cells. Returns how many cells changed.
    pub fn advance_aging(&mut self, now: DateTime<Utc>) -> usize {
        let transitions = self.aging.advance(now);
        let mut painted = 0;
        for (address, tier) in &transitions {
            if let Some(cell) = self.table.cell_mut(address) {
                cell.tier = *tier;
                painted += 1;
            }
        }
        painted
    }

    /// When the aging driver should next wake up.
    pub fn next_aging_deadline(&self) -> Option<DateTime<Utc>> {
        self.aging.next_deadline()
    }
}
