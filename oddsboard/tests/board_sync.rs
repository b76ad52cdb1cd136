//! End-to-end flow: snapshot in, full render, deltas patched in place.

use chrono::{DateTime, Utc};
use oddsboard::aging::AgingScheduler;
use oddsboard::apply::{apply_line_batch, apply_line_record};
use oddsboard::render::{render, RenderContext};
use oddsboard::store::{BoardEngine, BoardSettings};
use oddsboard::types::{
    Event, Group, Inbound, LineRecord, OrderingPrefs, ScoreFields, ScoreRecord, ViewContext,
};
use std::collections::HashMap;

fn now() -> DateTime<Utc> {
    "2026-03-01T19:00:00Z".parse().unwrap()
}

fn snapshot() -> Vec<Group> {
    vec![
        Group {
            category_id: 1,
            header: "NFL - Week 1".into(),
            league_id: 2,
            sport_id: 1,
            events: vec![
                Event {
                    event_id: 7219402,
                    rotation_number: 451,
                    time: "1:00 PM".into(),
                    away_team: Some("Buffalo".into()),
                    home_team: Some("Miami".into()),
                    ..Default::default()
                },
                Event {
                    event_id: 7219404,
                    rotation_number: 453,
                    time: "4:25 PM".into(),
                    away_team: Some("Denver".into()),
                    home_team: Some("Kansas City".into()),
                    ..Default::default()
                },
            ],
            ..Default::default()
        },
        Group {
            category_id: 2,
            header: "ATP".into(),
            league_id: 9,
            sport_id: 8,
            events: vec![Event {
                event_id: 8000001,
                rotation_number: 101,
                away_team: Some("Player A".into()),
                home_team: Some("Player B".into()),
                ..Default::default()
            }],
            ..Default::default()
        },
    ]
}

fn prefs() -> OrderingPrefs {
    OrderingPrefs {
        sportsbook_order: vec!["26".into(), "9".into()],
        ..Default::default()
    }
}

fn line(id: &str, value: &str, seconds: i64) -> LineRecord {
    LineRecord {
        id: id.to_string(),
        value: Some(serde_json::Value::String(value.to_string())),
        seconds: Some(seconds),
    }
}

#[tokio::test]
async fn snapshot_then_deltas_flow() {
    let mut engine = BoardEngine::new(ViewContext::default(), prefs(), BoardSettings::default());

    engine
        .handle(Inbound::Schedule { data: snapshot() }, now())
        .await;
    assert_eq!(engine.table().groups.len(), 2);

    engine
        .handle(
            Inbound::LinesRaw {
                data: vec![
                    line("7219402-0-26-0-0", "-110", 5),
                    line("7219402-1-26-0-0", "+105", 5),
                ],
            },
            now(),
        )
        .await;
    assert_eq!(engine.table().cell("7219402-0-26-0-0").unwrap().text, "-110");

    engine
        .handle(
            Inbound::Scores {
                data: vec![ScoreRecord {
                    event_id: 7219402,
                    fields: ScoreFields {
                        away_score: Some("7".into()),
                        home_score: Some("3".into()),
                        status1: Some("Q2".into()),
                        away_score_timestamp: Some(10),
                        ..Default::default()
                    },
                }],
            },
            now(),
        )
        .await;
    assert_eq!(engine.table().cell("7219402-1").unwrap().text, "7");
    assert!(engine.table().cell("7219402-1").unwrap().tier.is_some());

    // The tennis group rendered its set grid.
    assert!(engine.table().contains_address("8000001-0-1"));
    assert!(engine.table().contains_address("8000001-1-5"));
}

#[tokio::test]
async fn batch_application_matches_per_record_application() {
    let view = ViewContext::default();
    let prefs = prefs();
    let labels = HashMap::new();
    let ctx = RenderContext {
        view: &view,
        prefs: &prefs,
        labels: &labels,
        headers_on_top: false,
    };
    let groups = snapshot();

    // 1,000 records cycling over the four odds addresses of one event.
    let addresses = [
        "7219402-0-26-0-0",
        "7219402-1-26-0-0",
        "7219402-0-9-0-0",
        "7219402-1-9-0-0",
    ];
    let records: Vec<LineRecord> = (0..1000)
        .map(|i| line(addresses[i % 4], &format!("-{}", 100 + i), (i % 30) as i64))
        .collect();

    let mut batched = render(&groups, &ctx);
    let mut batched_aging = AgingScheduler::new();
    apply_line_batch(&mut batched, &mut batched_aging, &records, now()).await;

    let mut one_by_one = render(&groups, &ctx);
    let mut single_aging = AgingScheduler::new();
    for record in &records {
        apply_line_record(&mut one_by_one, &mut single_aging, record, now());
    }

    assert_eq!(batched, one_by_one);
    assert_eq!(batched_aging.next_deadline(), single_aging.next_deadline());
    assert_eq!(batched_aging.len(), single_aging.len());
}

#[tokio::test]
async fn cancelled_reversal_round_trip() {
    let mut engine = BoardEngine::new(ViewContext::default(), prefs(), BoardSettings::default());
    engine
        .handle(Inbound::Schedule { data: snapshot() }, now())
        .await;
    engine
        .handle(
            Inbound::LinesRaw {
                data: vec![line("7219404-0-26-0-0", "+140", 0)],
            },
            now(),
        )
        .await;

    let cancel = |status: &str| ScoreRecord {
        event_id: 7219404,
        fields: ScoreFields {
            status0: Some(status.into()),
            ..Default::default()
        },
    };
    engine
        .handle(Inbound::Scores { data: vec![cancel("Cancelled")] }, now())
        .await;
    // The score sub-cells are gone with the replacement.
    assert!(engine.table().cell("7219404-1").is_none());

    engine
        .handle(
            Inbound::Scores {
                data: vec![ScoreRecord {
                    event_id: 7219404,
                    fields: ScoreFields {
                        away_score: Some("0".into()),
                        home_score: Some("0".into()),
                        status1: Some("Q1".into()),
                        ..Default::default()
                    },
                }],
            },
            now(),
        )
        .await;

    // Full rebuild restored the grid and replayed the retained lines.
    assert_eq!(engine.table().cell("7219404-1").unwrap().text, "0");
    assert_eq!(engine.table().cell("7219404-0-26-0-0").unwrap().text, "+140");
}

#[tokio::test]
async fn render_is_stable_across_identical_snapshots() {
    let mut engine = BoardEngine::new(ViewContext::default(), prefs(), BoardSettings::default());
    engine
        .handle(Inbound::Schedule { data: snapshot() }, now())
        .await;
    let first = engine.table().clone();

    engine
        .handle(Inbound::Schedule { data: snapshot() }, now())
        .await;
    assert_eq!(&first, engine.table());
}
