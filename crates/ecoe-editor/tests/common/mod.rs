//! Shared fixture: one exam with two stations, three qblocks and a few
//! questions and options.

#![allow(dead_code)]

use ecoe_client::memory::MemoryFetcher;
use ecoe_editor::{EditSession, ExamScope};
use ecoe_model::{ExamId, ResourceKind, StationId};
use serde_json::json;

pub const EXAM: ExamId = ExamId(1);
pub const STATION: StationId = StationId(5);

pub fn fixture() -> MemoryFetcher {
    let fetcher = MemoryFetcher::new();

    fetcher.insert(ResourceKind::Area, json!({"id": 1, "name": "Anamnesis", "ecoe": 1}));
    fetcher.insert(ResourceKind::Area, json!({"id": 2, "name": "Exploration", "ecoe": 1}));
    fetcher.insert(ResourceKind::Area, json!({"id": 3, "name": "Other exam", "ecoe": 2}));

    fetcher.insert(ResourceKind::Station, json!({"id": 5, "name": "Cardiology", "order": 1, "ecoe": 1}));
    fetcher.insert(ResourceKind::Station, json!({"id": 6, "name": "Neurology", "order": 2, "ecoe": 1}));
    fetcher.insert(ResourceKind::Station, json!({"id": 7, "name": "Elsewhere", "order": 1, "ecoe": 2}));

    fetcher.insert(ResourceKind::Qblock, json!({"id": 10, "name": "History", "order": 1, "station": 5}));
    fetcher.insert(ResourceKind::Qblock, json!({"id": 11, "name": "Examination", "order": 2, "station": 5}));
    fetcher.insert(ResourceKind::Qblock, json!({"id": 12, "name": "Diagnosis", "order": 1, "station": 6}));

    fetcher.insert(ResourceKind::Question, question(100, 1, &[10], 1));
    fetcher.insert(ResourceKind::Question, question(101, 2, &[10], 2));
    fetcher.insert(ResourceKind::Question, question(102, 1, &[11], 1));
    fetcher.insert(ResourceKind::Question, question(103, 1, &[12], 1));

    for (id, order) in [(1, 1), (2, 2), (3, 3)] {
        fetcher.insert(ResourceKind::Option, option(id, 100, order));
    }
    fetcher.insert(ResourceKind::Option, option(4, 101, 1));

    fetcher
}

pub fn question(id: u64, order: i64, qblocks: &[u64], area: u64) -> serde_json::Value {
    json!({
        "id": id,
        "order": order,
        "description": format!("Question {id}"),
        "reference": format!("Q{id}"),
        "question_type": "RB",
        "area": area,
        "qblocks": qblocks,
    })
}

pub fn option(id: u64, question: u64, order: i64) -> serde_json::Value {
    json!({
        "id": id,
        "order": order,
        "label": format!("Option {id}"),
        "points": 1.0,
        "question": question,
    })
}

/// Session loaded on the default (first) station.
pub async fn session(fetcher: &MemoryFetcher) -> EditSession {
    EditSession::load(fetcher, ExamScope::exam(EXAM))
        .await
        .expect("load session")
}
