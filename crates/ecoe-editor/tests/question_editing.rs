//! Inline editing of question rows.

mod common;

use common::{fixture, question, session};
use ecoe_client::memory::Operation;
use ecoe_editor::{EditSession, EditorError, RowState};
use ecoe_model::{AreaId, QblockId, QuestionId, QuestionType, ResourceKind, ValidationError};

const HISTORY: QblockId = QblockId(10);

fn fill(session: &mut EditSession, question: QuestionId, description: &str) {
    session
        .edit_question_draft(question, |draft| {
            draft.description = description.to_string();
            draft.reference = "R1".to_string();
            draft.question_type = Some(QuestionType::MultiAnswer);
            draft.area_id = Some(AreaId(2));
            draft.order = Some(5);
        })
        .expect("edit draft");
}

fn qblock_ids(session: &EditSession, qblock: QblockId) -> Vec<QuestionId> {
    session
        .qblock(qblock)
        .expect("qblock")
        .questions
        .iter()
        .map(|question| question.id)
        .collect()
}

// ============================================================================
// Saving
// ============================================================================

#[tokio::test]
async fn test_save_updates_persisted_question() {
    let fetcher = fixture();
    let mut session = session(&fetcher).await;

    session
        .start_edit_question(QuestionId(100))
        .expect("start edit");
    session
        .edit_question_draft(QuestionId(100), |draft| {
            draft.description = "Chest pain onset".to_string();
        })
        .expect("edit");
    fetcher.clear_log();

    let id = session
        .save_question(&fetcher, HISTORY, QuestionId(100))
        .await
        .expect("save");

    assert_eq!(id, QuestionId(100));
    let requests = fetcher.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].operation, Operation::Update);
    assert_eq!(requests[0].target, "/api/question/100");

    let record = session.question_cache().get(id).expect("record");
    assert_eq!(record.state(), RowState::Clean);
    let node = session.question(id).expect("node");
    assert_eq!(node.description, "Chest pain onset");
    assert_eq!(node.area.as_ref().map(|area| area.id), Some(AreaId(1)));
}

#[tokio::test]
async fn test_save_rekeys_new_question_to_server_id() {
    let fetcher = fixture();
    let mut session = session(&fetcher).await;

    let local = session
        .add_question(&fetcher, HISTORY)
        .await
        .expect("add");
    fill(&mut session, local, "New question");
    // Another client creates a question meanwhile, so the server id differs.
    fetcher.insert(ResourceKind::Question, question(150, 1, &[12], 1));

    let saved = session
        .save_question(&fetcher, HISTORY, local)
        .await
        .expect("save");

    assert_eq!(saved, QuestionId(151));
    assert!(!session.question_cache().contains(local));
    let record = session.question_cache().get(saved).expect("record");
    assert!(!record.editing);
    assert!(!record.is_new);

    assert_eq!(
        qblock_ids(&session, HISTORY),
        vec![QuestionId(100), QuestionId(101), saved]
    );
    let node = session.question(saved).expect("node");
    assert!(node.is_persisted());
    assert_eq!(node.area.as_ref().map(|area| area.name.as_str()), Some("Exploration"));
    assert_eq!(node.type_label(), Some("MULTI_ANSWER"));
    assert!(!session.is_move_panel_open(saved));
}

#[tokio::test]
async fn test_invalid_draft_sends_nothing() {
    let fetcher = fixture();
    let mut session = session(&fetcher).await;
    let local = session
        .add_question(&fetcher, HISTORY)
        .await
        .expect("add");
    session
        .edit_question_draft(local, |draft| draft.description = "Only text".to_string())
        .expect("edit");
    let before = fetcher.request_count();

    let result = session.save_question(&fetcher, HISTORY, local).await;

    assert!(matches!(
        result,
        Err(EditorError::Validation(ValidationError::MissingField {
            field: "reference",
            ..
        }))
    ));
    assert_eq!(fetcher.request_count(), before);
    assert_eq!(
        session.question_cache().get(local).expect("record").state(),
        RowState::Unsaved
    );
}

#[tokio::test]
async fn test_failed_save_keeps_edit_mode() {
    let fetcher = fixture();
    let mut session = session(&fetcher).await;
    session
        .start_edit_question(QuestionId(101))
        .expect("start edit");
    session
        .edit_question_draft(QuestionId(101), |draft| draft.reference = "X".to_string())
        .expect("edit");
    fetcher.fail_once(Operation::Update, "/api/question/101", 500);

    let result = session
        .save_question(&fetcher, HISTORY, QuestionId(101))
        .await;

    assert!(matches!(result, Err(EditorError::Request(_))));
    let record = session.question_cache().get(QuestionId(101)).expect("record");
    assert!(record.editing);
    assert_eq!(record.draft.reference, "X");
    assert_eq!(
        session.question(QuestionId(101)).expect("node").reference,
        "Q101"
    );
}

#[tokio::test]
async fn test_stale_response_keeps_newer_draft() {
    let fetcher = fixture();
    let mut session = session(&fetcher).await;
    let local = session
        .add_question(&fetcher, HISTORY)
        .await
        .expect("add");
    fill(&mut session, local, "First wording");

    let pending = session
        .prepare_question_save(HISTORY, local)
        .expect("prepare");
    let record = pending.send(&fetcher).await.expect("send");
    session
        .edit_question_draft(local, |draft| draft.description = "Second wording".to_string())
        .expect("edit while saving");
    let saved = session
        .complete_question_save(pending, record)
        .expect("complete");

    assert_eq!(
        session.question(saved).expect("node").description,
        "First wording"
    );
    let record = session.question_cache().get(saved).expect("record");
    assert!(record.editing);
    assert!(!record.is_new);
    assert_eq!(record.draft.description, "Second wording");
}

#[tokio::test]
async fn test_cancel_during_save_restages_server_state() {
    let fetcher = fixture();
    let mut session = session(&fetcher).await;
    session
        .start_edit_question(QuestionId(100))
        .expect("start edit");
    session
        .edit_question_draft(QuestionId(100), |draft| draft.description = "Edited".to_string())
        .expect("edit");

    let pending = session
        .prepare_question_save(HISTORY, QuestionId(100))
        .expect("prepare");
    let record = pending.send(&fetcher).await.expect("send");
    session
        .cancel_question(HISTORY, QuestionId(100))
        .expect("cancel while saving");
    let saved = session
        .complete_question_save(pending, record)
        .expect("complete");

    assert_eq!(saved, QuestionId(100));
    assert_eq!(session.question(saved).expect("node").description, "Edited");
    let record = session.question_cache().get(saved).expect("record");
    assert_eq!(record.state(), RowState::Clean);
    assert_eq!(record.draft.description, "Edited");

    // A later save without changes must not restore the old wording.
    session.start_edit_question(saved).expect("start edit");
    session
        .save_question(&fetcher, HISTORY, saved)
        .await
        .expect("save again");
    let stored = fetcher.record("/api/question/100").expect("stored");
    assert_eq!(stored["description"], "Edited");
}

#[tokio::test]
async fn test_server_id_colliding_with_unsaved_row_rekeys_that_row() {
    let fetcher = fixture();
    let mut session = session(&fetcher).await;
    let first = session
        .add_question(&fetcher, HISTORY)
        .await
        .expect("add");
    let second = session
        .add_question(&fetcher, HISTORY)
        .await
        .expect("add");
    assert_eq!((first, second), (QuestionId(104), QuestionId(105)));
    fill(&mut session, first, "Left unsaved");
    fill(&mut session, second, "Saved first");

    let saved = session
        .save_question(&fetcher, HISTORY, second)
        .await
        .expect("save");

    assert_eq!(saved, QuestionId(104));
    assert_eq!(
        session.question(saved).expect("node").description,
        "Saved first"
    );
    let moved = session
        .question_cache()
        .iter()
        .find(|(_, record)| record.is_new)
        .map(|(id, record)| (*id, record.draft.description.clone()))
        .expect("unsaved row still staged");
    assert!(moved.0 > QuestionId(105));
    assert_eq!(moved.1, "Left unsaved");
    assert!(session.question(moved.0).is_some_and(|node| !node.is_persisted()));
}

// ============================================================================
// Cancel, delete, add
// ============================================================================

#[tokio::test]
async fn test_cancel_unsaved_question_removes_row() {
    let fetcher = fixture();
    let mut session = session(&fetcher).await;
    let local = session
        .add_question(&fetcher, HISTORY)
        .await
        .expect("add");
    let before = fetcher.request_count();

    session.cancel_question(HISTORY, local).expect("cancel");

    assert!(!session.question_cache().contains(local));
    assert!(!qblock_ids(&session, HISTORY).contains(&local));
    assert_eq!(fetcher.request_count(), before);
}

#[tokio::test]
async fn test_cancel_persisted_question_reverts_draft() {
    let fetcher = fixture();
    let mut session = session(&fetcher).await;
    session
        .start_edit_question(QuestionId(100))
        .expect("start edit");
    session
        .edit_question_draft(QuestionId(100), |draft| draft.description.clear())
        .expect("edit");

    session
        .cancel_question(HISTORY, QuestionId(100))
        .expect("cancel");

    let record = session.question_cache().get(QuestionId(100)).expect("record");
    assert!(!record.editing);
    assert_eq!(record.draft.description, "Question 100");
}

#[tokio::test]
async fn test_delete_removes_question_after_confirmation() {
    let fetcher = fixture();
    let mut session = session(&fetcher).await;

    session
        .delete_question(&fetcher, HISTORY, QuestionId(101))
        .await
        .expect("delete");

    assert_eq!(qblock_ids(&session, HISTORY), vec![QuestionId(100)]);
    assert!(!session.question_cache().contains(QuestionId(101)));
    assert!(fetcher.record("/api/question/101").is_none());
}

#[tokio::test]
async fn test_failed_delete_leaves_row_visible() {
    let fetcher = fixture();
    let mut session = session(&fetcher).await;
    session
        .start_edit_question(QuestionId(101))
        .expect("start edit");
    fetcher.fail_once(Operation::Delete, "/api/question/101", 500);

    let result = session
        .delete_question(&fetcher, HISTORY, QuestionId(101))
        .await;

    assert!(result.is_err());
    assert!(qblock_ids(&session, HISTORY).contains(&QuestionId(101)));
    assert!(session.question_cache().is_editing(QuestionId(101)));
}

#[tokio::test]
async fn test_added_ids_exceed_fetched_ids_and_are_distinct() {
    let fetcher = fixture();
    let mut session = session(&fetcher).await;
    fetcher.clear_log();

    let mut ids = Vec::new();
    for qblock in [HISTORY, QblockId(11), HISTORY] {
        ids.push(session.add_question(&fetcher, qblock).await.expect("add"));
    }

    assert!(ids.iter().all(|id| *id > QuestionId(103)));
    assert!(ids[0] < ids[1] && ids[1] < ids[2]);
    let seeds = fetcher
        .requests()
        .iter()
        .filter(|request| request.operation == Operation::Get)
        .count();
    assert_eq!(seeds, 1);

    let record = session.question_cache().get(ids[1]).expect("record");
    assert!(record.editing && record.is_new);
    assert!(
        session
            .qblock(QblockId(11))
            .expect("qblock")
            .question(ids[1])
            .is_some()
    );
}

#[tokio::test]
async fn test_reload_drops_unsaved_rows_and_keeps_edits() {
    let fetcher = fixture();
    let mut session = session(&fetcher).await;
    let local = session
        .add_question(&fetcher, HISTORY)
        .await
        .expect("add");
    session
        .start_edit_question(QuestionId(100))
        .expect("start edit");
    session
        .edit_question_draft(QuestionId(100), |draft| draft.reference = "Edited".to_string())
        .expect("edit");

    session.reload(&fetcher).await.expect("reload");

    assert!(!session.question_cache().contains(local));
    assert!(session.question(local).is_none());
    let record = session.question_cache().get(QuestionId(100)).expect("record");
    assert!(record.editing);
    assert_eq!(record.draft.reference, "Edited");
}
