//! Inline editing of question rows.
//!
//! Saving is split in three steps so the session is not borrowed while the
//! request is in flight:
//!
//! 1. [`EditSession::prepare_question_save`] validates the draft and captures
//!    the row's generation
//! 2. [`PendingQuestionSave::send`] issues the create or update
//! 3. [`EditSession::complete_question_save`] merges the response
//!
//! [`EditSession::save_question`] runs all three in sequence.

use ecoe_client::{Query, ResourceFetcher, create, update};
use ecoe_model::{
    QblockId, Question, QuestionBody, QuestionDraft, QuestionId, QuestionRecord, ResourceKind,
};

use crate::cache::StagingRecord;
use crate::error::{EditorError, Result};
use crate::session::EditSession;

/// A validated question save waiting for its request.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingQuestionSave {
    qblock: QblockId,
    question: QuestionId,
    generation: u64,
    uri: Option<String>,
    body: QuestionBody,
}

impl PendingQuestionSave {
    #[must_use]
    pub fn question(&self) -> QuestionId {
        self.question
    }

    #[must_use]
    pub fn is_create(&self) -> bool {
        self.uri.is_none()
    }

    /// Issue the create or update request.
    pub async fn send<F: ResourceFetcher>(&self, fetcher: &F) -> Result<QuestionRecord> {
        let record: QuestionRecord = match &self.uri {
            None => {
                tracing::debug!(question = %self.question, "creating question");
                create(fetcher, ResourceKind::Question.route(), &self.body).await?
            }
            Some(uri) => {
                tracing::debug!(question = %self.question, uri = %uri, "updating question");
                update(fetcher, uri, &self.body).await?
            }
        };
        Ok(record)
    }
}

impl EditSession {
    /// Put a question row into edit mode. No request is issued.
    pub fn start_edit_question(&mut self, question: QuestionId) -> Result<()> {
        if self.question_cache.start_edit(question) {
            Ok(())
        } else {
            Err(EditorError::RowNotStaged(question.get()))
        }
    }

    /// Validate the row's draft and build the request for saving it under
    /// `qblock`.
    ///
    /// # Errors
    ///
    /// - [`EditorError::Validation`] when a required field is missing
    /// - [`EditorError::RowNotStaged`] when the row has no staging record
    /// - [`EditorError::UnknownQblock`] / [`EditorError::UnknownQuestion`]
    ///   when the row is not under `qblock`
    pub fn prepare_question_save(
        &self,
        qblock: QblockId,
        question: QuestionId,
    ) -> Result<PendingQuestionSave> {
        let node = self
            .root()
            .ok_or(EditorError::NotLoaded)?
            .qblock(qblock)
            .ok_or(EditorError::UnknownQblock(qblock))?
            .question(question)
            .ok_or(EditorError::UnknownQuestion(question))?;
        let record = self
            .question_cache
            .get(question)
            .ok_or(EditorError::RowNotStaged(question.get()))?;
        let body = record.draft.validate(qblock)?;

        let uri = (!record.is_new).then(|| node.resource_uri());
        Ok(PendingQuestionSave {
            qblock,
            question,
            generation: record.generation(),
            uri,
            body,
        })
    }

    /// Merge the server's answer to a save into the tree and the cache.
    ///
    /// The row is re-keyed to the server id and leaves edit mode. If the row
    /// was edited again while the request was in flight and is still in edit
    /// mode, the tree takes the server state but the newer draft is kept. A
    /// row cancelled meanwhile is restaged from the server state.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::Integrity`] when the answer references an
    /// unknown area; nothing is changed in that case.
    pub fn complete_question_save(
        &mut self,
        pending: PendingQuestionSave,
        record: QuestionRecord,
    ) -> Result<QuestionId> {
        let saved = Question::resolve(record, self.areas())?;
        let previous = pending.question;
        let id = saved.id;
        self.question_ids.observe(id.get());

        if id != previous {
            self.evict_unsaved_question(id);
        }

        let replaced = if pending.is_create() {
            self.qblock_mut(pending.qblock)
                .is_ok_and(|qblock| replace_keeping_options(qblock.question_mut(previous), &saved))
        } else {
            let mut any = false;
            for node in self.question_nodes_mut(previous) {
                any |= replace_keeping_options(Some(node), &saved);
            }
            any
        };
        if !replaced {
            tracing::warn!(question = %previous, "saved question is no longer in the tree");
            self.question_cache.remove(previous);
            return Ok(id);
        }

        let keep_draft = !self.question_cache.is_current(previous, pending.generation)
            && self.question_cache.is_editing(previous);
        if keep_draft {
            tracing::warn!(question = %previous, "row changed while saving, keeping newer draft");
            self.question_cache.rekey(previous, id);
            self.question_cache.modify(id, |record| record.is_new = false);
        } else {
            self.question_cache.remove(previous);
            self.question_cache.remove(id);
            self.question_cache
                .insert(id, StagingRecord::clean(QuestionDraft::from_question(&saved)));
        }
        self.rename_move_panel(previous, id);
        self.track_move_panel(id);

        tracing::info!(question = %id, previous = %previous, "saved question");
        Ok(id)
    }

    /// Validate, send and merge a question save.
    ///
    /// On any error the row stays as it was, in edit mode.
    pub async fn save_question<F: ResourceFetcher>(
        &mut self,
        fetcher: &F,
        qblock: QblockId,
        question: QuestionId,
    ) -> Result<QuestionId> {
        let pending = self.prepare_question_save(qblock, question)?;
        let record = pending.send(fetcher).await?;
        self.complete_question_save(pending, record)
    }

    /// Leave edit mode without saving.
    ///
    /// An unsaved row is removed from the tree and the cache. A persisted
    /// row gets its draft reset to the tree's server state.
    pub fn cancel_question(&mut self, qblock: QblockId, question: QuestionId) -> Result<()> {
        let record = self
            .question_cache
            .get(question)
            .ok_or(EditorError::RowNotStaged(question.get()))?;

        if record.is_new {
            self.qblock_mut(qblock)?.remove_question(question);
            self.question_cache.remove(question);
            self.forget_move_panel(question);
            tracing::debug!(question = %question, "discarded unsaved question");
            return Ok(());
        }

        let node = self
            .qblock(qblock)
            .ok_or(EditorError::UnknownQblock(qblock))?
            .question(question)
            .ok_or(EditorError::UnknownQuestion(question))?
            .clone();
        self.question_cache.modify(question, |record| {
            record.draft.reconcile(&node);
            record.editing = false;
        });
        tracing::debug!(question = %question, "reverted question edits");
        Ok(())
    }

    /// Delete a question on the server, then drop it from the tree.
    ///
    /// The row stays visible until the server confirms. Deleting a row that
    /// was never saved only discards it locally.
    pub async fn delete_question<F: ResourceFetcher>(
        &mut self,
        fetcher: &F,
        qblock: QblockId,
        question: QuestionId,
    ) -> Result<()> {
        if self
            .question_cache
            .get(question)
            .is_some_and(|record| record.is_new)
        {
            return self.cancel_question(qblock, question);
        }

        let uri = self
            .qblock(qblock)
            .ok_or(EditorError::UnknownQblock(qblock))?
            .question(question)
            .ok_or(EditorError::UnknownQuestion(question))?
            .resource_uri();
        fetcher.delete_resource(&uri).await?;

        for qblock in &mut self.root_mut()?.qblocks {
            qblock.remove_question(question);
        }
        self.question_cache.remove(question);
        self.forget_move_panel(question);
        tracing::info!(question = %question, "deleted question");
        Ok(())
    }

    /// Append a blank, unsaved question to `qblock` and return its local id.
    ///
    /// The first add of a session fetches every question id to seed the
    /// local id counter.
    pub async fn add_question<F: ResourceFetcher>(
        &mut self,
        fetcher: &F,
        qblock: QblockId,
    ) -> Result<QuestionId> {
        self.qblock_mut(qblock)?;

        if !self.question_ids.is_seeded() {
            let records = fetcher
                .get_resources(ResourceKind::Question, &Query::all())
                .await?;
            let fetched = max_record_id(&records);
            let (in_tree, _) = self.max_tree_ids();
            self.question_ids.seed(fetched.max(in_tree));
        }
        let id = self
            .question_ids
            .allocate()
            .map(QuestionId)
            .ok_or(EditorError::NotLoaded)?;

        self.qblock_mut(qblock)?
            .questions
            .push(Question::blank(id, qblock));
        self.question_cache
            .insert(id, StagingRecord::unsaved(QuestionDraft::default()));
        self.track_move_panel(id);
        tracing::debug!(question = %id, qblock = %qblock, "added unsaved question");
        Ok(id)
    }

    /// Give an unsaved row holding `id` a fresh local id so a server row can
    /// take that id.
    fn evict_unsaved_question(&mut self, id: QuestionId) {
        let unsaved = self
            .question_cache
            .get(id)
            .is_some_and(|record| record.is_new);
        if !unsaved {
            return;
        }
        let Some(fresh) = self.question_ids.allocate().map(QuestionId) else {
            return;
        };

        for node in self.question_nodes_mut(id) {
            if !node.is_persisted() {
                node.id = fresh;
            }
        }
        self.question_cache.rekey(id, fresh);
        self.rename_move_panel(id, fresh);
        tracing::debug!(from = %id, to = %fresh, "re-keyed unsaved question");
    }
}

/// Overwrite a tree node with a saved question, keeping its loaded options.
fn replace_keeping_options(node: Option<&mut Question>, saved: &Question) -> bool {
    match node {
        Some(node) => {
            let options = std::mem::take(&mut node.options);
            *node = Question {
                options,
                ..saved.clone()
            };
            true
        }
        None => false,
    }
}

/// Largest `id` among raw records.
pub(crate) fn max_record_id(records: &[ecoe_client::Record]) -> u64 {
    records
        .iter()
        .filter_map(|record| record.get("id").and_then(serde_json::Value::as_u64))
        .max()
        .unwrap_or(0)
}
