//! Lazy option loading and inline editing of option rows.
//!
//! Options of a question are fetched only when the question is expanded.
//! Every node of the question in the tree shares the same option list, so a
//! question linked to several qblocks shows the same options everywhere.
//! Option lists are re-sorted ascending by order after every change.

use ecoe_client::{Query, ResourceFetcher, create, fetch_all, update};
use ecoe_model::{
    OptionBody, OptionDraft, OptionId, Question, QuestionId, QuestionOption, ResourceKind,
};

use crate::cache::StagingRecord;
use crate::error::{EditorError, Result};
use crate::questions::max_record_id;
use crate::session::EditSession;

/// A validated option save waiting for its request.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingOptionSave {
    question: QuestionId,
    option: OptionId,
    generation: u64,
    uri: Option<String>,
    body: OptionBody,
}

impl PendingOptionSave {
    #[must_use]
    pub fn option(&self) -> OptionId {
        self.option
    }

    #[must_use]
    pub fn is_create(&self) -> bool {
        self.uri.is_none()
    }

    /// Issue the create or update request.
    pub async fn send<F: ResourceFetcher>(&self, fetcher: &F) -> Result<QuestionOption> {
        let saved: QuestionOption = match &self.uri {
            None => {
                tracing::debug!(option = %self.option, "creating option");
                create(fetcher, ResourceKind::Option.route(), &self.body).await?
            }
            Some(uri) => {
                tracing::debug!(option = %self.option, uri = %uri, "updating option");
                update(fetcher, uri, &self.body).await?
            }
        };
        Ok(saved)
    }
}

impl EditSession {
    /// Fetch the options of `question` when `expand` is set.
    ///
    /// Collapsing (`expand == false`) issues no request and keeps whatever
    /// options were loaded before. Rows in edit mode keep their drafts;
    /// unsaved option rows of the question are dropped.
    pub async fn load_options_by_question<F: ResourceFetcher>(
        &mut self,
        fetcher: &F,
        expand: bool,
        question: QuestionId,
    ) -> Result<()> {
        if !expand {
            return Ok(());
        }
        self.question(question)
            .ok_or(EditorError::UnknownQuestion(question))?;

        let query = Query::all()
            .equals("question", question.get())
            .sort_by("order", false);
        let mut options: Vec<QuestionOption> =
            fetch_all(fetcher, ResourceKind::Option, &query).await?;
        ecoe_model::sort_options(&mut options);

        let unsaved: Vec<OptionId> = self
            .question(question)
            .map(|node| {
                node.options
                    .iter()
                    .filter(|option| !option.is_persisted())
                    .map(|option| option.id)
                    .collect()
            })
            .unwrap_or_default();
        for id in unsaved {
            self.option_cache.remove(id);
        }

        for option in &options {
            self.option_ids.observe(option.id.get());
            let keep = self
                .option_cache
                .get(option.id)
                .is_some_and(|record| record.editing && !record.is_new);
            if !keep {
                self.option_cache
                    .insert(option.id, StagingRecord::clean(OptionDraft::from_option(option)));
            }
        }
        tracing::debug!(question = %question, count = options.len(), "loaded options");
        for node in self.question_nodes_mut(question) {
            node.options.clone_from(&options);
        }
        Ok(())
    }

    /// Put an option row into edit mode. No request is issued.
    pub fn start_edit_option(&mut self, option: OptionId) -> Result<()> {
        if self.option_cache.start_edit(option) {
            Ok(())
        } else {
            Err(EditorError::RowNotStaged(option.get()))
        }
    }

    /// Validate the row's draft and build the request for saving it.
    ///
    /// # Errors
    ///
    /// - [`EditorError::Validation`] when order, label or points is missing
    /// - [`EditorError::RowNotStaged`] when the row has no staging record
    /// - [`EditorError::UnknownOption`] when the row is not an option of `question`
    pub fn prepare_option_save(
        &self,
        question: QuestionId,
        option: OptionId,
    ) -> Result<PendingOptionSave> {
        let node = self.option_node(question, option)?;
        let record = self
            .option_cache
            .get(option)
            .ok_or(EditorError::RowNotStaged(option.get()))?;
        let body = record.draft.validate(question)?;

        let uri = if record.is_new {
            None
        } else {
            Some(
                node.uri
                    .clone()
                    .unwrap_or_else(|| ResourceKind::Option.uri(option.get())),
            )
        };
        Ok(PendingOptionSave {
            question,
            option,
            generation: record.generation(),
            uri,
            body,
        })
    }

    /// Merge the server's answer to an option save.
    ///
    /// Same re-keying and generation rules as
    /// [`complete_question_save`](Self::complete_question_save).
    pub fn complete_option_save(
        &mut self,
        pending: PendingOptionSave,
        saved: QuestionOption,
    ) -> Result<OptionId> {
        let previous = pending.option;
        let id = saved.id;
        self.option_ids.observe(id.get());

        if id != previous {
            self.evict_unsaved_option(pending.question, id);
        }

        let mut replaced = false;
        for node in self.question_nodes_mut(pending.question) {
            if let Some(slot) = node.options.iter_mut().find(|option| option.id == previous) {
                *slot = saved.clone();
                replaced = true;
            }
            node.sort_options();
        }
        if !replaced {
            tracing::warn!(option = %previous, "saved option is no longer in the tree");
            self.option_cache.remove(previous);
            return Ok(id);
        }

        let keep_draft = !self.option_cache.is_current(previous, pending.generation)
            && self.option_cache.is_editing(previous);
        if keep_draft {
            tracing::warn!(option = %previous, "row changed while saving, keeping newer draft");
            self.option_cache.rekey(previous, id);
            self.option_cache.modify(id, |record| record.is_new = false);
        } else {
            self.option_cache.remove(previous);
            self.option_cache.remove(id);
            self.option_cache
                .insert(id, StagingRecord::clean(OptionDraft::from_option(&saved)));
        }

        tracing::info!(option = %id, previous = %previous, "saved option");
        Ok(id)
    }

    /// Validate, send and merge an option save.
    pub async fn save_option<F: ResourceFetcher>(
        &mut self,
        fetcher: &F,
        question: QuestionId,
        option: OptionId,
    ) -> Result<OptionId> {
        let pending = self.prepare_option_save(question, option)?;
        let saved = pending.send(fetcher).await?;
        self.complete_option_save(pending, saved)
    }

    /// Leave edit mode without saving.
    pub fn cancel_option(&mut self, question: QuestionId, option: OptionId) -> Result<()> {
        let record = self
            .option_cache
            .get(option)
            .ok_or(EditorError::RowNotStaged(option.get()))?;

        if record.is_new {
            self.remove_option_nodes(question, option);
            self.option_cache.remove(option);
            tracing::debug!(option = %option, "discarded unsaved option");
            return Ok(());
        }

        let node = self.option_node(question, option)?.clone();
        self.option_cache.modify(option, |record| {
            record.draft.reconcile(&node);
            record.editing = false;
        });
        tracing::debug!(option = %option, "reverted option edits");
        Ok(())
    }

    /// Delete an option on the server, then drop it from the tree.
    pub async fn delete_option<F: ResourceFetcher>(
        &mut self,
        fetcher: &F,
        question: QuestionId,
        option: OptionId,
    ) -> Result<()> {
        if self
            .option_cache
            .get(option)
            .is_some_and(|record| record.is_new)
        {
            return self.cancel_option(question, option);
        }

        let node = self.option_node(question, option)?;
        let uri = node
            .uri
            .clone()
            .unwrap_or_else(|| ResourceKind::Option.uri(option.get()));
        fetcher.delete_resource(&uri).await?;

        self.remove_option_nodes(question, option);
        self.option_cache.remove(option);
        tracing::info!(option = %option, "deleted option");
        Ok(())
    }

    /// Append a blank, unsaved option to `question` and return its local id.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::NotPersisted`] when the question itself has not
    /// been saved yet.
    pub async fn add_option<F: ResourceFetcher>(
        &mut self,
        fetcher: &F,
        question: QuestionId,
    ) -> Result<OptionId> {
        let node = self
            .question(question)
            .ok_or(EditorError::UnknownQuestion(question))?;
        if !node.is_persisted() {
            return Err(EditorError::NotPersisted(question.get()));
        }

        if !self.option_ids.is_seeded() {
            let records = fetcher
                .get_resources(ResourceKind::Option, &Query::all())
                .await?;
            let fetched = max_record_id(&records);
            let (_, in_tree) = self.max_tree_ids();
            self.option_ids.seed(fetched.max(in_tree));
        }
        let id = self
            .option_ids
            .allocate()
            .map(OptionId)
            .ok_or(EditorError::NotLoaded)?;

        let blank = QuestionOption::blank(id, question);
        for node in self.question_nodes_mut(question) {
            node.options.push(blank.clone());
            node.sort_options();
        }
        self.option_cache.insert(
            id,
            StagingRecord::unsaved(OptionDraft {
                points: Some(0.0),
                ..OptionDraft::default()
            }),
        );
        tracing::debug!(option = %id, question = %question, "added unsaved option");
        Ok(id)
    }

    pub(crate) fn option_node(
        &self,
        question: QuestionId,
        option: OptionId,
    ) -> Result<&QuestionOption> {
        self.question(question)
            .ok_or(EditorError::UnknownQuestion(question))?
            .option(option)
            .ok_or(EditorError::UnknownOption { question, option })
    }

    fn remove_option_nodes(&mut self, question: QuestionId, option: OptionId) {
        for node in self.question_nodes_mut(question) {
            node.options.retain(|item| item.id != option);
        }
    }

    fn evict_unsaved_option(&mut self, question: QuestionId, id: OptionId) {
        let unsaved = self
            .option_cache
            .get(id)
            .is_some_and(|record| record.is_new);
        if !unsaved {
            return;
        }
        let Some(fresh) = self.option_ids.allocate().map(OptionId) else {
            return;
        };

        let owner = self
            .root()
            .into_iter()
            .flat_map(|root| root.questions())
            .find(|node| node.option(id).is_some_and(|option| !option.is_persisted()))
            .map_or(question, |node: &Question| node.id);
        for node in self.question_nodes_mut(owner) {
            for option in &mut node.options {
                if option.id == id && !option.is_persisted() {
                    option.id = fresh;
                }
            }
        }
        self.option_cache.rekey(id, fresh);
        tracing::debug!(from = %id, to = %fresh, "re-keyed unsaved option");
    }
}
