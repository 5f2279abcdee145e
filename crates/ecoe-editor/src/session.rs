//! Session state shared by every editor operation.

use std::collections::{HashMap, HashSet};

use ecoe_client::{Query, ResourceFetcher, fetch_all};
use ecoe_model::{
    Area, OptionDraft, OptionId, Qblock, QblockId, Question, QuestionDraft, QuestionId,
    ResourceKind, Station, StationId,
};

use crate::assembler::{ExamScope, Hierarchy, StationNode, assemble};
use crate::cache::{EditCache, LocalIdAllocator, StagingRecord};
use crate::error::{EditorError, Result};

/// Editing state for one browsing session.
///
/// Owns the assembled tree, both staging caches, the local id counters and
/// the move panel flags. Nothing is global: two sessions never share state.
#[derive(Debug, Clone, Default)]
pub struct EditSession {
    scope: ExamScope,
    areas: Vec<Area>,
    stations: Vec<Station>,
    root: Option<StationNode>,
    qblock_choices: Vec<Qblock>,
    pub(crate) question_cache: EditCache<QuestionId, QuestionDraft>,
    pub(crate) option_cache: EditCache<OptionId, OptionDraft>,
    pub(crate) question_ids: LocalIdAllocator,
    pub(crate) option_ids: LocalIdAllocator,
    move_panels: HashMap<QuestionId, bool>,
}

impl EditSession {
    /// An empty session for `scope`. Nothing is fetched until [`reload`](Self::reload).
    #[must_use]
    pub fn new(scope: ExamScope) -> Self {
        Self {
            scope,
            ..Self::default()
        }
    }

    /// Assemble the tree for `scope` and stage every question.
    ///
    /// # Errors
    ///
    /// Fails with whatever [`assemble`] fails with.
    pub async fn load<F: ResourceFetcher>(fetcher: &F, scope: ExamScope) -> Result<Self> {
        let mut session = Self::new(scope);
        session.reload(fetcher).await?;
        Ok(session)
    }

    /// Re-assemble the tree with the current scope.
    ///
    /// Persisted rows that are still present keep their edit mode and draft.
    /// Unsaved rows are dropped and every move panel is closed. On failure
    /// the session is left unchanged.
    pub async fn reload<F: ResourceFetcher>(&mut self, fetcher: &F) -> Result<()> {
        let hierarchy = assemble(fetcher, &self.scope).await?;
        self.install(hierarchy);
        Ok(())
    }

    /// Replace the tree with an assembled hierarchy.
    pub fn install(&mut self, hierarchy: Hierarchy) {
        let Hierarchy {
            areas,
            stations,
            root,
        } = hierarchy;
        self.scope.pin_station(root.station.id);

        let mut present = HashSet::new();
        for question in root.questions() {
            if !present.insert(question.id) {
                continue;
            }
            self.question_ids.observe(question.id.get());
            let keep = self
                .question_cache
                .get(question.id)
                .is_some_and(|record| record.editing && !record.is_new);
            if !keep {
                self.question_cache.insert(
                    question.id,
                    StagingRecord::clean(QuestionDraft::from_question(question)),
                );
            }
        }
        self.question_cache.retain(|id, _| present.contains(&id));
        self.option_cache
            .retain(|_, record| record.editing && !record.is_new);
        self.move_panels = present.into_iter().map(|id| (id, false)).collect();

        tracing::debug!(
            station = %root.station.id,
            staged = self.question_cache.len(),
            "installed hierarchy"
        );
        self.areas = areas;
        self.stations = stations;
        self.root = Some(root);
    }

    /// Fetch the qblocks of `station` as move targets.
    pub async fn load_qblocks_by_station<F: ResourceFetcher>(
        &mut self,
        fetcher: &F,
        station: StationId,
    ) -> Result<&[Qblock]> {
        let qblocks: Vec<Qblock> = fetch_all(
            fetcher,
            ResourceKind::Qblock,
            &Query::all().equals("station", station.get()),
        )
        .await?;
        self.qblock_choices = qblocks;
        Ok(&self.qblock_choices)
    }

    #[must_use]
    pub fn scope(&self) -> &ExamScope {
        &self.scope
    }

    #[must_use]
    pub fn areas(&self) -> &[Area] {
        &self.areas
    }

    #[must_use]
    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    /// Qblocks fetched by the last [`load_qblocks_by_station`](Self::load_qblocks_by_station).
    #[must_use]
    pub fn qblock_choices(&self) -> &[Qblock] {
        &self.qblock_choices
    }

    /// The assembled tree, if one has been loaded.
    #[must_use]
    pub fn root(&self) -> Option<&StationNode> {
        self.root.as_ref()
    }

    #[must_use]
    pub fn question_cache(&self) -> &EditCache<QuestionId, QuestionDraft> {
        &self.question_cache
    }

    #[must_use]
    pub fn option_cache(&self) -> &EditCache<OptionId, OptionDraft> {
        &self.option_cache
    }

    #[must_use]
    pub fn qblock(&self, id: QblockId) -> Option<&Qblock> {
        self.root.as_ref()?.qblock(id)
    }

    /// First node of the question anywhere in the tree.
    #[must_use]
    pub fn question(&self, id: QuestionId) -> Option<&Question> {
        self.root.as_ref()?.find_question(id)
    }

    /// Change a question row's draft.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::RowNotStaged`] when the row has no record.
    pub fn edit_question_draft(
        &mut self,
        question: QuestionId,
        change: impl FnOnce(&mut QuestionDraft),
    ) -> Result<()> {
        if self.question_cache.edit(question, change) {
            Ok(())
        } else {
            Err(EditorError::RowNotStaged(question.get()))
        }
    }

    /// Change an option row's draft.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::RowNotStaged`] when the row has no record.
    pub fn edit_option_draft(
        &mut self,
        option: OptionId,
        change: impl FnOnce(&mut OptionDraft),
    ) -> Result<()> {
        if self.option_cache.edit(option, change) {
            Ok(())
        } else {
            Err(EditorError::RowNotStaged(option.get()))
        }
    }

    #[must_use]
    pub fn is_move_panel_open(&self, question: QuestionId) -> bool {
        self.move_panels.get(&question).copied().unwrap_or(false)
    }

    /// Flip the move panel of a question and return the new state.
    pub fn toggle_move_panel(&mut self, question: QuestionId) -> Result<bool> {
        let open = self
            .move_panels
            .get_mut(&question)
            .ok_or(EditorError::UnknownQuestion(question))?;
        *open = !*open;
        Ok(*open)
    }

    pub fn close_move_panel(&mut self, question: QuestionId) {
        if let Some(open) = self.move_panels.get_mut(&question) {
            *open = false;
        }
    }

    pub(crate) fn track_move_panel(&mut self, question: QuestionId) {
        self.move_panels.entry(question).or_insert(false);
    }

    pub(crate) fn forget_move_panel(&mut self, question: QuestionId) {
        self.move_panels.remove(&question);
    }

    pub(crate) fn rename_move_panel(&mut self, from: QuestionId, to: QuestionId) {
        if let Some(open) = self.move_panels.remove(&from) {
            self.move_panels.insert(to, open);
        }
    }

    pub(crate) fn root_mut(&mut self) -> Result<&mut StationNode> {
        self.root.as_mut().ok_or(EditorError::NotLoaded)
    }

    pub(crate) fn qblock_mut(&mut self, id: QblockId) -> Result<&mut Qblock> {
        self.root_mut()?
            .qblock_mut(id)
            .ok_or(EditorError::UnknownQblock(id))
    }

    /// Every node of the question in the tree.
    pub(crate) fn question_nodes_mut(
        &mut self,
        id: QuestionId,
    ) -> impl Iterator<Item = &mut Question> {
        self.root
            .iter_mut()
            .flat_map(StationNode::questions_mut)
            .filter(move |question| question.id == id)
    }

    /// Largest id of each kind present in the tree.
    pub(crate) fn max_tree_ids(&self) -> (u64, u64) {
        let questions = self.root.iter().flat_map(StationNode::questions);
        questions.fold((0, 0), |(question_max, option_max), question| {
            let option_max = question
                .options
                .iter()
                .map(|option| option.id.get())
                .fold(option_max, u64::max);
            (question_max.max(question.id.get()), option_max)
        })
    }
}

#[cfg(test)]
mod tests {
    use ecoe_model::{AreaId, AreaLink, ExamId, QuestionType};

    use super::*;

    fn hierarchy(questions: &[u64]) -> Hierarchy {
        let area = Area {
            uri: ResourceKind::Area.uri(1),
            id: AreaId(1),
            name: "Anamnesis".to_string(),
            code: None,
        };
        let mut qblock: Qblock = serde_json::from_value(serde_json::json!({
            "$uri": "/api/qblock/10",
            "id": 10,
            "name": "Block",
            "station": {"$ref": "/api/station/5"},
        }))
        .unwrap();
        qblock.questions = questions
            .iter()
            .map(|&id| {
                let mut question = Question::blank(QuestionId(id), QblockId(10));
                question.uri = Some(ResourceKind::Question.uri(id));
                question.description = format!("Question {id}");
                question.reference = format!("R{id}");
                question.question_type = Some(QuestionType::OneAnswer);
                question.area = Some(AreaLink::from(&area));
                question
            })
            .collect();

        Hierarchy {
            areas: vec![area],
            stations: vec![Station {
                uri: ResourceKind::Station.uri(5),
                id: StationId(5),
                name: "Station 5".to_string(),
                order: Some(1),
            }],
            root: StationNode {
                station: Station {
                    uri: ResourceKind::Station.uri(5),
                    id: StationId(5),
                    name: "Station 5".to_string(),
                    order: Some(1),
                },
                qblocks: vec![qblock],
            },
        }
    }

    #[test]
    fn test_install_stages_every_question() {
        let mut session = EditSession::new(ExamScope::exam(ExamId(1)));
        session.install(hierarchy(&[1, 2]));

        assert_eq!(session.scope().station, Some(StationId(5)));
        assert_eq!(session.question_cache().len(), 2);
        assert!(!session.question_cache().is_editing(QuestionId(1)));
        assert!(!session.is_move_panel_open(QuestionId(2)));
    }

    #[test]
    fn test_install_keeps_rows_in_edit_mode() {
        let mut session = EditSession::new(ExamScope::exam(ExamId(1)));
        session.install(hierarchy(&[1, 2]));
        session.question_cache.start_edit(QuestionId(1));
        session
            .edit_question_draft(QuestionId(1), |draft| draft.description = "edited".into())
            .unwrap();

        session.install(hierarchy(&[1]));

        let record = session.question_cache().get(QuestionId(1)).unwrap();
        assert!(record.editing);
        assert_eq!(record.draft.description, "edited");
        assert!(!session.question_cache().contains(QuestionId(2)));
    }

    #[test]
    fn test_move_panel_toggle() {
        let mut session = EditSession::new(ExamScope::exam(ExamId(1)));
        session.install(hierarchy(&[1]));

        assert!(session.toggle_move_panel(QuestionId(1)).unwrap());
        assert!(session.is_move_panel_open(QuestionId(1)));
        session.close_move_panel(QuestionId(1));
        assert!(!session.is_move_panel_open(QuestionId(1)));
        assert!(matches!(
            session.toggle_move_panel(QuestionId(9)),
            Err(EditorError::UnknownQuestion(QuestionId(9)))
        ));
    }

    #[test]
    fn test_edit_unknown_row() {
        let mut session = EditSession::new(ExamScope::exam(ExamId(1)));
        assert!(matches!(
            session.edit_option_draft(OptionId(3), |draft| draft.label.clear()),
            Err(EditorError::RowNotStaged(3))
        ));
    }
}
