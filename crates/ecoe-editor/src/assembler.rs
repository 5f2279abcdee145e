//! Hierarchy assembly.
//!
//! Builds the station-rooted browsing tree in four dependent stages:
//!
//! ```text
//! areas ──> stations ──> select station ──> qblocks ──┬─> questions(qblock 1) ─┐
//!                                                     ├─> questions(qblock 2) ─┼─> merge
//!                                                     └─> questions(qblock n) ─┘
//! ```
//!
//! The per-qblock question fetches run concurrently and are merged back in
//! qblock order. Any failure, including a question whose area is not among
//! the fetched areas, fails the whole assembly.

use ecoe_client::{Query, ResourceFetcher, fetch_all};
use ecoe_model::{
    Area, ExamId, Qblock, QblockId, Question, QuestionId, QuestionRecord, ResourceKind, Station,
    StationId,
};
use futures_util::future::try_join_all;

use crate::error::{EditorError, Result};

/// What to browse: an exam, optionally narrowed to a station and a qblock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExamScope {
    pub exam: ExamId,
    pub station: Option<StationId>,
    /// Only honoured together with `station`.
    pub qblock: Option<QblockId>,
}

impl ExamScope {
    #[must_use]
    pub fn exam(exam: ExamId) -> Self {
        Self {
            exam,
            station: None,
            qblock: None,
        }
    }

    #[must_use]
    pub fn with_station(mut self, station: StationId) -> Self {
        self.station = Some(station);
        self
    }

    #[must_use]
    pub fn with_qblock(mut self, qblock: QblockId) -> Self {
        self.qblock = Some(qblock);
        self
    }

    /// Fix the scope to the station chosen by an assembly.
    ///
    /// A qblock filter given without a station was ignored by that assembly
    /// and is dropped so later reloads keep showing the whole station.
    pub fn pin_station(&mut self, station: StationId) {
        if self.station.is_none() {
            self.qblock = None;
        }
        self.station = Some(station);
    }

    fn qblock_query(&self, station: StationId) -> Query {
        match (self.station, self.qblock) {
            (Some(_), Some(qblock)) => Query::all().uri(ResourceKind::Qblock, qblock.get()),
            _ => Query::all().equals("station", station.get()),
        }
    }
}

/// Root node of the tree: the selected station and its qblocks.
#[derive(Debug, Clone, PartialEq)]
pub struct StationNode {
    pub station: Station,
    pub qblocks: Vec<Qblock>,
}

impl StationNode {
    #[must_use]
    pub fn qblock(&self, id: QblockId) -> Option<&Qblock> {
        self.qblocks.iter().find(|qblock| qblock.id == id)
    }

    pub fn qblock_mut(&mut self, id: QblockId) -> Option<&mut Qblock> {
        self.qblocks.iter_mut().find(|qblock| qblock.id == id)
    }

    /// Every question node in qblock order. A question linked to several
    /// qblocks of the station appears once per qblock.
    pub fn questions(&self) -> impl Iterator<Item = &Question> {
        self.qblocks.iter().flat_map(|qblock| qblock.questions.iter())
    }

    pub(crate) fn questions_mut(&mut self) -> impl Iterator<Item = &mut Question> {
        self.qblocks
            .iter_mut()
            .flat_map(|qblock| qblock.questions.iter_mut())
    }

    /// First node of the question with the given id.
    #[must_use]
    pub fn find_question(&self, id: QuestionId) -> Option<&Question> {
        self.questions().find(|question| question.id == id)
    }
}

/// Everything one assembly fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct Hierarchy {
    pub areas: Vec<Area>,
    pub stations: Vec<Station>,
    pub root: StationNode,
}

/// Assemble the tree for `scope`.
///
/// # Errors
///
/// - [`EditorError::NoStations`] when the exam has no station and none was requested
/// - [`EditorError::StationNotFound`] when the requested station is not in the exam
/// - [`EditorError::Integrity`] when a question references an unknown area
/// - [`EditorError::Request`] when any fetch fails
pub async fn assemble<F: ResourceFetcher>(fetcher: &F, scope: &ExamScope) -> Result<Hierarchy> {
    let exam = scope.exam.get();
    tracing::debug!(exam, station = ?scope.station, qblock = ?scope.qblock, "assembling hierarchy");

    let areas: Vec<Area> =
        fetch_all(fetcher, ResourceKind::Area, &Query::all().equals("ecoe", exam)).await?;
    let stations: Vec<Station> =
        fetch_all(fetcher, ResourceKind::Station, &Query::all().equals("ecoe", exam)).await?;
    let station = select_station(&stations, scope.station)?.clone();

    let qblocks: Vec<Qblock> =
        fetch_all(fetcher, ResourceKind::Qblock, &scope.qblock_query(station.id)).await?;
    let qblocks = try_join_all(
        qblocks
            .into_iter()
            .map(|qblock| attach_questions(fetcher, qblock, &areas)),
    )
    .await?;

    tracing::info!(
        station = %station.id,
        qblocks = qblocks.len(),
        questions = qblocks.iter().map(|qblock| qblock.questions.len()).sum::<usize>(),
        "assembled hierarchy"
    );

    Ok(Hierarchy {
        areas,
        stations,
        root: StationNode { station, qblocks },
    })
}

/// Pick the requested station, or the first one when none was requested.
pub fn select_station(stations: &[Station], requested: Option<StationId>) -> Result<&Station> {
    match requested {
        Some(id) => stations
            .iter()
            .find(|station| station.id == id)
            .ok_or(EditorError::StationNotFound(id)),
        None => stations.first().ok_or(EditorError::NoStations),
    }
}

async fn attach_questions<F: ResourceFetcher>(
    fetcher: &F,
    mut qblock: Qblock,
    areas: &[Area],
) -> Result<Qblock> {
    let records: Vec<QuestionRecord> = fetch_all(
        fetcher,
        ResourceKind::Question,
        &Query::all().contains("qblocks", qblock.id.get()),
    )
    .await?;

    qblock.questions = records
        .into_iter()
        .map(|record| Question::resolve(record, areas))
        .collect::<std::result::Result<_, _>>()?;
    Ok(qblock)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn station(id: u64) -> Station {
        Station {
            uri: ResourceKind::Station.uri(id),
            id: StationId(id),
            name: format!("Station {id}"),
            order: None,
        }
    }

    #[test]
    fn test_select_first_station_by_default() {
        let stations = vec![station(3), station(1)];
        assert_eq!(select_station(&stations, None).unwrap().id, StationId(3));
    }

    #[test]
    fn test_select_requested_station() {
        let stations = vec![station(3), station(1)];
        assert_eq!(
            select_station(&stations, Some(StationId(1))).unwrap().id,
            StationId(1)
        );
    }

    #[test]
    fn test_unknown_station_is_not_defaulted() {
        let stations = vec![station(3)];
        assert!(matches!(
            select_station(&stations, Some(StationId(8))),
            Err(EditorError::StationNotFound(StationId(8)))
        ));
        assert!(matches!(
            select_station(&[], None),
            Err(EditorError::NoStations)
        ));
    }

    #[test]
    fn test_qblock_filter_needs_station() {
        let only_qblock = ExamScope::exam(ExamId(1)).with_qblock(QblockId(4));
        assert_eq!(
            only_qblock.qblock_query(StationId(2)),
            Query::all().equals("station", 2)
        );

        let both = only_qblock.with_station(StationId(2));
        assert_eq!(
            both.qblock_query(StationId(2)),
            Query::all().uri(ResourceKind::Qblock, 4)
        );
    }

    #[test]
    fn test_pin_station_drops_ignored_qblock() {
        let mut scope = ExamScope::exam(ExamId(1)).with_qblock(QblockId(4));
        scope.pin_station(StationId(2));
        assert_eq!(scope.station, Some(StationId(2)));
        assert_eq!(scope.qblock, None);

        let mut scope = ExamScope::exam(ExamId(1))
            .with_station(StationId(2))
            .with_qblock(QblockId(4));
        scope.pin_station(StationId(2));
        assert_eq!(scope.qblock, Some(QblockId(4)));
    }
}
