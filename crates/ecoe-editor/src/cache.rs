//! Edit staging cache.
//!
//! One [`EditCache`] per entity kind maps a row id to a [`StagingRecord`]
//! overlaying the server state of that row. A record is in one of three
//! states:
//!
//! - `editing == false`: clean, mirrors the server
//! - `editing == true, is_new == false`: persisted row with local edits
//! - `editing == true, is_new == true`: unsaved row added locally
//!
//! Rows without a record are unknown to the cache.
//!
//! Every local mutation stamps the record with a fresh generation. Request
//! continuations compare the stamp they captured with the current one so a
//! response that raced a newer local edit cannot overwrite it.

use std::collections::HashMap;
use std::collections::hash_map;
use std::hash::Hash;

/// Staging state of one row.
#[derive(Debug, Clone, PartialEq)]
pub struct StagingRecord<D> {
    pub editing: bool,
    pub is_new: bool,
    pub draft: D,
    generation: u64,
}

/// Coarse state of a staged row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowState {
    Clean,
    Editing,
    Unsaved,
}

impl<D> StagingRecord<D> {
    /// A record mirroring server state, not in edit mode.
    pub fn clean(draft: D) -> Self {
        Self {
            editing: false,
            is_new: false,
            draft,
            generation: 0,
        }
    }

    /// A record for a row added locally and not yet saved.
    pub fn unsaved(draft: D) -> Self {
        Self {
            editing: true,
            is_new: true,
            draft,
            generation: 0,
        }
    }

    #[inline]
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn state(&self) -> RowState {
        match (self.editing, self.is_new) {
            (_, true) => RowState::Unsaved,
            (true, false) => RowState::Editing,
            (false, false) => RowState::Clean,
        }
    }
}

/// Staging map for one entity kind.
#[derive(Debug, Clone)]
pub struct EditCache<K, D> {
    rows: HashMap<K, StagingRecord<D>>,
    next_generation: u64,
}

impl<K, D> Default for EditCache<K, D> {
    fn default() -> Self {
        Self {
            rows: HashMap::new(),
            next_generation: 1,
        }
    }
}

impl<K, D> EditCache<K, D>
where
    K: Copy + Eq + Hash,
{
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, id: K) -> Option<&StagingRecord<D>> {
        self.rows.get(&id)
    }

    #[must_use]
    pub fn contains(&self, id: K) -> bool {
        self.rows.contains_key(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> hash_map::Iter<'_, K, StagingRecord<D>> {
        self.rows.iter()
    }

    /// Whether the row is in edit mode.
    #[must_use]
    pub fn is_editing(&self, id: K) -> bool {
        self.rows.get(&id).is_some_and(|record| record.editing)
    }

    /// Insert or replace a record, stamping it with a fresh generation.
    pub fn insert(&mut self, id: K, mut record: StagingRecord<D>) {
        record.generation = self.bump();
        self.rows.insert(id, record);
    }

    pub fn remove(&mut self, id: K) -> Option<StagingRecord<D>> {
        self.rows.remove(&id)
    }

    /// Put the row into edit mode. Returns `false` when the row is unknown.
    pub fn start_edit(&mut self, id: K) -> bool {
        self.modify(id, |record| record.editing = true)
    }

    /// Change a row's draft. Returns `false` when the row is unknown.
    pub fn edit(&mut self, id: K, change: impl FnOnce(&mut D)) -> bool {
        self.modify(id, |record| change(&mut record.draft))
    }

    /// Apply `change` to the whole record and stamp a new generation.
    pub fn modify(&mut self, id: K, change: impl FnOnce(&mut StagingRecord<D>)) -> bool {
        let generation = self.bump();
        match self.rows.get_mut(&id) {
            Some(record) => {
                change(record);
                record.generation = generation;
                true
            }
            None => false,
        }
    }

    /// Whether the row still carries the generation captured earlier.
    #[must_use]
    pub fn is_current(&self, id: K, generation: u64) -> bool {
        self.rows
            .get(&id)
            .is_some_and(|record| record.generation == generation)
    }

    /// Move a record to a new key, keeping its contents and generation.
    pub fn rekey(&mut self, from: K, to: K) -> bool {
        match self.rows.remove(&from) {
            Some(record) => {
                self.rows.insert(to, record);
                true
            }
            None => false,
        }
    }

    /// Drop every record for which `keep` returns `false`.
    pub fn retain(&mut self, mut keep: impl FnMut(K, &StagingRecord<D>) -> bool) {
        self.rows.retain(|id, record| keep(*id, record));
    }

    fn bump(&mut self) -> u64 {
        let generation = self.next_generation;
        self.next_generation += 1;
        generation
    }
}

/// Allocates ids for unsaved rows of one entity kind.
///
/// Seeded once from the largest id known for the kind; afterwards every
/// allocation is strictly greater than every id seeded or observed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalIdAllocator {
    next: Option<u64>,
}

impl LocalIdAllocator {
    #[must_use]
    pub fn is_seeded(&self) -> bool {
        self.next.is_some()
    }

    /// Seed from the largest known id. Later calls only raise the floor.
    pub fn seed(&mut self, max_known: u64) {
        match self.next {
            Some(_) => self.observe(max_known),
            None => self.next = Some(max_known + 1),
        }
    }

    /// Record an id assigned elsewhere so it is never handed out locally.
    pub fn observe(&mut self, id: u64) {
        if let Some(next) = self.next
            && id >= next
        {
            self.next = Some(id + 1);
        }
    }

    /// Next local id, or `None` until seeded.
    pub fn allocate(&mut self) -> Option<u64> {
        let id = self.next?;
        self.next = Some(id + 1);
        Some(id)
    }
}
