//! In-memory change tracking for the repository

use super::Entity;

/// Handle to a staged entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageToken(usize);

/// Lifecycle of a staged entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    Added,
    Modified,
    Deleted,
    /// Committed add or update
    Unchanged,
    /// Committed delete
    Detached,
}

impl EntryState {
    pub fn is_pending(self) -> bool {
        matches!(self, EntryState::Added | EntryState::Modified | EntryState::Deleted)
    }
}

#[derive(Debug, Clone)]
pub struct StagedEntry {
    pub state: EntryState,
    pub entity: Entity,
}

/// Ordered list of staged mutations
///
/// Changes are applied in staging order, so a speaker added before a talk
/// that references it is inserted first.
#[derive(Debug, Default)]
pub struct UnitOfWork {
    entries: Vec<StagedEntry>,
}

impl UnitOfWork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(&mut self, state: EntryState, entity: Entity) -> StageToken {
        self.entries.push(StagedEntry { state, entity });
        StageToken(self.entries.len() - 1)
    }

    pub fn entry(&self, token: StageToken) -> Option<&Entity> {
        self.entries.get(token.0).map(|e| &e.entity)
    }

    pub fn state(&self, token: StageToken) -> Option<EntryState> {
        self.entries.get(token.0).map(|e| e.state)
    }

    pub fn has_pending(&self) -> bool {
        self.entries.iter().any(|e| e.state.is_pending())
    }

    /// Pending entries in staging order
    pub fn pending(&self) -> impl Iterator<Item = (StageToken, &StagedEntry)> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.state.is_pending())
            .map(|(i, e)| (StageToken(i), e))
    }

    /// Record the storage-assigned key of an inserted entity
    pub fn assign_key(&mut self, token: StageToken, key: i64) {
        if let Some(entry) = self.entries.get_mut(token.0) {
            match &mut entry.entity {
                Entity::Camp(camp) => camp.camp_id = key,
                Entity::Talk(talk) => talk.talk_id = key,
                Entity::Speaker(speaker) => speaker.speaker_id = key,
            }
        }
    }

    /// Mark every pending entry as committed
    pub fn accept_all(&mut self) {
        for entry in &mut self.entries {
            entry.state = match entry.state {
                EntryState::Added | EntryState::Modified => EntryState::Unchanged,
                EntryState::Deleted => EntryState::Detached,
                other => other,
            };
        }
    }
}
