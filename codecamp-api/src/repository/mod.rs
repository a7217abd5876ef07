//! Repository contract
//!
//! Handlers talk to storage only through [`CampRepository`]. Reads go
//! straight to the store; mutations are staged in a [`UnitOfWork`] and only
//! become durable when [`CampRepository::save_changes`] succeeds.

use async_trait::async_trait;
use chrono::NaiveDate;
use codecamp_common::{Camp, Speaker, Talk};
use thiserror::Error;

mod sqlite;
mod unit_of_work;

pub use sqlite::SqliteCampRepository;
pub use unit_of_work::{EntryState, StageToken, StagedEntry, UnitOfWork};

/// Repository errors (distinct from a commit that affected nothing)
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Query or commit failure reported by the store
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A staged entity breaks a relationship invariant
    #[error("Invalid entity: {0}")]
    InvalidEntity(String),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Anything that can be staged for persistence
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    Camp(Camp),
    Talk(Talk),
    Speaker(Speaker),
}

impl Entity {
    pub fn as_camp(&self) -> Option<&Camp> {
        match self {
            Entity::Camp(camp) => Some(camp),
            _ => None,
        }
    }

    pub fn as_talk(&self) -> Option<&Talk> {
        match self {
            Entity::Talk(talk) => Some(talk),
            _ => None,
        }
    }

    pub fn as_speaker(&self) -> Option<&Speaker> {
        match self {
            Entity::Speaker(speaker) => Some(speaker),
            _ => None,
        }
    }
}

impl From<Camp> for Entity {
    fn from(camp: Camp) -> Self {
        Entity::Camp(camp)
    }
}

impl From<Talk> for Entity {
    fn from(talk: Talk) -> Self {
        Entity::Talk(talk)
    }
}

impl From<Speaker> for Entity {
    fn from(speaker: Speaker) -> Self {
        Entity::Speaker(speaker)
    }
}

/// Storage-facing operations used by the request handlers
///
/// One instance serves one request; staged changes are never shared.
#[async_trait]
pub trait CampRepository: Send + Sync {
    /// All camps, newest event first
    async fn get_all_camps(&self, include_talks: bool) -> RepositoryResult<Vec<Camp>>;

    /// Camp by moniker (talks not loaded)
    async fn get_camp(&self, moniker: &str) -> RepositoryResult<Option<Camp>>;

    /// Camps whose event falls on `date`, newest first
    async fn get_camps_by_event_date(
        &self,
        date: NaiveDate,
        include_talks: bool,
    ) -> RepositoryResult<Vec<Camp>>;

    /// Talks of the camp with `moniker`, ordered by title; empty if unknown
    async fn get_talks_for_camp(
        &self,
        moniker: &str,
        include_speakers: bool,
    ) -> RepositoryResult<Vec<Talk>>;

    async fn get_talk(
        &self,
        moniker: &str,
        talk_id: i64,
        include_speaker: bool,
    ) -> RepositoryResult<Option<Talk>>;

    async fn get_speaker(&self, speaker_id: i64) -> RepositoryResult<Option<Speaker>>;

    /// Round trip to the store without touching any table
    async fn ping(&self) -> RepositoryResult<()>;

    /// Stage an insert
    fn add(&mut self, entity: Entity) -> StageToken;

    /// Stage an overwrite of an existing entity
    fn update(&mut self, entity: Entity) -> StageToken;

    /// Stage a removal
    fn delete(&mut self, entity: Entity) -> StageToken;

    /// Staged entity for `token`; after a successful commit it carries its
    /// storage-assigned key
    fn entry(&self, token: StageToken) -> Option<&Entity>;

    /// Persist every pending change atomically
    ///
    /// `Ok(false)` when nothing was affected or the write hit a recoverable
    /// conflict. Any other failure is an `Err`.
    async fn save_changes(&mut self) -> RepositoryResult<bool>;
}

/// Hands out a fresh repository per request
pub trait RepositoryProvider: Send + Sync {
    fn repository(&self) -> Box<dyn CampRepository>;
}

impl RepositoryProvider for sqlx::SqlitePool {
    fn repository(&self) -> Box<dyn CampRepository> {
        Box::new(SqliteCampRepository::new(self.clone()))
    }
}
