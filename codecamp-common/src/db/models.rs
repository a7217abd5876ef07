//! Entity model
//!
//! Persistence-side shapes of camps, talks and speakers. These carry identity
//! and relationships but no behavior beyond a few association helpers.

use chrono::NaiveDateTime;

/// A conference event, keyed externally by its moniker
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Camp {
    /// Storage-assigned key (0 until the camp has been committed)
    pub camp_id: i64,
    /// Unique human-readable key used in URLs
    pub moniker: String,
    pub name: String,
    pub event_date: NaiveDateTime,
    /// Length of the event in days
    pub length: i32,
    pub location: Location,
    /// Talks, populated only when the query asked for them
    pub talks: Vec<Talk>,
}

/// Venue address embedded in a camp. Has no identity of its own.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    pub venue_name: Option<String>,
    pub address1: Option<String>,
    pub address2: Option<String>,
    pub address3: Option<String>,
    pub city_town: Option<String>,
    pub state_province: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

/// A session given at a camp by one speaker
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Talk {
    /// Storage-assigned key (0 until the talk has been committed)
    pub talk_id: i64,
    /// Owning camp
    pub camp_id: Option<i64>,
    pub title: String,
    pub abstract_text: String,
    pub level: i32,
    /// Speaker reference
    pub speaker_id: Option<i64>,
    /// Speaker details, populated only when the query asked for them
    pub speaker: Option<Speaker>,
}

impl Talk {
    /// Associate this talk with `camp`
    pub fn attach_camp(&mut self, camp: &Camp) {
        self.camp_id = Some(camp.camp_id);
    }

    /// Replace the speaker association (reference and loaded details)
    pub fn set_speaker(&mut self, speaker: Speaker) {
        self.speaker_id = Some(speaker.speaker_id);
        self.speaker = Some(speaker);
    }
}

/// A person who gives talks, possibly across several camps
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Speaker {
    pub speaker_id: i64,
    pub name: String,
    pub bio: Option<String>,
    pub web_site: Option<String>,
    pub company: Option<String>,
    pub company_url: Option<String>,
    pub job_title: Option<String>,
    pub twitter: Option<String>,
    pub git_hub: Option<String>,
}
