//! Wire models
//!
//! JSON shapes exchanged with clients. Camps carry their venue address as
//! flat top-level fields; talks embed their speaker.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Camp as seen by API clients
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CampModel {
    pub name: String,
    pub moniker: String,
    #[serde(with = "event_date")]
    pub event_date: NaiveDateTime,
    pub length: i32,

    pub venue: Option<String>,
    pub address1: Option<String>,
    pub address2: Option<String>,
    pub address3: Option<String>,
    pub city_town: Option<String>,
    pub state_province: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,

    pub talks: Vec<TalkModel>,
}

/// Talk as seen by API clients
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TalkModel {
    pub talk_id: i64,
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub level: i32,
    pub speaker: Option<SpeakerModel>,
}

/// Speaker as seen by API clients
///
/// On talk requests only `speakerId` is consulted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SpeakerModel {
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

impl CampModel {
    /// Check field constraints, returning one message per violation
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.name.trim().is_empty() {
            errors.push("The Name field is required.".to_string());
        } else if self.name.chars().count() > 100 {
            errors.push("The Name field must be at most 100 characters.".to_string());
        }

        if self.moniker.trim().is_empty() {
            errors.push("The Moniker field is required.".to_string());
        }

        if !(1..=100).contains(&self.length) {
            errors.push("The Length field must be between 1 and 100.".to_string());
        }

        finish(errors)
    }
}

impl TalkModel {
    /// Check field constraints, returning one message per violation
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.title.trim().is_empty() {
            errors.push("The Title field is required.".to_string());
        } else if self.title.chars().count() > 100 {
            errors.push("The Title field must be at most 100 characters.".to_string());
        }

        let abstract_len = self.abstract_text.chars().count();
        if self.abstract_text.trim().is_empty() {
            errors.push("The Abstract field is required.".to_string());
        } else if !(20..=4000).contains(&abstract_len) {
            errors.push("The Abstract field must be between 20 and 4000 characters.".to_string());
        }

        if !(100..=300).contains(&self.level) {
            errors.push("The Level field must be between 100 and 300.".to_string());
        }

        finish(errors)
    }
}

fn finish(errors: Vec<String>) -> Result<(), Vec<String>> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Parse a camp event date
///
/// Accepts RFC 3339 (`Z` or an offset; the wall-clock time is kept),
/// `YYYY-MM-DDTHH:MM:SS[.fff]` or a bare date.
pub fn parse_event_date(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    DateTime::parse_from_rfc3339(value)
        .map(|parsed| parsed.naive_local())
        .ok()
        .or_else(|| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f").ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// Serde adapter for `eventDate`
pub mod event_date {
    use chrono::NaiveDateTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

    pub fn serialize<S>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_event_date(&raw)
            .ok_or_else(|| de::Error::custom(format!("invalid event date: {}", raw)))
    }
}
