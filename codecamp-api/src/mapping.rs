//! Entity ↔ wire model conversion
//!
//! One function per direction per entity pair. Conversions are pure and never
//! fail. The `apply_*` functions overwrite an existing entity in place and
//! leave identity and relationships alone:
//! - camps keep their key and talks
//! - talks keep their key, camp and speaker

use codecamp_common::{Camp, Location, Speaker, Talk};

use crate::models::{CampModel, SpeakerModel, TalkModel};

/// Camp → CampModel, flattening the location
pub fn camp_to_model(camp: &Camp) -> CampModel {
    let location = &camp.location;

    CampModel {
        name: camp.name.clone(),
        moniker: camp.moniker.clone(),
        event_date: camp.event_date,
        length: camp.length,
        venue: location.venue_name.clone(),
        address1: location.address1.clone(),
        address2: location.address2.clone(),
        address3: location.address3.clone(),
        city_town: location.city_town.clone(),
        // Existing clients see the city here, not the stored state/province.
        state_province: location.city_town.clone(),
        postal_code: location.postal_code.clone(),
        country: location.country.clone(),
        talks: camp.talks.iter().map(talk_to_model).collect(),
    }
}

/// CampModel → new Camp (no key, no talks)
pub fn camp_from_model(model: &CampModel) -> Camp {
    let mut camp = Camp::default();
    apply_camp_model(model, &mut camp);
    camp
}

/// Overwrite `camp`'s scalar and address fields from `model`
pub fn apply_camp_model(model: &CampModel, camp: &mut Camp) {
    camp.name = model.name.clone();
    camp.moniker = model.moniker.clone();
    camp.event_date = model.event_date;
    camp.length = model.length;
    camp.location = Location {
        venue_name: model.venue.clone(),
        address1: model.address1.clone(),
        address2: model.address2.clone(),
        address3: model.address3.clone(),
        city_town: model.city_town.clone(),
        state_province: model.state_province.clone(),
        postal_code: model.postal_code.clone(),
        country: model.country.clone(),
    };
}

/// Talk → TalkModel, including the speaker when it was loaded
pub fn talk_to_model(talk: &Talk) -> TalkModel {
    TalkModel {
        talk_id: talk.talk_id,
        title: talk.title.clone(),
        abstract_text: talk.abstract_text.clone(),
        level: talk.level,
        speaker: talk.speaker.as_ref().map(speaker_to_model),
    }
}

/// TalkModel → new Talk with no camp or speaker attached
pub fn talk_from_model(model: &TalkModel) -> Talk {
    let mut talk = Talk::default();
    apply_talk_model(model, &mut talk);
    talk
}

/// Overwrite `talk`'s scalar fields from `model`
///
/// `model.speaker` is ignored: associations are resolved by the handlers.
pub fn apply_talk_model(model: &TalkModel, talk: &mut Talk) {
    talk.title = model.title.clone();
    talk.abstract_text = model.abstract_text.clone();
    talk.level = model.level;
}

pub fn speaker_to_model(speaker: &Speaker) -> SpeakerModel {
    SpeakerModel {
        speaker_id: speaker.speaker_id,
        name: speaker.name.clone(),
        bio: speaker.bio.clone(),
        web_site: speaker.web_site.clone(),
        company: speaker.company.clone(),
        company_url: speaker.company_url.clone(),
        job_title: speaker.job_title.clone(),
        twitter: speaker.twitter.clone(),
        git_hub: speaker.git_hub.clone(),
    }
}

pub fn speaker_from_model(model: &SpeakerModel) -> Speaker {
    Speaker {
        speaker_id: model.speaker_id,
        name: model.name.clone(),
        bio: model.bio.clone(),
        web_site: model.web_site.clone(),
        company: model.company.clone(),
        company_url: model.company_url.clone(),
        job_title: model.job_title.clone(),
        twitter: model.twitter.clone(),
        git_hub: model.git_hub.clone(),
    }
}
