//! Sample data for an empty database
//!
//! Everything goes through the repository contract, so the seeder exercises
//! the same staging and commit path as the HTTP handlers.

use chrono::NaiveDate;
use codecamp_common::{Camp, Location, Speaker, Talk};
use tracing::info;

use crate::repository::{CampRepository, Entity, RepositoryError, RepositoryResult, StageToken};

/// Moniker of the seeded camp
pub const SAMPLE_MONIKER: &str = "ATL2018";

/// Insert the sample camp, speakers and talks unless a camp already exists
///
/// Returns whether anything was inserted.
pub async fn seed_sample_data(repo: &mut dyn CampRepository) -> RepositoryResult<bool> {
    if !repo.get_all_camps(false).await?.is_empty() {
        info!("Database already has camps, skipping sample data");
        return Ok(false);
    }

    let first = repo.add(speaker("Shawn", "shawnwildermuth").into());
    let second = repo.add(speaker("Resa", "resawildermuth").into());
    save(repo, "speakers").await?;
    let shawn = committed(repo, first, Entity::as_speaker)?;
    let resa = committed(repo, second, Entity::as_speaker)?;

    let token = repo.add(sample_camp().into());
    save(repo, "camp").await?;
    let camp = committed(repo, token, Entity::as_camp)?;

    let talks = [
        (
            "Entity Framework From Scratch",
            "Working with Entity Framework from the ground up, starting with an empty project.",
            100,
            shawn,
        ),
        (
            "Writing Sample Data Made Easy",
            "Thinking of good sample data examples is tiring, this talk makes it painless.",
            200,
            resa,
        ),
    ];
    for (title, abstract_text, level, speaker) in talks {
        let mut talk = Talk {
            title: title.to_string(),
            abstract_text: abstract_text.to_string(),
            level,
            ..Default::default()
        };
        talk.attach_camp(&camp);
        talk.set_speaker(speaker);
        repo.add(talk.into());
    }
    save(repo, "talks").await?;

    info!("Seeded sample camp {}", SAMPLE_MONIKER);
    Ok(true)
}

fn speaker(first_name: &str, handle: &str) -> Speaker {
    Speaker {
        name: format!("{} Wildermuth", first_name),
        bio: Some(format!("{} is a speaker at the Atlanta Code Camp.", first_name)),
        web_site: Some("https://wildermuth.com".to_string()),
        company: Some("Wilder Minds LLC".to_string()),
        company_url: Some("https://wilderminds.com".to_string()),
        job_title: Some("Developer".to_string()),
        twitter: Some(handle.to_string()),
        git_hub: Some(handle.to_string()),
        ..Default::default()
    }
}

fn sample_camp() -> Camp {
    let event_date = NaiveDate::from_ymd_opt(2018, 10, 18)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .unwrap_or_default();

    Camp {
        moniker: SAMPLE_MONIKER.to_string(),
        name: "Atlanta Code Camp".to_string(),
        event_date,
        length: 1,
        location: Location {
            venue_name: Some("Atlanta Convention Center".to_string()),
            address1: Some("123 Main Street".to_string()),
            city_town: Some("Atlanta".to_string()),
            state_province: Some("GA".to_string()),
            postal_code: Some("12345".to_string()),
            country: Some("USA".to_string()),
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Commit one seeding step; a commit without effect leaves no keys to build on
async fn save(repo: &mut dyn CampRepository, step: &str) -> RepositoryResult<()> {
    if repo.save_changes().await? {
        Ok(())
    } else {
        Err(RepositoryError::InvalidEntity(format!(
            "sample data step '{}' was not saved",
            step
        )))
    }
}

/// Committed copy of a staged entity, with its assigned key
fn committed<T: Clone>(
    repo: &dyn CampRepository,
    token: StageToken,
    view: fn(&Entity) -> Option<&T>,
) -> RepositoryResult<T> {
    repo.entry(token)
        .and_then(view)
        .cloned()
        .ok_or_else(|| {
            RepositoryError::InvalidEntity("staged sample entity went missing".to_string())
        })
}
