//! SQLite-backed repository

use async_trait::async_trait;
use chrono::NaiveDate;
use codecamp_common::{Camp, Location, Speaker, Talk};
use sqlx::sqlite::{SqliteQueryResult, SqliteRow};
use sqlx::{Row, SqliteConnection, SqlitePool};
use tracing::{debug, warn};

use super::{
    CampRepository, Entity, EntryState, RepositoryError, RepositoryResult, StageToken, UnitOfWork,
};

const CAMP_COLUMNS: &str = "camp_id, moniker, name, event_date, length, venue_name, \
     address1, address2, address3, city_town, state_province, postal_code, country";

const TALK_SELECT: &str = r#"
    SELECT t.talk_id, t.camp_id, t.title, t.abstract, t.level, t.speaker_id,
           s.name AS speaker_name, s.bio, s.web_site, s.company, s.company_url,
           s.job_title, s.twitter, s.git_hub
    FROM talks t
    JOIN camps c ON c.camp_id = t.camp_id
    LEFT JOIN speakers s ON s.speaker_id = t.speaker_id
"#;

/// Repository over a shared SQLite pool with a private unit of work
pub struct SqliteCampRepository {
    pool: SqlitePool,
    unit: UnitOfWork,
}

impl SqliteCampRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            unit: UnitOfWork::new(),
        }
    }

    async fn load_talks(&self, camps: &mut [Camp]) -> RepositoryResult<()> {
        let sql = format!("{} WHERE t.camp_id = ? ORDER BY t.title", TALK_SELECT);

        for camp in camps.iter_mut() {
            let rows = sqlx::query(&sql)
                .bind(camp.camp_id)
                .fetch_all(&self.pool)
                .await?;

            camp.talks = rows
                .iter()
                .map(|row| talk_from_row(row, true))
                .collect::<Result<_, _>>()?;
        }

        Ok(())
    }

    /// Run every pending change in one transaction
    ///
    /// Returns total rows affected and the keys generated by inserts. Keys
    /// are only handed back once the transaction has committed.
    async fn apply_pending(&self) -> RepositoryResult<(u64, Vec<(StageToken, i64)>)> {
        let mut tx = self.pool.begin().await?;
        let mut rows_affected = 0;
        let mut keys = Vec::new();

        for (token, entry) in self.unit.pending() {
            let result = match (entry.state, &entry.entity) {
                (EntryState::Added, Entity::Camp(camp)) => insert_camp(&mut tx, camp).await?,
                (EntryState::Added, Entity::Talk(talk)) => insert_talk(&mut tx, talk).await?,
                (EntryState::Added, Entity::Speaker(speaker)) => {
                    insert_speaker(&mut tx, speaker).await?
                }
                (EntryState::Modified, Entity::Camp(camp)) => update_camp(&mut tx, camp).await?,
                (EntryState::Modified, Entity::Talk(talk)) => update_talk(&mut tx, talk).await?,
                (EntryState::Modified, Entity::Speaker(speaker)) => {
                    update_speaker(&mut tx, speaker).await?
                }
                (EntryState::Deleted, entity) => delete_entity(&mut tx, entity).await?,
                (EntryState::Unchanged | EntryState::Detached, _) => continue,
            };

            if entry.state == EntryState::Added {
                keys.push((token, result.last_insert_rowid()));
            }
            rows_affected += result.rows_affected();
        }

        tx.commit().await?;

        Ok((rows_affected, keys))
    }
}

#[async_trait]
impl CampRepository for SqliteCampRepository {
    async fn get_all_camps(&self, include_talks: bool) -> RepositoryResult<Vec<Camp>> {
        debug!("Getting all camps (include_talks={})", include_talks);

        let sql = format!("SELECT {} FROM camps ORDER BY event_date DESC", CAMP_COLUMNS);
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        let mut camps = rows
            .iter()
            .map(camp_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        if include_talks {
            self.load_talks(&mut camps).await?;
        }

        Ok(camps)
    }

    async fn get_camp(&self, moniker: &str) -> RepositoryResult<Option<Camp>> {
        debug!("Getting camp {}", moniker);

        let sql = format!("SELECT {} FROM camps WHERE moniker = ?", CAMP_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(moniker)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(camp_from_row).transpose()?)
    }

    async fn get_camps_by_event_date(
        &self,
        date: NaiveDate,
        include_talks: bool,
    ) -> RepositoryResult<Vec<Camp>> {
        debug!("Getting camps on {} (include_talks={})", date, include_talks);

        let sql = format!(
            "SELECT {} FROM camps WHERE date(event_date) = ? ORDER BY event_date DESC",
            CAMP_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(date.format("%Y-%m-%d").to_string())
            .fetch_all(&self.pool)
            .await?;

        let mut camps = rows
            .iter()
            .map(camp_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        if include_talks {
            self.load_talks(&mut camps).await?;
        }

        Ok(camps)
    }

    async fn get_talks_for_camp(
        &self,
        moniker: &str,
        include_speakers: bool,
    ) -> RepositoryResult<Vec<Talk>> {
        debug!("Getting talks for camp {}", moniker);

        let sql = format!("{} WHERE c.moniker = ? ORDER BY t.title", TALK_SELECT);
        let rows = sqlx::query(&sql)
            .bind(moniker)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(|row| talk_from_row(row, include_speakers))
            .collect::<Result<_, _>>()?)
    }

    async fn get_talk(
        &self,
        moniker: &str,
        talk_id: i64,
        include_speaker: bool,
    ) -> RepositoryResult<Option<Talk>> {
        debug!("Getting talk {} for camp {}", talk_id, moniker);

        let sql = format!("{} WHERE c.moniker = ? AND t.talk_id = ?", TALK_SELECT);
        let row = sqlx::query(&sql)
            .bind(moniker)
            .bind(talk_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row
            .as_ref()
            .map(|row| talk_from_row(row, include_speaker))
            .transpose()?)
    }

    async fn get_speaker(&self, speaker_id: i64) -> RepositoryResult<Option<Speaker>> {
        debug!("Getting speaker {}", speaker_id);

        let row = sqlx::query(
            r#"
            SELECT speaker_id, name, bio, web_site, company, company_url,
                   job_title, twitter, git_hub
            FROM speakers
            WHERE speaker_id = ?
            "#,
        )
        .bind(speaker_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(speaker_from_row).transpose()?)
    }

    async fn ping(&self) -> RepositoryResult<()> {
        sqlx::query_scalar::<_, i64>("SELECT 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(())
    }

    fn add(&mut self, entity: Entity) -> StageToken {
        self.unit.stage(EntryState::Added, entity)
    }

    fn update(&mut self, entity: Entity) -> StageToken {
        self.unit.stage(EntryState::Modified, entity)
    }

    fn delete(&mut self, entity: Entity) -> StageToken {
        self.unit.stage(EntryState::Deleted, entity)
    }

    fn entry(&self, token: StageToken) -> Option<&Entity> {
        self.unit.entry(token)
    }

    async fn save_changes(&mut self) -> RepositoryResult<bool> {
        if !self.unit.has_pending() {
            debug!("save_changes called with nothing staged");
            return Ok(false);
        }

        match self.apply_pending().await {
            Ok((rows_affected, keys)) => {
                for (token, key) in keys {
                    self.unit.assign_key(token, key);
                }
                self.unit.accept_all();
                debug!("Committed changes ({} rows affected)", rows_affected);
                Ok(rows_affected > 0)
            }
            Err(RepositoryError::Database(e)) if is_recoverable_conflict(&e) => {
                warn!("Commit rolled back on write conflict: {}", e);
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }
}

/// SQLITE_BUSY / SQLITE_LOCKED and their extended codes
fn is_recoverable_conflict(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => matches!(
            db_err.code().as_deref(),
            Some("5") | Some("6") | Some("261") | Some("262") | Some("517")
        ),
        _ => false,
    }
}

fn camp_from_row(row: &SqliteRow) -> Result<Camp, sqlx::Error> {
    Ok(Camp {
        camp_id: row.try_get("camp_id")?,
        moniker: row.try_get("moniker")?,
        name: row.try_get("name")?,
        event_date: row.try_get("event_date")?,
        length: row.try_get("length")?,
        location: Location {
            venue_name: row.try_get("venue_name")?,
            address1: row.try_get("address1")?,
            address2: row.try_get("address2")?,
            address3: row.try_get("address3")?,
            city_town: row.try_get("city_town")?,
            state_province: row.try_get("state_province")?,
            postal_code: row.try_get("postal_code")?,
            country: row.try_get("country")?,
        },
        talks: Vec::new(),
    })
}

/// Build a talk from a `TALK_SELECT` row
fn talk_from_row(row: &SqliteRow, include_speaker: bool) -> Result<Talk, sqlx::Error> {
    let speaker_id: i64 = row.try_get("speaker_id")?;

    let speaker = if include_speaker {
        Some(Speaker {
            speaker_id,
            name: row.try_get("speaker_name")?,
            bio: row.try_get("bio")?,
            web_site: row.try_get("web_site")?,
            company: row.try_get("company")?,
            company_url: row.try_get("company_url")?,
            job_title: row.try_get("job_title")?,
            twitter: row.try_get("twitter")?,
            git_hub: row.try_get("git_hub")?,
        })
    } else {
        None
    };

    Ok(Talk {
        talk_id: row.try_get("talk_id")?,
        camp_id: Some(row.try_get("camp_id")?),
        title: row.try_get("title")?,
        abstract_text: row.try_get("abstract")?,
        level: row.try_get("level")?,
        speaker_id: Some(speaker_id),
        speaker,
    })
}

fn speaker_from_row(row: &SqliteRow) -> Result<Speaker, sqlx::Error> {
    Ok(Speaker {
        speaker_id: row.try_get("speaker_id")?,
        name: row.try_get("name")?,
        bio: row.try_get("bio")?,
        web_site: row.try_get("web_site")?,
        company: row.try_get("company")?,
        company_url: row.try_get("company_url")?,
        job_title: row.try_get("job_title")?,
        twitter: row.try_get("twitter")?,
        git_hub: row.try_get("git_hub")?,
    })
}

/// A talk can only be written with both its camp and speaker set
fn talk_associations(talk: &Talk) -> RepositoryResult<(i64, i64)> {
    match (talk.camp_id, talk.speaker_id) {
        (Some(camp_id), Some(speaker_id)) => Ok((camp_id, speaker_id)),
        _ => Err(RepositoryError::InvalidEntity(
            "a talk requires both a camp and a speaker".to_string(),
        )),
    }
}

async fn insert_camp(
    conn: &mut SqliteConnection,
    camp: &Camp,
) -> RepositoryResult<SqliteQueryResult> {
    let location = &camp.location;
    let result = sqlx::query(
        r#"
        INSERT INTO camps (
            moniker, name, event_date, length, venue_name, address1, address2,
            address3, city_town, state_province, postal_code, country
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&camp.moniker)
    .bind(&camp.name)
    .bind(camp.event_date)
    .bind(camp.length)
    .bind(&location.venue_name)
    .bind(&location.address1)
    .bind(&location.address2)
    .bind(&location.address3)
    .bind(&location.city_town)
    .bind(&location.state_province)
    .bind(&location.postal_code)
    .bind(&location.country)
    .execute(conn)
    .await?;

    Ok(result)
}

async fn update_camp(
    conn: &mut SqliteConnection,
    camp: &Camp,
) -> RepositoryResult<SqliteQueryResult> {
    let location = &camp.location;
    let result = sqlx::query(
        r#"
        UPDATE camps SET
            moniker = ?, name = ?, event_date = ?, length = ?, venue_name = ?,
            address1 = ?, address2 = ?, address3 = ?, city_town = ?,
            state_province = ?, postal_code = ?, country = ?
        WHERE camp_id = ?
        "#,
    )
    .bind(&camp.moniker)
    .bind(&camp.name)
    .bind(camp.event_date)
    .bind(camp.length)
    .bind(&location.venue_name)
    .bind(&location.address1)
    .bind(&location.address2)
    .bind(&location.address3)
    .bind(&location.city_town)
    .bind(&location.state_province)
    .bind(&location.postal_code)
    .bind(&location.country)
    .bind(camp.camp_id)
    .execute(conn)
    .await?;

    Ok(result)
}

async fn insert_talk(
    conn: &mut SqliteConnection,
    talk: &Talk,
) -> RepositoryResult<SqliteQueryResult> {
    let (camp_id, speaker_id) = talk_associations(talk)?;
    let result = sqlx::query(
        "INSERT INTO talks (camp_id, speaker_id, title, abstract, level) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(camp_id)
    .bind(speaker_id)
    .bind(&talk.title)
    .bind(&talk.abstract_text)
    .bind(talk.level)
    .execute(conn)
    .await?;

    Ok(result)
}

async fn update_talk(
    conn: &mut SqliteConnection,
    talk: &Talk,
) -> RepositoryResult<SqliteQueryResult> {
    let (_, speaker_id) = talk_associations(talk)?;
    let result = sqlx::query(
        "UPDATE talks SET speaker_id = ?, title = ?, abstract = ?, level = ? WHERE talk_id = ?",
    )
    .bind(speaker_id)
    .bind(&talk.title)
    .bind(&talk.abstract_text)
    .bind(talk.level)
    .bind(talk.talk_id)
    .execute(conn)
    .await?;

    Ok(result)
}

async fn insert_speaker(
    conn: &mut SqliteConnection,
    speaker: &Speaker,
) -> RepositoryResult<SqliteQueryResult> {
    let result = sqlx::query(
        r#"
        INSERT INTO speakers (
            name, bio, web_site, company, company_url, job_title, twitter, git_hub
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&speaker.name)
    .bind(&speaker.bio)
    .bind(&speaker.web_site)
    .bind(&speaker.company)
    .bind(&speaker.company_url)
    .bind(&speaker.job_title)
    .bind(&speaker.twitter)
    .bind(&speaker.git_hub)
    .execute(conn)
    .await?;

    Ok(result)
}

async fn update_speaker(
    conn: &mut SqliteConnection,
    speaker: &Speaker,
) -> RepositoryResult<SqliteQueryResult> {
    let result = sqlx::query(
        r#"
        UPDATE speakers SET
            name = ?, bio = ?, web_site = ?, company = ?, company_url = ?,
            job_title = ?, twitter = ?, git_hub = ?
        WHERE speaker_id = ?
        "#,
    )
    .bind(&speaker.name)
    .bind(&speaker.bio)
    .bind(&speaker.web_site)
    .bind(&speaker.company)
    .bind(&speaker.company_url)
    .bind(&speaker.job_title)
    .bind(&speaker.twitter)
    .bind(&speaker.git_hub)
    .bind(speaker.speaker_id)
    .execute(conn)
    .await?;

    Ok(result)
}

async fn delete_entity(
    conn: &mut SqliteConnection,
    entity: &Entity,
) -> RepositoryResult<SqliteQueryResult> {
    let (sql, key) = match entity {
        Entity::Camp(camp) => ("DELETE FROM camps WHERE camp_id = ?", camp.camp_id),
        Entity::Talk(talk) => ("DELETE FROM talks WHERE talk_id = ?", talk.talk_id),
        Entity::Speaker(speaker) => (
            "DELETE FROM speakers WHERE speaker_id = ?",
            speaker.speaker_id,
        ),
    };

    Ok(sqlx::query(sql).bind(key).execute(conn).await?)
}
