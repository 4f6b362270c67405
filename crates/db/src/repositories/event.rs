use chrono::NaiveDate;
use sqlx::{sqlite::SqliteRow, QueryBuilder, Row, Sqlite, SqliteConnection};

use fieldsales_core::domain::event::{EventId, SalesEvent, TargetRow};
use fieldsales_core::domain::record::Narrative;
use fieldsales_core::metrics::CategoryTotals;

use super::{EventFilter, EventRepository, RepositoryError};
use crate::DbPool;

const EVENT_COLUMNS: &str = "id, venue, team, event_date, include_cell_up,
    target_au_mnp, target_uq_mnp, target_au_new, target_uq_new, target_cell_up,
    highlights, challenges, next_actions";

pub struct SqlEventRepository {
    pool: DbPool,
}

impl SqlEventRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl EventRepository for SqlEventRepository {
    async fn find_by_id(&self, id: &EventId) -> Result<Option<SalesEvent>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {EVENT_COLUMNS} FROM sales_event WHERE id = ?"))
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(event_from_row).transpose()
    }

    async fn list(&self, filter: &EventFilter) -> Result<Vec<SalesEvent>, RepositoryError> {
        let mut query: QueryBuilder<'_, Sqlite> =
            QueryBuilder::new(format!("SELECT {EVENT_COLUMNS} FROM sales_event WHERE 1 = 1"));
        if let Some(from) = filter.from {
            query.push(" AND event_date >= ").push_bind(date_to_text(from));
        }
        if let Some(to) = filter.to {
            query.push(" AND event_date <= ").push_bind(date_to_text(to));
        }
        if let Some(venue) = &filter.venue {
            query.push(" AND venue = ").push_bind(venue.clone());
        }
        if let Some(team) = &filter.team {
            query.push(" AND team = ").push_bind(team.clone());
        }
        query.push(" ORDER BY event_date ASC, id ASC");

        let rows = query.build().fetch_all(&self.pool).await?;
        rows.iter().map(event_from_row).collect()
    }

    async fn save(&self, event: SalesEvent) -> Result<(), RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        upsert_event(&mut *conn, &event).await
    }

    async fn set_include_cell_up(
        &self,
        id: &EventId,
        include_cell_up: bool,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE sales_event
             SET include_cell_up = ?, updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
             WHERE id = ?",
        )
        .bind(include_cell_up)
        .bind(&id.0)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound { entity: "event", id: id.0.clone() });
        }
        tracing::info!(
            event_name = "db.event.cell_up_toggled",
            event_id = %id,
            include_cell_up,
            "headline inclusion flag updated"
        );
        Ok(())
    }
}

/// Inserts or updates one event row on `conn`, which may be an open
/// transaction.
pub(crate) async fn upsert_event(
    conn: &mut SqliteConnection,
    event: &SalesEvent,
) -> Result<(), RepositoryError> {
    let target = &event.target;
    sqlx::query(
        "INSERT INTO sales_event (id, venue, team, event_date, include_cell_up,
                                  target_au_mnp, target_uq_mnp, target_au_new,
                                  target_uq_new, target_cell_up,
                                  highlights, challenges, next_actions)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
         ON CONFLICT(id) DO UPDATE SET
             venue = excluded.venue,
             team = excluded.team,
             event_date = excluded.event_date,
             include_cell_up = excluded.include_cell_up,
             target_au_mnp = excluded.target_au_mnp,
             target_uq_mnp = excluded.target_uq_mnp,
             target_au_new = excluded.target_au_new,
             target_uq_new = excluded.target_uq_new,
             target_cell_up = excluded.target_cell_up,
             highlights = excluded.highlights,
             challenges = excluded.challenges,
             next_actions = excluded.next_actions,
             updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
    )
    .bind(&target.event_id.0)
    .bind(&target.venue)
    .bind(&target.team)
    .bind(date_to_text(target.event_date))
    .bind(event.include_cell_up)
    .bind(count_to_db(target.targets.au_mnp)?)
    .bind(count_to_db(target.targets.uq_mnp)?)
    .bind(count_to_db(target.targets.au_new)?)
    .bind(count_to_db(target.targets.uq_new)?)
    .bind(count_to_db(target.targets.cell_up)?)
    .bind(&target.narrative.highlights)
    .bind(&target.narrative.challenges)
    .bind(&target.narrative.next_actions)
    .execute(&mut *conn)
    .await?;

    tracing::debug!(event_name = "db.event.saved", event_id = %target.event_id, "event saved");
    Ok(())
}

fn event_from_row(row: &SqliteRow) -> Result<SalesEvent, RepositoryError> {
    let event_date: String = row.try_get("event_date")?;
    let event_date = NaiveDate::parse_from_str(&event_date, "%Y-%m-%d").map_err(|error| {
        RepositoryError::Decode(format!("invalid event_date `{event_date}`: {error}"))
    })?;

    Ok(SalesEvent {
        target: TargetRow {
            event_id: EventId(row.try_get("id")?),
            venue: row.try_get("venue")?,
            team: row.try_get("team")?,
            event_date,
            targets: CategoryTotals {
                au_mnp: count_from_db(row.try_get("target_au_mnp")?),
                uq_mnp: count_from_db(row.try_get("target_uq_mnp")?),
                au_new: count_from_db(row.try_get("target_au_new")?),
                uq_new: count_from_db(row.try_get("target_uq_new")?),
                cell_up: count_from_db(row.try_get("target_cell_up")?),
            },
            narrative: Narrative {
                highlights: row.try_get("highlights")?,
                challenges: row.try_get("challenges")?,
                next_actions: row.try_get("next_actions")?,
            },
        },
        include_cell_up: row.try_get("include_cell_up")?,
    })
}

fn date_to_text(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn count_from_db(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

fn count_to_db(value: u64) -> Result<i64, RepositoryError> {
    i64::try_from(value).map_err(|_| {
        RepositoryError::InvalidInput(format!("target {value} does not fit in SQLite"))
    })
}
