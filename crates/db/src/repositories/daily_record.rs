use sqlx::{sqlite::SqliteRow, Row, SqliteConnection};
use uuid::Uuid;

use fieldsales_core::domain::event::EventId;
use fieldsales_core::domain::record::{DailyRecord, Narrative, SalesCounters};

use super::{DailyRecordRepository, RepositoryError};
use crate::DbPool;

pub struct SqlDailyRecordRepository {
    pool: DbPool,
}

impl SqlDailyRecordRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl DailyRecordRepository for SqlDailyRecordRepository {
    async fn list_for_event(
        &self,
        event_id: &EventId,
    ) -> Result<Vec<DailyRecord>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT staff_name, day_index, counters_json, notes_json
             FROM daily_record
             WHERE event_id = ?
             ORDER BY position ASC",
        )
        .bind(&event_id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(record_from_row).collect()
    }

    async fn replace_for_event(
        &self,
        event_id: &EventId,
        records: &[DailyRecord],
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;
        write_records(&mut *tx, event_id, records).await?;
        tx.commit().await?;
        tracing::info!(
            event_name = "db.daily_records.replaced",
            event_id = %event_id,
            record_count = records.len(),
            "daily record set replaced"
        );
        Ok(())
    }
}

/// Deletes the event's rows and inserts `records` in entry order on `conn`.
/// Callers own the transaction; an error leaves it for the caller to roll back.
pub(crate) async fn write_records(
    conn: &mut SqliteConnection,
    event_id: &EventId,
    records: &[DailyRecord],
) -> Result<(), RepositoryError> {
    let exists: i64 =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM sales_event WHERE id = ?)")
            .bind(&event_id.0)
            .fetch_one(&mut *conn)
            .await?;
    if exists == 0 {
        return Err(RepositoryError::NotFound { entity: "event", id: event_id.0.clone() });
    }

    sqlx::query("DELETE FROM daily_record WHERE event_id = ?")
        .bind(&event_id.0)
        .execute(&mut *conn)
        .await?;

    for (position, record) in records.iter().enumerate() {
        if record.day == 0 {
            return Err(RepositoryError::InvalidInput(format!(
                "daily record for `{}` has day index 0; day indexes start at 1",
                record.staff_name
            )));
        }
        let counters_json = serde_json::to_string(&record.counters)
            .map_err(|error| RepositoryError::Decode(error.to_string()))?;
        let notes_json = serde_json::to_string(&record.notes)
            .map_err(|error| RepositoryError::Decode(error.to_string()))?;
        let position = i64::try_from(position + 1)
            .map_err(|_| RepositoryError::Decode("too many daily records".to_string()))?;

        sqlx::query(
            "INSERT INTO daily_record (id, event_id, position, staff_name, day_index,
                                       counters_json, notes_json)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&event_id.0)
        .bind(position)
        .bind(&record.staff_name)
        .bind(i64::from(record.day))
        .bind(counters_json)
        .bind(notes_json)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

fn record_from_row(row: &SqliteRow) -> Result<DailyRecord, RepositoryError> {
    let staff_name: String = row.try_get("staff_name")?;
    let day_index: i64 = row.try_get("day_index")?;
    let day = u32::try_from(day_index)
        .ok()
        .filter(|day| *day > 0)
        .ok_or_else(|| RepositoryError::Decode(format!("invalid day_index {day_index}")))?;
    let counters_json: String = row.try_get("counters_json")?;
    let notes_json: String = row.try_get("notes_json")?;

    let notes = serde_json::from_str::<Narrative>(&notes_json).unwrap_or_else(|error| {
        tracing::warn!(
            event_name = "db.daily_records.notes_discarded",
            staff_name = %staff_name,
            error = %error,
            "unreadable notes_json treated as empty"
        );
        Narrative::default()
    });

    Ok(DailyRecord::new(staff_name, day, SalesCounters::from_json_lenient(&counters_json))
        .with_notes(notes))
}
