use sqlx::SqliteConnection;

use fieldsales_core::domain::event::SalesEvent;
use fieldsales_core::domain::record::DailyRecord;

use super::daily_record::write_records;
use super::event::upsert_event;
use super::RepositoryError;
use crate::DbPool;

/// One event and the complete daily record set that replaces its rows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventBatch {
    pub event: SalesEvent,
    pub records: Vec<DailyRecord>,
}

/// Upserts every event and replaces its rows inside one transaction. Either
/// the whole batch is stored or nothing is. Returns the number of daily
/// records written.
pub async fn import_events(pool: &DbPool, batch: &[EventBatch]) -> Result<usize, RepositoryError> {
    let mut tx = pool.begin().await?;
    let mut record_count = 0usize;

    for item in batch {
        let event_id = item.event.id();
        if let Err(error) = store_one(&mut *tx, item).await {
            tracing::warn!(
                event_name = "db.import.rolled_back",
                event_id = %event_id,
                error = %error,
                "import batch rolled back"
            );
            return Err(error);
        }
        record_count += item.records.len();
    }

    tx.commit().await?;
    tracing::info!(
        event_name = "db.import.committed",
        event_count = batch.len(),
        record_count,
        "import batch committed"
    );
    Ok(record_count)
}

async fn store_one(conn: &mut SqliteConnection, item: &EventBatch) -> Result<(), RepositoryError> {
    upsert_event(&mut *conn, &item.event).await?;
    write_records(&mut *conn, item.event.id(), &item.records).await
}
