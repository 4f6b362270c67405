use chrono::Utc;

use fieldsales_core::domain::event::EventId;
use fieldsales_core::domain::summary::EventSummary;

use super::{EventSummaryRepository, RepositoryError};
use crate::DbPool;

/// Write-side store for computed snapshots. Reports always recompute from
/// daily records; these rows exist for external readers.
pub struct SqlEventSummaryRepository {
    pool: DbPool,
}

impl SqlEventSummaryRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl EventSummaryRepository for SqlEventSummaryRepository {
    async fn save(&self, summary: &EventSummary) -> Result<(), RepositoryError> {
        let summary_json = serde_json::to_string(summary)
            .map_err(|error| RepositoryError::Decode(error.to_string()))?;
        let target_headline = i64::try_from(summary.target_headline)
            .map_err(|_| RepositoryError::Decode("target headline out of range".to_string()))?;
        let actual_headline = i64::try_from(summary.actual_headline)
            .map_err(|_| RepositoryError::Decode("actual headline out of range".to_string()))?;

        sqlx::query(
            "INSERT INTO event_summary (event_id, include_cell_up, target_headline,
                                        actual_headline, summary_json, computed_at)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT(event_id) DO UPDATE SET
                 include_cell_up = excluded.include_cell_up,
                 target_headline = excluded.target_headline,
                 actual_headline = excluded.actual_headline,
                 summary_json = excluded.summary_json,
                 computed_at = excluded.computed_at",
        )
        .bind(&summary.event_id.0)
        .bind(summary.include_cell_up)
        .bind(target_headline)
        .bind(actual_headline)
        .bind(summary_json)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        tracing::debug!(
            event_name = "db.event_summary.saved",
            event_id = %summary.event_id,
            actual_headline = summary.actual_headline,
            "event summary snapshot stored"
        );
        Ok(())
    }

    async fn find(&self, event_id: &EventId) -> Result<Option<EventSummary>, RepositoryError> {
        let summary_json: Option<String> =
            sqlx::query_scalar("SELECT summary_json FROM event_summary WHERE event_id = ?")
                .bind(&event_id.0)
                .fetch_optional(&self.pool)
                .await?;

        summary_json
            .map(|raw| {
                serde_json::from_str::<EventSummary>(&raw)
                    .map_err(|error| RepositoryError::Decode(error.to_string()))
            })
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use fieldsales_core::domain::event::{EventId, SalesEvent, TargetRow};
    use fieldsales_core::domain::record::{DailyRecord, Narrative, SalesCounters};
    use fieldsales_core::metrics::CategoryTotals;
    use fieldsales_core::rollup::rollup_event;

    use super::SqlEventSummaryRepository;
    use crate::repositories::{EventRepository, EventSummaryRepository, SqlEventRepository};
    use crate::{connect_with_settings, migrations};

    #[tokio::test]
    async fn snapshot_is_stored_and_overwritten() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");

        let target = TargetRow {
            event_id: EventId("EV-1".to_string()),
            venue: "Aeon Mall Makuhari".to_string(),
            team: "Chiba".to_string(),
            event_date: NaiveDate::from_ymd_opt(2024, 6, 1).expect("valid date"),
            targets: CategoryTotals { au_mnp: 2, ..Default::default() },
            narrative: Narrative::default(),
        };
        SqlEventRepository::new(pool.clone())
            .save(SalesEvent { target: target.clone(), include_cell_up: false })
            .await
            .expect("insert parent event");

        let records = vec![DailyRecord::new(
            "Tanaka",
            1,
            SalesCounters { au_mnp_sp1: 2, cell_up_sp1: 1, ..Default::default() },
        )];
        let repo = SqlEventSummaryRepository::new(pool);

        let without = rollup_event(&target, &records, false);
        repo.save(&without).await.expect("save");
        assert_eq!(repo.find(&target.event_id).await.expect("find"), Some(without));

        let with = rollup_event(&target, &records, true);
        repo.save(&with).await.expect("overwrite");
        let stored = repo.find(&target.event_id).await.expect("find").expect("stored");
        assert_eq!(stored.actual_headline, 3);
        assert!(stored.include_cell_up);

        assert_eq!(repo.find(&EventId("EV-404".to_string())).await.expect("find"), None);
    }
}
