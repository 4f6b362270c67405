use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use fieldsales_core::domain::event::{EventId, SalesEvent};
use fieldsales_core::domain::record::DailyRecord;
use fieldsales_core::domain::summary::EventSummary;

use super::{
    DailyRecordRepository, EventFilter, EventRepository, EventSummaryRepository, RepositoryError,
};

#[derive(Default)]
pub struct InMemoryEventRepository {
    events: RwLock<HashMap<String, SalesEvent>>,
}

#[async_trait::async_trait]
impl EventRepository for InMemoryEventRepository {
    async fn find_by_id(&self, id: &EventId) -> Result<Option<SalesEvent>, RepositoryError> {
        let events = self.events.read().await;
        Ok(events.get(&id.0).cloned())
    }

    async fn list(&self, filter: &EventFilter) -> Result<Vec<SalesEvent>, RepositoryError> {
        let events = self.events.read().await;
        let mut matching: Vec<SalesEvent> =
            events.values().filter(|event| filter.matches(event)).cloned().collect();
        matching.sort_by(|left, right| {
            left.target
                .event_date
                .cmp(&right.target.event_date)
                .then_with(|| left.id().cmp(right.id()))
        });
        Ok(matching)
    }

    async fn save(&self, event: SalesEvent) -> Result<(), RepositoryError> {
        let mut events = self.events.write().await;
        events.insert(event.id().0.clone(), event);
        Ok(())
    }

    async fn set_include_cell_up(
        &self,
        id: &EventId,
        include_cell_up: bool,
    ) -> Result<(), RepositoryError> {
        let mut events = self.events.write().await;
        let event = events
            .get_mut(&id.0)
            .ok_or_else(|| RepositoryError::NotFound { entity: "event", id: id.0.clone() })?;
        event.include_cell_up = include_cell_up;
        Ok(())
    }
}

/// Record store bound to an event store, so writes see the same unknown-event
/// and day-index errors as the SQL repository.
pub struct InMemoryDailyRecordRepository {
    events: Arc<InMemoryEventRepository>,
    records: RwLock<HashMap<String, Vec<DailyRecord>>>,
}

impl InMemoryDailyRecordRepository {
    pub fn new(events: Arc<InMemoryEventRepository>) -> Self {
        Self { events, records: RwLock::default() }
    }
}

#[async_trait::async_trait]
impl DailyRecordRepository for InMemoryDailyRecordRepository {
    async fn list_for_event(
        &self,
        event_id: &EventId,
    ) -> Result<Vec<DailyRecord>, RepositoryError> {
        let records = self.records.read().await;
        Ok(records.get(&event_id.0).cloned().unwrap_or_default())
    }

    async fn replace_for_event(
        &self,
        event_id: &EventId,
        records: &[DailyRecord],
    ) -> Result<(), RepositoryError> {
        if !self.events.events.read().await.contains_key(&event_id.0) {
            return Err(RepositoryError::NotFound { entity: "event", id: event_id.0.clone() });
        }
        if let Some(record) = records.iter().find(|record| record.day == 0) {
            return Err(RepositoryError::InvalidInput(format!(
                "daily record for `{}` has day index 0; day indexes start at 1",
                record.staff_name
            )));
        }

        let mut stored = self.records.write().await;
        stored.insert(event_id.0.clone(), records.to_vec());
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryEventSummaryRepository {
    summaries: RwLock<HashMap<String, EventSummary>>,
}

#[async_trait::async_trait]
impl EventSummaryRepository for InMemoryEventSummaryRepository {
    async fn save(&self, summary: &EventSummary) -> Result<(), RepositoryError> {
        let mut summaries = self.summaries.write().await;
        summaries.insert(summary.event_id.0.clone(), summary.clone());
        Ok(())
    }

    async fn find(&self, event_id: &EventId) -> Result<Option<EventSummary>, RepositoryError> {
        let summaries = self.summaries.read().await;
        Ok(summaries.get(&event_id.0).cloned())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::NaiveDate;

    use fieldsales_core::domain::event::{EventId, SalesEvent, TargetRow};
    use fieldsales_core::domain::record::{DailyRecord, Narrative, SalesCounters};
    use fieldsales_core::metrics::CategoryTotals;
    use fieldsales_core::rollup::evaluate_event;

    use crate::repositories::{
        DailyRecordRepository, EventFilter, EventRepository, EventSummaryRepository,
        InMemoryDailyRecordRepository, InMemoryEventRepository, InMemoryEventSummaryRepository,
        RepositoryError,
    };

    fn event(id: &str, day: u32) -> SalesEvent {
        SalesEvent {
            target: TargetRow {
                event_id: EventId(id.to_string()),
                venue: "Ito-Yokado Kawasaki".to_string(),
                team: "Kanagawa".to_string(),
                event_date: NaiveDate::from_ymd_opt(2024, 7, day).expect("valid date"),
                targets: CategoryTotals { uq_mnp: 3, ..Default::default() },
                narrative: Narrative::default(),
            },
            include_cell_up: false,
        }
    }

    async fn current_headline(
        events: &InMemoryEventRepository,
        records: &InMemoryDailyRecordRepository,
        id: &EventId,
    ) -> u64 {
        let stored = events.find_by_id(id).await.expect("find").expect("event exists");
        let rows = records.list_for_event(id).await.expect("list");
        evaluate_event(&stored, &rows).summary.actual_headline
    }

    #[tokio::test]
    async fn in_memory_event_repo_round_trip_and_order() {
        let repo = InMemoryEventRepository::default();
        repo.save(event("EV-B", 20)).await.expect("save B");
        repo.save(event("EV-A", 6)).await.expect("save A");

        let found = repo.find_by_id(&EventId("EV-A".to_string())).await.expect("find");
        assert_eq!(found, Some(event("EV-A", 6)));

        let listed = repo.list(&EventFilter::default()).await.expect("list");
        let ids: Vec<&str> = listed.iter().map(|event| event.id().0.as_str()).collect();
        assert_eq!(ids, vec!["EV-A", "EV-B"]);
    }

    #[tokio::test]
    async fn in_memory_toggle_flips_flag_for_next_evaluation() {
        let events = Arc::new(InMemoryEventRepository::default());
        let records = InMemoryDailyRecordRepository::new(Arc::clone(&events));
        let id = EventId("EV-A".to_string());
        events.save(event("EV-A", 6)).await.expect("save");
        records
            .replace_for_event(
                &id,
                &[DailyRecord::new(
                    "Ito",
                    1,
                    SalesCounters { uq_mnp_sp1: 2, cell_up_sp2: 2, ..Default::default() },
                )],
            )
            .await
            .expect("replace");

        assert_eq!(current_headline(&events, &records, &id).await, 2);
        events.set_include_cell_up(&id, true).await.expect("toggle");
        assert_eq!(current_headline(&events, &records, &id).await, 4);

        let missing = events.set_include_cell_up(&EventId("EV-Z".to_string()), true).await;
        assert!(matches!(missing, Err(RepositoryError::NotFound { .. })));
    }

    #[tokio::test]
    async fn in_memory_summary_repo_round_trip() {
        let repo = InMemoryEventSummaryRepository::default();
        let performance = evaluate_event(&event("EV-A", 6), &[]);

        repo.save(&performance.summary).await.expect("save");
        let found = repo.find(&EventId("EV-A".to_string())).await.expect("find");

        assert_eq!(found, Some(performance.summary));
        assert!(InMemoryDailyRecordRepository::new(Arc::default())
            .list_for_event(&EventId("EV-A".to_string()))
            .await
            .expect("list")
            .is_empty());
    }

    #[tokio::test]
    async fn in_memory_replace_rejects_unknown_events_and_day_zero() {
        let events = Arc::new(InMemoryEventRepository::default());
        let records = InMemoryDailyRecordRepository::new(Arc::clone(&events));
        let id = EventId("EV-A".to_string());
        let original = vec![DailyRecord::new("Ito", 1, SalesCounters::default())];

        let missing = records.replace_for_event(&id, &original).await;
        assert!(matches!(missing, Err(RepositoryError::NotFound { .. })));

        events.save(event("EV-A", 6)).await.expect("save");
        records.replace_for_event(&id, &original).await.expect("replace");

        let broken = vec![
            DailyRecord::new("Kato", 2, SalesCounters::default()),
            DailyRecord::new("Kato", 0, SalesCounters::default()),
        ];
        let rejected = records.replace_for_event(&id, &broken).await;
        assert!(matches!(
            rejected,
            Err(RepositoryError::InvalidInput(ref message)) if message.contains("Kato")
        ));
        assert_eq!(records.list_for_event(&id).await.expect("list"), original);
    }
}
