use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use fieldsales_core::domain::event::{EventId, SalesEvent};
use fieldsales_core::domain::record::DailyRecord;
use fieldsales_core::domain::summary::EventSummary;
use fieldsales_core::errors::ApplicationError;

pub mod daily_record;
pub mod event;
pub mod import;
pub mod memory;
pub mod summary;

pub use daily_record::SqlDailyRecordRepository;
pub use event::SqlEventRepository;
pub use import::{import_events, EventBatch};
pub use memory::{
    InMemoryDailyRecordRepository, InMemoryEventRepository, InMemoryEventSummaryRepository,
};
pub use summary::SqlEventSummaryRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("{entity} `{id}` not found")]
    NotFound { entity: &'static str, id: String },
}

impl From<RepositoryError> for ApplicationError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::NotFound { entity, id } => Self::NotFound { entity, id },
            RepositoryError::InvalidInput(message) => Self::InvalidInput(message),
            other => Self::Persistence(other.to_string()),
        }
    }
}

/// Narrows an event listing. Date bounds are inclusive; `None` leaves that
/// dimension open.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EventFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub venue: Option<String>,
    pub team: Option<String>,
}

impl EventFilter {
    pub fn matches(&self, event: &SalesEvent) -> bool {
        let date = event.target.event_date;
        self.from.map_or(true, |from| date >= from)
            && self.to.map_or(true, |to| date <= to)
            && self.venue.as_deref().map_or(true, |venue| event.target.venue == venue)
            && self.team.as_deref().map_or(true, |team| event.target.team == team)
    }
}

#[async_trait]
pub trait EventRepository: Send + Sync {
    async fn find_by_id(&self, id: &EventId) -> Result<Option<SalesEvent>, RepositoryError>;

    /// Events matching `filter`, ordered by date then id.
    async fn list(&self, filter: &EventFilter) -> Result<Vec<SalesEvent>, RepositoryError>;

    async fn save(&self, event: SalesEvent) -> Result<(), RepositoryError>;

    async fn set_include_cell_up(
        &self,
        id: &EventId,
        include_cell_up: bool,
    ) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait DailyRecordRepository: Send + Sync {
    /// All rows of one event in entry order.
    async fn list_for_event(&self, event_id: &EventId)
        -> Result<Vec<DailyRecord>, RepositoryError>;

    /// Swaps the event's full record set for `records` in one step. Readers
    /// never observe a mix of old and new rows.
    async fn replace_for_event(
        &self,
        event_id: &EventId,
        records: &[DailyRecord],
    ) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait EventSummaryRepository: Send + Sync {
    async fn save(&self, summary: &EventSummary) -> Result<(), RepositoryError>;
    async fn find(&self, event_id: &EventId) -> Result<Option<EventSummary>, RepositoryError>;
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use fieldsales_core::domain::event::{EventId, SalesEvent, TargetRow};
    use fieldsales_core::domain::record::Narrative;
    use fieldsales_core::metrics::CategoryTotals;

    use super::EventFilter;

    fn event(venue: &str, team: &str, date: (i32, u32, u32)) -> SalesEvent {
        SalesEvent {
            target: TargetRow {
                event_id: EventId("EV-F".to_string()),
                venue: venue.to_string(),
                team: team.to_string(),
                event_date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).expect("valid date"),
                targets: CategoryTotals::default(),
                narrative: Narrative::default(),
            },
            include_cell_up: false,
        }
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(EventFilter::default().matches(&event("A", "East", (2024, 1, 1))));
    }

    #[test]
    fn date_bounds_are_inclusive() {
        let filter = EventFilter {
            from: NaiveDate::from_ymd_opt(2024, 6, 1),
            to: NaiveDate::from_ymd_opt(2024, 6, 30),
            ..EventFilter::default()
        };

        assert!(filter.matches(&event("A", "East", (2024, 6, 1))));
        assert!(filter.matches(&event("A", "East", (2024, 6, 30))));
        assert!(!filter.matches(&event("A", "East", (2024, 7, 1))));
    }

    #[test]
    fn venue_and_team_match_exactly() {
        let filter = EventFilter {
            venue: Some("Aeon Mall Makuhari".to_string()),
            team: Some("Chiba".to_string()),
            ..EventFilter::default()
        };

        assert!(filter.matches(&event("Aeon Mall Makuhari", "Chiba", (2024, 6, 1))));
        assert!(!filter.matches(&event("Aeon Mall Makuhari", "chiba", (2024, 6, 1))));
    }

    #[test]
    fn repository_errors_map_onto_application_errors() {
        use fieldsales_core::errors::ApplicationError;

        use super::RepositoryError;

        let missing: ApplicationError =
            RepositoryError::NotFound { entity: "event", id: "EV-9".to_string() }.into();
        assert_eq!(missing, ApplicationError::NotFound { entity: "event", id: "EV-9".to_string() });

        let decode: ApplicationError = RepositoryError::Decode("bad date".to_string()).into();
        assert!(matches!(decode, ApplicationError::Persistence(message) if message.contains("bad date")));

        let invalid: ApplicationError =
            RepositoryError::InvalidInput("day index 0".to_string()).into();
        assert_eq!(invalid, ApplicationError::InvalidInput("day index 0".to_string()));
    }
}
