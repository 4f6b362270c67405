use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::record::Narrative;
use crate::metrics::CategoryTotals;

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EventId(pub String);

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The event's own target/performance row: entered once per event, never
/// derived from daily records.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetRow {
    pub event_id: EventId,
    pub venue: String,
    pub team: String,
    pub event_date: NaiveDate,
    #[serde(default)]
    pub targets: CategoryTotals,
    #[serde(default)]
    pub narrative: Narrative,
}

impl TargetRow {
    /// Calendar month key in `YYYY-MM` form.
    pub fn month_key(&self) -> String {
        self.event_date.format("%Y-%m").to_string()
    }
}

/// A stored event: its target row plus the headline-inclusion toggle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesEvent {
    #[serde(flatten)]
    pub target: TargetRow,
    pub include_cell_up: bool,
}

impl SalesEvent {
    pub fn id(&self) -> &EventId {
        &self.target.event_id
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{EventId, SalesEvent, TargetRow};
    use crate::domain::record::Narrative;
    use crate::metrics::CategoryTotals;

    #[test]
    fn month_key_is_zero_padded() {
        let row = TargetRow {
            event_id: EventId("EV-1".to_string()),
            venue: "Aeon Makuhari".to_string(),
            team: "East".to_string(),
            event_date: NaiveDate::from_ymd_opt(2024, 3, 9).expect("valid date"),
            targets: CategoryTotals::default(),
            narrative: Narrative::default(),
        };

        assert_eq!(row.month_key(), "2024-03");
    }

    #[test]
    fn stored_event_json_flattens_target_row() {
        let event: SalesEvent = serde_json::from_str(
            r#"{
                "event_id": "EV-7",
                "venue": "Ito-Yokado Kawasaki",
                "team": "South",
                "event_date": "2024-05-18",
                "targets": {"au_mnp": 6, "cell_up": 2},
                "include_cell_up": true
            }"#,
        )
        .expect("decode event");

        assert_eq!(event.id(), &EventId("EV-7".to_string()));
        assert_eq!(event.target.targets.au_mnp, 6);
        assert_eq!(event.target.targets.uq_new, 0);
        assert!(event.include_cell_up);
        assert!(event.target.narrative.is_empty());
    }
}
