use crate::domain::event::TargetRow;
use crate::domain::record::{DailyRecord, SalesCounters};
use crate::domain::summary::EventSummary;
use crate::metrics::{self, CategoryTotals};

/// Builds the event-level summary from the target row and the full record set.
///
/// Actuals are summed straight from `records`, never from staff summaries.
/// `include_cell_up` applies to both the target and the actual headline.
/// Narrative fields take the first non-empty value, reading the target row
/// before any daily record.
pub fn rollup_event(
    target: &TargetRow,
    records: &[DailyRecord],
    include_cell_up: bool,
) -> EventSummary {
    let mut actual_counters = SalesCounters::default();
    let mut narrative = target.narrative.clone();
    for record in records {
        actual_counters.accumulate(&record.counters);
        narrative.fill_from(&record.notes);
    }

    let actual = CategoryTotals::from_counters(&actual_counters);
    let summary = EventSummary {
        event_id: target.event_id.clone(),
        venue: target.venue.clone(),
        team: target.team.clone(),
        event_date: target.event_date,
        include_cell_up,
        target: target.targets,
        target_headline: target.targets.headline(include_cell_up),
        actual,
        actual_headline: metrics::headline_total(&actual_counters, include_cell_up),
        ltv_total: metrics::ltv_total(&actual_counters),
        actual_counters,
        record_count: records.len(),
        narrative,
    };

    tracing::debug!(
        event_name = "rollup.event.completed",
        event_id = %summary.event_id,
        include_cell_up,
        record_count = summary.record_count,
        actual_headline = summary.actual_headline,
        "event rollup completed"
    );
    summary
}
