use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::domain::record::{DailyRecord, SalesCounters, StaffKey};
use crate::domain::summary::{DayTotal, StaffSummary};
use crate::metrics::{self, CategoryTotals};

/// Groups `records` by staff name and sums every counter per group.
///
/// Names are compared byte-for-byte, so `"Tanaka"` and `"tanaka "` are two
/// different people. Summaries come out in order of each name's first
/// appearance; member rows keep their input order.
pub fn rollup_staff(records: &[DailyRecord]) -> Vec<StaffSummary> {
    let mut index: HashMap<StaffKey<'_>, usize> = HashMap::new();
    let mut summaries: Vec<StaffSummary> = Vec::new();

    for record in records {
        let slot = *index.entry(record.staff_key()).or_insert_with(|| {
            summaries.push(StaffSummary {
                staff_name: record.staff_name.clone(),
                totals: SalesCounters::default(),
                categories: CategoryTotals::default(),
                days: Vec::new(),
            });
            summaries.len() - 1
        });

        let summary = &mut summaries[slot];
        summary.totals.accumulate(&record.counters);
        summary.days.push(record.clone());
    }

    for summary in &mut summaries {
        summary.categories = CategoryTotals::from_counters(&summary.totals);
    }

    tracing::debug!(
        event_name = "rollup.staff.completed",
        record_count = records.len(),
        staff_count = summaries.len(),
        "staff rollup completed"
    );
    summaries
}

/// Per-day totals across all staff, ascending by day index.
pub fn daily_trend(records: &[DailyRecord], include_cell_up: bool) -> Vec<DayTotal> {
    let mut by_day: BTreeMap<u32, (SalesCounters, BTreeSet<&str>)> = BTreeMap::new();
    for record in records {
        let (counters, staff) = by_day.entry(record.day).or_default();
        counters.accumulate(&record.counters);
        staff.insert(record.staff_name.as_str());
    }

    by_day
        .into_iter()
        .map(|(day, (counters, staff))| DayTotal {
            day,
            headline: metrics::headline_total(&counters, include_cell_up),
            staff_count: staff.len(),
            counters,
        })
        .collect()
}
