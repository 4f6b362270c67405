use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::event::EventId;
use crate::domain::record::{DailyRecord, Narrative, SalesCounters};
use crate::metrics::{self, Category, CategoryTotals, LtvProduct, Metric};

/// Everything one staff member sold during one event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffSummary {
    pub staff_name: String,
    pub totals: SalesCounters,
    pub categories: CategoryTotals,
    /// Contributing rows in input order, kept for drill-down only.
    pub days: Vec<DailyRecord>,
}

impl StaffSummary {
    pub fn headline(&self, include_cell_up: bool) -> u64 {
        metrics::headline_total(&self.totals, include_cell_up)
    }

    pub fn ltv_total(&self) -> u64 {
        metrics::ltv_total(&self.totals)
    }

    pub fn days_worked(&self) -> usize {
        let mut days: Vec<u32> = self.days.iter().map(|record| record.day).collect();
        days.sort_unstable();
        days.dedup();
        days.len()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSummary {
    pub event_id: EventId,
    pub venue: String,
    pub team: String,
    pub event_date: NaiveDate,
    pub include_cell_up: bool,
    pub target: CategoryTotals,
    pub target_headline: u64,
    pub actual: CategoryTotals,
    pub actual_headline: u64,
    pub actual_counters: SalesCounters,
    pub ltv_total: u64,
    pub record_count: usize,
    pub narrative: Narrative,
}

impl EventSummary {
    pub fn month_key(&self) -> String {
        self.event_date.format("%Y-%m").to_string()
    }

    /// Value of `metric` for this event. `Metric::Headline` honours the
    /// event's own inclusion flag.
    pub fn metric_value(&self, metric: Metric) -> u64 {
        match metric {
            Metric::Category(category) => self.actual.get(category),
            Metric::MnpTotal => self.actual.mnp_total(),
            Metric::NewLineTotal => self.actual.new_line_total(),
            Metric::Headline => self.actual_headline,
            Metric::LtvTotal => self.ltv_total,
            Metric::Ltv(product) => self.actual_counters.get(metrics::Counter::Ltv(product)),
        }
    }

    /// Target-versus-actual for every category and for the headline figure.
    pub fn category_progress(&self) -> Vec<CategoryProgress> {
        let mut rows: Vec<CategoryProgress> = Category::ALL
            .iter()
            .map(|category| {
                CategoryProgress::new(
                    category.as_str(),
                    self.target.get(*category),
                    self.actual.get(*category),
                )
            })
            .collect();
        rows.push(CategoryProgress::new("headline", self.target_headline, self.actual_headline));
        rows
    }

    pub fn ltv_breakdown(&self) -> Vec<(LtvProduct, u64)> {
        LtvProduct::ALL
            .iter()
            .map(|product| {
                (*product, self.actual_counters.get(metrics::Counter::Ltv(*product)))
            })
            .collect()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryProgress {
    pub key: String,
    pub target: u64,
    pub actual: u64,
    /// Rounded percent of target reached; 0 when no target was set.
    pub progress_pct: u32,
}

impl CategoryProgress {
    fn new(key: &str, target: u64, actual: u64) -> Self {
        Self {
            key: key.to_string(),
            target,
            actual,
            progress_pct: metrics::rounded_percent(actual, target),
        }
    }
}

/// Counters summed across all staff for a single day index.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayTotal {
    pub day: u32,
    pub counters: SalesCounters,
    pub headline: u64,
    pub staff_count: usize,
}

/// Venue, team or month rollup of one scalar.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupStat {
    pub key: String,
    pub total: u64,
    pub count: usize,
    pub average: Decimal,
}
