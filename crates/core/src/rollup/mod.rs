//! Staff and event rollups.
//!
//! Both levels are recomputed from the raw daily records on every call and
//! share one inclusion flag per pass.

pub mod event;
pub mod staff;

use std::cmp::Reverse;

use serde::{Deserialize, Serialize};

use crate::domain::event::SalesEvent;
use crate::domain::record::DailyRecord;
use crate::domain::summary::{DayTotal, EventSummary, StaffSummary};
use crate::errors::DomainError;
use crate::metrics::{Category, CategoryTotals};

pub use self::event::rollup_event;
pub use self::staff::{daily_trend, rollup_staff};

/// Staff summary paired with its headline under the event's flag.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedStaff {
    pub rank: usize,
    pub headline: u64,
    pub ltv_total: u64,
    pub summary: StaffSummary,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventPerformance {
    pub summary: EventSummary,
    /// Ordered by headline descending, then staff name ascending.
    pub staff: Vec<RankedStaff>,
    pub daily_trend: Vec<DayTotal>,
}

pub trait RollupEngine: Send + Sync {
    fn evaluate(&self, event: &SalesEvent, records: &[DailyRecord]) -> EventPerformance;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DeterministicRollupEngine;

impl RollupEngine for DeterministicRollupEngine {
    fn evaluate(&self, event: &SalesEvent, records: &[DailyRecord]) -> EventPerformance {
        evaluate_event(event, records)
    }
}

/// Runs the staff rollup, event rollup and daily trend with the event's
/// stored flag.
pub fn evaluate_event(event: &SalesEvent, records: &[DailyRecord]) -> EventPerformance {
    let include_cell_up = event.include_cell_up;
    let summary = rollup_event(&event.target, records, include_cell_up);

    let mut staff: Vec<RankedStaff> = rollup_staff(records)
        .into_iter()
        .map(|summary| RankedStaff {
            rank: 0,
            headline: summary.headline(include_cell_up),
            ltv_total: summary.ltv_total(),
            summary,
        })
        .collect();
    staff.sort_by(|left, right| {
        Reverse(left.headline)
            .cmp(&Reverse(right.headline))
            .then_with(|| left.summary.staff_name.cmp(&right.summary.staff_name))
    });
    for (position, entry) in staff.iter_mut().enumerate() {
        entry.rank = position + 1;
    }

    EventPerformance { summary, staff, daily_trend: daily_trend(records, include_cell_up) }
}

/// Checks that per-staff category totals add up to the event actuals.
pub fn verify_consistency(
    summary: &EventSummary,
    staff: &[StaffSummary],
) -> Result<(), DomainError> {
    let mut staff_total = CategoryTotals::default();
    for member in staff {
        staff_total.au_mnp = staff_total.au_mnp.saturating_add(member.categories.au_mnp);
        staff_total.uq_mnp = staff_total.uq_mnp.saturating_add(member.categories.uq_mnp);
        staff_total.au_new = staff_total.au_new.saturating_add(member.categories.au_new);
        staff_total.uq_new = staff_total.uq_new.saturating_add(member.categories.uq_new);
        staff_total.cell_up = staff_total.cell_up.saturating_add(member.categories.cell_up);
    }

    for category in Category::ALL {
        let from_staff = staff_total.get(category);
        let from_event = summary.actual.get(category);
        if from_staff != from_event {
            tracing::warn!(
                event_name = "rollup.consistency.violated",
                event_id = %summary.event_id,
                category = category.as_str(),
                from_staff,
                from_event,
                "staff totals disagree with event actuals"
            );
            return Err(DomainError::InvariantViolation(format!(
                "event {}: staff {category} total {from_staff} != event total {from_event}",
                summary.event_id
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::{evaluate_event, verify_consistency, DeterministicRollupEngine, RollupEngine};
    use crate::domain::event::{EventId, SalesEvent, TargetRow};
    use crate::domain::record::{DailyRecord, Narrative, SalesCounters};
    use crate::errors::DomainError;
    use crate::metrics::{self, Category, CategoryTotals, Counter, LtvProduct, SubChannel};
    use crate::rollup::{rollup_event, rollup_staff};

    fn event(include_cell_up: bool) -> SalesEvent {
        SalesEvent {
            target: TargetRow {
                event_id: EventId("EV-200".to_string()),
                venue: "Ito-Yokado Musashikosugi".to_string(),
                team: "Kawasaki".to_string(),
                event_date: NaiveDate::from_ymd_opt(2024, 9, 7).expect("valid date"),
                targets: CategoryTotals { au_mnp: 4, ..Default::default() },
                narrative: Narrative::default(),
            },
            include_cell_up,
        }
    }

    fn random_records(rng: &mut StdRng) -> Vec<DailyRecord> {
        let names = ["Tanaka", "Sato", "Suzuki", "Takahashi", "tanaka"];
        let count = rng.gen_range(0..40);
        (0..count)
            .map(|_| {
                let mut counters = SalesCounters::default();
                for category in Category::ALL {
                    for channel in SubChannel::ALL {
                        counters.set(Counter::Sales(category, channel), rng.gen_range(0..6));
                    }
                }
                for product in LtvProduct::ALL {
                    counters.set(Counter::Ltv(product), rng.gen_range(0..3));
                }
                let name = names[rng.gen_range(0..names.len())];
                DailyRecord::new(name, rng.gen_range(1..4), counters)
            })
            .collect()
    }

    #[test]
    fn staff_totals_always_sum_to_event_actuals() {
        let mut rng = StdRng::seed_from_u64(0x5eed_2024);
        for _ in 0..200 {
            let records = random_records(&mut rng);
            let include_cell_up = rng.gen_bool(0.5);
            let summary = rollup_event(&event(include_cell_up).target, &records, include_cell_up);
            let staff = rollup_staff(&records);

            assert_eq!(verify_consistency(&summary, &staff), Ok(()));
            let staff_headline: u64 =
                staff.iter().map(|member| member.headline(include_cell_up)).sum();
            assert_eq!(staff_headline, summary.actual_headline);
        }
    }

    #[test]
    fn headline_with_cell_up_never_drops() {
        let mut rng = StdRng::seed_from_u64(7);
        for record in random_records(&mut rng) {
            assert!(
                metrics::headline_total(&record.counters, true)
                    >= metrics::headline_total(&record.counters, false)
            );
        }
    }

    #[test]
    fn evaluate_event_ranks_staff_by_headline_then_name() {
        let records = vec![
            DailyRecord::new("Sato", 1, SalesCounters { au_mnp_sp1: 2, ..Default::default() }),
            DailyRecord::new("Ito", 1, SalesCounters { uq_new_sp1: 2, ..Default::default() }),
            DailyRecord::new("Kato", 1, SalesCounters { cell_up_sp1: 5, ..Default::default() }),
            DailyRecord::new("Sato", 2, SalesCounters { uq_mnp_sim: 1, ..Default::default() }),
        ];

        let without = evaluate_event(&event(false), &records);
        let names: Vec<&str> =
            without.staff.iter().map(|entry| entry.summary.staff_name.as_str()).collect();
        assert_eq!(names, vec!["Sato", "Ito", "Kato"]);
        assert_eq!(without.staff[0].rank, 1);
        assert_eq!(without.staff[0].headline, 3);
        assert_eq!(without.summary.actual_headline, 5);

        let with = DeterministicRollupEngine.evaluate(&event(true), &records);
        assert_eq!(with.staff[0].summary.staff_name, "Kato");
        assert_eq!(with.staff[0].headline, 5);
        assert_eq!(with.summary.actual_headline, 10);
        assert_eq!(with.daily_trend.len(), 2);
    }

    #[test]
    fn large_staff_sums_stay_consistent_with_event_actuals() {
        let records = vec![
            DailyRecord::new("A", 1, SalesCounters { au_mnp_sp1: 3_000_000_000, ..Default::default() }),
            DailyRecord::new("B", 1, SalesCounters { au_mnp_sp1: 3_000_000_000, ..Default::default() }),
        ];
        let summary = rollup_event(&event(false).target, &records, false);
        let staff = rollup_staff(&records);

        assert_eq!(summary.actual.au_mnp, 6_000_000_000);
        assert_eq!(summary.actual_headline, 6_000_000_000);
        let staff_mnp: u64 = staff.iter().map(|member| member.categories.au_mnp).sum();
        assert_eq!(staff_mnp, 6_000_000_000);
        assert_eq!(verify_consistency(&summary, &staff), Ok(()));
    }

    #[test]
    fn tampered_staff_totals_are_reported() {
        let records =
            vec![DailyRecord::new("Tanaka", 1, SalesCounters { au_new_sp2: 2, ..Default::default() })];
        let summary = rollup_event(&event(false).target, &records, false);
        let mut staff = rollup_staff(&records);
        staff[0].categories.au_new = 1;

        let error = verify_consistency(&summary, &staff).expect_err("mismatch");
        assert!(matches!(error, DomainError::InvariantViolation(ref message) if message.contains("au_new")));
    }
}
