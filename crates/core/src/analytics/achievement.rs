use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::event::EventId;
use crate::domain::summary::EventSummary;
use crate::metrics;

/// Target status of one event. `achieved` is `None` when no headline target
/// was set, so the event does not count toward the monthly rate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventAchievement {
    pub event_id: EventId,
    pub month: String,
    pub target_headline: u64,
    pub actual_headline: u64,
    pub achieved: Option<bool>,
    pub progress_pct: u32,
}

impl EventAchievement {
    pub fn is_eligible(&self) -> bool {
        self.achieved.is_some()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyAchievement {
    pub month: String,
    pub event_count: usize,
    pub eligible_count: usize,
    pub achieved_count: usize,
    pub achievement_rate: u32,
    pub mnp_total: u64,
    pub new_line_total: u64,
    pub mnp_ratio: u32,
}

pub fn evaluate_events(events: &[EventSummary]) -> Vec<EventAchievement> {
    events
        .iter()
        .map(|event| EventAchievement {
            event_id: event.event_id.clone(),
            month: event.month_key(),
            target_headline: event.target_headline,
            actual_headline: event.actual_headline,
            achieved: (event.target_headline > 0)
                .then(|| event.actual_headline >= event.target_headline),
            progress_pct: metrics::rounded_percent(event.actual_headline, event.target_headline),
        })
        .collect()
}

#[derive(Default)]
struct MonthTally {
    event_count: usize,
    eligible: usize,
    achieved: usize,
    mnp: u64,
    new_line: u64,
}

/// Monthly achievement rate and MNP share, ascending by month.
pub fn evaluate_achievement(events: &[EventSummary]) -> Vec<MonthlyAchievement> {
    let mut months: BTreeMap<String, MonthTally> = BTreeMap::new();
    for (event, status) in events.iter().zip(evaluate_events(events)) {
        let tally = months.entry(status.month).or_default();
        tally.event_count += 1;
        tally.mnp += event.actual.mnp_total();
        tally.new_line += event.actual.new_line_total();
        if let Some(achieved) = status.achieved {
            tally.eligible += 1;
            if achieved {
                tally.achieved += 1;
            }
        }
    }

    let report: Vec<MonthlyAchievement> = months
        .into_iter()
        .map(|(month, tally)| MonthlyAchievement {
            month,
            event_count: tally.event_count,
            eligible_count: tally.eligible,
            achieved_count: tally.achieved,
            achievement_rate: metrics::rounded_percent(tally.achieved as u64, tally.eligible as u64),
            mnp_total: tally.mnp,
            new_line_total: tally.new_line,
            mnp_ratio: metrics::rounded_percent(tally.mnp, tally.mnp + tally.new_line),
        })
        .collect();

    tracing::debug!(
        event_name = "analytics.achievement.evaluated",
        event_count = events.len(),
        month_count = report.len(),
        "monthly achievement evaluated"
    );
    report
}
