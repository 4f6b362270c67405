use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::domain::event::SalesEvent;
use crate::domain::record::DailyRecord;
use crate::rollup::rollup_staff;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub staff_name: String,
    pub events_worked: usize,
    pub days_worked: usize,
    pub headline: u64,
    pub mnp_total: u64,
    pub ltv_total: u64,
}

#[derive(Default)]
struct StaffTally {
    events: BTreeSet<String>,
    days: usize,
    headline: u64,
    mnp: u64,
    ltv: u64,
}

/// Ranks staff across several events. Each event's headline uses that
/// event's own flag, so mixed-flag periods add up the way each event reports.
pub fn staff_leaderboard(
    events: &[(SalesEvent, Vec<DailyRecord>)],
    limit: Option<usize>,
) -> Vec<LeaderboardEntry> {
    let mut tallies: BTreeMap<String, StaffTally> = BTreeMap::new();
    for (event, records) in events {
        for staff in rollup_staff(records) {
            let tally = tallies.entry(staff.staff_name.clone()).or_default();
            tally.events.insert(event.id().0.clone());
            tally.days += staff.days_worked();
            tally.headline += staff.headline(event.include_cell_up);
            tally.mnp += staff.categories.mnp_total();
            tally.ltv += staff.ltv_total();
        }
    }

    let mut entries: Vec<LeaderboardEntry> = tallies
        .into_iter()
        .map(|(staff_name, tally)| LeaderboardEntry {
            rank: 0,
            staff_name,
            events_worked: tally.events.len(),
            days_worked: tally.days,
            headline: tally.headline,
            mnp_total: tally.mnp,
            ltv_total: tally.ltv,
        })
        .collect();
    entries.sort_by_key(|entry| Reverse(entry.headline));
    if let Some(limit) = limit {
        entries.truncate(limit);
    }
    for (position, entry) in entries.iter_mut().enumerate() {
        entry.rank = position + 1;
    }
    entries
}
