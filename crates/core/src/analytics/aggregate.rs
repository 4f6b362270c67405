use std::cmp::Reverse;
use std::collections::BTreeMap;

use crate::domain::summary::{EventSummary, GroupStat};
use crate::metrics::{self, Metric};

/// Groups `events` by `key_fn` and totals `value_fn` per group.
///
/// Groups are returned ascending by key. Averages are exact decimals rounded
/// to two places.
pub fn aggregate_by_key<K, V>(events: &[EventSummary], key_fn: K, value_fn: V) -> Vec<GroupStat>
where
    K: Fn(&EventSummary) -> String,
    V: Fn(&EventSummary) -> u64,
{
    let mut groups: BTreeMap<String, (u64, usize)> = BTreeMap::new();
    for event in events {
        let (total, count) = groups.entry(key_fn(event)).or_default();
        *total = total.saturating_add(value_fn(event));
        *count += 1;
    }

    groups
        .into_iter()
        .map(|(key, (total, count))| GroupStat {
            key,
            total,
            count,
            average: metrics::average(total, count),
        })
        .collect()
}

/// Venue stats, largest total first.
pub fn by_venue(events: &[EventSummary], metric: Metric) -> Vec<GroupStat> {
    ranked(aggregate_by_key(events, |event| event.venue.clone(), |event| event.metric_value(metric)))
}

/// Team stats, largest total first.
pub fn by_team(events: &[EventSummary], metric: Metric) -> Vec<GroupStat> {
    ranked(aggregate_by_key(events, |event| event.team.clone(), |event| event.metric_value(metric)))
}

/// Month stats in calendar order.
pub fn by_month(events: &[EventSummary], metric: Metric) -> Vec<GroupStat> {
    aggregate_by_key(events, EventSummary::month_key, |event| event.metric_value(metric))
}

fn ranked(mut stats: Vec<GroupStat>) -> Vec<GroupStat> {
    // Input is already key-ascending, so a stable sort keeps that as the tie-break.
    stats.sort_by_key(|stat| Reverse(stat.total));
    stats
}
