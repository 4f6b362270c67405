use chrono::NaiveDate;
use clap::{Args, ValueEnum};
use serde::Serialize;

use fieldsales_core::analytics::{
    by_month, by_team, by_venue, evaluate_achievement, evaluate_events, staff_leaderboard,
    EventAchievement, LeaderboardEntry, MonthlyAchievement,
};
use fieldsales_core::domain::event::{EventId, SalesEvent};
use fieldsales_core::domain::record::DailyRecord;
use fieldsales_core::domain::summary::{CategoryProgress, DayTotal, EventSummary, GroupStat};
use fieldsales_core::errors::ApplicationError;
use fieldsales_core::metrics::Metric;
use fieldsales_core::rollup::{
    verify_consistency, DeterministicRollupEngine, RankedStaff, RollupEngine,
};
use fieldsales_db::repositories::{
    DailyRecordRepository, EventFilter, EventRepository, EventSummaryRepository,
    SqlDailyRecordRepository, SqlEventRepository, SqlEventSummaryRepository,
};
use fieldsales_db::DbPool;

use crate::commands::{application_failure, open_pool, prepare, CommandResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupBy {
    Venue,
    Team,
    Month,
}

#[derive(Clone, Debug, Default, Args)]
pub struct FilterArgs {
    #[arg(long, help = "First event date to include (YYYY-MM-DD)")]
    pub from: Option<NaiveDate>,
    #[arg(long, help = "Last event date to include (YYYY-MM-DD)")]
    pub to: Option<NaiveDate>,
    #[arg(long, help = "Only events held at this venue")]
    pub venue: Option<String>,
    #[arg(long, help = "Only events run by this team")]
    pub team: Option<String>,
}

impl From<FilterArgs> for EventFilter {
    fn from(args: FilterArgs) -> Self {
        Self { from: args.from, to: args.to, venue: args.venue, team: args.team }
    }
}

#[derive(Debug, Serialize)]
struct EventReport {
    summary: EventSummary,
    category_progress: Vec<CategoryProgress>,
    ltv_breakdown: Vec<LtvLine>,
    staff: Vec<RankedStaff>,
    daily_trend: Vec<DayTotal>,
    persisted: bool,
}

#[derive(Debug, Serialize)]
struct LtvLine {
    product: &'static str,
    total: u64,
}

#[derive(Debug, Serialize)]
struct GroupReport {
    by: GroupBy,
    metric: String,
    event_count: usize,
    groups: Vec<GroupStat>,
}

#[derive(Debug, Serialize)]
struct AchievementReport {
    months: Vec<MonthlyAchievement>,
    events: Vec<EventAchievement>,
}

#[derive(Debug, Serialize)]
struct LeaderboardReport {
    limit: usize,
    event_count: usize,
    entries: Vec<LeaderboardEntry>,
}

pub fn event(id: &str, persist: bool) -> CommandResult {
    let (config, runtime) = match prepare("report") {
        Ok(prepared) => prepared,
        Err(result) => return result,
    };
    let event_id = EventId(id.to_string());

    let result = runtime.block_on(async {
        let pool = open_pool(&config).await?;
        let report = event_report(&pool, &event_id, persist).await;
        pool.close().await;
        report.map_err(application_failure)
    });

    match result {
        Ok(report) => {
            let message = format!(
                "event {} headline {}/{} ({} staff)",
                report.summary.event_id,
                report.summary.actual_headline,
                report.summary.target_headline,
                report.staff.len()
            );
            CommandResult::success_with_data("report", message, report)
        }
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("report", error_class, message, exit_code)
        }
    }
}

pub fn group(by: GroupBy, metric_key: &str, filter: EventFilter) -> CommandResult {
    let metric = match Metric::from_key(metric_key) {
        Ok(metric) => metric,
        Err(error) => {
            let (error_class, message, exit_code) = application_failure(error.into());
            return CommandResult::failure("report", error_class, message, exit_code);
        }
    };
    let (config, runtime) = match prepare("report") {
        Ok(prepared) => prepared,
        Err(result) => return result,
    };

    let result = runtime.block_on(async {
        let pool = open_pool(&config).await?;
        let summaries = load_summaries(&pool, &filter).await;
        pool.close().await;
        summaries.map_err(application_failure)
    });

    match result {
        Ok(summaries) => {
            let groups = match by {
                GroupBy::Venue => by_venue(&summaries, metric),
                GroupBy::Team => by_team(&summaries, metric),
                GroupBy::Month => by_month(&summaries, metric),
            };
            tracing::info!(
                event_name = "cli.report.group",
                metric = %metric.key(),
                event_count = summaries.len(),
                group_count = groups.len(),
                "group report computed"
            );
            let report = GroupReport {
                by,
                metric: metric.key(),
                event_count: summaries.len(),
                groups,
            };
            let message = format!("{} groups over {} events", report.groups.len(), report.event_count);
            CommandResult::success_with_data("report", message, report)
        }
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("report", error_class, message, exit_code)
        }
    }
}

pub fn achievement(filter: EventFilter) -> CommandResult {
    let (config, runtime) = match prepare("report") {
        Ok(prepared) => prepared,
        Err(result) => return result,
    };

    let result = runtime.block_on(async {
        let pool = open_pool(&config).await?;
        let summaries = load_summaries(&pool, &filter).await;
        pool.close().await;
        summaries.map_err(application_failure)
    });

    match result {
        Ok(summaries) => {
            let report = AchievementReport {
                months: evaluate_achievement(&summaries),
                events: evaluate_events(&summaries),
            };
            let message = format!(
                "achievement over {} months and {} events",
                report.months.len(),
                report.events.len()
            );
            CommandResult::success_with_data("report", message, report)
        }
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("report", error_class, message, exit_code)
        }
    }
}

pub fn leaderboard(filter: EventFilter, limit: Option<usize>) -> CommandResult {
    let (config, runtime) = match prepare("report") {
        Ok(prepared) => prepared,
        Err(result) => return result,
    };
    let limit = limit.unwrap_or(config.reporting.leaderboard_limit);

    let result = runtime.block_on(async {
        let pool = open_pool(&config).await?;
        let dataset = load_dataset(&pool, &filter).await;
        pool.close().await;
        dataset.map_err(application_failure)
    });

    match result {
        Ok(dataset) => {
            let report = LeaderboardReport {
                limit,
                event_count: dataset.len(),
                entries: staff_leaderboard(&dataset, Some(limit)),
            };
            let message = format!(
                "{} staff ranked over {} events",
                report.entries.len(),
                report.event_count
            );
            CommandResult::success_with_data("report", message, report)
        }
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("report", error_class, message, exit_code)
        }
    }
}

async fn event_report(
    pool: &DbPool,
    event_id: &EventId,
    persist: bool,
) -> Result<EventReport, ApplicationError> {
    let event = SqlEventRepository::new(pool.clone())
        .find_by_id(event_id)
        .await?
        .ok_or_else(|| ApplicationError::NotFound { entity: "event", id: event_id.0.clone() })?;
    let records = SqlDailyRecordRepository::new(pool.clone()).list_for_event(event_id).await?;

    let performance = DeterministicRollupEngine.evaluate(&event, &records);
    let staff_summaries: Vec<_> =
        performance.staff.iter().map(|ranked| ranked.summary.clone()).collect();
    verify_consistency(&performance.summary, &staff_summaries)?;

    if persist {
        SqlEventSummaryRepository::new(pool.clone()).save(&performance.summary).await?;
    }

    tracing::info!(
        event_name = "cli.report.event",
        event_id = %event_id,
        include_cell_up = event.include_cell_up,
        persisted = persist,
        "event report computed"
    );

    let ltv_breakdown = performance
        .summary
        .ltv_breakdown()
        .into_iter()
        .map(|(product, total)| LtvLine { product: product.as_str(), total })
        .collect();

    Ok(EventReport {
        category_progress: performance.summary.category_progress(),
        ltv_breakdown,
        summary: performance.summary,
        staff: performance.staff,
        daily_trend: performance.daily_trend,
        persisted: persist,
    })
}

/// Events matching `filter` with their daily rows, in date order.
async fn load_dataset(
    pool: &DbPool,
    filter: &EventFilter,
) -> Result<Vec<(SalesEvent, Vec<DailyRecord>)>, ApplicationError> {
    let events = SqlEventRepository::new(pool.clone());
    let records = SqlDailyRecordRepository::new(pool.clone());

    let mut dataset = Vec::new();
    for event in events.list(filter).await? {
        let rows = records.list_for_event(event.id()).await?;
        dataset.push((event, rows));
    }
    Ok(dataset)
}

async fn load_summaries(
    pool: &DbPool,
    filter: &EventFilter,
) -> Result<Vec<EventSummary>, ApplicationError> {
    let engine = DeterministicRollupEngine;
    Ok(load_dataset(pool, filter)
        .await?
        .iter()
        .map(|(event, records)| engine.evaluate(event, records).summary)
        .collect())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use fieldsales_db::repositories::EventFilter;

    use super::FilterArgs;

    #[test]
    fn filter_args_convert_field_for_field() {
        let args = FilterArgs {
            from: NaiveDate::from_ymd_opt(2024, 6, 1),
            to: None,
            venue: None,
            team: Some("Chiba".to_string()),
        };

        let filter = EventFilter::from(args);
        assert_eq!(filter.from, NaiveDate::from_ymd_opt(2024, 6, 1));
        assert_eq!(filter.to, None);
        assert_eq!(filter.team.as_deref(), Some("Chiba"));
    }
}
