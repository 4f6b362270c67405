pub mod analytics;
pub mod config;
pub mod domain;
pub mod errors;
pub mod metrics;
pub mod rollup;

pub use analytics::{
    aggregate_by_key, by_month, by_team, by_venue, evaluate_achievement, evaluate_events,
    staff_leaderboard, EventAchievement, LeaderboardEntry, MonthlyAchievement,
};
pub use config::{AppConfig, ConfigError, LoadOptions, LogFormat, Setting, SETTINGS};
pub use domain::event::{EventId, SalesEvent, TargetRow};
pub use domain::record::{DailyRecord, Narrative, SalesCounters, StaffKey};
pub use domain::summary::{CategoryProgress, DayTotal, EventSummary, GroupStat, StaffSummary};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use metrics::{Category, CategoryTotals, Counter, LtvProduct, Metric, SubChannel};
pub use rollup::{
    daily_trend, evaluate_event, rollup_event, rollup_staff, verify_consistency,
    DeterministicRollupEngine, EventPerformance, RankedStaff, RollupEngine,
};
