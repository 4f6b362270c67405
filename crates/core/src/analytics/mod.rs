//! Cross-event reporting over already-computed event summaries.

pub mod achievement;
pub mod aggregate;
pub mod leaderboard;

pub use achievement::{evaluate_achievement, evaluate_events, EventAchievement, MonthlyAchievement};
pub use aggregate::{aggregate_by_key, by_month, by_team, by_venue};
pub use leaderboard::{staff_leaderboard, LeaderboardEntry};
