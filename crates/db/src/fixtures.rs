use sqlx::Executor;

use fieldsales_core::domain::event::EventId;
use fieldsales_core::rollup::{evaluate_event, rollup_staff, verify_consistency};

use crate::connection::DbPool;
use crate::repositories::{
    DailyRecordRepository, EventRepository, RepositoryError, SqlDailyRecordRepository,
    SqlEventRepository,
};

/// Expected shape of each seeded event once rolled up.
const SEED_EVENTS: &[SeedEventContract] = &[
    SeedEventContract {
        event_id: "EV-2024-0601",
        venue: "Aeon Mall Makuhari",
        team: "Chiba",
        include_cell_up: false,
        record_count: 4,
        staff_count: 2,
        target_headline: 15,
        actual_headline: 13,
        ltv_total: 3,
        description: "June weekend, cell-up excluded, target missed",
    },
    SeedEventContract {
        event_id: "EV-2024-0615",
        venue: "Lalaport Yokohama",
        team: "Kanagawa",
        include_cell_up: true,
        record_count: 3,
        staff_count: 2,
        target_headline: 12,
        actual_headline: 13,
        ltv_total: 3,
        description: "June weekend, cell-up included, target met",
    },
    SeedEventContract {
        event_id: "EV-2024-0706",
        venue: "Aeon Mall Makuhari",
        team: "Chiba",
        include_cell_up: false,
        record_count: 2,
        staff_count: 2,
        target_headline: 0,
        actual_headline: 5,
        ltv_total: 2,
        description: "July pop-up without targets, one malformed counter",
    },
    SeedEventContract {
        event_id: "EV-2024-0720",
        venue: "Ito-Yokado Kawasaki",
        team: "Kanagawa",
        include_cell_up: true,
        record_count: 2,
        staff_count: 1,
        target_headline: 6,
        actual_headline: 6,
        ltv_total: 0,
        description: "July solo event, target met exactly",
    },
];

/// Deterministic demo data: four events over two months, three venues and
/// two teams, with a mix of cell-up settings and target outcomes.
pub struct DemoDataset;

impl DemoDataset {
    pub const SQL: &str = include_str!("../../../config/fixtures/demo_seed_data.sql");

    /// Loads the dataset. Re-loading replaces the seeded rows in place.
    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let mut tx = pool.begin().await?;
        tx.execute(sqlx::query(Self::SQL)).await?;
        tx.commit().await?;

        let events_seeded = SEED_EVENTS
            .iter()
            .map(|event| EventSeedInfo {
                event_id: event.event_id,
                venue: event.venue,
                description: event.description,
            })
            .collect::<Vec<_>>();

        tracing::info!(
            event_name = "db.fixtures.loaded",
            event_count = events_seeded.len(),
            "demo dataset loaded"
        );
        Ok(SeedResult { events_seeded })
    }

    /// Re-reads every seeded event, rolls it up and checks the result
    /// against the contract above.
    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let events = SqlEventRepository::new(pool.clone());
        let records = SqlDailyRecordRepository::new(pool.clone());
        let mut checks = Vec::new();

        for contract in SEED_EVENTS {
            let id = EventId(contract.event_id.to_string());
            let Some(event) = events.find_by_id(&id).await? else {
                checks.push((contract.event_id, "event-exists", false));
                continue;
            };
            checks.push((contract.event_id, "event-exists", true));
            checks.push((
                contract.event_id,
                "venue-and-team",
                event.target.venue == contract.venue && event.target.team == contract.team,
            ));
            checks.push((
                contract.event_id,
                "cell-up-flag",
                event.include_cell_up == contract.include_cell_up,
            ));

            let rows = records.list_for_event(&id).await?;
            checks.push((contract.event_id, "record-count", rows.len() == contract.record_count));

            let performance = evaluate_event(&event, &rows);
            checks.push((
                contract.event_id,
                "staff-count",
                performance.staff.len() == contract.staff_count,
            ));
            checks.push((
                contract.event_id,
                "target-headline",
                performance.summary.target_headline == contract.target_headline,
            ));
            checks.push((
                contract.event_id,
                "actual-headline",
                performance.summary.actual_headline == contract.actual_headline,
            ));
            checks.push((
                contract.event_id,
                "ltv-total",
                performance.summary.ltv_total == contract.ltv_total,
            ));
            checks.push((
                contract.event_id,
                "staff-sum-consistency",
                verify_consistency(&performance.summary, &rollup_staff(&rows)).is_ok(),
            ));
        }

        let all_present = checks.iter().all(|(_, _, passed)| *passed);
        if !all_present {
            tracing::warn!(
                event_name = "db.fixtures.verification_failed",
                failed = checks.iter().filter(|(_, _, passed)| !passed).count(),
                "demo dataset does not match its contract"
            );
        }
        Ok(VerificationResult { all_present, checks })
    }

    /// Removes the seeded events; daily rows and snapshots cascade.
    pub async fn clean(pool: &DbPool) -> Result<(), RepositoryError> {
        let mut tx = pool.begin().await?;
        for contract in SEED_EVENTS {
            sqlx::query("DELETE FROM sales_event WHERE id = ?")
                .bind(contract.event_id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
struct SeedEventContract {
    event_id: &'static str,
    venue: &'static str,
    team: &'static str,
    include_cell_up: bool,
    record_count: usize,
    staff_count: usize,
    target_headline: u64,
    actual_headline: u64,
    ltv_total: u64,
    description: &'static str,
}

#[derive(Debug)]
pub struct SeedResult {
    pub events_seeded: Vec<EventSeedInfo>,
}

#[derive(Debug)]
pub struct EventSeedInfo {
    pub event_id: &'static str,
    pub venue: &'static str,
    pub description: &'static str,
}

#[derive(Debug)]
pub struct VerificationResult {
    pub all_present: bool,
    /// `(event id, check name, passed)`.
    pub checks: Vec<(&'static str, &'static str, bool)>,
}

impl VerificationResult {
    pub fn failed_checks(&self) -> Vec<String> {
        self.checks
            .iter()
            .filter(|(_, _, passed)| !passed)
            .map(|(event_id, check, _)| format!("{event_id}:{check}"))
            .collect()
    }
}
