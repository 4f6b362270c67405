use fieldsales_core::config::{AppConfig, LoadOptions};
use fieldsales_db::{migrations, ping};
use serde::Serialize;

use crate::commands::{open_pool, CommandResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

impl DoctorCheck {
    fn skipped(name: &'static str, reason: &str) -> Self {
        Self { name, status: CheckStatus::Skipped, details: format!("skipped because {reason}") }
    }
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

/// Every check is reported in `data`. The first failing check picks the
/// error class and exit code its own command would use.
pub fn run() -> CommandResult {
    let report = build_report();
    match first_failure(&report) {
        None => CommandResult::success_with_data("doctor", report.summary.clone(), &report),
        Some((error_class, exit_code)) => CommandResult::failure_with_data(
            "doctor",
            error_class,
            report.summary.clone(),
            &report,
            exit_code,
        ),
    }
}

fn first_failure(report: &DoctorReport) -> Option<(&'static str, u8)> {
    let failed = report.checks.iter().find(|check| check.status == CheckStatus::Fail)?;
    Some(match failed.name {
        "config_validation" => ("config_validation", 2),
        "database_connectivity" => ("db_connectivity", 4),
        _ => ("migration", 5),
    })
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.extend(check_database(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            checks.push(DoctorCheck::skipped(
                "database_connectivity",
                "configuration did not load",
            ));
            checks.push(DoctorCheck::skipped("schema_readiness", "configuration did not load"));
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

/// Connectivity, then whether the reporting tables exist.
fn check_database(config: &AppConfig) -> Vec<DoctorCheck> {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return vec![
                DoctorCheck {
                    name: "database_connectivity",
                    status: CheckStatus::Fail,
                    details: format!("failed to initialize async runtime: {error}"),
                },
                DoctorCheck::skipped("schema_readiness", "the async runtime did not start"),
            ];
        }
    };

    runtime.block_on(async {
        let pool = match open_pool(config).await {
            Ok(pool) => pool,
            Err((_, error, _)) => {
                return vec![
                    DoctorCheck {
                        name: "database_connectivity",
                        status: CheckStatus::Fail,
                        details: format!("failed to connect to database: {error}"),
                    },
                    DoctorCheck::skipped("schema_readiness", "the database is unreachable"),
                ];
            }
        };

        let connectivity = match ping(&pool).await {
            Ok(()) => DoctorCheck {
                name: "database_connectivity",
                status: CheckStatus::Pass,
                details: format!(
                    "connected using `{}`",
                    config.database.url.split('?').next().unwrap_or_default()
                ),
            },
            Err(error) => DoctorCheck {
                name: "database_connectivity",
                status: CheckStatus::Fail,
                details: error.to_string(),
            },
        };

        let schema = match migrations::missing_tables(&pool).await {
            Ok(missing) if missing.is_empty() => DoctorCheck {
                name: "schema_readiness",
                status: CheckStatus::Pass,
                details: "reporting tables are present".to_string(),
            },
            Ok(missing) => DoctorCheck {
                name: "schema_readiness",
                status: CheckStatus::Fail,
                details: format!("missing tables: {} (run `fieldsales migrate`)", missing.join(", ")),
            },
            Err(error) => DoctorCheck {
                name: "schema_readiness",
                status: CheckStatus::Fail,
                details: error.to_string(),
            },
        };

        pool.close().await;
        vec![connectivity, schema]
    })
}
