use std::fs;
use std::path::Path;

use anyhow::{bail, Context};
use serde::Deserialize;

use fieldsales_core::domain::event::{SalesEvent, TargetRow};
use fieldsales_core::domain::record::DailyRecord;
use fieldsales_db::migrations;
use fieldsales_db::repositories::{import_events, EventBatch};

use crate::commands::{application_failure, open_pool, prepare, CommandResult};

/// One event as it appears in an import file: the target row fields, an
/// optional inclusion flag and the complete set of daily rows.
#[derive(Debug, Deserialize)]
struct ImportEvent {
    #[serde(flatten)]
    target: TargetRow,
    #[serde(default)]
    include_cell_up: Option<bool>,
    #[serde(default)]
    records: Vec<DailyRecord>,
}

#[derive(Debug, Deserialize)]
struct ImportFile {
    events: Vec<ImportEvent>,
}

/// Upserts every event in the file and replaces its daily rows in a single
/// transaction. Events that leave `include_cell_up` out get
/// `reporting.default_include_cell_up`.
pub fn run(path: &Path) -> CommandResult {
    let import = match load_import_file(path) {
        Ok(import) => import,
        Err(error) => {
            return CommandResult::failure("import", "input_validation", format!("{error:#}"), 6);
        }
    };
    let (config, runtime) = match prepare("import") {
        Ok(prepared) => prepared,
        Err(result) => return result,
    };
    let default_include_cell_up = config.reporting.default_include_cell_up;

    let result = runtime.block_on(async {
        let pool = open_pool(&config).await?;
        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;

        let batch: Vec<EventBatch> = import
            .events
            .into_iter()
            .map(|item| EventBatch {
                event: SalesEvent {
                    include_cell_up: item.include_cell_up.unwrap_or(default_include_cell_up),
                    target: item.target,
                },
                records: item.records,
            })
            .collect();
        let event_count = batch.len();
        let stored = import_events(&pool, &batch).await;

        pool.close().await;
        stored
            .map(|record_count| (event_count, record_count))
            .map_err(|error| application_failure(error.into()))
    });

    match result {
        Ok((event_count, record_count)) => {
            tracing::info!(
                event_name = "cli.import.completed",
                event_count,
                record_count,
                "import applied"
            );
            CommandResult::success(
                "import",
                format!("imported {event_count} events with {record_count} daily records"),
            )
        }
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("import", error_class, message, exit_code)
        }
    }
}

fn load_import_file(path: &Path) -> anyhow::Result<ImportFile> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("could not read import file `{}`", path.display()))?;
    let import: ImportFile = serde_json::from_str(&raw)
        .with_context(|| format!("could not parse import file `{}`", path.display()))?;

    for event in &import.events {
        if event.target.event_id.0.trim().is_empty() {
            bail!("import file contains an event with an empty event_id");
        }
        if let Some(record) = event.records.iter().find(|record| record.day == 0) {
            bail!(
                "event `{}` has a record for `{}` with day index 0; day indexes start at 1",
                event.target.event_id,
                record.staff_name
            );
        }
    }
    Ok(import)
}
