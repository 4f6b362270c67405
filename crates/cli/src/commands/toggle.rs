use fieldsales_core::domain::event::EventId;
use fieldsales_db::repositories::{EventRepository, SqlEventRepository};

use crate::commands::{application_failure, open_pool, prepare, CommandResult};

/// Flips an event's cell-up inclusion flag. Nothing derived is stored, so the
/// next report picks the new value up directly.
pub fn run(id: &str, include_cell_up: bool) -> CommandResult {
    let (config, runtime) = match prepare("toggle-cell-up") {
        Ok(prepared) => prepared,
        Err(result) => return result,
    };
    let event_id = EventId(id.to_string());

    let result = runtime.block_on(async {
        let pool = open_pool(&config).await?;
        let updated = SqlEventRepository::new(pool.clone())
            .set_include_cell_up(&event_id, include_cell_up)
            .await;
        pool.close().await;
        updated.map_err(|error| application_failure(error.into()))
    });

    match result {
        Ok(()) => {
            let state = if include_cell_up { "included in" } else { "excluded from" };
            CommandResult::success(
                "toggle-cell-up",
                format!("cell-up sales are now {state} the headline for event {event_id}"),
            )
        }
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("toggle-cell-up", error_class, message, exit_code)
        }
    }
}
