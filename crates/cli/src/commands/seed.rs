use fieldsales_db::{migrations, DemoDataset, EventSeedInfo};

use crate::commands::{open_pool, prepare, CommandResult, Failure};

pub fn run() -> CommandResult {
    let (config, runtime) = match prepare("seed") {
        Ok(prepared) => prepared,
        Err(result) => return result,
    };

    let result = runtime.block_on(async {
        let pool = open_pool(&config).await?;

        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;

        let seed_result = DemoDataset::load(&pool)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), 5u8))?;

        let verification = DemoDataset::verify(&pool)
            .await
            .map_err(|error| ("seed_verification", error.to_string(), 6u8))?;

        let run_result: Result<Vec<EventSeedInfo>, Failure> = if verification.all_present {
            Ok(seed_result.events_seeded)
        } else {
            Err(("seed_verification", verification_message(&verification.failed_checks()), 6u8))
        };

        pool.close().await;
        run_result
    });

    match result {
        Ok(events) => {
            let lines: Vec<String> = events
                .iter()
                .map(|event| format!("  - {}: {} ({})", event.event_id, event.venue, event.description))
                .collect();
            let message = format!(
                "demo dataset loaded for {} events:\n{}",
                events.len(),
                lines.join("\n")
            );
            CommandResult::success("seed", message)
        }
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("seed", error_class, message, exit_code)
        }
    }
}

fn verification_message(failed_checks: &[String]) -> String {
    if failed_checks.is_empty() {
        "some demo data failed to load".to_string()
    } else {
        format!("seed verification failed for checks: {}", failed_checks.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::verification_message;

    #[test]
    fn verification_error_message_targets_failed_checks() {
        let failed = vec![
            "EV-2024-0601:cell-up-flag".to_string(),
            "EV-2024-0601:actual-headline".to_string(),
        ];

        assert_eq!(
            verification_message(&failed),
            "seed verification failed for checks: EV-2024-0601:cell-up-flag, EV-2024-0601:actual-headline"
        );
    }

    #[test]
    fn verification_error_message_falls_back_to_generic_when_no_labels() {
        assert_eq!(verification_message(&[]), "some demo data failed to load");
    }
}
