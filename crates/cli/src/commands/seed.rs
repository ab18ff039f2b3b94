use freightdesk_db::repositories::SqlCallLogRepository;
use freightdesk_db::{seed_sample_calls, SeedResult};

use crate::commands::{
    build_runtime, connect_and_migrate, load_config, CommandResult, StepError, EXIT_OPERATION,
};

pub fn run() -> CommandResult {
    let config = match load_config("seed") {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let runtime = match build_runtime("seed") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let result: Result<SeedResult, StepError> = runtime.block_on(async {
        let pool = connect_and_migrate(&config).await?;
        let repository = SqlCallLogRepository::new(pool.clone());
        let seeded = seed_sample_calls(&repository)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), EXIT_OPERATION));
        pool.close().await;
        seeded
    });

    match result {
        Ok(seeded) => CommandResult::success_with_data(
            "seed",
            seed_message(seeded.inserted.len(), seeded.removed),
            &seeded,
        ),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("seed", error_class, message, exit_code)
        }
    }
}

fn seed_message(inserted: usize, removed: u64) -> String {
    if removed == 0 {
        format!("seeded {inserted} sample calls")
    } else {
        format!("seeded {inserted} sample calls (replaced {removed} existing)")
    }
}
