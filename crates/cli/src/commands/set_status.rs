use orderbot_core::config::LoadOptions;
use orderbot_core::domain::order::{OrderId, OrderStatus};
use orderbot_db::{migrations, SqlOrderStorage};

use crate::commands::{build_runtime, load_config, open_pool, CommandResult, Failure};

pub fn run(options: LoadOptions, order_id: i64, status: &str) -> CommandResult {
    let status = match status.parse::<OrderStatus>() {
        Ok(status) => status,
        Err(error) => {
            return CommandResult::failure("set-status", "invalid_status", error.to_string(), 2);
        }
    };
    let config = match load_config("set-status", options) {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let runtime = match build_runtime("set-status") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let order_id = OrderId(order_id);
    let result = runtime.block_on(async {
        let pool = open_pool(&config).await?;
        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;

        let storage = SqlOrderStorage::new(pool.clone());
        let updated = storage
            .update_order_status(order_id, status)
            .await
            .map_err(|error| ("status_update", error.to_string(), 6u8))?;
        pool.close().await;

        if !updated {
            return Err(("order_not_found", format!("no tracked order with id {order_id}"), 7u8));
        }
        Ok::<(), Failure>(())
    });

    match result {
        Ok(()) => CommandResult::success(
            "set-status",
            format!("order {order_id} is now {}", status.describe()),
        ),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("set-status", error_class, message, exit_code)
        }
    }
}
