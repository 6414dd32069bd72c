use orderbot_core::config::LoadOptions;
use orderbot_db::{migrations, MenuSeed};

use crate::commands::{build_runtime, load_config, open_pool, CommandResult, Failure};

pub fn run(options: LoadOptions) -> CommandResult {
    let config = match load_config("seed", options) {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let runtime = match build_runtime("seed") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let pool = open_pool(&config).await?;
        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;

        let seeded =
            MenuSeed::load(&pool).await.map_err(|error| ("seed_load", error.to_string(), 6u8))?;
        let verified =
            MenuSeed::verify(&pool).await.map_err(|error| ("seed_verify", error.to_string(), 6u8))?;
        pool.close().await;

        if !verified {
            return Err(("seed_verify", "menu rows missing after load".to_string(), 6u8));
        }
        Ok::<usize, Failure>(seeded.items_seeded)
    });

    match result {
        Ok(count) => CommandResult::success("seed", format!("loaded {count} menu items")),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("seed", error_class, message, exit_code)
        }
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::run;
    use crate::commands::test_support::{file_database, outcome};

    #[test]
    fn seed_loads_the_menu() {
        let dir = TempDir::new().expect("tempdir");

        let result = run(file_database(&dir));

        assert_eq!(result.exit_code, 0, "{}", result.output);
        assert_eq!(outcome(&result)["message"], "loaded 9 menu items");
    }
}
