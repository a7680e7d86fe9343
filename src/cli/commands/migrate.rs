use crate::cli::output::output_success;
use crate::cli::OutputFormat;
use crate::config::AppConfig;
use crate::database::{PgStore, Store};

pub async fn handle(config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    let store = PgStore::connect(&config.database).await?;
    let result = store.migrate().await;
    store.close().await;
    result?;

    output_success(output_format, "Migrations applied", None)
}
