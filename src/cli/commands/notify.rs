use serde_json::json;

use crate::cli::output::output_success;
use crate::cli::OutputFormat;
use crate::config::AppConfig;
use crate::database::{NewNotification, PgStore, Store};

pub async fn handle(
    config: &AppConfig,
    user_id: i32,
    title: String,
    content: Option<String>,
    notification_type: Option<String>,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    if title.trim().is_empty() {
        anyhow::bail!("title must not be empty");
    }

    let store = PgStore::connect(&config.database).await?;
    let result = store
        .create_notification(
            user_id,
            NewNotification {
                title,
                content,
                notification_type,
            },
        )
        .await;
    store.close().await;
    let notification = result?;

    output_success(
        output_format,
        &format!("Notification {} sent to user {}", notification.id, user_id),
        Some(json!({ "notification": notification })),
    )
}
