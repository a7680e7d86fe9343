use serde_json::json;

use crate::auth::SessionCodec;
use crate::cli::output::output_success;
use crate::cli::OutputFormat;
use crate::config::AppConfig;

pub fn handle(
    config: &AppConfig,
    open_id: &str,
    name: Option<&str>,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    let codec = SessionCodec::new(&config.session, &config.oauth.app_id)?;
    let token = codec.issue(open_id, name.unwrap_or_default())?;

    match output_format {
        OutputFormat::Json => output_success(
            output_format,
            "Session token issued",
            Some(json!({
                "token": token,
                "cookie": codec.cookie_name(),
                "expires_in_hours": config.session.expiry_hours,
            })),
        ),
        OutputFormat::Text => {
            println!("{}", token);
            Ok(())
        }
    }
}
