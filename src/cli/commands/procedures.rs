use serde_json::json;

use crate::cli::OutputFormat;
use crate::handlers::app_registry;

pub fn handle(output_format: OutputFormat) -> anyhow::Result<()> {
    let registry = app_registry()?;

    match output_format {
        OutputFormat::Json => {
            let entries: Vec<_> = registry
                .entries()
                .map(|p| {
                    json!({
                        "name": p.name(),
                        "kind": p.kind().as_str(),
                        "tier": p.tier().as_str(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&json!({ "procedures": entries }))?);
        }
        OutputFormat::Text => {
            println!("{:<32} {:<10} TIER", "PROCEDURE", "KIND");
            for p in registry.entries() {
                println!("{:<32} {:<10} {}", p.name(), p.kind().as_str(), p.tier());
            }
        }
    }
    Ok(())
}
