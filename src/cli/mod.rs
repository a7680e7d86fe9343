pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;

#[derive(Parser)]
#[command(name = "hydra")]
#[command(about = "Hydra CLI - operator tooling for the HydraLearn API")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "List every registered procedure with its kind and access tier")]
    Procedures,

    #[command(about = "Apply embedded database migrations to DATABASE_URL")]
    Migrate,

    #[command(about = "Mint a session token for an existing identity (development helper)")]
    Token {
        #[arg(long, help = "External identifier (openId) of the identity")]
        open_id: String,
        #[arg(long, help = "Display name embedded in the token")]
        name: Option<String>,
    },

    #[command(about = "Send a notification to a user")]
    Notify {
        #[arg(long, help = "Numeric id of the recipient")]
        user_id: i32,
        #[arg(long, help = "Notification title")]
        title: String,
        #[arg(long, help = "Notification body")]
        content: Option<String>,
        #[arg(long = "type", help = "Notification type, e.g. achievement or reminder")]
        notification_type: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);
    let config = AppConfig::from_env();
    config.validate()?;

    match cli.command {
        Commands::Procedures => commands::procedures::handle(output_format),
        Commands::Migrate => commands::migrate::handle(&config, output_format).await,
        Commands::Token { open_id, name } => {
            commands::token::handle(&config, &open_id, name.as_deref(), output_format)
        }
        Commands::Notify {
            user_id,
            title,
            content,
            notification_type,
        } => {
            commands::notify::handle(&config, user_id, title, content, notification_type, output_format).await
        }
    }
}
