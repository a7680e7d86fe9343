use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub session: SessionConfig,
    pub oauth: OAuthConfig,
    pub llm: LlmConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Absent only in development, where the in-memory store is used instead
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
    pub run_migrations: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub cookie_name: String,
    pub expiry_hours: u64,
    pub secure_cookie: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthConfig {
    pub server_url: Option<String>,
    pub app_id: String,
    /// External identifier that is always given the admin role on login
    pub owner_open_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub api_url: Option<String>,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
    pub max_tokens: u32,
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Missing configuration: {0}")]
    Missing(&'static str),

    #[error("Invalid configuration for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (environment, tests)
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = match lookup("APP_ENV").as_deref() {
            Some("production") | Some("prod") => Environment::Production,
            Some("staging") | Some("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_overrides(lookup)
    }

    fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        // Server overrides
        if let Some(v) = lookup("HYDRA_API_PORT").or_else(|| lookup("PORT")) {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }
        if let Some(v) = lookup("CORS_ORIGINS") {
            self.server.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        // Database overrides
        if let Some(v) = lookup("DATABASE_URL") {
            self.database.url = Some(v).filter(|v| !v.trim().is_empty());
        }
        if let Some(v) = lookup("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Some(v) = lookup("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }
        if let Some(v) = lookup("DATABASE_RUN_MIGRATIONS") {
            self.database.run_migrations = v.parse().unwrap_or(self.database.run_migrations);
        }

        // Session overrides
        if let Some(v) = lookup("JWT_SECRET") {
            self.session.jwt_secret = v;
        }
        if let Some(v) = lookup("SESSION_COOKIE_NAME") {
            self.session.cookie_name = v;
        }
        if let Some(v) = lookup("SESSION_EXPIRY_HOURS") {
            self.session.expiry_hours = v.parse().unwrap_or(self.session.expiry_hours);
        }
        if let Some(v) = lookup("SESSION_SECURE_COOKIE") {
            self.session.secure_cookie = v.parse().unwrap_or(self.session.secure_cookie);
        }

        // OAuth overrides
        if let Some(v) = lookup("OAUTH_SERVER_URL") {
            self.oauth.server_url = Some(v).filter(|v| !v.trim().is_empty());
        }
        if let Some(v) = lookup("OAUTH_APP_ID").or_else(|| lookup("VITE_APP_ID")) {
            self.oauth.app_id = v;
        }
        if let Some(v) = lookup("OWNER_OPEN_ID") {
            self.oauth.owner_open_id = Some(v).filter(|v| !v.trim().is_empty());
        }

        // LLM overrides
        if let Some(v) = lookup("LLM_API_URL") {
            self.llm.api_url = Some(v).filter(|v| !v.trim().is_empty());
        }
        if let Some(v) = lookup("LLM_API_KEY") {
            self.llm.api_key = Some(v).filter(|v| !v.trim().is_empty());
        }
        if let Some(v) = lookup("LLM_MODEL") {
            self.llm.model = v;
        }
        if let Some(v) = lookup("LLM_TIMEOUT_SECS") {
            self.llm.timeout_secs = v.parse().unwrap_or(self.llm.timeout_secs);
        }
        if let Some(v) = lookup("LLM_MAX_TOKENS") {
            self.llm.max_tokens = v.parse().unwrap_or(self.llm.max_tokens);
        }

        self
    }

    /// Reject configurations that would run insecurely or without a database outside development
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session.jwt_secret.trim().is_empty() {
            return Err(ConfigError::Missing("JWT_SECRET"));
        }
        if self.environment != Environment::Development {
            if self.database.url.is_none() {
                return Err(ConfigError::Missing("DATABASE_URL"));
            }
            if self.session.jwt_secret.len() < 32 {
                return Err(ConfigError::Invalid {
                    key: "JWT_SECRET",
                    reason: "must be at least 32 characters outside development".to_string(),
                });
            }
        }
        if let Some(url) = &self.llm.api_url {
            url::Url::parse(url).map_err(|e| ConfigError::Invalid {
                key: "LLM_API_URL",
                reason: e.to_string(),
            })?;
        }
        if let Some(url) = &self.oauth.server_url {
            url::Url::parse(url).map_err(|e| ConfigError::Invalid {
                key: "OAUTH_SERVER_URL",
                reason: e.to_string(),
            })?;
        }
        Ok(())
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                port: 3000,
                cors_origins: vec![
                    "http://localhost:3000".to_string(),
                    "http://localhost:5173".to_string(),
                ],
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 30,
                run_migrations: true,
            },
            session: SessionConfig {
                jwt_secret: "hydralearn-development-secret".to_string(),
                cookie_name: "app_session_id".to_string(),
                expiry_hours: 24 * 365,
                secure_cookie: false,
            },
            oauth: OAuthConfig {
                server_url: None,
                app_id: "hydralearn-dev".to_string(),
                owner_open_id: None,
            },
            llm: LlmConfig {
                api_url: None,
                api_key: None,
                model: "gpt-4o-mini".to_string(),
                timeout_secs: 120,
                max_tokens: 2048,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                port: 3000,
                cors_origins: vec!["https://staging.hydralearn.app".to_string()],
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                connection_timeout: 10,
                run_migrations: true,
            },
            session: SessionConfig {
                jwt_secret: String::new(),
                cookie_name: "app_session_id".to_string(),
                expiry_hours: 24 * 30,
                secure_cookie: true,
            },
            oauth: OAuthConfig {
                server_url: None,
                app_id: String::new(),
                owner_open_id: None,
            },
            llm: LlmConfig {
                api_url: None,
                api_key: None,
                model: "gpt-4o-mini".to_string(),
                timeout_secs: 90,
                max_tokens: 2048,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                port: 3000,
                cors_origins: vec!["https://hydralearn.app".to_string()],
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 50,
                connection_timeout: 5,
                run_migrations: false,
            },
            session: SessionConfig {
                jwt_secret: String::new(),
                cookie_name: "app_session_id".to_string(),
                expiry_hours: 24 * 365,
                secure_cookie: true,
            },
            oauth: OAuthConfig {
                server_url: None,
                app_id: String::new(),
                owner_open_id: None,
            },
            llm: LlmConfig {
                api_url: None,
                api_key: None,
                model: "gpt-4o-mini".to_string(),
                timeout_secs: 60,
                max_tokens: 2048,
            },
        }
    }
}
