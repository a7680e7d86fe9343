//! External login: code exchange against the identity provider, then identity upsert.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use super::SessionCodec;
use crate::config::OAuthConfig;
use crate::database::{Role, Store, UpsertUser, User};
use crate::error::RpcError;

const EXCHANGE_TOKEN_PATH: &str = "/webdev.v1.WebDevAuthPublicService/ExchangeToken";
const GET_USER_INFO_PATH: &str = "/webdev.v1.WebDevAuthPublicService/GetUserInfo";

#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("Login provider is not configured")]
    NotConfigured,

    #[error("Invalid state parameter")]
    InvalidState,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Provider rejected the request: {0}")]
    Provider(String),
}

impl From<OAuthError> for RpcError {
    fn from(err: OAuthError) -> Self {
        match err {
            OAuthError::InvalidState => RpcError::bad_input("Invalid state parameter"),
            other => {
                tracing::error!("Login provider error: {}", other);
                RpcError::upstream_unavailable("Login provider is temporarily unavailable")
            }
        }
    }
}

/// Profile returned by the identity provider
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalProfile {
    pub open_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, alias = "platform")]
    pub login_method: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExchangeTokenRequest<'a> {
    client_id: &'a str,
    grant_type: &'static str,
    code: &'a str,
    redirect_uri: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExchangeTokenResponse {
    access_token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UserInfoRequest<'a> {
    access_token: &'a str,
}

pub struct OAuthClient {
    client: Client,
    server_url: String,
    app_id: String,
}

impl OAuthClient {
    /// `Ok(None)` when no provider URL is configured
    pub fn from_config(config: &OAuthConfig) -> Result<Option<Self>, OAuthError> {
        let Some(server_url) = &config.server_url else {
            return Ok(None);
        };

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| OAuthError::Network(e.to_string()))?;

        Ok(Some(Self {
            client,
            server_url: server_url.trim_end_matches('/').to_string(),
            app_id: config.app_id.clone(),
        }))
    }

    pub async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<String, OAuthError> {
        let body = ExchangeTokenRequest {
            client_id: &self.app_id,
            grant_type: "authorization_code",
            code,
            redirect_uri,
        };
        let response: ExchangeTokenResponse = self.post(EXCHANGE_TOKEN_PATH, &body).await?;
        Ok(response.access_token)
    }

    pub async fn user_info(&self, access_token: &str) -> Result<ExternalProfile, OAuthError> {
        let profile: ExternalProfile = self
            .post(GET_USER_INFO_PATH, &UserInfoRequest { access_token })
            .await?;
        if profile.open_id.trim().is_empty() {
            return Err(OAuthError::Provider("profile has no openId".to_string()));
        }
        Ok(profile)
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R, OAuthError>
    where
        B: Serialize + ?Sized,
        R: for<'de> Deserialize<'de>,
    {
        let response = self
            .client
            .post(format!("{}{}", self.server_url, path))
            .json(body)
            .send()
            .await
            .map_err(|e| OAuthError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(OAuthError::Provider(format!("HTTP {}: {}", status, text)));
        }

        response
            .json()
            .await
            .map_err(|e| OAuthError::Provider(format!("unreadable response: {}", e)))
    }
}

/// The redirect URI encoded in the `state` parameter
pub fn decode_state(state: &str) -> Result<String, OAuthError> {
    let bytes = STANDARD.decode(state.trim()).map_err(|_| OAuthError::InvalidState)?;
    String::from_utf8(bytes).map_err(|_| OAuthError::InvalidState)
}

/// Upsert payload for a login. The owner is always promoted to admin; everyone else keeps
/// their stored role.
pub fn login_upsert(profile: &ExternalProfile, owner_open_id: Option<&str>) -> UpsertUser {
    let is_owner = owner_open_id.is_some_and(|owner| owner == profile.open_id);
    UpsertUser {
        open_id: profile.open_id.clone(),
        name: profile.name.clone(),
        email: profile.email.clone(),
        login_method: profile.login_method.clone(),
        role: is_owner.then_some(Role::Admin),
    }
}

/// Record the login and mint a session token for it
pub async fn complete_login(
    store: &dyn Store,
    codec: &SessionCodec,
    owner_open_id: Option<&str>,
    profile: &ExternalProfile,
) -> Result<(User, String), RpcError> {
    let user = store.upsert_user(login_upsert(profile, owner_open_id)).await?;
    let token = codec
        .issue(&user.open_id, user.name.as_deref().unwrap_or_default())
        .map_err(|e| {
            tracing::error!("Failed to issue session token: {}", e);
            RpcError::internal("Failed to create session")
        })?;

    tracing::info!(user_id = user.id, role = user.role.as_str(), "User signed in");
    Ok((user, token))
}
