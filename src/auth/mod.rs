pub mod context;
pub mod oauth;

use axum::http::{header, HeaderMap};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SessionConfig;

pub use context::{resolve, RequestContext, SessionControl};

/// Claims carried by the session token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionClaims {
    pub open_id: String,
    pub app_id: String,
    #[serde(default)]
    pub name: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session secret is not configured")]
    InvalidSecret,

    #[error("Token generation failed: {0}")]
    Encode(String),

    #[error("Invalid session token: {0}")]
    Invalid(String),
}

/// Issues and verifies HS256 session tokens
pub struct SessionCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    app_id: String,
    cookie_name: String,
    expiry_hours: u64,
    secure_cookie: bool,
}

impl SessionCodec {
    pub fn new(config: &SessionConfig, app_id: &str) -> Result<Self, SessionError> {
        if config.jwt_secret.is_empty() {
            return Err(SessionError::InvalidSecret);
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            app_id: app_id.to_string(),
            cookie_name: config.cookie_name.clone(),
            expiry_hours: config.expiry_hours,
            secure_cookie: config.secure_cookie,
        })
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    pub fn issue(&self, open_id: &str, name: &str) -> Result<String, SessionError> {
        let now = Utc::now();
        let claims = SessionClaims {
            open_id: open_id.to_string(),
            app_id: self.app_id.clone(),
            name: name.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(self.expiry_hours as i64)).timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| SessionError::Encode(e.to_string()))
    }

    pub fn verify(&self, token: &str) -> Result<SessionClaims, SessionError> {
        let claims = decode::<SessionClaims>(token, &self.decoding_key, &Validation::default())
            .map_err(|e| SessionError::Invalid(e.to_string()))?
            .claims;

        if claims.open_id.trim().is_empty() {
            return Err(SessionError::Invalid("empty openId".to_string()));
        }
        if claims.app_id != self.app_id {
            return Err(SessionError::Invalid("token issued for another app".to_string()));
        }
        Ok(claims)
    }

    /// `Set-Cookie` value that stores a freshly issued token
    pub fn session_cookie(&self, token: &str) -> String {
        let max_age = self.expiry_hours * 3600;
        let mut cookie = format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            self.cookie_name, token, max_age
        );
        if self.secure_cookie {
            cookie.push_str("; Secure");
        }
        cookie
    }

    /// `Set-Cookie` value that makes the client drop the session
    pub fn clear_cookie(&self) -> String {
        let mut cookie = format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", self.cookie_name);
        if self.secure_cookie {
            cookie.push_str("; Secure");
        }
        cookie
    }

    /// Session token from the cookie, falling back to a bearer header
    pub fn token_from_headers(&self, headers: &HeaderMap) -> Option<String> {
        read_cookie(headers, &self.cookie_name).or_else(|| bearer_token(headers))
    }
}

/// Value of cookie `name` across all `Cookie` headers
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, value)| *key == name && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use axum::http::HeaderValue;

    fn codec() -> SessionCodec {
        let config = AppConfig::development();
        SessionCodec::new(&config.session, &config.oauth.app_id).unwrap()
    }

    #[test]
    fn issued_tokens_verify() {
        let codec = codec();
        let token = codec.issue("open-1", "Ada").unwrap();
        let claims = codec.verify(&token).unwrap();
        assert_eq!(claims.open_id, "open-1");
        assert_eq!(claims.name, "Ada");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn tampered_and_foreign_tokens_are_rejected() {
        let codec = codec();
        let token = codec.issue("open-1", "Ada").unwrap();
        assert!(codec.verify(&format!("{}x", token)).is_err());
        assert!(codec.verify("not-a-token").is_err());

        let mut config = AppConfig::development();
        config.session.jwt_secret = "another-secret".to_string();
        let other = SessionCodec::new(&config.session, &config.oauth.app_id).unwrap();
        assert!(other.verify(&token).is_err());

        let other_app = SessionCodec::new(&AppConfig::development().session, "other-app").unwrap();
        assert!(other_app.verify(&token).is_err());
    }

    #[test]
    fn cookie_takes_precedence_over_bearer() {
        let codec = codec();
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));
        assert_eq!(codec.token_from_headers(&headers).as_deref(), Some("from-header"));

        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; app_session_id=from-cookie"),
        );
        assert_eq!(codec.token_from_headers(&headers).as_deref(), Some("from-cookie"));
    }

    #[test]
    fn clear_cookie_expires_immediately() {
        let cookie = codec().clear_cookie();
        assert!(cookie.starts_with("app_session_id=;"));
        assert!(cookie.contains("Max-Age=0"));
        assert!(codec().session_cookie("t").contains("HttpOnly"));
    }

    #[test]
    fn empty_secret_is_rejected() {
        let mut config = AppConfig::development();
        config.session.jwt_secret.clear();
        assert!(matches!(
            SessionCodec::new(&config.session, "app"),
            Err(SessionError::InvalidSecret)
        ));
    }
}
