//! Fixtures shared by unit tests.

use chrono::Utc;
use std::sync::Arc;

use crate::auth::SessionCodec;
use crate::config::AppConfig;
use crate::database::{MemoryStore, Role, User};
use crate::llm::MockGenerator;
use crate::state::AppState;

/// A detached identity record with the given role
pub fn user_with_role(role: Role) -> User {
    let now = Utc::now();
    User {
        id: 1,
        open_id: format!("test-{}", role.as_str()),
        name: Some(format!("Test {}", role.as_str())),
        email: None,
        login_method: None,
        role,
        hydra_head_avatar: None,
        xp_points: 0,
        wellness_streak: 0,
        profile_completed: false,
        created_at: now,
        updated_at: now,
        last_signed_in: now,
    }
}

/// Development configuration over an empty in-memory store and a canned generator
pub fn test_state() -> AppState {
    let config = AppConfig::development();
    let sessions = SessionCodec::new(&config.session, &config.oauth.app_id)
        .expect("development session config is valid");
    AppState::new(
        Arc::new(MemoryStore::new()),
        Arc::new(MockGenerator::default()),
        config,
        sessions,
    )
}
