// Domain handlers, one module per procedure namespace.
//
// Handlers receive decoded, validated input and an already-guarded context; they shape a store
// or text-generation call and reshape its result. `app_registry` is the only place that ties a
// handler to its name and access tier.

pub mod ai;
pub mod auth;
pub mod game;
pub mod inventory;
pub mod leaderboard;
pub mod lesson;
pub mod notification;
pub mod progress;
pub mod report;
pub mod user;

use serde::Serialize;

use crate::rpc::{AccessTier, Namespace, Registry, RegistryError};

/// `{ "success": true }` acknowledgement
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Ack {
    pub success: bool,
}

impl Ack {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

/// Every procedure the service exposes
pub fn app_registry() -> Result<Registry, RegistryError> {
    use AccessTier::*;
    use Namespace as Ns;

    Registry::builder()
        // auth
        .query(Ns::Auth, "me", Public, auth::me)
        .mutation(Ns::Auth, "logout", Public, auth::logout)
        // user
        .query(Ns::User, "profile", Authenticated, user::profile)
        .mutation(Ns::User, "updateProfile", Authenticated, user::update_profile)
        // lesson
        .query(Ns::Lesson, "list", Public, lesson::list)
        .query(Ns::Lesson, "get", Public, lesson::get)
        .query(Ns::Lesson, "myLessons", TeacherOrAdmin, lesson::my_lessons)
        .mutation(Ns::Lesson, "create", TeacherOrAdmin, lesson::create)
        .mutation(Ns::Lesson, "generateWithAI", TeacherOrAdmin, lesson::generate_with_ai)
        // progress
        .query(Ns::Progress, "getUserProgress", Authenticated, progress::get_user_progress)
        .mutation(Ns::Progress, "updateProgress", Authenticated, progress::update_progress)
        // leaderboard
        .query(Ns::Leaderboard, "getTop", Public, leaderboard::get_top)
        .query(Ns::Leaderboard, "getUserRank", Public, leaderboard::get_user_rank)
        // report
        .mutation(Ns::Report, "create", Authenticated, report::create)
        .query(Ns::Report, "list", AdminOnly, report::list)
        .mutation(Ns::Report, "updateStatus", AdminOnly, report::update_status)
        // game
        .mutation(Ns::Game, "startSession", Authenticated, game::start_session)
        .mutation(Ns::Game, "endSession", Authenticated, game::end_session)
        // inventory
        .query(Ns::Inventory, "getItems", Authenticated, inventory::get_items)
        .mutation(Ns::Inventory, "addItem", Authenticated, inventory::add_item)
        // notification
        .query(Ns::Notification, "list", Authenticated, notification::list)
        .mutation(Ns::Notification, "markAsRead", Authenticated, notification::mark_as_read)
        // ai
        .mutation(Ns::Ai, "generateActivity", TeacherOrAdmin, ai::generate_activity)
        .mutation(Ns::Ai, "chatWithSidekick", Authenticated, ai::chat_with_sidekick)
        .build()
}
