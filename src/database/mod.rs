pub mod memory;
pub mod models;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;

pub use memory::MemoryStore;
pub use models::*;
pub use postgres::PgStore;

/// Errors raised by a [`Store`] implementation
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    /// The write conflicts with the current state of the row (e.g. ending a finished game)
    #[error("Rejected: {0}")]
    Rejected(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl StoreError {
    /// Whether a driver error means the database could not be reached at all
    pub fn is_connectivity(err: &sqlx::Error) -> bool {
        matches!(
            err,
            sqlx::Error::Io(_)
                | sqlx::Error::Tls(_)
                | sqlx::Error::PoolTimedOut
                | sqlx::Error::PoolClosed
                | sqlx::Error::WorkerCrashed
        )
    }
}

/// Shared precondition for completing a game session
pub(crate) fn check_completable(session: &GameSession, result: &GameResult) -> Result<(), StoreError> {
    if session.status != GameStatus::Active {
        return Err(StoreError::Rejected(format!(
            "Game session {} is not active",
            session.id
        )));
    }
    if let Some(winner) = result.winner {
        if !session.participants.contains(&winner) {
            return Err(StoreError::Rejected(format!(
                "Winner {} is not a participant of game session {}",
                winner, session.id
            )));
        }
    }
    Ok(())
}

/// Persistence collaborator. Every method is a single store round trip from the caller's
/// perspective; multi-statement operations run in one transaction.
#[async_trait]
pub trait Store: Send + Sync {
    async fn health_check(&self) -> Result<(), StoreError>;

    /// Release pooled connections; called once on shutdown
    async fn close(&self);

    // Identities

    /// Insert on first sight of `open_id`, otherwise refresh mutable fields and `last_signed_in`.
    /// Atomic with respect to concurrent calls for the same `open_id`.
    async fn upsert_user(&self, user: UpsertUser) -> Result<User, StoreError>;

    async fn user_by_open_id(&self, open_id: &str) -> Result<Option<User>, StoreError>;

    async fn user_by_id(&self, id: i32) -> Result<Option<User>, StoreError>;

    async fn update_profile(&self, id: i32, update: ProfileUpdate) -> Result<Option<User>, StoreError>;

    // Lessons

    async fn create_lesson(&self, lesson: NewLesson) -> Result<Lesson, StoreError>;

    async fn lesson_by_id(&self, id: i32) -> Result<Option<Lesson>, StoreError>;

    /// Published lessons, newest first
    async fn published_lessons(&self) -> Result<Vec<Lesson>, StoreError>;

    async fn lessons_by_creator(&self, creator_id: i32) -> Result<Vec<Lesson>, StoreError>;

    // Progress and leaderboard

    async fn progress_for_user(&self, user_id: i32) -> Result<Vec<Progress>, StoreError>;

    /// Upsert progress on (user, lesson) and recompute the user's leaderboard row and XP total.
    /// Fails with `NotFound` when the lesson does not exist.
    async fn record_progress(
        &self,
        user_id: i32,
        lesson_id: i32,
        update: ProgressUpdate,
    ) -> Result<Progress, StoreError>;

    async fn leaderboard_top(&self, limit: i64) -> Result<Vec<LeaderboardEntry>, StoreError>;

    async fn leaderboard_entry(&self, user_id: i32) -> Result<Option<LeaderboardEntry>, StoreError>;

    // Reports

    async fn create_report(&self, report: NewReport) -> Result<Report, StoreError>;

    /// All reports, or those in `status`, newest first
    async fn list_reports(&self, status: Option<ReportStatus>) -> Result<Vec<Report>, StoreError>;

    async fn update_report_status(
        &self,
        report_id: i32,
        status: ReportStatus,
        reviewed_by: i32,
        notes: Option<String>,
    ) -> Result<Option<Report>, StoreError>;

    // Game sessions

    async fn create_game_session(&self, session: NewGameSession) -> Result<GameSession, StoreError>;

    /// Mark an active session completed. `NotFound` for unknown ids, `Rejected` when the session
    /// is no longer active or the winner is not a participant.
    async fn complete_game_session(&self, id: i32, result: GameResult) -> Result<GameSession, StoreError>;

    // Inventory

    async fn inventory_for_user(&self, user_id: i32) -> Result<Vec<InventoryItem>, StoreError>;

    async fn add_inventory_item(&self, user_id: i32, item: NewInventoryItem) -> Result<InventoryItem, StoreError>;

    // Notifications

    async fn create_notification(
        &self,
        user_id: i32,
        notification: NewNotification,
    ) -> Result<Notification, StoreError>;

    /// The user's notifications, newest first
    async fn user_notifications(&self, user_id: i32) -> Result<Vec<Notification>, StoreError>;

    /// Mark read only if the notification belongs to `user_id`
    async fn mark_notification_read(
        &self,
        user_id: i32,
        notification_id: i32,
    ) -> Result<Option<Notification>, StoreError>;
}
