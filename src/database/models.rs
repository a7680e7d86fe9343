use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::BTreeMap;

/// Role of an identity; drives the access tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
pub enum Role {
    User,
    Teacher,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Teacher => "teacher",
            Role::Admin => "admin",
        }
    }
}

/// Authenticated principal, unique on `open_id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i32,
    pub open_id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub login_method: Option<String>,
    pub role: Role,
    pub hydra_head_avatar: Option<String>,
    pub xp_points: i32,
    pub wellness_streak: i32,
    pub profile_completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_signed_in: DateTime<Utc>,
}

/// Insert-or-update payload keyed by `open_id`. `None` fields leave stored values untouched
/// on update; `role: None` means `user` on insert.
#[derive(Debug, Clone, Default)]
pub struct UpsertUser {
    pub open_id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub login_method: Option<String>,
    pub role: Option<Role>,
}

/// The only identity fields a client may change
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub hydra_head_avatar: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.hydra_head_avatar.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "lesson_tone", rename_all = "lowercase")]
pub enum Tone {
    Formal,
    Friendly,
    Humorous,
    Storytelling,
    Interactive,
}

impl Tone {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tone::Formal => "formal",
            Tone::Friendly => "friendly",
            Tone::Humorous => "humorous",
            Tone::Storytelling => "storytelling",
            Tone::Interactive => "interactive",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "lesson_difficulty", rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

/// Lesson body. Authored lessons carry markdown or structured sections; generated drafts keep
/// the raw backend text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "format", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum LessonContent {
    Markdown {
        body: String,
    },
    Structured {
        #[serde(default)]
        objectives: Vec<String>,
        #[serde(default)]
        sections: Vec<LessonSection>,
        #[serde(default)]
        pedagogical_bases: Vec<String>,
    },
    Generated {
        lesson_content: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LessonSection {
    pub heading: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub id: i32,
    pub created_by_id: i32,
    pub title: String,
    pub description: Option<String>,
    pub subject: String,
    pub age_group: String,
    pub tone: Tone,
    pub content: Option<LessonContent>,
    pub media_links: Vec<String>,
    pub difficulty: Difficulty,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewLesson {
    pub created_by_id: i32,
    pub title: String,
    pub description: Option<String>,
    pub subject: String,
    pub age_group: String,
    pub tone: Tone,
    pub content: Option<LessonContent>,
    pub media_links: Vec<String>,
    pub difficulty: Difficulty,
    pub is_published: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub id: i32,
    pub user_id: i32,
    pub lesson_id: i32,
    pub xp_earned: i32,
    pub completion_percentage: Decimal,
    pub streak: i32,
    pub last_activity_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial progress change; `None` keeps the stored value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressUpdate {
    pub xp_earned: Option<i32>,
    pub completion_percentage: Option<Decimal>,
    pub streak: Option<i32>,
    pub completed: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub user_id: i32,
    /// Competition rank by total XP; ties share a rank
    pub rank: i64,
    pub total_xp: i32,
    pub lessons_completed: i32,
    pub current_streak: i32,
    pub last_updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "report_status", rename_all = "lowercase")]
pub enum ReportStatus {
    #[default]
    Submitted,
    Reviewed,
    Resolved,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: i32,
    pub user_id: Option<i32>,
    pub is_anonymous: bool,
    pub report_type: String,
    pub encrypted_content: String,
    pub status: ReportStatus,
    pub reviewed_by: Option<i32>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A report ready to be written. Only constructible through [`NewReport::submitted_by`] so the
/// author reference always follows the anonymity flag.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReport {
    user_id: Option<i32>,
    is_anonymous: bool,
    report_type: String,
    encrypted_content: String,
}

impl NewReport {
    pub fn submitted_by(
        author: &User,
        report_type: String,
        encrypted_content: String,
        is_anonymous: bool,
    ) -> Self {
        Self {
            user_id: if is_anonymous { None } else { Some(author.id) },
            is_anonymous,
            report_type,
            encrypted_content,
        }
    }

    pub fn user_id(&self) -> Option<i32> {
        self.user_id
    }

    pub fn is_anonymous(&self) -> bool {
        self.is_anonymous
    }

    pub fn report_type(&self) -> &str {
        &self.report_type
    }

    pub fn encrypted_content(&self) -> &str {
        &self.encrypted_content
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "game_status", rename_all = "lowercase")]
pub enum GameStatus {
    #[default]
    Active,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSession {
    pub id: i32,
    pub game_type: String,
    pub participants: Vec<i32>,
    pub status: GameStatus,
    pub winner: Option<i32>,
    pub scores: Option<BTreeMap<String, i64>>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewGameSession {
    pub game_type: String,
    pub participants: Vec<i32>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GameResult {
    pub winner: Option<i32>,
    pub scores: Option<BTreeMap<String, i64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: i32,
    pub user_id: i32,
    pub item_id: String,
    pub item_name: String,
    pub item_type: Option<String>,
    pub quantity: i32,
    pub acquired_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewInventoryItem {
    pub item_id: String,
    pub item_name: String,
    pub item_type: Option<String>,
    pub quantity: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: i32,
    pub user_id: i32,
    pub title: String,
    pub content: Option<String>,
    #[serde(rename = "type")]
    pub notification_type: Option<String>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    pub title: String,
    pub content: Option<String>,
    pub notification_type: Option<String>,
}
