use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

use super::models::*;
use super::{check_completable, Store, StoreError};

/// In-process store with the same semantics as [`super::PgStore`]. Each operation takes the
/// table lock once, so upserts are atomic just like their SQL counterparts.
pub struct MemoryStore {
    tables: RwLock<Tables>,
    available: AtomicBool,
}

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    lessons: Vec<Lesson>,
    progress: Vec<Progress>,
    leaderboard: HashMap<i32, LeaderboardRow>,
    reports: Vec<Report>,
    game_sessions: Vec<GameSession>,
    inventory: Vec<InventoryItem>,
    notifications: Vec<Notification>,
    sequence: i32,
}

#[derive(Clone)]
struct LeaderboardRow {
    total_xp: i32,
    lessons_completed: i32,
    current_streak: i32,
    last_updated_at: DateTime<Utc>,
}

impl Tables {
    fn next_id(&mut self) -> i32 {
        self.sequence += 1;
        self.sequence
    }

    fn rank_of(&self, total_xp: i32) -> i64 {
        1 + self
            .leaderboard
            .values()
            .filter(|row| row.total_xp > total_xp)
            .count() as i64
    }

    fn entry(&self, user_id: i32, row: &LeaderboardRow) -> LeaderboardEntry {
        LeaderboardEntry {
            user_id,
            rank: self.rank_of(row.total_xp),
            total_xp: row.total_xp,
            lessons_completed: row.lessons_completed,
            current_streak: row.current_streak,
            last_updated_at: row.last_updated_at,
        }
    }

    /// Leaderboard row for `user_id` as it would be with `candidate` stored in place of the
    /// user's current row for the same lesson. `Rejected` when the XP total leaves the `i32` range.
    fn leaderboard_row(
        &self,
        user_id: i32,
        candidate: &Progress,
        now: DateTime<Utc>,
    ) -> Result<LeaderboardRow, StoreError> {
        let rows = self
            .progress
            .iter()
            .filter(|p| p.user_id == user_id && p.lesson_id != candidate.lesson_id)
            .chain(std::iter::once(candidate));

        let mut row = LeaderboardRow {
            total_xp: 0,
            lessons_completed: 0,
            current_streak: 0,
            last_updated_at: now,
        };
        for p in rows {
            row.total_xp = row.total_xp.checked_add(p.xp_earned).ok_or_else(|| {
                StoreError::Rejected(format!("XP total for user {} is out of range", user_id))
            })?;
            row.lessons_completed += i32::from(p.completed_at.is_some());
            row.current_streak = row.current_streak.max(p.streak);
        }
        Ok(row)
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            available: AtomicBool::new(true),
        }
    }

    /// Simulate the database going away (or coming back)
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    fn ensure_available(&self) -> Result<(), StoreError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable("in-memory store is offline".to_string()))
        }
    }

    pub async fn user_count(&self) -> usize {
        self.tables.read().await.users.len()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn newest_first<T, F>(items: &mut [T], key: F)
where
    F: Fn(&T) -> (DateTime<Utc>, i32),
{
    items.sort_by(|a, b| key(b).cmp(&key(a)));
}

#[async_trait]
impl Store for MemoryStore {
    async fn health_check(&self) -> Result<(), StoreError> {
        self.ensure_available()
    }

    async fn close(&self) {
        self.set_available(false);
    }

    async fn upsert_user(&self, user: UpsertUser) -> Result<User, StoreError> {
        self.ensure_available()?;
        let now = Utc::now();
        let mut tables = self.tables.write().await;

        if let Some(existing) = tables.users.iter_mut().find(|u| u.open_id == user.open_id) {
            if user.name.is_some() {
                existing.name = user.name;
            }
            if user.email.is_some() {
                existing.email = user.email;
            }
            if user.login_method.is_some() {
                existing.login_method = user.login_method;
            }
            if let Some(role) = user.role {
                existing.role = role;
            }
            existing.last_signed_in = now;
            existing.updated_at = now;
            return Ok(existing.clone());
        }

        let id = tables.next_id();
        let created = User {
            id,
            open_id: user.open_id,
            name: user.name,
            email: user.email,
            login_method: user.login_method,
            role: user.role.unwrap_or(Role::User),
            hydra_head_avatar: None,
            xp_points: 0,
            wellness_streak: 0,
            profile_completed: false,
            created_at: now,
            updated_at: now,
            last_signed_in: now,
        };
        tables.users.push(created.clone());
        Ok(created)
    }

    async fn user_by_open_id(&self, open_id: &str) -> Result<Option<User>, StoreError> {
        self.ensure_available()?;
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.open_id == open_id).cloned())
    }

    async fn user_by_id(&self, id: i32) -> Result<Option<User>, StoreError> {
        self.ensure_available()?;
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn update_profile(&self, id: i32, update: ProfileUpdate) -> Result<Option<User>, StoreError> {
        self.ensure_available()?;
        let mut tables = self.tables.write().await;
        let Some(user) = tables.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        if update.is_empty() {
            return Ok(Some(user.clone()));
        }
        if update.name.is_some() {
            user.name = update.name;
        }
        if update.hydra_head_avatar.is_some() {
            user.hydra_head_avatar = update.hydra_head_avatar;
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn create_lesson(&self, lesson: NewLesson) -> Result<Lesson, StoreError> {
        self.ensure_available()?;
        let now = Utc::now();
        let mut tables = self.tables.write().await;
        let id = tables.next_id();
        let created = Lesson {
            id,
            created_by_id: lesson.created_by_id,
            title: lesson.title,
            description: lesson.description,
            subject: lesson.subject,
            age_group: lesson.age_group,
            tone: lesson.tone,
            content: lesson.content,
            media_links: lesson.media_links,
            difficulty: lesson.difficulty,
            is_published: lesson.is_published,
            created_at: now,
            updated_at: now,
        };
        tables.lessons.push(created.clone());
        Ok(created)
    }

    async fn lesson_by_id(&self, id: i32) -> Result<Option<Lesson>, StoreError> {
        self.ensure_available()?;
        let tables = self.tables.read().await;
        Ok(tables.lessons.iter().find(|l| l.id == id).cloned())
    }

    async fn published_lessons(&self) -> Result<Vec<Lesson>, StoreError> {
        self.ensure_available()?;
        let tables = self.tables.read().await;
        let mut lessons: Vec<Lesson> = tables.lessons.iter().filter(|l| l.is_published).cloned().collect();
        newest_first(&mut lessons, |l| (l.created_at, l.id));
        Ok(lessons)
    }

    async fn lessons_by_creator(&self, creator_id: i32) -> Result<Vec<Lesson>, StoreError> {
        self.ensure_available()?;
        let tables = self.tables.read().await;
        let mut lessons: Vec<Lesson> = tables
            .lessons
            .iter()
            .filter(|l| l.created_by_id == creator_id)
            .cloned()
            .collect();
        newest_first(&mut lessons, |l| (l.created_at, l.id));
        Ok(lessons)
    }

    async fn progress_for_user(&self, user_id: i32) -> Result<Vec<Progress>, StoreError> {
        self.ensure_available()?;
        let tables = self.tables.read().await;
        let mut rows: Vec<Progress> = tables.progress.iter().filter(|p| p.user_id == user_id).cloned().collect();
        rows.sort_by_key(|p| p.lesson_id);
        Ok(rows)
    }

    async fn record_progress(
        &self,
        user_id: i32,
        lesson_id: i32,
        update: ProgressUpdate,
    ) -> Result<Progress, StoreError> {
        self.ensure_available()?;
        let now = Utc::now();
        let mut tables = self.tables.write().await;

        if !tables.lessons.iter().any(|l| l.id == lesson_id) {
            return Err(StoreError::NotFound(format!("Lesson {} not found", lesson_id)));
        }

        let position = tables
            .progress
            .iter()
            .position(|p| p.user_id == user_id && p.lesson_id == lesson_id);

        let mut progress = match position {
            Some(index) => tables.progress[index].clone(),
            None => Progress {
                id: 0,
                user_id,
                lesson_id,
                xp_earned: 0,
                completion_percentage: Default::default(),
                streak: 0,
                last_activity_at: now,
                completed_at: None,
                created_at: now,
                updated_at: now,
            },
        };
        if let Some(xp) = update.xp_earned {
            progress.xp_earned = xp;
        }
        if let Some(pct) = update.completion_percentage {
            progress.completion_percentage = pct;
        }
        if let Some(streak) = update.streak {
            progress.streak = streak;
        }
        match update.completed {
            Some(true) => progress.completed_at = progress.completed_at.or(Some(now)),
            Some(false) => progress.completed_at = None,
            None => {}
        }
        progress.last_activity_at = now;
        progress.updated_at = now;

        // Nothing is written unless the recomputed totals are valid
        let leaderboard = tables.leaderboard_row(user_id, &progress, now)?;
        let total_xp = leaderboard.total_xp;

        match position {
            Some(index) => tables.progress[index] = progress.clone(),
            None => {
                progress.id = tables.next_id();
                tables.progress.push(progress.clone());
            }
        }
        tables.leaderboard.insert(user_id, leaderboard);
        if let Some(user) = tables.users.iter_mut().find(|u| u.id == user_id) {
            user.xp_points = total_xp;
            user.updated_at = now;
        }

        Ok(progress)
    }

    async fn leaderboard_top(&self, limit: i64) -> Result<Vec<LeaderboardEntry>, StoreError> {
        self.ensure_available()?;
        let tables = self.tables.read().await;
        let mut entries: Vec<LeaderboardEntry> = tables
            .leaderboard
            .iter()
            .map(|(user_id, row)| tables.entry(*user_id, row))
            .collect();
        entries.sort_by(|a, b| b.total_xp.cmp(&a.total_xp).then(a.user_id.cmp(&b.user_id)));
        entries.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(entries)
    }

    async fn leaderboard_entry(&self, user_id: i32) -> Result<Option<LeaderboardEntry>, StoreError> {
        self.ensure_available()?;
        let tables = self.tables.read().await;
        Ok(tables.leaderboard.get(&user_id).map(|row| tables.entry(user_id, row)))
    }

    async fn create_report(&self, report: NewReport) -> Result<Report, StoreError> {
        self.ensure_available()?;
        let now = Utc::now();
        let mut tables = self.tables.write().await;
        let id = tables.next_id();
        let created = Report {
            id,
            user_id: report.user_id(),
            is_anonymous: report.is_anonymous(),
            report_type: report.report_type().to_string(),
            encrypted_content: report.encrypted_content().to_string(),
            status: ReportStatus::Submitted,
            reviewed_by: None,
            notes: None,
            created_at: now,
            updated_at: now,
        };
        tables.reports.push(created.clone());
        Ok(created)
    }

    async fn list_reports(&self, status: Option<ReportStatus>) -> Result<Vec<Report>, StoreError> {
        self.ensure_available()?;
        let tables = self.tables.read().await;
        let mut reports: Vec<Report> = tables
            .reports
            .iter()
            .filter(|r| status.map_or(true, |s| r.status == s))
            .cloned()
            .collect();
        newest_first(&mut reports, |r| (r.created_at, r.id));
        Ok(reports)
    }

    async fn update_report_status(
        &self,
        report_id: i32,
        status: ReportStatus,
        reviewed_by: i32,
        notes: Option<String>,
    ) -> Result<Option<Report>, StoreError> {
        self.ensure_available()?;
        let mut tables = self.tables.write().await;
        let Some(report) = tables.reports.iter_mut().find(|r| r.id == report_id) else {
            return Ok(None);
        };
        report.status = status;
        report.reviewed_by = Some(reviewed_by);
        if notes.is_some() {
            report.notes = notes;
        }
        report.updated_at = Utc::now();
        Ok(Some(report.clone()))
    }

    async fn create_game_session(&self, session: NewGameSession) -> Result<GameSession, StoreError> {
        self.ensure_available()?;
        let mut tables = self.tables.write().await;
        let id = tables.next_id();
        let created = GameSession {
            id,
            game_type: session.game_type,
            participants: session.participants,
            status: GameStatus::Active,
            winner: None,
            scores: None,
            created_at: Utc::now(),
            completed_at: None,
        };
        tables.game_sessions.push(created.clone());
        Ok(created)
    }

    async fn complete_game_session(&self, id: i32, result: GameResult) -> Result<GameSession, StoreError> {
        self.ensure_available()?;
        let mut tables = self.tables.write().await;
        let session = tables
            .game_sessions
            .iter_mut()
            .find(|g| g.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("Game session {} not found", id)))?;

        check_completable(session, &result)?;

        session.status = GameStatus::Completed;
        session.winner = result.winner;
        session.scores = result.scores;
        session.completed_at = Some(Utc::now());
        Ok(session.clone())
    }

    async fn inventory_for_user(&self, user_id: i32) -> Result<Vec<InventoryItem>, StoreError> {
        self.ensure_available()?;
        let tables = self.tables.read().await;
        Ok(tables.inventory.iter().filter(|i| i.user_id == user_id).cloned().collect())
    }

    async fn add_inventory_item(&self, user_id: i32, item: NewInventoryItem) -> Result<InventoryItem, StoreError> {
        self.ensure_available()?;
        let mut tables = self.tables.write().await;
        let id = tables.next_id();
        let created = InventoryItem {
            id,
            user_id,
            item_id: item.item_id,
            item_name: item.item_name,
            item_type: item.item_type,
            quantity: item.quantity,
            acquired_at: Utc::now(),
        };
        tables.inventory.push(created.clone());
        Ok(created)
    }

    async fn create_notification(
        &self,
        user_id: i32,
        notification: NewNotification,
    ) -> Result<Notification, StoreError> {
        self.ensure_available()?;
        let mut tables = self.tables.write().await;
        let id = tables.next_id();
        let created = Notification {
            id,
            user_id,
            title: notification.title,
            content: notification.content,
            notification_type: notification.notification_type,
            is_read: false,
            created_at: Utc::now(),
        };
        tables.notifications.push(created.clone());
        Ok(created)
    }

    async fn user_notifications(&self, user_id: i32) -> Result<Vec<Notification>, StoreError> {
        self.ensure_available()?;
        let tables = self.tables.read().await;
        let mut rows: Vec<Notification> = tables
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect();
        newest_first(&mut rows, |n| (n.created_at, n.id));
        Ok(rows)
    }

    async fn mark_notification_read(
        &self,
        user_id: i32,
        notification_id: i32,
    ) -> Result<Option<Notification>, StoreError> {
        self.ensure_available()?;
        let mut tables = self.tables.write().await;
        let found = tables
            .notifications
            .iter_mut()
            .find(|n| n.id == notification_id && n.user_id == user_id);
        Ok(found.map(|n| {
            n.is_read = true;
            n.clone()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::sync::Arc;

    async fn seed_lesson(store: &MemoryStore, author: i32) -> Lesson {
        store
            .create_lesson(NewLesson {
                created_by_id: author,
                title: "Fractions".into(),
                description: None,
                subject: "Mathematics".into(),
                age_group: "8-10".into(),
                tone: Tone::Friendly,
                content: None,
                media_links: vec![],
                difficulty: Difficulty::Beginner,
                is_published: true,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn upsert_is_idempotent_under_concurrency() {
        let store = Arc::new(MemoryStore::new());
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .upsert_user(UpsertUser {
                            open_id: "same-person".into(),
                            name: Some("Ada".into()),
                            ..Default::default()
                        })
                        .await
                })
            })
            .collect();

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap().unwrap().id);
        }
        ids.dedup();
        assert_eq!(ids.len(), 1);
        assert_eq!(store.user_count().await, 1);
    }

    #[tokio::test]
    async fn upsert_keeps_role_unless_given() {
        let store = MemoryStore::new();
        let teacher = store
            .upsert_user(UpsertUser {
                open_id: "t-1".into(),
                role: Some(Role::Teacher),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(teacher.role, Role::Teacher);

        let again = store
            .upsert_user(UpsertUser {
                open_id: "t-1".into(),
                email: Some("t@example.com".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(again.id, teacher.id);
        assert_eq!(again.role, Role::Teacher);
        assert_eq!(again.email.as_deref(), Some("t@example.com"));
    }

    #[tokio::test]
    async fn progress_upsert_refreshes_leaderboard_and_xp() {
        let store = MemoryStore::new();
        let user = store
            .upsert_user(UpsertUser { open_id: "kid".into(), ..Default::default() })
            .await
            .unwrap();
        let first = seed_lesson(&store, user.id).await;
        let second = seed_lesson(&store, user.id).await;

        store
            .record_progress(user.id, first.id, ProgressUpdate {
                xp_earned: Some(40),
                streak: Some(3),
                completed: Some(true),
                ..Default::default()
            })
            .await
            .unwrap();
        let updated = store
            .record_progress(user.id, first.id, ProgressUpdate {
                completion_percentage: Some(Decimal::new(10000, 2)),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(updated.xp_earned, 40);
        assert!(updated.completed_at.is_some());

        store
            .record_progress(user.id, second.id, ProgressUpdate {
                xp_earned: Some(15),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(store.progress_for_user(user.id).await.unwrap().len(), 2);
        let entry = store.leaderboard_entry(user.id).await.unwrap().unwrap();
        assert_eq!(entry.total_xp, 55);
        assert_eq!(entry.lessons_completed, 1);
        assert_eq!(entry.current_streak, 3);
        assert_eq!(entry.rank, 1);
        assert_eq!(store.user_by_id(user.id).await.unwrap().unwrap().xp_points, 55);
    }

    #[tokio::test]
    async fn progress_for_missing_lesson_is_not_found() {
        let store = MemoryStore::new();
        let result = store.record_progress(1, 999, ProgressUpdate::default()).await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn xp_total_overflow_is_rejected_without_writing() {
        let store = MemoryStore::new();
        let user = store
            .upsert_user(UpsertUser { open_id: "grinder".into(), ..Default::default() })
            .await
            .unwrap();
        let first = seed_lesson(&store, user.id).await;
        let second = seed_lesson(&store, user.id).await;

        store
            .record_progress(user.id, first.id, ProgressUpdate {
                xp_earned: Some(i32::MAX),
                ..Default::default()
            })
            .await
            .unwrap();
        let result = store
            .record_progress(user.id, second.id, ProgressUpdate {
                xp_earned: Some(1),
                ..Default::default()
            })
            .await;
        assert!(matches!(result, Err(StoreError::Rejected(_))));

        assert_eq!(store.progress_for_user(user.id).await.unwrap().len(), 1);
        let entry = store.leaderboard_entry(user.id).await.unwrap().unwrap();
        assert_eq!(entry.total_xp, i32::MAX);

        // Replacing the row for the same lesson stays in range
        let replaced = store
            .record_progress(user.id, first.id, ProgressUpdate {
                xp_earned: Some(10),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(replaced.xp_earned, 10);
        assert_eq!(store.user_by_id(user.id).await.unwrap().unwrap().xp_points, 10);
    }

    #[tokio::test]
    async fn leaderboard_ties_share_rank() {
        let store = MemoryStore::new();
        let author = store
            .upsert_user(UpsertUser { open_id: "author".into(), ..Default::default() })
            .await
            .unwrap();
        let lesson = seed_lesson(&store, author.id).await;

        for (open_id, xp) in [("a", 50), ("b", 80), ("c", 50)] {
            let user = store
                .upsert_user(UpsertUser { open_id: open_id.into(), ..Default::default() })
                .await
                .unwrap();
            store
                .record_progress(user.id, lesson.id, ProgressUpdate {
                    xp_earned: Some(xp),
                    ..Default::default()
                })
                .await
                .unwrap();
        }

        let top = store.leaderboard_top(10).await.unwrap();
        let ranks: Vec<(i32, i64)> = top.iter().map(|e| (e.total_xp, e.rank)).collect();
        assert_eq!(ranks, vec![(80, 1), (50, 2), (50, 2)]);
        assert_eq!(store.leaderboard_top(1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn completing_a_game_twice_is_rejected() {
        let store = MemoryStore::new();
        let session = store
            .create_game_session(NewGameSession {
                game_type: "quiz-duel".into(),
                participants: vec![1, 2],
            })
            .await
            .unwrap();

        let bad_winner = store
            .complete_game_session(session.id, GameResult { winner: Some(9), scores: None })
            .await;
        assert!(matches!(bad_winner, Err(StoreError::Rejected(_))));

        let done = store
            .complete_game_session(session.id, GameResult { winner: Some(2), scores: None })
            .await
            .unwrap();
        assert_eq!(done.status, GameStatus::Completed);
        assert!(done.completed_at.is_some());

        let again = store.complete_game_session(session.id, GameResult::default()).await;
        assert!(matches!(again, Err(StoreError::Rejected(_))));

        let missing = store.complete_game_session(12345, GameResult::default()).await;
        assert!(matches!(missing, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn notifications_are_scoped_to_owner() {
        let store = MemoryStore::new();
        let note = store
            .create_notification(1, NewNotification {
                title: "Badge earned".into(),
                content: None,
                notification_type: Some("achievement".into()),
            })
            .await
            .unwrap();

        assert!(store.mark_notification_read(2, note.id).await.unwrap().is_none());
        let read = store.mark_notification_read(1, note.id).await.unwrap().unwrap();
        assert!(read.is_read);
    }

    #[tokio::test]
    async fn offline_store_reports_unavailable() {
        let store = MemoryStore::new();
        store.set_available(false);
        assert!(matches!(store.health_check().await, Err(StoreError::Unavailable(_))));
        assert!(matches!(store.published_lessons().await, Err(StoreError::Unavailable(_))));
    }
}
