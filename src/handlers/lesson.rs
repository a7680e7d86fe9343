use serde::Deserialize;

use crate::auth::RequestContext;
use crate::database::{Difficulty, Lesson, LessonContent, NewLesson, Tone};
use crate::error::RpcError;
use crate::llm::{generate_detached, prompts};
use crate::rpc::{FieldErrors, NoInput, Validate};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LessonId {
    pub id: i32,
}

impl Validate for LessonId {}

/// Authoring payload. Has no `createdById`: authorship comes from the resolved identity and
/// such a key in the payload is ignored.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLessonInput {
    pub title: String,
    pub description: Option<String>,
    pub subject: String,
    pub age_group: String,
    pub tone: Tone,
    pub content: Option<LessonContent>,
    pub media_links: Option<Vec<String>>,
    pub difficulty: Option<Difficulty>,
    pub is_published: Option<bool>,
}

impl Validate for CreateLessonInput {
    fn validate(&self) -> Result<(), RpcError> {
        let mut errors = FieldErrors::new();
        errors
            .required("title", &self.title, 255)
            .required("subject", &self.subject, 100)
            .required("ageGroup", &self.age_group, 50);

        if let Some(links) = &self.media_links {
            if links.iter().any(|link| link.trim().is_empty()) {
                errors.add("mediaLinks", "Links must not be empty");
            }
        }
        errors.finish()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateLessonInput {
    pub subject: String,
    pub age_group: String,
    pub tone: Tone,
    pub topic: String,
}

impl Validate for GenerateLessonInput {
    fn validate(&self) -> Result<(), RpcError> {
        // Topic and subject together form the draft title, which must fit in 255 characters
        FieldErrors::new()
            .required("subject", &self.subject, 100)
            .required("ageGroup", &self.age_group, 50)
            .required("topic", &self.topic, 150)
            .finish()
    }
}

/// lesson.list - published lessons, newest first
pub async fn list(state: AppState, _ctx: RequestContext, _input: NoInput) -> Result<Vec<Lesson>, RpcError> {
    Ok(state.store.published_lessons().await?)
}

/// lesson.get - one lesson by id
pub async fn get(state: AppState, _ctx: RequestContext, input: LessonId) -> Result<Lesson, RpcError> {
    state
        .store
        .lesson_by_id(input.id)
        .await?
        .ok_or_else(|| RpcError::not_found(format!("Lesson {} not found", input.id)))
}

/// lesson.myLessons - everything the caller authored, drafts included
pub async fn my_lessons(state: AppState, ctx: RequestContext, _input: NoInput) -> Result<Vec<Lesson>, RpcError> {
    let user = ctx.require_user()?;
    Ok(state.store.lessons_by_creator(user.id).await?)
}

/// lesson.create - author a lesson as the caller
pub async fn create(state: AppState, ctx: RequestContext, input: CreateLessonInput) -> Result<Lesson, RpcError> {
    let author = ctx.require_user()?;

    let lesson = state
        .store
        .create_lesson(NewLesson {
            created_by_id: author.id,
            title: input.title.trim().to_string(),
            description: input.description,
            subject: input.subject.trim().to_string(),
            age_group: input.age_group.trim().to_string(),
            tone: input.tone,
            content: input.content,
            media_links: input.media_links.unwrap_or_default(),
            difficulty: input.difficulty.unwrap_or_default(),
            is_published: input.is_published.unwrap_or(false),
        })
        .await?;

    tracing::info!(lesson_id = lesson.id, author_id = author.id, "Lesson created");
    Ok(lesson)
}

/// lesson.generateWithAI - generate a plan and keep it as an unpublished intermediate draft
pub async fn generate_with_ai(
    state: AppState,
    ctx: RequestContext,
    input: GenerateLessonInput,
) -> Result<Lesson, RpcError> {
    let author = ctx.require_user()?;

    let messages = prompts::lesson_plan(&input.subject, &input.age_group, input.tone, &input.topic);
    let text = generate_detached(state.llm.clone(), messages).await?;

    let lesson = state
        .store
        .create_lesson(NewLesson {
            created_by_id: author.id,
            title: format!("{} - {}", input.topic.trim(), input.subject.trim()),
            description: None,
            subject: input.subject.trim().to_string(),
            age_group: input.age_group.trim().to_string(),
            tone: input.tone,
            content: Some(LessonContent::Generated { lesson_content: text }),
            media_links: Vec::new(),
            difficulty: Difficulty::Intermediate,
            is_published: false,
        })
        .await?;

    tracing::info!(lesson_id = lesson.id, author_id = author.id, "Generated lesson draft saved");
    Ok(lesson)
}
