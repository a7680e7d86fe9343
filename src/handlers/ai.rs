use serde::{Deserialize, Serialize};

use crate::auth::RequestContext;
use crate::error::RpcError;
use crate::llm::{generate_detached, prompts};
use crate::rpc::{FieldErrors, Validate};
use crate::state::AppState;

const MAX_MESSAGE_CHARS: usize = 4000;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityInput {
    pub subject: String,
    pub topic: String,
    pub age_group: String,
    pub activity_type: String,
}

impl Validate for ActivityInput {
    fn validate(&self) -> Result<(), RpcError> {
        FieldErrors::new()
            .required("subject", &self.subject, 100)
            .required("topic", &self.topic, 255)
            .required("ageGroup", &self.age_group, 50)
            .required("activityType", &self.activity_type, 100)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
pub struct SidekickInput {
    pub message: String,
    pub context: Option<String>,
}

impl Validate for SidekickInput {
    fn validate(&self) -> Result<(), RpcError> {
        FieldErrors::new()
            .required("message", &self.message, MAX_MESSAGE_CHARS)
            .optional_max_len("context", self.context.as_deref(), MAX_MESSAGE_CHARS)
            .finish()
    }
}

#[derive(Debug, Serialize)]
pub struct ActivityResponse {
    pub activity: String,
}

#[derive(Debug, Serialize)]
pub struct SidekickResponse {
    pub response: String,
}

/// ai.generateActivity - generated text only, nothing is stored
pub async fn generate_activity(
    state: AppState,
    _ctx: RequestContext,
    input: ActivityInput,
) -> Result<ActivityResponse, RpcError> {
    let messages = prompts::classroom_activity(&input.subject, &input.topic, &input.age_group, &input.activity_type);
    let activity = generate_detached(state.llm.clone(), messages).await?;
    Ok(ActivityResponse { activity })
}

/// ai.chatWithSidekick - one tutoring turn; the conversation is not stored
pub async fn chat_with_sidekick(
    state: AppState,
    _ctx: RequestContext,
    input: SidekickInput,
) -> Result<SidekickResponse, RpcError> {
    let messages = prompts::sidekick(&input.message, input.context.as_deref());
    let response = generate_detached(state.llm.clone(), messages).await?;
    Ok(SidekickResponse { response })
}
