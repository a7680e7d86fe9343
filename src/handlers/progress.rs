use rust_decimal::{Decimal, RoundingStrategy};
use serde::Deserialize;

use crate::auth::RequestContext;
use crate::database::{Progress, ProgressUpdate};
use crate::error::RpcError;
use crate::rpc::{FieldErrors, NoInput, Validate};
use crate::state::AppState;

/// Largest XP a single lesson can award
pub const MAX_LESSON_XP: i32 = 1_000_000;
pub const MAX_STREAK: i32 = 100_000;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProgressInput {
    pub lesson_id: i32,
    pub xp_earned: Option<i32>,
    pub completion_percentage: Option<Decimal>,
    pub streak: Option<i32>,
    pub completed: Option<bool>,
}

impl Validate for UpdateProgressInput {
    fn validate(&self) -> Result<(), RpcError> {
        FieldErrors::new()
            .range("xpEarned", self.xp_earned, 0, MAX_LESSON_XP)
            .range("completionPercentage", self.completion_percentage, Decimal::ZERO, Decimal::ONE_HUNDRED)
            .range("streak", self.streak, 0, MAX_STREAK)
            .finish()
    }
}

/// progress.getUserProgress - the caller's rows
pub async fn get_user_progress(
    state: AppState,
    ctx: RequestContext,
    _input: NoInput,
) -> Result<Vec<Progress>, RpcError> {
    let user = ctx.require_user()?;
    Ok(state.store.progress_for_user(user.id).await?)
}

/// progress.updateProgress - upsert on (caller, lesson); the leaderboard row and XP total
/// are recomputed in the same store operation
pub async fn update_progress(
    state: AppState,
    ctx: RequestContext,
    input: UpdateProgressInput,
) -> Result<Progress, RpcError> {
    let user = ctx.require_user()?;
    let update = ProgressUpdate {
        xp_earned: input.xp_earned,
        // Stored with two decimals, rounding half away from zero like NUMERIC(5,2)
        completion_percentage: input
            .completion_percentage
            .map(|pct| pct.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)),
        streak: input.streak,
        completed: input.completed,
    };

    let progress = state.store.record_progress(user.id, input.lesson_id, update).await?;
    tracing::debug!(
        user_id = user.id,
        lesson_id = input.lesson_id,
        xp = progress.xp_earned,
        "Progress recorded"
    );
    Ok(progress)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> UpdateProgressInput {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn percentage_accepts_numbers_in_range() {
        let input = parse(json!({"lessonId": 1, "completionPercentage": 42.5}));
        assert_eq!(input.completion_percentage, Some(Decimal::new(425, 1)));
        assert!(input.validate().is_ok());
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let err = parse(json!({"lessonId": 1, "completionPercentage": 101, "xpEarned": -5}))
            .validate()
            .unwrap_err();
        let fields = err.field_errors().unwrap();
        assert!(fields.contains_key("completionPercentage"));
        assert!(fields.contains_key("xpEarned"));
    }

    #[test]
    fn xp_and_streak_have_upper_bounds() {
        let at_max = parse(json!({"lessonId": 1, "xpEarned": MAX_LESSON_XP, "streak": MAX_STREAK}));
        assert!(at_max.validate().is_ok());

        let err = parse(json!({"lessonId": 1, "xpEarned": MAX_LESSON_XP + 1, "streak": MAX_STREAK + 1}))
            .validate()
            .unwrap_err();
        let fields = err.field_errors().unwrap();
        assert!(fields.contains_key("xpEarned"));
        assert!(fields.contains_key("streak"));

        let err = parse(json!({"lessonId": 1, "xpEarned": i32::MAX})).validate().unwrap_err();
        assert!(err.field_errors().unwrap().contains_key("xpEarned"));
    }

    #[test]
    fn lesson_id_is_required() {
        assert!(serde_json::from_value::<UpdateProgressInput>(json!({"xpEarned": 5})).is_err());
    }
}
