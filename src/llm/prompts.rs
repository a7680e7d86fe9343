//! Prompt templates. Pure functions of already-validated input.

use super::ChatMessage;
use crate::database::Tone;

const LESSON_SYSTEM: &str =
    "You are an expert educational content creator. Generate structured lesson plans.";

const ACTIVITY_SYSTEM: &str = "You are an expert educator creating engaging classroom activities.";

const SIDEKICK_SYSTEM: &str = "You are HydraLearn Sidekick, an AI tutor helping students learn. \
Be encouraging, clear, and adapt to their learning level.";

pub fn lesson_plan(subject: &str, age_group: &str, tone: Tone, topic: &str) -> Vec<ChatMessage> {
    let prompt = format!(
        "Create an engaging educational lesson for {age_group} year olds about \"{topic}\" in {subject}. \
Use a {tone} tone. Include learning objectives, key concepts, activities, and assessment methods.",
        tone = tone.as_str(),
    );
    vec![ChatMessage::system(LESSON_SYSTEM), ChatMessage::user(prompt)]
}

pub fn classroom_activity(
    subject: &str,
    topic: &str,
    age_group: &str,
    activity_type: &str,
) -> Vec<ChatMessage> {
    let prompt = format!(
        "Create a {activity_type} activity for {age_group} year olds about \"{topic}\" in {subject}. \
Make it engaging and educational. Include clear instructions and expected outcomes."
    );
    vec![ChatMessage::system(ACTIVITY_SYSTEM), ChatMessage::user(prompt)]
}

pub fn sidekick(message: &str, context: Option<&str>) -> Vec<ChatMessage> {
    let system = match context.map(str::trim).filter(|c| !c.is_empty()) {
        Some(context) => format!("{}\nContext: {}", SIDEKICK_SYSTEM, context),
        None => SIDEKICK_SYSTEM.to_string(),
    };
    vec![ChatMessage::system(system), ChatMessage::user(message)]
}
