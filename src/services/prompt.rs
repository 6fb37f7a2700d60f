//! Prompt construction for the completion service.
//!
//! Two templates: one for a single user's mood-based request, one for a
//! watch party's pooled request. Both instruct the model to emit titles as
//! "Title (Year)" so the parser can pick them back out.

use crate::models::UserPreferences;

/// Sampling temperature for single-user recommendations
pub const SOLO_TEMPERATURE: f32 = 0.8;
/// Sampling temperature for group recommendations
pub const GROUP_TEMPERATURE: f32 = 0.7;
/// Token ceiling for either request kind
pub const MAX_COMPLETION_TOKENS: u32 = 1000;

pub const RECOMMENDATION_SYSTEM_PROMPT: &str = r#"You are an expert movie recommendation AI. Your job is to suggest movies based on the user's mood, vibe, or description.

IMPORTANT RULES:
1. Suggest 5-8 movies that match the user's mood/description
2. For each movie, provide:
   - Movie title and year (e.g., "Inception (2010)")
   - Brief explanation (1-2 sentences) why it matches their mood
   - A "vibe match" score out of 10
3. Consider the user's genre preferences if provided, but prioritize mood match
4. Keep responses engaging, fun, and 100% spoiler-free
5. Format as a clean numbered list

RESPONSE FORMAT EXAMPLE:
1. **Inception (2010)** - Vibe Match: 9/10
   A mind-bending thriller that keeps you guessing. Perfect for when you want something intellectually stimulating with stunning visuals.

2. **The Prestige (2006)** - Vibe Match: 8/10
   Dark, mysterious, and full of twists. Great if you enjoy psychological drama with a magical twist.

(Continue for 5-8 movies total)"#;

pub const GROUP_SYSTEM_PROMPT: &str = r#"You are recommending movies for a GROUP watch party. Suggest movies that will appeal to EVERYONE based on their combined preferences.

RULES:
1. Suggest 5-7 movies that balance everyone's tastes
2. For each movie, explain why it works for the GROUP
3. Prioritize movies that are fun to watch together
4. Format as numbered list with title, year, and group appeal explanation"#;

/// User message for a single-user request: the mood text plus optional
/// genre/language hints
pub fn build_user_message(mood: &str, preferences: &UserPreferences) -> String {
    let mut message = format!("Current mood/vibe: {}", mood);

    if !preferences.genres.is_empty() {
        message.push_str(&format!(
            "\nPreferred genres: {}",
            preferences.genres.join(", ")
        ));
    }

    if !preferences.languages.is_empty() {
        message.push_str(&format!(
            "\nPreferred languages: {}",
            preferences.languages.join(", ")
        ));
    }

    message.push_str("\n\nRecommend movies now!");
    message
}

/// User message for a group request, built from the top pooled labels
pub fn build_group_user_message(
    top_genres: &[String],
    top_moods: &[String],
    member_count: usize,
) -> String {
    format!(
        "Group preferences:\n\
         - Popular genres: {}\n\
         - Popular moods/vibes: {}\n\
         - Number of people: {}\n\n\
         Recommend movies perfect for this group watch party!",
        top_genres.join(", "),
        top_moods.join(", "),
        member_count
    )
}
