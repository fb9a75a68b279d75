use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::models::recommendation::Recommendation;
use crate::services::ai::TextGenerator;

const SYSTEM_PROMPT: &str = "You are a helpful wellbeing assistant for employees. \
Your primary goal is to support the user's mental and emotional wellbeing. \
Keep responses concise, empathetic, and evidence-based. \
When appropriate, suggest specific wellbeing activities or practices. \
If the user mentions stress, anxiety, or negative emotions, provide supportive responses. \
Do not diagnose medical conditions or provide medical advice. \
If the user asks about tracking their mood, suggest using the application's mood tracker feature. \
Your responses should be conversational but professional.";

const MOOD_TRACKER_NUDGE: &str =
    "Would you like to track your mood? You can use our mood tracker feature to record how you're feeling today.";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyCategory {
    Greeting,
    FeelingGood,
    FeelingBad,
    Stress,
    Recommendations,
    ThankYou,
    Default,
}

impl ReplyCategory {
    pub fn replies(self) -> &'static [&'static str; 3] {
        match self {
            ReplyCategory::Greeting => &[
                "Hello! I'm your wellbeing assistant. How are you feeling today?",
                "Hi there! I'm here to support your wellbeing journey. How can I help?",
                "Welcome! I'm your AI wellbeing companion. What's on your mind today?",
            ],
            ReplyCategory::FeelingGood => &[
                "That's wonderful to hear! What's contributing to your positive mood today?",
                "Great! It's important to recognize what makes us feel good. Anything specific you'd like to share?",
                "Excellent! Would you like some tips to maintain this positive energy?",
            ],
            ReplyCategory::FeelingBad => &[
                "I'm sorry to hear that. Would you like to talk about what's bothering you?",
                "Thank you for sharing. Sometimes acknowledging our feelings is the first step. What do you think might help?",
                "I understand. Would you like me to suggest some simple wellbeing exercises that might help?",
            ],
            ReplyCategory::Stress => &[
                "Stress can be challenging. Have you tried any relaxation techniques recently?",
                "Managing stress is important. Deep breathing, short walks, or even stretching can help in the moment.",
                "I understand. The 5-5-5 technique might help: breathe in for 5 seconds, hold for 5, exhale for 5. Would you like more techniques?",
            ],
            ReplyCategory::Recommendations => &[
                "I can suggest some wellbeing activities based on your mood. Would you like to hear them?",
                "There are several evidence-based practices that might help. Would you like me to share some?",
                "I have some recommendations that might be beneficial for your wellbeing. Would you like to explore them?",
            ],
            ReplyCategory::ThankYou => &[
                "You're welcome! I'm here anytime you need support.",
                "Happy to help! Remember, taking care of your wellbeing is important.",
                "Anytime! Don't hesitate to reach out whenever you need assistance.",
            ],
            ReplyCategory::Default => &[
                "I'm still learning about wellbeing. Could you tell me more about what you're looking for?",
                "That's an interesting point. Would you like me to find some wellbeing resources related to this topic?",
                "I appreciate you sharing that. How else can I support your wellbeing today?",
            ],
        }
    }
}

fn has_word(text: &str, word: &str) -> bool {
    text.split(|c: char| !c.is_alphanumeric())
        .any(|w| w == word)
}

fn contains_any(text: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| text.contains(n))
}

/// First matching category in priority order.
pub fn classify(message: &str) -> ReplyCategory {
    let text = message.to_lowercase();

    // "hi" and "hey" only as whole words, or "this"/"which" would greet.
    if text.contains("hello") || has_word(&text, "hi") || has_word(&text, "hey") {
        ReplyCategory::Greeting
    } else if contains_any(&text, &["good", "great", "happy", "positive"]) {
        ReplyCategory::FeelingGood
    } else if contains_any(&text, &["bad", "sad", "depressed", "unhappy", "negative"]) {
        ReplyCategory::FeelingBad
    } else if contains_any(&text, &["stress", "anxious", "overwhelm", "worry"]) {
        ReplyCategory::Stress
    } else if contains_any(&text, &["recommend", "suggest", "advice"]) {
        ReplyCategory::Recommendations
    } else if text.contains("thank") {
        ReplyCategory::ThankYou
    } else {
        ReplyCategory::Default
    }
}

pub fn keyword_reply<R: Rng + ?Sized>(message: &str, rng: &mut R) -> &'static str {
    let replies = classify(message).replies();
    replies.choose(rng).copied().unwrap_or(replies[0])
}

fn wants_recommendation(text: &str) -> bool {
    contains_any(text, &["recommend", "suggest", "advice"])
}

fn mentions_mood(text: &str) -> bool {
    contains_any(text, &["mood", "feeling", "emotion"])
}

pub fn format_tip(rec: &Recommendation) -> String {
    format!(
        "Here's a wellbeing recommendation for you: \"{}\" - {}",
        rec.title, rec.description
    )
}

#[derive(Clone)]
pub struct ChatResponder {
    generator: Option<Arc<dyn TextGenerator>>,
}

impl ChatResponder {
    pub fn new(generator: Option<Arc<dyn TextGenerator>>) -> Self {
        Self { generator }
    }

    pub fn is_available(&self) -> bool {
        // Local replies never go offline.
        true
    }

    async fn ask_model(&self, message: &str, history: &[ChatMessage]) -> Option<String> {
        let generator = self.generator.as_ref()?;

        let mut context = String::new();
        if !history.is_empty() {
            context.push_str("Previous conversation:\n");
            for item in history {
                context.push_str(&format!("{}: {}\n", item.role, item.content));
            }
        }
        let prompt = format!("{context}\n\nUser message: {message}");

        match generator.generate(&prompt, SYSTEM_PROMPT).await {
            Ok(reply) if !reply.trim().is_empty() => Some(reply),
            Ok(_) => {
                tracing::warn!("AI chat reply was empty, using local responses");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "AI chat unavailable, using local responses");
                None
            }
        }
    }

    /// `catalog` is only consulted when the message asks for a recommendation.
    pub async fn respond<R: Rng + ?Sized>(
        &self,
        message: &str,
        history: &[ChatMessage],
        catalog: &[Recommendation],
        rng: &mut R,
    ) -> String {
        if let Some(reply) = self.ask_model(message, history).await {
            return reply;
        }

        let text = message.to_lowercase();
        if wants_recommendation(&text) {
            if let Some(rec) = catalog.choose(rng) {
                return format_tip(rec);
            }
        }
        if mentions_mood(&text) {
            return MOOD_TRACKER_NUDGE.to_string();
        }

        keyword_reply(message, rng).to_string()
    }
}
