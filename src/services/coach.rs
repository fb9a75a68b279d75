use std::sync::Arc;

use chrono::{DateTime, Timelike, Utc};

use crate::models::mood::MoodEntry;
use crate::services::ai::TextGenerator;

pub const AI_DISABLED_TIP: &str =
    "Take regular breaks during work. Consider a 5-minute walk every hour to boost energy and focus.";
pub const NO_HISTORY_TIP: &str =
    "Start tracking your mood regularly to receive personalized recommendations.";

const SYSTEM_PROMPT: &str = "You are an expert in workplace wellbeing and employee mental health. \
Based on the user's mood history, provide ONE specific, practical recommendation they could implement \
today or this week to improve their wellbeing. Keep it under 2 sentences.";

const RECENT_ENTRIES: usize = 3;

const CANNED_TIPS: [&str; 10] = [
    "Consider taking short breaks throughout your workday to recharge. Even a five-minute break every hour can significantly improve your focus and wellbeing.",
    "Try the 20-20-20 rule when working at your computer: every 20 minutes, look at something 20 feet away for 20 seconds to reduce eye strain and mental fatigue.",
    "Schedule focused work blocks of 25-30 minutes with short breaks in between to maintain high productivity and mental clarity throughout your day.",
    "Consider keeping a gratitude journal by writing down three things you're thankful for each day, which research shows can significantly improve wellbeing over time.",
    "Start your workday with a quick 2-minute planning session to identify your top priorities, which can reduce stress and increase productivity.",
    "Try a 5-minute desk stretching routine to release tension in your neck, shoulders, and back, areas that commonly hold stress during the workday.",
    "For better work-life balance, establish clear boundaries like setting specific end times for your workday and taking a full lunch break away from your desk.",
    "Practice a brief mindfulness exercise before important meetings or challenging tasks to improve focus and reduce stress response.",
    "Stay hydrated throughout your workday by keeping a water bottle at your desk. Even mild dehydration can affect concentration and energy levels.",
    "Incorporate a short walk into your day, even just 10 minutes, which can boost mood, creativity, and help manage stress.",
];

/// Canned tip chosen by wall-clock time so repeated failures still vary.
pub fn canned_tip(now: DateTime<Utc>) -> &'static str {
    let seed = now.hour() * 100 + now.minute();
    CANNED_TIPS[seed as usize % CANNED_TIPS.len()]
}

/// Prompt from the most recent entries, newest first.
pub fn coach_prompt(history: &[MoodEntry]) -> String {
    let mut recent: Vec<&MoodEntry> = history.iter().collect();
    recent.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
    recent.truncate(RECENT_ENTRIES);

    let mut prompt = String::from("Recent mood entries:\n");
    for mood in &recent {
        prompt.push_str(&format!(
            "- Date: {}, Score: {}/5, Notes: '{}'\n",
            mood.recorded_at.format("%Y-%m-%d %H:%M"),
            mood.score,
            mood.notes.as_deref().unwrap_or("No notes provided")
        ));
    }

    let average = recent.iter().map(|m| m.score as f64).sum::<f64>() / recent.len().max(1) as f64;
    prompt.push_str(&format!("\nAverage mood score: {:.1}/5", average));
    prompt
}

#[derive(Clone)]
pub struct WellbeingCoach {
    generator: Option<Arc<dyn TextGenerator>>,
}

impl WellbeingCoach {
    pub fn new(generator: Option<Arc<dyn TextGenerator>>) -> Self {
        Self { generator }
    }

    /// One-sentence recommendation for a user.
    pub async fn recommend(&self, history: &[MoodEntry], now: DateTime<Utc>) -> String {
        let Some(generator) = &self.generator else {
            return AI_DISABLED_TIP.to_string();
        };
        if history.is_empty() {
            return NO_HISTORY_TIP.to_string();
        }

        match generator.generate(&coach_prompt(history), SYSTEM_PROMPT).await {
            Ok(reply) if !reply.trim().is_empty() => reply.trim().to_string(),
            Ok(_) => canned_tip(now).to_string(),
            Err(e) => {
                tracing::warn!(error = %e, "AI coach unavailable, using canned tip");
                canned_tip(now).to_string()
            }
        }
    }
}
