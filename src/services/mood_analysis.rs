use std::sync::Arc;

use chrono::Local;

use crate::models::analysis::{MoodAnalysis, RawMoodAnalysis, Sentiment};
use crate::models::mood::MoodEntry;
use crate::services::ai::TextGenerator;

const MAX_THEMES: usize = 3;
const MAX_ACTIVITIES: usize = 3;

const DEFAULT_THEME: &str = "general wellbeing";
const DEFAULT_INSIGHT: &str =
    "Regular mood tracking helps build awareness of your wellbeing patterns.";
const DEFAULT_ACTIVITIES: [&str; 3] = ["Take a short break", "Stay hydrated", "Practice deep breathing"];

const SYSTEM_PROMPT: &str = "You are an empathetic AI assistant specializing in workplace wellbeing analysis. \
Analyze the user's mood entry and provide insights in JSON format with these fields: \
sentiment (positive, neutral, or negative), mainThemes (array of 1-3 themes), \
insights (brief analysis, max 2 sentences), and suggestedActivities (array of 1-3 specific activities).";

pub fn sentiment_for_score(score: i32) -> Sentiment {
    if score <= 2 {
        Sentiment::Negative
    } else if score >= 4 {
        Sentiment::Positive
    } else {
        Sentiment::Neutral
    }
}

struct KeywordGroup {
    keywords: &'static [&'static str],
    theme: &'static str,
    /// Replaces the activity list when present.
    activities: Option<[&'static str; 3]>,
    /// Appended to the insight, followed by the entry time.
    insight: Option<&'static str>,
}

const KEYWORD_GROUPS: &[KeywordGroup] = &[
    KeywordGroup {
        keywords: &["work", "project", "deadline", "meeting", "boss", "task", "client"],
        theme: "work pressure",
        activities: None,
        insight: Some("Your notes mention work-related topics"),
    },
    KeywordGroup {
        keywords: &["tired", "sleep", "exhausted", "fatigue", "energy", "rest", "nap"],
        theme: "energy levels",
        activities: Some([
            "Take a power nap (15-20 min)",
            "Have a healthy snack for energy",
            "Try a desk stretching routine",
        ]),
        insight: Some("Your notes suggest energy may be a factor today"),
    },
    KeywordGroup {
        keywords: &["stress", "anxiety", "worry", "overwhelm", "pressure", "tense", "nervous"],
        theme: "stress management",
        activities: Some([
            "Practice deep breathing for 2 minutes",
            "Try progressive muscle relaxation",
            "Take a short mindful walk",
        ]),
        insight: Some("Your notes indicate some stress or pressure"),
    },
    KeywordGroup {
        keywords: &["distract", "focus", "concentrate", "attention", "productive"],
        theme: "focus and concentration",
        activities: Some([
            "Try the Pomodoro technique (25min work, 5min break)",
            "Clear your workspace of distractions",
            "Set a clear intention for your next work session",
        ]),
        insight: None,
    },
    KeywordGroup {
        keywords: &["colleague", "team", "social", "friend", "conflict", "communication"],
        theme: "workplace relationships",
        activities: Some([
            "Schedule a coffee chat with a colleague",
            "Practice active listening in your next meeting",
            "Express appreciation to someone on your team",
        ]),
        insight: None,
    },
    KeywordGroup {
        keywords: &["happy", "joy", "accomplish", "success", "proud", "excited", "grateful"],
        theme: "positive emotions",
        activities: Some([
            "Share your success with someone",
            "Journal about what went well",
            "Build on this momentum with another goal",
        ]),
        insight: Some("Your notes reflect positive emotions or accomplishments"),
    },
];

fn base_for_score(score: i32) -> (String, [&'static str; 3], &'static str) {
    match score {
        1 => (
            format!("Your mood score of {score}/5 suggests you're having a difficult day. Consider reaching out to a colleague or taking a mental health break."),
            ["Take a mental health break", "Practice self-compassion exercises", "Connect with a supportive colleague"],
            "emotional wellbeing",
        ),
        2 => (
            format!("Your mood score of {score}/5 indicates some challenges today. Small breaks and mindfulness can help improve your outlook."),
            ["Try a 5-minute mindfulness exercise", "Take a short walk outside", "Listen to calming music"],
            "stress management",
        ),
        3 => (
            format!("Your neutral mood score of {score}/5 suggests a balanced day. This is a good time to focus on maintenance activities for wellbeing."),
            ["Do a quick desk stretch routine", "Drink a glass of water", "Prioritize your tasks for the day"],
            "balance",
        ),
        4 => (
            format!("Your positive mood score of {score}/5 shows you're having a good day. This is an excellent time to tackle challenging tasks or help others."),
            ["Take on a challenging task", "Share your positivity with colleagues", "Document what's working well"],
            "productivity",
        ),
        _ => (
            format!("Your excellent mood score of {score}/5 indicates you're at your best today. Harness this energy for creative work and challenging tasks."),
            ["Work on creative projects", "Mentor or help a colleague", "Set ambitious goals while motivation is high"],
            "peak performance",
        ),
    }
}

/// Deterministic analysis from the score and keywords in the notes.
pub fn rule_based(entry: &MoodEntry) -> MoodAnalysis {
    let (mut insights, base_activities, base_theme) = base_for_score(entry.score.clamp(1, 5));
    let mut activities: Vec<String> = base_activities.iter().map(|a| a.to_string()).collect();
    let mut themes: Vec<String> = vec![base_theme.to_string()];

    if let Some(notes) = entry.notes.as_deref().filter(|n| !n.is_empty()) {
        let notes = notes.to_lowercase();
        // Shown in the server's local time, as the entry was recorded there
        let noted_at = entry.recorded_at.with_timezone(&Local).format("%-I:%M %p");

        for group in KEYWORD_GROUPS {
            if !group.keywords.iter().any(|k| notes.contains(k)) {
                continue;
            }
            if !themes.iter().any(|t| t == group.theme) {
                themes.push(group.theme.to_string());
            }
            if let Some(replacement) = group.activities {
                activities = replacement.iter().map(|a| a.to_string()).collect();
            }
            if let Some(clause) = group.insight {
                insights.push_str(&format!(" {clause} (noted at {noted_at})."));
            }
        }
    }

    sanitize(RawMoodAnalysis {
        sentiment: None,
        main_themes: Some(themes),
        insights: Some(insights),
        suggested_activities: Some(activities),
    })
    .with_sentiment(sentiment_for_score(entry.score))
}

/// Fills every missing or empty field with a default and caps list lengths.
pub fn sanitize(raw: RawMoodAnalysis) -> MoodAnalysis {
    let sentiment = raw
        .sentiment
        .as_deref()
        .and_then(Sentiment::parse)
        .unwrap_or(Sentiment::Neutral);

    let main_themes = non_empty_list(raw.main_themes, MAX_THEMES)
        .unwrap_or_else(|| vec![DEFAULT_THEME.to_string()]);

    let insights = raw
        .insights
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_INSIGHT.to_string());

    let suggested_activities = non_empty_list(raw.suggested_activities, MAX_ACTIVITIES)
        .unwrap_or_else(default_activities);

    MoodAnalysis {
        sentiment,
        main_themes,
        insights,
        suggested_activities,
    }
}

fn non_empty_list(list: Option<Vec<String>>, cap: usize) -> Option<Vec<String>> {
    let mut out: Vec<String> = Vec::new();
    for item in list.unwrap_or_default() {
        let item = item.trim().to_string();
        if !item.is_empty() && !out.contains(&item) {
            out.push(item);
        }
    }
    out.truncate(cap);
    (!out.is_empty()).then_some(out)
}

fn default_activities() -> Vec<String> {
    DEFAULT_ACTIVITIES.iter().map(|a| a.to_string()).collect()
}

/// Used when a model reply cannot be parsed at all.
pub fn fallback() -> MoodAnalysis {
    MoodAnalysis {
        sentiment: Sentiment::Neutral,
        main_themes: vec![DEFAULT_THEME.to_string()],
        insights: "We've received your mood entry. Regular tracking helps build awareness of your wellbeing patterns.".into(),
        suggested_activities: default_activities(),
    }
}

impl MoodAnalysis {
    fn with_sentiment(mut self, sentiment: Sentiment) -> Self {
        self.sentiment = sentiment;
        self
    }
}

/// Best-effort extraction of an analysis from free model text.
pub fn parse_ai_reply(reply: &str, entry: &MoodEntry) -> MoodAnalysis {
    let trimmed = reply.trim();

    let json = if trimmed.starts_with('{') {
        Some(trimmed)
    } else {
        match (trimmed.find('{'), trimmed.rfind('}')) {
            (Some(start), Some(end)) if end > start => Some(&trimmed[start..=end]),
            _ => None,
        }
    };

    let Some(json) = json else {
        let insight = if trimmed.chars().count() > 100 {
            format!("{}...", trimmed.chars().take(100).collect::<String>())
        } else {
            trimmed.to_string()
        };
        return sanitize(RawMoodAnalysis {
            sentiment: None,
            main_themes: None,
            insights: Some(insight),
            suggested_activities: Some(vec![
                "Take a short break".into(),
                "Practice mindfulness".into(),
                "Stay hydrated".into(),
            ]),
        })
        .with_sentiment(sentiment_for_score(entry.score));
    };

    match serde_json::from_str::<RawMoodAnalysis>(json) {
        Ok(raw) => sanitize(raw),
        Err(e) => {
            tracing::warn!(error = %e, mood_id = entry.id, "Could not parse AI mood analysis");
            fallback()
        }
    }
}

#[derive(Clone)]
pub struct MoodAnalyzer {
    generator: Option<Arc<dyn TextGenerator>>,
}

impl MoodAnalyzer {
    pub fn new(generator: Option<Arc<dyn TextGenerator>>) -> Self {
        Self { generator }
    }

    pub async fn analyze(&self, entry: &MoodEntry) -> MoodAnalysis {
        let Some(generator) = &self.generator else {
            return rule_based(entry);
        };

        let prompt = format!(
            "Analyze this mood entry - Rating: {}/5, Notes: '{}'",
            entry.score,
            entry.notes.as_deref().unwrap_or("No notes provided")
        );

        match generator.generate(&prompt, SYSTEM_PROMPT).await {
            Ok(reply) => parse_ai_reply(&reply, entry),
            Err(e) => {
                tracing::warn!(error = %e, mood_id = entry.id, "AI analysis unavailable, using rule-based analysis");
                rule_based(entry)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ai::tests::ScriptedGenerator;
    use chrono::{TimeZone, Utc};

    fn local_afternoon() -> chrono::DateTime<Utc> {
        Local
            .with_ymd_and_hms(2024, 3, 4, 14, 5, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    fn entry(score: i32, notes: Option<&str>) -> MoodEntry {
        MoodEntry {
            id: 1,
            user_id: 1,
            score,
            notes: notes.map(str::to_string),
            recorded_at: local_afternoon(),
        }
    }

    #[test]
    fn test_sentiment_mapping() {
        assert_eq!(sentiment_for_score(1), Sentiment::Negative);
        assert_eq!(sentiment_for_score(2), Sentiment::Negative);
        assert_eq!(sentiment_for_score(3), Sentiment::Neutral);
        assert_eq!(sentiment_for_score(4), Sentiment::Positive);
        assert_eq!(sentiment_for_score(5), Sentiment::Positive);

        for score in 1..=5 {
            assert_eq!(rule_based(&entry(score, None)).sentiment, sentiment_for_score(score));
        }
    }

    #[test]
    fn test_sanitize_fully_empty_analysis() {
        let analysis = sanitize(RawMoodAnalysis::default());

        assert_eq!(analysis.sentiment, Sentiment::Neutral);
        assert_eq!(analysis.main_themes, vec![DEFAULT_THEME.to_string()]);
        assert_eq!(analysis.insights, DEFAULT_INSIGHT);
        assert_eq!(analysis.suggested_activities.len(), 3);
    }

    #[test]
    fn test_sanitize_replaces_blank_values_and_caps_lists() {
        let analysis = sanitize(RawMoodAnalysis {
            sentiment: Some("   ".into()),
            main_themes: Some(vec!["".into(), " ".into()]),
            insights: Some("".into()),
            suggested_activities: Some((1..=5).map(|i| format!("step {i}")).collect()),
        });

        assert_eq!(analysis.sentiment, Sentiment::Neutral);
        assert_eq!(analysis.main_themes, vec![DEFAULT_THEME.to_string()]);
        assert_eq!(analysis.insights, DEFAULT_INSIGHT);
        assert_eq!(analysis.suggested_activities, vec!["step 1", "step 2", "step 3"]);
    }

    #[test]
    fn test_later_keyword_group_wins_activities() {
        let analysis = rule_based(&entry(2, Some("Stressed about the team")));

        assert_eq!(
            analysis.suggested_activities,
            vec![
                "Schedule a coffee chat with a colleague",
                "Practice active listening in your next meeting",
                "Express appreciation to someone on your team",
            ]
        );
        assert!(analysis.main_themes.contains(&"stress management".to_string()));
        assert!(analysis.main_themes.contains(&"workplace relationships".to_string()));
    }

    #[test]
    fn test_work_notes_keep_base_activities_and_add_time() {
        let analysis = rule_based(&entry(4, Some("Finished the client project")));

        assert_eq!(analysis.suggested_activities[0], "Take on a challenging task");
        assert_eq!(analysis.main_themes, vec!["productivity", "work pressure"]);
        assert!(analysis
            .insights
            .ends_with("Your notes mention work-related topics (noted at 2:05 PM)."));
    }

    #[test]
    fn test_themes_are_capped() {
        let analysis = rule_based(&entry(
            3,
            Some("tired and stressed, can't focus, team conflict, but proud of the project"),
        ));
        assert_eq!(analysis.main_themes.len(), 3);
        assert_eq!(analysis.suggested_activities[0], "Share your success with someone");
    }

    #[test]
    fn test_parse_reply_with_surrounding_text() {
        let reply = r#"Sure! Here it is: {"sentiment": "positive", "mainThemes": ["growth"], "insights": "Nice.", "suggestedActivities": ["Celebrate"]} Hope that helps."#;
        let analysis = parse_ai_reply(reply, &entry(4, None));

        assert_eq!(analysis.sentiment, Sentiment::Positive);
        assert_eq!(analysis.main_themes, vec!["growth"]);
        assert_eq!(analysis.suggested_activities, vec!["Celebrate"]);
    }

    #[test]
    fn test_parse_plain_text_reply() {
        let reply = "a".repeat(150);
        let analysis = parse_ai_reply(&reply, &entry(1, None));

        assert_eq!(analysis.sentiment, Sentiment::Negative);
        assert_eq!(analysis.insights.len(), 103);
        assert!(analysis.insights.ends_with("..."));
        assert_eq!(analysis.main_themes, vec![DEFAULT_THEME.to_string()]);
    }

    #[test]
    fn test_parse_broken_json_falls_back() {
        let analysis = parse_ai_reply("{ not json }", &entry(5, None));
        assert_eq!(analysis, fallback());
    }

    #[tokio::test]
    async fn test_generator_failure_uses_rule_based() {
        let analyzer = MoodAnalyzer::new(Some(Arc::new(ScriptedGenerator::failing())));
        let target = entry(2, Some("worried"));

        assert_eq!(analyzer.analyze(&target).await, rule_based(&target));
    }

    #[tokio::test]
    async fn test_generator_reply_is_sanitized() {
        let generator = ScriptedGenerator::replying(r#"{"sentiment": null, "insights": "Keep going."}"#);
        let analyzer = MoodAnalyzer::new(Some(Arc::new(generator)));
        let analysis = analyzer.analyze(&entry(3, None)).await;

        assert_eq!(analysis.sentiment, Sentiment::Neutral);
        assert_eq!(analysis.insights, "Keep going.");
        assert_eq!(analysis.suggested_activities.len(), 3);
    }
}
