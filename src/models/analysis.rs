use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl Sentiment {
    /// Lenient parse for model output; anything unrecognised is `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "positive" => Some(Self::Positive),
            "neutral" => Some(Self::Neutral),
            "negative" => Some(Self::Negative),
            _ => None,
        }
    }
}

/// Analysis of a single mood entry. Every field is guaranteed non-empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoodAnalysis {
    pub sentiment: Sentiment,
    pub main_themes: Vec<String>,
    pub insights: String,
    pub suggested_activities: Vec<String>,
}

/// Analysis as it arrives from the chat-completion API: any field may be
/// missing, null or empty.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMoodAnalysis {
    #[serde(default)]
    pub sentiment: Option<String>,
    #[serde(default, alias = "themes")]
    pub main_themes: Option<Vec<String>>,
    #[serde(default)]
    pub insights: Option<String>,
    #[serde(default, alias = "activities")]
    pub suggested_activities: Option<Vec<String>>,
}
