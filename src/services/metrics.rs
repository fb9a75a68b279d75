use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;

use crate::db::DataSource;
use crate::models::mood::{MoodEntry, MoodTrend, WellbeingMetrics};
use crate::models::user::User;

const ACTIVE_WINDOW_DAYS: i64 = 7;

pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn average_score(moods: &[MoodEntry]) -> f64 {
    if moods.is_empty() {
        return 0.0;
    }
    moods.iter().map(|m| m.score as f64).sum::<f64>() / moods.len() as f64
}

/// Daily averages, oldest day first.
pub fn daily_trends(moods: &[MoodEntry]) -> Vec<MoodTrend> {
    let mut days: BTreeMap<NaiveDate, (i64, usize)> = BTreeMap::new();
    for mood in moods {
        let day = days.entry(mood.recorded_at.date_naive()).or_insert((0, 0));
        day.0 += mood.score as i64;
        day.1 += 1;
    }

    days.into_iter()
        .map(|(date, (sum, count))| MoodTrend {
            date,
            average_mood: sum as f64 / count as f64,
        })
        .collect()
}

pub fn wellbeing_metrics(moods: &[MoodEntry]) -> WellbeingMetrics {
    WellbeingMetrics {
        average_mood: average_score(moods),
        mood_entries_count: moods.len(),
        mood_trends: daily_trends(moods),
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalMetrics {
    pub total_entries: usize,
    pub average_mood: f64,
    pub data_source: DataSource,
    pub last_updated: DateTime<Utc>,
}

pub fn global_metrics(moods: &[MoodEntry], data_source: DataSource, now: DateTime<Utc>) -> GlobalMetrics {
    GlobalMetrics {
        total_entries: moods.len(),
        average_mood: round1(average_score(moods)),
        data_source,
        last_updated: now,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DatabaseStatus {
    Connected,
    Disconnected,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_users: i64,
    pub active_users: usize,
    pub total_mood_entries: usize,
    pub average_mood: f64,
    pub total_recommendations: usize,
    pub database_status: DatabaseStatus,
    pub data_source: DataSource,
    pub last_updated: DateTime<Utc>,
}

pub struct DashboardInputs<'a> {
    pub user_count: i64,
    pub users: &'a [User],
    pub moods: &'a [MoodEntry],
    pub recommendation_count: usize,
    pub database_connected: bool,
    pub data_source: DataSource,
}

pub fn dashboard_stats(inputs: DashboardInputs<'_>, now: DateTime<Utc>) -> DashboardStats {
    let active_since = now - Duration::days(ACTIVE_WINDOW_DAYS);

    DashboardStats {
        total_users: inputs.user_count,
        active_users: inputs
            .users
            .iter()
            .filter(|u| u.last_login_at >= active_since)
            .count(),
        total_mood_entries: inputs.moods.len(),
        average_mood: round1(average_score(inputs.moods)),
        total_recommendations: inputs.recommendation_count,
        database_status: if inputs.database_connected {
            DatabaseStatus::Connected
        } else {
            DatabaseStatus::Disconnected
        },
        data_source: inputs.data_source,
        last_updated: now,
    }
}
