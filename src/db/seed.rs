//! Demo data shared by the in-memory store and first-run database seeding.

use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;

use crate::auth::password::hash_password;
use crate::models::mood::MoodEntry;
use crate::models::recommendation::{Category, Recommendation};
use crate::models::user::{NewUser, Role};

pub const DEMO_PASSWORD: &str = "Password@123";

pub fn recommendation_catalog() -> Vec<Recommendation> {
    use Category::*;

    [
        (1, "Take a short walk", "Taking a 10-minute walk can boost your mood and energy levels.", Exercise),
        (2, "Practice mindfulness", "Spend 5 minutes practicing mindful breathing to reduce stress.", Mindfulness),
        (3, "Connect with a colleague", "Reach out to a team member for a quick virtual coffee chat.", Social),
        (4, "Desk stretches", "Try these 3 simple stretches to relieve tension while sitting at your desk.", Exercise),
        (5, "Set work boundaries", "Try setting specific work hours and take regular breaks to maintain work-life balance.", WorkLifeBalance),
        (6, "Digital detox", "Take a 30-minute break from all digital devices to reduce eye strain and mental fatigue.", WorkLifeBalance),
        (7, "Gratitude journaling", "Write down three things you're grateful for today to improve your perspective.", Mindfulness),
        (8, "Lunch with colleagues", "Plan a lunch with teammates to strengthen your workplace connections.", Social),
        (9, "Posture check", "Take a moment to check and correct your sitting posture to prevent back pain.", Exercise),
        (10, "Organize your workspace", "A tidy workspace can reduce stress and improve focus. Take 10 minutes to organize.", WorkLifeBalance),
        (11, "Take the stairs", "Skip the elevator and take the stairs for a quick cardio boost during your workday.", Exercise),
        (12, "5-4-3-2-1 grounding", "Notice 5 things you see, 4 you feel, 3 you hear, 2 you smell, and 1 you taste to reduce anxiety.", Mindfulness),
        (13, "Virtual coffee break", "Schedule a short virtual coffee break with a colleague you haven't spoken to in a while.", Social),
        (14, "Wrist and hand stretches", "Relieve tension from typing with simple wrist rotations and finger stretches.", Exercise),
        (15, "Email boundaries", "Set specific times to check emails rather than responding to each notification.", WorkLifeBalance),
        (16, "Standing desk", "If possible, switch to a standing desk for part of your day to improve circulation.", Exercise),
        (17, "Box breathing", "Practice box breathing: inhale for 4 seconds, hold for 4, exhale for 4, hold for 4, repeat.", Mindfulness),
        (18, "Join a workplace group", "Consider joining a workplace interest group to connect with colleagues with similar interests.", Social),
        (19, "Neck rolls", "Gently roll your neck in circles to release tension from long periods of computer work.", Exercise),
        (20, "Meeting-free block", "Block out time in your calendar for focused work without meetings or interruptions.", WorkLifeBalance),
        (21, "Lunchtime walk", "Use part of your lunch break for a quick walk to get fresh air and movement.", Exercise),
        (22, "Progressive muscle relaxation", "Tense and then release each muscle group in your body to release physical tension.", Mindfulness),
        (23, "Mentorship opportunity", "Consider becoming a mentor or finding a mentor to enhance your professional connections.", Social),
        (24, "Eye exercises", "Follow the 20-20-20 rule: every 20 minutes, look at something 20 feet away for 20 seconds.", Exercise),
        (25, "Schedule personal time", "Block time in your calendar for personal activities that recharge you.", WorkLifeBalance),
    ]
    .into_iter()
    .map(|(id, title, description, category)| Recommendation::new(id, title, description, category))
    .collect()
}

/// Ten demo entries dated relative to `now`: a week for user 1, two for user 2, one for user 3.
pub fn mood_records(now: DateTime<Utc>) -> Vec<MoodEntry> {
    [
        (1, 1, 3, "Feeling okay today", 6),
        (2, 1, 4, "Good progress on project", 5),
        (3, 1, 2, "Stressed with deadlines", 4),
        (4, 1, 3, "Better than yesterday", 3),
        (5, 1, 5, "Great day, finished major task", 2),
        (6, 1, 4, "Still feeling good", 1),
        (7, 1, 4, "Looking forward to the weekend", 0),
        (8, 2, 3, "Average day", 5),
        (9, 2, 2, "Difficult meeting", 3),
        (10, 3, 5, "Great progress on project", 2),
    ]
    .into_iter()
    .map(|(id, user_id, score, notes, days_ago)| MoodEntry {
        id,
        user_id,
        score,
        notes: Some(notes.to_string()),
        recorded_at: now - Duration::days(days_ago),
    })
    .collect()
}

/// Demo accounts, all sharing [`DEMO_PASSWORD`].
pub fn users(now: DateTime<Utc>) -> anyhow::Result<Vec<NewUser>> {
    let password_hash = hash_password(DEMO_PASSWORD)?;

    let accounts = [
        ("Admin User", "admin@example.com", "admin", "IT", true, 30, 0),
        ("John Smith", "john.smith@example.com", "john", "Marketing", false, 20, 1),
        ("Emily Johnson", "emily.johnson@example.com", "emily", "HR", false, 15, 2),
    ];

    Ok(accounts
        .into_iter()
        .map(
            |(name, email, username, department, is_admin, joined_days_ago, login_days_ago)| {
                NewUser {
                    name: name.into(),
                    email: email.into(),
                    username: username.into(),
                    password_hash: password_hash.clone(),
                    department: department.into(),
                    team_id: None,
                    is_admin,
                    role: Role::for_admin_flag(is_admin),
                    join_date: now - Duration::days(joined_days_ago),
                    last_login_at: now - Duration::days(login_days_ago),
                }
            },
        )
        .collect())
}

/// Fills empty tables with the demo data. Safe to run on every startup.
pub async fn seed_if_empty(pool: &PgPool) -> anyhow::Result<()> {
    let catalog_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM recommendations")
        .fetch_one(pool)
        .await?;
    if catalog_count == 0 {
        let mut tx = pool.begin().await?;
        for rec in recommendation_catalog() {
            sqlx::query(
                "INSERT INTO recommendations (id, title, description, category) VALUES ($1, $2, $3, $4)",
            )
            .bind(rec.id)
            .bind(&rec.title)
            .bind(&rec.description)
            .bind(rec.category)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        tracing::info!("Seeded recommendation catalog");
    }

    let user_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;
    if user_count == 0 {
        let now = Utc::now();
        let mut tx = pool.begin().await?;
        for user in users(now)? {
            sqlx::query(
                r#"
                INSERT INTO users
                    (name, email, username, password_hash, department, team_id, is_admin, role, join_date, last_login_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                "#,
            )
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.username)
            .bind(&user.password_hash)
            .bind(&user.department)
            .bind(user.team_id)
            .bind(user.is_admin)
            .bind(user.role)
            .bind(user.join_date)
            .bind(user.last_login_at)
            .execute(&mut *tx)
            .await?;
        }
        for mood in mood_records(now) {
            sqlx::query("INSERT INTO mood_records (user_id, score, notes, recorded_at) VALUES ($1, $2, $3, $4)")
                .bind(mood.user_id)
                .bind(mood.score)
                .bind(&mood.notes)
                .bind(mood.recorded_at)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        tracing::info!("Seeded demo users and mood history");
    }

    Ok(())
}
