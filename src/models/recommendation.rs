use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "recommendation_category")]
pub enum Category {
    Mindfulness,
    Exercise,
    Social,
    #[sqlx(rename = "Work-Life Balance")]
    #[serde(rename = "Work-Life Balance")]
    WorkLifeBalance,
    Overview,
}

impl Category {
    /// Categories the recommendation engine weighs, in tie-break order.
    pub const WEIGHTED: [Category; 4] = [
        Category::Mindfulness,
        Category::Exercise,
        Category::Social,
        Category::WorkLifeBalance,
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Recommendation {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub category: Category,
}

impl Recommendation {
    pub fn new(id: i64, title: &str, description: &str, category: Category) -> Self {
        Self {
            id,
            title: title.to_string(),
            description: description.to_string(),
            category,
        }
    }
}
