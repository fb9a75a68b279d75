//! Personalized recommendation heuristic.
//!
//! Scores the four weighted categories from a user's mood history (average
//! band, trend band and keywords in the notes), then picks catalog items in
//! weight order behind a synthetic "overview" item explaining the choice.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::models::mood::MoodEntry;
use crate::models::recommendation::{Category, Recommendation};

/// Overview plus five recommendations.
const MIN_ITEMS: usize = 6;
const MAX_ITEMS: usize = 8;
const PER_CATEGORY: usize = 2;
const EMPTY_HISTORY_ITEMS: usize = 5;

pub const OVERVIEW_ID: i64 = 0;
pub const OVERVIEW_TITLE: &str = "Your Personalized Wellbeing Plan";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoodBand {
    Low,
    Medium,
    Good,
}

impl MoodBand {
    pub fn from_average(avg: f64) -> Self {
        if avg < 2.5 {
            MoodBand::Low
        } else if avg < 3.5 {
            MoodBand::Medium
        } else {
            MoodBand::Good
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendBand {
    Declining,
    Stable,
    Improving,
}

impl TrendBand {
    pub fn from_delta(trend: f64) -> Self {
        if trend < -0.5 {
            TrendBand::Declining
        } else if trend > 0.5 {
            TrendBand::Improving
        } else {
            TrendBand::Stable
        }
    }
}

struct KeywordRule {
    keywords: &'static [&'static str],
    boosts: &'static [(Category, u32)],
}

const KEYWORD_RULES: &[KeywordRule] = &[
    KeywordRule {
        keywords: &["stress", "anxious", "anxiety", "overwhelm", "worried"],
        boosts: &[(Category::Mindfulness, 3), (Category::WorkLifeBalance, 2)],
    },
    KeywordRule {
        keywords: &["tired", "exhausted", "energy", "sleep"],
        boosts: &[(Category::Exercise, 2), (Category::Mindfulness, 1)],
    },
    KeywordRule {
        keywords: &["team", "colleague", "meeting", "collaboration"],
        boosts: &[(Category::Social, 3)],
    },
    KeywordRule {
        keywords: &["deadline", "workload", "balance", "overwork"],
        boosts: &[(Category::WorkLifeBalance, 3)],
    },
];

/// Weight per category, kept in [`Category::WEIGHTED`] order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryWeights([u32; 4]);

impl CategoryWeights {
    fn slot(category: Category) -> Option<usize> {
        Category::WEIGHTED.iter().position(|c| *c == category)
    }

    pub fn add(&mut self, category: Category, amount: u32) {
        if let Some(i) = Self::slot(category) {
            self.0[i] += amount;
        }
    }

    pub fn get(&self, category: Category) -> u32 {
        Self::slot(category).map(|i| self.0[i]).unwrap_or(0)
    }

    /// Categories by weight descending; ties keep declaration order.
    pub fn ranked(&self) -> Vec<(Category, u32)> {
        let mut ranked: Vec<(Category, u32)> = Category::WEIGHTED
            .iter()
            .map(|c| (*c, self.get(*c)))
            .collect();
        // sort_by is stable
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoodSummary {
    pub average: f64,
    /// Most recent score minus oldest score.
    pub trend: f64,
}

pub fn summarize(history: &[MoodEntry]) -> Option<MoodSummary> {
    if history.is_empty() {
        return None;
    }
    let average = history.iter().map(|m| m.score as f64).sum::<f64>() / history.len() as f64;
    let oldest = history.iter().min_by_key(|m| m.recorded_at)?;
    let newest = history.iter().max_by_key(|m| m.recorded_at)?;

    Some(MoodSummary {
        average,
        trend: (newest.score - oldest.score) as f64,
    })
}

pub fn score_categories(history: &[MoodEntry], summary: MoodSummary) -> CategoryWeights {
    let mut weights = CategoryWeights::default();

    match MoodBand::from_average(summary.average) {
        MoodBand::Low => {
            weights.add(Category::Mindfulness, 3);
            weights.add(Category::Social, 2);
        }
        MoodBand::Medium => {
            weights.add(Category::Exercise, 2);
            weights.add(Category::WorkLifeBalance, 2);
        }
        MoodBand::Good => {
            weights.add(Category::Social, 2);
            weights.add(Category::WorkLifeBalance, 1);
        }
    }

    match TrendBand::from_delta(summary.trend) {
        TrendBand::Declining => {
            weights.add(Category::Mindfulness, 2);
            weights.add(Category::Exercise, 1);
        }
        TrendBand::Improving => {
            weights.add(Category::Social, 1);
            weights.add(Category::Exercise, 1);
        }
        TrendBand::Stable => {}
    }

    let notes = history
        .iter()
        .map(|m| m.notes.as_deref().unwrap_or("").to_lowercase())
        .collect::<Vec<_>>()
        .join(" ");

    for rule in KEYWORD_RULES {
        if rule.keywords.iter().any(|k| notes.contains(k)) {
            for (category, amount) in rule.boosts {
                weights.add(*category, *amount);
            }
        }
    }

    weights
}

pub fn overview_message(mood: MoodBand, trend: TrendBand, focus: Category) -> String {
    let base = match (mood, trend) {
        (MoodBand::Low, TrendBand::Declining) => "Your wellbeing seems to have been challenged recently. We've focused on recommendations that can help you regain balance and improve your mental state.",
        (MoodBand::Low, TrendBand::Improving) => "While your mood has been improving, we're providing supportive strategies to continue this positive trajectory and boost your wellbeing further.",
        (MoodBand::Low, TrendBand::Stable) => "Your mood has been consistently lower than ideal. These recommendations are designed to help elevate your wellbeing and introduce positive changes.",
        (MoodBand::Medium, TrendBand::Declining) => "We've noticed your mood trending downward. These recommendations focus on stopping this decline and rebuilding your positive momentum.",
        (MoodBand::Medium, TrendBand::Improving) => "You're on a positive path! These recommendations will help maintain your improving mood and continue building your wellbeing.",
        (MoodBand::Medium, TrendBand::Stable) => "Your wellbeing appears stable in the moderate range. These recommendations aim to help you take the next step toward thriving rather than just coping.",
        (MoodBand::Good, TrendBand::Declining) => "While your overall mood has been good, we've noticed a recent downward trend. These recommendations will help you address this early and maintain your wellbeing.",
        (MoodBand::Good, TrendBand::Improving) => "Excellent progress! Your wellbeing is trending very positively. We've selected recommendations to help you maintain and build on these great results.",
        (MoodBand::Good, TrendBand::Stable) => "Your wellbeing is consistently good. These recommendations focus on maintaining this positive state and introducing new practices to your routine.",
    };

    let focus_sentence = match focus {
        Category::Mindfulness => " We're especially focusing on mindfulness practices to help you manage stress and improve mental clarity.",
        Category::Exercise => " We're highlighting physical activity recommendations to boost your energy and mood through movement.",
        Category::Social => " We're emphasizing social connection strategies to strengthen your support network and sense of belonging.",
        Category::WorkLifeBalance => " We're prioritizing work-life balance techniques to help you create healthier boundaries and reduce burnout risk.",
        Category::Overview => "",
    };

    format!("{base}{focus_sentence}")
}

/// Picks up to `count` random, not yet chosen items matching `filter`.
fn pick<R: Rng + ?Sized>(
    catalog: &[Recommendation],
    chosen: &[Recommendation],
    count: usize,
    filter: impl Fn(&Recommendation) -> bool,
    rng: &mut R,
) -> Vec<Recommendation> {
    let pool: Vec<&Recommendation> = catalog
        .iter()
        .filter(|r| filter(r) && !chosen.iter().any(|c| c.id == r.id))
        .collect();
    pool.choose_multiple(rng, count)
        .map(|r| (*r).clone())
        .collect()
}

/// Personalized list for one user. The first item is always the overview
/// when `history` is non-empty.
pub fn personalize<R: Rng + ?Sized>(
    history: &[MoodEntry],
    catalog: &[Recommendation],
    rng: &mut R,
) -> Vec<Recommendation> {
    let Some(summary) = summarize(history) else {
        return catalog.iter().take(EMPTY_HISTORY_ITEMS).cloned().collect();
    };

    let weights = score_categories(history, summary);
    let ranked = weights.ranked();
    let focus = ranked
        .first()
        .map(|(c, _)| *c)
        .unwrap_or(Category::Mindfulness);

    let mut picked = vec![Recommendation {
        id: OVERVIEW_ID,
        title: OVERVIEW_TITLE.to_string(),
        description: overview_message(
            MoodBand::from_average(summary.average),
            TrendBand::from_delta(summary.trend),
            focus,
        ),
        category: Category::Overview,
    }];

    for (category, weight) in &ranked {
        if *weight == 0 {
            continue;
        }
        let extra = pick(catalog, &picked, PER_CATEGORY, |r| r.category == *category, rng);
        picked.extend(extra);
    }

    if picked.len() < MIN_ITEMS {
        let mut unrepresented: Vec<Category> = Vec::new();
        for rec in catalog {
            if !unrepresented.contains(&rec.category)
                && !picked.iter().any(|p| p.category == rec.category)
            {
                unrepresented.push(rec.category);
            }
        }

        for category in unrepresented {
            let needed = MIN_ITEMS - picked.len();
            let extra = pick(catalog, &picked, needed, |r| r.category == category, rng);
            picked.extend(extra);
            if picked.len() >= MIN_ITEMS {
                break;
            }
        }
    }

    if picked.len() < MIN_ITEMS {
        let needed = MIN_ITEMS - picked.len();
        let extra = pick(catalog, &picked, needed, |_| true, rng);
        picked.extend(extra);
    }

    picked.truncate(MAX_ITEMS);
    picked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::seed::recommendation_catalog;
    use chrono::{Duration, Utc};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn entry(id: i64, score: i32, notes: &str, days_ago: i64) -> MoodEntry {
        MoodEntry {
            id,
            user_id: 1,
            score,
            notes: Some(notes.to_string()),
            recorded_at: Utc::now() - Duration::days(days_ago),
        }
    }

    #[test]
    fn test_empty_history_returns_first_five() {
        let catalog = recommendation_catalog();
        let mut rng = StdRng::seed_from_u64(7);
        let result = personalize(&[], &catalog, &mut rng);

        assert_eq!(result, catalog[..5].to_vec());
    }

    #[test]
    fn test_stressed_deadline_ranks_mindfulness_first() {
        let history = vec![entry(1, 2, "stressed with deadlines", 0)];
        let summary = summarize(&history).unwrap();
        assert_eq!(summary.average, 2.0);
        assert_eq!(summary.trend, 0.0);

        let weights = score_categories(&history, summary);
        assert_eq!(weights.get(Category::Mindfulness), 6);
        assert_eq!(weights.get(Category::WorkLifeBalance), 5);
        assert_eq!(weights.ranked()[0].0, Category::Mindfulness);
    }

    #[test]
    fn test_overview_comes_first_and_length_is_bounded() {
        let catalog = recommendation_catalog();
        let histories = vec![
            vec![entry(1, 1, "", 0)],
            vec![entry(1, 5, "great team lunch", 2), entry(2, 1, "exhausted, no sleep", 0)],
            vec![
                entry(1, 3, "meeting overload and deadline stress", 3),
                entry(2, 4, "tired", 1),
                entry(3, 5, "good balance", 0),
            ],
        ];

        for (seed, history) in histories.iter().enumerate() {
            let mut rng = StdRng::seed_from_u64(seed as u64);
            let result = personalize(history, &catalog, &mut rng);

            assert!(result.len() >= MIN_ITEMS && result.len() <= MAX_ITEMS);
            assert_eq!(result[0].category, Category::Overview);
            assert_eq!(result[0].id, OVERVIEW_ID);

            let mut ids: Vec<i64> = result.iter().map(|r| r.id).collect();
            ids.sort_unstable();
            ids.dedup();
            assert_eq!(ids.len(), result.len(), "no duplicate picks");
        }
    }

    #[test]
    fn test_top_category_is_represented_after_overview() {
        let catalog = recommendation_catalog();
        let history = vec![entry(1, 2, "stressed with deadlines", 0)];
        let mut rng = StdRng::seed_from_u64(42);

        let result = personalize(&history, &catalog, &mut rng);
        assert_eq!(result[1].category, Category::Mindfulness);
        assert_eq!(result[2].category, Category::Mindfulness);
        assert!(result[0].description.contains("mindfulness practices"));
    }

    #[test]
    fn test_trend_uses_recorded_order_not_slice_order() {
        // Newest first in the slice, but the trend is still newest minus oldest.
        let history = vec![entry(2, 5, "", 0), entry(1, 1, "", 5)];
        let summary = summarize(&history).unwrap();
        assert_eq!(summary.trend, 4.0);
        assert_eq!(TrendBand::from_delta(summary.trend), TrendBand::Improving);
    }

    #[test]
    fn test_small_catalog_is_exhausted_without_panicking() {
        let catalog = recommendation_catalog()[..3].to_vec();
        let history = vec![entry(1, 4, "", 0)];
        let mut rng = StdRng::seed_from_u64(1);

        let result = personalize(&history, &catalog, &mut rng);
        assert_eq!(result.len(), 4);
    }

    #[test]
    fn test_same_seed_same_plan() {
        let catalog = recommendation_catalog();
        let history = vec![entry(1, 3, "team meeting", 1), entry(2, 2, "tired", 0)];

        let a = personalize(&history, &catalog, &mut StdRng::seed_from_u64(9));
        let b = personalize(&history, &catalog, &mut StdRng::seed_from_u64(9));
        assert_eq!(a, b);
    }
}
