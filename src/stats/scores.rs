use std::collections::HashSet;

use serde::Serialize;

use crate::{
    entries::{total_calories, total_water, DayBucket},
    goals::load_goals,
    state::AppState,
};

/// Knobs of the weekly score heuristics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreTuning {
    /// Relative band around the calorie goal that counts as on target.
    pub calorie_tolerance: f64,
    /// Average daily protein grams worth one point.
    pub protein_grams_per_point: f64,
    /// Distinct meal types needed for a full variety score.
    pub meal_types: usize,
    pub max_score: f64,
    /// Score reported when there is nothing to judge.
    pub neutral: f64,
}

impl Default for ScoreTuning {
    fn default() -> Self {
        Self {
            calorie_tolerance: 0.1,
            protein_grams_per_point: 15.0,
            meal_types: 4,
            max_score: 10.0,
            neutral: 5.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyScores {
    pub calorie_score: f64,
    pub health_score: f64,
    pub protein_score: f64,
    pub meal_score: f64,
    pub water_score: f64,
}

impl WeeklyScores {
    fn uniform(v: f64) -> Self {
        Self {
            calorie_score: v,
            health_score: v,
            protein_score: v,
            meal_score: v,
            water_score: v,
        }
    }
}

/// Heuristic 0..=10 scores over a window of day buckets. Only days with at
/// least one food entry count; water is summed over those days.
pub fn compute_weekly_scores(
    days: &[DayBucket],
    calorie_goal: i64,
    water_goal: i64,
    tuning: &ScoreTuning,
) -> WeeklyScores {
    let logged: Vec<&DayBucket> = days.iter().filter(|d| !d.entries.is_empty()).collect();
    if logged.is_empty() {
        return WeeklyScores::uniform(tuning.neutral);
    }
    let n = logged.len() as f64;
    let clamp = |v: f64| v.clamp(0.0, tuning.max_score);

    let goal = calorie_goal as f64;
    let low = goal * (1.0 - tuning.calorie_tolerance);
    let high = goal * (1.0 + tuning.calorie_tolerance);
    let on_target = logged
        .iter()
        .filter(|d| {
            let calories = total_calories(&d.entries) as f64;
            calories >= low && calories <= high
        })
        .count() as f64;

    let entries = logged.iter().flat_map(|d| d.entries.iter());
    let total_entries = entries.clone().count();
    let healthy = entries.clone().filter(|e| e.is_healthy()).count();
    let health_score = if total_entries == 0 {
        tuning.neutral
    } else {
        tuning.max_score * healthy as f64 / total_entries as f64
    };

    let protein = entries.clone().fold(0, |acc: i64, e| acc.saturating_add(e.protein));
    let meal_types: HashSet<_> = entries.map(|e| e.meal_type).collect();

    let water = logged
        .iter()
        .fold(0, |acc: i64, d| acc.saturating_add(total_water(&d.water)));
    let water_score = if water_goal <= 0 {
        tuning.neutral
    } else {
        tuning.max_score * (water as f64 / n) / water_goal as f64
    };

    WeeklyScores {
        calorie_score: clamp(tuning.max_score * on_target / n),
        health_score: clamp(health_score),
        protein_score: clamp((protein as f64 / n) / tuning.protein_grams_per_point),
        meal_score: clamp(tuning.max_score * meal_types.len() as f64 / tuning.meal_types as f64),
        water_score: clamp(water_score),
    }
}

/// Scores for the last seven days against the stored goals.
pub async fn weekly_scores(st: &AppState) -> WeeklyScores {
    let goals = load_goals(st).await;
    let mut days = st.storage.weekly_data(7).await;
    // Weekly bundles from the API may omit water; read it per logged day.
    for day in days.iter_mut().filter(|d| !d.entries.is_empty() && d.water.is_empty()) {
        day.water = st.storage.water_entries(day.date).await;
    }
    compute_weekly_scores(
        &days,
        goals.calorie_goal,
        goals.water_goal,
        &ScoreTuning::default(),
    )
}

#[cfg(test)]
mod tests {
    use time::{macros::date, Date, Duration, OffsetDateTime};

    use super::*;
    use crate::{
        entries::{log_food, FoodEntry, FoodForm, HealthRating, MealType, WaterEntry},
        storage::generate_id,
    };

    const START: Date = date!(2025 - 06 - 04);

    fn food(calories: i64, rating: HealthRating, meal: MealType, protein: i64) -> FoodEntry {
        FoodEntry {
            id: generate_id(),
            food_name: "Meal".into(),
            calories,
            purchased: false,
            store: None,
            health_rating: rating,
            meal_type: meal,
            notes: None,
            protein,
            carbs: 0,
            fat: 0,
            timestamp: OffsetDateTime::UNIX_EPOCH,
            date: START,
        }
    }

    fn water(amount: i64) -> WaterEntry {
        WaterEntry {
            id: generate_id(),
            amount,
            timestamp: OffsetDateTime::UNIX_EPOCH,
            date: None,
        }
    }

    fn week(make: impl Fn(usize) -> DayBucket) -> Vec<DayBucket> {
        (0..7).map(make).collect()
    }

    fn day(i: usize, entries: Vec<FoodEntry>, water: Vec<WaterEntry>) -> DayBucket {
        DayBucket {
            date: START + Duration::days(i as i64),
            entries,
            water,
        }
    }

    #[test]
    fn no_data_is_neutral() {
        let empty = week(|i| day(i, vec![], vec![water(2000)]));
        let scores = compute_weekly_scores(&empty, 2000, 2500, &ScoreTuning::default());
        assert_eq!(scores, WeeklyScores::uniform(5.0));
        let scores = compute_weekly_scores(&[], 0, 0, &ScoreTuning::default());
        assert_eq!(scores, WeeklyScores::uniform(5.0));
    }

    #[test]
    fn every_day_at_goal_is_a_perfect_calorie_score() {
        let days = week(|i| {
            day(
                i,
                vec![food(2000, HealthRating::Healthy, MealType::Lunch, 150)],
                vec![water(2500)],
            )
        });
        let scores = compute_weekly_scores(&days, 2000, 2500, &ScoreTuning::default());
        assert_eq!(scores.calorie_score, 10.0);
        assert_eq!(scores.health_score, 10.0);
        assert_eq!(scores.protein_score, 10.0);
        assert_eq!(scores.meal_score, 2.5);
        assert_eq!(scores.water_score, 10.0);
    }

    #[test]
    fn calorie_band_edges_and_clamping() {
        let days = vec![
            day(0, vec![food(1800, HealthRating::Neutral, MealType::Breakfast, 0)], vec![]),
            day(1, vec![food(2200, HealthRating::Neutral, MealType::Lunch, 0)], vec![]),
            day(2, vec![food(2300, HealthRating::Neutral, MealType::Dinner, 600)], vec![]),
            day(3, vec![food(1000, HealthRating::Neutral, MealType::Snack, 0)], vec![water(20_000)]),
        ];
        let scores = compute_weekly_scores(&days, 2000, 2500, &ScoreTuning::default());
        assert_eq!(scores.calorie_score, 5.0);
        assert_eq!(scores.health_score, 0.0);
        assert_eq!(scores.protein_score, 10.0);
        assert_eq!(scores.meal_score, 10.0);
        assert_eq!(scores.water_score, 10.0);
    }

    #[test]
    fn water_only_counts_logged_days_and_zero_goal_is_neutral() {
        let days = vec![
            day(0, vec![food(500, HealthRating::Healthy, MealType::Lunch, 0)], vec![water(1250)]),
            day(1, vec![], vec![water(5000)]),
        ];
        let scores = compute_weekly_scores(&days, 2000, 2500, &ScoreTuning::default());
        assert_eq!(scores.water_score, 5.0);
        let scores = compute_weekly_scores(&days, 2000, 0, &ScoreTuning::default());
        assert_eq!(scores.water_score, 5.0);
        assert!(!scores.water_score.is_nan());
    }

    fn form(calories: &str, rating: &str) -> FoodForm {
        FoodForm {
            food_name: "Plate".into(),
            calories: calories.into(),
            health_rating: Some(rating.into()),
            meal_type: Some("dinner".into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn one_healthy_of_two_scores_five() {
        let st = AppState::fake();
        let today = st.clock.today();
        log_food(&st, form("500", "3"), today).await.unwrap();
        log_food(&st, form("300", "1"), today).await.unwrap();

        let day = st.storage.food_entries(today).await;
        assert_eq!(total_calories(&day), 800);
        assert_eq!(weekly_scores(&st).await.health_score, 5.0);
    }
}
