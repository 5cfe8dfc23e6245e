use serde::Serialize;
use time::Date;

use crate::{
    clock::weekday_label,
    entries::{total_calories, total_nutrition, total_water, DayBucket, FoodEntry, Nutrition},
    state::AppState,
};

/// One chart point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint<T> {
    pub date: Date,
    pub label: &'static str,
    pub value: T,
}

pub fn weekly_calorie_series(days: &[DayBucket]) -> Vec<SeriesPoint<i64>> {
    days.iter()
        .map(|d| SeriesPoint {
            date: d.date,
            label: weekday_label(d.date),
            value: total_calories(&d.entries),
        })
        .collect()
}

pub fn weekly_nutrition_series(days: &[DayBucket]) -> Vec<SeriesPoint<Nutrition>> {
    days.iter()
        .map(|d| SeriesPoint {
            date: d.date,
            label: weekday_label(d.date),
            value: total_nutrition(&d.entries),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklySummary {
    pub avg_calories: i64,
    pub logged_days: usize,
    pub healthy_percent: i64,
    /// Highest-calorie entry rated healthy.
    pub best_healthy: Option<FoodEntry>,
}

pub fn weekly_summary(days: &[DayBucket]) -> WeeklySummary {
    let logged: Vec<&DayBucket> = days.iter().filter(|d| !d.entries.is_empty()).collect();
    let entries: Vec<&FoodEntry> = logged.iter().flat_map(|d| d.entries.iter()).collect();
    let calories = entries.iter().fold(0, |acc: i64, e| acc.saturating_add(e.calories));
    let healthy = entries.iter().filter(|e| e.is_healthy()).count();

    WeeklySummary {
        avg_calories: if logged.is_empty() {
            0
        } else {
            (calories as f64 / logged.len() as f64).round() as i64
        },
        logged_days: logged.len(),
        healthy_percent: if entries.is_empty() {
            0
        } else {
            (100.0 * healthy as f64 / entries.len() as f64).round() as i64
        },
        best_healthy: entries
            .iter()
            .filter(|e| e.is_healthy())
            .max_by_key(|e| e.calories)
            .map(|e| (*e).clone()),
    }
}

/// Healthy share of one day's entries on a 0..=10 scale; 0 for an empty day.
pub fn day_health_score(entries: &[FoodEntry]) -> i64 {
    if entries.is_empty() {
        return 0;
    }
    let healthy = entries.iter().filter(|e| e.is_healthy()).count();
    (10.0 * healthy as f64 / entries.len() as f64).round() as i64
}

/// Relative change in percent. A zero baseline divides by one.
pub fn percent_change(current: i64, previous: i64) -> i64 {
    let base = if previous == 0 { 1.0 } else { previous as f64 };
    ((current as f64 - previous as f64) / base * 100.0).round() as i64
}

/// Percentage of `goal` reached, capped at 100.
pub fn goal_progress(value: i64, goal: i64) -> f64 {
    if goal <= 0 {
        return 0.0;
    }
    (value as f64 / goal as f64 * 100.0).min(100.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CalorieRing {
    pub consumed: i64,
    /// Negative once the goal is exceeded.
    pub remaining: i64,
    pub percent: f64,
}

pub fn calorie_ring(consumed: i64, goal: i64) -> CalorieRing {
    CalorieRing {
        consumed,
        remaining: goal.saturating_sub(consumed),
        percent: goal_progress(consumed, goal),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyComparison {
    pub water_change: i64,
    pub calorie_change: i64,
    pub healthy_change: i64,
}

/// Today against yesterday for the dashboard cards.
pub async fn daily_comparison(st: &AppState, date: Date) -> DailyComparison {
    let Some(previous) = date.previous_day() else {
        return DailyComparison {
            water_change: 0,
            calorie_change: 0,
            healthy_change: 0,
        };
    };
    let (today_food, prev_food) = (
        st.storage.food_entries(date).await,
        st.storage.food_entries(previous).await,
    );
    let (today_water, prev_water) = (
        st.storage.water_entries(date).await,
        st.storage.water_entries(previous).await,
    );
    let healthy = |entries: &[FoodEntry]| entries.iter().filter(|e| e.is_healthy()).count() as i64;

    DailyComparison {
        water_change: percent_change(total_water(&today_water), total_water(&prev_water)),
        calorie_change: percent_change(total_calories(&today_food), total_calories(&prev_food)),
        healthy_change: percent_change(healthy(&today_food), healthy(&prev_food)),
    }
}
