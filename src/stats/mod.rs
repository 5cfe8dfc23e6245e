mod dashboard;
mod scores;
mod streak;
mod water;
mod weekly;

pub use dashboard::{
    favourite_foods, favourite_stores, monthly_water_series, top_foods, top_stores, water_year,
    FavouriteFood, FavouriteStore, MonthWater, WaterYear, FAVOURITES_WINDOW_DAYS,
};
pub use scores::{compute_weekly_scores, weekly_scores, ScoreTuning, WeeklyScores};
pub use streak::{compute_streak, current_streak, refresh_streak, STREAK_KEY};
pub use water::{water_week, water_week_stats, WaterDay, WaterStatus, WaterWeekStats};
pub use weekly::{
    calorie_ring, daily_comparison, day_health_score, goal_progress, percent_change,
    weekly_calorie_series, weekly_nutrition_series, weekly_summary, CalorieRing, DailyComparison,
    SeriesPoint, WeeklySummary,
};
