use super::dto::{DayBucket, FoodEntry};
use crate::state::AppState;

/// How far back auto-fill looks for a previous entry.
const AUTO_FILL_DAYS: u32 = 30;

/// Names containing `query`, case-insensitively, in stored order.
pub fn suggest<'a>(names: &'a [String], query: &str) -> Vec<&'a str> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return Vec::new();
    }
    names
        .iter()
        .filter(|name| name.to_lowercase().contains(&query))
        .map(String::as_str)
        .collect()
}

/// Most recent entry, by timestamp, whose name matches `food_name`.
pub fn most_recent_match<'a>(buckets: &'a [DayBucket], food_name: &str) -> Option<&'a FoodEntry> {
    let wanted = food_name.trim();
    buckets
        .iter()
        .flat_map(|b| b.entries.iter())
        .filter(|e| e.food_name.trim().eq_ignore_ascii_case(wanted))
        .max_by_key(|e| e.timestamp)
}

/// Previous entry to pre-fill the food form from, if one was logged recently.
pub async fn auto_fill(st: &AppState, food_name: &str) -> Option<FoodEntry> {
    if food_name.trim().is_empty() {
        return None;
    }
    let buckets = st.storage.weekly_data(AUTO_FILL_DAYS).await;
    most_recent_match(&buckets, food_name).cloned()
}
