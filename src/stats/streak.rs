use std::collections::BTreeMap;

use serde_json::Value;
use time::Date;
use tracing::{debug, warn};

use crate::state::AppState;

/// Setting under which the last computed streak is kept.
pub const STREAK_KEY: &str = "streak";

/// Upper bound on how many days the walk inspects.
const MAX_STREAK_DAYS: u32 = 100;

/// Consecutive logged days ending at the most recent logged day, which must
/// be today or yesterday. An unlogged today keeps yesterday's run alive.
pub fn compute_streak(entries_by_date: &BTreeMap<Date, usize>, today: Date) -> u32 {
    let logged = |d: Date| entries_by_date.get(&d).copied().unwrap_or(0) > 0;

    let mut day = if logged(today) {
        today
    } else {
        match today.previous_day() {
            Some(yesterday) if logged(yesterday) => yesterday,
            _ => return 0,
        }
    };

    let mut streak = 0;
    while streak < MAX_STREAK_DAYS && logged(day) {
        streak += 1;
        match day.previous_day() {
            Some(prev) => day = prev,
            None => break,
        }
    }
    streak
}

/// Recomputes the streak from stored entries and saves it.
pub async fn refresh_streak(st: &AppState) -> u32 {
    let buckets = st.storage.weekly_data(MAX_STREAK_DAYS + 1).await;
    let counts: BTreeMap<Date, usize> = buckets
        .iter()
        .map(|b| (b.date, b.entries.len()))
        .collect();
    let streak = compute_streak(&counts, st.clock.today());
    if !st.storage.set_setting(STREAK_KEY, Value::from(streak)).await {
        warn!(streak, "could not save streak");
    }
    debug!(streak, "streak refreshed");
    streak
}

/// Last saved streak; 0 when none was saved.
pub async fn current_streak(st: &AppState) -> u32 {
    match st.storage.setting(STREAK_KEY).await {
        Some(Value::Number(n)) => n.as_u64().map_or(0, |n| n as u32),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}
