use serde_json::{Map, Value};
use time::Date;
use tracing::{info, warn};

use super::dto::{Goals, GoalsUpdate};
use crate::{clock::date_key, error::ValidationError, state::AppState};

/// Setting that records the dates on which the calorie goal was celebrated.
pub const CELEBRATION_KEY: &str = "confettiTriggered";

/// Stored goals, or the configured defaults when none were saved yet.
pub async fn load_goals(st: &AppState) -> Goals {
    st.storage
        .goals()
        .await
        .unwrap_or_else(|| st.config.presets.goals.clone())
}

/// Merges `update` into the current goals and writes the whole record.
/// `Ok(None)` means validation passed but the write did not go through.
pub async fn update_goals(
    st: &AppState,
    update: GoalsUpdate,
) -> Result<Option<Goals>, ValidationError> {
    let current = load_goals(st).await;
    let merged = Goals {
        calorie_goal: update.calorie_goal.unwrap_or(current.calorie_goal),
        protein_goal: update.protein_goal.unwrap_or(current.protein_goal),
        carbs_goal: update.carbs_goal.unwrap_or(current.carbs_goal),
        fat_goal: update.fat_goal.unwrap_or(current.fat_goal),
        water_goal: update.water_goal.unwrap_or(current.water_goal),
    };
    let checks = [
        ("calorie", merged.calorie_goal),
        ("protein", merged.protein_goal),
        ("carbs", merged.carbs_goal),
        ("fat", merged.fat_goal),
        ("water", merged.water_goal),
    ];
    if let Some((name, _)) = checks.iter().find(|(_, v)| *v <= 0) {
        return Err(ValidationError::InvalidGoal(*name));
    }

    let saved = st.storage.update_goals(&merged).await;
    if saved.is_some() {
        info!(calorie_goal = merged.calorie_goal, water_goal = merged.water_goal, "goals saved");
    }
    Ok(saved)
}

/// True exactly once per date: the first time `calories` reaches `goal`.
pub async fn check_celebration(st: &AppState, date: Date, calories: i64, goal: i64) -> bool {
    if goal <= 0 || calories < goal {
        return false;
    }
    let key = date_key(date);
    let mut triggered = match st.storage.setting(CELEBRATION_KEY).await {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    };
    if triggered.get(&key).and_then(Value::as_bool).unwrap_or(false) {
        return false;
    }
    triggered.insert(key, Value::Bool(true));
    if !st
        .storage
        .set_setting(CELEBRATION_KEY, Value::Object(triggered))
        .await
    {
        warn!(%date, "could not record goal celebration");
    }
    info!(%date, calories, goal, "calorie goal reached");
    true
}
