use time::{Date, OffsetDateTime};
use tracing::{info, instrument, warn};

use super::dto::{
    DayBucket, DayTotals, FoodEntry, FoodForm, HealthRating, MealType, NewFood, Nutrition,
    WaterEntry,
};
use crate::{
    confirm::Confirm,
    error::ValidationError,
    goals::{check_celebration, load_goals},
    state::AppState,
    stats::refresh_streak,
    storage::generate_id,
};

/// Largest calorie count accepted for one entry.
pub const MAX_CALORIES: i64 = 100_000;
/// Largest protein, carbs or fat amount accepted for one entry, in grams.
pub const MAX_MACRO_GRAMS: i64 = 10_000;
/// Largest single water entry, in millilitres.
pub const MAX_WATER_ML: i64 = 20_000;

// Stored data can bypass validation, so totals saturate instead of overflowing.
pub fn total_calories(entries: &[FoodEntry]) -> i64 {
    entries.iter().fold(0, |acc: i64, e| acc.saturating_add(e.calories))
}

pub fn total_nutrition(entries: &[FoodEntry]) -> Nutrition {
    entries.iter().fold(Nutrition::default(), |acc, e| {
        acc + Nutrition {
            protein: e.protein,
            carbs: e.carbs,
            fat: e.fat,
        }
    })
}

pub fn total_water(entries: &[WaterEntry]) -> i64 {
    entries.iter().fold(0, |acc: i64, w| acc.saturating_add(w.amount))
}

pub fn day_totals(entries: &[FoodEntry], water: &[WaterEntry]) -> DayTotals {
    DayTotals {
        calories: total_calories(entries),
        nutrition: total_nutrition(entries),
        water: total_water(water),
        entries: entries.len(),
    }
}

fn parse_macro(raw: &str, name: &'static str) -> Result<i64, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(0);
    }
    match raw.parse::<i64>() {
        Ok(v) if (0..=MAX_MACRO_GRAMS).contains(&v) => Ok(v),
        _ => Err(ValidationError::InvalidMacro(name)),
    }
}

/// Checks the food form in the order the user sees the fields.
pub fn validate_food(form: FoodForm) -> Result<NewFood, ValidationError> {
    let food_name = form.food_name.trim().to_string();
    if food_name.is_empty() {
        return Err(ValidationError::MissingFoodName);
    }

    let calories = match form.calories.trim().parse::<i64>() {
        Ok(v) if (0..=MAX_CALORIES).contains(&v) => v,
        _ => return Err(ValidationError::InvalidCalories),
    };

    let store = if form.purchased {
        let store = form.store.trim();
        if store.is_empty() {
            return Err(ValidationError::MissingStore);
        }
        Some(store.to_string())
    } else {
        None
    };

    let health_rating = form
        .health_rating
        .as_deref()
        .and_then(|r| r.parse::<HealthRating>().ok())
        .ok_or(ValidationError::MissingHealthRating)?;
    let meal_type = form
        .meal_type
        .as_deref()
        .and_then(|m| m.parse::<MealType>().ok())
        .ok_or(ValidationError::MissingMealType)?;

    let nutrition = Nutrition {
        protein: parse_macro(&form.protein, "protein")?,
        carbs: parse_macro(&form.carbs, "carbs")?,
        fat: parse_macro(&form.fat, "fat")?,
    };

    let notes = Some(form.notes.trim().to_string()).filter(|n| !n.is_empty());

    Ok(NewFood {
        food_name,
        calories,
        purchased: form.purchased,
        store,
        health_rating,
        meal_type,
        notes,
        nutrition,
    })
}

/// Water amount in millilitres, strictly positive.
pub fn validate_water(raw: &str) -> Result<i64, ValidationError> {
    match raw.trim().parse::<i64>() {
        Ok(v) if v > 0 && v <= MAX_WATER_ML => Ok(v),
        _ => Err(ValidationError::InvalidWaterAmount),
    }
}

impl NewFood {
    pub fn into_entry(self, timestamp: OffsetDateTime, date: Date) -> FoodEntry {
        FoodEntry {
            id: generate_id(),
            food_name: self.food_name,
            calories: self.calories,
            purchased: self.purchased,
            store: self.store,
            health_rating: self.health_rating,
            meal_type: self.meal_type,
            notes: self.notes,
            protein: self.nutrition.protein,
            carbs: self.nutrition.carbs,
            fat: self.nutrition.fat,
            timestamp,
            date,
        }
    }
}

/// Outcome of a successful food log.
#[derive(Debug, Clone)]
pub struct LoggedFood {
    pub entry: FoodEntry,
    pub streak: u32,
    /// First time this day reached the calorie goal.
    pub celebrate: bool,
}

async fn store_food(st: &AppState, food: NewFood, date: Date) -> Option<LoggedFood> {
    let entry = food.into_entry(st.clock.now(), date);
    let saved = st.storage.add_food_entry(&entry).await?;
    info!(id = %saved.id, food = %saved.food_name, calories = saved.calories, %date, "food logged");

    let streak = refresh_streak(st).await;
    let day = st.storage.food_entries(date).await;
    let goals = load_goals(st).await;
    let celebrate = check_celebration(st, date, total_calories(&day), goals.calorie_goal).await;

    Some(LoggedFood {
        entry: saved,
        streak,
        celebrate,
    })
}

/// Validates and stores a food entry for `date`. `Ok(None)` means the form
/// was fine but storage rejected the write.
#[instrument(skip(st, form))]
pub async fn log_food(
    st: &AppState,
    form: FoodForm,
    date: Date,
) -> Result<Option<LoggedFood>, ValidationError> {
    let food = validate_food(form)?;
    Ok(store_food(st, food, date).await)
}

/// Logs an active quick-add item as a food entry.
#[instrument(skip(st))]
pub async fn log_quick_add(
    st: &AppState,
    id: &str,
    date: Date,
) -> Result<Option<LoggedFood>, ValidationError> {
    let item = st
        .storage
        .quick_add_foods()
        .await
        .into_iter()
        .find(|f| f.id == id && f.is_active)
        .ok_or(ValidationError::UnknownQuickAdd)?;
    let food = NewFood {
        food_name: item.food_name,
        calories: item.calories,
        purchased: false,
        store: None,
        health_rating: item.health_rating,
        meal_type: item.meal_type,
        notes: None,
        nutrition: Nutrition {
            protein: item.protein,
            carbs: item.carbs,
            fat: item.fat,
        },
    };
    Ok(store_food(st, food, date).await)
}

#[instrument(skip(st))]
pub async fn log_water(
    st: &AppState,
    amount: &str,
    date: Date,
) -> Result<Option<WaterEntry>, ValidationError> {
    let amount = validate_water(amount)?;
    let entry = WaterEntry {
        id: generate_id(),
        amount,
        timestamp: st.clock.now(),
        date: Some(date),
    };
    let saved = st.storage.add_water_entry(&entry, date).await;
    if let Some(saved) = &saved {
        info!(id = %saved.id, amount, "water logged");
    }
    Ok(saved)
}

/// Food and water for one date.
pub async fn load_day(st: &AppState, date: Date) -> DayBucket {
    DayBucket {
        date,
        entries: st.storage.food_entries(date).await,
        water: st.storage.water_entries(date).await,
    }
}

#[instrument(skip(st, confirm))]
pub async fn delete_food_entry(st: &AppState, id: &str, confirm: &dyn Confirm) -> bool {
    if !confirm.confirm("Are you sure you want to delete this entry?") {
        return false;
    }
    let removed = st.storage.remove_food_entry(id).await;
    if removed {
        refresh_streak(st).await;
    }
    removed
}

#[instrument(skip(st, confirm))]
pub async fn delete_water_entry(st: &AppState, id: &str, confirm: &dyn Confirm) -> bool {
    if !confirm.confirm("Are you sure you want to delete this water entry?") {
        return false;
    }
    st.storage.remove_water_entry(id).await
}

/// Removes every stored entry, preset and setting.
#[instrument(skip(st, confirm))]
pub async fn clear_all_data(st: &AppState, confirm: &dyn Confirm) -> bool {
    if !confirm.confirm("Are you sure you want to clear all data? This cannot be undone.") {
        return false;
    }
    let cleared = st.storage.clear_data().await;
    if cleared {
        warn!("all data cleared");
    }
    cleared
}
