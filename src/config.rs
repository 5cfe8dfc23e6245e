use std::path::PathBuf;

use crate::{
    entries::{HealthRating, MealType},
    goals::Goals,
    storage::StorageMode,
};

/// Built-in quick-add item, before it is given an id and stored.
#[derive(Debug, Clone)]
pub struct QuickAddPreset {
    pub food_name: String,
    pub calories: i64,
    pub protein: i64,
    pub carbs: i64,
    pub fat: i64,
    pub meal_type: MealType,
    pub health_rating: HealthRating,
}

#[derive(Debug, Clone)]
pub struct ContainerPreset {
    pub label: String,
    pub amount: i64,
    pub icon: String,
}

/// Defaults seeded into storage on first run.
#[derive(Debug, Clone)]
pub struct Presets {
    pub goals: Goals,
    pub quick_add: Vec<QuickAddPreset>,
    pub containers: Vec<ContainerPreset>,
}

fn quick(
    name: &str,
    calories: i64,
    (protein, carbs, fat): (i64, i64, i64),
    meal_type: MealType,
    health_rating: HealthRating,
) -> QuickAddPreset {
    QuickAddPreset {
        food_name: name.into(),
        calories,
        protein,
        carbs,
        fat,
        meal_type,
        health_rating,
    }
}

impl Default for Presets {
    fn default() -> Self {
        use HealthRating::*;
        use MealType::*;
        Self {
            goals: Goals::default(),
            quick_add: vec![
                quick("Apple", 95, (0, 25, 0), Snack, Healthy),
                quick("Banana", 105, (1, 27, 0), Snack, Healthy),
                quick("Oatmeal", 150, (5, 27, 3), Breakfast, Healthy),
                quick("Eggs", 140, (12, 1, 10), Breakfast, Healthy),
                quick("Grilled Chicken", 280, (53, 0, 6), Dinner, Healthy),
                quick("Sandwich", 350, (15, 40, 12), Lunch, Neutral),
                quick("Protein Shake", 160, (30, 5, 2), Snack, Neutral),
                quick("Pizza Slice", 285, (12, 36, 10), Dinner, Unhealthy),
            ],
            containers: vec![
                ContainerPreset {
                    label: "Glass".into(),
                    amount: 250,
                    icon: "fa-glass-water".into(),
                },
                ContainerPreset {
                    label: "Bottle".into(),
                    amount: 500,
                    icon: "fa-bottle-water".into(),
                },
                ContainerPreset {
                    label: "Large Bottle".into(),
                    amount: 1000,
                    icon: "fa-bottle-water".into(),
                },
            ],
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_base_url: String,
    pub storage_mode: StorageMode,
    pub local_store_path: PathBuf,
    /// Raw cookie string; the CSRF token is read from its `csrftoken` entry.
    pub csrf_cookie: Option<String>,
    pub http_connect_timeout_secs: u64,
    pub presets: Presets,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let storage_mode = match std::env::var("STORAGE_MODE") {
            Ok(v) => v.parse().map_err(anyhow::Error::msg)?,
            Err(_) => StorageMode::Fallback,
        };
        Ok(Self {
            api_base_url: std::env::var("API_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8000/api".into()),
            storage_mode,
            local_store_path: std::env::var("LOCAL_STORE_PATH")
                .unwrap_or_else(|_| "nutrilog-store.json".into())
                .into(),
            csrf_cookie: std::env::var("CSRF_COOKIE").ok().filter(|v| !v.is_empty()),
            http_connect_timeout_secs: std::env::var("HTTP_CONNECT_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(10),
            presets: Presets::default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entries::{MAX_CALORIES, MAX_WATER_ML};

    #[test]
    fn built_in_presets_are_usable() {
        let presets = Presets::default();
        assert_eq!(presets.quick_add.len(), 8);
        assert_eq!(presets.containers.len(), 3);
        assert!(presets
            .quick_add
            .iter()
            .all(|q| !q.food_name.is_empty() && (0..=MAX_CALORIES).contains(&q.calories)));
        assert!(presets
            .containers
            .iter()
            .all(|c| c.amount > 0 && c.amount <= MAX_WATER_ML));
    }
}
