use serde::{Deserialize, Serialize};

use crate::entries::{null_as_zero, HealthRating, MealType};

fn yes() -> bool {
    true
}

/// Saved food template logged with one action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickAddFoodItem {
    pub id: String,
    pub food_name: String,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub calories: i64,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub protein: i64,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub carbs: i64,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub fat: i64,
    pub meal_type: MealType,
    pub health_rating: HealthRating,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default = "yes")]
    pub is_active: bool,
}

/// Preset drink volume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaterContainer {
    pub id: String,
    pub label: String,
    /// Millilitres.
    #[serde(default, deserialize_with = "null_as_zero")]
    pub amount: i64,
    #[serde(default = "default_icon")]
    pub icon: String,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default = "yes")]
    pub is_active: bool,
}

pub(crate) fn default_icon() -> String {
    "fa-tint".to_string()
}

/// Raw container form input.
#[derive(Debug, Clone, Default)]
pub struct ContainerForm {
    pub label: String,
    pub amount: String,
    pub icon: Option<String>,
}
