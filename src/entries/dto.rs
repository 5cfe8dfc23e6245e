use std::{fmt, ops::Add, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize};
use time::{Date, OffsetDateTime};

time::serde::format_description!(day_key, Date, "[year]-[month]-[day]");

/// Numeric field that may be missing or `null`; both read as 0.
pub(crate) fn null_as_zero<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<i64>::deserialize(deserializer)?.unwrap_or(0))
}

/// Subjective health tag attached to a food entry. Serialized as "1".."3".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HealthRating {
    #[serde(rename = "1")]
    Unhealthy,
    #[serde(rename = "2")]
    Neutral,
    #[serde(rename = "3")]
    Healthy,
}

impl HealthRating {
    pub fn label(self) -> &'static str {
        match self {
            HealthRating::Unhealthy => "Unhealthy",
            HealthRating::Neutral => "Neutral",
            HealthRating::Healthy => "Healthy",
        }
    }
}

impl FromStr for HealthRating {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1" | "unhealthy" => Ok(HealthRating::Unhealthy),
            "2" | "neutral" => Ok(HealthRating::Neutral),
            "3" | "healthy" => Ok(HealthRating::Healthy),
            other => Err(format!("unknown health rating '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl MealType {
    pub const ALL: [MealType; 4] = [
        MealType::Breakfast,
        MealType::Lunch,
        MealType::Dinner,
        MealType::Snack,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MealType::Breakfast => "breakfast",
            MealType::Lunch => "lunch",
            MealType::Dinner => "dinner",
            MealType::Snack => "snack",
        }
    }
}

impl fmt::Display for MealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for MealType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MealType::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown meal type '{}'", s.trim()))
    }
}

/// One logged food, owned by the day bucket keyed by `date`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodEntry {
    #[serde(default = "crate::storage::generate_id")]
    pub id: String,
    pub food_name: String,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub calories: i64,
    #[serde(default)]
    pub purchased: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store: Option<String>,
    pub health_rating: HealthRating,
    pub meal_type: MealType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub protein: i64,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub carbs: i64,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub fat: i64,
    #[serde(with = "time::serde::rfc3339", default = "OffsetDateTime::now_utc")]
    pub timestamp: OffsetDateTime,
    #[serde(with = "day_key")]
    pub date: Date,
}

impl FoodEntry {
    pub fn is_healthy(&self) -> bool {
        self.health_rating == HealthRating::Healthy
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaterEntry {
    #[serde(default = "crate::storage::generate_id")]
    pub id: String,
    /// Millilitres.
    #[serde(default, deserialize_with = "null_as_zero")]
    pub amount: i64,
    #[serde(with = "time::serde::rfc3339", default = "OffsetDateTime::now_utc")]
    pub timestamp: OffsetDateTime,
    #[serde(
        with = "day_key::option",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub date: Option<Date>,
}

/// Macro totals in grams.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nutrition {
    pub protein: i64,
    pub carbs: i64,
    pub fat: i64,
}

impl Add for Nutrition {
    type Output = Nutrition;

    fn add(self, rhs: Nutrition) -> Nutrition {
        Nutrition {
            protein: self.protein.saturating_add(rhs.protein),
            carbs: self.carbs.saturating_add(rhs.carbs),
            fat: self.fat.saturating_add(rhs.fat),
        }
    }
}

/// All entries for one calendar date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayBucket {
    #[serde(with = "day_key")]
    pub date: Date,
    #[serde(default)]
    pub entries: Vec<FoodEntry>,
    #[serde(default)]
    pub water: Vec<WaterEntry>,
}

impl DayBucket {
    pub fn empty(date: Date) -> Self {
        Self {
            date,
            entries: Vec::new(),
            water: Vec::new(),
        }
    }
}

/// Raw food form input, before validation.
#[derive(Debug, Clone, Default)]
pub struct FoodForm {
    pub food_name: String,
    pub calories: String,
    pub purchased: bool,
    pub store: String,
    pub health_rating: Option<String>,
    pub meal_type: Option<String>,
    pub notes: String,
    pub protein: String,
    pub carbs: String,
    pub fat: String,
}

/// Validated food input; becomes a `FoodEntry` once stamped with id, time and date.
#[derive(Debug, Clone, PartialEq)]
pub struct NewFood {
    pub food_name: String,
    pub calories: i64,
    pub purchased: bool,
    pub store: Option<String>,
    pub health_rating: HealthRating,
    pub meal_type: MealType,
    pub notes: Option<String>,
    pub nutrition: Nutrition,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayTotals {
    pub calories: i64,
    pub nutrition: Nutrition,
    pub water: i64,
    pub entries: usize,
}
