use serde::{Deserialize, Serialize};

/// Daily targets. A single record, replaced as a whole on update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Goals {
    pub calorie_goal: i64,
    pub protein_goal: i64,
    pub carbs_goal: i64,
    pub fat_goal: i64,
    /// Millilitres.
    pub water_goal: i64,
}

impl Default for Goals {
    fn default() -> Self {
        Self {
            calorie_goal: 3000,
            protein_goal: 150,
            carbs_goal: 300,
            fat_goal: 65,
            water_goal: 2500,
        }
    }
}

/// Partial update from the settings form; unset fields keep their value.
#[derive(Debug, Clone, Default)]
pub struct GoalsUpdate {
    pub calorie_goal: Option<i64>,
    pub protein_goal: Option<i64>,
    pub carbs_goal: Option<i64>,
    pub fat_goal: Option<i64>,
    pub water_goal: Option<i64>,
}
