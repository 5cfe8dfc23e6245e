mod autocomplete;
mod dto;
mod services;

pub(crate) use dto::null_as_zero;
pub use autocomplete::{auto_fill, most_recent_match, suggest};
pub use dto::{
    DayBucket, DayTotals, FoodEntry, FoodForm, HealthRating, MealType, NewFood, Nutrition,
    WaterEntry,
};
pub use services::{
    clear_all_data, day_totals, delete_food_entry, delete_water_entry, load_day, log_food,
    log_quick_add, log_water, total_calories, total_nutrition, total_water, validate_food,
    validate_water, LoggedFood, MAX_CALORIES, MAX_MACRO_GRAMS, MAX_WATER_ML,
};
