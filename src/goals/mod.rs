mod dto;
mod services;

pub use dto::{Goals, GoalsUpdate};
pub use services::{check_celebration, load_goals, update_goals, CELEBRATION_KEY};
