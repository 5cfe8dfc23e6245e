mod dto;
mod services;

pub use dto::{ContainerForm, QuickAddFoodItem, WaterContainer};
pub use services::{
    active_quick_adds, add_container, add_quick_add, container_presets, remove_container,
    remove_quick_add, seed_defaults, set_defaults_active, validate_container,
};
