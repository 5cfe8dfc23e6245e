use tracing::{debug, info, instrument, warn};

use super::dto::{default_icon, ContainerForm, QuickAddFoodItem, WaterContainer};
use crate::{
    entries::{validate_food, FoodForm, MAX_WATER_ML},
    error::ValidationError,
    state::AppState,
    storage::generate_id,
};

/// Writes the configured default quick-add items and containers when storage
/// holds none flagged `isDefault`. Returns how many items were written.
#[instrument(skip(st))]
pub async fn seed_defaults(st: &AppState) -> usize {
    let mut seeded = 0;

    let foods = st.storage.quick_add_foods().await;
    if !foods.iter().any(|f| f.is_default) {
        for preset in &st.config.presets.quick_add {
            let item = QuickAddFoodItem {
                id: generate_id(),
                food_name: preset.food_name.clone(),
                calories: preset.calories,
                protein: preset.protein,
                carbs: preset.carbs,
                fat: preset.fat,
                meal_type: preset.meal_type,
                health_rating: preset.health_rating,
                is_default: true,
                is_active: true,
            };
            if st.storage.add_quick_add_food(&item).await.is_some() {
                seeded += 1;
            }
        }
    }

    let containers = st.storage.water_containers().await;
    if !containers.iter().any(|c| c.is_default) {
        for preset in &st.config.presets.containers {
            let container = WaterContainer {
                id: generate_id(),
                label: preset.label.clone(),
                amount: preset.amount,
                icon: preset.icon.clone(),
                is_default: true,
                is_active: true,
            };
            if st.storage.add_water_container(&container).await.is_some() {
                seeded += 1;
            }
        }
    }

    if seeded > 0 {
        info!(seeded, "seeded default presets");
    }
    seeded
}

/// Quick-add items shown for logging: active defaults first, then custom items.
pub async fn active_quick_adds(st: &AppState) -> Vec<QuickAddFoodItem> {
    let (defaults, custom): (Vec<_>, Vec<_>) = st
        .storage
        .quick_add_foods()
        .await
        .into_iter()
        .filter(|f| f.is_active)
        .partition(|f| f.is_default);
    defaults.into_iter().chain(custom).collect()
}

/// Saves a custom quick-add item built from the food form.
#[instrument(skip(st, form))]
pub async fn add_quick_add(
    st: &AppState,
    form: FoodForm,
) -> Result<Option<QuickAddFoodItem>, ValidationError> {
    let food = validate_food(form)?;
    let item = QuickAddFoodItem {
        id: generate_id(),
        food_name: food.food_name,
        calories: food.calories,
        protein: food.nutrition.protein,
        carbs: food.nutrition.carbs,
        fat: food.nutrition.fat,
        meal_type: food.meal_type,
        health_rating: food.health_rating,
        is_default: false,
        is_active: true,
    };
    Ok(st.storage.add_quick_add_food(&item).await)
}

/// Deletes a custom item; a default item is deactivated instead so it can be
/// restored later.
#[instrument(skip(st))]
pub async fn remove_quick_add(st: &AppState, id: &str) -> bool {
    let foods = st.storage.quick_add_foods().await;
    match foods.into_iter().find(|f| f.id == id) {
        Some(mut item) if item.is_default => {
            item.is_active = false;
            st.storage.add_quick_add_food(&item).await.is_some()
        }
        Some(_) => st.storage.remove_quick_add_food(id).await,
        None => {
            debug!(%id, "quick-add item not found");
            true
        }
    }
}

/// Shows or hides every default quick-add item and container.
#[instrument(skip(st))]
pub async fn set_defaults_active(st: &AppState, active: bool) -> bool {
    let mut ok = true;
    for mut item in st.storage.quick_add_foods().await {
        if item.is_default && item.is_active != active {
            item.is_active = active;
            ok &= st.storage.add_quick_add_food(&item).await.is_some();
        }
    }
    for mut container in st.storage.water_containers().await {
        if container.is_default && container.is_active != active {
            container.is_active = active;
            ok &= st.storage.add_water_container(&container).await.is_some();
        }
    }
    if !ok {
        warn!(active, "some default presets could not be updated");
    }
    ok
}

/// Active default containers followed by custom ones.
pub async fn container_presets(st: &AppState) -> Vec<WaterContainer> {
    let (defaults, custom): (Vec<_>, Vec<_>) = st
        .storage
        .water_containers()
        .await
        .into_iter()
        .partition(|c| c.is_default);
    defaults
        .into_iter()
        .filter(|c| c.is_active)
        .chain(custom)
        .collect()
}

pub fn validate_container(form: ContainerForm) -> Result<WaterContainer, ValidationError> {
    let label = form.label.trim();
    let amount = form.amount.trim().parse::<i64>().unwrap_or(0);
    if label.is_empty() || amount <= 0 || amount > MAX_WATER_ML {
        return Err(ValidationError::InvalidContainer);
    }
    Ok(WaterContainer {
        id: generate_id(),
        label: label.to_string(),
        amount,
        icon: form
            .icon
            .map(|i| i.trim().to_string())
            .filter(|i| !i.is_empty())
            .unwrap_or_else(default_icon),
        is_default: false,
        is_active: true,
    })
}

#[instrument(skip(st, form))]
pub async fn add_container(
    st: &AppState,
    form: ContainerForm,
) -> Result<Option<WaterContainer>, ValidationError> {
    let container = validate_container(form)?;
    Ok(st.storage.add_water_container(&container).await)
}

/// Same policy as quick-add items: defaults are hidden, custom ones deleted.
#[instrument(skip(st))]
pub async fn remove_container(st: &AppState, id: &str) -> bool {
    let containers = st.storage.water_containers().await;
    match containers.into_iter().find(|c| c.id == id) {
        Some(mut container) if container.is_default => {
            container.is_active = false;
            st.storage.add_water_container(&container).await.is_some()
        }
        Some(_) => st.storage.remove_water_container(id).await,
        None => true,
    }
}
