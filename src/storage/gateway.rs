use std::sync::Arc;

use serde_json::Value;
use time::Date;
use tracing::warn;

use super::StorageClient;
use crate::{
    entries::{DayBucket, FoodEntry, WaterEntry},
    error::StorageResult,
    goals::Goals,
    presets::{QuickAddFoodItem, WaterContainer},
};

/// Fail-soft front of the storage port.
///
/// Reads never fail: an unreadable collection comes back empty and a missing
/// record as `None`. Writes report failure through their return value
/// (`None` / `false`) so callers can warn the user. Every failure is logged.
#[derive(Clone)]
pub struct PersistenceGateway {
    client: Arc<dyn StorageClient>,
}

fn soft_read<T: Default>(op: &'static str, res: StorageResult<T>) -> T {
    res.unwrap_or_else(|e| {
        warn!(error = %e, op, "storage read failed; using empty result");
        T::default()
    })
}

fn soft_write<T>(op: &'static str, res: StorageResult<T>) -> Option<T> {
    match res {
        Ok(v) => Some(v),
        Err(e) => {
            warn!(error = %e, op, "storage write failed");
            None
        }
    }
}

impl PersistenceGateway {
    pub fn new(client: Arc<dyn StorageClient>) -> Self {
        Self { client }
    }

    pub async fn food_entries(&self, date: Date) -> Vec<FoodEntry> {
        soft_read("food_entries", self.client.food_entries(date).await)
    }

    pub async fn add_food_entry(&self, entry: &FoodEntry) -> Option<FoodEntry> {
        soft_write("add_food_entry", self.client.add_food_entry(entry).await)
    }

    pub async fn remove_food_entry(&self, id: &str) -> bool {
        soft_write("remove_food_entry", self.client.remove_food_entry(id).await).is_some()
    }

    pub async fn water_entries(&self, date: Date) -> Vec<WaterEntry> {
        soft_read("water_entries", self.client.water_entries(date).await)
    }

    pub async fn add_water_entry(&self, entry: &WaterEntry, date: Date) -> Option<WaterEntry> {
        soft_write("add_water_entry", self.client.add_water_entry(entry, date).await)
    }

    pub async fn remove_water_entry(&self, id: &str) -> bool {
        soft_write("remove_water_entry", self.client.remove_water_entry(id).await).is_some()
    }

    pub async fn food_database(&self) -> Vec<String> {
        soft_read("food_database", self.client.food_database().await)
    }

    pub async fn store_database(&self) -> Vec<String> {
        soft_read("store_database", self.client.store_database().await)
    }

    pub async fn quick_add_foods(&self) -> Vec<QuickAddFoodItem> {
        soft_read("quick_add_foods", self.client.quick_add_foods().await)
    }

    pub async fn add_quick_add_food(&self, item: &QuickAddFoodItem) -> Option<QuickAddFoodItem> {
        soft_write("add_quick_add_food", self.client.add_quick_add_food(item).await)
    }

    pub async fn remove_quick_add_food(&self, id: &str) -> bool {
        soft_write("remove_quick_add_food", self.client.remove_quick_add_food(id).await).is_some()
    }

    pub async fn water_containers(&self) -> Vec<WaterContainer> {
        soft_read("water_containers", self.client.water_containers().await)
    }

    pub async fn add_water_container(&self, container: &WaterContainer) -> Option<WaterContainer> {
        soft_write("add_water_container", self.client.add_water_container(container).await)
    }

    pub async fn remove_water_container(&self, id: &str) -> bool {
        soft_write("remove_water_container", self.client.remove_water_container(id).await)
            .is_some()
    }

    pub async fn setting(&self, key: &str) -> Option<Value> {
        soft_read("setting", self.client.setting(key).await)
    }

    pub async fn set_setting(&self, key: &str, value: Value) -> bool {
        soft_write("set_setting", self.client.set_setting(key, value).await).is_some()
    }

    pub async fn weekly_data(&self, days_back: u32) -> Vec<DayBucket> {
        soft_read("weekly_data", self.client.weekly_data(days_back).await)
    }

    pub async fn goals(&self) -> Option<Goals> {
        soft_read("goals", self.client.goals().await)
    }

    pub async fn update_goals(&self, goals: &Goals) -> Option<Goals> {
        soft_write("update_goals", self.client.update_goals(goals).await)
    }

    pub async fn clear_data(&self) -> bool {
        soft_write("clear_data", self.client.clear_data().await).is_some()
    }

    pub async fn export_data(&self) -> Option<Value> {
        soft_write("export_data", self.client.export_data().await)
    }

    pub async fn import_data(&self, data: &Value) -> bool {
        soft_write("import_data", self.client.import_data(data).await).is_some()
    }
}
