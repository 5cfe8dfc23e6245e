use async_trait::async_trait;
use serde_json::Value;
use time::Date;
use tracing::warn;

use super::{ApiStorage, LocalStorage, StorageClient};
use crate::{
    entries::{DayBucket, FoodEntry, WaterEntry},
    error::StorageResult,
    goals::Goals,
    presets::{QuickAddFoodItem, WaterContainer},
};

/// Routes each operation to the primary adapter and repeats it against the
/// secondary one when the primary is unreachable. No retries, no queueing:
/// writes made while offline stay in the secondary store.
pub struct FallbackStorage<P = ApiStorage, S = LocalStorage> {
    primary: P,
    secondary: S,
}

impl<P, S> FallbackStorage<P, S> {
    pub fn new(primary: P, secondary: S) -> Self {
        Self { primary, secondary }
    }
}

macro_rules! with_fallback {
    ($self:ident, $op:literal, |$client:ident| $call:expr) => {{
        let $client = &$self.primary;
        match $call.await {
            Err(e) if e.is_unavailable() => {
                warn!(error = %e, op = $op, "api unavailable; falling back to local storage");
                let $client = &$self.secondary;
                $call.await
            }
            other => other,
        }
    }};
}

#[async_trait]
impl<P, S> StorageClient for FallbackStorage<P, S>
where
    P: StorageClient,
    S: StorageClient,
{
    async fn food_entries(&self, date: Date) -> StorageResult<Vec<FoodEntry>> {
        with_fallback!(self, "food_entries", |c| c.food_entries(date))
    }

    async fn add_food_entry(&self, entry: &FoodEntry) -> StorageResult<FoodEntry> {
        with_fallback!(self, "add_food_entry", |c| c.add_food_entry(entry))
    }

    async fn remove_food_entry(&self, id: &str) -> StorageResult<()> {
        with_fallback!(self, "remove_food_entry", |c| c.remove_food_entry(id))
    }

    async fn water_entries(&self, date: Date) -> StorageResult<Vec<WaterEntry>> {
        with_fallback!(self, "water_entries", |c| c.water_entries(date))
    }

    async fn add_water_entry(&self, entry: &WaterEntry, date: Date) -> StorageResult<WaterEntry> {
        with_fallback!(self, "add_water_entry", |c| c.add_water_entry(entry, date))
    }

    async fn remove_water_entry(&self, id: &str) -> StorageResult<()> {
        with_fallback!(self, "remove_water_entry", |c| c.remove_water_entry(id))
    }

    async fn food_database(&self) -> StorageResult<Vec<String>> {
        with_fallback!(self, "food_database", |c| c.food_database())
    }

    async fn store_database(&self) -> StorageResult<Vec<String>> {
        with_fallback!(self, "store_database", |c| c.store_database())
    }

    async fn quick_add_foods(&self) -> StorageResult<Vec<QuickAddFoodItem>> {
        with_fallback!(self, "quick_add_foods", |c| c.quick_add_foods())
    }

    async fn add_quick_add_food(&self, item: &QuickAddFoodItem) -> StorageResult<QuickAddFoodItem> {
        with_fallback!(self, "add_quick_add_food", |c| c.add_quick_add_food(item))
    }

    async fn remove_quick_add_food(&self, id: &str) -> StorageResult<()> {
        with_fallback!(self, "remove_quick_add_food", |c| c.remove_quick_add_food(id))
    }

    async fn water_containers(&self) -> StorageResult<Vec<WaterContainer>> {
        with_fallback!(self, "water_containers", |c| c.water_containers())
    }

    async fn add_water_container(&self, container: &WaterContainer) -> StorageResult<WaterContainer> {
        with_fallback!(self, "add_water_container", |c| c.add_water_container(container))
    }

    async fn remove_water_container(&self, id: &str) -> StorageResult<()> {
        with_fallback!(self, "remove_water_container", |c| c.remove_water_container(id))
    }

    async fn setting(&self, key: &str) -> StorageResult<Option<Value>> {
        with_fallback!(self, "setting", |c| c.setting(key))
    }

    async fn set_setting(&self, key: &str, value: Value) -> StorageResult<()> {
        with_fallback!(self, "set_setting", |c| c.set_setting(key, value.clone()))
    }

    async fn weekly_data(&self, days_back: u32) -> StorageResult<Vec<DayBucket>> {
        with_fallback!(self, "weekly_data", |c| c.weekly_data(days_back))
    }

    async fn goals(&self) -> StorageResult<Option<Goals>> {
        with_fallback!(self, "goals", |c| c.goals())
    }

    async fn update_goals(&self, goals: &Goals) -> StorageResult<Goals> {
        with_fallback!(self, "update_goals", |c| c.update_goals(goals))
    }

    async fn clear_data(&self) -> StorageResult<()> {
        with_fallback!(self, "clear_data", |c| c.clear_data())
    }

    async fn export_data(&self) -> StorageResult<Value> {
        with_fallback!(self, "export_data", |c| c.export_data())
    }

    async fn import_data(&self, data: &Value) -> StorageResult<()> {
        with_fallback!(self, "import_data", |c| c.import_data(data))
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use time::macros::{date, datetime};

    use super::*;
    use crate::{
        clock::FixedClock,
        entries::{HealthRating, MealType},
    };

    fn unreachable_api() -> ApiStorage {
        // Port 9 (discard) on localhost refuses connections.
        ApiStorage::new("http://127.0.0.1:9/api", None, Duration::from_millis(200)).unwrap()
    }

    #[tokio::test]
    async fn writes_and_reads_go_to_local_when_api_is_down() {
        let local = LocalStorage::in_memory(Arc::new(FixedClock::at_date(date!(2025 - 06 - 10))));
        let storage = FallbackStorage::new(unreachable_api(), local);

        let entry = FoodEntry {
            id: "f1".into(),
            food_name: "Eggs".into(),
            calories: 140,
            purchased: false,
            store: None,
            health_rating: HealthRating::Healthy,
            meal_type: MealType::Breakfast,
            notes: Some("two".into()),
            protein: 12,
            carbs: 1,
            fat: 10,
            timestamp: datetime!(2025-06-10 07:30 UTC),
            date: date!(2025 - 06 - 10),
        };
        let saved = storage.add_food_entry(&entry).await.unwrap();
        assert_eq!(saved, entry);

        let read = storage.food_entries(date!(2025 - 06 - 10)).await.unwrap();
        assert_eq!(read, vec![entry]);
        assert_eq!(storage.food_database().await.unwrap(), vec!["Eggs".to_string()]);
    }
}
