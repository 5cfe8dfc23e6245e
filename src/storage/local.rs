use std::{path::Path, sync::Arc};

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use time::Date;
use tracing::{debug, warn};

use super::{
    kv::{FileStore, KeyValueStore, MemoryStore},
    Identified, StorageClient,
};
use crate::{
    clock::{date_key, days_before, Clock},
    entries::{DayBucket, FoodEntry, WaterEntry},
    error::StorageResult,
    goals::Goals,
    presets::{QuickAddFoodItem, WaterContainer},
};

const FOOD_PREFIX: &str = "foodEntries_";
const WATER_PREFIX: &str = "waterEntries_";
const QUICK_ADD_KEY: &str = "quickAddFoods";
const CONTAINERS_KEY: &str = "customWaterContainers";
const FOOD_DATABASE_KEY: &str = "foodDatabase";
const STORE_DATABASE_KEY: &str = "storeDatabase";
const GOALS_KEY: &str = "goals";

pub(crate) fn food_key(date: Date) -> String {
    format!("{FOOD_PREFIX}{}", date_key(date))
}

pub(crate) fn water_key(date: Date) -> String {
    format!("{WATER_PREFIX}{}", date_key(date))
}

/// Storage adapter over a key-value store, mirroring the API's data with
/// deterministic key names.
pub struct LocalStorage {
    kv: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
}

impl LocalStorage {
    pub fn new(kv: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self { kv, clock }
    }

    pub fn in_memory(clock: Arc<dyn Clock>) -> Self {
        Self::new(Arc::new(MemoryStore::new()), clock)
    }

    pub fn open_file(path: impl AsRef<Path>, clock: Arc<dyn Clock>) -> anyhow::Result<Self> {
        let storage = Self::new(Arc::new(FileStore::open(path)?), clock);
        if let Err(e) = storage.normalize() {
            warn!(error = %e, "local store cleanup failed; continuing");
        }
        Ok(storage)
    }

    /// Rewrites every day bucket so entries saved without ids, timestamps or
    /// macro fields get them persisted.
    pub fn normalize(&self) -> StorageResult<usize> {
        let mut rewritten = 0;
        for key in self.kv.keys()? {
            if key.starts_with(FOOD_PREFIX) {
                let entries: Vec<FoodEntry> = self.read(&key)?;
                self.write(&key, &entries)?;
                rewritten += 1;
            } else if key.starts_with(WATER_PREFIX) {
                let entries: Vec<WaterEntry> = self.read(&key)?;
                self.write(&key, &entries)?;
                rewritten += 1;
            }
        }
        debug!(buckets = rewritten, "normalized local buckets");
        Ok(rewritten)
    }

    fn read<T: DeserializeOwned + Default>(&self, key: &str) -> StorageResult<T> {
        match self.kv.get(key)? {
            Some(raw) if !raw.trim().is_empty() => Ok(serde_json::from_str(&raw)?),
            _ => Ok(T::default()),
        }
    }

    fn write<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> StorageResult<()> {
        self.kv.set(key, serde_json::to_string(value)?)
    }

    fn upsert<T>(&self, key: &str, item: &T) -> StorageResult<()>
    where
        T: Identified + Clone + Serialize + DeserializeOwned,
    {
        let mut items: Vec<T> = self.read(key)?;
        match items.iter_mut().find(|existing| existing.id() == item.id()) {
            Some(existing) => *existing = item.clone(),
            None => items.push(item.clone()),
        }
        self.write(key, &items)
    }

    fn remove_by_id<T>(&self, key: &str, id: &str) -> StorageResult<bool>
    where
        T: Identified + Serialize + DeserializeOwned,
    {
        let mut items: Vec<T> = self.read(key)?;
        let before = items.len();
        items.retain(|item| item.id() != id);
        if items.len() == before {
            return Ok(false);
        }
        self.write(key, &items)?;
        Ok(true)
    }

    fn remove_from_buckets<T>(&self, prefix: &str, id: &str) -> StorageResult<()>
    where
        T: Identified + Serialize + DeserializeOwned,
    {
        for key in self.kv.keys()?.into_iter().filter(|k| k.starts_with(prefix)) {
            if self.remove_by_id::<T>(&key, id)? {
                debug!(%key, %id, "removed entry");
                return Ok(());
            }
        }
        debug!(%id, "entry not found; nothing to remove");
        Ok(())
    }

    fn remember_name(&self, key: &str, name: &str) -> StorageResult<()> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(());
        }
        let mut names: Vec<String> = self.read(key)?;
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
            self.write(key, &names)?;
        }
        Ok(())
    }
}

#[async_trait]
impl StorageClient for LocalStorage {
    async fn food_entries(&self, date: Date) -> StorageResult<Vec<FoodEntry>> {
        self.read(&food_key(date))
    }

    async fn add_food_entry(&self, entry: &FoodEntry) -> StorageResult<FoodEntry> {
        self.upsert(&food_key(entry.date), entry)?;
        self.remember_name(FOOD_DATABASE_KEY, &entry.food_name)?;
        if entry.purchased {
            if let Some(store) = entry.store.as_deref() {
                self.remember_name(STORE_DATABASE_KEY, store)?;
            }
        }
        Ok(entry.clone())
    }

    async fn remove_food_entry(&self, id: &str) -> StorageResult<()> {
        self.remove_from_buckets::<FoodEntry>(FOOD_PREFIX, id)
    }

    async fn water_entries(&self, date: Date) -> StorageResult<Vec<WaterEntry>> {
        self.read(&water_key(date))
    }

    async fn add_water_entry(&self, entry: &WaterEntry, date: Date) -> StorageResult<WaterEntry> {
        let mut entry = entry.clone();
        entry.date = Some(date);
        self.upsert(&water_key(date), &entry)?;
        Ok(entry)
    }

    async fn remove_water_entry(&self, id: &str) -> StorageResult<()> {
        self.remove_from_buckets::<WaterEntry>(WATER_PREFIX, id)
    }

    async fn food_database(&self) -> StorageResult<Vec<String>> {
        self.read(FOOD_DATABASE_KEY)
    }

    async fn store_database(&self) -> StorageResult<Vec<String>> {
        self.read(STORE_DATABASE_KEY)
    }

    async fn quick_add_foods(&self) -> StorageResult<Vec<QuickAddFoodItem>> {
        self.read(QUICK_ADD_KEY)
    }

    async fn add_quick_add_food(&self, item: &QuickAddFoodItem) -> StorageResult<QuickAddFoodItem> {
        self.upsert(QUICK_ADD_KEY, item)?;
        Ok(item.clone())
    }

    async fn remove_quick_add_food(&self, id: &str) -> StorageResult<()> {
        self.remove_by_id::<QuickAddFoodItem>(QUICK_ADD_KEY, id)?;
        Ok(())
    }

    async fn water_containers(&self) -> StorageResult<Vec<WaterContainer>> {
        self.read(CONTAINERS_KEY)
    }

    async fn add_water_container(&self, container: &WaterContainer) -> StorageResult<WaterContainer> {
        self.upsert(CONTAINERS_KEY, container)?;
        Ok(container.clone())
    }

    async fn remove_water_container(&self, id: &str) -> StorageResult<()> {
        self.remove_by_id::<WaterContainer>(CONTAINERS_KEY, id)?;
        Ok(())
    }

    async fn setting(&self, key: &str) -> StorageResult<Option<Value>> {
        // Older stores hold bare strings such as `3000`; keep them readable.
        Ok(self.kv.get(key)?.map(|raw| {
            serde_json::from_str(&raw).unwrap_or(Value::String(raw))
        }))
    }

    async fn set_setting(&self, key: &str, value: Value) -> StorageResult<()> {
        self.write(key, &value)
    }

    async fn weekly_data(&self, days_back: u32) -> StorageResult<Vec<DayBucket>> {
        let today = self.clock.today();
        let mut days = Vec::with_capacity(days_back as usize);
        for offset in (0..i64::from(days_back)).rev() {
            let date = days_before(today, offset);
            days.push(DayBucket {
                date,
                entries: self.read(&food_key(date))?,
                water: self.read(&water_key(date))?,
            });
        }
        Ok(days)
    }

    async fn goals(&self) -> StorageResult<Option<Goals>> {
        match self.kv.get(GOALS_KEY)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn update_goals(&self, goals: &Goals) -> StorageResult<Goals> {
        self.write(GOALS_KEY, goals)?;
        Ok(goals.clone())
    }

    async fn clear_data(&self) -> StorageResult<()> {
        for key in self.kv.keys()? {
            self.kv.remove(&key)?;
        }
        Ok(())
    }

    async fn export_data(&self) -> StorageResult<Value> {
        let mut out = Map::new();
        for key in self.kv.keys()? {
            if let Some(raw) = self.kv.get(&key)? {
                let value = serde_json::from_str(&raw).unwrap_or(Value::String(raw));
                out.insert(key, value);
            }
        }
        Ok(Value::Object(out))
    }

    async fn import_data(&self, data: &Value) -> StorageResult<()> {
        let Some(items) = data.as_object() else {
            return Err(crate::error::StorageError::Decode {
                path: "import".into(),
                message: "expected a JSON object".into(),
            });
        };
        for (key, value) in items {
            self.write(key, value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        clock::FixedClock,
        entries::{HealthRating, MealType},
    };
    use time::macros::{date, datetime};

    fn storage() -> LocalStorage {
        LocalStorage::in_memory(Arc::new(FixedClock::at_date(date!(2025 - 06 - 10))))
    }

    fn entry(id: &str, date: Date, calories: i64) -> FoodEntry {
        FoodEntry {
            id: id.into(),
            food_name: "Oatmeal".into(),
            calories,
            purchased: true,
            store: Some("Aldi".into()),
            health_rating: HealthRating::Healthy,
            meal_type: MealType::Breakfast,
            notes: None,
            protein: 10,
            carbs: 50,
            fat: 5,
            timestamp: datetime!(2025-06-10 08:00 UTC),
            date,
        }
    }

    #[tokio::test]
    async fn food_entry_round_trips_under_its_day_key() {
        let s = storage();
        let e = entry("a1", date!(2025 - 06 - 10), 300);
        s.add_food_entry(&e).await.unwrap();

        assert_eq!(s.food_entries(date!(2025 - 06 - 10)).await.unwrap(), vec![e]);
        assert!(s.food_entries(date!(2025 - 06 - 09)).await.unwrap().is_empty());
        assert!(s.kv.get("foodEntries_2025-06-10").unwrap().is_some());
        assert_eq!(s.food_database().await.unwrap(), vec!["Oatmeal".to_string()]);
        assert_eq!(s.store_database().await.unwrap(), vec!["Aldi".to_string()]);
    }

    #[tokio::test]
    async fn adding_same_id_replaces_entry() {
        let s = storage();
        s.add_food_entry(&entry("a1", date!(2025 - 06 - 10), 300)).await.unwrap();
        s.add_food_entry(&entry("a1", date!(2025 - 06 - 10), 450)).await.unwrap();
        let entries = s.food_entries(date!(2025 - 06 - 10)).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].calories, 450);
    }

    #[tokio::test]
    async fn removing_unknown_id_is_a_no_op() {
        let s = storage();
        s.add_food_entry(&entry("a1", date!(2025 - 06 - 10), 300)).await.unwrap();
        s.remove_food_entry("missing").await.unwrap();
        s.remove_water_entry("missing").await.unwrap();
        assert_eq!(s.food_entries(date!(2025 - 06 - 10)).await.unwrap().len(), 1);

        s.remove_food_entry("a1").await.unwrap();
        assert!(s.food_entries(date!(2025 - 06 - 10)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn weekly_data_is_oldest_first_and_ends_today() {
        let s = storage();
        s.add_food_entry(&entry("a1", date!(2025 - 06 - 08), 300)).await.unwrap();
        let water = WaterEntry {
            id: "w1".into(),
            amount: 250,
            timestamp: datetime!(2025-06-10 09:00 UTC),
            date: None,
        };
        s.add_water_entry(&water, date!(2025 - 06 - 10)).await.unwrap();

        let week = s.weekly_data(7).await.unwrap();
        assert_eq!(week.len(), 7);
        assert_eq!(week[0].date, date!(2025 - 06 - 04));
        assert_eq!(week[6].date, date!(2025 - 06 - 10));
        assert_eq!(week[4].entries.len(), 1);
        assert_eq!(week[6].water[0].amount, 250);
    }

    #[tokio::test]
    async fn legacy_setting_values_are_readable() {
        let s = storage();
        s.kv.set("calorieGoal", "2800".into()).unwrap();
        s.kv.set("theme", "dark".into()).unwrap();
        assert_eq!(s.setting("calorieGoal").await.unwrap(), Some(Value::from(2800)));
        assert_eq!(s.setting("theme").await.unwrap(), Some(Value::from("dark")));
        assert_eq!(s.setting("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn normalize_assigns_missing_fields() {
        let s = storage();
        s.kv.set(
            "foodEntries_2025-06-10",
            r#"[{"foodName":"Toast","calories":120,"healthRating":"2","mealType":"breakfast","date":"2025-06-10"}]"#.into(),
        )
        .unwrap();
        s.normalize().unwrap();

        let first = s.food_entries(date!(2025 - 06 - 10)).await.unwrap();
        let second = s.food_entries(date!(2025 - 06 - 10)).await.unwrap();
        assert_eq!(first[0].protein, 0);
        assert!(!first[0].id.is_empty());
        assert_eq!(first[0].id, second[0].id);
    }

    #[tokio::test]
    async fn null_calories_do_not_hide_the_rest_of_the_day() {
        let s = storage();
        s.kv.set(
            "foodEntries_2025-06-10",
            r#"[{"id":"n1","foodName":"Tea","calories":null,"healthRating":"2","mealType":"snack","date":"2025-06-10"},
                {"id":"v1","foodName":"Toast","calories":120,"healthRating":"2","mealType":"breakfast","date":"2025-06-10"}]"#
                .into(),
        )
        .unwrap();

        let entries = s.food_entries(date!(2025 - 06 - 10)).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].calories, 0);
        assert_eq!(crate::entries::total_calories(&entries), 120);
    }

    #[tokio::test]
    async fn export_clear_import_restores_data() {
        let s = storage();
        s.add_food_entry(&entry("a1", date!(2025 - 06 - 10), 300)).await.unwrap();
        s.set_setting("streak", Value::from(3)).await.unwrap();

        let dump = s.export_data().await.unwrap();
        s.clear_data().await.unwrap();
        assert!(s.food_entries(date!(2025 - 06 - 10)).await.unwrap().is_empty());

        s.import_data(&dump).await.unwrap();
        assert_eq!(s.food_entries(date!(2025 - 06 - 10)).await.unwrap().len(), 1);
        assert_eq!(s.setting("streak").await.unwrap(), Some(Value::from(3)));
        assert!(s.import_data(&Value::from(1)).await.is_err());
    }
}
