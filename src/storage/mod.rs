use std::{fmt, str::FromStr, sync::Arc};

use async_trait::async_trait;
use serde_json::Value;
use time::Date;

use crate::{
    clock::Clock,
    config::AppConfig,
    entries::{DayBucket, FoodEntry, WaterEntry},
    error::StorageResult,
    goals::Goals,
    presets::{QuickAddFoodItem, WaterContainer},
};

mod api;
mod fallback;
mod gateway;
pub mod kv;
mod local;

pub use api::ApiStorage;
pub use fallback::FallbackStorage;
pub use gateway::PersistenceGateway;
pub use local::LocalStorage;

/// Logical persistence operations, implemented once per backend.
#[async_trait]
pub trait StorageClient: Send + Sync {
    async fn food_entries(&self, date: Date) -> StorageResult<Vec<FoodEntry>>;
    async fn add_food_entry(&self, entry: &FoodEntry) -> StorageResult<FoodEntry>;
    async fn remove_food_entry(&self, id: &str) -> StorageResult<()>;

    async fn water_entries(&self, date: Date) -> StorageResult<Vec<WaterEntry>>;
    async fn add_water_entry(&self, entry: &WaterEntry, date: Date) -> StorageResult<WaterEntry>;
    async fn remove_water_entry(&self, id: &str) -> StorageResult<()>;

    async fn food_database(&self) -> StorageResult<Vec<String>>;
    async fn store_database(&self) -> StorageResult<Vec<String>>;

    async fn quick_add_foods(&self) -> StorageResult<Vec<QuickAddFoodItem>>;
    async fn add_quick_add_food(&self, item: &QuickAddFoodItem) -> StorageResult<QuickAddFoodItem>;
    async fn remove_quick_add_food(&self, id: &str) -> StorageResult<()>;

    async fn water_containers(&self) -> StorageResult<Vec<WaterContainer>>;
    async fn add_water_container(&self, container: &WaterContainer) -> StorageResult<WaterContainer>;
    async fn remove_water_container(&self, id: &str) -> StorageResult<()>;

    async fn setting(&self, key: &str) -> StorageResult<Option<Value>>;
    async fn set_setting(&self, key: &str, value: Value) -> StorageResult<()>;

    /// Buckets for the last `days_back` days, oldest first, ending today.
    async fn weekly_data(&self, days_back: u32) -> StorageResult<Vec<DayBucket>>;

    async fn goals(&self) -> StorageResult<Option<Goals>>;
    async fn update_goals(&self, goals: &Goals) -> StorageResult<Goals>;

    async fn clear_data(&self) -> StorageResult<()>;
    async fn export_data(&self) -> StorageResult<Value>;
    async fn import_data(&self, data: &Value) -> StorageResult<()>;
}

/// Which adapter set backs the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageMode {
    Api,
    Local,
    /// API first, local key-value storage when the API is unreachable.
    Fallback,
}

impl FromStr for StorageMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "api" | "remote" => Ok(StorageMode::Api),
            "local" => Ok(StorageMode::Local),
            "fallback" => Ok(StorageMode::Fallback),
            other => Err(format!("unknown storage mode '{other}'")),
        }
    }
}

impl fmt::Display for StorageMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StorageMode::Api => "api",
            StorageMode::Local => "local",
            StorageMode::Fallback => "fallback",
        })
    }
}

/// Builds the adapter stack for `config.storage_mode`.
pub fn build_storage(
    config: &AppConfig,
    clock: Arc<dyn Clock>,
) -> anyhow::Result<Arc<dyn StorageClient>> {
    let storage = match config.storage_mode {
        StorageMode::Api => Arc::new(ApiStorage::from_config(config)?) as Arc<dyn StorageClient>,
        StorageMode::Local => Arc::new(LocalStorage::open_file(&config.local_store_path, clock)?)
            as Arc<dyn StorageClient>,
        StorageMode::Fallback => Arc::new(FallbackStorage::new(
            ApiStorage::from_config(config)?,
            LocalStorage::open_file(&config.local_store_path, clock)?,
        )) as Arc<dyn StorageClient>,
    };
    Ok(storage)
}

/// Entities stored in id-addressed collections.
pub(crate) trait Identified {
    fn id(&self) -> &str;
}

macro_rules! identified {
    ($($ty:ty),*) => {
        $(impl Identified for $ty {
            fn id(&self) -> &str {
                &self.id
            }
        })*
    };
}

identified!(FoodEntry, WaterEntry, QuickAddFoodItem, WaterContainer);

/// Client-side id for a new entity.
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
