use std::time::Duration;

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use time::Date;
use tracing::{debug, info, instrument};

use super::{Identified, StorageClient};
use crate::{
    clock::date_key,
    config::AppConfig,
    entries::{DayBucket, FoodEntry, WaterEntry},
    error::{StorageError, StorageResult},
    goals::Goals,
    presets::{QuickAddFoodItem, WaterContainer},
};

/// Pulls the `csrftoken` value out of a `Cookie`-style header string.
pub(crate) fn csrf_token_from_cookie(cookie: &str) -> Option<String> {
    lazy_static! {
        static ref CSRF_RE: Regex = Regex::new(r"(?:^|;)\s*csrftoken=([^;\s]+)").unwrap();
    }
    CSRF_RE
        .captures(cookie)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

#[derive(Debug, Deserialize)]
struct SettingResponse {
    #[serde(default)]
    value: Option<Value>,
}

#[derive(Serialize)]
struct DatedBody<'a, T: Serialize> {
    #[serde(flatten)]
    item: &'a T,
    date: String,
}

/// REST adapter for the tracker API.
#[derive(Clone)]
pub struct ApiStorage {
    client: Client,
    base_url: String,
    csrf_token: Option<String>,
}

impl ApiStorage {
    pub fn new(
        base_url: &str,
        csrf_token: Option<String>,
        connect_timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = Client::builder().connect_timeout(connect_timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            csrf_token,
        })
    }

    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let token = config.csrf_cookie.as_deref().and_then(csrf_token_from_cookie);
        Self::new(
            &config.api_base_url,
            token,
            Duration::from_secs(config.http_connect_timeout_secs),
        )
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mutating = method != Method::GET;
        let mut req = self.client.request(method, url);
        if mutating {
            if let Some(token) = &self.csrf_token {
                req = req
                    .header("X-CSRFToken", token)
                    .header(reqwest::header::COOKIE, format!("csrftoken={token}"));
            }
        }
        req
    }

    async fn send(&self, req: RequestBuilder, path: &str) -> StorageResult<String> {
        let res = req.send().await?;
        let status = res.status();
        if !status.is_success() {
            info!(%status, %path, "api error");
            return Err(StorageError::Status {
                status: status.as_u16(),
                path: path.to_string(),
            });
        }
        Ok(res.text().await?)
    }

    fn decode<T: DeserializeOwned>(body: &str, path: &str) -> StorageResult<T> {
        serde_json::from_str(body).map_err(|e| StorageError::Decode {
            path: path.to_string(),
            message: e.to_string(),
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> StorageResult<T> {
        let body = self.send(self.request(Method::GET, path), path).await?;
        Self::decode(&body, path)
    }

    /// POSTs `body` and returns the server's copy of the entity when the
    /// reply is one with the same id, otherwise the value that was sent.
    async fn post_entity<B, T>(&self, path: &str, body: &B, sent: &T) -> StorageResult<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned + Identified + Clone + Sync,
    {
        let text = self
            .send(self.request(Method::POST, path).json(body), path)
            .await?;
        match serde_json::from_str::<T>(&text) {
            Ok(saved) if saved.id() == sent.id() => Ok(saved),
            Ok(_) => {
                debug!(%path, "reply is not the submitted entity; using submitted copy");
                Ok(sent.clone())
            }
            Err(e) => {
                debug!(error = %e, %path, "reply is not an entity; using submitted copy");
                Ok(sent.clone())
            }
        }
    }

    async fn post_unit<B: Serialize + ?Sized + Sync>(&self, path: &str, body: &B) -> StorageResult<()> {
        self.send(self.request(Method::POST, path).json(body), path)
            .await
            .map(|_| ())
    }

    /// DELETE where an already-missing resource counts as deleted.
    async fn delete(&self, path: &str) -> StorageResult<()> {
        let res = self.request(Method::DELETE, path).send().await?;
        let status = res.status();
        if status.is_success() || status == StatusCode::NOT_FOUND {
            debug!(%status, %path, "deleted");
            return Ok(());
        }
        info!(%status, %path, "api error");
        Err(StorageError::Status {
            status: status.as_u16(),
            path: path.to_string(),
        })
    }
}

#[async_trait]
impl StorageClient for ApiStorage {
    #[instrument(skip(self))]
    async fn food_entries(&self, date: Date) -> StorageResult<Vec<FoodEntry>> {
        self.get(&format!("/food-entries/{}", date_key(date))).await
    }

    #[instrument(skip(self, entry), fields(id = %entry.id))]
    async fn add_food_entry(&self, entry: &FoodEntry) -> StorageResult<FoodEntry> {
        self.post_entity("/food-entries/add/", entry, entry).await
    }

    #[instrument(skip(self))]
    async fn remove_food_entry(&self, id: &str) -> StorageResult<()> {
        self.delete(&format!("/food-entries/delete/{id}/")).await
    }

    #[instrument(skip(self))]
    async fn water_entries(&self, date: Date) -> StorageResult<Vec<WaterEntry>> {
        self.get(&format!("/water-entries/{}/", date_key(date))).await
    }

    #[instrument(skip(self, entry), fields(id = %entry.id))]
    async fn add_water_entry(&self, entry: &WaterEntry, date: Date) -> StorageResult<WaterEntry> {
        let body = DatedBody {
            item: entry,
            date: date_key(date),
        };
        let mut sent = entry.clone();
        sent.date = Some(date);
        self.post_entity("/water-entries/", &body, &sent).await
    }

    #[instrument(skip(self))]
    async fn remove_water_entry(&self, id: &str) -> StorageResult<()> {
        self.delete(&format!("/water-entries/delete/{id}/")).await
    }

    async fn food_database(&self) -> StorageResult<Vec<String>> {
        self.get("/food-database/").await
    }

    async fn store_database(&self) -> StorageResult<Vec<String>> {
        self.get("/store-database/").await
    }

    async fn quick_add_foods(&self) -> StorageResult<Vec<QuickAddFoodItem>> {
        self.get("/quick-add-foods/").await
    }

    #[instrument(skip(self, item), fields(id = %item.id))]
    async fn add_quick_add_food(&self, item: &QuickAddFoodItem) -> StorageResult<QuickAddFoodItem> {
        self.post_entity("/quick-add-foods/", item, item).await
    }

    #[instrument(skip(self))]
    async fn remove_quick_add_food(&self, id: &str) -> StorageResult<()> {
        self.delete(&format!("/quick-add-foods/{id}/")).await
    }

    async fn water_containers(&self) -> StorageResult<Vec<WaterContainer>> {
        self.get("/water-containers/").await
    }

    #[instrument(skip(self, container), fields(id = %container.id))]
    async fn add_water_container(&self, container: &WaterContainer) -> StorageResult<WaterContainer> {
        self.post_entity("/water-containers/", container, container).await
    }

    #[instrument(skip(self))]
    async fn remove_water_container(&self, id: &str) -> StorageResult<()> {
        self.delete(&format!("/water-containers/{id}/")).await
    }

    #[instrument(skip(self))]
    async fn setting(&self, key: &str) -> StorageResult<Option<Value>> {
        let res: SettingResponse = self.get(&format!("/settings/{key}")).await?;
        Ok(res.value.filter(|v| !v.is_null()))
    }

    #[instrument(skip(self, value))]
    async fn set_setting(&self, key: &str, value: Value) -> StorageResult<()> {
        self.post_unit("/settings/", &json!({ "key": key, "value": value }))
            .await
    }

    #[instrument(skip(self))]
    async fn weekly_data(&self, days_back: u32) -> StorageResult<Vec<DayBucket>> {
        self.get(&format!("/weekly-data/{days_back}")).await
    }

    async fn goals(&self) -> StorageResult<Option<Goals>> {
        let raw: Value = self.get("/goals/").await?;
        if raw.is_null() {
            return Ok(None);
        }
        Self::decode(&raw.to_string(), "/goals/").map(Some)
    }

    #[instrument(skip(self, goals))]
    async fn update_goals(&self, goals: &Goals) -> StorageResult<Goals> {
        self.post_unit("/goals/", goals).await?;
        Ok(goals.clone())
    }

    async fn clear_data(&self) -> StorageResult<()> {
        self.post_unit("/clear-data/", &json!({})).await
    }

    async fn export_data(&self) -> StorageResult<Value> {
        self.get("/export-data/").await
    }

    async fn import_data(&self, data: &Value) -> StorageResult<()> {
        self.post_unit("/import-data/", data).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        extract::{Path, State},
        http::{HeaderMap, StatusCode as AxumStatus},
        routing::{delete, get, post},
        Json, Router,
    };
    use time::macros::{date, datetime};

    use super::*;
    use crate::entries::{HealthRating, MealType};

    #[derive(Clone, Default)]
    struct Seen {
        csrf: Arc<Mutex<Vec<String>>>,
        bodies: Arc<Mutex<Vec<Value>>>,
    }

    fn sample_entry() -> FoodEntry {
        FoodEntry {
            id: "e1".into(),
            food_name: "Salad".into(),
            calories: 250,
            purchased: false,
            store: None,
            health_rating: HealthRating::Healthy,
            meal_type: MealType::Lunch,
            notes: None,
            protein: 8,
            carbs: 20,
            fat: 12,
            timestamp: datetime!(2025-06-10 12:00 UTC),
            date: date!(2025 - 06 - 10),
        }
    }

    async fn spawn(seen: Seen) -> String {
        let app = Router::new()
            .route(
                "/api/food-entries/:date",
                get(|Path(date): Path<String>| async move {
                    if date == "2025-06-10" {
                        Json(serde_json::to_value(vec![sample_entry()]).unwrap())
                    } else {
                        Json(json!([]))
                    }
                }),
            )
            .route(
                "/api/food-entries/add/",
                post(
                    |State(seen): State<Seen>, headers: HeaderMap, Json(body): Json<Value>| async move {
                        if let Some(v) = headers.get("X-CSRFToken") {
                            seen.csrf.lock().unwrap().push(v.to_str().unwrap().to_string());
                        }
                        seen.bodies.lock().unwrap().push(body.clone());
                        let mut saved = body;
                        saved["createdAt"] = json!("2025-06-10T12:00:01Z");
                        Json(saved)
                    },
                ),
            )
            .route(
                "/api/food-entries/delete/:id/",
                delete(|Path(id): Path<String>| async move {
                    if id == "e1" {
                        AxumStatus::NO_CONTENT
                    } else {
                        AxumStatus::NOT_FOUND
                    }
                }),
            )
            .route(
                "/api/water-entries/",
                post(|State(seen): State<Seen>, Json(body): Json<Value>| async move {
                    seen.bodies.lock().unwrap().push(body);
                    Json(json!({ "status": "ok" }))
                }),
            )
            .route(
                "/api/settings/:key",
                get(|Path(key): Path<String>| async move {
                    if key == "streak" {
                        Json(json!({ "value": 4 }))
                    } else {
                        Json(json!({ "value": null }))
                    }
                }),
            )
            .route(
                "/api/goals/",
                get(|| async { AxumStatus::INTERNAL_SERVER_ERROR }),
            )
            .with_state(seen);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/api")
    }

    fn client(base: &str) -> ApiStorage {
        ApiStorage::new(base, Some("tok123".into()), Duration::from_secs(2)).unwrap()
    }

    #[test]
    fn csrf_token_is_read_from_cookie_string() {
        assert_eq!(
            csrf_token_from_cookie("sessionid=abc; csrftoken=XyZ09; theme=dark").as_deref(),
            Some("XyZ09")
        );
        assert_eq!(csrf_token_from_cookie("csrftoken=first").as_deref(), Some("first"));
        assert_eq!(csrf_token_from_cookie("notcsrftoken=nope"), None);
    }

    #[tokio::test]
    async fn reads_food_entries_for_date() {
        let base = spawn(Seen::default()).await;
        let api = client(&base);
        let entries = api.food_entries(date!(2025 - 06 - 10)).await.unwrap();
        assert_eq!(entries, vec![sample_entry()]);
        assert!(api.food_entries(date!(2025 - 06 - 11)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn add_sends_csrf_and_ignores_server_metadata() {
        let seen = Seen::default();
        let base = spawn(seen.clone()).await;
        let saved = client(&base).add_food_entry(&sample_entry()).await.unwrap();

        assert_eq!(saved, sample_entry());
        assert_eq!(*seen.csrf.lock().unwrap(), vec!["tok123".to_string()]);
        assert_eq!(seen.bodies.lock().unwrap()[0]["date"], json!("2025-06-10"));
        assert_eq!(seen.bodies.lock().unwrap()[0]["healthRating"], json!("3"));
    }

    #[tokio::test]
    async fn water_entry_body_carries_date_and_non_entity_reply_echoes() {
        let seen = Seen::default();
        let base = spawn(seen.clone()).await;
        let entry = WaterEntry {
            id: "w1".into(),
            amount: 500,
            timestamp: datetime!(2025-06-10 07:00 UTC),
            date: None,
        };
        let saved = client(&base)
            .add_water_entry(&entry, date!(2025 - 06 - 10))
            .await
            .unwrap();
        assert_eq!(saved.date, Some(date!(2025 - 06 - 10)));
        assert_eq!(seen.bodies.lock().unwrap()[0]["date"], json!("2025-06-10"));
        assert_eq!(seen.bodies.lock().unwrap()[0]["amount"], json!(500));
    }

    #[tokio::test]
    async fn delete_missing_entry_is_success() {
        let base = spawn(Seen::default()).await;
        let api = client(&base);
        api.remove_food_entry("e1").await.unwrap();
        api.remove_food_entry("gone").await.unwrap();
    }

    #[tokio::test]
    async fn settings_unwrap_value_field() {
        let base = spawn(Seen::default()).await;
        let api = client(&base);
        assert_eq!(api.setting("streak").await.unwrap(), Some(json!(4)));
        assert_eq!(api.setting("theme").await.unwrap(), None);
    }

    #[tokio::test]
    async fn server_error_is_reported_as_unavailable() {
        let base = spawn(Seen::default()).await;
        let err = client(&base).goals().await.unwrap_err();
        assert!(err.is_unavailable());
        assert!(matches!(err, StorageError::Status { status: 500, .. }));
    }
}
