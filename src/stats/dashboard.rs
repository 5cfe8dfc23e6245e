use std::collections::HashMap;

use serde::Serialize;
use time::{Date, Month};

use crate::{
    entries::{total_water, DayBucket},
    state::AppState,
};

/// Days of history the favourites cards look at.
pub const FAVOURITES_WINDOW_DAYS: u32 = 90;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FavouriteFood {
    /// 1-based position, zero-padded to two digits.
    pub rank: String,
    pub name: String,
    pub frequency: usize,
    pub max_calories: i64,
    pub min_calories: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FavouriteStore {
    pub name: String,
    pub visits: usize,
    /// Share of the listed stores' visits, in percent.
    pub popularity: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthWater {
    pub year: i32,
    pub month: u8,
    pub label: String,
    pub intake: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WaterYear {
    pub months: Vec<MonthWater>,
    pub total: i64,
}

/// Counts per name, most frequent first; ties go alphabetically.
fn ranked<'a>(names: impl Iterator<Item = &'a str>) -> Vec<(&'a str, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for name in names {
        *counts.entry(name).or_default() += 1;
    }
    let mut ranked: Vec<_> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked
}

pub fn top_foods(days: &[DayBucket], n: usize) -> Vec<FavouriteFood> {
    let entries: Vec<_> = days
        .iter()
        .flat_map(|d| d.entries.iter())
        .filter(|e| !e.food_name.trim().is_empty())
        .collect();

    ranked(entries.iter().map(|e| e.food_name.trim()))
        .into_iter()
        .take(n)
        .enumerate()
        .map(|(i, (name, frequency))| {
            let calories = entries
                .iter()
                .filter(|e| e.food_name.trim() == name)
                .map(|e| e.calories);
            FavouriteFood {
                rank: format!("{:02}", i + 1),
                name: name.to_string(),
                frequency,
                max_calories: calories.clone().max().unwrap_or(0),
                min_calories: calories.min().unwrap_or(0),
            }
        })
        .collect()
}

/// Stores by number of purchased entries naming them.
pub fn top_stores(days: &[DayBucket], n: usize) -> Vec<FavouriteStore> {
    let stores = days
        .iter()
        .flat_map(|d| d.entries.iter())
        .filter(|e| e.purchased)
        .filter_map(|e| e.store.as_deref().map(str::trim))
        .filter(|s| !s.is_empty());

    let top: Vec<_> = ranked(stores).into_iter().take(n).collect();
    let listed: usize = top.iter().map(|(_, visits)| visits).sum();
    top.into_iter()
        .map(|(name, visits)| FavouriteStore {
            name: name.to_string(),
            visits,
            popularity: (visits as f64 / listed as f64 * 100.0).round() as i64,
        })
        .collect()
}

/// The twelve calendar months ending with the month of `end`, oldest first.
fn last_twelve_months(end: Date) -> Vec<(i32, Month)> {
    let mut months = Vec::with_capacity(12);
    let (mut year, mut month) = (end.year(), end.month());
    for _ in 0..12 {
        months.push((year, month));
        if month == Month::January {
            year -= 1;
        }
        month = month.previous();
    }
    months.reverse();
    months
}

/// Per-month water intake from daily totals; days outside the twelve months
/// ending at `end` are ignored.
pub fn monthly_water_series(days: &[(Date, i64)], end: Date) -> WaterYear {
    let months: Vec<MonthWater> = last_twelve_months(end)
        .into_iter()
        .map(|(year, month)| MonthWater {
            year,
            month: month as u8,
            label: month.to_string(),
            intake: days
                .iter()
                .filter(|(d, _)| d.year() == year && d.month() == month && *d <= end)
                .fold(0, |acc: i64, (_, a)| acc.saturating_add(*a)),
        })
        .collect();
    let total = months.iter().fold(0, |acc: i64, m| acc.saturating_add(m.intake));
    WaterYear { months, total }
}

pub async fn favourite_foods(st: &AppState, n: usize) -> Vec<FavouriteFood> {
    top_foods(&st.storage.weekly_data(FAVOURITES_WINDOW_DAYS).await, n)
}

pub async fn favourite_stores(st: &AppState, n: usize) -> Vec<FavouriteStore> {
    top_stores(&st.storage.weekly_data(FAVOURITES_WINDOW_DAYS).await, n)
}

/// Monthly water totals for the year ending today.
pub async fn water_year(st: &AppState) -> WaterYear {
    let end = st.clock.today();
    let start = last_twelve_months(end)
        .first()
        .and_then(|&(year, month)| Date::from_calendar_date(year, month, 1).ok())
        .unwrap_or(end);
    let span = (end - start).whole_days() + 1;
    let days: Vec<(Date, i64)> = st
        .storage
        .weekly_data(u32::try_from(span).unwrap_or(1))
        .await
        .iter()
        .map(|d| (d.date, total_water(&d.water)))
        .collect();
    monthly_water_series(&days, end)
}

#[cfg(test)]
mod tests {
    use time::{macros::date, OffsetDateTime};

    use super::*;
    use crate::{
        entries::{log_food, log_water, FoodEntry, FoodForm, HealthRating, MealType},
        storage::generate_id,
    };

    fn eaten(name: &str, calories: i64, store: Option<&str>) -> FoodEntry {
        FoodEntry {
            id: generate_id(),
            food_name: name.into(),
            calories,
            purchased: store.is_some(),
            store: store.map(Into::into),
            health_rating: HealthRating::Neutral,
            meal_type: MealType::Lunch,
            notes: None,
            protein: 0,
            carbs: 0,
            fat: 0,
            timestamp: OffsetDateTime::UNIX_EPOCH,
            date: date!(2025 - 06 - 10),
        }
    }

    fn day(entries: Vec<FoodEntry>) -> DayBucket {
        DayBucket {
            date: date!(2025 - 06 - 10),
            entries,
            water: vec![],
        }
    }

    #[test]
    fn foods_ranked_by_frequency() {
        let days = vec![
            day(vec![eaten("Apple", 80, None), eaten("Soup", 250, None)]),
            day(vec![eaten("Apple ", 120, None), eaten("Bagel", 300, None)]),
            day(vec![eaten("Soup", 200, None), eaten("Apple", 95, None)]),
        ];
        let top = top_foods(&days, 2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].rank, "01");
        assert_eq!(top[0].name, "Apple");
        assert_eq!(top[0].frequency, 3);
        assert_eq!((top[0].min_calories, top[0].max_calories), (80, 120));
        assert_eq!(top[1].name, "Soup");
        assert!(top_foods(&[], 5).is_empty());
    }

    #[test]
    fn stores_count_purchases_only() {
        let mut unpaid = eaten("Bread", 200, Some("Aldi"));
        unpaid.purchased = false;
        let days = vec![day(vec![
            eaten("Milk", 100, Some("Aldi")),
            eaten("Eggs", 150, Some("Aldi")),
            eaten("Wrap", 400, Some("Deli")),
            eaten("Tea", 5, Some("Kiosk")),
            unpaid,
        ])];
        let top = top_stores(&days, 2);
        assert_eq!(top.len(), 2);
        assert_eq!((top[0].name.as_str(), top[0].visits), ("Aldi", 2));
        assert_eq!(top[0].popularity, 67);
        assert_eq!((top[1].name.as_str(), top[1].popularity), ("Deli", 33));
    }

    #[test]
    fn monthly_series_wraps_the_year() {
        let days = [
            (date!(2025 - 02 - 03), 1000),
            (date!(2025 - 02 - 20), 500),
            (date!(2024 - 03 - 01), 700),
            (date!(2024 - 02 - 28), 9999),
        ];
        let year = monthly_water_series(&days, date!(2025 - 02 - 15));
        assert_eq!(year.months.len(), 12);
        assert_eq!((year.months[0].year, year.months[0].label.as_str()), (2024, "March"));
        assert_eq!(year.months[0].intake, 700);
        assert_eq!(year.months[10].label, "January");
        assert_eq!((year.months[11].year, year.months[11].month), (2025, 2));
        assert_eq!(year.months[11].intake, 1000);
        assert_eq!(year.total, 1700);
    }

    #[tokio::test]
    async fn loaders_read_storage() {
        let st = AppState::fake();
        let today = st.clock.today();
        let form = |name: &str| FoodForm {
            food_name: name.into(),
            calories: "150".into(),
            purchased: true,
            store: "Market".into(),
            health_rating: Some("3".into()),
            meal_type: Some("snack".into()),
            ..Default::default()
        };
        log_food(&st, form("Pear"), today).await.unwrap();
        log_food(&st, form("Pear"), date!(2025 - 05 - 01)).await.unwrap();
        log_water(&st, "750", date!(2024 - 07 - 02)).await.unwrap();
        log_water(&st, "250", today).await.unwrap();

        let foods = favourite_foods(&st, 5).await;
        assert_eq!(foods[0].frequency, 2);
        let stores = favourite_stores(&st, 5).await;
        assert_eq!(stores[0].popularity, 100);

        let year = water_year(&st).await;
        assert_eq!(year.months[0].label, "July");
        assert_eq!(year.months[0].intake, 750);
        assert_eq!(year.total, 1000);
    }
}
