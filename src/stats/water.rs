use serde::Serialize;
use time::Date;

use super::weekly::goal_progress;
use crate::{clock::days_before, entries::total_water, goals::load_goals, state::AppState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WaterStatus {
    GoalMet,
    NearlyThere,
    BelowGoal,
}

impl WaterStatus {
    fn of(amount: i64, goal: i64) -> Self {
        let pct = goal_progress(amount, goal);
        if goal > 0 && pct >= 100.0 {
            WaterStatus::GoalMet
        } else if pct >= 75.0 {
            WaterStatus::NearlyThere
        } else {
            WaterStatus::BelowGoal
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            WaterStatus::GoalMet => "Goal met",
            WaterStatus::NearlyThere => "Nearly there",
            WaterStatus::BelowGoal => "Below goal",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WaterDay {
    pub date: Date,
    pub amount: i64,
    pub percent: f64,
    pub status: WaterStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WaterWeekStats {
    pub total: i64,
    pub daily_average: i64,
    pub days_at_goal: usize,
    /// Consecutive days at goal, counted back from the last day.
    pub streak: usize,
    /// Against the previous week; 0 when that week has no water logged.
    pub change_percent: i64,
    pub days: Vec<WaterDay>,
}

/// Weekly water summary from daily totals, oldest first.
pub fn water_week_stats(days: &[(Date, i64)], previous_total: i64, goal: i64) -> WaterWeekStats {
    let total = days.iter().fold(0, |acc: i64, (_, a)| acc.saturating_add(*a));
    let met = |amount: i64| goal > 0 && amount >= goal;
    let change_percent = if previous_total > 0 {
        ((total as f64 - previous_total as f64) / previous_total as f64 * 100.0).round() as i64
    } else {
        0
    };

    WaterWeekStats {
        total,
        daily_average: (total as f64 / 7.0).round() as i64,
        days_at_goal: days.iter().filter(|(_, a)| met(*a)).count(),
        streak: days.iter().rev().take_while(|(_, a)| met(*a)).count(),
        change_percent,
        days: days
            .iter()
            .map(|&(date, amount)| WaterDay {
                date,
                amount,
                percent: goal_progress(amount, goal),
                status: WaterStatus::of(amount, goal),
            })
            .collect(),
    }
}

async fn daily_totals(st: &AppState, end: Date) -> Vec<(Date, i64)> {
    let mut totals = Vec::with_capacity(7);
    for back in (0..7).rev() {
        let date = days_before(end, back);
        totals.push((date, total_water(&st.storage.water_entries(date).await)));
    }
    totals
}

/// Water statistics for the seven days ending at `end`.
pub async fn water_week(st: &AppState, end: Date) -> WaterWeekStats {
    let goal = load_goals(st).await.water_goal;
    let this_week = daily_totals(st, end).await;
    let previous = daily_totals(st, days_before(end, 7))
        .await
        .iter()
        .fold(0, |acc: i64, (_, a)| acc.saturating_add(*a));
    water_week_stats(&this_week, previous, goal)
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use super::*;
    use crate::entries::log_water;

    fn week(amounts: [i64; 7]) -> Vec<(Date, i64)> {
        let end = date!(2025 - 06 - 10);
        amounts
            .iter()
            .enumerate()
            .map(|(i, a)| (days_before(end, 6 - i as i64), *a))
            .collect()
    }

    #[test]
    fn summary_and_breakdown() {
        let stats = water_week_stats(&week([0, 2500, 1000, 1900, 2000, 3000, 2600]), 0, 2500);
        assert_eq!(stats.total, 13_000);
        assert_eq!(stats.daily_average, 1857);
        assert_eq!(stats.days_at_goal, 3);
        assert_eq!(stats.streak, 2);
        assert_eq!(stats.change_percent, 0);
        assert_eq!(stats.days[0].date, date!(2025 - 06 - 04));

        let statuses: Vec<_> = stats.days.iter().map(|d| d.status).collect();
        use WaterStatus::*;
        assert_eq!(
            statuses,
            vec![BelowGoal, GoalMet, BelowGoal, NearlyThere, NearlyThere, GoalMet, GoalMet]
        );
        assert_eq!(stats.days[5].percent, 100.0);
    }

    #[test]
    fn change_against_previous_week() {
        let stats = water_week_stats(&week([1000; 7]), 5000, 2500);
        assert_eq!(stats.change_percent, 40);
        assert_eq!(stats.streak, 0);
        let stats = water_week_stats(&week([0; 7]), 7000, 2500);
        assert_eq!(stats.change_percent, -100);
    }

    #[tokio::test]
    async fn reads_both_weeks_from_storage() {
        let st = AppState::fake();
        let today = st.clock.today();
        log_water(&st, "2500", today).await.unwrap();
        log_water(&st, "500", days_before(today, 8)).await.unwrap();

        let stats = water_week(&st, today).await;
        assert_eq!(stats.total, 2500);
        assert_eq!(stats.streak, 1);
        assert_eq!(stats.change_percent, 400);
        assert_eq!(stats.days.last().unwrap().status, WaterStatus::GoalMet);
    }
}
