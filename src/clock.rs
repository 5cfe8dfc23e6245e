use time::{
    macros::{format_description, time},
    Date, Duration, OffsetDateTime,
};

/// Source of "today" for every date-dependent computation.
pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;

    fn today(&self) -> Date {
        self.now().date()
    }
}

/// Wall clock in UTC, matching how day keys are formatted.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// Clock pinned to one instant. Used by tests and by `--date` in the CLI.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub OffsetDateTime);

impl FixedClock {
    pub fn at_date(date: Date) -> Self {
        Self(date.with_time(time!(12:00)).assume_utc())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> OffsetDateTime {
        self.0
    }
}

/// `YYYY-MM-DD`, the day-bucket key used by both storage adapters.
pub fn date_key(date: Date) -> String {
    date.format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_else(|_| date.to_string())
}

pub fn parse_date_key(raw: &str) -> Option<Date> {
    Date::parse(raw.trim(), format_description!("[year]-[month]-[day]")).ok()
}

pub fn days_before(date: Date, days: i64) -> Date {
    date.checked_sub(Duration::days(days)).unwrap_or(Date::MIN)
}

/// Short weekday label ("Mon", "Tue", ...) used by the weekly series.
pub fn weekday_label(date: Date) -> &'static str {
    use time::Weekday::*;
    match date.weekday() {
        Monday => "Mon",
        Tuesday => "Tue",
        Wednesday => "Wed",
        Thursday => "Thu",
        Friday => "Fri",
        Saturday => "Sat",
        Sunday => "Sun",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn date_key_is_zero_padded() {
        assert_eq!(date_key(date!(2024 - 03 - 07)), "2024-03-07");
        assert_eq!(parse_date_key("2024-03-07"), Some(date!(2024 - 03 - 07)));
        assert_eq!(parse_date_key("07/03/2024"), None);
    }

    #[test]
    fn days_before_crosses_month_boundary() {
        assert_eq!(days_before(date!(2024 - 03 - 01), 1), date!(2024 - 02 - 29));
        assert_eq!(weekday_label(date!(2024 - 03 - 01)), "Fri");
    }

    #[test]
    fn fixed_clock_reports_its_date() {
        let clock = FixedClock::at_date(date!(2025 - 01 - 15));
        assert_eq!(clock.today(), date!(2025 - 01 - 15));
        assert_eq!(clock.now().hour(), 12);
        assert_eq!(clock.now().offset(), time::UtcOffset::UTC);
    }
}
