use chrono::{DateTime, Datelike, Duration, NaiveTime, TimeZone, Utc};

/// A half-open reporting window `[from, to)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoyaltyPeriod {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl RoyaltyPeriod {
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Option<Self> {
        (from < to).then_some(Self { from, to })
    }

    /// The last complete Monday-to-Monday week (UTC) before `now`.
    pub fn previous_week(now: DateTime<Utc>) -> Self {
        let days_since_monday = i64::from(now.weekday().num_days_from_monday());
        let this_monday = (now - Duration::days(days_since_monday)).date_naive().and_time(NaiveTime::MIN);
        let to = Utc.from_utc_datetime(&this_monday);
        Self { from: to - Duration::days(7), to }
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.from <= instant && instant < self.to
    }
}
