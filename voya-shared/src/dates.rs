use chrono::NaiveDate;

/// Upstream calendar keys and sale dates use ISO `YYYY-MM-DD`.
pub const DAY_FORMAT: &str = "%Y-%m-%d";

/// Parse an ISO calendar day. Invalid input is absent, never an error.
pub fn parse_day(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DAY_FORMAT).ok()
}

pub fn format_day(day: NaiveDate) -> String {
    day.format(DAY_FORMAT).to_string()
}

/// Inclusive day range. Empty when the range is inverted.
pub fn days_between(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    if end < start {
        return Vec::new();
    }
    let mut days = Vec::new();
    let mut current = start;
    while current <= end {
        days.push(current);
        match current.succ_opt() {
            Some(next) => current = next,
            None => break,
        }
    }
    days
}

/// Number of days in a month, or `None` for an invalid year/month.
pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next_first = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((next_first - first).num_days() as u32)
}
