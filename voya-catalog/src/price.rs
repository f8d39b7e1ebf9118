use serde_json::Value;

use crate::entry::CalendarEntry;

/// Lowest plausible price for an arbitrary calendar entry value.
///
/// Handles every shape upstream produces for a date: a bare number, a
/// comma-grouped numeric string, or an object whose price fields may each be
/// scalar or time-keyed. Malformed input yields `None`; this path never
/// fails a calendar render.
pub fn lowest_price_from(value: &Value) -> Option<f64> {
    CalendarEntry::from_value(value).lowest_price()
}
