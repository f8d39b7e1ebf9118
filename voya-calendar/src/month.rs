use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use voya_catalog::{PackageDoc, PriceValue};
use voya_shared::dates;

use crate::merge::{DaySummary, MergedCalendar};

/// Sale window the calendar UI clips against. Either bound may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleWindow {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl SaleWindow {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> SaleWindow {
        SaleWindow { start, end }
    }

    /// The widest window the document sells in: earliest start and latest
    /// end across items and their SKUs.
    pub fn from_doc(doc: &PackageDoc) -> SaleWindow {
        let mut window = SaleWindow::default();
        for item in &doc.items {
            widen(&mut window, item.sale_range());
            for sku in &item.skus {
                widen(&mut window, sku.sale_range());
            }
        }
        window
    }

    /// Inclusive on both bounds.
    pub fn contains(&self, day: NaiveDate) -> bool {
        if let Some(start) = self.start {
            if day < start {
                return false;
            }
        }
        if let Some(end) = self.end {
            if day > end {
                return false;
            }
        }
        true
    }
}

fn widen(window: &mut SaleWindow, range: Option<(NaiveDate, NaiveDate)>) {
    let Some((start, end)) = range else { return };
    window.start = Some(window.start.map_or(start, |cur| cur.min(start)));
    window.end = Some(window.end.map_or(end, |cur| cur.max(end)));
}

/// One day cell of the rendered month grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthCell {
    pub date: NaiveDate,
    pub day: u32,
    pub price: Option<f64>,
    pub sold_out: bool,
    pub in_range: bool,
    /// The raw merged day, for detail rendering.
    pub summary: Option<DaySummary>,
}

/// Project a merged calendar onto a week-major month grid.
///
/// Every week has exactly 7 slots with `None` padding outside the month;
/// weeks start on Sunday. Days outside the sale window are out of range and
/// forced sold out regardless of calendar data. An invalid year/month yields
/// an empty grid.
pub fn month_matrix(
    year: i32,
    month: u32,
    calendar: &MergedCalendar,
    window: Option<&SaleWindow>,
) -> Vec<Vec<Option<MonthCell>>> {
    let Some(day_count) = dates::days_in_month(year, month) else {
        return Vec::new();
    };
    let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
        return Vec::new();
    };

    let mut weeks = Vec::new();
    let mut week: Vec<Option<MonthCell>> = Vec::with_capacity(7);
    for _ in 0..first.weekday().num_days_from_sunday() {
        week.push(None);
    }

    for day in 1..=day_count {
        let Some(date) = NaiveDate::from_ymd_opt(year, month, day) else {
            continue;
        };
        let summary = calendar.get(date);
        let in_range = window.map_or(true, |w| w.contains(date));
        let sold_out = summary.map_or(false, |s| s.sold_out) || !in_range;
        week.push(Some(MonthCell {
            date,
            day,
            price: summary.and_then(cell_price),
            sold_out,
            in_range,
            summary: summary.cloned(),
        }));
        if week.len() == 7 {
            weeks.push(week);
            week = Vec::with_capacity(7);
        }
    }

    if !week.is_empty() {
        while week.len() < 7 {
            week.push(None);
        }
        weeks.push(week);
    }
    weeks
}

/// Direct scalar fields first (`price`, then scalar `b2c_price`, then scalar
/// `b2b_price`); nested time maps fall back to the lowest leaf anywhere in
/// the day.
fn cell_price(summary: &DaySummary) -> Option<f64> {
    if let Some(price) = summary.price {
        return Some(price);
    }
    for slot in [&summary.b2c_price, &summary.b2b_price] {
        if let Some(scalar) = slot.as_ref().and_then(PriceValue::as_scalar) {
            return Some(scalar);
        }
    }
    [
        &summary.b2b_price,
        &summary.b2c_price,
        &summary.original_price,
    ]
    .into_iter()
    .flatten()
    .map(PriceValue::lowest)
    .fold(None, |best, n| {
        Some(match best {
            Some(b) => b.min(n),
            None => n,
        })
    })
}
