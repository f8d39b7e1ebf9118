use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use voya_catalog::{CalendarEntry, PackageDoc, PackageItem, PriceValue, RawCalendar, Sku};
use voya_shared::dates;

/// Where a synthesized price came from during gap-fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillSource {
    DisplayPrice,
    SkuPrice,
}

/// A SKU that contributed data for a date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkuRef {
    pub sku_id: Option<String>,
    pub spec_token: Option<String>,
    pub remain_qty: Option<f64>,
}

impl SkuRef {
    fn of(sku: &Sku) -> SkuRef {
        SkuRef {
            sku_id: sku.id(),
            spec_token: sku.spec_token.clone(),
            remain_qty: sku.remaining(),
        }
    }
}

/// Merged per-date summary.
///
/// `price` is the lowest amount known for the date and only ever moves down
/// as further sources fold in. `sold_out` is sticky once set. `skus` records
/// every contributor without deduplication.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DaySummary {
    pub price: Option<f64>,
    pub b2b_price: Option<PriceValue>,
    pub b2c_price: Option<PriceValue>,
    pub original_price: Option<PriceValue>,
    pub sold_out: bool,
    pub skus: Vec<SkuRef>,
    pub filled_price: bool,
    pub filled_price_source: Option<FillSource>,
}

impl DaySummary {
    fn fold_entry(&mut self, entry: &CalendarEntry, source: Option<SkuRef>) {
        if let Some(incoming) = entry.b2b_price.clone() {
            self.b2b_price = Some(PriceValue::merge_min(self.b2b_price.take(), incoming));
        }
        if let Some(incoming) = entry.b2c_price.clone() {
            self.b2c_price = Some(PriceValue::merge_min(self.b2c_price.take(), incoming));
        }
        if let Some(incoming) = entry.original_price.clone() {
            self.original_price = Some(PriceValue::merge_min(self.original_price.take(), incoming));
        }
        if entry.sold_out {
            self.sold_out = true;
        }
        if let Some(lowest) = entry.lowest_price() {
            self.price = Some(match self.price {
                Some(current) => current.min(lowest),
                None => lowest,
            });
        }
        if let Some(sku) = source {
            self.skus.push(sku);
        }
    }
}

/// Per-date price/availability calendar merged from every source a package
/// document carries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MergedCalendar {
    days: BTreeMap<NaiveDate, DaySummary>,
}

impl MergedCalendar {
    pub fn get(&self, day: NaiveDate) -> Option<&DaySummary> {
        self.days.get(&day)
    }

    /// Lookup by ISO date string; unparseable keys are simply absent.
    pub fn get_str(&self, day: &str) -> Option<&DaySummary> {
        self.days.get(&dates::parse_day(day)?)
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NaiveDate, &DaySummary)> {
        self.days.iter()
    }

    /// Lowest price anywhere in the calendar (the product-card "from" price).
    pub fn lowest_price(&self) -> Option<f64> {
        self.days
            .values()
            .filter_map(|day| day.price)
            .fold(None, |best, n| {
                Some(match best {
                    Some(b) => b.min(n),
                    None => n,
                })
            })
    }

    /// Earliest date that is priced and not sold out.
    pub fn first_available(&self) -> Option<NaiveDate> {
        self.days
            .iter()
            .find(|(_, day)| !day.sold_out && day.price.is_some())
            .map(|(date, _)| *date)
    }
}

/// Fold a package document into a `MergedCalendar`.
///
/// Pass 1 folds explicit calendar data, most specific source first: every SKU
/// calendar, then item-level calendars, then the document's top-level
/// calendar. Pass 2 synthesizes days from sale-date ranges for SKUs that
/// carry no calendar of their own, using `display_price` as the preferred
/// base when the caller supplies one.
pub fn merge_calendar(doc: &PackageDoc, display_price: Option<f64>) -> MergedCalendar {
    let mut days: BTreeMap<NaiveDate, DaySummary> = BTreeMap::new();

    for item in &doc.items {
        for sku in &item.skus {
            if let Some(cal) = sku.effective_calendar() {
                fold_raw(&mut days, cal, Some(SkuRef::of(sku)));
            }
        }
    }
    for item in &doc.items {
        if let Some(cal) = &item.calendar_detail {
            fold_raw(&mut days, cal, None);
        }
    }
    if let Some(cal) = &doc.calendar_detail {
        fold_raw(&mut days, cal, None);
    }

    for item in &doc.items {
        for sku in &item.skus {
            if sku.effective_calendar().is_some() {
                continue;
            }
            gap_fill(&mut days, sku, item, display_price);
        }
    }

    MergedCalendar { days }
}

fn fold_raw(days: &mut BTreeMap<NaiveDate, DaySummary>, cal: &RawCalendar, source: Option<SkuRef>) {
    for (key, raw) in cal {
        let Some(day) = dates::parse_day(key) else {
            tracing::debug!(key = %key, "calendar entry skipped: invalid date key");
            continue;
        };
        let entry = CalendarEntry::from_value(raw);
        days.entry(day).or_default().fold_entry(&entry, source.clone());
    }
}

fn gap_fill(
    days: &mut BTreeMap<NaiveDate, DaySummary>,
    sku: &Sku,
    item: &PackageItem,
    display_price: Option<f64>,
) {
    let Some((start, end)) = sku.sale_range().or_else(|| item.sale_range()) else {
        tracing::debug!(sku_id = ?sku.id(), "gap-fill skipped: no usable sale range");
        return;
    };

    let span = dates::days_between(start, end);
    if span.is_empty() {
        tracing::debug!(sku_id = ?sku.id(), %start, %end, "gap-fill skipped: inverted sale range");
        return;
    }

    let (base, source) = match display_price {
        Some(price) => (price, FillSource::DisplayPrice),
        None => match sku.fill_base_price() {
            Some(price) => (price, FillSource::SkuPrice),
            None => {
                tracing::debug!(sku_id = ?sku.id(), "gap-fill skipped: no base price");
                return;
            }
        },
    };

    for day in span {
        let summary = days.entry(day).or_default();
        // An explicit price that is already strictly lower stays untouched.
        if matches!(summary.price, Some(current) if current < base) {
            continue;
        }
        summary.price = Some(base);
        if !matches!(summary.b2b_price, Some(PriceValue::TimeMap(_))) {
            summary.b2b_price = Some(PriceValue::Scalar(base));
        }
        summary.filled_price = true;
        summary.filled_price_source = Some(source);
        summary.skus.push(SkuRef::of(sku));
    }
}
