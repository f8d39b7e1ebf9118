use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use voya_shared::{dates, num};

use crate::entry::PriceValue;

/// Raw per-date calendar map as delivered upstream (ISO date key → duck-typed entry).
pub type RawCalendar = BTreeMap<String, Value>;

/// The product/package document handed over by the upstream product API.
///
/// Upstream is duck-typed: prices may be numbers or comma-grouped strings,
/// ids may be strings or numbers, calendars may be missing, empty, or keyed
/// by time-of-day below the date level. Fields that vary in shape are kept as
/// raw `Value` and coerced at the point of use.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PackageDoc {
    pub product_id: Value,
    pub title: Value,
    /// Last-resort calendar fallback when neither SKUs nor items carry one.
    pub calendar_detail: Option<RawCalendar>,
    #[serde(rename = "item")]
    pub items: Vec<PackageItem>,
}

impl PackageDoc {
    /// Deserialize a document from an upstream JSON value.
    pub fn from_value(value: Value) -> Result<PackageDoc, DocumentError> {
        serde_json::from_value(value).map_err(DocumentError::Malformed)
    }

    pub fn from_json(raw: &str) -> Result<PackageDoc, DocumentError> {
        serde_json::from_str(raw).map_err(DocumentError::Malformed)
    }

    /// The item a booking prices against: the first item carrying any SKU,
    /// else the first item.
    pub fn primary_item(&self) -> Option<&PackageItem> {
        self.items
            .iter()
            .find(|item| !item.skus.is_empty())
            .or_else(|| self.items.first())
    }

    /// Package-level minimum price: lowest item minimum across all items.
    pub fn min_price(&self) -> Option<f64> {
        self.items
            .iter()
            .filter_map(PackageItem::min_price)
            .fold(None, |best, n| {
                Some(match best {
                    Some(b) => n.min(b),
                    None => n,
                })
            })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PackageItem {
    pub item_id: Value,
    pub title: Value,
    pub calendar_detail: Option<RawCalendar>,
    pub sale_s_date: Option<String>,
    pub sale_e_date: Option<String>,
    pub b2b_min_price: Value,
    pub b2c_min_price: Value,
    pub skus: Vec<Sku>,
}

impl PackageItem {
    /// Item-level minimum price, customer-facing field first.
    pub fn min_price(&self) -> Option<f64> {
        num::coerce_num(&self.b2c_min_price).or_else(|| num::coerce_num(&self.b2b_min_price))
    }

    /// Declared sale range, when both endpoints parse.
    pub fn sale_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        parse_range(self.sale_s_date.as_deref(), self.sale_e_date.as_deref())
    }
}

/// A purchasable ticket/package variant.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Sku {
    pub sku_id: Value,
    pub title: Value,
    pub name: Value,
    pub spec: Value,
    pub spec_ref: Value,
    pub spec_token: Option<String>,
    pub calendar_detail: Option<RawCalendar>,
    pub calendar: Option<RawCalendar>,
    pub sale_s_date: Option<String>,
    pub sale_e_date: Option<String>,
    pub b2b_price: Value,
    pub b2c_price: Value,
    pub price: Value,
    pub official_price: Value,
    pub remain_qty: Value,
}

impl Sku {
    pub fn id(&self) -> Option<String> {
        num::coerce_id(&self.sku_id)
    }

    /// The SKU's calendar, preferring `calendar_detail` over the legacy
    /// `calendar` field. An empty map counts as no calendar.
    pub fn effective_calendar(&self) -> Option<&RawCalendar> {
        self.calendar_detail
            .as_ref()
            .filter(|cal| !cal.is_empty())
            .or_else(|| self.calendar.as_ref().filter(|cal| !cal.is_empty()))
    }

    /// Scalar price for selling contexts: `b2c_price` → `price` →
    /// `b2b_price` → `official_price`. A time-keyed field contributes its
    /// minimum.
    pub fn scalar_price(&self) -> Option<f64> {
        [&self.b2c_price, &self.price, &self.b2b_price, &self.official_price]
            .into_iter()
            .find_map(|field| PriceValue::from_value(field))
            .map(|value| value.lowest())
    }

    /// Base price for synthesizing calendar days from a sale range:
    /// `official_price` → `b2b_price` → `b2c_price`.
    pub fn fill_base_price(&self) -> Option<f64> {
        [&self.official_price, &self.b2b_price, &self.b2c_price]
            .into_iter()
            .find_map(|field| PriceValue::from_value(field))
            .map(|value| value.lowest())
    }

    pub fn sale_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        parse_range(self.sale_s_date.as_deref(), self.sale_e_date.as_deref())
    }

    /// Remaining quantity, when upstream reports one.
    pub fn remaining(&self) -> Option<f64> {
        num::coerce_num(&self.remain_qty)
    }

    /// Text scanned by the participant-category classifier.
    pub fn search_text(&self) -> String {
        [&self.spec, &self.spec_ref, &self.title, &self.name]
            .into_iter()
            .filter_map(|field| field.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn parse_range(start: Option<&str>, end: Option<&str>) -> Option<(NaiveDate, NaiveDate)> {
    let start = dates::parse_day(start?)?;
    let end = dates::parse_day(end?)?;
    Some((start, end))
}

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("Malformed package document: {0}")]
    Malformed(#[source] serde_json::Error),
}
