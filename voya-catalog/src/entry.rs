use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use voya_shared::num;

/// A normalized price field: a bare amount, or a time-of-day keyed map of
/// amounts for products sold in timed sessions.
///
/// Upstream never distinguishes the two shapes; every consumer goes through
/// this union so the distinction is made exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PriceValue {
    Scalar(f64),
    TimeMap(BTreeMap<String, f64>),
}

impl PriceValue {
    /// Normalize a raw field value. Numbers and numeric strings become
    /// `Scalar`; objects keep their coercible leaves as a `TimeMap`.
    /// Anything else (or a map with no usable leaves) is absent.
    pub fn from_value(value: &Value) -> Option<PriceValue> {
        if let Some(n) = num::coerce_num(value) {
            return Some(PriceValue::Scalar(n));
        }
        if let Value::Object(map) = value {
            let leaves: BTreeMap<String, f64> = map
                .iter()
                .filter_map(|(slot, v)| num::coerce_num(v).map(|n| (slot.clone(), n)))
                .collect();
            if !leaves.is_empty() {
                return Some(PriceValue::TimeMap(leaves));
            }
        }
        None
    }

    /// The date-level effective amount: a time map collapses to its minimum.
    pub fn lowest(&self) -> f64 {
        match self {
            PriceValue::Scalar(n) => *n,
            PriceValue::TimeMap(map) => map.values().copied().fold(f64::INFINITY, f64::min),
        }
    }

    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            PriceValue::Scalar(n) => Some(*n),
            PriceValue::TimeMap(_) => None,
        }
    }

    /// Fold a refinement into a slot, never keeping the worse amount.
    ///
    /// Scalars merge by minimum; time maps merge per time key (keys missing
    /// on either side carry through). When the shapes disagree the time map
    /// wins the slot, since it carries strictly more structure; the scalar
    /// still participates in the date's summary minimum at the call site.
    pub fn merge_min(existing: Option<PriceValue>, incoming: PriceValue) -> PriceValue {
        match (existing, incoming) {
            (None, incoming) => incoming,
            (Some(PriceValue::Scalar(a)), PriceValue::Scalar(b)) => PriceValue::Scalar(a.min(b)),
            (Some(PriceValue::TimeMap(mut a)), PriceValue::TimeMap(b)) => {
                for (slot, amount) in b {
                    a.entry(slot)
                        .and_modify(|cur| *cur = cur.min(amount))
                        .or_insert(amount);
                }
                PriceValue::TimeMap(a)
            }
            (Some(PriceValue::Scalar(_)), incoming @ PriceValue::TimeMap(_)) => incoming,
            (Some(existing @ PriceValue::TimeMap(_)), PriceValue::Scalar(_)) => existing,
        }
    }
}

/// A per-date upstream record after normalization. A bare number or numeric
/// string means "price"; an object keeps its tracked fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalendarEntry {
    pub b2b_price: Option<PriceValue>,
    pub b2c_price: Option<PriceValue>,
    pub price: Option<PriceValue>,
    pub sale_price: Option<PriceValue>,
    pub original_price: Option<PriceValue>,
    pub sold_out: bool,
    pub remain_qty: Option<f64>,
}

impl CalendarEntry {
    pub fn from_value(value: &Value) -> CalendarEntry {
        match value {
            Value::Object(map) => CalendarEntry {
                b2b_price: map.get("b2b_price").and_then(PriceValue::from_value),
                b2c_price: map.get("b2c_price").and_then(PriceValue::from_value),
                price: map.get("price").and_then(PriceValue::from_value),
                sale_price: map.get("sale_price").and_then(PriceValue::from_value),
                original_price: map.get("original_price").and_then(PriceValue::from_value),
                sold_out: map.get("soldOut").map(num::coerce_flag).unwrap_or(false),
                remain_qty: map.get("remain_qty").and_then(num::coerce_num),
            },
            scalar => CalendarEntry {
                price: PriceValue::from_value(scalar),
                ..CalendarEntry::default()
            },
        }
    }

    /// Minimum over the candidate pool of every present price field,
    /// with time maps flattened to all their leaves.
    pub fn lowest_price(&self) -> Option<f64> {
        [
            &self.b2b_price,
            &self.b2c_price,
            &self.price,
            &self.sale_price,
            &self.original_price,
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
}
