use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;
use voya_catalog::{lowest_price_from, PackageDoc, PackageItem, Sku};
use voya_shared::{dates, num};

use crate::classify::{ClassifierConfig, SkuCategory};
use crate::lines::{SelectedSku, SkuLineItem};
use crate::resolve::{PriceChain, PriceQuery};

/// Buyer details passed explicitly into payload building.
///
/// Everything the order API needs about the buyer travels through this
/// struct; nothing is read from ambient state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuyerContext {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub guide_language: Option<String>,
    pub custom_fields: Vec<Value>,
    pub traffic_fields: Vec<Value>,
}

/// A checkout request snapshot from the people-count screen.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReservationRequest {
    pub adult_count: u32,
    pub child_count: u32,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Pre-resolved selection from the screen; trusted when present.
    pub selected_skus: Option<Vec<SelectedSku>>,
    /// Authoritative total from the caller, duck-typed.
    pub total_price: Value,
    /// Idempotency key; generated when absent.
    pub partner_order_no: Option<String>,
    /// Display price, preferred by the price fallback chain.
    pub display_price: Option<f64>,
}

/// The normalized order payload handed to the order-submission API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationPayload {
    pub partner_order_no: String,
    pub buyer: BuyerContext,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub skus: Vec<SkuLineItem>,
    pub total_price: f64,
}

impl ReservationPayload {
    /// An empty line set means the document could not be priced at all;
    /// callers surface that instead of submitting.
    pub fn is_priceable(&self) -> bool {
        !self.skus.is_empty()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("Package document has no bookable item")]
    NoBookableItem,
}

/// Assemble a reservation payload from a document snapshot.
///
/// Line items come from the caller's explicit selection when one is given,
/// otherwise they are derived from the participant counts. Either way every
/// line carries a unit price and the total is `Σ qty × unit` unless the
/// caller supplied an authoritative total.
pub fn build_reservation(
    doc: &PackageDoc,
    request: &ReservationRequest,
    buyer: &BuyerContext,
    config: &ClassifierConfig,
) -> Result<ReservationPayload, BookingError> {
    let item = doc.primary_item().ok_or(BookingError::NoBookableItem)?;
    let chain = PriceChain::standard(request.display_price);

    let skus = match &request.selected_skus {
        Some(selected) if !selected.is_empty() => {
            normalize_selected(selected, doc, item, request, config, &chain)
        }
        _ => derive_lines(doc, item, request, config, &chain),
    };

    let total_price = num::coerce_num(&request.total_price)
        .unwrap_or_else(|| skus.iter().map(SkuLineItem::line_total).sum());

    Ok(ReservationPayload {
        partner_order_no: request
            .partner_order_no
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string()),
        buyer: buyer.clone(),
        start_date: request.start_date.map(dates::format_day),
        end_date: request.end_date.map(dates::format_day),
        skus,
        total_price,
    })
}

/// Normalize a caller-supplied selection. The selection is trusted; only
/// quantities and prices are coerced, with absent unit prices recovered from
/// the line total, a category hint, the SKU's own calendar, or the item
/// minimum, in that order.
fn normalize_selected(
    selected: &[SelectedSku],
    doc: &PackageDoc,
    item: &PackageItem,
    request: &ReservationRequest,
    config: &ClassifierConfig,
    chain: &PriceChain,
) -> Vec<SkuLineItem> {
    let mut lines = Vec::with_capacity(selected.len());
    for raw in selected {
        let sku_id = num::coerce_id(&raw.sku_id).unwrap_or_default();
        let qty = num::coerce_qty(&raw.qty).unwrap_or(0);

        let mut unit = num::coerce_num(&raw.price);
        if unit.is_none() && qty > 0 {
            unit = num::coerce_num(&raw.total_price).map(|total| total / f64::from(qty));
        }
        if unit.is_none() {
            let hint = raw.hint_text();
            if !hint.is_empty() {
                let category = match config.classify_text(&hint) {
                    SkuCategory::Child => SkuCategory::Child,
                    _ => SkuCategory::Adult,
                };
                unit = category_unit(category, doc, item, request, config, chain);
            }
        }
        if unit.is_none() {
            unit = catalog_sku(item, &sku_id)
                .and_then(|sku| calendar_price(sku, request.start_date));
        }
        if unit.is_none() {
            unit = item.min_price();
        }

        lines.push(SkuLineItem {
            sku_id,
            qty,
            price: unit.unwrap_or(0.0),
        });
    }
    lines
}

/// Derive line items from participant counts.
///
/// At most one line per participant category; a category with no classified
/// SKU falls back category → single SKU → first SKU, and lines landing on
/// the same SKU merge into one with the combined quantity.
fn derive_lines(
    doc: &PackageDoc,
    item: &PackageItem,
    request: &ReservationRequest,
    config: &ClassifierConfig,
    chain: &PriceChain,
) -> Vec<SkuLineItem> {
    if item.skus.is_empty() {
        tracing::warn!("bookable item has no SKUs; returning empty line set");
        return Vec::new();
    }

    let adult_sku = item
        .skus
        .iter()
        .find(|sku| config.classify(sku) == SkuCategory::Adult);
    let child_sku = item
        .skus
        .iter()
        .find(|sku| config.classify(sku) == SkuCategory::Child);
    let single = if item.skus.len() == 1 {
        item.skus.first()
    } else {
        None
    };
    let first = item.skus.first();

    let mut picks: Vec<(&Sku, u32)> = Vec::new();
    if request.adult_count > 0 {
        if let Some(sku) = adult_sku.or(single).or(first) {
            picks.push((sku, request.adult_count));
        }
    }
    if request.child_count > 0 {
        if let Some(sku) = child_sku.or(single).or(first) {
            picks.push((sku, request.child_count));
        }
    }

    let mut lines: Vec<SkuLineItem> = Vec::new();
    for (sku, qty) in picks {
        let unit = chain.resolve(&PriceQuery {
            doc,
            item,
            sku,
            date: request.start_date,
        });
        let sku_id = sku.id().unwrap_or_default();
        match lines.iter_mut().find(|line| line.sku_id == sku_id) {
            Some(existing) => existing.qty += qty,
            None => lines.push(SkuLineItem {
                sku_id,
                qty,
                price: unit,
            }),
        }
    }
    lines
}

/// Unit price for a participant category, resolved through the chain over
/// the category's SKU (first SKU when nothing classifies).
fn category_unit(
    category: SkuCategory,
    doc: &PackageDoc,
    item: &PackageItem,
    request: &ReservationRequest,
    config: &ClassifierConfig,
    chain: &PriceChain,
) -> Option<f64> {
    let sku = item
        .skus
        .iter()
        .find(|sku| config.classify(sku) == category)
        .or_else(|| item.skus.first())?;
    chain.try_resolve(&PriceQuery {
        doc,
        item,
        sku,
        date: request.start_date,
    })
}

fn catalog_sku<'a>(item: &'a PackageItem, sku_id: &str) -> Option<&'a Sku> {
    if sku_id.is_empty() {
        return None;
    }
    item.skus
        .iter()
        .find(|sku| sku.id().as_deref() == Some(sku_id))
}

fn calendar_price(sku: &Sku, date: Option<NaiveDate>) -> Option<f64> {
    let calendar = sku.effective_calendar()?;
    let raw = calendar.get(&dates::format_day(date?))?;
    lowest_price_from(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use voya_shared::dates::parse_day;

    fn doc(value: serde_json::Value) -> PackageDoc {
        PackageDoc::from_value(value).unwrap()
    }

    fn request(adult: u32, child: u32, date: &str) -> ReservationRequest {
        ReservationRequest {
            adult_count: adult,
            child_count: child,
            start_date: parse_day(date),
            ..ReservationRequest::default()
        }
    }

    fn build(doc: &PackageDoc, request: &ReservationRequest) -> ReservationPayload {
        build_reservation(
            doc,
            request,
            &BuyerContext::default(),
            &ClassifierConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_single_sku_adult_only() {
        let doc = doc(json!({
            "item": [{"skus": [{"sku_id": "S1", "b2c_price": 15000}]}]
        }));
        let payload = build(&doc, &request(2, 0, "2025-10-18"));
        assert_eq!(payload.skus.len(), 1);
        assert_eq!(payload.skus[0], SkuLineItem {
            sku_id: "S1".to_string(),
            qty: 2,
            price: 15000.0,
        });
        assert_eq!(payload.total_price, 30000.0);
        assert!(payload.is_priceable());
    }

    #[test]
    fn test_adult_and_child_lines() {
        let doc = doc(json!({
            "item": [{
                "skus": [
                    {"sku_id": "A", "title": "Adult", "b2c_price": 30000},
                    {"sku_id": "C", "title": "Child", "b2c_price": 20000}
                ]
            }]
        }));
        let payload = build(&doc, &request(2, 1, "2025-10-18"));
        assert_eq!(payload.skus.len(), 2);
        let qty_sum: u32 = payload.skus.iter().map(|line| line.qty).sum();
        assert_eq!(qty_sum, 3);
        assert_eq!(payload.total_price, 2.0 * 30000.0 + 20000.0);
    }

    #[test]
    fn test_single_sku_absorbs_both_categories() {
        let doc = doc(json!({
            "item": [{"skus": [{"sku_id": "S1", "b2c_price": 10000}]}]
        }));
        let payload = build(&doc, &request(2, 3, "2025-10-18"));
        // One merged line with the combined quantity
        assert_eq!(payload.skus.len(), 1);
        assert_eq!(payload.skus[0].qty, 5);
        assert_eq!(payload.total_price, 50000.0);
    }

    #[test]
    fn test_classification_failure_falls_to_first_sku() {
        let doc = doc(json!({
            "item": [{
                "skus": [
                    {"sku_id": "X", "title": "Option 1", "b2c_price": 12000},
                    {"sku_id": "Y", "title": "Option 2", "b2c_price": 14000}
                ]
            }]
        }));
        let payload = build(&doc, &request(1, 1, "2025-10-18"));
        assert_eq!(payload.skus.len(), 1);
        assert_eq!(payload.skus[0].sku_id, "X");
        assert_eq!(payload.skus[0].qty, 2);
    }

    #[test]
    fn test_calendar_price_wins_for_selected_date() {
        let doc = doc(json!({
            "item": [{
                "skus": [{
                    "sku_id": "A",
                    "title": "Adult",
                    "b2c_price": 30000,
                    "calendar_detail": {"2025-10-18": {"b2c_price": 26000}}
                }]
            }]
        }));
        let payload = build(&doc, &request(1, 0, "2025-10-18"));
        assert_eq!(payload.skus[0].price, 26000.0);
        // A date outside the calendar falls back to the scalar price
        let payload = build(&doc, &request(1, 0, "2025-12-01"));
        assert_eq!(payload.skus[0].price, 30000.0);
    }

    #[test]
    fn test_no_skus_yields_empty_unpriceable_payload() {
        let doc = doc(json!({"item": [{"skus": []}]}));
        let payload = build(&doc, &request(2, 0, "2025-10-18"));
        assert!(payload.skus.is_empty());
        assert!(!payload.is_priceable());
        assert_eq!(payload.total_price, 0.0);
    }

    #[test]
    fn test_no_items_is_an_error() {
        let doc = doc(json!({}));
        let result = build_reservation(
            &doc,
            &request(1, 0, "2025-10-18"),
            &BuyerContext::default(),
            &ClassifierConfig::default(),
        );
        assert!(matches!(result, Err(BookingError::NoBookableItem)));
    }

    #[test]
    fn test_selected_unit_derived_from_total() {
        let doc = doc(json!({
            "item": [{"skus": [{"sku_id": "A", "b2c_price": 30000}]}]
        }));
        let mut req = request(0, 0, "2025-10-18");
        req.selected_skus = Some(vec![serde_json::from_value(json!({
            "sku_id": "A", "qty": 2, "total_price": 40000
        }))
        .unwrap()]);
        let payload = build(&doc, &req);
        assert_eq!(payload.skus, vec![SkuLineItem {
            sku_id: "A".to_string(),
            qty: 2,
            price: 20000.0,
        }]);
        assert_eq!(payload.total_price, 40000.0);
    }

    #[test]
    fn test_selected_hint_picks_category_unit() {
        let doc = doc(json!({
            "item": [{
                "skus": [
                    {"sku_id": "A", "title": "Adult", "b2c_price": 30000},
                    {"sku_id": "C", "title": "Child", "b2c_price": 20000}
                ]
            }]
        }));
        let mut req = request(0, 0, "2025-10-18");
        req.selected_skus = Some(vec![
            serde_json::from_value(json!({"sku_id": "C", "qty": 1, "ticket_type": "child"}))
                .unwrap(),
            serde_json::from_value(json!({"sku_id": "A", "qty": 2, "type": "ticket"})).unwrap(),
        ]);
        let payload = build(&doc, &req);
        assert_eq!(payload.skus[0].price, 20000.0);
        // Non-child hint defaults to the adult unit
        assert_eq!(payload.skus[1].price, 30000.0);
        assert_eq!(payload.total_price, 20000.0 + 60000.0);
    }

    #[test]
    fn test_selected_falls_back_to_own_calendar_then_item_min() {
        let doc = doc(json!({
            "item": [{
                "b2c_min_price": 11000,
                "skus": [
                    {"sku_id": "A", "calendar_detail": {"2025-10-18": 26000}},
                    {"sku_id": "B"}
                ]
            }]
        }));
        let mut req = request(0, 0, "2025-10-18");
        req.selected_skus = Some(vec![
            serde_json::from_value(json!({"sku_id": "A", "qty": 1})).unwrap(),
            serde_json::from_value(json!({"sku_id": "B", "qty": 1})).unwrap(),
        ]);
        let payload = build(&doc, &req);
        assert_eq!(payload.skus[0].price, 26000.0);
        assert_eq!(payload.skus[1].price, 11000.0);
    }

    #[test]
    fn test_caller_total_is_authoritative() {
        let doc = doc(json!({
            "item": [{"skus": [{"sku_id": "A", "b2c_price": 30000}]}]
        }));
        let mut req = request(1, 0, "2025-10-18");
        req.total_price = json!("28,000");
        let payload = build(&doc, &req);
        assert_eq!(payload.total_price, 28000.0);
    }

    #[test]
    fn test_partner_order_no_passthrough_and_generation() {
        let doc = doc(json!({
            "item": [{"skus": [{"sku_id": "A", "b2c_price": 30000}]}]
        }));
        let mut req = request(1, 0, "2025-10-18");
        req.partner_order_no = Some("ORD-123".to_string());
        assert_eq!(build(&doc, &req).partner_order_no, "ORD-123");

        let generated = build(&doc, &request(1, 0, "2025-10-18")).partner_order_no;
        assert!(!generated.is_empty());
        assert_ne!(generated, build(&doc, &request(1, 0, "2025-10-18")).partner_order_no);
    }

    #[test]
    fn test_buyer_context_carried_through() {
        let doc = doc(json!({
            "item": [{"skus": [{"sku_id": "A", "b2c_price": 30000}]}]
        }));
        let buyer = BuyerContext {
            name: Some("Hana Kim".to_string()),
            guide_language: Some("ko".to_string()),
            custom_fields: vec![json!({"key": "pickup", "value": "hotel lobby"})],
            ..BuyerContext::default()
        };
        let payload = build_reservation(
            &doc,
            &request(1, 0, "2025-10-18"),
            &buyer,
            &ClassifierConfig::default(),
        )
        .unwrap();
        assert_eq!(payload.buyer, buyer);
        assert_eq!(payload.start_date.as_deref(), Some("2025-10-18"));
    }
}
