use chrono::NaiveDate;
use voya_catalog::{lowest_price_from, PackageDoc, PackageItem, Sku};
use voya_shared::dates;

/// Inputs for resolving one SKU's unit price on a selected date.
pub struct PriceQuery<'a> {
    pub doc: &'a PackageDoc,
    pub item: &'a PackageItem,
    pub sku: &'a Sku,
    pub date: Option<NaiveDate>,
}

/// One strategy in the unit-price fallback chain.
pub trait PriceSource {
    fn name(&self) -> &'static str;
    fn unit_price(&self, query: &PriceQuery<'_>) -> Option<f64>;
}

/// The SKU's own calendar entry for the selected date.
pub struct CalendarPrice;

impl PriceSource for CalendarPrice {
    fn name(&self) -> &'static str {
        "calendar"
    }

    fn unit_price(&self, query: &PriceQuery<'_>) -> Option<f64> {
        let date = query.date?;
        let calendar = query.sku.effective_calendar()?;
        let raw = calendar.get(&dates::format_day(date))?;
        lowest_price_from(raw)
    }
}

/// The SKU's scalar price fields.
pub struct SkuScalarPrice;

impl PriceSource for SkuScalarPrice {
    fn name(&self) -> &'static str {
        "sku_scalar"
    }

    fn unit_price(&self, query: &PriceQuery<'_>) -> Option<f64> {
        query.sku.scalar_price()
    }
}

/// The item-level minimum price.
pub struct ItemMinPrice;

impl PriceSource for ItemMinPrice {
    fn name(&self) -> &'static str {
        "item_min"
    }

    fn unit_price(&self, query: &PriceQuery<'_>) -> Option<f64> {
        query.item.min_price()
    }
}

/// The package-level minimum price.
pub struct PackageMinPrice;

impl PriceSource for PackageMinPrice {
    fn name(&self) -> &'static str {
        "package_min"
    }

    fn unit_price(&self, query: &PriceQuery<'_>) -> Option<f64> {
        query.doc.min_price()
    }
}

/// A caller-provided display price, last before giving up.
pub struct FallbackPrice(pub f64);

impl PriceSource for FallbackPrice {
    fn name(&self) -> &'static str {
        "fallback"
    }

    fn unit_price(&self, _query: &PriceQuery<'_>) -> Option<f64> {
        Some(self.0)
    }
}

/// Ordered unit-price fallback chain; the first strategy that yields a
/// price wins.
pub struct PriceChain {
    sources: Vec<Box<dyn PriceSource>>,
}

impl PriceChain {
    /// The canonical chain: calendar → SKU scalar → item minimum → package
    /// minimum → caller fallback (when given).
    pub fn standard(fallback: Option<f64>) -> PriceChain {
        let mut sources: Vec<Box<dyn PriceSource>> = vec![
            Box::new(CalendarPrice),
            Box::new(SkuScalarPrice),
            Box::new(ItemMinPrice),
            Box::new(PackageMinPrice),
        ];
        if let Some(price) = fallback {
            sources.push(Box::new(FallbackPrice(price)));
        }
        PriceChain { sources }
    }

    pub fn try_resolve(&self, query: &PriceQuery<'_>) -> Option<f64> {
        for source in &self.sources {
            if let Some(price) = source.unit_price(query) {
                tracing::debug!(
                    source = source.name(),
                    price,
                    sku_id = ?query.sku.id(),
                    "unit price resolved"
                );
                return Some(price);
            }
        }
        None
    }

    /// Resolve a unit price; 0 when every strategy comes up empty.
    pub fn resolve(&self, query: &PriceQuery<'_>) -> f64 {
        match self.try_resolve(query) {
            Some(price) => price,
            None => {
                tracing::debug!(sku_id = ?query.sku.id(), "unit price unresolved, using 0");
                0.0
            }
        }
    }
}
