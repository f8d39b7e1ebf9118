use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One normalized reservation line.
///
/// `price` is always the per-unit price; line and payload totals are
/// computed from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkuLineItem {
    pub sku_id: String,
    pub qty: u32,
    pub price: f64,
}

impl SkuLineItem {
    pub fn line_total(&self) -> f64 {
        f64::from(self.qty) * self.price
    }
}

/// A caller-selected SKU as it arrives from the screen state, duck-typed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectedSku {
    pub sku_id: Value,
    pub qty: Value,
    pub price: Value,
    /// Line total; unit is derived as `total / qty` when `price` is absent.
    pub total_price: Value,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub ticket_type: Option<String>,
}

impl SelectedSku {
    /// Category hint text, when the screen tagged the line.
    pub fn hint_text(&self) -> String {
        [self.kind.as_deref(), self.ticket_type.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ")
    }
}
