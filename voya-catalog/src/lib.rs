pub mod document;
pub mod entry;
pub mod price;

pub use document::{DocumentError, PackageDoc, PackageItem, RawCalendar, Sku};
pub use entry::{CalendarEntry, PriceValue};
pub use price::lowest_price_from;
