pub mod classify;
pub mod lines;
pub mod payload;
pub mod resolve;

pub use classify::{ClassifierConfig, SkuCategory};
pub use lines::{SelectedSku, SkuLineItem};
pub use payload::{
    build_reservation, BookingError, BuyerContext, ReservationPayload, ReservationRequest,
};
pub use resolve::{PriceChain, PriceQuery, PriceSource};
