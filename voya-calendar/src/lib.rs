pub mod merge;
pub mod month;

pub use merge::{merge_calendar, DaySummary, FillSource, MergedCalendar, SkuRef};
pub use month::{month_matrix, MonthCell, SaleWindow};
