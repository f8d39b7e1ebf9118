pub mod dates;
pub mod num;
