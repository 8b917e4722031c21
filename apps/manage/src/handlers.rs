pub mod check;
pub mod listing;
