pub mod assessment;
pub mod reporting;
pub mod research;
