pub mod demo_data;
pub mod validation;

pub use demo_data::seed_demo_data;
pub use validation::{require_non_blank, validate_request};
