pub mod analyzer;
pub mod coercion;
pub mod json_flattener;

pub use analyzer::*;
pub use json_flattener::*;
