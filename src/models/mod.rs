pub mod listing;
pub mod summary;

pub use listing::*;
pub use summary::*;
