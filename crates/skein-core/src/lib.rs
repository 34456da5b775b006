pub mod score;
pub mod timefmt;
pub mod types;

pub use types::*;
