pub mod aggregate;
pub mod engine;
pub mod explicit;

pub use aggregate::{load_pending, pending_with_age};
pub use engine::{check_for_resolutions, CheckReport};
pub use explicit::{resolve_explicit, undo, ExplicitOutcome, UndoOutcome};
