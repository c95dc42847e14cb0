pub mod state;
pub mod store;

pub use state::{RegionState, Transition};
pub use store::{RegionSnapshot, StateStore};
