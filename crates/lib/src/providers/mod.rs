pub mod ai;
pub mod store;
