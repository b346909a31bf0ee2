pub mod backend;
pub mod book;
pub mod config_cmd;
pub mod daemon;
pub mod estimate;
pub mod history;
pub mod overlaps;
pub mod reconcile;
pub mod slot;
