//! Local video cache and its retention sweeper

pub mod store;
pub mod sweeper;

pub use store::MediaCache;
pub use sweeper::{RetentionSweeper, SweepReport};
