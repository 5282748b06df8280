pub mod extract;
pub mod identity;
pub mod lifecycle;
pub mod monitoring;
pub mod phase;
pub mod planner;
pub mod sync;
