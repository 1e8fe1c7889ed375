pub mod engine;
pub mod ids;
pub mod merge;
pub mod rules;
pub mod stats;

pub use engine::AttendanceLedger;
