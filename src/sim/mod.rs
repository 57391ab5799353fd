/// Per-calculation clock for tick scheduling.
pub mod clock;
pub mod engine;
/// Post-hoc run summary.
pub mod kpi;
pub mod types;
