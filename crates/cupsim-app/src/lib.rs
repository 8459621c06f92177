// Library root: re-exports all modules so integration tests and the binary
// can reach the simulator, config and report code.

pub mod app;
pub mod config;
pub mod names;
pub mod report;
pub mod simulate;
