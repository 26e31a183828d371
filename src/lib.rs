// Library target: the quiz engine and its collaborators. The binary in
// main.rs, the integration tests and the benchmarks all build on it.

pub mod app;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod event;
pub mod identity;
pub mod session;
pub mod store;
