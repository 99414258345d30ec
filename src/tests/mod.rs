//! tests/mod.rs
//! Pruebas de handlers y servicios.

mod agent_tests;
mod health_tests;
mod support;
