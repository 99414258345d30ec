//! config/mod.rs
//! Configuración del proceso (variables de entorno).

pub mod app_config;
